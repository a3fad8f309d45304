// cluster.rs - Hierarchical cluster assignment against a precomputed archive

use crate::data::{AlleleCallVector, ProfileTable};
use crate::error::{Result, TypingError};
use crate::schema::BackendLayout;
use crate::tools::{require_nonempty, ClusterArgs, ToolCommand, ToolRunner};
use flate2::read::MultiGzDecoder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Row id under which the new genome is injected into the clustering input
pub const QUERY_SENTINEL: &str = "__query_genome__";

/// HC distance thresholds kept on the typing record
pub const DEFAULT_HC_LEVELS: &[u32] = &[0, 2, 5, 10, 20, 50, 100];

/// HC threshold → cluster id for the new genome
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterLevels(pub BTreeMap<u32, u64>);

impl ClusterLevels {
    pub fn get(&self, level: u32) -> Option<u64> {
        self.0.get(&level).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, u64)> + '_ {
        self.0.iter().map(|(level, id)| (*level, *id))
    }
}

impl Display for ClusterLevels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(level, id)| format!("HC{}={}", level, id))
            .collect();
        write!(f, "{}", parts.join(";"))
    }
}

/// Settings of the clustering stage
#[derive(Debug, Clone)]
pub struct ClusterSettings {
    pub program: String,
    pub levels: Vec<u32>,
    pub refs_date: Option<String>,
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            program: "pHierCC".to_string(),
            levels: DEFAULT_HC_LEVELS.to_vec(),
            refs_date: None,
        }
    }
}

/// Scratch artifacts of one clustering run
#[derive(Debug, Clone)]
struct ClusterWorkspace {
    master_copy: PathBuf,
    combined: PathBuf,
    cleaned: PathBuf,
    archive_copy: PathBuf,
    output_prefix: PathBuf,
}

impl ClusterWorkspace {
    fn new(scratch_dir: &Path, schema: &str) -> Self {
        let dir = scratch_dir.join("cluster");
        Self {
            master_copy: dir.join(format!("{}_master.tsv", schema)),
            combined: dir.join(format!("{}_combined.tsv", schema)),
            cleaned: dir.join(format!("{}_cleaned.tsv", schema)),
            archive_copy: dir.join(format!("{}.npz", schema)),
            output_prefix: dir.join(format!("{}_hc", schema)),
        }
    }

    fn args(&self) -> ClusterArgs {
        ClusterArgs {
            profile: self.cleaned.clone(),
            output_prefix: self.output_prefix.clone(),
            archive: self.archive_copy.clone(),
        }
    }
}

/// Copy a read-only canonical file into scratch space
fn snapshot(source: &Path, target: &Path) -> Result<()> {
    require_nonempty(source)?;
    fs::copy(source, target).map_err(|e| TypingError::io(target, e))?;
    require_nonempty(target)?;
    log::debug!("Snapshot {} → {}", source.display(), target.display());
    Ok(())
}

fn parse_level_label(label: &str) -> Option<u32> {
    label.trim().strip_prefix("HC")?.parse().ok()
}

/// Extract the allowed HC levels of the `sentinel` row from a gzipped HierCC table
pub fn parse_hiercc(path: &Path, sentinel: &str, allowed: &[u32]) -> Result<ClusterLevels> {
    let file = File::open(path).map_err(|e| TypingError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .from_reader(BufReader::new(MultiGzDecoder::new(file)));

    let headers = reader.headers()?.clone();

    let mut row = None;
    for record in reader.records() {
        let record = record?;
        if record.get(0).map(str::trim) == Some(sentinel) {
            row = Some(record);
            break;
        }
    }

    let row = row.ok_or_else(|| TypingError::SentinelNotFound {
        sentinel: sentinel.to_string(),
        path: path.to_path_buf(),
    })?;

    let mut levels = BTreeMap::new();
    for (label, value) in headers.iter().zip(row.iter()).skip(1) {
        let Some(level) = parse_level_label(label) else {
            continue;
        };
        if !allowed.contains(&level) {
            continue;
        }
        let cluster_id: u64 = value.trim().parse().map_err(|_| {
            TypingError::Parse(format!(
                "Invalid cluster id '{}' for {} in {}",
                value,
                label,
                path.display()
            ))
        })?;
        levels.insert(level, cluster_id);
    }

    for level in allowed {
        if !levels.contains_key(level) {
            log::warn!("⚠️  HC{} not present in {}", level, path.display());
        }
    }

    Ok(ClusterLevels(levels))
}

/// Deterministic levels used in dry-run mode
pub fn placeholder_levels(allowed: &[u32]) -> ClusterLevels {
    ClusterLevels(allowed.iter().map(|level| (*level, 1)).collect())
}

/// Merge the new genome into a snapshot of the master table, cluster it, and
/// read back its HC levels. Canonical backend files are only ever read.
pub fn run_clustering(
    runner: &dyn ToolRunner,
    settings: &ClusterSettings,
    calls: &AlleleCallVector,
    layout: &BackendLayout,
    schema: &str,
    scratch_dir: &Path,
) -> Result<ClusterLevels> {
    let workspace = ClusterWorkspace::new(scratch_dir, schema);
    let args = workspace.args();
    let command = ToolCommand::cluster(&settings.program, &args);

    if runner.is_dry_run() {
        runner.run(&command)?;
        return Ok(placeholder_levels(&settings.levels));
    }

    let cluster_dir = scratch_dir.join("cluster");
    fs::create_dir_all(&cluster_dir).map_err(|e| TypingError::io(&cluster_dir, e))?;

    // 1. snapshot the master profile table
    let master = layout.master_profile(schema, settings.refs_date.as_deref())?;
    log::info!("📋 Master profiles: {}", master.display());
    snapshot(&master, &workspace.master_copy)?;

    // 2. join the new genome under the sentinel id
    let mut table = ProfileTable::from_tsv(&workspace.master_copy)?;
    table.merge_calls(calls, QUERY_SENTINEL)?;
    table.write_tsv(&workspace.combined)?;
    require_nonempty(&workspace.combined)?;
    log::info!(
        "🔗 Combined profile table: {} samples × {} loci",
        table.rows.len(),
        table.loci_names.len()
    );

    // 3. numeric-only alleles for the clusterer
    table.normalized().write_tsv(&workspace.cleaned)?;
    require_nonempty(&workspace.cleaned)?;

    // 4. snapshot the cluster archive
    snapshot(&layout.cluster_archive(schema), &workspace.archive_copy)?;

    // 5. cluster
    runner.run(&command)?;
    let hiercc = args.hiercc_path();
    require_nonempty(&hiercc)?;

    // 6-7. find the sentinel row and keep the allowed levels
    let levels = parse_hiercc(&hiercc, QUERY_SENTINEL, &settings.levels)?;
    log::info!("🌲 Cluster levels: {}", levels);
    Ok(levels)
}

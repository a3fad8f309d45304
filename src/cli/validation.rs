// validation.rs - Input validation utilities

use crate::cli::args::Args;
use crate::core::allele_call::AlleleCallSettings;
use crate::core::cluster::ClusterSettings;
use crate::core::pipeline::PipelineConfig;
use crate::core::quality::QualityThresholds;
use crate::error::{Result, TypingError};
use crate::schema::{BackendLayout, SchemaMap};
use regex::Regex;
use std::path::PathBuf;

/// Where the genome to type comes from
#[derive(Debug, Clone, PartialEq)]
pub enum GenomeSource {
    Container(PathBuf),
    Fasta {
        path: PathBuf,
        sample_id: String,
        taxid: u32,
    },
}

pub struct ValidationResult {
    pub source: GenomeSource,
    /// `None` only in dry-run mode; the genome's own taxid is then its lineage
    pub taxonomy: Option<PathBuf>,
    pub output: String,
    pub summary: Option<PathBuf>,
    pub pipeline: PipelineConfig,
}

/// Parse a comma-separated HC level list
pub fn parse_hc_levels(value: &str) -> Result<Vec<u32>> {
    let mut levels = Vec::new();
    for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let level = part
            .trim_start_matches("HC")
            .parse::<u32>()
            .map_err(|_| TypingError::Config(format!("Invalid HC level '{}'", part)))?;
        if !levels.contains(&level) {
            levels.push(level);
        }
    }
    if levels.is_empty() {
        return Err(TypingError::Config("At least one HC level is required".to_string()));
    }
    levels.sort_unstable();
    Ok(levels)
}

fn validate_percentage(name: &str, value: f64) -> Result<()> {
    if !(0.0..=100.0).contains(&value) {
        return Err(TypingError::Config(format!(
            "{} must be between 0 and 100 (got {})",
            name, value
        )));
    }
    Ok(())
}

fn genome_source(args: &Args) -> Result<GenomeSource> {
    match (&args.genome, &args.fasta) {
        (Some(_), Some(_)) => Err(TypingError::Config(
            "--genome and --fasta are mutually exclusive".to_string(),
        )),
        (Some(genome), None) => Ok(GenomeSource::Container(PathBuf::from(genome))),
        (None, Some(fasta)) => {
            let taxid = args
                .taxid
                .ok_or_else(|| TypingError::Config("--fasta requires --taxid".to_string()))?;
            let path = PathBuf::from(fasta);
            let sample_id = match &args.sample_id {
                Some(id) => id.clone(),
                None => path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .map(str::to_string)
                    .ok_or_else(|| {
                        TypingError::Config(format!(
                            "Cannot derive a sample id from '{}', use --sample-id",
                            fasta
                        ))
                    })?,
            };
            Ok(GenomeSource::Fasta {
                path,
                sample_id,
                taxid,
            })
        }
        (None, None) => Err(TypingError::Config(
            "--genome or --fasta is required".to_string(),
        )),
    }
}

/// Validate all command line arguments
pub fn validate_args(args: &Args) -> Result<ValidationResult> {
    let source = genome_source(args)?;

    // Validate thresholds
    validate_percentage("QC threshold", args.qc_threshold)?;
    validate_percentage("Cluster threshold", args.cluster_threshold)?;
    if args.cluster_threshold < args.qc_threshold {
        log::warn!(
            "⚠️  Cluster threshold ({:.1}%) is below the QC threshold ({:.1}%): only genomes passing QC are clustered",
            args.cluster_threshold,
            args.qc_threshold
        );
    }

    let levels = parse_hc_levels(&args.hc_levels)?;

    if args.cpus == 0 {
        return Err(TypingError::Config("--cpus must be at least 1".to_string()));
    }

    if let Some(date) = &args.refs_date {
        let date_re = Regex::new(r"^\d{8}$")
            .map_err(|e| TypingError::Config(format!("Invalid date pattern: {}", e)))?;
        if !date_re.is_match(date) {
            return Err(TypingError::Config(format!(
                "--refs-date must be YYYYMMDD (got '{}')",
                date
            )));
        }
    }

    // Backend locations are only optional when nothing is executed
    let taxonomy = match (&args.taxonomy, args.dry_run) {
        (Some(path), _) => Some(PathBuf::from(path)),
        (None, true) => None,
        (None, false) => {
            return Err(TypingError::Config("--taxonomy is required".to_string()));
        }
    };
    let backend_root = match (&args.backend_root, args.dry_run) {
        (Some(root), _) => PathBuf::from(root),
        (None, true) => PathBuf::from("."),
        (None, false) => {
            return Err(TypingError::Config("--backend-root is required".to_string()));
        }
    };
    if !args.dry_run && !backend_root.is_dir() {
        return Err(TypingError::Config(format!(
            "Backend root '{}' is not a directory",
            backend_root.display()
        )));
    }

    let schema_map = SchemaMap::builtin().with_overrides(args.schema_overrides.iter().cloned());

    let pipeline = PipelineConfig {
        schema_map,
        layout: BackendLayout::new(backend_root),
        thresholds: QualityThresholds {
            qc: args.qc_threshold,
            cluster: args.cluster_threshold,
        },
        allele_call: AlleleCallSettings {
            program: args.allele_caller.clone(),
            cpus: args.cpus,
        },
        cluster: ClusterSettings {
            program: args.clusterer.clone(),
            levels,
            refs_date: args.refs_date.clone(),
        },
        scratch_root: args.scratch_dir.as_deref().map(PathBuf::from),
        keep_scratch: args.keep_scratch,
    };

    Ok(ValidationResult {
        source,
        taxonomy,
        output: args.output.clone().unwrap_or_else(|| "-".to_string()),
        summary: args.summary.as_deref().map(PathBuf::from),
        pipeline,
    })
}

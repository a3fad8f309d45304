// config.rs - Configuration file support

use crate::error::{Result, TypingError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    // Input/Output
    pub genome: Option<String>,
    pub fasta: Option<String>,
    pub taxid: Option<u32>,
    pub sample_id: Option<String>,
    pub output: Option<String>,
    pub summary: Option<String>,

    // Backend
    pub taxonomy: Option<String>,
    pub backend_root: Option<String>,
    pub refs_date: Option<String>,

    // Quality gate
    pub qc_threshold: Option<f64>,
    pub cluster_threshold: Option<f64>,
    pub hc_levels: Option<Vec<u32>>,

    // External tools
    pub cpus: Option<usize>,
    pub allele_caller: Option<String>,
    pub clusterer: Option<String>,

    // Scratch space
    pub scratch_dir: Option<String>,
    pub keep_scratch: Option<bool>,

    // Flags
    pub dry_run: Option<bool>,

    /// Extra taxon → schema bindings, keyed by taxid
    pub schemas: Option<BTreeMap<String, String>>,
}

impl Config {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            TypingError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config = Self::from_toml(&content).map_err(|e| {
            TypingError::Config(format!("Failed to parse config file '{}': {}", path.display(), e))
        })?;

        log::info!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| TypingError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, content).map_err(|e| {
            TypingError::Config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        log::info!("📄 Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Schema bindings from the `[schemas]` table
    pub fn schema_overrides(&self) -> Result<Vec<(u32, String)>> {
        let Some(schemas) = &self.schemas else {
            return Ok(Vec::new());
        };

        schemas
            .iter()
            .map(|(taxid, schema)| {
                let taxid = taxid.trim().parse::<u32>().map_err(|_| {
                    TypingError::Config(format!("Invalid taxid '{}' in [schemas]", taxid))
                })?;
                Ok((taxid, schema.clone()))
            })
            .collect()
    }

    /// Generate a sample configuration file with comments
    pub fn generate_sample() -> String {
        r#"# cgtyper.toml - Configuration file for cgtyper
# Command line arguments will override these settings

# =============================================================================
# INPUT/OUTPUT
# =============================================================================

# Genome container to type (JSON)
genome = "/path/to/genome.json"

# ...or build a fresh container from an assembly
# fasta = "/path/to/assembly.fasta"
# taxid = 1280
# sample_id = "SAMN00000001"

# Output genome container ("-" for stdout)
output = "typed_genome.json"

# One-line TSV typing summary
# summary = "typing_summary.tsv"

# =============================================================================
# BACKEND
# =============================================================================

# Taxonomy nodes file (taxid, parent taxid, ...) - NCBI nodes.dmp works too
taxonomy = "/path/to/nodes.dmp"

# Backend root: schemas/<schema>/, clusters/<schema>.npz, refs/<schema>_<date>_joined.tsv
backend_root = "/path/to/typing_backend"

# Pin the master profile table date (default: latest available)
# refs_date = "20240101"

# =============================================================================
# QUALITY GATE
# =============================================================================

# Minimum exact-match percentage for a "good" verdict
qc_threshold = 70.0

# Minimum exact-match percentage for cluster assignment
cluster_threshold = 85.0

# HC levels kept on the typing record
hc_levels = [0, 2, 5, 10, 20, 50, 100]

# =============================================================================
# EXTERNAL TOOLS
# =============================================================================

# CPUs passed to the allele caller
cpus = 4

# Executables
allele_caller = "chewBBACA.py"
clusterer = "pHierCC"

# =============================================================================
# SCRATCH SPACE
# =============================================================================

# Parent of the per-run scratch directory (omit for system temp)
# scratch_dir = "/scratch"

# Keep the scratch directory after the run
keep_scratch = false

# =============================================================================
# FLAGS
# =============================================================================

# Print external commands and use placeholder results
dry_run = false

# =============================================================================
# SCHEMA BINDINGS (added to / overriding the built-in table)
# =============================================================================

[schemas]
# "1280" = "staphylococcus_aureus"
# "90371" = "salmonella_enterica"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_config_parses() {
        let config = Config::from_toml(&Config::generate_sample()).unwrap();
        assert_eq!(config.qc_threshold, Some(70.0));
        assert_eq!(config.cluster_threshold, Some(85.0));
        assert_eq!(config.hc_levels, Some(vec![0, 2, 5, 10, 20, 50, 100]));
        assert_eq!(config.cpus, Some(4));
        assert!(config.schema_overrides().unwrap().is_empty());
    }

    #[test]
    fn test_schema_table() {
        let config = Config::from_toml("[schemas]\n\"1280\" = \"saureus_v2\"\n").unwrap();
        assert_eq!(
            config.schema_overrides().unwrap(),
            vec![(1280, "saureus_v2".to_string())]
        );

        let bad = Config::from_toml("[schemas]\nfoo = \"x\"\n").unwrap();
        assert!(bad.schema_overrides().is_err());
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cgtyper.toml");
        let config = Config {
            backend_root: Some("/srv/typing".to_string()),
            qc_threshold: Some(75.0),
            ..Config::new()
        };
        config.to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.backend_root.as_deref(), Some("/srv/typing"));
        assert_eq!(loaded.qc_threshold, Some(75.0));
        assert!(loaded.genome.is_none());
    }

    #[test]
    fn test_fasta_source_fields() {
        let config = Config::from_toml(
            "fasta = \"/data/a.fasta\"\ntaxid = 1280\nsample_id = \"SAMN001\"\n",
        )
        .unwrap();
        assert_eq!(config.fasta.as_deref(), Some("/data/a.fasta"));
        assert_eq!(config.taxid, Some(1280));
        assert_eq!(config.sample_id.as_deref(), Some("SAMN001"));
    }
}

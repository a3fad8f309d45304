// merge.rs - Merge configuration file with CLI arguments

use crate::cli::{Args, Config};
use crate::error::Result;

impl Args {
    /// Merge with configuration from file
    /// CLI arguments take precedence over config file values
    pub fn merge_with_config(mut self, config: Config) -> Result<Self> {
        // Input/Output
        if self.genome.is_none() {
            self.genome = config.genome.clone();
        }
        if self.fasta.is_none() {
            self.fasta = config.fasta.clone();
        }
        if self.taxid.is_none() {
            self.taxid = config.taxid;
        }
        if self.sample_id.is_none() {
            self.sample_id = config.sample_id.clone();
        }
        if self.output.is_none() {
            self.output = config.output.clone();
        }
        if self.summary.is_none() {
            self.summary = config.summary.clone();
        }

        // Backend
        if self.taxonomy.is_none() {
            self.taxonomy = config.taxonomy.clone();
        }
        if self.backend_root.is_none() {
            self.backend_root = config.backend_root.clone();
        }
        if self.refs_date.is_none() {
            self.refs_date = config.refs_date.clone();
        }

        // Quality gate (only override defaults, not explicit CLI values)
        if let Some(qc) = config.qc_threshold.filter(|_| self.qc_threshold == 70.0) {
            self.qc_threshold = qc;
        }
        if let Some(cluster) = config.cluster_threshold.filter(|_| self.cluster_threshold == 85.0) {
            self.cluster_threshold = cluster;
        }
        if let Some(levels) = config.hc_levels.as_ref().filter(|_| self.hc_levels == "0,2,5,10,20,50,100") {
            self.hc_levels = levels
                .iter()
                .map(|l| l.to_string())
                .collect::<Vec<_>>()
                .join(",");
        }

        // External tools
        if let Some(cpus) = config.cpus.filter(|_| self.cpus == 1) {
            self.cpus = cpus;
        }
        if let Some(program) = config.allele_caller.clone().filter(|_| self.allele_caller == "chewBBACA.py") {
            self.allele_caller = program;
        }
        if let Some(program) = config.clusterer.clone().filter(|_| self.clusterer == "pHierCC") {
            self.clusterer = program;
        }

        // Scratch space
        if self.scratch_dir.is_none() {
            self.scratch_dir = config.scratch_dir.clone();
        }
        if !self.keep_scratch && config.keep_scratch.unwrap_or(false) {
            self.keep_scratch = true;
        }

        // Flags (CLI flags take precedence, config only sets if not explicitly set)
        if !self.dry_run && config.dry_run.unwrap_or(false) {
            self.dry_run = true;
        }

        // Schema bindings: config first, so CLI overrides applied later win
        let mut overrides = config.schema_overrides()?;
        overrides.append(&mut self.schema_overrides);
        self.schema_overrides = overrides;

        Ok(self)
    }

    /// Load configuration and merge with CLI args
    pub fn with_config_file(self, config_path: &str) -> Result<Self> {
        let config = Config::from_file(config_path)?;
        self.merge_with_config(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argh::FromArgs;

    fn args(cli: &[&str]) -> Args {
        Args::from_args(&["cgtyper"], cli).unwrap()
    }

    #[test]
    fn test_config_fills_unset_values() {
        let config = Config::from_toml(
            "backend_root = \"/srv\"\nqc_threshold = 60.0\ncpus = 8\nhc_levels = [0, 5]\ndry_run = true\n",
        )
        .unwrap();
        let merged = args(&[]).merge_with_config(config).unwrap();

        assert_eq!(merged.backend_root.as_deref(), Some("/srv"));
        assert_eq!(merged.qc_threshold, 60.0);
        assert_eq!(merged.cpus, 8);
        assert_eq!(merged.hc_levels, "0,5");
        assert!(merged.dry_run);
    }

    #[test]
    fn test_cli_wins_over_config() {
        let config = Config::from_toml(
            "backend_root = \"/srv\"\nqc_threshold = 60.0\nclusterer = \"/opt/pHierCC\"\n",
        )
        .unwrap();
        let merged = args(&["--backend-root", "/data", "--qc-threshold", "75", "--clusterer", "hc"])
            .merge_with_config(config)
            .unwrap();

        assert_eq!(merged.backend_root.as_deref(), Some("/data"));
        assert_eq!(merged.qc_threshold, 75.0);
        assert_eq!(merged.clusterer, "hc");
    }

    #[test]
    fn test_fasta_source_from_config() {
        let config = Config::from_toml(
            "fasta = \"/data/a.fasta\"\ntaxid = 1280\nsample_id = \"from_config\"\n",
        )
        .unwrap();
        let merged = args(&["--sample-id", "from_cli"])
            .merge_with_config(config)
            .unwrap();

        assert_eq!(merged.fasta.as_deref(), Some("/data/a.fasta"));
        assert_eq!(merged.taxid, Some(1280));
        assert_eq!(merged.sample_id.as_deref(), Some("from_cli"));
    }

    #[test]
    fn test_cli_schema_override_applied_last() {
        let config = Config::from_toml("[schemas]\n\"1280\" = \"from_config\"\n").unwrap();
        let merged = args(&["--schema-override", "1280=from_cli"])
            .merge_with_config(config)
            .unwrap();

        assert_eq!(
            merged.schema_overrides,
            vec![
                (1280, "from_config".to_string()),
                (1280, "from_cli".to_string())
            ]
        );
    }
}

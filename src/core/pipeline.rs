// pipeline.rs - Typing pipeline orchestration

use crate::core::allele_call::{run_allele_call, AlleleCallSettings};
use crate::core::cluster::{run_clustering, ClusterSettings};
use crate::core::quality::{evaluate, QcVerdict, QualityThresholds};
use crate::core::record::attach_typing;
use crate::data::{GenomeRecord, TaxonomyService, TypingRecord};
use crate::error::{Result, TypingError};
use crate::schema::{BackendLayout, SchemaMap};
use crate::tools::ToolRunner;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Everything the pipeline needs besides its collaborators
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub schema_map: SchemaMap,
    pub layout: BackendLayout,
    pub thresholds: QualityThresholds,
    pub allele_call: AlleleCallSettings,
    pub cluster: ClusterSettings,
    /// Parent of the per-run scratch directory (system temp when unset)
    pub scratch_root: Option<PathBuf>,
    pub keep_scratch: bool,
}

/// Terminal state of a successful run
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    /// No schema bound to any taxon of the lineage; the genome is left untouched
    NoSchema,
    /// A typing record was appended to the genome
    Typed(Box<TypingRecord>),
}

/// Private working directory of one run
enum Scratch {
    Temp(TempDir),
    Kept(PathBuf),
    Virtual(PathBuf),
}

impl Scratch {
    fn path(&self) -> &Path {
        match self {
            Scratch::Temp(dir) => dir.path(),
            Scratch::Kept(path) | Scratch::Virtual(path) => path.as_path(),
        }
    }
}

/// Sequential typing pipeline for one genome
pub struct Pipeline<'a> {
    config: &'a PipelineConfig,
    taxonomy: &'a dyn TaxonomyService,
    runner: &'a dyn ToolRunner,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a PipelineConfig,
        taxonomy: &'a dyn TaxonomyService,
        runner: &'a dyn ToolRunner,
    ) -> Self {
        Self {
            config,
            taxonomy,
            runner,
        }
    }

    /// Schema for a taxon, walking its lineage from most specific to most general
    pub fn resolve_schema(&self, taxid: u32) -> Result<Option<String>> {
        let lineage = self.taxonomy.lineage(taxid)?;
        log::debug!("Lineage of {}: {:?}", taxid, lineage);
        Ok(self.config.schema_map.resolve(&lineage).map(str::to_string))
    }

    fn create_scratch(&self) -> Result<Scratch> {
        let root = self
            .config
            .scratch_root
            .clone()
            .unwrap_or_else(std::env::temp_dir);

        if self.runner.is_dry_run() {
            return Ok(Scratch::Virtual(root.join("cgtyper_dry_run")));
        }

        std::fs::create_dir_all(&root).map_err(|e| TypingError::io(&root, e))?;
        let dir = tempfile::Builder::new()
            .prefix("cgtyper_")
            .tempdir_in(&root)
            .map_err(|e| TypingError::io(&root, e))?;

        if self.config.keep_scratch {
            #[allow(deprecated)]
            let path = dir.into_path();
            log::info!("📂 Scratch directory kept at {}", path.display());
            Ok(Scratch::Kept(path))
        } else {
            log::debug!("Scratch directory {}", dir.path().display());
            Ok(Scratch::Temp(dir))
        }
    }

    /// Type `genome`. On error the genome is left unchanged.
    pub fn run(&self, genome: &mut GenomeRecord) -> Result<PipelineOutcome> {
        let schema = match self.resolve_schema(genome.taxid)? {
            Some(schema) => schema,
            None => {
                log::info!(
                    "ℹ️  No cgMLST schema available for '{}' (taxid {})",
                    genome.sample_id,
                    genome.taxid
                );
                return Ok(PipelineOutcome::NoSchema);
            }
        };
        log::info!("📚 Schema for '{}': {}", genome.sample_id, schema);

        let scratch = self.create_scratch()?;
        let schema_dir = self.config.layout.schema_dir(&schema);

        let allele_call = run_allele_call(
            self.runner,
            &self.config.allele_call,
            genome,
            &schema_dir,
            scratch.path(),
        )?;

        let qc = evaluate(&allele_call.calls, &self.config.thresholds);

        let cluster_levels = if qc.cluster_eligible && qc.verdict == QcVerdict::Good {
            Some(run_clustering(
                self.runner,
                &self.config.cluster,
                &allele_call.calls,
                &self.config.layout,
                &schema,
                scratch.path(),
            )?)
        } else {
            if qc.verdict != QcVerdict::Good {
                log::info!(
                    "⏭️  Clustering skipped: QC verdict is {} ({:.2}% exact, QC threshold {:.1}%)",
                    qc.verdict,
                    qc.percent_exact,
                    self.config.thresholds.qc
                );
            } else {
                log::info!(
                    "⏭️  Clustering skipped: {:.2}% exact is below the cluster threshold ({:.1}%)",
                    qc.percent_exact,
                    self.config.thresholds.cluster
                );
            }
            None
        };

        let record = attach_typing(
            genome,
            &allele_call.command,
            &schema,
            &allele_call.calls,
            &qc,
            cluster_levels,
        )?;

        Ok(PipelineOutcome::Typed(Box::new(record)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cluster::{DEFAULT_HC_LEVELS, QUERY_SENTINEL};
    use crate::data::{Contig, StaticTaxonomy};
    use crate::tools::command::{ALLELE_CALL_MATRIX, HIERCC_SUFFIX};
    use crate::tools::{DryRunRunner, Tool, ToolCommand, ToolOutput};
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::cell::RefCell;
    use std::fs;
    use std::io::Write;

    const LOCI: usize = 10;

    /// Writes the files the real tools would produce
    struct ScriptedRunner {
        call_row: Vec<String>,
        hiercc_row_id: String,
        invoked: RefCell<Vec<Tool>>,
    }

    impl ScriptedRunner {
        fn new(call_row: &[&str], hiercc_row_id: &str) -> Self {
            Self {
                call_row: call_row.iter().map(|s| s.to_string()).collect(),
                hiercc_row_id: hiercc_row_id.to_string(),
                invoked: RefCell::new(Vec::new()),
            }
        }

        fn arg_after(command: &ToolCommand, flag: &str) -> PathBuf {
            let idx = command.args.iter().position(|a| a == flag).unwrap();
            PathBuf::from(&command.args[idx + 1])
        }
    }

    impl ToolRunner for ScriptedRunner {
        fn run(&self, command: &ToolCommand) -> Result<ToolOutput> {
            self.invoked.borrow_mut().push(command.tool);
            match command.tool {
                Tool::AlleleCaller => {
                    let out = Self::arg_after(command, "-o");
                    fs::create_dir_all(&out).unwrap();
                    let header: Vec<String> =
                        (1..=self.call_row.len()).map(|i| format!("locus{}", i)).collect();
                    let content = format!(
                        "FILE\t{}\nS1\t{}\n",
                        header.join("\t"),
                        self.call_row.join("\t")
                    );
                    fs::write(out.join(ALLELE_CALL_MATRIX), content).unwrap();
                }
                Tool::Clusterer => {
                    let profile = Self::arg_after(command, "-p");
                    assert!(fs::read_to_string(&profile).unwrap().contains(QUERY_SENTINEL));
                    let prefix = Self::arg_after(command, "-o");
                    let mut name = prefix.into_os_string();
                    name.push(HIERCC_SUFFIX);
                    let file = fs::File::create(PathBuf::from(name)).unwrap();
                    let mut gz = GzEncoder::new(file, Compression::default());
                    write!(
                        gz,
                        "#ST_id\tHC0\tHC2\tHC5\tHC10\tHC20\tHC50\tHC100\tHC200\n\
                         ref_A\t1\t1\t1\t1\t1\t1\t1\t1\n\
                         {}\t4\t4\t3\t3\t2\t1\t1\t1\n",
                        self.hiercc_row_id
                    )
                    .unwrap();
                    gz.finish().unwrap();
                }
            }
            Ok(ToolOutput::default())
        }
    }

    fn backend(root: &Path) {
        let schema_dir = root.join("schemas").join("staphylococcus_aureus");
        fs::create_dir_all(&schema_dir).unwrap();
        fs::write(schema_dir.join("locus1.fasta"), ">1\nACGT\n").unwrap();

        fs::create_dir_all(root.join("refs")).unwrap();
        let header: Vec<String> = (1..=LOCI).map(|i| format!("locus{}", i)).collect();
        let row = vec!["1"; LOCI].join("\t");
        fs::write(
            root.join("refs").join("staphylococcus_aureus_20240101_joined.tsv"),
            format!("FILE\t{}\nref_A\t{}\n", header.join("\t"), row),
        )
        .unwrap();

        fs::create_dir_all(root.join("clusters")).unwrap();
        fs::write(root.join("clusters").join("staphylococcus_aureus.npz"), b"archive").unwrap();
    }

    fn config(root: &Path) -> PipelineConfig {
        PipelineConfig {
            schema_map: SchemaMap::from_pairs([(1280, "staphylococcus_aureus".to_string())]),
            layout: BackendLayout::new(root),
            thresholds: QualityThresholds { qc: 70.0, cluster: 85.0 },
            allele_call: AlleleCallSettings {
                program: "chewBBACA.py".to_string(),
                cpus: 1,
            },
            cluster: ClusterSettings {
                program: "pHierCC".to_string(),
                levels: DEFAULT_HC_LEVELS.to_vec(),
                refs_date: None,
            },
            scratch_root: Some(root.join("scratch")),
            keep_scratch: false,
        }
    }

    fn taxonomy() -> StaticTaxonomy {
        StaticTaxonomy::new()
            .with_lineage(9999, vec![2, 1280, 9999])
            .with_lineage(99999, vec![2, 99999])
    }

    fn genome(taxid: u32) -> GenomeRecord {
        GenomeRecord::new(
            "S1",
            taxid,
            vec![Contig {
                id: "contig_1".to_string(),
                sequence: "ACGTACGT".to_string(),
            }],
        )
    }

    #[test]
    fn test_resolves_schema_from_lineage() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let tax = taxonomy();
        let pipeline = Pipeline::new(&cfg, &tax, &DryRunRunner);
        assert_eq!(
            pipeline.resolve_schema(9999).unwrap().as_deref(),
            Some("staphylococcus_aureus")
        );
        assert_eq!(pipeline.resolve_schema(99999).unwrap(), None);
    }

    #[test]
    fn test_no_schema_leaves_genome_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let tax = taxonomy();
        let runner = ScriptedRunner::new(&[], "x");
        let mut g = genome(99999);
        let before = g.clone();

        let outcome = Pipeline::new(&cfg, &tax, &runner).run(&mut g).unwrap();
        assert_eq!(outcome, PipelineOutcome::NoSchema);
        assert_eq!(g, before);
        assert!(runner.invoked.borrow().is_empty());
    }

    #[test]
    fn test_poor_quality_skips_clustering() {
        let dir = tempfile::tempdir().unwrap();
        backend(dir.path());
        let cfg = config(dir.path());
        let tax = taxonomy();
        let runner = ScriptedRunner::new(&["5", "3", "novel", "0", "12"], QUERY_SENTINEL);
        let mut g = genome(9999);

        let outcome = Pipeline::new(&cfg, &tax, &runner).run(&mut g).unwrap();
        let PipelineOutcome::Typed(record) = outcome else {
            panic!("expected a typing record");
        };
        assert_eq!(record.loci_total, 5);
        assert_eq!(record.loci_called, 3);
        assert!((record.pct_called - 60.0).abs() < 1e-9);
        assert_eq!(record.qc_verdict, QcVerdict::Poor);
        assert!(record.cluster_levels.is_none());
        assert_eq!(*runner.invoked.borrow(), vec![Tool::AlleleCaller]);
        assert_eq!(g.typing_results.len(), 1);
        assert_eq!(g.analysis_events.len(), 1);
    }

    #[test]
    fn test_good_but_not_eligible_skips_clustering() {
        let dir = tempfile::tempdir().unwrap();
        backend(dir.path());
        let cfg = config(dir.path());
        let tax = taxonomy();
        let calls = ["1", "2", "3", "4", "5", "6", "7", "8", "LNF", "novel"];
        let runner = ScriptedRunner::new(&calls, QUERY_SENTINEL);
        let mut g = genome(9999);

        let outcome = Pipeline::new(&cfg, &tax, &runner).run(&mut g).unwrap();
        let PipelineOutcome::Typed(record) = outcome else {
            panic!("expected a typing record");
        };
        assert!((record.pct_called - 80.0).abs() < 1e-9);
        assert_eq!(record.qc_verdict, QcVerdict::Good);
        assert!(record.cluster_levels.is_none());
        assert_eq!(*runner.invoked.borrow(), vec![Tool::AlleleCaller]);
    }

    #[test]
    fn test_eligible_but_poor_skips_clustering() {
        let dir = tempfile::tempdir().unwrap();
        backend(dir.path());
        let mut cfg = config(dir.path());
        cfg.thresholds = QualityThresholds { qc: 90.0, cluster: 80.0 };
        let tax = taxonomy();
        // 17 of 20 exact: 85%
        let mut calls = vec!["7"; 17];
        calls.extend(["LNF", "PLOT3", "novel"]);
        let runner = ScriptedRunner::new(&calls, QUERY_SENTINEL);
        let mut g = genome(9999);

        let outcome = Pipeline::new(&cfg, &tax, &runner).run(&mut g).unwrap();
        let PipelineOutcome::Typed(record) = outcome else {
            panic!("expected a typing record");
        };
        assert!((record.pct_called - 85.0).abs() < 1e-9);
        assert_eq!(record.qc_verdict, QcVerdict::Poor);
        assert!(record.cluster_levels.is_none());
        assert_eq!(*runner.invoked.borrow(), vec![Tool::AlleleCaller]);
        assert_eq!(g.typing_results.len(), 1);
    }

    #[test]
    fn test_eligible_genome_gets_cluster_levels() {
        let dir = tempfile::tempdir().unwrap();
        backend(dir.path());
        let cfg = config(dir.path());
        let tax = taxonomy();
        let calls = ["1", "2", "3", "4", "5", "6", "7", "8", "9", "LNF"];
        let runner = ScriptedRunner::new(&calls, QUERY_SENTINEL);
        let mut g = genome(9999);

        let outcome = Pipeline::new(&cfg, &tax, &runner).run(&mut g).unwrap();
        let PipelineOutcome::Typed(record) = outcome else {
            panic!("expected a typing record");
        };
        assert_eq!(record.qc_verdict, QcVerdict::Good);
        let levels = record.cluster_levels.as_ref().unwrap();
        assert_eq!(levels.len(), DEFAULT_HC_LEVELS.len());
        assert_eq!(levels.get(0), Some(4));
        assert_eq!(levels.get(20), Some(2));
        assert_eq!(levels.get(200), None);
        assert_eq!(
            *runner.invoked.borrow(),
            vec![Tool::AlleleCaller, Tool::Clusterer]
        );

        // canonical backend files are never written
        let master = dir
            .path()
            .join("refs")
            .join("staphylococcus_aureus_20240101_joined.tsv");
        assert!(!fs::read_to_string(master).unwrap().contains(QUERY_SENTINEL));
        let archive = dir.path().join("clusters").join("staphylococcus_aureus.npz");
        assert_eq!(fs::read(archive).unwrap(), b"archive");
    }

    #[test]
    fn test_missing_sentinel_aborts_without_record() {
        let dir = tempfile::tempdir().unwrap();
        backend(dir.path());
        let cfg = config(dir.path());
        let tax = taxonomy();
        let calls = ["1", "2", "3", "4", "5", "6", "7", "8", "9", "LNF"];
        let runner = ScriptedRunner::new(&calls, "S1");
        let mut g = genome(9999);
        let before = g.clone();

        let err = Pipeline::new(&cfg, &tax, &runner).run(&mut g).unwrap_err();
        assert!(matches!(err, TypingError::SentinelNotFound { .. }));
        assert_eq!(g, before);
    }

    #[test]
    fn test_locus_mismatch_aborts() {
        let dir = tempfile::tempdir().unwrap();
        backend(dir.path());
        let cfg = config(dir.path());
        let tax = taxonomy();
        // 9 loci instead of the master's 10
        let runner = ScriptedRunner::new(&["1"; 9], QUERY_SENTINEL);
        let mut g = genome(9999);

        let err = Pipeline::new(&cfg, &tax, &runner).run(&mut g).unwrap_err();
        assert!(matches!(err, TypingError::LocusMismatch { .. }));
        assert!(g.typing_results.is_empty());
    }

    #[test]
    fn test_dry_run_is_repeatable() {
        let cfg = config(Path::new("/nonexistent/backend"));
        let tax = taxonomy();

        let mut first = genome(9999);
        let mut second = genome(9999);
        let a = Pipeline::new(&cfg, &tax, &DryRunRunner).run(&mut first).unwrap();
        let b = Pipeline::new(&cfg, &tax, &DryRunRunner).run(&mut second).unwrap();
        assert_eq!(a, b);

        let PipelineOutcome::Typed(record) = a else {
            panic!("expected a typing record");
        };
        assert!(record.cluster_levels.is_some());
        assert_eq!(
            first.analysis_events[0].parameters,
            second.analysis_events[0].parameters
        );
    }
}

// lib.rs - cgtyper library root

//! # cgtyper - cgMLST typing and hierarchical cluster assignment for bacterial genomes
//!
//! This library types a single assembled genome against the cgMLST schema bound to its
//! taxon, decides whether the resulting allele profile is good enough to keep, and places
//! high-quality profiles into the existing hierarchical clustering (HierCC) of the
//! schema's master profile table.
//!
//! ## Features
//!
//! - **Schema resolution**: taxon → schema bindings, resolved along the NCBI lineage
//! - **Allele calling**: chewBBACA-compatible invocation and result parsing
//! - **Quality gate**: configurable exact-match thresholds for QC and clustering
//! - **Cluster assignment**: pHierCC on a private snapshot of the backend tables
//! - **Dry-run mode**: every external command is printed, never executed
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use cgtyper::prelude::*;
//!
//! let config = PipelineConfig {
//!     schema_map: SchemaMap::builtin(),
//!     layout: BackendLayout::new("/srv/typing"),
//!     thresholds: QualityThresholds::default(),
//!     allele_call: AlleleCallSettings::default(),
//!     cluster: ClusterSettings::default(),
//!     scratch_root: None,
//!     keep_scratch: false,
//! };
//! let taxonomy = TaxonomyDb::from_file("nodes.dmp")?;
//! let runner = ProcessRunner::new(false);
//!
//! let mut genome = GenomeRecord::from_json_file("genome.json")?;
//! let outcome = Pipeline::new(&config, &taxonomy, &runner).run(&mut genome)?;
//! println!("{:?}", outcome);
//! # Ok::<(), cgtyper::TypingError>(())
//! ```

// Re-export all main modules
pub mod cli;
pub mod core;
pub mod data;
pub mod error;
pub mod output;
pub mod schema;
pub mod tools;

// Convenience prelude for common imports
pub mod prelude {
    pub use crate::cli::{validate_args, Args, ValidationResult};
    pub use crate::core::{AlleleCallSettings, ClusterLevels, ClusterSettings};
    pub use crate::core::{Pipeline, PipelineConfig, PipelineOutcome};
    pub use crate::core::{QcResult, QcVerdict, QualityThresholds};
    pub use crate::data::{AlleleCall, AlleleCallVector, GenomeRecord, TypingRecord};
    pub use crate::data::{StaticTaxonomy, TaxonomyDb, TaxonomyService};
    pub use crate::error::{Result, TypingError};
    pub use crate::output::{write_genome, write_summary};
    pub use crate::schema::{BackendLayout, SchemaMap};
    pub use crate::tools::{DryRunRunner, ProcessRunner, ToolRunner};
}

// Re-export main types at the root level for convenience
pub use cli::{Args, ValidationResult};
pub use core::{Pipeline, PipelineConfig, PipelineOutcome};
pub use data::{GenomeRecord, TypingRecord};
pub use error::TypingError;
pub use schema::SchemaMap;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library information
pub fn get_info() -> String {
    format!(
        "cgtyper v{} - cgMLST typing and hierarchical cluster assignment",
        VERSION
    )
}

// mod.rs - Core typing logic module

pub mod allele_call;
pub mod cluster;
pub mod pipeline;
pub mod quality;
pub mod record;

// Re-export main types for convenience
pub use allele_call::{parse_call_matrix, run_allele_call, AlleleCallOutcome, AlleleCallSettings};
pub use cluster::{
    parse_hiercc, run_clustering, ClusterLevels, ClusterSettings, DEFAULT_HC_LEVELS,
    QUERY_SENTINEL,
};
pub use pipeline::{Pipeline, PipelineConfig, PipelineOutcome};
pub use quality::{evaluate, QcResult, QcVerdict, QualityThresholds};
pub use record::{attach_typing, build_record};

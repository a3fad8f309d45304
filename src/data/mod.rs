// mod.rs - Data structures module

pub mod calls;
pub mod genome;
pub mod profile;
pub mod taxonomy;

// Re-export main types for convenience
pub use calls::{AlleleCall, AlleleCallVector};
pub use genome::{AnalysisEvent, Contig, GenomeRecord, TypingRecord, TYPING_METHOD};
pub use profile::{ProfileRow, ProfileTable};
pub use taxonomy::{StaticTaxonomy, TaxonomyDb, TaxonomyService};

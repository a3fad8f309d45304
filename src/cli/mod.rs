// mod.rs - Command line, configuration file and argument validation

pub mod args;
pub mod config;
pub mod merge;
pub mod validation;

pub use args::{parse_schema_override, Args};
pub use config::Config;
pub use validation::{parse_hc_levels, validate_args, GenomeSource, ValidationResult};

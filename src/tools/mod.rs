// mod.rs - External tool invocation

pub mod command;
pub mod runner;

pub use command::{require_nonempty, AlleleCallArgs, ClusterArgs, Tool, ToolCommand};
pub use runner::{DryRunRunner, ProcessRunner, ToolOutput, ToolRunner};

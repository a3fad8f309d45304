// runner.rs - Single seam for running external tools

use crate::error::{Result, TypingError};
use crate::tools::command::ToolCommand;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::ErrorKind;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Captured result of a finished tool
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

/// Executes tool commands. Every stage goes through this trait, so dry-run is one substitution.
pub trait ToolRunner {
    /// Run to completion; non-zero exit is an error
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput>;

    /// True when no process is started and stages must use placeholder data
    fn is_dry_run(&self) -> bool {
        false
    }
}

/// Runs tools as blocking child processes
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    show_progress: bool,
}

impl ProcessRunner {
    pub fn new(show_progress: bool) -> Self {
        Self { show_progress }
    }

    fn spinner(&self, command: &ToolCommand) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("running {}", command.tool));
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    }
}

impl ToolRunner for ProcessRunner {
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput> {
        log::info!("🚀 {}", command.command_line());
        let start = Instant::now();
        let spinner = self.spinner(command);

        let result = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output();

        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        let output = result.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                TypingError::ToolNotFound {
                    program: command.program.clone(),
                }
            } else {
                TypingError::ToolFailed {
                    tool: command.tool.to_string(),
                    status: "spawn failure".to_string(),
                    stderr: e.to_string(),
                }
            }
        })?;

        let elapsed = start.elapsed();
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(TypingError::ToolFailed {
                tool: command.tool.to_string(),
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        log::info!("✅ {} finished in {:.1}s", command.tool, elapsed.as_secs_f64());
        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            log::debug!("[{}] {}", command.tool, line);
        }

        Ok(ToolOutput {
            stdout,
            stderr,
            elapsed,
        })
    }
}

/// Logs commands instead of running them
#[derive(Debug, Clone, Default)]
pub struct DryRunRunner;

impl ToolRunner for DryRunRunner {
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput> {
        log::info!("🔎 [dry-run] {}", command.command_line());
        Ok(ToolOutput::default())
    }

    fn is_dry_run(&self) -> bool {
        true
    }
}

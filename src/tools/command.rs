// command.rs - Typed descriptors for external tool invocations

use std::fmt::{self, Display};
use std::path::{Path, PathBuf};

/// Relative path of the allele call matrix under the allele caller output directory
pub const ALLELE_CALL_MATRIX: &str = "results_alleles.tsv";

/// Suffix the clustering tool appends to its output prefix
pub const HIERCC_SUFFIX: &str = ".HierCC.gz";

/// External tools the pipeline delegates to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    AlleleCaller,
    Clusterer,
}

impl Tool {
    pub fn name(&self) -> &'static str {
        match self {
            Tool::AlleleCaller => "chewBBACA",
            Tool::Clusterer => "pHierCC",
        }
    }
}

impl Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Arguments of one allele calling run
#[derive(Debug, Clone, PartialEq)]
pub struct AlleleCallArgs {
    pub input_dir: PathBuf,
    pub schema_dir: PathBuf,
    pub output_dir: PathBuf,
    pub cpus: usize,
}

impl AlleleCallArgs {
    pub fn to_args(&self) -> Vec<String> {
        vec![
            "AlleleCall".to_string(),
            "-i".to_string(),
            self.input_dir.display().to_string(),
            "-g".to_string(),
            self.schema_dir.display().to_string(),
            "-o".to_string(),
            self.output_dir.display().to_string(),
            "--cpu".to_string(),
            self.cpus.to_string(),
            "--output-novel".to_string(),
            "--no-inferred".to_string(),
        ]
    }

    /// Matrix the allele caller writes for this run
    pub fn matrix_path(&self) -> PathBuf {
        self.output_dir.join(ALLELE_CALL_MATRIX)
    }
}

/// Arguments of one clustering run
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterArgs {
    pub profile: PathBuf,
    pub output_prefix: PathBuf,
    pub archive: PathBuf,
}

impl ClusterArgs {
    pub fn to_args(&self) -> Vec<String> {
        vec![
            "-p".to_string(),
            self.profile.display().to_string(),
            "-o".to_string(),
            self.output_prefix.display().to_string(),
            "-a".to_string(),
            self.archive.display().to_string(),
        ]
    }

    /// Compressed HC table the clusterer writes for this run
    pub fn hiercc_path(&self) -> PathBuf {
        let mut name = self.output_prefix.as_os_str().to_owned();
        name.push(HIERCC_SUFFIX);
        PathBuf::from(name)
    }
}

/// A fully specified external invocation
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCommand {
    pub tool: Tool,
    pub program: String,
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn allele_call(program: &str, args: &AlleleCallArgs) -> Self {
        Self {
            tool: Tool::AlleleCaller,
            program: program.to_string(),
            args: args.to_args(),
        }
    }

    pub fn cluster(program: &str, args: &ClusterArgs) -> Self {
        Self {
            tool: Tool::Clusterer,
            program: program.to_string(),
            args: args.to_args(),
        }
    }

    /// Space-joined command line for logs
    pub fn command_line(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(self.program.as_str());
        parts.extend(self.args.iter().map(String::as_str));
        parts.join(" ")
    }
}

/// Check that a step produced a non-empty file
pub fn require_nonempty(path: &Path) -> crate::error::Result<()> {
    use crate::error::TypingError;

    let metadata = std::fs::metadata(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            TypingError::MissingOutput(path.to_path_buf())
        } else {
            TypingError::io(path, e)
        }
    })?;

    if metadata.len() == 0 {
        return Err(TypingError::EmptyOutput(path.to_path_buf()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TypingError;

    #[test]
    fn test_allele_call_command() {
        let args = AlleleCallArgs {
            input_dir: PathBuf::from("/scratch/in"),
            schema_dir: PathBuf::from("/db/schemas/saureus"),
            output_dir: PathBuf::from("/scratch/out"),
            cpus: 4,
        };
        let cmd = ToolCommand::allele_call("chewBBACA.py", &args);
        assert_eq!(cmd.tool, Tool::AlleleCaller);
        assert_eq!(
            cmd.command_line(),
            "chewBBACA.py AlleleCall -i /scratch/in -g /db/schemas/saureus -o /scratch/out --cpu 4 --output-novel --no-inferred"
        );
        assert_eq!(args.matrix_path(), PathBuf::from("/scratch/out/results_alleles.tsv"));
    }

    #[test]
    fn test_cluster_output_path() {
        let args = ClusterArgs {
            profile: PathBuf::from("/scratch/clean.tsv"),
            output_prefix: PathBuf::from("/scratch/hc"),
            archive: PathBuf::from("/scratch/saureus.npz"),
        };
        assert_eq!(args.hiercc_path(), PathBuf::from("/scratch/hc.HierCC.gz"));
        let cmd = ToolCommand::cluster("pHierCC", &args);
        assert_eq!(cmd.args[0], "-p");
        assert_eq!(cmd.tool.name(), "pHierCC");
    }

    #[test]
    fn test_require_nonempty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            require_nonempty(&missing),
            Err(TypingError::MissingOutput(_))
        ));

        let empty = dir.path().join("empty");
        std::fs::write(&empty, "").unwrap();
        assert!(matches!(
            require_nonempty(&empty),
            Err(TypingError::EmptyOutput(_))
        ));

        let full = dir.path().join("full");
        std::fs::write(&full, "x").unwrap();
        assert!(require_nonempty(&full).is_ok());
    }
}

// allele_call.rs - Allele calling of one genome against a cgMLST schema

use crate::data::{AlleleCallVector, GenomeRecord};
use crate::error::{Result, TypingError};
use crate::tools::{require_nonempty, AlleleCallArgs, ToolCommand, ToolRunner};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Number of loci in the dry-run placeholder profile
const PLACEHOLDER_LOCI: usize = 10;

/// Settings of the allele calling stage
#[derive(Debug, Clone)]
pub struct AlleleCallSettings {
    pub program: String,
    pub cpus: usize,
}

impl Default for AlleleCallSettings {
    fn default() -> Self {
        Self {
            program: "chewBBACA.py".to_string(),
            cpus: 1,
        }
    }
}

/// Calls plus the exact invocation that produced them
#[derive(Debug, Clone)]
pub struct AlleleCallOutcome {
    pub calls: AlleleCallVector,
    pub command: ToolCommand,
}

/// Read the header and the first data row of an allele call matrix.
/// Nothing past the second line is read.
pub fn parse_call_matrix(path: &Path) -> Result<AlleleCallVector> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            TypingError::MissingOutput(path.to_path_buf())
        } else {
            TypingError::io(path, e)
        }
    })?;
    let mut lines = BufReader::new(file).lines();

    let header = lines
        .next()
        .ok_or_else(|| TypingError::EmptyOutput(path.to_path_buf()))?
        .map_err(|e| TypingError::io(path, e))?;

    let data = match lines.next() {
        Some(line) => line.map_err(|e| TypingError::io(path, e))?,
        None => return Err(TypingError::EmptyCallRow(path.to_path_buf())),
    };

    let header = header.trim_end_matches(['\r', '\n']);
    let data = data.trim_end_matches(['\r', '\n']);
    if data.trim().is_empty() {
        return Err(TypingError::EmptyCallRow(path.to_path_buf()));
    }

    let loci_names: Vec<String> = header.split('\t').skip(1).map(str::to_string).collect();
    let mut fields = data.split('\t');
    let sample_id = fields.next().unwrap_or_default();
    let raw_values: Vec<String> = fields.map(str::to_string).collect();

    if raw_values.is_empty() {
        return Err(TypingError::EmptyCallRow(path.to_path_buf()));
    }

    AlleleCallVector::from_row(sample_id, loci_names, raw_values)
        .map_err(|e| TypingError::Parse(format!("{} ({})", e, path.display())))
}

/// Deterministic calls used in dry-run mode
pub fn placeholder_calls(sample_id: &str) -> AlleleCallVector {
    let loci = (1..=PLACEHOLDER_LOCI)
        .map(|i| format!("placeholder_locus_{}", i))
        .collect();
    let values = vec!["1".to_string(); PLACEHOLDER_LOCI];
    AlleleCallVector {
        sample_id: sample_id.to_string(),
        calls: values.iter().map(|v| crate::data::AlleleCall::parse(v)).collect(),
        loci_names: loci,
        raw_values: values,
    }
}

/// File name of the input FASTA. Only `[A-Za-z0-9_-]` survive so the
/// sample id can never leave the input directory.
fn input_fasta_name(sample_id: &str) -> String {
    let stem: String = sample_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.trim_matches('_').is_empty() {
        "genome.fasta".to_string()
    } else {
        format!("{}.fasta", stem)
    }
}

/// Run the allele caller on `genome` inside `scratch_dir`
pub fn run_allele_call(
    runner: &dyn ToolRunner,
    settings: &AlleleCallSettings,
    genome: &GenomeRecord,
    schema_dir: &Path,
    scratch_dir: &Path,
) -> Result<AlleleCallOutcome> {
    let input_dir = scratch_dir.join("input");
    let args = AlleleCallArgs {
        input_dir: input_dir.clone(),
        schema_dir: schema_dir.to_path_buf(),
        output_dir: scratch_dir.join("allele_call"),
        cpus: settings.cpus.max(1),
    };
    let command = ToolCommand::allele_call(&settings.program, &args);

    if runner.is_dry_run() {
        runner.run(&command)?;
        return Ok(AlleleCallOutcome {
            calls: placeholder_calls(&genome.sample_id),
            command,
        });
    }

    if !schema_dir.is_dir() {
        return Err(TypingError::MissingOutput(schema_dir.to_path_buf()));
    }

    fs::create_dir_all(&input_dir).map_err(|e| TypingError::io(&input_dir, e))?;
    let fasta_path: PathBuf = input_dir.join(input_fasta_name(&genome.sample_id));
    genome.write_fasta(&fasta_path)?;
    require_nonempty(&fasta_path)?;

    log::info!(
        "🧬 Allele calling '{}' against {}",
        genome.sample_id,
        schema_dir.display()
    );
    runner.run(&command)?;

    let matrix = args.matrix_path();
    require_nonempty(&matrix)?;
    let calls = parse_call_matrix(&matrix)?;

    log::info!(
        "✅ {} loci called for '{}' ({} exact)",
        calls.len(),
        calls.sample_id,
        calls.exact_count()
    );
    Ok(AlleleCallOutcome { calls, command })
}

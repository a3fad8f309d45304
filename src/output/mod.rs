// mod.rs - Output writers

use crate::core::PipelineOutcome;
use crate::data::GenomeRecord;
use crate::error::{Result, TypingError};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Ensure parent directory exists before creating file
fn ensure_parent_dir(file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent).map_err(|e| TypingError::io(parent, e))?;
    }
    Ok(())
}

/// Serialize the genome container to `target` ("-" for stdout)
pub fn write_genome(genome: &GenomeRecord, target: &str) -> Result<()> {
    if target == "-" {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        genome.write_json(&mut handle)?;
        return Ok(());
    }

    let path = Path::new(target);
    ensure_parent_dir(path)?;
    let file = File::create(path).map_err(|e| TypingError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    genome.write_json(&mut writer)?;
    writer.flush().map_err(|e| TypingError::io(path, e))?;

    log::info!("✅ Genome container written to: {}", path.display());
    Ok(())
}

/// Header and row of the typing summary
pub fn summary_lines(
    genome: &GenomeRecord,
    outcome: &PipelineOutcome,
    hc_levels: &[u32],
) -> (String, String) {
    let mut header = vec![
        "sample_id".to_string(),
        "schema".to_string(),
        "loci_total".to_string(),
        "loci_called".to_string(),
        "loci_missing".to_string(),
        "pct_called".to_string(),
        "qc_verdict".to_string(),
    ];
    header.extend(hc_levels.iter().map(|l| format!("HC{}", l)));

    let mut row = vec![genome.sample_id.clone()];
    match outcome {
        PipelineOutcome::NoSchema => {
            row.push("none".to_string());
            row.extend(std::iter::repeat("NA".to_string()).take(header.len() - 2));
        }
        PipelineOutcome::Typed(record) => {
            row.push(record.schema_name.clone());
            row.push(record.loci_total.to_string());
            row.push(record.loci_called.to_string());
            row.push(record.loci_missing.to_string());
            row.push(format!("{:.2}", record.pct_called));
            row.push(record.qc_verdict.to_string());
            for level in hc_levels {
                let value = record
                    .cluster_levels
                    .as_ref()
                    .and_then(|l| l.get(*level))
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "NA".to_string());
                row.push(value);
            }
        }
    }

    (header.join("\t"), row.join("\t"))
}

/// Write a one-line TSV typing summary
pub fn write_summary(
    path: &Path,
    genome: &GenomeRecord,
    outcome: &PipelineOutcome,
    hc_levels: &[u32],
    command_line: &str,
) -> Result<()> {
    ensure_parent_dir(path)?;
    let file = File::create(path).map_err(|e| TypingError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    let (header, row) = summary_lines(genome, outcome, hc_levels);

    let write_err = |e: std::io::Error| TypingError::io(path, e);
    writeln!(writer, "# Command: {}", command_line).map_err(write_err)?;
    writeln!(
        writer,
        "# Generated: {}",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )
    .map_err(write_err)?;
    writeln!(writer, "# cgtyper v{}", env!("CARGO_PKG_VERSION")).map_err(write_err)?;
    writeln!(writer, "{}", header).map_err(write_err)?;
    writeln!(writer, "{}", row).map_err(write_err)?;
    writer.flush().map_err(write_err)?;

    log::info!("✅ Typing summary written to: {}", path.display());
    Ok(())
}

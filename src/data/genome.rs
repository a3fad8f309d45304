// genome.rs - Genome container with its analysis history

use crate::core::cluster::ClusterLevels;
use crate::core::quality::QcVerdict;
use crate::error::{Result, TypingError};
use bio::io::fasta;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Method tag written on every cgMLST typing record
pub const TYPING_METHOD: &str = "sequence_typing";

/// A single assembled contig
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contig {
    pub id: String,
    pub sequence: String,
}

/// Record of one external analysis run against the genome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisEvent {
    /// Assigned by the container when the event is appended
    #[serde(default)]
    pub event_id: String,
    pub tool_name: String,
    pub parameters: Vec<String>,
    pub execution_time: String,
    pub hostname: String,
}

/// Result of cgMLST typing for one genome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypingRecord {
    pub method: String,
    pub schema_name: String,
    pub allele_call_string: String,
    pub loci_total: usize,
    pub loci_called: usize,
    pub loci_missing: usize,
    pub pct_called: f64,
    pub qc_verdict: QcVerdict,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_levels: Option<ClusterLevels>,
    pub event_id: String,
}

/// Genome container: contigs, taxonomy and append-only analysis results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenomeRecord {
    pub sample_id: String,
    pub taxid: u32,
    #[serde(default)]
    pub contigs: Vec<Contig>,
    #[serde(default)]
    pub analysis_events: Vec<AnalysisEvent>,
    #[serde(default)]
    pub typing_results: Vec<TypingRecord>,
}

impl GenomeRecord {
    pub fn new(sample_id: &str, taxid: u32, contigs: Vec<Contig>) -> Self {
        Self {
            sample_id: sample_id.to_string(),
            taxid,
            contigs,
            analysis_events: Vec::new(),
            typing_results: Vec::new(),
        }
    }

    /// Load a serialized container
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| TypingError::io(path, e))?;
        let record: GenomeRecord = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            TypingError::Serialization(format!(
                "Failed to parse genome container '{}': {}",
                path.display(),
                e
            ))
        })?;

        log::info!(
            "🧬 Loaded genome '{}' (taxid {}, {} contigs)",
            record.sample_id,
            record.taxid,
            record.contigs.len()
        );
        Ok(record)
    }

    /// Build a fresh container from an assembly FASTA
    pub fn from_fasta<P: AsRef<Path>>(path: P, sample_id: &str, taxid: u32) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| TypingError::io(path, e))?;
        let reader = fasta::Reader::new(BufReader::new(file));

        let mut contigs = Vec::new();
        for record_result in reader.records() {
            let record = record_result.map_err(|e| {
                TypingError::Parse(format!("Invalid FASTA record in {}: {}", path.display(), e))
            })?;
            contigs.push(Contig {
                id: record.id().to_string(),
                sequence: String::from_utf8_lossy(record.seq()).into_owned(),
            });
        }

        if contigs.is_empty() {
            return Err(TypingError::Parse(format!(
                "No contigs found in {}",
                path.display()
            )));
        }

        log::info!(
            "🧬 Read {} contigs for '{}' from {}",
            contigs.len(),
            sample_id,
            path.display()
        );
        Ok(Self::new(sample_id, taxid, contigs))
    }

    /// Write all contigs to a FASTA file
    pub fn write_fasta<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| TypingError::io(path, e))?;
        let mut writer = fasta::Writer::new(BufWriter::new(file));

        for contig in &self.contigs {
            writer
                .write(&contig.id, None, contig.sequence.as_bytes())
                .map_err(|e| TypingError::io(path, e))?;
        }
        writer.flush().map_err(|e| TypingError::io(path, e))?;
        Ok(())
    }

    /// Append an analysis event and return its identifier
    pub fn add_event(&mut self, mut event: AnalysisEvent) -> String {
        let event_id = format!("event_{}", self.analysis_events.len() + 1);
        event.event_id = event_id.clone();
        self.analysis_events.push(event);
        event_id
    }

    pub fn add_typing(&mut self, record: TypingRecord) {
        self.typing_results.push(record);
    }

    pub fn write_json<W: Write>(&self, writer: &mut W) -> Result<()> {
        serde_json::to_writer_pretty(&mut *writer, self)?;
        writeln!(writer).map_err(|e| TypingError::Serialization(e.to_string()))?;
        Ok(())
    }
}

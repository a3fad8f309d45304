// profile.rs - Allelic profile tables shared with the clustering tool

use crate::data::calls::{AlleleCall, AlleleCallVector};
use crate::error::{Result, TypingError};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Token the clustering tool reads as "no allele"
pub const MISSING_TOKEN: &str = "0";

/// One row of a profile table
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileRow {
    pub sample_id: String,
    pub alleles: Vec<String>,
}

/// Samples × loci table of allele ids
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileTable {
    /// Header of the identifier column, preserved on write
    pub id_column: String,
    pub loci_names: Vec<String>,
    pub rows: Vec<ProfileRow>,
}

/// Reduce a raw allele value to a positive numeric id or the missing token
pub fn normalize_allele(raw: &str) -> String {
    match AlleleCall::parse(raw).allele_id() {
        Some(id) => id.to_string(),
        None => MISSING_TOKEN.to_string(),
    }
}

impl ProfileTable {
    /// Read a tab-separated profile table (first column = sample id)
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| TypingError::io(path, e))?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .quoting(false)
            .from_reader(BufReader::new(file));

        let headers = reader.headers()?.clone();
        if headers.len() < 2 {
            return Err(TypingError::Parse(format!(
                "Profile table '{}' must have an id column and at least one locus",
                path.display()
            )));
        }

        let id_column = headers[0].to_string();
        let loci_names: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let mut fields = record.iter();
            let sample_id = fields.next().unwrap_or_default().to_string();
            rows.push(ProfileRow {
                sample_id,
                alleles: fields.map(str::to_string).collect(),
            });
        }

        log::debug!(
            "Profile table {}: {} samples × {} loci",
            path.display(),
            rows.len(),
            loci_names.len()
        );
        Ok(Self {
            id_column,
            loci_names,
            rows,
        })
    }

    pub fn contains_sample(&self, sample_id: &str) -> bool {
        self.rows.iter().any(|r| r.sample_id == sample_id)
    }

    /// Join a genome's calls as a new row named `row_id`, in this table's locus order.
    /// The locus sets must match exactly.
    pub fn merge_calls(&mut self, calls: &AlleleCallVector, row_id: &str) -> Result<()> {
        let table_loci: HashSet<&str> = self.loci_names.iter().map(String::as_str).collect();
        let call_loci: HashSet<&str> = calls.loci_names.iter().map(String::as_str).collect();

        if table_loci != call_loci || call_loci.len() != calls.loci_names.len() {
            let mut missing: Vec<String> = table_loci
                .difference(&call_loci)
                .map(|s| s.to_string())
                .collect();
            let mut extra: Vec<String> = call_loci
                .difference(&table_loci)
                .map(|s| s.to_string())
                .collect();
            missing.sort();
            extra.sort();
            if missing.is_empty() && extra.is_empty() {
                return Err(TypingError::Parse(format!(
                    "Duplicate locus names in calls for '{}'",
                    calls.sample_id
                )));
            }
            return Err(TypingError::LocusMismatch { missing, extra });
        }

        if self.contains_sample(row_id) {
            return Err(TypingError::Parse(format!(
                "Profile table already contains a row named '{}'",
                row_id
            )));
        }

        let by_locus: HashMap<&str, &str> = calls
            .loci_names
            .iter()
            .map(String::as_str)
            .zip(calls.raw_values.iter().map(String::as_str))
            .collect();

        let alleles = self
            .loci_names
            .iter()
            .map(|locus| by_locus[locus.as_str()].to_string())
            .collect();

        self.rows.push(ProfileRow {
            sample_id: row_id.to_string(),
            alleles,
        });
        Ok(())
    }

    /// Copy of the table with every allele reduced to a numeric id or the missing token
    pub fn normalized(&self) -> Self {
        let rows = self
            .rows
            .iter()
            .map(|row| ProfileRow {
                sample_id: row.sample_id.clone(),
                alleles: row.alleles.iter().map(|a| normalize_allele(a)).collect(),
            })
            .collect();

        Self {
            id_column: self.id_column.clone(),
            loci_names: self.loci_names.clone(),
            rows,
        }
    }

    pub fn write_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| TypingError::io(path, e))?;
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .quote_style(csv::QuoteStyle::Never)
            .from_writer(BufWriter::new(file));

        let mut header = Vec::with_capacity(self.loci_names.len() + 1);
        header.push(self.id_column.as_str());
        header.extend(self.loci_names.iter().map(String::as_str));
        writer.write_record(&header)?;

        for row in &self.rows {
            let mut record = Vec::with_capacity(row.alleles.len() + 1);
            record.push(row.sample_id.as_str());
            record.extend(row.alleles.iter().map(String::as_str));
            writer.write_record(&record)?;
        }

        let mut inner = writer
            .into_inner()
            .map_err(|e| TypingError::Serialization(format!("Flush error: {}", e)))?;
        inner.flush().map_err(|e| TypingError::io(path, e))?;
        Ok(())
    }
}

// calls.rs - Allele call values for a single genome

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// chewBBACA classification codes that mean "no allele assigned"
const MISSING_CODES: &[&str] = &[
    "LNF", "PLOT3", "PLOT5", "LOTSC", "NIPH", "NIPHEM", "ALM", "ASM", "PAMA", "-", "NA",
];

/// Prefix chewBBACA puts on alleles inferred during the run
const INFERRED_PREFIX: &str = "INF-";

/// A decoded per-locus allele call
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlleleCall {
    /// Exact match against a known allele (strictly positive id)
    Exact(u64),
    /// Locus not found, truncated, paralogous or otherwise unassigned
    Missing,
    /// New allele that is not a numeric id
    Novel,
    /// Allele inferred during allele calling, with its id when numeric
    Inferred(Option<u64>),
}

impl AlleleCall {
    /// Decode a raw call value. Only strictly positive integers are exact.
    pub fn parse(raw: &str) -> Self {
        let value = raw.trim();

        if value.is_empty() || MISSING_CODES.contains(&value) {
            return AlleleCall::Missing;
        }

        if value.bytes().all(|b| b.is_ascii_digit()) {
            return match value.parse::<u64>() {
                Ok(0) => AlleleCall::Missing,
                Ok(id) => AlleleCall::Exact(id),
                // all digits but overflowing u64: still a new allele
                Err(_) => AlleleCall::Novel,
            };
        }

        if let Some(rest) = value.strip_prefix(INFERRED_PREFIX) {
            let id = rest.parse::<u64>().ok().filter(|id| *id > 0);
            return AlleleCall::Inferred(id);
        }

        AlleleCall::Novel
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, AlleleCall::Exact(_))
    }

    /// Numeric allele id usable by the clustering tool, if any
    pub fn allele_id(&self) -> Option<u64> {
        match self {
            AlleleCall::Exact(id) => Some(*id),
            AlleleCall::Inferred(id) => *id,
            AlleleCall::Missing | AlleleCall::Novel => None,
        }
    }
}

impl Display for AlleleCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlleleCall::Exact(id) => write!(f, "{}", id),
            AlleleCall::Missing => write!(f, "MISSING"),
            AlleleCall::Novel => write!(f, "NOVEL"),
            AlleleCall::Inferred(Some(id)) => write!(f, "{}{}", INFERRED_PREFIX, id),
            AlleleCall::Inferred(None) => write!(f, "INFERRED"),
        }
    }
}

/// Allele calls of exactly one genome, in schema locus order
#[derive(Debug, Clone, PartialEq)]
pub struct AlleleCallVector {
    pub sample_id: String,
    pub loci_names: Vec<String>,
    pub calls: Vec<AlleleCall>,
    /// Raw call values as written by the allele caller (identifier column removed)
    pub raw_values: Vec<String>,
}

impl AlleleCallVector {
    /// Build from a header and data row that already had the identifier column stripped
    pub fn from_row(
        sample_id: &str,
        loci_names: Vec<String>,
        raw_values: Vec<String>,
    ) -> Result<Self, String> {
        if loci_names.len() != raw_values.len() {
            return Err(format!(
                "Call row for '{}' has {} values, header names {} loci",
                sample_id,
                raw_values.len(),
                loci_names.len()
            ));
        }

        let calls = raw_values.iter().map(|v| AlleleCall::parse(v)).collect();

        Ok(Self {
            sample_id: sample_id.to_string(),
            loci_names,
            calls,
            raw_values,
        })
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn exact_count(&self) -> usize {
        self.calls.iter().filter(|c| c.is_exact()).count()
    }

    pub fn missing_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, AlleleCall::Missing))
            .count()
    }

    pub fn novel_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, AlleleCall::Novel))
            .count()
    }

    pub fn inferred_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, AlleleCall::Inferred(_)))
            .count()
    }

    /// Comma-joined raw row, stored on the typing record for convenience
    pub fn call_string(&self) -> String {
        self.raw_values.join(",")
    }
}

// quality.rs - Exact-match quality gate

use crate::data::AlleleCallVector;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

pub const DEFAULT_QC_THRESHOLD: f64 = 70.0;
pub const DEFAULT_CLUSTER_THRESHOLD: f64 = 85.0;

/// Quality verdict on the exact-match percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QcVerdict {
    Good,
    Poor,
}

impl Display for QcVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QcVerdict::Good => write!(f, "good"),
            QcVerdict::Poor => write!(f, "poor"),
        }
    }
}

/// Two independent percentage thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityThresholds {
    /// Minimum percentage for a `good` verdict
    pub qc: f64,
    /// Minimum percentage for clustering
    pub cluster: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            qc: DEFAULT_QC_THRESHOLD,
            cluster: DEFAULT_CLUSTER_THRESHOLD,
        }
    }
}

/// Call statistics and gate decisions for one genome
#[derive(Debug, Clone, PartialEq)]
pub struct QcResult {
    pub total_loci: usize,
    pub exact_matches: usize,
    pub percent_exact: f64,
    pub verdict: QcVerdict,
    pub cluster_eligible: bool,
}

impl QcResult {
    pub fn missing_loci(&self) -> usize {
        self.total_loci - self.exact_matches
    }
}

/// Percentage of exact calls; 0 when there are no loci
pub fn percent_exact(exact: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    100.0 * exact as f64 / total as f64
}

/// Classify counts against both thresholds
pub fn classify(exact: usize, total: usize, thresholds: &QualityThresholds) -> QcResult {
    let exact = exact.min(total);
    let pct = percent_exact(exact, total);

    let verdict = if pct >= thresholds.qc {
        QcVerdict::Good
    } else {
        QcVerdict::Poor
    };

    QcResult {
        total_loci: total,
        exact_matches: exact,
        percent_exact: pct,
        verdict,
        cluster_eligible: pct >= thresholds.cluster,
    }
}

/// Run the gate over a call vector
pub fn evaluate(calls: &AlleleCallVector, thresholds: &QualityThresholds) -> QcResult {
    let result = classify(calls.exact_count(), calls.len(), thresholds);

    log::info!(
        "🧪 QC: {}/{} exact ({:.2}%) → {} (qc ≥ {:.1}%), cluster eligible: {} (≥ {:.1}%)",
        result.exact_matches,
        result.total_loci,
        result.percent_exact,
        result.verdict,
        thresholds.qc,
        if result.cluster_eligible { "yes" } else { "no" },
        thresholds.cluster
    );
    if calls.novel_count() > 0 || calls.inferred_count() > 0 {
        log::debug!(
            "Non-exact calls: {} missing, {} novel, {} inferred",
            calls.missing_count(),
            calls.novel_count(),
            calls.inferred_count()
        );
    }

    result
}

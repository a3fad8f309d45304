// record.rs - Typing record assembly

use crate::core::cluster::ClusterLevels;
use crate::core::quality::{QcResult, QcVerdict};
use crate::data::{AlleleCallVector, AnalysisEvent, GenomeRecord, TypingRecord, TYPING_METHOD};
use crate::error::{Result, TypingError};
use crate::tools::ToolCommand;
use chrono::{SecondsFormat, Utc};

/// Name of the invoking host, "unknown" when it cannot be determined
pub fn hostname() -> String {
    if let Ok(name) = std::env::var("HOSTNAME") {
        if !name.trim().is_empty() {
            return name.trim().to_string();
        }
    }
    std::fs::read_to_string("/etc/hostname")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Analysis event for an allele calling invocation
pub fn build_event(command: &ToolCommand) -> AnalysisEvent {
    AnalysisEvent {
        event_id: String::new(),
        tool_name: command.tool.name().to_string(),
        parameters: command.args.clone(),
        execution_time: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        hostname: hostname(),
    }
}

/// Assemble a typing record. Cluster levels are only accepted for a good,
/// cluster-eligible result.
pub fn build_record(
    schema_name: &str,
    calls: &AlleleCallVector,
    qc: &QcResult,
    cluster_levels: Option<ClusterLevels>,
    event_id: &str,
) -> Result<TypingRecord> {
    if cluster_levels.is_some() && (qc.verdict != QcVerdict::Good || !qc.cluster_eligible) {
        return Err(TypingError::Config(format!(
            "cluster levels supplied for a genome that is not cluster eligible ({:.2}%, {})",
            qc.percent_exact, qc.verdict
        )));
    }

    Ok(TypingRecord {
        method: TYPING_METHOD.to_string(),
        schema_name: schema_name.to_string(),
        allele_call_string: calls.call_string(),
        loci_total: qc.total_loci,
        loci_called: qc.exact_matches,
        loci_missing: qc.missing_loci(),
        pct_called: qc.percent_exact,
        qc_verdict: qc.verdict,
        cluster_levels,
        event_id: event_id.to_string(),
    })
}

/// Append the event and the typing record to the genome, returning the record
pub fn attach_typing(
    genome: &mut GenomeRecord,
    command: &ToolCommand,
    schema_name: &str,
    calls: &AlleleCallVector,
    qc: &QcResult,
    cluster_levels: Option<ClusterLevels>,
) -> Result<TypingRecord> {
    let event = build_event(command);
    // validate before touching the container
    let draft = build_record(schema_name, calls, qc, cluster_levels, "")?;

    let event_id = genome.add_event(event);
    let record = TypingRecord { event_id, ..draft };
    genome.add_typing(record.clone());

    log::info!(
        "📝 Typing record added to '{}': {} {}/{} loci ({:.2}%) qc={}{}",
        genome.sample_id,
        record.schema_name,
        record.loci_called,
        record.loci_total,
        record.pct_called,
        record.qc_verdict,
        record
            .cluster_levels
            .as_ref()
            .map(|l| format!(" {}", l))
            .unwrap_or_default()
    );
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::quality::{classify, QualityThresholds};
    use crate::tools::{AlleleCallArgs, ToolCommand};
    use std::path::PathBuf;

    fn calls(values: &[&str]) -> AlleleCallVector {
        let loci = (1..=values.len()).map(|i| format!("l{}", i)).collect();
        AlleleCallVector::from_row("g", loci, values.iter().map(|s| s.to_string()).collect())
            .unwrap()
    }

    fn command() -> ToolCommand {
        ToolCommand::allele_call(
            "chewBBACA.py",
            &AlleleCallArgs {
                input_dir: PathBuf::from("in"),
                schema_dir: PathBuf::from("schema"),
                output_dir: PathBuf::from("out"),
                cpus: 1,
            },
        )
    }

    #[test]
    fn test_record_statistics() {
        let v = calls(&["5", "3", "novel", "0", "12"]);
        let qc = classify(v.exact_count(), v.len(), &QualityThresholds::default());
        let record = build_record("saureus", &v, &qc, None, "event_1").unwrap();

        assert_eq!(record.method, "sequence_typing");
        assert_eq!(record.allele_call_string, "5,3,novel,0,12");
        assert_eq!(record.loci_total, 5);
        assert_eq!(record.loci_called, 3);
        assert_eq!(record.loci_missing, 2);
        assert_eq!(record.loci_called + record.loci_missing, record.loci_total);
        assert_eq!(record.qc_verdict, QcVerdict::Poor);
        assert!(record.cluster_levels.is_none());
    }

    #[test]
    fn test_levels_rejected_for_ineligible_genome() {
        let v = calls(&["1", "0"]);
        let qc = classify(v.exact_count(), v.len(), &QualityThresholds::default());
        let levels = ClusterLevels::default();
        assert!(build_record("s", &v, &qc, Some(levels), "event_1").is_err());
    }

    #[test]
    fn test_attach_appends_event_then_record() {
        let mut genome = GenomeRecord::new("S1", 1280, Vec::new());
        let v = calls(&["1", "2", "3"]);
        let qc = classify(3, 3, &QualityThresholds::default());
        let record = attach_typing(&mut genome, &command(), "saureus", &v, &qc, None).unwrap();

        assert_eq!(genome.analysis_events.len(), 1);
        assert_eq!(genome.typing_results.len(), 1);
        assert_eq!(record.event_id, "event_1");
        assert_eq!(genome.analysis_events[0].tool_name, "chewBBACA");
        assert_eq!(genome.analysis_events[0].parameters[0], "AlleleCall");
        assert!(!genome.analysis_events[0].hostname.is_empty());
    }

    #[test]
    fn test_attach_leaves_container_untouched_on_error() {
        let mut genome = GenomeRecord::new("S1", 1280, Vec::new());
        let v = calls(&["0", "0"]);
        let qc = classify(0, 2, &QualityThresholds::default());
        let result = attach_typing(
            &mut genome,
            &command(),
            "saureus",
            &v,
            &qc,
            Some(ClusterLevels::default()),
        );
        assert!(result.is_err());
        assert!(genome.analysis_events.is_empty());
        assert!(genome.typing_results.is_empty());
    }
}

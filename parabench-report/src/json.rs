//! JSON Output

use crate::report::Report;

/// Generate a prettified JSON report.
///
/// The harness prints this to stdout; it never persists it.
pub fn generate_json_report(report: &Report) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{
        FailureInfo, ReportConfig, ReportMeta, SCHEMA_VERSION, ScenarioReport, SystemInfo,
    };
    use std::time::Duration;

    #[test]
    fn test_json_contains_status_and_schema() {
        let meta = ReportMeta {
            schema_version: SCHEMA_VERSION,
            version: "0.1.0".to_string(),
            timestamp: chrono::Utc::now(),
            system: SystemInfo {
                os: "linux".to_string(),
                arch: "x86_64".to_string(),
                cpu: "Test CPU".to_string(),
                cpu_cores: 4,
                parallelism_level: 4,
            },
            config: ReportConfig {
                iterations: 5,
                prime_limit: 100_000,
                io_rounds: 20,
                io_wait_ns: 5_000_000,
                io_post_work: 50_000,
                scalability_total_work: 10_000_000,
                scalability_task_counts: vec![1, 2, 4, 8, 16],
                settle_delay_ns: 10_000_000,
                quiesce: true,
                warmup: true,
                timeout_ns: 60_000_000_000,
            },
        };
        let scenarios = vec![ScenarioReport::failed(
            "cpu",
            "CPU",
            FailureInfo {
                kind: "task_failure".to_string(),
                message: "task 0: boom".to_string(),
            },
            Duration::from_millis(3),
        )];
        let report = Report::new(meta, scenarios, Duration::from_millis(3));

        let json = generate_json_report(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["meta"]["schema_version"], 1);
        assert_eq!(value["scenarios"][0]["status"], "failed");
        assert_eq!(value["summary"]["failed"], 1);
        assert!(report.has_failures());
    }
}

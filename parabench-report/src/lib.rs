#![warn(missing_docs)]
//! Parabench Report - Result Model and Output Formats
//!
//! Generates:
//! - Human-readable terminal output (streamed per scenario)
//! - JSON (machine-readable, printed to stdout; never written to disk)

mod human;
mod json;
mod report;

pub use human::{
    format_duration, format_human_summary, format_iteration, format_scenario_header,
    format_scenario_result, format_system_header,
};
pub use json::generate_json_report;
pub use report::{
    FailureInfo, LevelComparisonReport, LevelMetrics, Report, ReportConfig, ReportMeta,
    ReportSummary, SCHEMA_VERSION, ScalabilityReport, ScalabilityRow, ScenarioOutcome,
    ScenarioReport, ScenarioStatus, SystemInfo,
};

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable terminal output
    #[default]
    Human,
    /// JSON document with the full report
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" | "text" => Ok(OutputFormat::Human),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_output_format() {
        assert_eq!("human".parse::<OutputFormat>(), Ok(OutputFormat::Human));
        assert_eq!("TEXT".parse::<OutputFormat>(), Ok(OutputFormat::Human));
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("html".parse::<OutputFormat>().is_err());
    }
}

//! Human-Readable Output
//!
//! Terminal output is streamed: the system header first, then for each
//! scenario a header, one progress line per iteration and a results block.

use crate::report::{
    LevelComparisonReport, Report, ReportMeta, ScalabilityReport, ScenarioOutcome,
    ScenarioReport, ScenarioStatus,
};
use std::time::Duration;

const RULE_WIDTH: usize = 60;

/// Format a duration with three decimals in the largest fitting unit
pub fn format_duration(d: Duration) -> String {
    let nanos = d.as_nanos();
    if nanos >= 1_000_000_000 {
        format!("{:.3}s", d.as_secs_f64())
    } else if nanos >= 1_000_000 {
        format!("{:.3}ms", nanos as f64 / 1_000_000.0)
    } else if nanos >= 1_000 {
        format!("{:.3}µs", nanos as f64 / 1_000.0)
    } else {
        format!("{}ns", nanos)
    }
}

fn format_ratio(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}x", v),
        None => "undefined".to_string(),
    }
}

fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1}%", v),
        None => "undefined".to_string(),
    }
}

/// Banner with system information, printed once before any scenario
pub fn format_system_header(meta: &ReportMeta) -> String {
    let mut output = String::new();
    output.push_str("Concurrency vs Parallelism Benchmark\n");
    output.push_str(&"=".repeat(RULE_WIDTH));
    output.push('\n');
    output.push_str(&format!("CPU Cores: {}\n", meta.system.cpu_cores));
    output.push_str(&format!(
        "Parallel Level: {}\n",
        meta.system.parallelism_level
    ));
    output.push_str(&format!("CPU: {}\n", meta.system.cpu));
    output.push_str(&format!("OS/Arch: {}/{}\n", meta.system.os, meta.system.arch));
    output.push_str(&format!("parabench {}\n", meta.version));
    output
}

/// Title line and rule opening a scenario
pub fn format_scenario_header(title: &str) -> String {
    format!("\n{}\n{}\n", title, "-".repeat(RULE_WIDTH))
}

/// Progress line for one iteration
pub fn format_iteration(iteration: usize, total: usize) -> String {
    format!("   Iteration {}/{}...\n", iteration, total)
}

/// Results block for a finished scenario
pub fn format_scenario_result(scenario: &ScenarioReport) -> String {
    let mut output = String::new();

    match scenario.status {
        ScenarioStatus::Completed => match &scenario.outcome {
            Some(ScenarioOutcome::Levels(levels)) => format_levels(&mut output, levels),
            Some(ScenarioOutcome::Scalability(scaling)) => format_scalability(&mut output, scaling),
            None => {}
        },
        ScenarioStatus::Failed => {
            output.push_str("\n   FAILED");
            if let Some(failure) = &scenario.failure {
                output.push_str(&format!(" ({}): {}", failure.kind, failure.message));
            }
            output.push('\n');
        }
        ScenarioStatus::Skipped => {
            output.push_str("\n   SKIPPED");
            if let Some(failure) = &scenario.failure {
                output.push_str(&format!(": {}", failure.message));
            }
            output.push('\n');
        }
    }

    output.push('\n');
    output
}

fn format_levels(output: &mut String, levels: &LevelComparisonReport) {
    if levels.iterations > 1 {
        output.push_str(&format!(
            "\n   Results (avg of {} runs, {} tasks):\n",
            levels.iterations, levels.task_count
        ));
        output.push_str(&format!(
            "   Concurrent:  {} (±{:.1}ms)  [{} worker]\n",
            format_duration(levels.concurrent.mean()),
            levels.concurrent.stddev_ms(),
            levels.concurrent.level
        ));
        output.push_str(&format!(
            "   Parallel:    {} (±{:.1}ms)  [{} workers]\n",
            format_duration(levels.parallel.mean()),
            levels.parallel.stddev_ms(),
            levels.parallel.level
        ));
    } else {
        output.push_str(&format!("   Tasks:       {}\n", levels.task_count));
        output.push_str(&format!(
            "   Concurrent:  {}\n",
            format_duration(levels.concurrent.mean())
        ));
        output.push_str(&format!(
            "   Parallel:    {}\n",
            format_duration(levels.parallel.mean())
        ));
    }

    output.push_str(&format!("   Speedup:     {}\n", format_ratio(levels.speedup)));
    output.push_str(&format!(
        "   Efficiency:  {}\n",
        format_percent(levels.efficiency)
    ));
    output.push_str(&format!("   Theoretical Max: {}x\n", levels.theoretical_max));
    if let Some(error) = &levels.metric_error {
        output.push_str(&format!("   Warning: {}\n", error));
    }
    if let Some(note) = &levels.note {
        output.push_str(&format!("   Note: {}\n", note));
    }
}

fn format_scalability(output: &mut String, scaling: &ScalabilityReport) {
    output.push_str(&format!(
        "   Workers: {}  Total work: {}\n",
        scaling.level, scaling.total_work
    ));
    output.push_str("   Tasks      | Work/task  | Time       | Speedup\n");
    output.push_str("   -----------|------------|------------|--------\n");
    for row in &scaling.rows {
        let marker = if Some(row.tasks) == scaling.baseline_tasks {
            " (baseline)"
        } else {
            ""
        };
        output.push_str(&format!(
            "   {:<10} | {:<10} | {:<10} | {}{}\n",
            row.tasks,
            row.work_per_task,
            format_duration(row.duration()),
            format_ratio(row.speedup),
            marker
        ));
    }
    if !scaling.skipped.is_empty() {
        let skipped: Vec<String> = scaling.skipped.iter().map(ToString::to_string).collect();
        output.push_str(&format!(
            "   Skipped task counts above the ceiling: {}\n",
            skipped.join(", ")
        ));
    }
}

/// Closing summary over all scenarios
pub fn format_human_summary(report: &Report) -> String {
    let mut output = String::new();
    output.push_str("Summary\n");
    output.push_str(&"-".repeat(RULE_WIDTH));
    output.push('\n');
    output.push_str(&format!(
        "  Total: {}  Completed: {}  Failed: {}  Skipped: {}\n",
        report.summary.total_scenarios,
        report.summary.completed,
        report.summary.failed,
        report.summary.skipped
    ));
    output.push_str(&format!(
        "  Duration: {:.2} ms\n",
        report.summary.total_duration_ms
    ));
    output
}

#![warn(missing_docs)]
//! Parabench CLI Library
//!
//! Orchestrates the benchmark suite behind the `parabench` binary:
//! - Configuration from `parabench.toml` layered under CLI flags
//! - Scenario selection by regex filter
//! - Sequential scenario execution with per-scenario failure isolation
//! - Human (streamed) or JSON (end of run) reporting on stdout
//!
//! Use `parabench_cli::run()` in a main function to get the full CLI.

mod config;
mod metadata;
mod planner;
mod suite;

pub use config::*;
pub use metadata::{build_report_meta, system_info};
pub use planner::{ExecutionPlan, build_plan};
pub use suite::*;

use anyhow::Context;
use clap::{Parser, Subcommand};
use parabench_report::{
    OutputFormat, Report, ScenarioReport, format_human_summary, format_iteration,
    format_scenario_header, format_scenario_result, format_system_header, generate_json_report,
};
use regex::Regex;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Parabench CLI arguments
#[derive(Parser, Debug)]
#[command(name = "parabench")]
#[command(
    author,
    version,
    about = "Parabench - concurrent vs parallel execution of lightweight tasks"
)]
pub struct Cli {
    /// Optional subcommand (List, Run); defaults to Run
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Filter scenarios (cpu, io, mixed, scalability) by regex pattern
    #[arg(default_value = ".*")]
    pub filter: String,

    /// Output format: human, json
    #[arg(long, default_value = "human")]
    pub format: String,

    /// Configuration file (default: discover parabench.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Measurements per level in the CPU and I/O scenarios
    #[arg(long, short = 'n')]
    pub iterations: Option<usize>,

    /// Parallel level (default: available cores)
    #[arg(long, short = 'p')]
    pub parallel_level: Option<usize>,

    /// Per-measurement timeout in seconds (0 disables)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Skip the warm-up fan-out before each scenario
    #[arg(long)]
    pub no_warmup: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// List the scenarios selected by the filter
    List,
    /// Run the selected scenarios (default)
    Run,
}

/// Run the Parabench CLI with the process arguments.
///
/// # Returns
/// Returns `Ok(())` on success, or an error if configuration is invalid.
/// Exits the process with status 1 when any scenario failed.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the Parabench CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the report
    let filter = if cli.verbose {
        "parabench=debug"
    } else {
        "parabench=info"
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let format: OutputFormat = cli.format.parse().map_err(anyhow::Error::msg)?;
    let filter_re = Regex::new(&cli.filter)
        .with_context(|| format!("invalid scenario filter '{}'", cli.filter))?;
    let plan = build_plan(Some(&filter_re));

    let config = load_config(&cli)?;
    let suite_config = build_suite_config(&cli, config)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::List => list_scenarios(&plan, &suite_config),
        Commands::Run => run_scenarios(&plan, suite_config, format),
    }
}

/// `--config` if given, else the discovered file, else defaults
fn load_config(cli: &Cli) -> anyhow::Result<ParabenchConfig> {
    match &cli.config {
        Some(path) => ParabenchConfig::load(path),
        None => Ok(ParabenchConfig::discover()?.unwrap_or_default()),
    }
}

/// Layer CLI flags over the file configuration, then validate.
pub fn build_suite_config(cli: &Cli, mut config: ParabenchConfig) -> anyhow::Result<SuiteConfig> {
    if let Some(iterations) = cli.iterations {
        config.runner.iterations = iterations;
    }
    if let Some(level) = cli.parallel_level {
        config.runner.parallel_level = Some(level);
    }
    if let Some(secs) = cli.timeout {
        config.runner.timeout = format!("{}s", secs);
    }
    if cli.no_warmup {
        config.runner.warmup = false;
    }

    config
        .suite_config()
        .context("invalid benchmark configuration")
}

fn list_scenarios(plan: &ExecutionPlan, config: &SuiteConfig) -> anyhow::Result<()> {
    println!("Parabench Plan:");
    let level = config.parallel_level;

    for kind in &plan.scenarios {
        let detail = match (kind, kind.task_count(level)) {
            (ScenarioKind::Mixed, Some(tasks)) => format!("{} tasks, single run", tasks),
            (_, Some(tasks)) => {
                format!("{} tasks, {} iterations", tasks, config.iterations)
            }
            (_, None) => {
                let (measured, _) = config.scalability.partition(level);
                let counts: Vec<String> = measured.iter().map(ToString::to_string).collect();
                format!("task counts [{}]", counts.join(", "))
            }
        };
        println!("├── {}: {} ({})", kind.id(), kind.title(), detail);
    }

    println!(
        "{} scenarios selected, parallel level {}.",
        plan.scenarios.len(),
        level
    );
    Ok(())
}

fn run_scenarios(
    plan: &ExecutionPlan,
    config: SuiteConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    if plan.is_empty() {
        println!("No scenarios matched.");
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
        warn!("Ctrl-C handler not installed: {}", e);
    }

    let meta = build_report_meta(&config);
    let mut suite = BenchmarkSuite::new(config)?.with_cancellation(cancel);

    let start_time = Instant::now();
    let scenarios = match format {
        OutputFormat::Human => {
            print!("{}", format_system_header(&meta));
            let mut observer = HumanObserver;
            suite.run(&plan.scenarios, &mut observer)
        }
        OutputFormat::Json => suite.run(&plan.scenarios, &mut SilentObserver),
    };
    let report = Report::new(meta, scenarios, start_time.elapsed());

    match format {
        OutputFormat::Human => print!("{}", format_human_summary(&report)),
        OutputFormat::Json => println!("{}", generate_json_report(&report)?),
    }
    std::io::stdout().flush()?;

    // Exit with appropriate code
    if report.has_failures() {
        eprintln!(
            "\n{} scenario(s) failed, {} skipped",
            report.summary.failed, report.summary.skipped
        );
        std::process::exit(1);
    }

    Ok(())
}

/// Streams human-readable progress to stdout as the suite runs
#[derive(Debug, Default, Clone, Copy)]
pub struct HumanObserver;

impl HumanObserver {
    fn emit(&self, text: &str) {
        print!("{}", text);
        let _ = std::io::stdout().flush();
    }
}

impl SuiteObserver for HumanObserver {
    fn scenario_started(&mut self, kind: ScenarioKind) {
        self.emit(&format_scenario_header(kind.title()));
    }

    fn iteration_started(&mut self, _kind: ScenarioKind, iteration: usize, total: usize) {
        self.emit(&format_iteration(iteration, total));
    }

    fn scenario_finished(&mut self, report: &ScenarioReport) {
        if report.status == parabench_report::ScenarioStatus::Skipped {
            self.emit(&format_scenario_header(&report.title));
        }
        self.emit(&format_scenario_result(report));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::try_parse_from([
            "parabench",
            "--format",
            "json",
            "-n",
            "3",
            "--parallel-level",
            "2",
            "--timeout",
            "0",
            "--no-warmup",
            "cpu|io",
        ])
        .unwrap();

        assert_eq!(cli.filter, "cpu|io");
        assert_eq!(cli.format, "json");
        assert_eq!(cli.iterations, Some(3));
        assert_eq!(cli.parallel_level, Some(2));
        assert!(cli.no_warmup);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_list_subcommand() {
        let cli = Cli::try_parse_from(["parabench", "list"]).unwrap();
        assert_eq!(cli.command, Some(Commands::List));
        assert_eq!(cli.filter, ".*");
    }

    #[test]
    fn test_cli_overrides_file_config() {
        let cli = Cli::try_parse_from([
            "parabench",
            "-n",
            "2",
            "-p",
            "3",
            "--timeout",
            "0",
            "--no-warmup",
        ])
        .unwrap();
        let mut file = ParabenchConfig::default();
        file.runner.iterations = 9;
        file.runner.parallel_level = Some(8);

        let config = build_suite_config(&cli, file).unwrap();
        assert_eq!(config.iterations, 2);
        assert_eq!(config.parallel_level.get(), 3);
        assert_eq!(config.timeout, None);
        assert!(!config.warmup);
    }

    #[test]
    fn test_invalid_override_is_a_config_error() {
        let cli = Cli::try_parse_from(["parabench", "--parallel-level", "0"]).unwrap();
        let err = build_suite_config(&cli, ParabenchConfig::default()).unwrap_err();
        let config_error = err.downcast_ref::<parabench_core::ConfigError>().unwrap();
        assert_eq!(
            *config_error,
            parabench_core::ConfigError::InvalidParallelism(0)
        );
    }
}

//! System Metadata Collection
//!
//! Collects system information for report metadata.
//!
//! ## Collected Data
//!
//! - **OS**: Operating system name and architecture
//! - **CPU**: Model name and core count
//! - **Parallelism**: Level the suite runs its parallel measurements at
//! - **Timestamp**: UTC time of report generation
//!
//! The CPU model is Linux-specific and degrades to "Unknown" elsewhere.

use crate::suite::SuiteConfig;
use chrono::Utc;
use parabench_report::{ReportConfig, ReportMeta, SCHEMA_VERSION, SystemInfo};
use std::time::Duration;

/// Build report metadata for a run with `config`
pub fn build_report_meta(config: &SuiteConfig) -> ReportMeta {
    ReportMeta {
        schema_version: SCHEMA_VERSION,
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        system: system_info(config),
        config: report_config(config),
    }
}

/// Host description plus the parallel level in use
pub fn system_info(config: &SuiteConfig) -> SystemInfo {
    SystemInfo {
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        cpu: get_cpu_model().unwrap_or_else(|| "Unknown".to_string()),
        cpu_cores: num_cpus(),
        parallelism_level: config.parallel_level.get(),
    }
}

fn report_config(config: &SuiteConfig) -> ReportConfig {
    ReportConfig {
        iterations: config.iterations,
        prime_limit: config.prime_limit,
        io_rounds: config.io.rounds,
        io_wait_ns: nanos(config.io.wait),
        io_post_work: config.io.post_io_work,
        scalability_total_work: config.scalability.total_work,
        scalability_task_counts: config.scalability.task_counts.clone(),
        settle_delay_ns: nanos(config.settle_delay),
        quiesce: config.quiesce,
        warmup: config.warmup,
        timeout_ns: config.timeout.map(nanos).unwrap_or(0),
    }
}

fn nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

/// Get CPU model name from /proc/cpuinfo (Linux only)
fn get_cpu_model() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/cpuinfo")
            .ok()
            .and_then(|content| {
                content
                    .lines()
                    .find(|l| l.starts_with("model name"))
                    .and_then(|l| l.split(':').nth(1))
                    .map(|s| s.trim().to_string())
            })
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

/// Get number of available CPU cores
fn num_cpus() -> u32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parabench_core::ParallelismLevel;

    #[test]
    fn test_meta_reflects_config() {
        let config = SuiteConfig {
            parallel_level: ParallelismLevel::new(3).unwrap(),
            timeout: None,
            ..SuiteConfig::default()
        };

        let meta = build_report_meta(&config);
        assert_eq!(meta.schema_version, SCHEMA_VERSION);
        assert_eq!(meta.system.parallelism_level, 3);
        assert!(meta.system.cpu_cores >= 1);
        assert_eq!(meta.system.os, std::env::consts::OS);
        assert_eq!(meta.config.iterations, 5);
        assert_eq!(meta.config.io_wait_ns, 5_000_000);
        assert_eq!(meta.config.timeout_ns, 0);
    }
}

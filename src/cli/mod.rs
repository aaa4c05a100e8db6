// Copyright 2024-2026 Workshop Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI support for the `workshop-sim` binary.
//!
//! ## Usage
//!
//! ```bash
//! workshop-sim                       # every canonical scenario, both schedulers
//! workshop-sim scenario 20 5 5       # one scenario
//! workshop-sim config show           # effective configuration
//! ```

pub mod config_cmd;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::WorkshopConfig;
use crate::scheduler::{RunContext, SchedulerKind};
use crate::simulation::{run_scenario, RunReport, Scenario};
use crate::telemetry::{EventSink, NullSink, TracingSink};

/// Options for a batch of scenario runs.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub schedulers: Vec<SchedulerKind>,
    pub scenarios: Vec<Scenario>,
    /// Print reports as JSON lines instead of text.
    pub json: bool,
    /// Emit one log line per stage entry/exit.
    pub trace_events: bool,
}

impl RunOptions {
    pub fn from_config(config: &WorkshopConfig) -> Self {
        Self {
            schedulers: SchedulerKind::ALL.to_vec(),
            scenarios: config.scenarios(),
            json: false,
            trace_events: true,
        }
    }
}

/// Parse `continuous`, `batched` or `both`.
pub fn parse_schedulers(value: &str) -> Result<Vec<SchedulerKind>, String> {
    if value.eq_ignore_ascii_case("both") {
        return Ok(SchedulerKind::ALL.to_vec());
    }
    value.parse::<SchedulerKind>().map(|k| vec![k])
}

/// Parse the flags of the default `run` command (arguments after the command
/// name). Positional arguments are rejected.
pub fn parse_run_args(args: &[String], config: &WorkshopConfig) -> Result<RunOptions, String> {
    let mut options = RunOptions::from_config(config);
    let positional = parse_flags(args, &mut options)?;
    match positional.first() {
        Some(value) => Err(format!("Unknown argument: {value}")),
        None => Ok(options),
    }
}

/// Parse `<vehicles> <slots> <servers>` plus flags (arguments after
/// `scenario`).
pub fn parse_scenario_args(args: &[String], config: &WorkshopConfig) -> Result<RunOptions, String> {
    let mut options = RunOptions::from_config(config);
    let numbers = parse_flags(args, &mut options)?
        .into_iter()
        .map(|value| {
            value
                .parse::<usize>()
                .map_err(|_| format!("Invalid argument: {value}"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    match numbers.as_slice() {
        [vehicles, slots, servers] => {
            options.scenarios = vec![Scenario::new(*vehicles, *slots, *servers)];
            Ok(options)
        }
        _ => Err("Expected <vehicles> <slots> <servers>".to_string()),
    }
}

/// Apply `--scheduler`, `--json`, `--quiet` and skip `--config FILE`.
/// Returns the positional arguments; unknown flags are an error.
fn parse_flags<'a>(args: &'a [String], options: &mut RunOptions) -> Result<Vec<&'a str>, String> {
    let mut positional = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--scheduler" => {
                let value = args.get(i + 1).ok_or("Missing value for --scheduler")?;
                options.schedulers = parse_schedulers(value)?;
                i += 2;
            }
            "--config" => {
                if i + 1 >= args.len() {
                    return Err("Missing value for --config".to_string());
                }
                i += 2;
            }
            "--json" => {
                options.json = true;
                i += 1;
            }
            "--quiet" => {
                options.trace_events = false;
                i += 1;
            }
            flag if flag.starts_with("--") => return Err(format!("Unknown option: {flag}")),
            value => {
                positional.push(value);
                i += 1;
            }
        }
    }
    Ok(positional)
}

/// Run every scenario with every requested scheduler, printing one report
/// per run. Returns the process exit code.
pub async fn run_scenarios(
    config: &WorkshopConfig,
    options: &RunOptions,
    shutdown: CancellationToken,
) -> i32 {
    let sink: Arc<dyn EventSink> = if options.trace_events {
        Arc::new(TracingSink)
    } else {
        Arc::new(NullSink)
    };

    let mut failures = 0;
    for scenario in &options.scenarios {
        for &kind in &options.schedulers {
            if shutdown.is_cancelled() {
                return 1;
            }
            // Fresh clock per run so seeded runs are reproducible one by one.
            let context = RunContext::new(config.build_clock())
                .with_sink(sink.clone())
                .with_config(config.scheduler_config())
                .with_shutdown(shutdown.clone());

            match run_scenario(kind, *scenario, context).await {
                Ok(report) => print_report(&report, options.json),
                Err(e) => {
                    eprintln!("{kind} {scenario}: {e}");
                    failures += 1;
                }
            }
        }
    }

    i32::from(failures > 0)
}

fn print_report(report: &RunReport, json: bool) {
    if json {
        match serde_json::to_string(report) {
            Ok(line) => println!("{line}"),
            Err(e) => eprintln!("failed to encode report: {e}"),
        }
    } else {
        println!("{report}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_schedulers_accepts_both() {
        assert_eq!(parse_schedulers("both").unwrap(), SchedulerKind::ALL.to_vec());
        assert_eq!(parse_schedulers("batched").unwrap(), vec![SchedulerKind::Batched]);
        assert!(parse_schedulers("fifo").is_err());
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn run_args_accept_shared_flags() {
        let config = WorkshopConfig::default();
        let options =
            parse_run_args(&args(&["--quiet", "--json", "--scheduler", "batched"]), &config).unwrap();
        assert!(options.json);
        assert!(!options.trace_events);
        assert_eq!(options.schedulers, vec![SchedulerKind::Batched]);
        assert_eq!(options.scenarios, Scenario::CANONICAL.to_vec());

        let options = parse_run_args(&args(&["--config", "workshop.toml"]), &config).unwrap();
        assert!(options.trace_events);
    }

    #[test]
    fn run_args_reject_unknown_input() {
        let config = WorkshopConfig::default();
        assert!(parse_run_args(&args(&["--verbose"]), &config).is_err());
        assert!(parse_run_args(&args(&["20"]), &config).is_err());
        assert!(parse_run_args(&args(&["--scheduler"]), &config).is_err());
        assert!(parse_run_args(&args(&["--config"]), &config).is_err());
    }

    #[test]
    fn scenario_args_need_three_counts() {
        let config = WorkshopConfig::default();
        let options =
            parse_scenario_args(&args(&["20", "5", "5", "--scheduler", "both"]), &config).unwrap();
        assert_eq!(options.scenarios, vec![Scenario::new(20, 5, 5)]);
        assert_eq!(options.schedulers, SchedulerKind::ALL.to_vec());

        assert!(parse_scenario_args(&args(&["20", "5"]), &config).is_err());
        assert!(parse_scenario_args(&args(&["20", "5", "five"]), &config).is_err());
        assert!(parse_scenario_args(&args(&["20", "5", "5", "--fast"]), &config).is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn run_scenarios_reports_success() {
        let config = WorkshopConfig {
            time_unit_ms: 1,
            seed: Some(5),
            ..Default::default()
        };
        let options = RunOptions {
            schedulers: SchedulerKind::ALL.to_vec(),
            scenarios: vec![Scenario::new(4, 2, 2)],
            json: true,
            trace_events: false,
        };
        let code = run_scenarios(&config, &options, CancellationToken::new()).await;
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn run_scenarios_counts_failures() {
        let config = WorkshopConfig { time_unit_ms: 1, ..Default::default() };
        let options = RunOptions {
            schedulers: vec![SchedulerKind::Batched],
            scenarios: vec![Scenario::new(2, 0, 1)],
            json: false,
            trace_events: false,
        };
        assert_eq!(run_scenarios(&config, &options, CancellationToken::new()).await, 1);
    }
}

//! Workshop simulator entry point.
//!
//! ## CLI Subcommands
//!
//! - `workshop-sim` or `workshop-sim run` - Every configured scenario, both schedulers
//! - `workshop-sim scenario <vehicles> <slots> <servers>` - One scenario
//! - `workshop-sim config show|defaults|validate` - Inspect configuration

use std::process::ExitCode;

use tokio_util::sync::CancellationToken;

use workshop_core::cli::{
    config_cmd, parse_run_args, parse_scenario_args, run_scenarios, RunOptions,
};
use workshop_core::config::{self as ws_config, WorkshopConfig};
use workshop_core::telemetry::init_logging;

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("run");
    let rest = args.get(2..).unwrap_or_default();

    match command {
        "run" | "" => run_command(&args, rest, "run", parse_run_args).await,
        flag if flag.starts_with("--") && !matches!(flag, "--help" | "--version") => {
            run_command(&args, &args[1..], "run", parse_run_args).await
        }
        "scenario" => run_command(&args, rest, "scenario", parse_scenario_args).await,
        "config" => {
            let subcommand = args
                .get(2)
                .map(|s| s.as_str())
                .filter(|s| !s.starts_with("--"))
                .unwrap_or("show");
            match subcommand {
                "defaults" => {
                    config_cmd::run_defaults();
                    ExitCode::SUCCESS
                }
                "show" | "validate" => {
                    let config = match load_config(&args) {
                        Ok(config) => config,
                        Err(code) => return code,
                    };
                    if subcommand == "show" {
                        config_cmd::run_show(&config);
                        ExitCode::SUCCESS
                    } else {
                        ExitCode::from(config_cmd::run_validate(&config) as u8)
                    }
                }
                _ => {
                    eprintln!("Unknown config subcommand: {}", subcommand);
                    print_command_help("config");
                    ExitCode::FAILURE
                }
            }
        }
        "help" | "--help" | "-h" => {
            if let Some(subcommand) = args.get(2) {
                print_command_help(subcommand);
            } else {
                print_usage();
            }
            ExitCode::SUCCESS
        }
        "version" | "--version" | "-V" => {
            println!("workshop-sim {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            ExitCode::FAILURE
        }
    }
}

/// Load config, parse the command's arguments and run, exiting with 2 on a
/// usage error.
async fn run_command(
    args: &[String],
    rest: &[String],
    command: &str,
    parse: fn(&[String], &WorkshopConfig) -> Result<RunOptions, String>,
) -> ExitCode {
    let config = match load_config(args) {
        Ok(config) => config,
        Err(code) => return code,
    };
    match parse(rest, &config) {
        Ok(options) => execute(&config, &options).await,
        Err(msg) => {
            eprintln!("{msg}");
            print_command_help(command);
            ExitCode::from(2u8)
        }
    }
}

/// Start logging, hook Ctrl-C to the shutdown token and run the scenarios.
async fn execute(config: &WorkshopConfig, options: &RunOptions) -> ExitCode {
    if let Err(e) = init_logging(&config.log) {
        eprintln!("Logging disabled: {}", e);
    }

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Interrupt received, cancelling run...");
            signal_token.cancel();
        }
    });

    let code = run_scenarios(config, options, shutdown).await;
    ExitCode::from(code as u8)
}

/// Environment config, optionally layered over a `--config FILE` TOML file.
fn load_config(args: &[String]) -> Result<WorkshopConfig, ExitCode> {
    let Some(pos) = args.iter().position(|a| a == "--config") else {
        return Ok(ws_config::load());
    };
    let Some(path) = args.get(pos + 1) else {
        eprintln!("Missing value for --config");
        return Err(ExitCode::from(2u8));
    };
    match WorkshopConfig::from_file(path) {
        Ok(config) => Ok(config.with_env_overrides()),
        Err(e) => {
            eprintln!("{}: {}", path, e);
            Err(ExitCode::from(2u8))
        }
    }
}

fn print_usage() {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        "workshop-sim - repair workshop scheduling simulator v{}

USAGE:
    workshop-sim [COMMAND] [OPTIONS]

COMMANDS:
    run          Run every configured scenario with both schedulers (default)
    scenario     Run one scenario
    config       Inspect configuration (show, defaults, validate)
    version      Show version information
    help         Show this help message

OPTIONS:
    --config FILE  Load a TOML configuration file
    --json         Print reports as JSON lines
    --quiet        Do not log stage events
    --scheduler S  continuous, batched or both (default: both)
    -h, --help     Show help for command
    -V, --version  Show version information

ENVIRONMENT:
    WORKSHOP_TIME_UNIT_MS     Length of one service unit (default: 1000)
    WORKSHOP_SEED             Jitter seed (default: OS entropy)
    WORKSHOP_JITTER           Apply +/-1 unit jitter (default: true)
    WORKSHOP_IDLE_BACKOFF_MS  Max idle wait of a pipeline worker (default: 10)
    WORKSHOP_DEADLINE_SECS    Abort a run after this many seconds
    WORKSHOP_LOG_FORMAT       pretty or json
    WORKSHOP_LOG_LEVEL        Log filter (default: info)

EXIT CODES:
    0  Success
    1  A run failed or was cancelled
    2  Usage or configuration error
",
        version
    );
}

/// Print detailed help for a specific command.
fn print_command_help(command: &str) {
    match command {
        "run" => {
            eprintln!(
                "workshop-sim run - Run every configured scenario

USAGE:
    workshop-sim [run] [OPTIONS]

OPTIONS:
    --scheduler S  continuous, batched or both (default: both)
    --json         Print reports as JSON lines
    --quiet        Do not log stage events
    --config FILE  Load a TOML configuration file
"
            );
        }
        "scenario" => {
            eprintln!(
                "workshop-sim scenario - Run one scenario

USAGE:
    workshop-sim scenario <VEHICLES> <SLOTS> <SERVERS> [OPTIONS]

OPTIONS:
    --scheduler S  continuous, batched or both (default: both)
    --json         Print reports as JSON lines
    --quiet        Do not log stage events
    --config FILE  Load a TOML configuration file

EXAMPLES:
    workshop-sim scenario 20 5 5
    WORKSHOP_TIME_UNIT_MS=10 workshop-sim scenario 5 5 20 --scheduler batched
"
            );
        }
        "config" => {
            eprintln!(
                "workshop-sim config - Inspect configuration

USAGE:
    workshop-sim config <SUBCOMMAND> [--config FILE]

SUBCOMMANDS:
    show           Show the effective configuration
    defaults       Show default configuration
    validate       Warn about settings that cannot run
"
            );
        }
        _ => {
            eprintln!(
                "No detailed help available for '{}'. Use 'workshop-sim help' for general usage.",
                command
            );
        }
    }
}

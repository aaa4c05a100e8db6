// Copyright 2024-2026 Workshop Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! Config CLI subcommands: show, defaults, validate.

use crate::config::WorkshopConfig;

/// Print effective config as key-value pairs to stdout.
pub fn run_show(config: &WorkshopConfig) {
    for line in config.effective_lines() {
        println!("{line}");
    }
    for scenario in config.scenarios() {
        println!("SCENARIO {scenario}");
    }
}

/// Print default config values (no env overrides) to stdout.
pub fn run_defaults() {
    run_show(&WorkshopConfig::default());
}

/// Validate configuration for obvious misconfigurations.
///
/// Returns 0 if valid, 1 if any warnings are found.
pub fn run_validate(config: &WorkshopConfig) -> i32 {
    let warnings = config.warnings();
    for warning in &warnings {
        eprintln!("WARNING: {warning}");
    }
    if warnings.is_empty() {
        println!("Configuration is valid.");
        0
    } else {
        1
    }
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Conduction-time sweep over persisted runs.
//!
//! Loads every run record under the output directory, reduces each to its
//! conduction time and prints the sorted table as CSV on stdout. Logs go to
//! stderr.

use std::io;
use std::path::PathBuf;
use std::process;

use branchwave::analysis::{RunStore, SweepKey, SweepTable, DEFAULT_SWEEP_KEYS};
use branchwave::observability::{debug_flags_help, init_logging, parse_debug_flags};
use tracing::{info, warn};

struct Args {
    output_dir: PathBuf,
    sort: Vec<SweepKey>,
    stimulation_aware: bool,
    log_level: String,
}

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: conduction_sweep [--output-dir <path>] [--sort <key>[,<key>]]\n\
         [--stimulation-aware] [--log-level <level>] [--debug-<crate>]\n\n\
         Defaults:\n\
         - output-dir: output\n\
         - sort: theta,width_ratio\n\
         - log-level: warn\n\n\
         {}",
        debug_flags_help()
    );
    process::exit(2);
}

fn parse_sort_keys(value: &str) -> Vec<SweepKey> {
    value
        .split(',')
        .filter(|key| !key.trim().is_empty())
        .map(|key| {
            key.parse().unwrap_or_else(|e: String| {
                eprintln!("{e}");
                usage_and_exit()
            })
        })
        .collect()
}

fn parse_args() -> Args {
    let mut parsed = Args {
        output_dir: PathBuf::from("output"),
        sort: DEFAULT_SWEEP_KEYS.to_vec(),
        stimulation_aware: false,
        log_level: "warn".to_string(),
    };

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--output-dir" => {
                let v = args.next().unwrap_or_else(|| usage_and_exit());
                parsed.output_dir = PathBuf::from(v);
            }
            "--sort" => {
                let v = args.next().unwrap_or_else(|| usage_and_exit());
                parsed.sort = parse_sort_keys(&v);
            }
            "--stimulation-aware" => parsed.stimulation_aware = true,
            "--log-level" => {
                parsed.log_level = args.next().unwrap_or_else(|| usage_and_exit());
            }
            "-h" | "--help" => usage_and_exit(),
            // Read again by parse_debug_flags
            other if other.starts_with("--debug-") => {}
            other => {
                eprintln!("Unknown argument: {other}");
                usage_and_exit();
            }
        }
    }

    parsed
}

fn main() {
    let args = parse_args();

    let _logging = init_logging(&parse_debug_flags(), &args.log_level, None, None)
        .unwrap_or_else(|e| {
            eprintln!("Failed to initialize logging: {e:#}");
            process::exit(2);
        });

    let store = RunStore::new(&args.output_dir);
    let runs = store.load_all().unwrap_or_else(|e| {
        eprintln!("Failed to load runs from {}: {e}", args.output_dir.display());
        process::exit(1);
    });
    if runs.is_empty() {
        warn!("[SWEEP] No runs found under {}", args.output_dir.display());
    }

    let mut table = SweepTable::from_runs(&runs, args.stimulation_aware);
    table.sort_by_keys(&args.sort);

    for series in table.series_by_width_ratio() {
        let defined = series.points.iter().filter(|(_, t)| t.is_defined()).count();
        info!(
            "[SWEEP] width ratio {}: {} runs, {} with a defined conduction time",
            series.width_ratio,
            series.points.len(),
            defined
        );
    }

    if let Err(e) = table.write_csv(io::stdout().lock()) {
        eprintln!("Failed to write sweep table: {e}");
        process::exit(1);
    }
}

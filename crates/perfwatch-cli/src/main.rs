// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Operator tool for the perfwatch telemetry store.
// Run with: perfwatch --store <PATH> <command>

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "perfwatch", version, about = "Record, inspect and export performance telemetry")]
struct Cli {
    /// JSON file holding the persisted telemetry state.
    #[arg(long, env = "PERFWATCH_STORE", default_value = "perfwatch-store.json")]
    store: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Record JSON-lines metric and violation records from a file or stdin.
    Ingest {
        /// Input file; reads stdin when omitted.
        file: Option<PathBuf>,
    },
    /// Record one metric sample.
    RecordMetric {
        category: String,
        name: String,
        value: f64,
        /// Epoch milliseconds; defaults to now.
        #[arg(long)]
        timestamp: Option<i64>,
    },
    /// Record one threshold violation.
    RecordViolation {
        metric: String,
        value: f64,
        threshold: f64,
        /// Epoch milliseconds; defaults to now.
        #[arg(long)]
        timestamp: Option<i64>,
    },
    /// Print the current report as JSON.
    Report,
    /// Write the current report to a timestamped file.
    Export {
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Drop every series and violation tracker.
    Clear,
    /// Run one retention pass now.
    Sweep,
    /// Poll the report and log its summary.
    Watch {
        /// Poll interval; defaults to the engine's report poll interval.
        #[arg(long)]
        interval_ms: Option<u64>,
        /// Stop after this many polls.
        #[arg(long)]
        count: Option<u64>,
    },
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut service = commands::open_service(&cli.store)?;
    let engine = service.engine();

    let result = match cli.command {
        Command::Ingest { file } => commands::ingest::run(&engine, file.as_deref()),
        Command::RecordMetric {
            category,
            name,
            value,
            timestamp,
        } => commands::ingest::record_metric(&engine, category, name, value, timestamp),
        Command::RecordViolation {
            metric,
            value,
            threshold,
            timestamp,
        } => commands::ingest::record_violation(&engine, metric, value, threshold, timestamp),
        Command::Report => commands::report::print(&engine),
        Command::Export { out_dir } => commands::report::export(&engine, &out_dir),
        Command::Clear => commands::report::clear(&engine),
        Command::Sweep => commands::report::sweep(&engine),
        Command::Watch { interval_ms, count } => {
            commands::report::watch(&engine, interval_ms, count)
        }
    };

    service.shutdown();
    result
}

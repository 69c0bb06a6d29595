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

use anyhow::{Context, Result};
use perfwatch_telemetry::{PerformanceReport, TelemetryEngine};
use std::io::{self, Write};
use std::path::Path;
use std::thread;
use std::time::Duration;

pub fn print(engine: &TelemetryEngine) -> Result<()> {
    let bytes = engine.report().to_pretty_json()?;
    let mut stdout = io::stdout().lock();
    stdout.write_all(&bytes)?;
    writeln!(stdout)?;
    Ok(())
}

pub fn export(engine: &TelemetryEngine, out_dir: &Path) -> Result<()> {
    let path = engine
        .report()
        .export_to_dir(out_dir, chrono::Utc::now())
        .with_context(|| format!("failed to export report into {}", out_dir.display()))?;
    println!("{}", path.display());
    Ok(())
}

pub fn clear(engine: &TelemetryEngine) -> Result<()> {
    engine.clear();
    println!("Cleared all metrics and violations");
    Ok(())
}

pub fn sweep(engine: &TelemetryEngine) -> Result<()> {
    let stats = engine.sweep_now();
    println!(
        "Removed {} samples and {} violation records older than {}",
        stats.samples_removed, stats.records_removed, stats.cutoff
    );
    Ok(())
}

pub fn watch(engine: &TelemetryEngine, interval_ms: Option<u64>, count: Option<u64>) -> Result<()> {
    let interval = interval_ms
        .map(Duration::from_millis)
        .unwrap_or(engine.config().report_poll_interval);

    let mut polls = 0;
    loop {
        log::info!("{}", summary_line(&engine.report()));
        polls += 1;
        if count.is_some_and(|limit| polls >= limit) {
            return Ok(());
        }
        thread::sleep(interval);
    }
}

/// One-line rendering of a report summary.
pub fn summary_line(report: &PerformanceReport) -> String {
    let mut line = format!(
        "{} series, {} outstanding violations",
        report.metrics.len(),
        report.summary.total_violations
    );
    for (key, avg) in &report.summary.critical_metrics {
        line.push_str(&format!(" | {key} avg {avg:.2}"));
    }
    for issue in &report.summary.recent_issues {
        line.push_str(&format!(
            " | {} x{} (last {})",
            issue.metric, issue.count, issue.last_violation
        ));
    }
    line
}

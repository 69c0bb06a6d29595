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
use perfwatch_core::telemetry::{InboundRecord, MetricRecord, ViolationEvent};
use perfwatch_telemetry::TelemetryEngine;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Outcome of an ingest run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub metrics: usize,
    pub violations: usize,
    pub skipped: usize,
}

pub fn run(engine: &TelemetryEngine, file: Option<&Path>) -> Result<()> {
    let summary = match file {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
            ingest_lines(engine, BufReader::new(file))?
        }
        None => ingest_lines(engine, io::stdin().lock())?,
    };
    println!(
        "Ingested {} metrics and {} violations ({} lines skipped)",
        summary.metrics, summary.violations, summary.skipped
    );
    Ok(())
}

/// Records every JSON line from `reader`. Blank lines are ignored; lines that
/// do not parse or validate are logged and counted as skipped.
pub fn ingest_lines(engine: &TelemetryEngine, reader: impl BufRead) -> Result<IngestSummary> {
    let mut summary = IngestSummary::default();
    for (index, line) in reader.lines().enumerate() {
        let line = line.context("failed to read input")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let record = match serde_json::from_str::<InboundRecord>(line) {
            Ok(record) => record,
            Err(e) => {
                log::warn!("Line {}: not a metric or violation record: {e}", index + 1);
                summary.skipped += 1;
                continue;
            }
        };
        if let Err(e) = record.validate() {
            log::warn!("Line {}: {e}", index + 1);
            summary.skipped += 1;
            continue;
        }

        match record {
            InboundRecord::Metric(_) => summary.metrics += 1,
            InboundRecord::Violation(_) => summary.violations += 1,
        }
        engine.record(record);
    }
    Ok(summary)
}

pub fn record_metric(
    engine: &TelemetryEngine,
    category: String,
    name: String,
    value: f64,
    timestamp: Option<i64>,
) -> Result<()> {
    let timestamp = timestamp.unwrap_or_else(|| engine.now_millis());
    let record = MetricRecord::new(category, name, value, timestamp);
    record.validate()?;
    engine.record_metric(record);
    Ok(())
}

pub fn record_violation(
    engine: &TelemetryEngine,
    metric: String,
    value: f64,
    threshold: f64,
    timestamp: Option<i64>,
) -> Result<()> {
    let timestamp = timestamp.unwrap_or_else(|| engine.now_millis());
    let event = ViolationEvent::new(metric, value, threshold, timestamp);
    event.validate()?;
    engine.record_violation(event);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use perfwatch_core::telemetry::MetricKey;
    use perfwatch_core::EngineConfig;
    use perfwatch_infra::{InMemoryStore, LogAlertSink};
    use std::io::Cursor;
    use std::sync::Arc;

    fn engine() -> TelemetryEngine {
        TelemetryEngine::new(
            EngineConfig::default(),
            Arc::new(InMemoryStore::new()),
            Arc::new(LogAlertSink::new()),
        )
        .unwrap()
    }

    #[test]
    fn test_ingest_mixed_lines() {
        let engine = engine();
        let input = r#"
{"category":"ui","name":"paint","value":12.0,"timestamp":1}
{"metric":"paint","value":40.0,"threshold":16.0,"timestamp":2}
not json
{"category":"","name":"paint","value":1.0,"timestamp":3}

{"category":"ui","name":"paint","value":14.0,"timestamp":4}
"#;
        let summary = ingest_lines(&engine, Cursor::new(input)).unwrap();

        assert_eq!(
            summary,
            IngestSummary {
                metrics: 2,
                violations: 1,
                skipped: 2,
            }
        );
        assert_eq!(
            engine.series(&MetricKey::new("ui", "paint")).unwrap().len(),
            2
        );
    }

    #[test]
    fn test_record_metric_rejects_bad_input() {
        let engine = engine();
        assert!(record_metric(&engine, "ui:x".into(), "paint".into(), 1.0, Some(1)).is_err());
        assert!(record_metric(&engine, "ui".into(), "paint".into(), 1.0, None).is_ok());
        assert_eq!(engine.metric_keys().len(), 1);
    }
}

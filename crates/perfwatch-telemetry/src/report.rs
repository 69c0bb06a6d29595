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

//! Aggregated reports and their export format.

use crate::series::BoundedSeries;
use crate::violations::ViolationTracker;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use perfwatch_core::telemetry::{MetricKey, Sample, ViolationKey, ViolationRecord};
use perfwatch_core::TelemetryResult;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Number of trailing samples averaged for the `criticalMetrics` summary.
pub const CRITICAL_WINDOW: usize = 10;

/// Prefix of exported report file names.
pub const EXPORT_FILE_PREFIX: &str = "performance-report-";

/// One tracker with outstanding violations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentIssue {
    /// The violated metric.
    pub metric: ViolationKey,
    /// How many violations are currently accumulated.
    pub count: usize,
    /// Timestamp of the most recent accumulated violation.
    pub last_violation: i64,
}

/// Derived figures over the current state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    /// Sum of all current tracker lengths.
    pub total_violations: usize,
    /// Average of the last [`CRITICAL_WINDOW`] samples, for keys with data.
    pub critical_metrics: IndexMap<MetricKey, f64>,
    /// Every tracker holding at least one violation.
    pub recent_issues: Vec<RecentIssue>,
}

/// A point-in-time copy of every series and tracker plus a summary.
///
/// Maps keep first-seen order, so two reports over unchanged state compare equal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    /// Every metric series, oldest sample first.
    pub metrics: IndexMap<MetricKey, Vec<Sample>>,
    /// Every violation tracker, oldest record first.
    pub violations: IndexMap<ViolationKey, Vec<ViolationRecord>>,
    /// Derived figures.
    pub summary: ReportSummary,
}

impl PerformanceReport {
    pub(crate) fn build(
        metrics: &IndexMap<MetricKey, BoundedSeries>,
        violations: &IndexMap<ViolationKey, ViolationTracker>,
    ) -> Self {
        let critical_metrics = metrics
            .iter()
            .filter_map(|(key, series)| {
                series
                    .average_of_last(CRITICAL_WINDOW)
                    .map(|avg| (key.clone(), avg))
            })
            .collect();

        let recent_issues = violations
            .values()
            .filter_map(|tracker| {
                tracker.last_violation().map(|last| RecentIssue {
                    metric: tracker.key().clone(),
                    count: tracker.len(),
                    last_violation: last,
                })
            })
            .collect();

        Self {
            metrics: metrics
                .iter()
                .map(|(key, series)| (key.clone(), series.snapshot()))
                .collect(),
            violations: violations
                .iter()
                .map(|(key, tracker)| (key.clone(), tracker.snapshot()))
                .collect(),
            summary: ReportSummary {
                total_violations: violations.values().map(ViolationTracker::len).sum(),
                critical_metrics,
                recent_issues,
            },
        }
    }

    /// Encodes the report as pretty-printed JSON.
    pub fn to_pretty_json(&self) -> TelemetryResult<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Writes the report into `dir` under [`export_file_name`] and returns the path.
    pub fn export_to_dir(&self, dir: &Path, at: DateTime<Utc>) -> TelemetryResult<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(export_file_name(at));
        fs::write(&path, self.to_pretty_json()?)?;
        log::info!("Exported performance report to {}", path.display());
        Ok(path)
    }
}

/// Returns `performance-report-<ISO8601>.json` for `at`.
///
/// Colons in the time are replaced with `-` so the name is valid on every
/// filesystem.
pub fn export_file_name(at: DateTime<Utc>) -> String {
    format!(
        "{EXPORT_FILE_PREFIX}{}.json",
        at.format("%Y-%m-%dT%H-%M-%S%.3fZ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn state() -> (
        IndexMap<MetricKey, BoundedSeries>,
        IndexMap<ViolationKey, ViolationTracker>,
    ) {
        let mut metrics = IndexMap::new();
        metrics.insert(
            MetricKey::new("ui", "tab_switch"),
            BoundedSeries::with_samples(
                100,
                (1..=4).map(|i| Sample::new(i as f64, i)).collect::<Vec<_>>(),
            ),
        );
        metrics.insert(MetricKey::new("ui", "idle"), BoundedSeries::new(100));

        let mut violations = IndexMap::new();
        let mut busy = ViolationTracker::new(ViolationKey::new("tab_switch"), 3);
        busy.record(ViolationRecord::new(300.0, 100.0, 7));
        busy.record(ViolationRecord::new(310.0, 100.0, 9));
        violations.insert(ViolationKey::new("tab_switch"), busy);
        violations.insert(
            ViolationKey::new("quiet"),
            ViolationTracker::new(ViolationKey::new("quiet"), 3),
        );

        (metrics, violations)
    }

    #[test]
    fn test_summary_contents() {
        let (metrics, violations) = state();
        let report = PerformanceReport::build(&metrics, &violations);

        assert_eq!(report.summary.total_violations, 2);
        assert_eq!(report.summary.critical_metrics.len(), 1);
        assert_eq!(
            report.summary.critical_metrics[&MetricKey::new("ui", "tab_switch")],
            2.5
        );
        assert_eq!(
            report.summary.recent_issues,
            vec![RecentIssue {
                metric: ViolationKey::new("tab_switch"),
                count: 2,
                last_violation: 9,
            }]
        );
        // Empty entries stay visible in the raw maps.
        assert!(report.metrics[&MetricKey::new("ui", "idle")].is_empty());
        assert!(report.violations[&ViolationKey::new("quiet")].is_empty());
    }

    #[test]
    fn test_json_shape() {
        let (metrics, violations) = state();
        let report = PerformanceReport::build(&metrics, &violations);
        let value: serde_json::Value =
            serde_json::from_slice(&report.to_pretty_json().unwrap()).unwrap();

        assert_eq!(value["summary"]["totalViolations"], 2);
        assert_eq!(value["summary"]["criticalMetrics"]["ui:tab_switch"], 2.5);
        assert_eq!(value["summary"]["recentIssues"][0]["lastViolation"], 9);
        assert_eq!(value["metrics"]["ui:tab_switch"][0]["timestamp"], 1);
    }

    #[test]
    fn test_export_file_name() {
        let at = Utc.with_ymd_and_hms(2026, 10, 18, 9, 5, 3).unwrap();
        assert_eq!(
            export_file_name(at),
            "performance-report-2026-10-18T09-05-03.000Z.json"
        );
    }

    #[test]
    fn test_export_to_dir() {
        let dir = tempfile::tempdir().unwrap();
        let (metrics, violations) = state();
        let report = PerformanceReport::build(&metrics, &violations);
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();

        let path = report.export_to_dir(dir.path(), at).unwrap();
        assert!(path.ends_with("performance-report-2026-01-02T03-04-05.000Z.json"));

        let written: PerformanceReport =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(written, report);
    }
}

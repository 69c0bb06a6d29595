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

//! An alert sink that writes to the log.

use perfwatch_core::telemetry::{Alert, AlertSink};
use perfwatch_core::TelemetryResult;
use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};

/// Reports each alert as a `warn`-level log line.
///
/// Stands in for a desktop notification backend wherever the log is what an
/// operator watches.
#[derive(Debug, Default)]
pub struct LogAlertSink {
    delivered: AtomicU64,
}

impl LogAlertSink {
    /// Creates a new sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of alerts delivered so far.
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }
}

/// Formats the one-line description used for every alert.
pub fn describe(alert: &Alert) -> String {
    let threshold = alert.records.last().map_or(0.0, |r| r.threshold);
    format!(
        "Performance alert: `{}` exceeded its threshold {} times (peak {:.2}, threshold {:.2})",
        alert.key,
        alert.count(),
        alert.peak_value().unwrap_or(0.0),
        threshold
    )
}

impl AlertSink for LogAlertSink {
    fn sink_id(&self) -> Cow<'static, str> {
        Cow::Borrowed("log")
    }

    fn notify(&self, alert: &Alert) -> TelemetryResult<()> {
        log::warn!("{}", describe(alert));
        self.delivered.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perfwatch_core::telemetry::{ViolationKey, ViolationRecord};

    #[test]
    fn test_log_sink_counts_deliveries() {
        let sink = LogAlertSink::new();
        let alert = Alert {
            key: ViolationKey::new("frame_time"),
            records: vec![
                ViolationRecord::new(20.0, 16.6, 1),
                ViolationRecord::new(35.5, 16.6, 2),
                ViolationRecord::new(18.0, 16.6, 3),
            ],
        };

        sink.notify(&alert).unwrap();
        assert_eq!(sink.delivered(), 1);
        assert_eq!(
            describe(&alert),
            "Performance alert: `frame_time` exceeded its threshold 3 times (peak 35.50, threshold 16.60)"
        );
    }
}

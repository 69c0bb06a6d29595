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

//! The alerting contract.

use super::violation::{ViolationKey, ViolationRecord};
use crate::error::TelemetryResult;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt::Debug;

/// A notification that a violation tracker reached its alert threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    /// The tracker that crossed its threshold.
    pub key: ViolationKey,
    /// Every record the tracker held when it crossed, oldest first.
    pub records: Vec<ViolationRecord>,
}

impl Alert {
    /// Returns the number of violations that triggered the alert.
    pub fn count(&self) -> usize {
        self.records.len()
    }

    /// Returns the timestamp of the most recent violation.
    pub fn last_timestamp(&self) -> Option<i64> {
        self.records.last().map(|r| r.timestamp)
    }

    /// Returns the largest observed value among the triggering violations.
    pub fn peak_value(&self) -> Option<f64> {
        self.records.iter().map(|r| r.value).reduce(f64::max)
    }
}

/// The core trait for an alert delivery backend.
///
/// Sinks are fire-and-forget from the engine's point of view: a returned
/// error is logged and never rolls back the tracker reset that produced the
/// alert.
pub trait AlertSink: Send + Sync + Debug + 'static {
    /// Returns a human-readable identifier for this sink.
    fn sink_id(&self) -> Cow<'static, str>;

    /// Delivers one alert.
    fn notify(&self, alert: &Alert) -> TelemetryResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_helpers() {
        let alert = Alert {
            key: ViolationKey::new("frame_time"),
            records: vec![
                ViolationRecord::new(20.0, 16.0, 1),
                ViolationRecord::new(45.0, 16.0, 2),
                ViolationRecord::new(30.0, 16.0, 3),
            ],
        };
        assert_eq!(alert.count(), 3);
        assert_eq!(alert.last_timestamp(), Some(3));
        assert_eq!(alert.peak_value(), Some(45.0));
    }

    #[test]
    fn test_empty_alert_helpers() {
        let alert = Alert {
            key: ViolationKey::new("x"),
            records: Vec::new(),
        };
        assert_eq!(alert.last_timestamp(), None);
        assert_eq!(alert.peak_value(), None);
    }
}

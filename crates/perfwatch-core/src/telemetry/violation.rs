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

//! Violation identities and records.

use super::{require_finite, require_label};
use crate::error::TelemetryResult;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// The identity of a violation tracker.
///
/// Lives in its own namespace: it carries no `category:` prefix and never
/// collides with a [`MetricKey`](super::MetricKey).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViolationKey(String);

impl ViolationKey {
    /// Creates a new violation key.
    pub fn new(metric: impl Into<String>) -> Self {
        Self(metric.into())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ViolationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ViolationKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ViolationKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One breach of a performance threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViolationRecord {
    /// The observed value.
    pub value: f64,
    /// The threshold that was exceeded.
    pub threshold: f64,
    /// Epoch milliseconds at which the breach was observed.
    pub timestamp: i64,
}

impl ViolationRecord {
    /// Creates a new violation record.
    pub fn new(value: f64, threshold: f64, timestamp: i64) -> Self {
        Self {
            value,
            threshold,
            timestamp,
        }
    }
}

/// A violation as submitted by a producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationEvent {
    /// The name of the violated metric; becomes the [`ViolationKey`].
    pub metric: String,
    /// The observed value.
    pub value: f64,
    /// The threshold that was exceeded.
    pub threshold: f64,
    /// Epoch milliseconds at which the breach was observed.
    pub timestamp: i64,
}

impl ViolationEvent {
    /// Creates a new violation event.
    pub fn new(metric: impl Into<String>, value: f64, threshold: f64, timestamp: i64) -> Self {
        Self {
            metric: metric.into(),
            value,
            threshold,
            timestamp,
        }
    }

    /// Checks that the event can be routed to a tracker.
    pub fn validate(&self) -> TelemetryResult<()> {
        require_label("metric", &self.metric)?;
        require_finite("value", self.value)?;
        require_finite("threshold", self.threshold)
    }

    /// Returns the key of the tracker this event belongs to.
    pub fn key(&self) -> ViolationKey {
        ViolationKey::new(self.metric.clone())
    }

    /// Returns the record carried by this event.
    pub fn record(&self) -> ViolationRecord {
        ViolationRecord::new(self.value, self.threshold, self.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_key_is_transparent() {
        let key = ViolationKey::from("frame_time");
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"frame_time\"");
        assert_eq!(key.as_str(), "frame_time");
    }

    #[test]
    fn test_violation_event_validation() {
        assert!(ViolationEvent::new("frame_time", 40.0, 16.6, 0)
            .validate()
            .is_ok());
        assert!(ViolationEvent::new("", 40.0, 16.6, 0).validate().is_err());
        assert!(ViolationEvent::new("frame_time", 40.0, f64::INFINITY, 0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_violation_event_splits_into_key_and_record() {
        let event = ViolationEvent::new("api_latency", 900.0, 500.0, 1234);
        assert_eq!(event.key(), ViolationKey::new("api_latency"));
        assert_eq!(event.record(), ViolationRecord::new(900.0, 500.0, 1234));
    }
}

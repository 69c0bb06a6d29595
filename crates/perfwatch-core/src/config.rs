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

//! Fixed engine configuration.

use crate::error::{TelemetryError, TelemetryResult};
use std::time::Duration;

/// Maximum number of samples kept per metric series.
pub const SERIES_CAPACITY: usize = 100;
/// Number of violations that triggers an alert and resets a tracker.
pub const ALERT_THRESHOLD: usize = 3;
/// Maximum age of retained samples and violation records.
pub const RETENTION_WINDOW: Duration = Duration::from_millis(1_800_000);
/// Suggested interval at which display collaborators poll for reports.
pub const REPORT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Configuration for the telemetry engine.
///
/// Production code runs with [`EngineConfig::default`]; the fields are public
/// so tests can shrink the intervals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum number of samples kept per metric key.
    pub series_capacity: usize,
    /// Violation count at which a tracker alerts and resets.
    pub alert_threshold: usize,
    /// Data older than this is evicted by the retention sweeper.
    pub retention_window: Duration,
    /// Period of the retention sweeper. Equal to the retention window by default.
    pub sweep_interval: Duration,
    /// Interval at which the report is polled by display collaborators.
    pub report_poll_interval: Duration,
}

impl EngineConfig {
    /// Checks that the configuration can drive an engine.
    pub fn validate(&self) -> TelemetryResult<()> {
        if self.series_capacity == 0 {
            return Err(TelemetryError::InvalidConfig(
                "series_capacity must be at least 1".to_string(),
            ));
        }
        if self.alert_threshold == 0 {
            return Err(TelemetryError::InvalidConfig(
                "alert_threshold must be at least 1".to_string(),
            ));
        }
        if self.sweep_interval.is_zero() {
            return Err(TelemetryError::InvalidConfig(
                "sweep_interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the retention window in milliseconds, saturating at `i64::MAX`.
    pub fn retention_window_millis(&self) -> i64 {
        i64::try_from(self.retention_window.as_millis()).unwrap_or(i64::MAX)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            series_capacity: SERIES_CAPACITY,
            alert_threshold: ALERT_THRESHOLD,
            retention_window: RETENTION_WINDOW,
            sweep_interval: RETENTION_WINDOW,
            report_poll_interval: REPORT_POLL_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = EngineConfig::default();
        assert_eq!(config.series_capacity, 100);
        assert_eq!(config.alert_threshold, 3);
        assert_eq!(config.retention_window_millis(), 1_800_000);
        assert_eq!(config.sweep_interval, config.retention_window);
        assert_eq!(config.report_poll_interval, Duration::from_millis(1000));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EngineConfig {
            series_capacity: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(TelemetryError::InvalidConfig(_))
        ));

        let config = EngineConfig {
            sweep_interval: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}

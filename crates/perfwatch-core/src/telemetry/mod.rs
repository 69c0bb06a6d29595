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

//! Provides the foundational data structures for performance telemetry.
//!
//! This module defines the "common language" between producers (timers,
//! network calls, rendering code), the aggregating engine in
//! `perfwatch-telemetry`, and the storage and alerting backends in
//! `perfwatch-infra`.

pub mod alert;
pub mod event;
pub mod metrics;
pub mod violation;

pub use self::alert::{Alert, AlertSink};
pub use self::event::InboundRecord;
pub use self::metrics::{MetricKey, MetricRecord, Sample};
pub use self::violation::{ViolationEvent, ViolationKey, ViolationRecord};

use crate::error::{TelemetryError, TelemetryResult};

/// Rejects empty or whitespace-only identifiers.
pub(crate) fn require_label(field: &str, value: &str) -> TelemetryResult<()> {
    if value.trim().is_empty() {
        return Err(TelemetryError::InvalidRecord(format!(
            "`{field}` must not be empty"
        )));
    }
    Ok(())
}

/// Rejects NaN and infinite measurements, which cannot be averaged or persisted as JSON.
pub(crate) fn require_finite(field: &str, value: f64) -> TelemetryResult<()> {
    if !value.is_finite() {
        return Err(TelemetryError::InvalidRecord(format!(
            "`{field}` must be finite, got {value}"
        )));
    }
    Ok(())
}

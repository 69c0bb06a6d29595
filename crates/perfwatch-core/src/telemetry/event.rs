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

//! Inbound records as they arrive from producers.

use super::metrics::MetricRecord;
use super::violation::ViolationEvent;
use crate::error::TelemetryResult;
use serde::{Deserialize, Serialize};

/// Either kind of producer record.
///
/// Untagged so that a single JSON-lines stream can mix both shapes; the
/// variants are told apart by their required fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InboundRecord {
    /// A scalar performance measurement.
    Metric(MetricRecord),
    /// A threshold breach.
    Violation(ViolationEvent),
}

impl InboundRecord {
    /// Validates whichever record this is.
    pub fn validate(&self) -> TelemetryResult<()> {
        match self {
            InboundRecord::Metric(record) => record.validate(),
            InboundRecord::Violation(event) => event.validate(),
        }
    }
}

impl From<MetricRecord> for InboundRecord {
    fn from(record: MetricRecord) -> Self {
        InboundRecord::Metric(record)
    }
}

impl From<ViolationEvent> for InboundRecord {
    fn from(event: ViolationEvent) -> Self {
        InboundRecord::Violation(event)
    }
}

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

//! # Perfwatch Core
//!
//! Foundational crate containing the value types, configuration and
//! collaborator contracts shared by the telemetry engine and its
//! concrete storage and alerting backends.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod storage;
pub mod telemetry;
pub mod utils;

pub use config::EngineConfig;
pub use error::{TelemetryError, TelemetryResult};
pub use storage::KeyValueStore;
pub use telemetry::{
    Alert, AlertSink, InboundRecord, MetricKey, MetricRecord, Sample, ViolationEvent,
    ViolationKey, ViolationRecord,
};
pub use utils::clock::{Clock, ManualClock, SystemClock};

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

//! # Perfwatch Telemetry
//!
//! Ingests performance samples and threshold violations from many producers,
//! keeps bounded per-key series and edge-triggered violation trackers, evicts
//! stale data on a timer, persists snapshots through an injected store and
//! serves aggregated reports.

#![warn(missing_docs)]

pub mod engine;
pub mod persistence;
pub mod report;
pub mod series;
pub mod service;
pub mod sweeper;
pub mod violations;

pub use engine::{EvictionStats, HydrationStats, TelemetryEngine};
pub use persistence::{PersistedState, PersistenceGateway, PersistenceStats, SnapshotSource};
pub use report::{export_file_name, PerformanceReport, RecentIssue, ReportSummary};
pub use series::BoundedSeries;
pub use service::TelemetryService;
pub use sweeper::RetentionSweeper;
pub use violations::ViolationTracker;

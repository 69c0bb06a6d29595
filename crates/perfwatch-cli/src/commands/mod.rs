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

pub mod ingest;
pub mod report;

use anyhow::{Context, Result};
use perfwatch_core::EngineConfig;
use perfwatch_infra::{JsonFileStore, LogAlertSink};
use perfwatch_telemetry::TelemetryService;
use std::path::Path;
use std::sync::Arc;

/// Starts a telemetry service over the JSON store at `store`.
pub fn open_service(store: &Path) -> Result<TelemetryService> {
    TelemetryService::start(
        EngineConfig::default(),
        Arc::new(JsonFileStore::new(store)),
        Arc::new(LogAlertSink::new()),
    )
    .with_context(|| format!("failed to start telemetry over {}", store.display()))
}

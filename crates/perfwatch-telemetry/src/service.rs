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

//! Service owning the engine and its background maintenance.

use crate::engine::{HydrationStats, TelemetryEngine};
use crate::sweeper::RetentionSweeper;
use perfwatch_core::storage::KeyValueStore;
use perfwatch_core::telemetry::AlertSink;
use perfwatch_core::utils::clock::{Clock, SystemClock};
use perfwatch_core::{EngineConfig, TelemetryResult};
use std::sync::Arc;

/// Constructs the process-wide engine, hydrates it, and keeps the retention
/// sweeper running until shutdown.
#[derive(Debug)]
pub struct TelemetryService {
    engine: TelemetryEngine,
    sweeper: Option<RetentionSweeper>,
    hydration: HydrationStats,
}

impl TelemetryService {
    /// Starts a service on the system clock.
    pub fn start(
        config: EngineConfig,
        store: Arc<dyn KeyValueStore>,
        alerts: Arc<dyn AlertSink>,
    ) -> TelemetryResult<Self> {
        Self::start_with_clock(config, store, alerts, Arc::new(SystemClock))
    }

    /// Starts a service with an explicit clock.
    pub fn start_with_clock(
        config: EngineConfig,
        store: Arc<dyn KeyValueStore>,
        alerts: Arc<dyn AlertSink>,
        clock: Arc<dyn Clock>,
    ) -> TelemetryResult<Self> {
        let engine = TelemetryEngine::with_clock(config, store, alerts, clock)?;
        let hydration = engine.hydrate();
        let sweeper = RetentionSweeper::start(&engine)?;
        log::info!("Telemetry service started.");
        Ok(Self {
            engine,
            sweeper: Some(sweeper),
            hydration,
        })
    }

    /// Returns a handle to the shared engine.
    pub fn engine(&self) -> TelemetryEngine {
        self.engine.clone()
    }

    /// Returns what was loaded from the store at startup.
    pub fn hydration(&self) -> HydrationStats {
        self.hydration
    }

    /// Returns true while the retention sweeper is running.
    pub fn is_running(&self) -> bool {
        self.sweeper.as_ref().is_some_and(RetentionSweeper::is_running)
    }

    /// Stops the sweeper and waits for pending writes.
    pub fn shutdown(&mut self) {
        let Some(mut sweeper) = self.sweeper.take() else {
            return;
        };
        sweeper.stop();
        if !self.engine.flush() {
            log::warn!("Telemetry service shut down with unflushed writes.");
        }
        log::info!("Telemetry service stopped.");
    }
}

impl Drop for TelemetryService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

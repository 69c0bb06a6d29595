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

//! Periodic background eviction of stale telemetry.

use crate::engine::TelemetryEngine;
use crossbeam_channel::{RecvTimeoutError, Sender};
use perfwatch_core::TelemetryResult;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

/// Runs [`TelemetryEngine::sweep_now`] every `sweep_interval` on its own thread.
///
/// The worker only holds a weak reference to the engine and exits on its own
/// once the last engine handle is dropped.
#[derive(Debug)]
pub struct RetentionSweeper {
    stop_tx: Option<Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
    ticks: Arc<AtomicU64>,
}

impl RetentionSweeper {
    /// Starts sweeping `engine`.
    pub fn start(engine: &TelemetryEngine) -> TelemetryResult<Self> {
        let interval = engine.config().sweep_interval;
        let weak = engine.downgrade();
        let ticks = Arc::new(AtomicU64::new(0));
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);

        let worker_ticks = Arc::clone(&ticks);
        let handle = thread::Builder::new()
            .name("perfwatch-retention".to_string())
            .spawn(move || {
                log::info!("Retention sweeper started (interval={interval:?}).");
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            let Some(engine) = weak.upgrade() else {
                                break;
                            };
                            let stats = engine.sweep_now();
                            worker_ticks.fetch_add(1, Ordering::Relaxed);
                            log::trace!("Retention tick complete: {stats:?}");
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                log::info!("Retention sweeper stopped.");
            })?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
            ticks,
        })
    }

    /// Stops the worker and waits for an in-flight pass to finish.
    pub fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Retention sweeper thread panicked");
            }
        }
    }

    /// Returns true until [`stop`](Self::stop) has been called.
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Returns how many passes have completed.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}

impl Drop for RetentionSweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

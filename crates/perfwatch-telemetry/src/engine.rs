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

//! The telemetry engine: routing, alert dispatch, retention and reporting.

use crate::persistence::{PersistedState, PersistenceGateway, PersistenceStats, SnapshotSource};
use crate::report::PerformanceReport;
use crate::series::BoundedSeries;
use crate::violations::ViolationTracker;
use indexmap::IndexMap;
use perfwatch_core::storage::KeyValueStore;
use perfwatch_core::telemetry::{
    Alert, AlertSink, InboundRecord, MetricKey, MetricRecord, Sample, ViolationEvent,
    ViolationKey,
};
use perfwatch_core::utils::clock::{Clock, SystemClock};
use perfwatch_core::{EngineConfig, TelemetryResult};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// What a retention pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvictionStats {
    /// The cutoff used; everything at or before it was removed.
    pub cutoff: i64,
    /// Samples removed across all series.
    pub samples_removed: usize,
    /// Violation records removed across all trackers.
    pub records_removed: usize,
}

/// What hydration merged into the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HydrationStats {
    /// Series found in the store.
    pub series_loaded: usize,
    /// Trackers found in the store.
    pub trackers_loaded: usize,
}

#[derive(Debug, Default)]
struct EngineState {
    metrics: IndexMap<MetricKey, BoundedSeries>,
    violations: IndexMap<ViolationKey, ViolationTracker>,
}

impl EngineState {
    fn snapshot(&self) -> PersistedState {
        PersistedState {
            metrics: self
                .metrics
                .iter()
                .map(|(key, series)| (key.clone(), series.snapshot()))
                .collect(),
            violations: self
                .violations
                .iter()
                .map(|(key, tracker)| (key.clone(), tracker.snapshot()))
                .collect(),
        }
    }

    /// Persisted keys come first so the map keeps first-seen order across restarts.
    fn merge_persisted(&mut self, persisted: PersistedState, config: &EngineConfig) {
        let mut live_metrics = std::mem::take(&mut self.metrics);
        for (key, older) in persisted.metrics {
            let mut series = live_metrics
                .shift_remove(&key)
                .unwrap_or_else(|| BoundedSeries::new(config.series_capacity));
            series.merge_older(older);
            self.metrics.insert(key, series);
        }
        self.metrics.extend(live_metrics);

        let mut live_violations = std::mem::take(&mut self.violations);
        for (key, older) in persisted.violations {
            let mut tracker = live_violations
                .shift_remove(&key)
                .unwrap_or_else(|| ViolationTracker::new(key.clone(), config.alert_threshold));
            tracker.merge_older(older);
            self.violations.insert(key, tracker);
        }
        self.violations.extend(live_violations);
    }
}

/// The engine state, shared with the persistence writer.
#[derive(Debug, Default)]
struct SharedState(Mutex<EngineState>);

impl SharedState {
    /// A panicking producer must not take the engine down with it.
    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SnapshotSource for SharedState {
    fn snapshot(&self) -> PersistedState {
        self.lock().snapshot()
    }
}

#[derive(Debug)]
struct EngineInner {
    config: EngineConfig,
    state: Arc<SharedState>,
    persistence: PersistenceGateway,
    hydrated: Mutex<bool>,
    alerts: Arc<dyn AlertSink>,
    clock: Arc<dyn Clock>,
}

/// The shared telemetry sink.
///
/// Cloning is cheap and every clone refers to the same state, so one engine
/// can be handed to every producer and reader. All mutations run under a
/// single engine-wide lock: an insert, an alert reset and a retention pass
/// can never interleave. Mutations only flag the state as changed; the
/// persistence writer takes its own snapshot under the same lock and writes
/// it on a separate thread. Nothing is written before the engine has read
/// the store (see [`hydrate`](Self::hydrate)).
#[derive(Debug, Clone)]
pub struct TelemetryEngine {
    inner: Arc<EngineInner>,
}

impl TelemetryEngine {
    /// Creates an engine driven by the system clock.
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn KeyValueStore>,
        alerts: Arc<dyn AlertSink>,
    ) -> TelemetryResult<Self> {
        Self::with_clock(config, store, alerts, Arc::new(SystemClock))
    }

    /// Creates an engine with an explicit clock.
    pub fn with_clock(
        config: EngineConfig,
        store: Arc<dyn KeyValueStore>,
        alerts: Arc<dyn AlertSink>,
        clock: Arc<dyn Clock>,
    ) -> TelemetryResult<Self> {
        config.validate()?;
        let state = Arc::new(SharedState::default());
        let persistence = PersistenceGateway::new(store, state.clone())?;
        log::info!(
            "Telemetry engine created (capacity={}, alert_threshold={}, retention={:?}, alert sink={})",
            config.series_capacity,
            config.alert_threshold,
            config.retention_window,
            alerts.sink_id()
        );
        Ok(Self {
            inner: Arc::new(EngineInner {
                config,
                state,
                persistence,
                hydrated: Mutex::new(false),
                alerts,
                clock,
            }),
        })
    }

    /// Merges the persisted state into the engine and starts persisting.
    ///
    /// Anything recorded before hydration completes is kept and ordered after
    /// the persisted data. Hydration never fires alerts and only happens
    /// once; later calls return empty stats. If the store cannot be read the
    /// engine keeps running on what it holds, writes stay held so the stored
    /// history is not overwritten, and the next [`sweep_now`](Self::sweep_now)
    /// tries again.
    pub fn hydrate(&self) -> HydrationStats {
        let mut hydrated = self
            .inner
            .hydrated
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *hydrated {
            log::debug!("Telemetry already hydrated.");
            return HydrationStats::default();
        }

        let persisted = match self.inner.persistence.try_load() {
            Ok(persisted) => persisted,
            Err(e) => {
                log::error!("Failed to hydrate telemetry, holding writes: {e}");
                return HydrationStats::default();
            }
        };
        let stats = HydrationStats {
            series_loaded: persisted.metrics.len(),
            trackers_loaded: persisted.violations.len(),
        };

        self.lock_state().merge_persisted(persisted, &self.inner.config);
        *hydrated = true;
        drop(hydrated);

        self.inner.persistence.mark_dirty();
        self.inner.persistence.release();

        log::info!(
            "Hydrated telemetry: {} series, {} trackers",
            stats.series_loaded,
            stats.trackers_loaded
        );
        stats
    }

    /// Returns true once the persisted state has been merged in.
    pub fn is_hydrated(&self) -> bool {
        *self
            .inner
            .hydrated
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Records one metric sample. Malformed records are logged and ignored.
    pub fn record_metric(&self, record: MetricRecord) {
        if let Err(e) = record.validate() {
            log::warn!("Ignoring metric record: {e}");
            return;
        }
        let key = record.key();
        log::trace!("Recording {key} = {}", record.value);

        let capacity = self.inner.config.series_capacity;
        let mut state = self.lock_state();
        state
            .metrics
            .entry(key)
            .or_insert_with(|| BoundedSeries::new(capacity))
            .append(record.sample());
        drop(state);
        self.inner.persistence.mark_dirty();
    }

    /// Records one violation, alerting if its tracker reaches the threshold.
    /// Malformed events are logged and ignored.
    pub fn record_violation(&self, event: ViolationEvent) {
        if let Err(e) = event.validate() {
            log::warn!("Ignoring violation event: {e}");
            return;
        }
        let key = event.key();
        log::debug!(
            "Violation on {key}: {} exceeds {}",
            event.value,
            event.threshold
        );

        let threshold = self.inner.config.alert_threshold;
        let mut state = self.lock_state();
        let alert = state
            .violations
            .entry(key.clone())
            .or_insert_with(|| ViolationTracker::new(key, threshold))
            .record(event.record());
        drop(state);
        self.inner.persistence.mark_dirty();

        if let Some(alert) = alert {
            self.dispatch_alert(alert);
        }
    }

    /// Routes either kind of inbound record.
    pub fn record(&self, record: InboundRecord) {
        match record {
            InboundRecord::Metric(record) => self.record_metric(record),
            InboundRecord::Violation(event) => self.record_violation(event),
        }
    }

    /// Builds a report from the current state. Never mutates anything.
    pub fn report(&self) -> PerformanceReport {
        let state = self.lock_state();
        PerformanceReport::build(&state.metrics, &state.violations)
    }

    /// Empties both maps and persists the empty state.
    pub fn clear(&self) {
        let mut state = self.lock_state();
        state.metrics.clear();
        state.violations.clear();
        drop(state);
        self.inner.persistence.mark_dirty();
        log::info!("Cleared all telemetry.");
    }

    /// Removes every sample and violation record at or before `cutoff`.
    ///
    /// Keys are kept even when they end up empty.
    pub fn evict_before(&self, cutoff: i64) -> EvictionStats {
        let mut stats = EvictionStats {
            cutoff,
            ..Default::default()
        };

        let mut state = self.lock_state();
        for series in state.metrics.values_mut() {
            stats.samples_removed += series.evict_before(cutoff);
        }
        for tracker in state.violations.values_mut() {
            stats.records_removed += tracker.evict_before(cutoff);
        }
        drop(state);
        self.inner.persistence.mark_dirty();

        log::debug!(
            "Retention pass at cutoff {cutoff}: {} samples, {} violation records removed",
            stats.samples_removed,
            stats.records_removed
        );
        stats
    }

    /// Runs one retention pass using the engine's clock.
    ///
    /// An engine that has not hydrated yet tries to do so first.
    pub fn sweep_now(&self) -> EvictionStats {
        if !self.is_hydrated() {
            self.hydrate();
        }
        let cutoff = self
            .inner
            .clock
            .now_millis()
            .saturating_sub(self.inner.config.retention_window_millis());
        self.evict_before(cutoff)
    }

    /// Returns every metric key in first-seen order.
    pub fn metric_keys(&self) -> Vec<MetricKey> {
        self.lock_state().metrics.keys().cloned().collect()
    }

    /// Returns a copy of one series, if the key has been seen.
    pub fn series(&self, key: &MetricKey) -> Option<Vec<Sample>> {
        self.lock_state().metrics.get(key).map(BoundedSeries::snapshot)
    }

    /// Returns how many violations are accumulated for `key`.
    pub fn violation_count(&self, key: &ViolationKey) -> usize {
        self.lock_state()
            .violations
            .get(key)
            .map_or(0, ViolationTracker::len)
    }

    /// Waits for queued persistence writes. Returns false on timeout.
    pub fn flush(&self) -> bool {
        self.inner.persistence.flush()
    }

    /// Returns the persistence writer's counters.
    pub fn persistence_stats(&self) -> PersistenceStats {
        self.inner.persistence.stats()
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Returns the current time according to the engine's clock.
    pub fn now_millis(&self) -> i64 {
        self.inner.clock.now_millis()
    }

    pub(crate) fn downgrade(&self) -> WeakEngine {
        WeakEngine(Arc::downgrade(&self.inner))
    }

    fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        self.inner.state.lock()
    }

    fn dispatch_alert(&self, alert: Alert) {
        log::info!(
            "Alert: {} reached {} violations",
            alert.key,
            alert.count()
        );
        let sink = &self.inner.alerts;
        match panic::catch_unwind(AssertUnwindSafe(|| sink.notify(&alert))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::warn!("Alert sink {} failed: {e}", sink.sink_id()),
            Err(_) => log::error!("Alert sink {} panicked", sink.sink_id()),
        }
    }
}

/// A non-owning handle used by background workers.
#[derive(Debug, Clone)]
pub(crate) struct WeakEngine(Weak<EngineInner>);

impl WeakEngine {
    pub(crate) fn upgrade(&self) -> Option<TelemetryEngine> {
        self.0.upgrade().map(|inner| TelemetryEngine { inner })
    }
}

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

//! Snapshot persistence through an injected [`KeyValueStore`].
//!
//! Changes are handed to a dedicated writer thread and never block or fail the
//! caller. The writer coalesces queued changes, so a burst of mutations
//! results in a single write of the newest state.

use crossbeam_channel::{Receiver, Sender};
use indexmap::IndexMap;
use perfwatch_core::storage::KeyValueStore;
use perfwatch_core::telemetry::{MetricKey, Sample, ViolationKey, ViolationRecord};
use perfwatch_core::{TelemetryError, TelemetryResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Store key holding every metric series.
pub const METRICS_KEY: &str = "performanceMetrics";
/// Store key holding every violation tracker.
pub const VIOLATIONS_KEY: &str = "performanceViolations";

/// Upper bound on how long [`PersistenceGateway::flush`] waits for the writer.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

/// The full persisted state of the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    /// Metric series keyed by `category:name`, oldest sample first.
    pub metrics: IndexMap<MetricKey, Vec<Sample>>,
    /// Violation records keyed by metric name, oldest record first.
    pub violations: IndexMap<ViolationKey, Vec<ViolationRecord>>,
}

impl PersistedState {
    /// Returns true if neither map holds anything.
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty() && self.violations.is_empty()
    }

    /// Encodes the state as the two top-level store entries.
    pub fn to_entries(&self) -> TelemetryResult<Vec<(String, Value)>> {
        Ok(vec![
            (METRICS_KEY.to_string(), serde_json::to_value(&self.metrics)?),
            (
                VIOLATIONS_KEY.to_string(),
                serde_json::to_value(&self.violations)?,
            ),
        ])
    }

    /// Reads both top-level entries from `store`.
    ///
    /// Absent keys decode as empty maps. Individual entries that cannot be
    /// decoded are skipped with a warning rather than discarding the whole map.
    pub fn from_store(store: &dyn KeyValueStore) -> TelemetryResult<Self> {
        let metrics = decode_map(store.get(METRICS_KEY)?, METRICS_KEY, |raw| {
            raw.parse::<MetricKey>().ok()
        })?;
        let violations = decode_map(store.get(VIOLATIONS_KEY)?, VIOLATIONS_KEY, |raw| {
            Some(ViolationKey::new(raw))
        })?;
        Ok(Self {
            metrics,
            violations,
        })
    }
}

fn decode_map<K, V>(
    value: Option<Value>,
    store_key: &str,
    parse_key: impl Fn(&str) -> Option<K>,
) -> TelemetryResult<IndexMap<K, Vec<V>>>
where
    K: std::hash::Hash + Eq,
    V: DeserializeOwned,
{
    let entries = match value {
        None | Some(Value::Null) => return Ok(IndexMap::new()),
        Some(Value::Object(entries)) => entries,
        Some(other) => {
            return Err(TelemetryError::Storage(format!(
                "`{store_key}` should hold an object, found {}",
                json_kind(&other)
            )))
        }
    };

    let mut decoded = IndexMap::with_capacity(entries.len());
    for (raw_key, raw_values) in entries {
        let Some(key) = parse_key(&raw_key) else {
            log::warn!("Skipping persisted entry with malformed key `{raw_key}` in `{store_key}`");
            continue;
        };
        match serde_json::from_value::<Vec<V>>(raw_values) {
            Ok(values) => {
                decoded.insert(key, values);
            }
            Err(e) => log::warn!("Skipping persisted entry `{raw_key}` in `{store_key}`: {e}"),
        }
    }
    Ok(decoded)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Counters describing the writer's history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistenceStats {
    /// Snapshots successfully written.
    pub saved: u64,
    /// Snapshots whose write failed or panicked.
    pub failed: u64,
}

#[derive(Debug, Default)]
struct WriterCounters {
    saved: AtomicU64,
    failed: AtomicU64,
}

/// Produces the state the writer persists.
///
/// The writer calls this itself, once per coalesced batch of changes, so
/// mutating callers only pay for a channel send.
pub trait SnapshotSource: Send + Sync + 'static {
    /// Returns a consistent copy of the current state.
    fn snapshot(&self) -> PersistedState;
}

enum WriterCommand {
    Dirty,
    Release,
    Flush(Sender<()>),
}

/// Loads and saves engine state through an external key-value store.
///
/// The gateway starts held: changes are tracked but nothing is written until
/// [`release`](Self::release) is called. The engine releases it once the
/// store has been read, so early writes can never clobber persisted history.
#[derive(Debug)]
pub struct PersistenceGateway {
    store: Arc<dyn KeyValueStore>,
    sender: Option<Sender<WriterCommand>>,
    handle: Option<thread::JoinHandle<()>>,
    counters: Arc<WriterCounters>,
}

impl PersistenceGateway {
    /// Creates a gateway persisting `source` and starts its writer thread.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        source: Arc<dyn SnapshotSource>,
    ) -> TelemetryResult<Self> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let counters = Arc::new(WriterCounters::default());

        let writer = Writer {
            store: Arc::clone(&store),
            source,
            counters: Arc::clone(&counters),
            released: false,
            dirty: false,
        };
        let handle = thread::Builder::new()
            .name("perfwatch-persistence".to_string())
            .spawn(move || writer.run(receiver))?;

        Ok(Self {
            store,
            sender: Some(sender),
            handle: Some(handle),
            counters,
        })
    }

    /// Reads the persisted state synchronously.
    ///
    /// A missing or empty store yields an empty state. Storage failures are
    /// logged and also yield an empty state: in-memory data stays authoritative.
    pub fn load(&self) -> PersistedState {
        self.try_load().unwrap_or_else(|e| {
            log::error!("Failed to load persisted telemetry, starting empty: {e}");
            PersistedState::default()
        })
    }

    /// Reads the persisted state, surfacing storage failures.
    pub fn try_load(&self) -> TelemetryResult<PersistedState> {
        let state = PersistedState::from_store(self.store.as_ref())?;
        log::debug!(
            "Loaded persisted telemetry: {} series, {} trackers",
            state.metrics.len(),
            state.violations.len()
        );
        Ok(state)
    }

    /// Notes that the source changed. Returns immediately.
    pub fn mark_dirty(&self) {
        self.send(WriterCommand::Dirty);
    }

    /// Lets the writer persist changes, including any noted while held.
    pub fn release(&self) {
        self.send(WriterCommand::Release);
    }

    /// Waits until every change noted before this call has been written or
    /// has failed. While the gateway is held this returns as soon as the
    /// writer has seen the request. Returns false if the writer did not
    /// answer in time.
    pub fn flush(&self) -> bool {
        let Some(sender) = &self.sender else {
            return true;
        };
        let (ack_tx, ack_rx) = crossbeam_channel::bounded(1);
        if sender.send(WriterCommand::Flush(ack_tx)).is_err() {
            return false;
        }
        match ack_rx.recv_timeout(FLUSH_TIMEOUT) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Persistence flush did not complete: {e}");
                false
            }
        }
    }

    /// Returns the writer's success and failure counts.
    pub fn stats(&self) -> PersistenceStats {
        PersistenceStats {
            saved: self.counters.saved.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }

    fn send(&self, command: WriterCommand) {
        let Some(sender) = &self.sender else {
            return;
        };
        if sender.send(command).is_err() {
            log::error!("Persistence writer is gone; change not persisted");
        }
    }
}

impl Drop for PersistenceGateway {
    fn drop(&mut self) {
        // Closing the channel lets the writer drain what is queued and exit.
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Persistence writer thread panicked");
            }
        }
    }
}

struct Writer {
    store: Arc<dyn KeyValueStore>,
    source: Arc<dyn SnapshotSource>,
    counters: Arc<WriterCounters>,
    released: bool,
    dirty: bool,
}

impl Writer {
    fn run(mut self, receiver: Receiver<WriterCommand>) {
        log::debug!("Persistence writer started.");

        while let Ok(command) = receiver.recv() {
            let mut acks = Vec::new();
            self.absorb(command, &mut acks);
            while let Ok(next) = receiver.try_recv() {
                self.absorb(next, &mut acks);
            }

            if self.released && self.dirty {
                // A failed write is retried after the next change.
                self.dirty = false;
                self.write();
            }

            for ack in acks {
                let _ = ack.send(());
            }
        }

        log::debug!("Persistence writer stopped.");
    }

    fn absorb(&mut self, command: WriterCommand, acks: &mut Vec<Sender<()>>) {
        match command {
            WriterCommand::Dirty => self.dirty = true,
            WriterCommand::Release => self.released = true,
            WriterCommand::Flush(ack) => acks.push(ack),
        }
    }

    fn write(&self) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let state = self.source.snapshot();
            self.store.put_all(state.to_entries()?)
        }));
        match outcome {
            Ok(Ok(())) => {
                self.counters.saved.fetch_add(1, Ordering::Relaxed);
                log::trace!("Persisted telemetry snapshot.");
            }
            Ok(Err(e)) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                log::error!("Failed to persist telemetry snapshot: {e}");
            }
            Err(_) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                log::error!("Telemetry store panicked while persisting a snapshot");
            }
        }
    }
}

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

//! The contract for the external key-value store that persists engine state.

use crate::error::TelemetryResult;
use serde_json::Value;
use std::fmt::Debug;

/// Trait defining the interface for key-value persistence backends.
///
/// The engine stores its whole state under a handful of top-level keys and
/// always overwrites them with complete snapshots.
pub trait KeyValueStore: Send + Sync + Debug + 'static {
    /// Retrieve the value stored under `key`, or `None` if it was never written.
    fn get(&self, key: &str) -> TelemetryResult<Option<Value>>;

    /// Store or replace the value under `key`.
    fn put(&self, key: &str, value: Value) -> TelemetryResult<()>;

    /// Store several entries at once.
    ///
    /// Backends that can write atomically should override this; the default
    /// writes each entry in turn and stops at the first failure.
    fn put_all(&self, entries: Vec<(String, Value)>) -> TelemetryResult<()> {
        for (key, value) in entries {
            self.put(&key, value)?;
        }
        Ok(())
    }
}

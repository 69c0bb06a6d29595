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

//! Edge-triggered violation accumulation.
//!
//! A tracker sits in one of two implicit states. While it holds fewer than
//! `alert_threshold` records it is accumulating. The insert that brings it to
//! the threshold produces an [`Alert`] carrying every held record and empties
//! the tracker in the same step, so the next alert needs a fresh run of
//! `alert_threshold` violations. Nothing is sticky between calls.

use perfwatch_core::telemetry::{Alert, ViolationKey, ViolationRecord};

/// Accumulates violations for one key and alerts when the threshold is reached.
#[derive(Debug, Clone, PartialEq)]
pub struct ViolationTracker {
    key: ViolationKey,
    records: Vec<ViolationRecord>,
    alert_threshold: usize,
}

impl ViolationTracker {
    /// Creates an empty tracker.
    pub fn new(key: ViolationKey, alert_threshold: usize) -> Self {
        Self {
            key,
            records: Vec::new(),
            alert_threshold,
        }
    }

    /// Appends a record. If the tracker now holds `alert_threshold` or more
    /// records, they are all moved into the returned alert and the tracker is
    /// left empty.
    pub fn record(&mut self, record: ViolationRecord) -> Option<Alert> {
        self.records.push(record);
        if self.records.len() >= self.alert_threshold {
            let records = std::mem::take(&mut self.records);
            Some(Alert {
                key: self.key.clone(),
                records,
            })
        } else {
            None
        }
    }

    /// Removes every record with `timestamp <= cutoff`. Never alerts.
    pub fn evict_before(&mut self, cutoff: i64) -> usize {
        let before = self.records.len();
        self.records.retain(|r| r.timestamp > cutoff);
        before - self.records.len()
    }

    /// Places `older` records ahead of the current ones. Never alerts.
    pub fn merge_older(&mut self, mut older: Vec<ViolationRecord>) {
        older.append(&mut self.records);
        self.records = older;
    }

    /// Returns an owned copy of the records, oldest first.
    pub fn snapshot(&self) -> Vec<ViolationRecord> {
        self.records.clone()
    }

    /// Returns the timestamp of the most recent record.
    pub fn last_violation(&self) -> Option<i64> {
        self.records.last().map(|r| r.timestamp)
    }

    /// Returns the tracker's key.
    pub fn key(&self) -> &ViolationKey {
        &self.key
    }

    /// Returns the number of records currently accumulated.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if nothing is accumulated.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> ViolationTracker {
        ViolationTracker::new(ViolationKey::new("frame_time"), 3)
    }

    #[test]
    fn test_third_violation_alerts_and_resets() {
        let mut tracker = tracker();
        assert!(tracker.record(ViolationRecord::new(20.0, 16.0, 1)).is_none());
        assert!(tracker.record(ViolationRecord::new(21.0, 16.0, 2)).is_none());
        assert_eq!(tracker.len(), 2);

        let alert = tracker
            .record(ViolationRecord::new(22.0, 16.0, 3))
            .expect("third violation should alert");
        assert_eq!(alert.key, ViolationKey::new("frame_time"));
        assert_eq!(alert.count(), 3);
        assert_eq!(alert.records[0].timestamp, 1);
        assert_eq!(alert.records[2].timestamp, 3);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_fourth_violation_starts_fresh_accumulation() {
        let mut tracker = tracker();
        for t in 0..3 {
            tracker.record(ViolationRecord::new(20.0, 16.0, t));
        }
        assert!(tracker.record(ViolationRecord::new(20.0, 16.0, 3)).is_none());
        assert!(tracker.record(ViolationRecord::new(20.0, 16.0, 4)).is_none());
        assert_eq!(tracker.len(), 2);
        assert!(tracker.record(ViolationRecord::new(20.0, 16.0, 5)).is_some());
    }

    #[test]
    fn test_eviction_never_alerts() {
        let mut tracker = ViolationTracker::new(ViolationKey::new("x"), 3);
        // Merged history can exceed the threshold; shrinking it must stay silent.
        tracker.merge_older(vec![
            ViolationRecord::new(1.0, 0.0, 1),
            ViolationRecord::new(1.0, 0.0, 2),
            ViolationRecord::new(1.0, 0.0, 3),
            ViolationRecord::new(1.0, 0.0, 4),
        ]);
        assert_eq!(tracker.evict_before(1), 1);
        assert_eq!(tracker.len(), 3);
        assert_eq!(tracker.last_violation(), Some(4));
    }

    #[test]
    fn test_merge_older_keeps_order() {
        let mut tracker = tracker();
        tracker.record(ViolationRecord::new(5.0, 1.0, 50));
        tracker.merge_older(vec![ViolationRecord::new(4.0, 1.0, 40)]);
        let timestamps: Vec<i64> = tracker.snapshot().iter().map(|r| r.timestamp).collect();
        assert_eq!(timestamps, vec![40, 50]);
    }
}

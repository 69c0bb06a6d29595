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

//! Fixed-capacity time series for a single metric key.

use perfwatch_core::telemetry::Sample;
use std::collections::VecDeque;

/// A FIFO buffer of samples that never holds more than `capacity` entries.
///
/// Insertion order is treated as time order; producers are expected to
/// submit non-decreasing timestamps per key, but nothing here enforces it.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedSeries {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl BoundedSeries {
    /// Creates a new, empty series.
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Creates a series from existing samples, keeping only the newest `capacity`.
    pub fn with_samples(capacity: usize, samples: impl IntoIterator<Item = Sample>) -> Self {
        let mut series = Self::new(capacity);
        for sample in samples {
            series.append(sample);
        }
        series
    }

    /// Appends a sample, evicting and returning the oldest one on overflow.
    pub fn append(&mut self, sample: Sample) -> Option<Sample> {
        self.samples.push_back(sample);
        if self.samples.len() > self.capacity {
            self.samples.pop_front()
        } else {
            None
        }
    }

    /// Removes every sample with `timestamp <= cutoff` and returns how many were dropped.
    pub fn evict_before(&mut self, cutoff: i64) -> usize {
        let before = self.samples.len();
        self.samples.retain(|s| s.timestamp > cutoff);
        before - self.samples.len()
    }

    /// Places `older` samples ahead of the current ones, then trims the head
    /// back down to capacity.
    pub fn merge_older(&mut self, older: Vec<Sample>) {
        let current = std::mem::take(&mut self.samples);
        let mut merged: VecDeque<Sample> = older.into();
        merged.extend(current);
        while merged.len() > self.capacity {
            merged.pop_front();
        }
        self.samples = merged;
    }

    /// Returns an owned copy of the samples, oldest first.
    pub fn snapshot(&self) -> Vec<Sample> {
        self.samples.iter().copied().collect()
    }

    /// Arithmetic mean of the last `min(n, len)` values.
    ///
    /// Returns `None` when there is nothing to average, which is distinct
    /// from an average of exactly zero.
    pub fn average_of_last(&self, n: usize) -> Option<f64> {
        let take = n.min(self.samples.len());
        if take == 0 {
            return None;
        }
        let sum: f64 = self.samples.iter().rev().take(take).map(|s| s.value).sum();
        Some(sum / take as f64)
    }

    /// Returns the most recent sample.
    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    /// Returns an iterator over the samples in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    /// Returns the number of samples held.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the series holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the maximum number of samples this series keeps.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(values: &[f64]) -> Vec<Sample> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Sample::new(*v, i as i64))
            .collect()
    }

    #[test]
    fn test_append_keeps_last_capacity_samples() {
        let mut series = BoundedSeries::new(100);
        for i in 0..250 {
            series.append(Sample::new(i as f64, i));
        }

        assert_eq!(series.len(), 100);
        let snapshot = series.snapshot();
        assert_eq!(snapshot.first(), Some(&Sample::new(150.0, 150)));
        assert_eq!(snapshot.last(), Some(&Sample::new(249.0, 249)));
        assert!(snapshot.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn test_append_returns_evicted_head() {
        let mut series = BoundedSeries::new(2);
        assert_eq!(series.append(Sample::new(1.0, 1)), None);
        assert_eq!(series.append(Sample::new(2.0, 2)), None);
        assert_eq!(series.append(Sample::new(3.0, 3)), Some(Sample::new(1.0, 1)));
    }

    #[test]
    fn test_evict_before_is_inclusive_and_idempotent() {
        let mut series = BoundedSeries::with_samples(10, samples(&[1.0, 2.0, 3.0, 4.0]));

        assert_eq!(series.evict_before(1), 2);
        assert_eq!(series.snapshot(), vec![Sample::new(3.0, 2), Sample::new(4.0, 3)]);
        assert_eq!(series.evict_before(1), 0);

        let mut empty = BoundedSeries::new(10);
        assert_eq!(empty.evict_before(i64::MAX), 0);
    }

    #[test]
    fn test_average_of_last() {
        let series = BoundedSeries::with_samples(100, samples(&[1.0, 2.0, 3.0, 4.0]));
        assert_eq!(series.average_of_last(10), Some(2.5));
        assert_eq!(series.average_of_last(2), Some(3.5));
        assert_eq!(series.average_of_last(0), None);
    }

    #[test]
    fn test_average_of_empty_series_is_no_data() {
        let series = BoundedSeries::new(100);
        assert_eq!(series.average_of_last(10), None);

        let zeros = BoundedSeries::with_samples(100, samples(&[0.0, 0.0]));
        assert_eq!(zeros.average_of_last(10), Some(0.0));
    }

    #[test]
    fn test_merge_older_trims_from_head() {
        let mut series = BoundedSeries::with_samples(3, vec![Sample::new(10.0, 10)]);
        series.merge_older(vec![
            Sample::new(1.0, 1),
            Sample::new(2.0, 2),
            Sample::new(3.0, 3),
        ]);

        assert_eq!(
            series.snapshot(),
            vec![Sample::new(2.0, 2), Sample::new(3.0, 3), Sample::new(10.0, 10)]
        );
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut series = BoundedSeries::with_samples(5, samples(&[1.0]));
        let snapshot = series.snapshot();
        series.append(Sample::new(2.0, 5));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(series.latest(), Some(&Sample::new(2.0, 5)));
    }
}

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

//! Metric identities, samples and inbound metric records.

use super::{require_finite, require_label};
use crate::error::{TelemetryError, TelemetryResult};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Display};
use std::str::FromStr;

/// The composite `category:name` identity of one metric series.
///
/// Serialized as its formatted string so it can be used directly as a JSON
/// object key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetricKey {
    /// The broad category of the metric (e.g. "render", "network").
    pub category: String,
    /// The specific name of the metric (e.g. "frame_time", "fetch_wallpaper").
    pub name: String,
}

impl MetricKey {
    /// Creates a new key from a category and a name.
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
        }
    }

    /// Returns the formatted `category:name` representation.
    pub fn to_string_formatted(&self) -> String {
        format!("{}:{}", self.category, self.name)
    }
}

impl Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.category, self.name)
    }
}

impl FromStr for MetricKey {
    type Err = TelemetryError;

    /// Splits on the first `:`; the name may itself contain colons.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (category, name) = s.split_once(':').ok_or_else(|| {
            TelemetryError::InvalidRecord(format!("metric key `{s}` has no `category:` prefix"))
        })?;
        require_label("category", category)?;
        require_label("name", name)?;
        Ok(Self::new(category, name))
    }
}

impl Serialize for MetricKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MetricKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// A single timestamped measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// The measured value.
    pub value: f64,
    /// Epoch milliseconds at which the value was observed.
    pub timestamp: i64,
}

impl Sample {
    /// Creates a new sample.
    pub fn new(value: f64, timestamp: i64) -> Self {
        Self { value, timestamp }
    }
}

/// A metric observation as submitted by a producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricRecord {
    /// Category half of the metric key.
    pub category: String,
    /// Name half of the metric key.
    pub name: String,
    /// The measured value.
    pub value: f64,
    /// Epoch milliseconds at which the value was observed.
    pub timestamp: i64,
}

impl MetricRecord {
    /// Creates a new metric record.
    pub fn new(
        category: impl Into<String>,
        name: impl Into<String>,
        value: f64,
        timestamp: i64,
    ) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
            value,
            timestamp,
        }
    }

    /// Checks that the record can be routed to a series.
    pub fn validate(&self) -> TelemetryResult<()> {
        require_label("category", &self.category)?;
        require_label("name", &self.name)?;
        if self.category.contains(':') {
            return Err(TelemetryError::InvalidRecord(format!(
                "`category` must not contain `:`, got `{}`",
                self.category
            )));
        }
        require_finite("value", self.value)
    }

    /// Returns the key of the series this record belongs to.
    pub fn key(&self) -> MetricKey {
        MetricKey::new(self.category.clone(), self.name.clone())
    }

    /// Returns the sample carried by this record.
    pub fn sample(&self) -> Sample {
        Sample::new(self.value, self.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_key_formatting() {
        let key = MetricKey::new("network", "fetch_wallpaper");
        assert_eq!(key.to_string_formatted(), "network:fetch_wallpaper");
        assert_eq!(key.to_string(), "network:fetch_wallpaper");
    }

    #[test]
    fn test_metric_key_parse_splits_on_first_colon() {
        let key: MetricKey = "render:pass:main".parse().unwrap();
        assert_eq!(key.category, "render");
        assert_eq!(key.name, "pass:main");

        assert!("no_separator".parse::<MetricKey>().is_err());
        assert!(":name".parse::<MetricKey>().is_err());
        assert!("category:".parse::<MetricKey>().is_err());
    }

    #[test]
    fn test_metric_key_serializes_as_string() {
        let key = MetricKey::new("ui", "tab_switch");
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"ui:tab_switch\"");

        let back: MetricKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn test_metric_record_validation() {
        assert!(MetricRecord::new("ui", "render", 1.0, 0).validate().is_ok());
        assert!(MetricRecord::new("", "render", 1.0, 0).validate().is_err());
        assert!(MetricRecord::new("ui", "  ", 1.0, 0).validate().is_err());
        assert!(MetricRecord::new("ui:x", "render", 1.0, 0).validate().is_err());
        assert!(MetricRecord::new("ui", "render", f64::NAN, 0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_metric_record_from_camel_case_json() {
        let record: MetricRecord = serde_json::from_str(
            r#"{"category":"network","name":"api","value":12.5,"timestamp":1700000000000}"#,
        )
        .unwrap();
        assert_eq!(record.key(), MetricKey::new("network", "api"));
        assert_eq!(record.sample(), Sample::new(12.5, 1_700_000_000_000));
    }
}

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

//! Error types shared across the perfwatch crates.

use thiserror::Error;

/// A specialized `Result` type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// An error that can occur within the telemetry system or one of its collaborators.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// An inbound record was missing a required field or carried an unusable value.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
    /// An error originating from a key-value store backend.
    #[error("Storage error: {0}")]
    Storage(String),
    /// A value could not be encoded to or decoded from JSON.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// An I/O error, typically from a file-backed store or a report export.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// An alert sink failed to deliver a notification.
    #[error("Alert delivery failed: {0}")]
    Alert(String),
    /// The engine configuration is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TelemetryError::InvalidRecord("missing category".to_string());
        assert_eq!(err.to_string(), "Invalid record: missing category");

        let err = TelemetryError::Storage("disk full".to_string());
        assert_eq!(err.to_string(), "Storage error: disk full");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<u32>("not a number").unwrap_err();
        let err: TelemetryError = json_err.into();
        assert!(matches!(err, TelemetryError::Serialization(_)));
    }
}

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

//! Test doubles shared by the integration tests.

use perfwatch_core::telemetry::{Alert, AlertSink};
use perfwatch_core::TelemetryResult;
use std::borrow::Cow;
use std::sync::Mutex;

/// Remembers every alert it receives.
#[derive(Debug, Default)]
pub struct RecordingSink {
    alerts: Mutex<Vec<Alert>>,
}

impl RecordingSink {
    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().unwrap().clone()
    }
}

impl AlertSink for RecordingSink {
    fn sink_id(&self) -> Cow<'static, str> {
        Cow::Borrowed("recording")
    }

    fn notify(&self, alert: &Alert) -> TelemetryResult<()> {
        self.alerts.lock().unwrap().push(alert.clone());
        Ok(())
    }
}

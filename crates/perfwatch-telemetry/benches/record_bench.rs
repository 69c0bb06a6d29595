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

use criterion::{criterion_group, criterion_main, Criterion};
use perfwatch_core::telemetry::{Alert, AlertSink, MetricRecord, ViolationEvent};
use perfwatch_core::{EngineConfig, TelemetryResult};
use perfwatch_infra::storage::InMemoryStore;
use perfwatch_telemetry::TelemetryEngine;
use std::borrow::Cow;
use std::hint::black_box;
use std::sync::Arc;

#[derive(Debug)]
struct NullSink;

impl AlertSink for NullSink {
    fn sink_id(&self) -> Cow<'static, str> {
        Cow::Borrowed("null")
    }

    fn notify(&self, _alert: &Alert) -> TelemetryResult<()> {
        Ok(())
    }
}

fn engine() -> TelemetryEngine {
    TelemetryEngine::new(
        EngineConfig::default(),
        Arc::new(InMemoryStore::new()),
        Arc::new(NullSink),
    )
    .unwrap()
}

fn bench_record(c: &mut Criterion) {
    let engine = engine();
    // Warm a realistic number of full series.
    for key in 0..20 {
        for t in 0..100 {
            engine.record_metric(MetricRecord::new("render", format!("pass_{key}"), 1.0, t));
        }
    }

    let mut t = 100;
    c.bench_function("record_metric (20 full series)", |b| {
        b.iter(|| {
            t += 1;
            engine.record_metric(black_box(MetricRecord::new("render", "pass_0", 16.6, t)));
        })
    });

    c.bench_function("record_violation", |b| {
        b.iter(|| {
            t += 1;
            engine.record_violation(black_box(ViolationEvent::new("frame", 40.0, 16.6, t)));
        })
    });

    c.bench_function("report", |b| b.iter(|| black_box(engine.report())));
}

criterion_group!(benches, bench_record);
criterion_main!(benches);

//! Shared test utilities
//!
//! Log capture for asserting on emitted `tracing` events, and seeded
//! generators for synthetic vector series.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::Registry;

use crate::series::Vector3Series;
use crate::time::parse_time;

/// One event seen by [`capture_events`]
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level: Level,
    pub message: String,
    pub fields: BTreeMap<String, String>,
}

impl CapturedEvent {
    /// Recorded value of a non-message field
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

#[derive(Clone, Default)]
struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: BTreeMap<String, String>,
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.fields.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let value = format!("{value:?}");
        if field.name() == "message" {
            self.message = value;
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

impl<S: Subscriber> Layer<S> for EventCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}

/// Run `f` with a thread-local subscriber and return its events
pub fn capture_events<T>(f: impl FnOnce() -> T) -> (T, Vec<CapturedEvent>) {
    let capture = EventCapture::default();
    let subscriber = Registry::default().with(capture.clone());
    let out = tracing::subscriber::with_default(subscriber, f);
    let events = capture.events.lock().unwrap().clone();
    (out, events)
}

/// Events at exactly `level`
pub fn at_level(events: &[CapturedEvent], level: Level) -> Vec<&CapturedEvent> {
    events.iter().filter(|e| e.level == level).collect()
}

/// Random vectors with components in [-scale, scale] at `n` times spread
/// over 1995-2025
pub fn random_series(name: &str, n: usize, seed: u64, scale: f64) -> Vector3Series {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = parse_time("1995-01-01").unwrap();
    let stop = parse_time("2025-01-01").unwrap();
    let times = Array1::linspace(start, stop, n);
    let values = Array2::from_shape_fn((n, 3), |_| rng.gen_range(-scale..=scale));
    Vector3Series::new(name, times, values).unwrap()
}

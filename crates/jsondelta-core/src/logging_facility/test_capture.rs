//! In-memory event capture for log assertions in tests
//!
//! The capture layer is installed once as the global subscriber and keeps
//! every event it sees. Differ runs tag their events with `run_id`, so tests
//! running in parallel filter down to their own run with
//! [`TestCapture::events_for_run`].

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};
use tracing::field::{Field, Visit};
use tracing::{Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use jsondelta_core_types::schema::{
    EVENT_END, EVENT_END_ERROR, EVENT_START, FIELD_COMPONENT, FIELD_EVENT, FIELD_OP, FIELD_RUN_ID,
};

type Buffer = Arc<Mutex<Vec<CapturedEvent>>>;

/// One recorded event; every field value is kept in its rendered form
#[derive(Clone, Debug)]
pub struct CapturedEvent {
    pub level: Level,
    pub component: Option<String>,
    pub op: Option<String>,
    pub event: Option<String>,
    pub run_id: Option<String>,
    pub fields: HashMap<String, String>,
}

impl CapturedEvent {
    fn from_fields(level: Level, fields: HashMap<String, String>) -> Self {
        let lift = |key: &str| fields.get(key).cloned();
        let component = lift(FIELD_COMPONENT);
        let op = lift(FIELD_OP);
        let event = lift(FIELD_EVENT);
        let run_id = lift(FIELD_RUN_ID);
        Self {
            level,
            component,
            op,
            event,
            run_id,
            fields,
        }
    }

    /// True when this event has operation `op` and event name `event`
    pub fn is(&self, op: &str, event: &str) -> bool {
        self.op.as_deref() == Some(op) && self.event.as_deref() == Some(event)
    }
}

#[derive(Default)]
struct Fields(HashMap<String, String>);

impl Fields {
    fn put(&mut self, field: &Field, rendered: String) {
        self.0.insert(field.name().to_string(), rendered);
    }
}

impl Visit for Fields {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.put(field, format!("{:?}", value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, value.to_string());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.put(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, value.to_string());
    }
}

/// Layer appending every event to a shared buffer
pub struct TestCaptureLayer {
    buffer: Buffer,
}

impl TestCaptureLayer {
    /// A layer plus the handle reading what it captures
    pub fn new() -> (Self, TestCapture) {
        let buffer = Buffer::default();
        (
            Self {
                buffer: Arc::clone(&buffer),
            },
            TestCapture { buffer },
        )
    }
}

impl<S> Layer<S> for TestCaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = Fields::default();
        event.record(&mut fields);
        let captured = CapturedEvent::from_fields(*event.metadata().level(), fields.0);

        if let Ok(mut buffer) = self.buffer.lock() {
            buffer.push(captured);
        }
    }
}

/// Read handle over the captured events
#[derive(Clone)]
pub struct TestCapture {
    buffer: Buffer,
}

impl TestCapture {
    /// Snapshot of every event captured so far
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.buffer
            .lock()
            .map(|buffer| buffer.clone())
            .unwrap_or_default()
    }

    /// Events tagged with one differ run's id, in emission order
    pub fn events_for_run(&self, run_id: &str) -> Vec<CapturedEvent> {
        self.filtered(|e| e.run_id.as_deref() == Some(run_id))
    }

    /// Number of events matching `predicate`
    pub fn count_events<F>(&self, predicate: F) -> usize
    where
        F: Fn(&CapturedEvent) -> bool,
    {
        self.filtered(predicate).len()
    }

    /// # Panics
    ///
    /// Panics if no captured event has operation `op` and event name `event`
    pub fn assert_event_exists(&self, op: &str, event: &str) {
        let total = self.events().len();
        assert!(
            self.count_events(|e| e.is(op, event)) > 0,
            "no event op={} event={} among {} captured events",
            op,
            event,
            total
        );
    }

    /// Check the run bracketing of one differ run
    ///
    /// # Panics
    ///
    /// Panics unless the run emitted exactly one start event and exactly one
    /// terminal event (end or end_error)
    pub fn assert_run_bracketed(&self, run_id: &str) {
        let events = self.events_for_run(run_id);
        let starts = events.iter().filter(|e| e.is("diff", EVENT_START)).count();
        let terminals = events
            .iter()
            .filter(|e| e.is("diff", EVENT_END) || e.is("diff", EVENT_END_ERROR))
            .count();
        assert_eq!(starts, 1, "run {} emitted {} start events", run_id, starts);
        assert_eq!(
            terminals, 1,
            "run {} emitted {} terminal events",
            run_id, terminals
        );
    }

    /// Drop everything captured so far
    pub fn clear(&self) {
        if let Ok(mut buffer) = self.buffer.lock() {
            buffer.clear();
        }
    }

    fn filtered<F>(&self, predicate: F) -> Vec<CapturedEvent>
    where
        F: Fn(&CapturedEvent) -> bool,
    {
        self.events().into_iter().filter(|e| predicate(e)).collect()
    }
}

static GLOBAL_CAPTURE: OnceLock<TestCapture> = OnceLock::new();

/// Install the capture layer globally on first call; every call returns a
/// handle to the same buffer
///
/// # Example
///
/// ```
/// use jsondelta_core::logging_facility::test_capture::init_test_capture;
/// use jsondelta_core::{log_op_start, Differ};
/// use serde_json::json;
///
/// let capture = init_test_capture();
/// let value = json!([1, 2]);
/// let mut differ = Differ::new(&value, &value);
/// differ.diff().unwrap();
/// capture.assert_run_bracketed(differ.run_id().as_str());
///
/// log_op_start!("my_operation");
/// capture.assert_event_exists("my_operation", "start");
/// ```
pub fn init_test_capture() -> TestCapture {
    GLOBAL_CAPTURE
        .get_or_init(|| {
            let (layer, capture) = TestCaptureLayer::new();
            tracing_subscriber::registry().with(layer).init();
            capture
        })
        .clone()
}

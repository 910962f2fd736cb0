//! Fields recorded on the per-batch tracing span.

mod support;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing::Subscriber;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::registry::Registry;

use mailbatch_engine::{DispatchSettings, Dispatcher};

use support::{FaultyStore, ScriptedTransport, StaticAttachments};

type Fields = Arc<Mutex<Vec<(String, String)>>>;

/// Captures the fields a `run_batch` span is created with.
struct BatchSpanFields(Fields);

struct Collector<'a>(&'a mut Vec<(String, String)>);

impl Visit for Collector<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{:?}", value)));
    }
}

impl<S: Subscriber> Layer<S> for BatchSpanFields {
    fn on_new_span(&self, attrs: &Attributes<'_>, _id: &Id, _ctx: Context<'_, S>) {
        if attrs.metadata().name() != "run_batch" {
            return;
        }
        let mut fields = self.0.lock();
        attrs.record(&mut Collector(&mut *fields));
    }
}

#[tokio::test]
async fn test_batch_span_records_limit() {
    let fields: Fields = Arc::default();
    let subscriber = Registry::default().with(BatchSpanFields(fields.clone()));
    let _guard = tracing::subscriber::set_default(subscriber);

    let events = support::events();
    let store = Arc::new(FaultyStore::new(&["one@x.io"], events.clone()));
    let dispatcher = Dispatcher::new(
        store,
        Arc::new(ScriptedTransport::new(events)),
        Arc::new(StaticAttachments::new(&[])),
        DispatchSettings {
            max_concurrency: 1,
            select_timeout: Duration::from_secs(10),
            record_timeout: Duration::from_secs(5),
        },
    );

    let result = dispatcher
        .run_batch(25, support::message(&[]))
        .await
        .unwrap();
    assert_eq!(result.count, 1);

    let fields = fields.lock();
    assert!(fields.iter().any(|(name, value)| name == "limit" && value == "25"));
    assert!(fields.iter().any(|(name, _)| name == "batch_id"));
}

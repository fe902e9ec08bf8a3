//! Notification dispatch
//!
//! Forwards committed [`OrderTransitionEvent`]s to an external consumer.
//! Delivery is best-effort at-least-once: the worker retries a bounded
//! number of times and then drops the event with an error log. Consumers
//! must deduplicate on `(order_id, previous_status, new_status)`.

mod sink;
mod worker;

pub use sink::{LogSink, NotificationSink, NotifyError, WebhookSink};
pub use worker::NotificationWorker;

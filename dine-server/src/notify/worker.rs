//! Notification worker
//!
//! Subscribes to the order transition broadcast channel and pushes each
//! event through the configured [`NotificationSink`] with bounded
//! retry/backoff. Runs as a long-lived background worker under a
//! cancellation token.

use std::sync::Arc;
use std::time::Duration;

use shared::OrderTransitionEvent;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use super::NotificationSink;

const MAX_ATTEMPTS: u32 = 3;
const BASE_BACKOFF_MS: u64 = 250;

/// Forwards transition events to a sink
pub struct NotificationWorker {
    sink: Arc<dyn NotificationSink>,
}

impl NotificationWorker {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    /// Run until the channel closes or shutdown is requested
    pub async fn run(
        self,
        mut events: broadcast::Receiver<OrderTransitionEvent>,
        shutdown: CancellationToken,
    ) {
        tracing::info!("Notification worker started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Notification worker received shutdown signal");
                    break;
                }
                event = events.recv() => {
                    match event {
                        Ok(event) => self.dispatch(&event).await,
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            // Best-effort channel: log the gap and keep going
                            tracing::warn!(missed, "Notification worker lagged, events dropped");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            tracing::info!("Event channel closed, notification worker stopping");
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Deliver one event with bounded retry
    async fn dispatch(&self, event: &OrderTransitionEvent) {
        let mut backoff = Duration::from_millis(BASE_BACKOFF_MS);
        for attempt in 1..=MAX_ATTEMPTS {
            match self.sink.deliver(event).await {
                Ok(()) => return,
                Err(e) if attempt < MAX_ATTEMPTS => {
                    tracing::warn!(
                        order_id = %event.order_id,
                        attempt,
                        error = %e,
                        "Notification delivery failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                Err(e) => {
                    tracing::error!(
                        order_id = %event.order_id,
                        attempts = MAX_ATTEMPTS,
                        error = %e,
                        "Notification delivery failed, giving up"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NotifyError;
    use async_trait::async_trait;
    use shared::{OrderStatus, TransitionActor};
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakySink {
        /// Failures to inject before succeeding
        failures: AtomicU32,
        delivered: AtomicU32,
    }

    #[async_trait]
    impl NotificationSink for FlakySink {
        async fn deliver(&self, _event: &OrderTransitionEvent) -> Result<(), NotifyError> {
            if self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(NotifyError::BadStatus(503));
            }
            self.delivered.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn event() -> OrderTransitionEvent {
        OrderTransitionEvent {
            order_id: "o1".into(),
            restaurant_id: "r1".into(),
            previous_status: Some(OrderStatus::Pending),
            new_status: OrderStatus::Confirmed,
            actor: TransitionActor::Timer,
            occurred_at: 0,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_retries_until_success() {
        let sink = Arc::new(FlakySink {
            failures: AtomicU32::new(2),
            delivered: AtomicU32::new(0),
        });
        let worker = NotificationWorker::new(sink.clone());

        worker.dispatch(&event()).await;
        assert_eq!(sink.delivered.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_gives_up_after_max_attempts() {
        let sink = Arc::new(FlakySink {
            failures: AtomicU32::new(10),
            delivered: AtomicU32::new(0),
        });
        let worker = NotificationWorker::new(sink.clone());

        worker.dispatch(&event()).await;
        assert_eq!(sink.delivered.load(Ordering::SeqCst), 0);
        // Exactly MAX_ATTEMPTS failures were consumed
        assert_eq!(sink.failures.load(Ordering::SeqCst), 10 - MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_worker_stops_on_shutdown() {
        let sink = Arc::new(FlakySink {
            failures: AtomicU32::new(0),
            delivered: AtomicU32::new(0),
        });
        let (tx, rx) = broadcast::channel(8);
        let shutdown = CancellationToken::new();

        let handle = tokio::spawn(NotificationWorker::new(sink.clone()).run(rx, shutdown.clone()));

        tx.send(event()).unwrap();
        for _ in 0..100 {
            if sink.delivered.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        shutdown.cancel();
        handle.await.unwrap();
        assert_eq!(sink.delivered.load(Ordering::SeqCst), 1);
    }
}

//! Publication Dispatcher
//!
//! Decouples trade mutations from event delivery. Trades are queued on a
//! bounded channel and published by a single background task, one at a time
//! and in the order they were accepted. A full queue drops the event instead
//! of blocking the caller.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{EventPublishError, EventPublisherPort};
use crate::domain::trade_lifecycle::Trade;
use crate::observability;

/// Configuration for the publication dispatcher.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Events buffered before new ones are dropped.
    pub queue_capacity: usize,
    /// Upper bound on a single publish call.
    pub publish_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1_024,
            publish_timeout: Duration::from_secs(5),
        }
    }
}

/// What happened to a dispatched trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Accepted for publication.
    Queued,
    /// Discarded because the queue was full or closed.
    Dropped,
}

/// Bounded fire-and-forget publisher front end.
pub struct PublicationDispatcher {
    tx: mpsc::Sender<Trade>,
    cancel: CancellationToken,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for PublicationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublicationDispatcher")
            .field("capacity", &self.tx.max_capacity())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl PublicationDispatcher {
    /// Start the background worker. Must be called inside a tokio runtime.
    pub fn spawn(publisher: Arc<dyn EventPublisherPort>, config: DispatcherConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let cancel = CancellationToken::new();
        let worker = tokio::spawn(run_worker(
            rx,
            publisher,
            config.publish_timeout,
            cancel.clone(),
        ));

        tracing::info!(
            queue_capacity = config.queue_capacity,
            publish_timeout_ms = duration_ms(config.publish_timeout),
            "Publication dispatcher started"
        );

        Self {
            tx,
            cancel,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Queue a trade for publication without waiting.
    pub fn dispatch(&self, trade: Trade) -> DispatchOutcome {
        match self.tx.try_send(trade) {
            Ok(()) => DispatchOutcome::Queued,
            Err(TrySendError::Full(trade)) => {
                tracing::warn!(
                    trade_id = %trade.id(),
                    "Publication queue full, dropping trade event"
                );
                observability::record_event_dropped();
                DispatchOutcome::Dropped
            }
            Err(TrySendError::Closed(trade)) => {
                tracing::warn!(
                    trade_id = %trade.id(),
                    "Publication dispatcher stopped, dropping trade event"
                );
                observability::record_event_dropped();
                DispatchOutcome::Dropped
            }
        }
    }

    /// Stop accepting trades and publish what is already queued.
    ///
    /// Returns `true` if the queue drained within `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        self.cancel.cancel();

        let Some(worker) = self.worker.lock().take() else {
            return true;
        };

        match tokio::time::timeout(timeout, worker).await {
            Ok(Ok(())) => {
                tracing::info!("Publication dispatcher drained");
                true
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Publication worker failed");
                false
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = duration_ms(timeout),
                    "Publication dispatcher did not drain before timeout"
                );
                false
            }
        }
    }
}

async fn run_worker(
    mut rx: mpsc::Receiver<Trade>,
    publisher: Arc<dyn EventPublisherPort>,
    publish_timeout: Duration,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            next = rx.recv() => match next {
                Some(trade) => publish_one(publisher.as_ref(), &trade, publish_timeout).await,
                None => return,
            },
        }
    }

    rx.close();
    while let Some(trade) = rx.recv().await {
        publish_one(publisher.as_ref(), &trade, publish_timeout).await;
    }
}

async fn publish_one(publisher: &dyn EventPublisherPort, trade: &Trade, timeout: Duration) {
    let started = Instant::now();
    let result = match tokio::time::timeout(timeout, publisher.publish_trade(trade)).await {
        Ok(result) => result,
        Err(_) => Err(EventPublishError::Timeout {
            timeout_ms: duration_ms(timeout),
        }),
    };

    match result {
        Ok(()) => {
            observability::record_event_published(started.elapsed().as_secs_f64());
            tracing::debug!(trade_id = %trade.id(), "Trade event published");
        }
        Err(e) => {
            let payload = serde_json::to_string(trade)
                .unwrap_or_else(|err| format!("<unserializable: {err}>"));
            tracing::error!(
                trade_id = %trade.id(),
                payload = %payload,
                error = %e,
                "Failed to publish trade event"
            );
            observability::record_event_failed(failure_reason(&e));
        }
    }
}

const fn failure_reason(error: &EventPublishError) -> &'static str {
    match error {
        EventPublishError::ConnectionError { .. } => "connection",
        EventPublishError::SerializationError { .. } => "serialization",
        EventPublishError::Rejected { .. } => "rejected",
        EventPublishError::Timeout { .. } => "timeout",
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

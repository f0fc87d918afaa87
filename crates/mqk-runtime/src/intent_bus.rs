//! Intent bus (§4.1): a single bounded FIFO queue multiple producers feed
//! and exactly one consumer drains. Producers that cannot enqueue under
//! backpressure must drop the intent and emit an event rather than block —
//! `try_enqueue` never awaits.

use mqk_execution::ExecutionIntent;
use tokio::sync::mpsc;

pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Returned when the bus is full; the caller drops the intent.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueBackpressure {
    pub producer: &'static str,
}

/// The producer half. Cheaply cloned — every producer task holds one.
#[derive(Clone)]
pub struct IntentProducer {
    tx: mpsc::Sender<ExecutionIntent>,
    name: &'static str,
}

impl IntentProducer {
    /// Attempts to enqueue without waiting. On a full queue, logs a
    /// `queue_backpressure` event and returns it to the caller instead of
    /// blocking the producer loop.
    pub fn try_enqueue(&self, intent: ExecutionIntent) -> Result<(), QueueBackpressure> {
        match self.tx.try_send(intent) {
            Ok(()) => {
                tracing::info!(source = self.name, "intent_received");
                Ok(())
            }
            Err(_) => {
                tracing::warn!(producer = self.name, "queue_backpressure");
                Err(QueueBackpressure { producer: self.name })
            }
        }
    }

    pub fn named(&self, name: &'static str) -> Self {
        Self { tx: self.tx.clone(), name }
    }

    /// Number of intents currently sitting on the bus, for the heartbeat's
    /// `queue_depth` field.
    pub fn queue_depth(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }
}

pub struct IntentConsumer {
    rx: mpsc::Receiver<ExecutionIntent>,
}

impl IntentConsumer {
    pub async fn recv(&mut self) -> Option<ExecutionIntent> {
        self.rx.recv().await
    }
}

/// Builds the bus: one producer template (clone and `named(...)` it per
/// producer task) and the sole consumer.
pub fn intent_bus(capacity: usize) -> (IntentProducer, IntentConsumer) {
    let (tx, rx) = mpsc::channel(capacity);
    (IntentProducer { tx, name: "unnamed" }, IntentConsumer { rx })
}

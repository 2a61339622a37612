//! Channel-backed in-memory delivery queue for tests and local runs.

use crate::consumer::domain::Envelope;
use crate::consumer::ports::{Delivery, DeliveryError, DeliveryResult, DeliverySource};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, mpsc};

/// In-memory delivery queue with a bounded redelivery policy.
///
/// A requeued delivery goes back onto the channel until it has been
/// redelivered `max_redeliveries` times; after that it is dropped and
/// counted as dead-lettered, mirroring a broker's retry limit.
pub struct InMemoryDeliveryQueue {
    tx: mpsc::UnboundedSender<QueuedEnvelope>,
    rx: Mutex<mpsc::UnboundedReceiver<QueuedEnvelope>>,
    max_redeliveries: u32,
    counters: Arc<QueueCounters>,
}

#[derive(Debug, Default)]
struct QueueCounters {
    acked: AtomicU64,
    dead_lettered: AtomicU64,
    rejected: AtomicU64,
}

#[derive(Debug, Clone)]
struct QueuedEnvelope {
    envelope: Envelope,
    redeliveries: u32,
}

impl InMemoryDeliveryQueue {
    /// Creates an empty queue allowing `max_redeliveries` extra attempts
    /// per delivery.
    #[must_use]
    pub fn new(max_redeliveries: u32) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(rx),
            max_redeliveries,
            counters: Arc::new(QueueCounters::default()),
        }
    }

    /// Publishes an envelope for consumption.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Closed`] when the queue has shut down.
    pub fn publish(&self, envelope: Envelope) -> DeliveryResult<()> {
        self.tx
            .send(QueuedEnvelope {
                envelope,
                redeliveries: 0,
            })
            .map_err(|_| DeliveryError::Closed)
    }

    /// Number of deliveries acknowledged so far.
    #[must_use]
    pub fn acked(&self) -> u64 {
        self.counters.acked.load(Ordering::Relaxed)
    }

    /// Number of deliveries dropped after exhausting their redeliveries.
    #[must_use]
    pub fn dead_lettered(&self) -> u64 {
        self.counters.dead_lettered.load(Ordering::Relaxed)
    }

    /// Number of deliveries rejected without retry.
    #[must_use]
    pub fn rejected(&self) -> u64 {
        self.counters.rejected.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl DeliverySource for InMemoryDeliveryQueue {
    async fn lease(&self) -> Option<Box<dyn Delivery>> {
        let queued = self.rx.lock().await.recv().await?;
        Some(Box::new(InMemoryDelivery {
            queued,
            tx: self.tx.clone(),
            max_redeliveries: self.max_redeliveries,
            counters: Arc::clone(&self.counters),
        }))
    }
}

struct InMemoryDelivery {
    queued: QueuedEnvelope,
    tx: mpsc::UnboundedSender<QueuedEnvelope>,
    max_redeliveries: u32,
    counters: Arc<QueueCounters>,
}

#[async_trait]
impl Delivery for InMemoryDelivery {
    fn envelope(&self) -> &Envelope {
        &self.queued.envelope
    }

    async fn ack(self: Box<Self>) -> DeliveryResult<()> {
        self.counters.acked.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn requeue(self: Box<Self>) -> DeliveryResult<()> {
        if self.queued.redeliveries < self.max_redeliveries {
            let QueuedEnvelope {
                envelope,
                redeliveries,
            } = self.queued;
            self.tx
                .send(QueuedEnvelope {
                    envelope,
                    redeliveries: redeliveries.saturating_add(1),
                })
                .map_err(|_| DeliveryError::Closed)
        } else {
            self.counters.dead_lettered.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    async fn reject(self: Box<Self>) -> DeliveryResult<()> {
        self.counters.rejected.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

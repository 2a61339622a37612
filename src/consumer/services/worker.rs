//! Worker loop: leases deliveries and runs them through the interceptor.

use crate::consumer::domain::Outcome;
use crate::consumer::ports::{Delivery, DeliveryResult, DeliverySource, TaskHandler};
use crate::consumer::services::LifecycleInterceptor;
use crate::task::ports::TaskStore;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Handle over a group of consumer loops.
pub struct Worker {
    shutdown_tx: watch::Sender<bool>,
    joins: Vec<JoinHandle<()>>,
}

impl Worker {
    /// Spawns `consumers` loops over a shared delivery source.
    ///
    /// Concurrency degree is exactly `consumers`; each in-flight delivery
    /// carries its own interceptor receipt, so loops never share mutable
    /// state.
    #[must_use]
    pub fn spawn<Q, S, H>(
        consumers: usize,
        source: Arc<Q>,
        interceptor: LifecycleInterceptor<S>,
        handler: Arc<H>,
    ) -> Self
    where
        Q: DeliverySource + 'static,
        S: TaskStore + 'static,
        H: TaskHandler + 'static,
    {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut joins = Vec::with_capacity(consumers);
        for consumer_id in 0..consumers {
            let loop_source = Arc::clone(&source);
            let loop_interceptor = interceptor.clone();
            let loop_handler = Arc::clone(&handler);
            let mut rx = shutdown_rx.clone();

            let join = tokio::spawn(async move {
                consume_loop(
                    consumer_id,
                    loop_source,
                    loop_interceptor,
                    loop_handler,
                    &mut rx,
                )
                .await;
            });
            joins.push(join);
        }

        Self { shutdown_tx, joins }
    }

    /// Requests shutdown for all consumer loops.
    ///
    /// In-flight deliveries finish; no new leases are taken.
    pub fn request_shutdown(&self) {
        // receivers may already be gone
        drop(self.shutdown_tx.send(true));
    }

    /// Requests shutdown and waits for all loops to exit.
    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        for join in self.joins {
            if let Err(err) = join.await {
                tracing::error!(error = %err, "consumer loop panicked");
            }
        }
    }
}

async fn consume_loop<Q, S, H>(
    consumer_id: usize,
    source: Arc<Q>,
    interceptor: LifecycleInterceptor<S>,
    handler: Arc<H>,
    shutdown_rx: &mut watch::Receiver<bool>,
) where
    Q: DeliverySource,
    S: TaskStore,
    H: TaskHandler,
{
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        let leased = tokio::select! {
            _ = shutdown_rx.changed() => continue,
            leased = source.lease() => leased,
        };

        let Some(delivery) = leased else {
            tracing::info!(consumer_id, "delivery source closed");
            break;
        };

        process_delivery(consumer_id, delivery, &interceptor, &*handler).await;
    }
}

/// Runs one delivery through decode, the interceptor hooks, and the
/// handler, then reports its fate back to the transport.
async fn process_delivery<S, H>(
    consumer_id: usize,
    delivery: Box<dyn Delivery>,
    interceptor: &LifecycleInterceptor<S>,
    handler: &H,
) where
    S: TaskStore,
    H: TaskHandler,
{
    let payload = match delivery.envelope().payload() {
        Ok(payload) => payload,
        Err(err) => {
            tracing::error!(
                consumer_id,
                message_id = %delivery.envelope().message_id(),
                error = %err,
                "rejecting undecodable delivery"
            );
            report(consumer_id, delivery.reject().await);
            return;
        }
    };

    let receipt = match interceptor.on_receive(delivery.envelope(), &payload).await {
        Ok(receipt) => receipt,
        Err(err) => {
            tracing::error!(
                consumer_id,
                task_id = %payload.task_id(),
                error = %err,
                "task bookkeeping failed on receipt; requeueing delivery"
            );
            report(consumer_id, delivery.requeue().await);
            return;
        }
    };

    let outcome = match handler.handle(&payload).await {
        Ok(()) => Outcome::Success,
        Err(err) => Outcome::failure(err.to_string()),
    };

    if let Err(err) = interceptor.on_complete(receipt, &outcome).await {
        tracing::error!(
            consumer_id,
            task_id = %payload.task_id(),
            error = %err,
            "task bookkeeping failed on completion; requeueing delivery"
        );
        report(consumer_id, delivery.requeue().await);
        return;
    }

    // The outcome reaches the transport unchanged: success acknowledges,
    // failure hands the redelivery decision back to the broker.
    if outcome.is_success() {
        report(consumer_id, delivery.ack().await);
    } else {
        report(consumer_id, delivery.requeue().await);
    }
}

fn report(consumer_id: usize, result: DeliveryResult<()>) {
    if let Err(err) = result {
        tracing::error!(consumer_id, error = %err, "delivery report failed");
    }
}

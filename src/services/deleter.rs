//! Batched purge of soft-deleted books
//!
//! Removing a book only marks it deleted. Every successful mark sends one
//! [`DeletionSignal`] into a bounded queue whose capacity is the batch size.
//! A single [`DeletionBatcher`] task counts the signals and, once a full
//! batch has arrived, asks storage to purge every marked row in one call.
//!
//! A failed purge is not retried: the error is reported on the process error
//! channel and the batcher stops. On cancellation a partial batch is left
//! alone, the marks are already persisted and the next run picks them up.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::mpsc,
    time::{self, Instant, Interval, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    config::DeleterConfig,
    error::{AppError, AppResult},
    repository::Storage,
};

/// One book was soft-deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletionSignal;

/// Producer side of the signal queue, shared by request handlers
#[derive(Clone)]
pub struct DeletionNotifier {
    tx: mpsc::Sender<DeletionSignal>,
}

impl DeletionNotifier {
    /// Enqueue one signal. Waits for a free slot if the batcher is behind.
    pub async fn notify(&self) -> AppResult<()> {
        self.tx
            .send(DeletionSignal)
            .await
            .map_err(|_| AppError::Internal("deletion batcher is not running".to_string()))?;
        tracing::debug!(
            queued = self.tx.max_capacity() - self.tx.capacity(),
            "book sent into deletion queue"
        );
        Ok(())
    }
}

/// Single consumer of the signal queue
pub struct DeletionBatcher {
    storage: Arc<dyn Storage>,
    signals: mpsc::Receiver<DeletionSignal>,
    errors: mpsc::Sender<AppError>,
    batch_size: usize,
    flush_interval: Option<Duration>,
    pending: usize,
}

impl DeletionBatcher {
    /// Build the queue and its consumer. Purge failures are sent to `errors`.
    pub fn new(
        storage: Arc<dyn Storage>,
        config: &DeleterConfig,
        errors: mpsc::Sender<AppError>,
    ) -> (DeletionNotifier, Self) {
        let batch_size = config.batch_size.max(1);
        let (tx, rx) = mpsc::channel(batch_size);

        let batcher = Self {
            storage,
            signals: rx,
            errors,
            batch_size,
            flush_interval: config
                .flush_interval_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            pending: 0,
        };

        (DeletionNotifier { tx }, batcher)
    }

    /// Signals counted toward the current batch
    #[cfg(test)]
    fn pending(&self) -> usize {
        self.pending
    }

    /// Take one queued signal without running the batcher
    #[cfg(test)]
    pub(super) fn take_signal(&mut self) -> Option<DeletionSignal> {
        self.signals.try_recv().ok()
    }

    /// Count one signal. Returns true when the batch is complete, in which
    /// case the count is already back to zero.
    fn record_signal(&mut self) -> bool {
        self.pending += 1;
        if self.pending < self.batch_size {
            return false;
        }
        self.pending = 0;
        true
    }

    /// Consume signals until cancelled, every producer is gone, or a purge fails.
    pub async fn run(mut self, cancel: CancellationToken) -> AppResult<()> {
        tracing::info!(
            batch_size = self.batch_size,
            flush_interval = ?self.flush_interval,
            "deletion batcher started"
        );

        let mut ticker = self.flush_interval.map(|period| {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    tracing::debug!(pending = self.pending, "deletion batcher cancelled");
                    break;
                }
                signal = self.signals.recv() => match signal {
                    Some(DeletionSignal) => {
                        if self.record_signal() {
                            tracing::debug!(batch_size = self.batch_size, "start deleting");
                            self.purge().await?;
                        }
                    }
                    None => {
                        tracing::debug!(pending = self.pending, "deletion queue closed");
                        break;
                    }
                },
                _ = next_tick(&mut ticker) => {
                    if self.pending > 0 {
                        tracing::debug!(pending = self.pending, "flush interval elapsed");
                        self.pending = 0;
                        self.purge().await?;
                    }
                }
            }
        }

        tracing::debug!("deletion batcher ended");
        Ok(())
    }

    async fn purge(&self) -> AppResult<()> {
        match self.storage.delete_books().await {
            Ok(purged) => {
                tracing::info!(purged, "deleted books purged");
                Ok(())
            }
            Err(e) => {
                let reason = e.to_string();
                tracing::error!(error = %reason, "deleting books failed");
                if self
                    .errors
                    .send(AppError::PurgeFailed(reason.clone()))
                    .await
                    .is_err()
                {
                    tracing::warn!("no supervisor listening for batcher errors");
                }
                Err(AppError::PurgeFailed(reason))
            }
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

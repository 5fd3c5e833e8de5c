//! Fan-in side of the crawl.
//!
//! Detail tasks never touch the accepted set directly: they hold a
//! [`CollectorHandle`] and push records into a channel drained by a single
//! consumer task that owns the [`Collector`]. The consumer finishes once every
//! handle has been dropped and the channel is empty.

use crate::api::model::ProductId;
use crate::error::{AppError, AppResult};
use crate::model::output::NormalizedRecord;
use std::collections::HashSet;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub const CHANNEL_CAPACITY: usize = 100;

/// First-seen-wins set of records keyed by product id.
#[derive(Debug, Default)]
pub struct Collector {
    seen: HashSet<ProductId>,
    records: Vec<NormalizedRecord>,
    duplicates: usize,
}

impl Collector {
    /// Accepts the record if its product id is new. Returns whether it was kept.
    pub fn offer(&mut self, record: NormalizedRecord) -> bool {
        if self.seen.insert(record.product_id) {
            self.records.push(record);
            true
        } else {
            self.duplicates += 1;
            false
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn into_records(self) -> Vec<NormalizedRecord> {
        self.records
    }
}

#[derive(Clone)]
pub struct CollectorHandle {
    tx: mpsc::Sender<NormalizedRecord>,
}

impl CollectorHandle {
    pub async fn offer(&self, record: NormalizedRecord) -> AppResult<()> {
        self.tx.send(record).await.map_err(|e| {
            AppError::JoinError(format!(
                "collector closed before product {} was delivered",
                e.0.product_id
            ))
        })
    }
}

/// Starts the consumer. Its join handle resolves after the last handle is dropped.
pub fn spawn_collector() -> (CollectorHandle, JoinHandle<Collector>) {
    let (tx, mut rx) = mpsc::channel::<NormalizedRecord>(CHANNEL_CAPACITY);
    let consumer = tokio::spawn(async move {
        let mut collector = Collector::default();
        while let Some(record) = rx.recv().await {
            collector.offer(record);
        }
        collector
    });
    (CollectorHandle { tx }, consumer)
}

//! In-memory metrics sink - a bounded ring of the most recent records.
//!
//! Used as the primary sink when Redis is not configured.
//! Note: Records are lost on process restart.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::RwLock;

use floodgate_core::domain::DecisionRecord;
use floodgate_core::ports::{MetricsError, MetricsSink};

pub struct InMemoryMetricsSink {
    records: RwLock<VecDeque<DecisionRecord>>,
    capacity: usize,
}

impl InMemoryMetricsSink {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: RwLock::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
        }
    }

    /// Copy of the retained records, oldest first.
    pub async fn records(&self) -> Vec<DecisionRecord> {
        self.records.read().await.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

impl Default for InMemoryMetricsSink {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl MetricsSink for InMemoryMetricsSink {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn write(&self, record: &DecisionRecord) -> Result<(), MetricsError> {
        let mut records = self.records.write().await;
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record.clone());
        Ok(())
    }
}

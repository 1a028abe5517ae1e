//! Redis metrics sink: newest-first capped list of JSON records.

use async_trait::async_trait;
use redis::aio::ConnectionManager;

use floodgate_core::domain::DecisionRecord;
use floodgate_core::ports::{MetricsError, MetricsSink};

use crate::redis::RedisConfig;

pub struct RedisMetricsSink {
    conn: ConnectionManager,
    key: String,
    max_len: usize,
}

impl RedisMetricsSink {
    pub async fn new(config: &RedisConfig, max_len: usize) -> Result<Self, MetricsError> {
        let conn = config.connect().await.map_err(MetricsError::Connection)?;
        Ok(Self {
            conn,
            key: config.key(&["metrics", "decisions"]),
            max_len: max_len.max(1),
        })
    }
}

#[async_trait]
impl MetricsSink for RedisMetricsSink {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn write(&self, record: &DecisionRecord) -> Result<(), MetricsError> {
        let payload =
            serde_json::to_string(record).map_err(|e| MetricsError::Serialization(e.to_string()))?;
        let mut conn = self.conn.clone();

        let _: () = redis::pipe()
            .atomic()
            .lpush(&self.key, payload)
            .ignore()
            .ltrim(&self.key, 0, self.max_len as isize - 1)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(|e| MetricsError::Write(e.to_string()))?;

        Ok(())
    }
}

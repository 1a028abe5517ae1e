//! Append-only JSON-lines file sink, the local fallback for metrics.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use floodgate_core::domain::DecisionRecord;
use floodgate_core::ports::{MetricsError, MetricsSink};

pub struct LogFileSink {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl LogFileSink {
    /// The file is opened (and created) on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl MetricsSink for LogFileSink {
    fn name(&self) -> &'static str {
        "log_file"
    }

    async fn write(&self, record: &DecisionRecord) -> Result<(), MetricsError> {
        let mut line =
            serde_json::to_vec(record).map_err(|e| MetricsError::Serialization(e.to_string()))?;
        line.push(b'\n');

        let mut guard = self.file.lock().await;
        if guard.is_none() {
            if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(dir)
                    .await
                    .map_err(|e| MetricsError::Connection(e.to_string()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await
                .map_err(|e| MetricsError::Connection(e.to_string()))?;
            *guard = Some(file);
        }

        let Some(file) = guard.as_mut() else {
            return Err(MetricsError::Connection("log file not open".to_string()));
        };

        // Drop the handle on failure so the next write reopens the file.
        let written = async {
            file.write_all(&line).await?;
            file.flush().await
        }
        .await;
        if let Err(e) = written {
            *guard = None;
            return Err(MetricsError::Write(e.to_string()));
        }

        Ok(())
    }
}

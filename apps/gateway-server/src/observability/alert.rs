//! Operator alerting for error-level events.
//!
//! Only faults land here: shedding is logged at info and never alerts.
//! Alerts are deduplicated per target so an incident that fails every
//! request produces one page per cooldown, not one per request.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{Layer, layer::Context};

/// Alert payload extracted from a tracing event.
#[derive(Debug, Clone)]
pub struct AlertMessage {
    pub level: Level,
    pub message: String,
    pub target: String,
    pub request_id: Option<String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub fields: Vec<(String, String)>,
}

/// Configuration for the alert layer.
#[derive(Debug, Clone)]
pub struct AlertConfig {
    /// Least severe level that triggers an alert.
    pub min_level: Level,
    /// Pending alerts beyond this are dropped.
    pub buffer_size: usize,
    /// Quiet period per target after an alert fires.
    pub cooldown: Duration,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            min_level: Level::ERROR,
            buffer_size: 100,
            cooldown: Duration::from_secs(60),
        }
    }
}

#[async_trait::async_trait]
pub trait AlertSender: Send + Sync {
    async fn send(&self, alert: AlertMessage) -> Result<(), AlertError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("Failed to send alert: {0}")]
    SendError(String),
}

/// Writes alerts to stderr (for development).
pub struct ConsoleAlertSender;

#[async_trait::async_trait]
impl AlertSender for ConsoleAlertSender {
    async fn send(&self, alert: AlertMessage) -> Result<(), AlertError> {
        eprintln!(
            "\n[floodgate alert] {} {}\n  target: {}\n  request: {}\n  message: {}\n",
            alert.timestamp,
            alert.level,
            alert.target,
            alert.request_id.as_deref().unwrap_or("-"),
            alert.message
        );
        Ok(())
    }
}

/// Posts alerts to a chat webhook (Slack, Discord, etc.).
pub struct WebhookAlertSender {
    url: String,
    client: reqwest::Client,
}

impl WebhookAlertSender {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl AlertSender for WebhookAlertSender {
    async fn send(&self, alert: AlertMessage) -> Result<(), AlertError> {
        let details = alert
            .fields
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ");

        let payload = serde_json::json!({
            "text": format!(
                "*Floodgate {}* `{}`\n{}\nrequest: {}\n{}",
                alert.level,
                alert.target,
                alert.message,
                alert.request_id.as_deref().unwrap_or("-"),
                details
            )
        });

        self.client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AlertError::SendError(e.to_string()))?;

        Ok(())
    }
}

/// Per-target cooldown.
struct AlertThrottle {
    cooldown: Duration,
    last_sent: Mutex<HashMap<String, Instant>>,
}

impl AlertThrottle {
    fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_sent: Mutex::new(HashMap::new()),
        }
    }

    fn permit(&self, target: &str, now: Instant) -> bool {
        let mut last_sent = match self.last_sent.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        match last_sent.get(target) {
            Some(at) if now.duration_since(*at) < self.cooldown => false,
            _ => {
                last_sent.insert(target.to_string(), now);
                true
            }
        }
    }
}

/// Tracing layer that forwards error events to an [`AlertSender`].
pub struct AlertLayer {
    sender: mpsc::Sender<AlertMessage>,
    min_level: Level,
    throttle: AlertThrottle,
}

impl AlertLayer {
    /// Must be called inside a tokio runtime; delivery runs on a spawned task.
    pub fn new(alert_sender: Arc<dyn AlertSender>, config: AlertConfig) -> Self {
        let (tx, mut rx) = mpsc::channel::<AlertMessage>(config.buffer_size.max(1));

        tokio::spawn(async move {
            while let Some(alert) = rx.recv().await {
                if let Err(e) = alert_sender.send(alert).await {
                    // Not traced: an error event here would alert about alerting.
                    eprintln!("{}", e);
                }
            }
        });

        Self {
            sender: tx,
            min_level: config.min_level,
            throttle: AlertThrottle::new(config.cooldown),
        }
    }

    pub fn console(config: AlertConfig) -> Self {
        Self::new(Arc::new(ConsoleAlertSender), config)
    }

    pub fn webhook(url: String, config: AlertConfig) -> Self {
        Self::new(Arc::new(WebhookAlertSender::new(url)), config)
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    request_id: Option<String>,
    fields: Vec<(String, String)>,
}

impl FieldVisitor {
    fn put(&mut self, name: &str, value: String) {
        match name {
            "message" => self.message = value,
            "request_id" => self.request_id = Some(value),
            _ => self.fields.push((name.to_string(), value)),
        }
    }
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.put(field.name(), format!("{:?}", value));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.put(field.name(), value.to_string());
    }
}

impl<S> Layer<S> for AlertLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        // Level ordering: ERROR is the "smallest", so anything more verbose is greater.
        if *metadata.level() > self.min_level {
            return;
        }
        if !self.throttle.permit(metadata.target(), Instant::now()) {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let alert = AlertMessage {
            level: *metadata.level(),
            message: visitor.message,
            target: metadata.target().to_string(),
            request_id: visitor.request_id,
            timestamp: chrono::Utc::now(),
            fields: visitor.fields,
        };

        // Full buffer means the sender is stuck; dropping beats blocking a request.
        let _ = self.sender.try_send(alert);
    }
}

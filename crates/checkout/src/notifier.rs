//! Customer notification boundary.
//!
//! Template lookup and `{key}` substitution belong to the implementation;
//! callers only pick the subject, the template name and the variables.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

/// Error returned when a notification could not be delivered.
#[derive(Debug, Error)]
#[error("Notification failed: {0}")]
pub struct NotifierError(pub String);

/// A templated message to one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub to_email: String,
    pub to_name: String,
    pub subject: String,
    pub template: String,
    pub vars: BTreeMap<String, String>,
}

/// Trait for sending templated messages to customers.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: Notification) -> Result<(), NotifierError>;
}

/// Notifier that only writes the message to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn send(&self, notification: Notification) -> Result<(), NotifierError> {
        tracing::info!(
            to = %notification.to_email,
            subject = %notification.subject,
            template = %notification.template,
            vars = ?notification.vars,
            "notification sent"
        );
        Ok(())
    }
}

#[derive(Debug, Default)]
struct InMemoryNotifierState {
    sent: Vec<Notification>,
    fail: bool,
}

/// In-memory notifier for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotifier {
    state: Arc<Mutex<InMemoryNotifierState>>,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the notifier to fail on every send.
    pub async fn set_fail(&self, fail: bool) {
        self.state.lock().await.fail = fail;
    }

    /// Returns every notification sent so far.
    pub async fn sent(&self) -> Vec<Notification> {
        self.state.lock().await.sent.clone()
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn send(&self, notification: Notification) -> Result<(), NotifierError> {
        let mut state = self.state.lock().await;
        if state.fail {
            return Err(NotifierError("Mail transport unavailable".to_string()));
        }
        state.sent.push(notification);
        Ok(())
    }
}

// ============================================================================
// Activity Log - append-only audit trail
// ============================================================================
//
// Writes are best-effort: callers go through `log_best_effort`, which never
// surfaces a failure to the primary operation.
//
// ============================================================================

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::order::SubmissionNumber;

#[derive(Debug, thiserror::Error)]
pub enum ActivityLogError {
    #[error("Activity log write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Activity entry could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityEventType {
    AuthScreen,
    PinAttempt,
    LoginSuccess,
    SuspiciousAccess,
    DraftSaved,
    ValidationFailed,
    OrderSubmitted,
}

impl ActivityEventType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityEventType::AuthScreen => "AUTH_SCREEN",
            ActivityEventType::PinAttempt => "PIN_ATTEMPT",
            ActivityEventType::LoginSuccess => "LOGIN_SUCCESS",
            ActivityEventType::SuspiciousAccess => "SUSPICIOUS_ACCESS",
            ActivityEventType::DraftSaved => "DRAFT_SAVED",
            ActivityEventType::ValidationFailed => "VALIDATION_FAILED",
            ActivityEventType::OrderSubmitted => "ORDER_SUBMITTED",
        }
    }
}

impl fmt::Display for ActivityEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityStatus {
    Success,
    Failure,
    Info,
}

/// Who is on the other end of a request
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClientContext {
    pub client_identity: String,
    pub device_info: String,
    pub session_id: String,
}

impl ClientContext {
    pub fn new(client_identity: impl Into<String>, device_info: impl Into<String>) -> Self {
        Self {
            client_identity: client_identity.into(),
            device_info: device_info.into(),
            session_id: Uuid::new_v4().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub timestamp: DateTime<Utc>,
    pub client_identity: String,
    pub device_info: String,
    pub rep_name: String,
    pub event_type: ActivityEventType,
    pub status: ActivityStatus,
    pub details: String,
    pub session_id: String,
    pub order_number: Option<SubmissionNumber>,
}

impl ActivityEntry {
    pub fn new(context: &ClientContext, event_type: ActivityEventType, status: ActivityStatus) -> Self {
        Self {
            timestamp: Utc::now(),
            client_identity: context.client_identity.clone(),
            device_info: context.device_info.clone(),
            rep_name: String::new(),
            event_type,
            status,
            details: String::new(),
            session_id: context.session_id.clone(),
            order_number: None,
        }
    }

    pub fn rep(mut self, rep_name: impl Into<String>) -> Self {
        self.rep_name = rep_name.into();
        self
    }

    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    pub fn order_number(mut self, number: SubmissionNumber) -> Self {
        self.order_number = Some(number);
        self
    }
}

#[async_trait]
pub trait ActivityLog: Send + Sync {
    async fn append(&self, entry: ActivityEntry) -> Result<(), ActivityLogError>;
}

/// Append and swallow any failure with a warning
pub async fn log_best_effort(log: &dyn ActivityLog, entry: ActivityEntry) {
    let event_type = entry.event_type;
    if let Err(e) = log.append(entry).await {
        tracing::warn!(event_type = %event_type, error = %e, "Activity log write dropped");
    }
}

#[derive(Default)]
pub struct InMemoryActivityLog {
    entries: Mutex<Vec<ActivityEntry>>,
}

impl InMemoryActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> Vec<ActivityEntry> {
        self.entries.lock().await.clone()
    }
}

#[async_trait]
impl ActivityLog for InMemoryActivityLog {
    async fn append(&self, entry: ActivityEntry) -> Result<(), ActivityLogError> {
        self.entries.lock().await.push(entry);
        Ok(())
    }
}

/// One JSON object per line, appended to a file
pub struct JsonLinesActivityLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonLinesActivityLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl ActivityLog for JsonLinesActivityLog {
    async fn append(&self, entry: ActivityEntry) -> Result<(), ActivityLogError> {
        let mut line = serde_json::to_vec(&entry)?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

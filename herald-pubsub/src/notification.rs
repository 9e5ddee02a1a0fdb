//! Notification definitions and handler traits

use crate::error::HandlerError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Delivery class of a notification.
///
/// The class decides whether a notification is buffered by the receiving
/// subscriber and, if so, in which buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// Buffered, drained after all priority notifications
    #[default]
    Standard,
    /// Buffered, drained before standard notifications
    Priority,
    /// Never buffered; dispatched as soon as it is posted
    Urgent,
}

impl NotificationKind {
    /// Whether notifications of this kind bypass the subscriber buffers
    pub fn bypasses_buffer(self) -> bool {
        matches!(self, NotificationKind::Urgent)
    }

    /// Lowercase name of the kind
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Standard => "standard",
            NotificationKind::Priority => "priority",
            NotificationKind::Urgent => "urgent",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationMetadata {
    /// Unique notification ID
    pub id: Uuid,

    /// Timestamp when the notification was created
    pub timestamp: DateTime<Utc>,
}

impl NotificationMetadata {
    /// Create new notification metadata
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
        }
    }
}

impl Default for NotificationMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// A named, payload-carrying message delivered to subscribers.
///
/// The `name` selects the handler on the receiving subscriber, the `body` is
/// passed through untouched and the `kind` decides how the subscriber queues
/// it. Notifications are never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification<T = serde_json::Value> {
    /// Handler name
    pub name: String,

    /// Opaque payload
    pub body: T,

    /// Delivery class
    pub kind: NotificationKind,

    /// Creation metadata
    #[serde(default)]
    pub metadata: NotificationMetadata,
}

impl<T> Notification<T> {
    /// Create a new notification of the given kind
    pub fn new(name: impl Into<String>, body: T, kind: NotificationKind) -> Self {
        Self {
            name: name.into(),
            body,
            kind,
            metadata: NotificationMetadata::new(),
        }
    }

    /// Create a standard notification
    pub fn standard(name: impl Into<String>, body: T) -> Self {
        Self::new(name, body, NotificationKind::Standard)
    }

    /// Create a priority notification
    pub fn priority(name: impl Into<String>, body: T) -> Self {
        Self::new(name, body, NotificationKind::Priority)
    }

    /// Create an urgent notification
    pub fn urgent(name: impl Into<String>, body: T) -> Self {
        Self::new(name, body, NotificationKind::Urgent)
    }

    /// Get notification ID
    pub fn id(&self) -> Uuid {
        self.metadata.id
    }

    /// Get notification timestamp
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.metadata.timestamp
    }
}

/// Handler invoked by a subscriber for notifications of one name.
///
/// Closures of the shape `Fn(&Notification<T>) -> Result<(), HandlerError>`
/// implement this trait directly.
pub trait NotificationHandler<T>: Send + Sync {
    /// Handle the notification
    fn handle(&self, notification: &Notification<T>) -> Result<(), HandlerError>;
}

impl<T, F> NotificationHandler<T> for F
where
    F: Fn(&Notification<T>) -> Result<(), HandlerError> + Send + Sync,
{
    fn handle(&self, notification: &Notification<T>) -> Result<(), HandlerError> {
        self(notification)
    }
}

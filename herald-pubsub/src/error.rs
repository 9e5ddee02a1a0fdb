//! Error types for publish/subscribe operations.

use thiserror::Error;

/// Result type for subscriber operations.
pub type SubscriberResult<T> = Result<T, SubscriberError>;

/// Result type for publisher operations.
pub type PublishResult<T> = Result<T, PublishError>;

/// Error returned by a notification handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    /// Handler failed
    #[error("Handler failed: {0}")]
    HandlerFailed(String),

    /// Handler could not process the notification body
    #[error("Notification processing error: {0}")]
    ProcessingError(String),
}

/// Subscriber-side dispatch errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubscriberError {
    /// A handler returned an error while a notification was dispatched
    #[error("Subscriber '{subscriber}' failed to handle '{notification}': {source}")]
    Handler {
        /// Key of the subscriber whose handler failed
        subscriber: String,
        /// Name of the notification being dispatched
        notification: String,
        /// Error returned by the handler
        #[source]
        source: HandlerError,
    },
}

impl SubscriberError {
    /// Key of the subscriber the error originated from
    pub fn subscriber(&self) -> &str {
        match self {
            SubscriberError::Handler { subscriber, .. } => subscriber,
        }
    }
}

/// Publisher fan-out errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    /// Fan-out stopped at the first failing subscriber
    #[error("Fan-out aborted: {0}")]
    Aborted(#[from] SubscriberError),

    /// One or more subscribers failed while fan-out continued
    #[error("{} subscriber(s) failed", .0.len())]
    Failed(Vec<SubscriberError>),
}

impl PublishError {
    /// All subscriber failures carried by this error
    pub fn failures(&self) -> Vec<&SubscriberError> {
        match self {
            PublishError::Aborted(e) => vec![e],
            PublishError::Failed(errors) => errors.iter().collect(),
        }
    }
}

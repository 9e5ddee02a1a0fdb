//! Publisher implementation

use crate::error::{PublishError, PublishResult, SubscriberError};
use crate::notification::{Notification, NotificationKind};
use crate::subscriber::Subscriber;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Publisher fanning notifications out to registered subscribers
pub struct Publisher<T = serde_json::Value> {
    /// Subscribers keyed by identity
    registry: Arc<DashMap<String, Subscriber<T>>>,

    /// Configuration
    config: Arc<PublisherConfig>,
}

/// Publisher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherConfig {
    /// Keep posting to the remaining subscribers after one fails
    #[serde(default)]
    pub continue_on_error: bool,

    /// Enable publisher logging
    #[serde(default = "default_enable_logging")]
    pub enable_logging: bool,
}

fn default_enable_logging() -> bool {
    true
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            continue_on_error: false,
            enable_logging: default_enable_logging(),
        }
    }
}

impl<T: Send + Sync + 'static> Publisher<T> {
    /// Create new publisher
    pub fn new() -> Self {
        Self::with_config(PublisherConfig::default())
    }

    /// Create publisher with custom config
    pub fn with_config(config: PublisherConfig) -> Self {
        Self {
            registry: Arc::new(DashMap::new()),
            config: Arc::new(config),
        }
    }

    /// Register a subscriber under its key.
    ///
    /// The first subscriber registered for a key is kept; adding another
    /// subscriber with the same key leaves the registry untouched. Returns
    /// whether the subscriber was inserted.
    pub fn add(&self, subscriber: Subscriber<T>) -> bool {
        let key = subscriber.key().to_string();
        let inserted = match self.registry.entry(key.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(subscriber);
                true
            }
        };

        if self.config.enable_logging {
            if inserted {
                debug!("Registered subscriber: {}", key);
            } else {
                debug!("Subscriber already registered, keeping existing entry: {}", key);
            }
        }

        inserted
    }

    /// Remove the subscriber registered under `key`
    pub fn delete(&self, key: &str) -> Option<Subscriber<T>> {
        let removed = self.registry.remove(key).map(|(_, subscriber)| subscriber);

        if removed.is_some() && self.config.enable_logging {
            debug!("Removed subscriber: {}", key);
        }

        removed
    }

    /// Whether a subscriber is registered under `key`
    pub fn has(&self, key: &str) -> bool {
        self.registry.contains_key(key)
    }

    /// Get the subscriber registered under `key`
    pub fn get(&self, key: &str) -> Option<Subscriber<T>> {
        self.registry.get(key).map(|entry| entry.value().clone())
    }

    /// Registered subscriber keys
    pub fn keys(&self) -> Vec<String> {
        self.registry.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Number of registered subscribers
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Whether no subscriber is registered
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Remove all subscribers
    pub fn clear(&self) {
        self.registry.clear();
        if self.config.enable_logging {
            info!("Cleared all subscribers");
        }
    }

    /// Send a standard notification to every subscriber
    ///
    /// # Examples
    ///
    /// ```
    /// use herald_pubsub::{Notification, Publisher, Subscriber};
    ///
    /// let publisher: Publisher<String> = Publisher::new();
    /// let subscriber = Subscriber::new("aKey");
    /// subscriber.on("postMsg", |n: &Notification<String>| {
    ///     assert_eq!(n.body, "a message");
    ///     Ok(())
    /// });
    /// subscriber.start().unwrap();
    ///
    /// publisher.add(subscriber);
    /// publisher.notify("postMsg", "a message".to_string()).unwrap();
    /// ```
    pub fn notify(&self, name: impl Into<String>, body: T) -> PublishResult<()> {
        self.publish(Notification::new(name, body, NotificationKind::Standard))
    }

    /// Send a priority notification to every subscriber
    pub fn notify_priority(&self, name: impl Into<String>, body: T) -> PublishResult<()> {
        self.publish(Notification::new(name, body, NotificationKind::Priority))
    }

    /// Send an urgent notification to every subscriber
    pub fn notify_urgent(&self, name: impl Into<String>, body: T) -> PublishResult<()> {
        self.publish(Notification::new(name, body, NotificationKind::Urgent))
    }

    /// Post a notification to every registered subscriber.
    ///
    /// Subscribers are visited in registry order, which is unspecified. With
    /// `continue_on_error` disabled the first failing subscriber aborts the
    /// fan-out and the remaining subscribers are not posted to.
    pub fn publish(&self, notification: Notification<T>) -> PublishResult<()> {
        let notification = Arc::new(notification);

        if self.config.enable_logging {
            debug!(
                "Publishing {} notification: {} (id: {})",
                notification.kind,
                notification.name,
                notification.id()
            );
        }

        // Snapshot so handlers can add or delete subscribers during fan-out.
        let subscribers: Vec<Subscriber<T>> = self
            .registry
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        let mut errors: Vec<SubscriberError> = Vec::new();

        for subscriber in subscribers {
            if let Err(e) = subscriber.post(Arc::clone(&notification)) {
                if self.config.enable_logging {
                    error!("Notification '{}' failed: {}", notification.name, e);
                }
                if !self.config.continue_on_error {
                    return Err(PublishError::Aborted(e));
                }
                errors.push(e);
            }
        }

        if !errors.is_empty() {
            return Err(PublishError::Failed(errors));
        }

        Ok(())
    }
}

impl<T> Clone for Publisher<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            config: Arc::clone(&self.config),
        }
    }
}

impl<T: Send + Sync + 'static> Default for Publisher<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Publisher builder
pub struct PublisherBuilder {
    config: PublisherConfig,
}

impl PublisherBuilder {
    /// Create new publisher builder
    pub fn new() -> Self {
        Self {
            config: PublisherConfig::default(),
        }
    }

    /// Enable/disable continue on error
    pub fn continue_on_error(mut self, enabled: bool) -> Self {
        self.config.continue_on_error = enabled;
        self
    }

    /// Enable/disable logging
    pub fn enable_logging(mut self, enabled: bool) -> Self {
        self.config.enable_logging = enabled;
        self
    }

    /// Build the publisher
    pub fn build<T: Send + Sync + 'static>(self) -> Publisher<T> {
        Publisher::with_config(self.config)
    }
}

impl Default for PublisherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

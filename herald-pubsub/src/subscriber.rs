//! Buffered subscriber with a pause/resume delivery gate

use crate::error::{SubscriberError, SubscriberResult};
use crate::notification::{Notification, NotificationHandler, NotificationKind};
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, trace};

/// Subscriber configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriberConfig {
    /// Identity key; a timestamp-derived key is generated when absent
    #[serde(default)]
    pub key: Option<String>,

    /// Enable subscriber logging
    #[serde(default = "default_enable_logging")]
    pub enable_logging: bool,
}

fn default_enable_logging() -> bool {
    true
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            key: None,
            enable_logging: default_enable_logging(),
        }
    }
}

impl SubscriberConfig {
    /// Create a configuration with the given key
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Default::default()
        }
    }

    /// Enable/disable logging
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.enable_logging = enabled;
        self
    }
}

/// Receives notifications, buffers them and replays them to named handlers.
///
/// Urgent notifications are dispatched as soon as they are posted. Standard
/// and priority notifications are queued and only delivered while the
/// subscriber is started; every drain delivers the whole priority buffer
/// before the standard buffer, oldest first within each buffer.
///
/// `Subscriber` is a handle: clones share the same buffers, handlers and
/// gate. No lock is held while a handler runs, so handlers may post to,
/// pause or start the subscriber that invoked them.
///
/// # Examples
///
/// ```
/// use herald_pubsub::{Notification, Subscriber};
///
/// let subscriber: Subscriber<String> = Subscriber::new("audit");
/// subscriber.on("saved", |n: &Notification<String>| {
///     println!("saved {}", n.body);
///     Ok(())
/// });
///
/// subscriber.post(Notification::standard("saved", "doc-1".to_string())).unwrap();
/// assert_eq!(subscriber.pending(), 1);
///
/// subscriber.start().unwrap();
/// assert_eq!(subscriber.pending(), 0);
/// ```
pub struct Subscriber<T = serde_json::Value> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    key: String,
    config: SubscriberConfig,
    handlers: DashMap<String, Arc<dyn NotificationHandler<T>>>,
    state: Mutex<DeliveryState<T>>,
}

struct DeliveryState<T> {
    standard: VecDeque<Arc<Notification<T>>>,
    priority: VecDeque<Arc<Notification<T>>>,
    started: bool,
    draining: bool,
    drain_requested: bool,
}

impl<T> Default for DeliveryState<T> {
    fn default() -> Self {
        Self {
            standard: VecDeque::new(),
            priority: VecDeque::new(),
            started: false,
            draining: false,
            drain_requested: false,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum DrainPhase {
    Priority,
    Standard,
}

/// Releases drain ownership when a drain exits through a handler error or a
/// handler panic.
///
/// A drain requested by another caller while the failing handler ran is
/// dropped with it; the buffered notifications stay queued for the next
/// `post` or `start`.
struct DrainGuard<'a, T> {
    state: &'a Mutex<DeliveryState<T>>,
    active: bool,
}

impl<T> Drop for DrainGuard<'_, T> {
    fn drop(&mut self) {
        if self.active {
            let mut state = self.state.lock();
            state.draining = false;
            state.drain_requested = false;
        }
    }
}

fn timestamp_key() -> String {
    Utc::now().timestamp_millis().to_string()
}

impl<T: Send + Sync + 'static> Subscriber<T> {
    /// Create a subscriber with the given identity key
    pub fn new(key: impl Into<String>) -> Self {
        Self::with_config(SubscriberConfig::new(key))
    }

    /// Create a subscriber with custom config
    pub fn with_config(config: SubscriberConfig) -> Self {
        let key = config.key.clone().unwrap_or_else(timestamp_key);
        Self {
            inner: Arc::new(Inner {
                key,
                config,
                handlers: DashMap::new(),
                state: Mutex::new(DeliveryState::default()),
            }),
        }
    }

    /// Identity key
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// Register the handler for `name`, replacing any previous one
    pub fn on<H>(&self, name: impl Into<String>, handler: H)
    where
        H: NotificationHandler<T> + 'static,
    {
        let name = name.into();
        let replaced = self
            .inner
            .handlers
            .insert(name.clone(), Arc::new(handler))
            .is_some();

        if self.inner.config.enable_logging {
            debug!(
                "Subscriber '{}' registered handler for '{}' (replaced: {})",
                self.inner.key, name, replaced
            );
        }
    }

    /// Remove the handler for `name`
    pub fn off(&self, name: &str) {
        let removed = self.inner.handlers.remove(name).is_some();

        if removed && self.inner.config.enable_logging {
            debug!("Subscriber '{}' removed handler for '{}'", self.inner.key, name);
        }
    }

    /// Whether a handler is registered for `name`
    pub fn has_handler(&self, name: &str) -> bool {
        self.inner.handlers.contains_key(name)
    }

    /// Number of registered handlers
    pub fn handler_count(&self) -> usize {
        self.inner.handlers.len()
    }

    /// Remove all handlers
    pub fn clear_handlers(&self) {
        self.inner.handlers.clear();
        if self.inner.config.enable_logging {
            debug!("Subscriber '{}' cleared all handlers", self.inner.key);
        }
    }

    /// Open the delivery gate and drain the buffers
    pub fn start(&self) -> SubscriberResult<()> {
        self.inner.state.lock().started = true;
        if self.inner.config.enable_logging {
            debug!("Subscriber '{}' started", self.inner.key);
        }
        self.drain()
    }

    /// Close the delivery gate.
    ///
    /// Buffered notifications stay queued until the next [`start`](Self::start).
    /// Urgent notifications are still dispatched.
    pub fn pause(&self) {
        self.inner.state.lock().started = false;
        if self.inner.config.enable_logging {
            debug!("Subscriber '{}' paused", self.inner.key);
        }
    }

    /// Whether the delivery gate is open
    pub fn is_started(&self) -> bool {
        self.inner.state.lock().started
    }

    /// Number of buffered notifications
    pub fn pending(&self) -> usize {
        let state = self.inner.state.lock();
        state.standard.len() + state.priority.len()
    }

    /// Number of buffered standard notifications
    pub fn pending_standard(&self) -> usize {
        self.inner.state.lock().standard.len()
    }

    /// Number of buffered priority notifications
    pub fn pending_priority(&self) -> usize {
        self.inner.state.lock().priority.len()
    }

    /// Deliver a notification to this subscriber.
    ///
    /// Urgent notifications are dispatched before this returns, whatever the
    /// gate state. Standard and priority notifications are appended to their
    /// buffer. Either way a drain is attempted afterwards, which does nothing
    /// while the subscriber is paused.
    ///
    /// A handler error is returned as-is. The notification that failed is
    /// not re-queued; notifications still buffered stay queued until the next
    /// `post` or `start`, including any whose drain was requested by another
    /// thread while the failing handler ran.
    pub fn post(&self, notification: impl Into<Arc<Notification<T>>>) -> SubscriberResult<()> {
        let notification = notification.into();

        match notification.kind {
            NotificationKind::Urgent => self.dispatch(&notification)?,
            NotificationKind::Priority => {
                self.inner.state.lock().priority.push_back(notification);
            }
            NotificationKind::Standard => {
                self.inner.state.lock().standard.push_back(notification);
            }
        }

        self.drain()
    }

    /// Whether both handles refer to the same subscriber
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn drain(&self) -> SubscriberResult<()> {
        {
            let mut state = self.inner.state.lock();
            if !state.started {
                return Ok(());
            }
            if state.draining {
                // The active drainer runs another pass before it returns.
                state.drain_requested = true;
                return Ok(());
            }
            state.draining = true;
        }

        let mut guard = DrainGuard {
            state: &self.inner.state,
            active: true,
        };

        loop {
            let mut phase = DrainPhase::Priority;
            loop {
                let next = {
                    let mut state = self.inner.state.lock();
                    if !state.started {
                        // Hand ownership back in the same critical section so a
                        // concurrent start() either sees the drain gone or is
                        // observed by this check.
                        state.draining = false;
                        state.drain_requested = false;
                        guard.active = false;
                        return Ok(());
                    }
                    match phase {
                        DrainPhase::Priority => state.priority.pop_front(),
                        DrainPhase::Standard => state.standard.pop_front(),
                    }
                };

                match next {
                    Some(notification) => self.dispatch(&notification)?,
                    None if phase == DrainPhase::Priority => phase = DrainPhase::Standard,
                    None => break,
                }
            }

            let mut state = self.inner.state.lock();
            if state.drain_requested && state.started {
                state.drain_requested = false;
                continue;
            }
            state.draining = false;
            state.drain_requested = false;
            guard.active = false;
            break;
        }

        Ok(())
    }

    fn dispatch(&self, notification: &Notification<T>) -> SubscriberResult<()> {
        // Clone the handler out so the map is not locked while it runs.
        let handler = self
            .inner
            .handlers
            .get(&notification.name)
            .map(|entry| Arc::clone(entry.value()));

        let Some(handler) = handler else {
            if self.inner.config.enable_logging {
                trace!(
                    "Subscriber '{}' has no handler for '{}'",
                    self.inner.key, notification.name
                );
            }
            return Ok(());
        };

        if self.inner.config.enable_logging {
            trace!(
                "Subscriber '{}' dispatching {} notification '{}' (id: {})",
                self.inner.key,
                notification.kind,
                notification.name,
                notification.id()
            );
        }

        handler.handle(notification).map_err(|source| {
            if self.inner.config.enable_logging {
                error!(
                    "Subscriber '{}' handler for '{}' failed: {}",
                    self.inner.key, notification.name, source
                );
            }
            SubscriberError::Handler {
                subscriber: self.inner.key.clone(),
                notification: notification.name.clone(),
                source,
            }
        })
    }
}

impl<T: Send + Sync + 'static> Default for Subscriber<T> {
    fn default() -> Self {
        Self::with_config(SubscriberConfig::default())
    }
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Subscriber<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Subscriber")
            .field("key", &self.inner.key)
            .field("started", &state.started)
            .field("pending_priority", &state.priority.len())
            .field("pending_standard", &state.standard.len())
            .field("handlers", &self.inner.handlers.len())
            .finish()
    }
}

//! Buffered publish/subscribe for Herald
//!
//! This crate provides in-process notification publishing with per-subscriber
//! buffering and an explicit delivery gate.
//!
//! ## Features
//!
//! - **Publisher** - Key-addressed subscriber registry with fan-out
//! - **Subscriber** - Named handlers, priority and standard buffers
//! - **Delivery gate** - `start`/`pause` control when buffered notifications drain
//! - **Urgent delivery** - Urgent notifications bypass buffers and the gate
//! - **Synchronous** - Every dispatch completes before `post` returns
//!
//! ## Quick Start
//!
//! ```rust
//! use herald_pubsub::*;
//!
//! let publisher: Publisher<String> = Publisher::new();
//!
//! let subscriber = Subscriber::new("mailer");
//! subscriber.on("user_created", |n: &Notification<String>| {
//!     println!("Sending welcome email to {}", n.body);
//!     Ok(())
//! });
//! publisher.add(subscriber.clone());
//!
//! // Buffered until the subscriber is started
//! publisher.notify("user_created", "alice@example.com".to_string()).unwrap();
//! assert_eq!(subscriber.pending(), 1);
//!
//! subscriber.start().unwrap();
//! assert_eq!(subscriber.pending(), 0);
//! ```
//!
//! ## Delivery Order
//!
//! ```rust
//! use herald_pubsub::*;
//! use std::sync::{Arc, Mutex};
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let subscriber: Subscriber<&'static str> = Subscriber::new("ordered");
//! let log = seen.clone();
//! subscriber.on("job", move |n: &Notification<&'static str>| {
//!     log.lock().unwrap().push(n.body);
//!     Ok(())
//! });
//!
//! subscriber.post(Notification::standard("job", "low")).unwrap();
//! subscriber.post(Notification::priority("job", "high")).unwrap();
//! subscriber.post(Notification::urgent("job", "now")).unwrap();
//!
//! subscriber.start().unwrap();
//! assert_eq!(*seen.lock().unwrap(), vec!["now", "high", "low"]);
//! ```
//!
//! ## Error Handling
//!
//! ```rust
//! use herald_pubsub::*;
//!
//! let publisher: Publisher<String> = PublisherBuilder::new()
//!     .continue_on_error(true)  // Post to every subscriber, collect failures
//!     .build();
//!
//! let subscriber = Subscriber::new("strict");
//! subscriber.on("order", |_: &Notification<String>| -> Result<(), HandlerError> {
//!     Err(HandlerError::ProcessingError("missing sku".to_string()))
//! });
//! publisher.add(subscriber);
//!
//! match publisher.notify_urgent("order", "{}".to_string()) {
//!     Ok(()) => println!("All subscribers succeeded"),
//!     Err(PublishError::Failed(errors)) => {
//!         eprintln!("Some subscribers failed: {:?}", errors);
//!     }
//!     Err(e) => eprintln!("Publish error: {}", e),
//! }
//! ```

pub mod error;
pub mod notification;
pub mod publisher;
pub mod subscriber;

pub use error::{
    HandlerError, PublishError, PublishResult, SubscriberError, SubscriberResult,
};
pub use notification::{Notification, NotificationHandler, NotificationKind, NotificationMetadata};
pub use publisher::{Publisher, PublisherBuilder, PublisherConfig};
pub use subscriber::{Subscriber, SubscriberConfig};

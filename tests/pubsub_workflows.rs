//! Integration tests for common Herald publish/subscribe workflows.
//!
//! These tests verify the delivery guarantees callers rely on.

use herald::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

type Received = Arc<parking_lot::Mutex<Vec<String>>>;

/// Subscriber that records `name:body` for every handled notification.
fn recording(key: &str, names: &[&str]) -> (Subscriber<String>, Received) {
    let subscriber = Subscriber::new(key);
    let received: Received = Arc::new(parking_lot::Mutex::new(Vec::new()));
    for name in names {
        let received = received.clone();
        subscriber.on(*name, move |n: &Notification<String>| {
            received.lock().push(format!("{}:{}", n.name, n.body));
            Ok(())
        });
    }
    (subscriber, received)
}

// =============================================================================
// Registry Tests
// =============================================================================

#[test]
fn test_add_registers_subscriber() {
    let publisher: Publisher<String> = Publisher::new();
    let (receiver, _) = recording("aKey", &["postMsg"]);

    publisher.add(receiver.clone());

    assert!(publisher.has("aKey"));
    assert!(publisher.get("aKey").unwrap().ptr_eq(&receiver));
}

#[test]
fn test_delete_removes_subscriber() {
    let publisher: Publisher<String> = Publisher::new();
    let (receiver, _) = recording("aKey", &["postMsg"]);

    publisher.add(receiver);
    publisher.delete("aKey");

    assert!(!publisher.has("aKey"));
    assert!(publisher.get("aKey").is_none());
}

#[test]
fn test_duplicate_key_keeps_original() {
    let publisher: Publisher<String> = Publisher::new();
    let (original, _) = recording("aKey", &[]);
    let (impostor, _) = recording("aKey", &[]);

    publisher.add(original.clone());
    publisher.add(impostor);

    assert_eq!(publisher.len(), 1);
    assert!(publisher.get("aKey").unwrap().ptr_eq(&original));
}

// =============================================================================
// Delivery Tests
// =============================================================================

#[test]
fn test_notify_delivers_standard_notification() {
    let publisher: Publisher<String> = Publisher::new();
    let (receiver, received) = recording("aKey", &["postMsg"]);

    receiver.start().unwrap();
    publisher.add(receiver);
    publisher.notify("postMsg", "a message".to_string()).unwrap();

    assert_eq!(*received.lock(), vec!["postMsg:a message"]);
}

#[test]
fn test_notify_urgent_without_start() {
    let publisher: Publisher<String> = Publisher::new();
    let (receiver, received) = recording("aKey", &["urgent"]);

    publisher.add(receiver.clone());
    publisher
        .notify_urgent("urgent", "urgent message".to_string())
        .unwrap();

    assert!(!receiver.is_started());
    assert_eq!(*received.lock(), vec!["urgent:urgent message"]);
}

#[test]
fn test_paused_subscriber_buffers_until_start() {
    let publisher: Publisher<String> = Publisher::new();
    let (receiver, received) = recording("aKey", &["a", "b"]);
    publisher.add(receiver.clone());

    publisher.notify("a", "1".to_string()).unwrap();
    publisher.notify_priority("b", "2".to_string()).unwrap();
    assert!(received.lock().is_empty());

    receiver.start().unwrap();
    assert_eq!(*received.lock(), vec!["b:2", "a:1"]);

    // each buffered notification is delivered exactly once
    receiver.start().unwrap();
    assert_eq!(received.lock().len(), 2);
}

#[test]
fn test_fifo_within_each_buffer() {
    let publisher: Publisher<String> = Publisher::new();
    let (receiver, received) = recording("aKey", &["e"]);
    publisher.add(receiver.clone());

    for body in ["E1", "E2", "E3"] {
        publisher.notify("e", body.to_string()).unwrap();
    }
    for body in ["P1", "P2"] {
        publisher.notify_priority("e", body.to_string()).unwrap();
    }
    receiver.start().unwrap();

    assert_eq!(
        *received.lock(),
        vec!["e:P1", "e:P2", "e:E1", "e:E2", "e:E3"]
    );
}

#[test]
fn test_pause_halts_delivery() {
    let publisher: Publisher<String> = Publisher::new();
    let (receiver, received) = recording("aKey", &["e"]);
    publisher.add(receiver.clone());
    receiver.start().unwrap();

    publisher.notify("e", "1".to_string()).unwrap();
    publisher.notify("e", "2".to_string()).unwrap();
    receiver.pause();
    publisher.notify("e", "3".to_string()).unwrap();

    assert_eq!(*received.lock(), vec!["e:1", "e:2"]);
    assert_eq!(receiver.pending_standard(), 1);
}

#[test]
fn test_unhandled_notification_is_noop() {
    let publisher: Publisher<String> = Publisher::new();
    let (receiver, received) = recording("aKey", &["postMsg"]);
    receiver.start().unwrap();
    publisher.add(receiver.clone());

    publisher.notify("nobody-listens", "x".to_string()).unwrap();
    publisher.notify_urgent("nobody-listens", "y".to_string()).unwrap();

    assert!(received.lock().is_empty());
    assert_eq!(receiver.pending(), 0);
}

#[test]
fn test_subscribers_gate_independently() {
    let publisher: Publisher<String> = Publisher::new();
    let (live, live_received) = recording("live", &["e"]);
    let (paused, paused_received) = recording("paused", &["e"]);
    live.start().unwrap();
    publisher.add(live);
    publisher.add(paused.clone());

    publisher.notify("e", "hello".to_string()).unwrap();

    assert_eq!(live_received.lock().len(), 1);
    assert!(paused_received.lock().is_empty());
    assert_eq!(paused.pending(), 1);
}

#[test]
fn test_json_bodies_by_default() {
    let publisher: Publisher = Publisher::new();
    let subscriber: Subscriber = Subscriber::new("json");
    let total = Arc::new(AtomicU32::new(0));

    let sum = total.clone();
    subscriber.on("order", move |n: &Notification| -> Result<(), HandlerError> {
        let qty = n.body["qty"]
            .as_u64()
            .ok_or_else(|| HandlerError::ProcessingError("qty missing".to_string()))?;
        sum.fetch_add(qty as u32, Ordering::SeqCst);
        Ok(())
    });
    publisher.add(subscriber);

    publisher
        .notify_urgent("order", serde_json::json!({"qty": 3}))
        .unwrap();
    let err = publisher
        .notify_urgent("order", serde_json::json!({"sku": "x"}))
        .unwrap_err();

    assert_eq!(total.load(Ordering::SeqCst), 3);
    assert_eq!(err.failures()[0].subscriber(), "json");
}

// =============================================================================
// Multi-threaded Tests
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_publishers_deliver_everything() {
    let publisher: Publisher<u32> = Publisher::new();
    let subscriber: Subscriber<u32> = Subscriber::new("counter");
    let delivered = Arc::new(AtomicU32::new(0));

    let count = delivered.clone();
    subscriber.on("tick", move |_: &Notification<u32>| {
        count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    publisher.add(subscriber.clone());

    let mut tasks = Vec::new();
    for worker in 0..8u32 {
        let publisher = publisher.clone();
        tasks.push(tokio::task::spawn_blocking(move || {
            for i in 0..100u32 {
                if i % 2 == 0 {
                    publisher.notify("tick", worker * 100 + i).unwrap();
                } else {
                    publisher.notify_priority("tick", worker * 100 + i).unwrap();
                }
            }
        }));
    }

    let starter = subscriber.clone();
    let start = tokio::task::spawn_blocking(move || starter.start().unwrap());

    for task in tasks {
        task.await.unwrap();
    }
    start.await.unwrap();

    // every post either drained inline or was picked up by the active drainer
    assert!(subscriber.is_started());
    assert_eq!(subscriber.pending(), 0);
    assert_eq!(delivered.load(Ordering::SeqCst), 800);
}

use serde::{Deserialize, Serialize};
use std::time::Duration;
use trident_events::{Bus, InMemoryBus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Ping {
    id: u32,
}

#[tokio::test]
async fn publish_and_receive_round_trips_payload() {
    let bus = InMemoryBus::<Ping>::new();
    bus.publish(Ping { id: 1 }).await.unwrap();

    let delivery = bus.receive().await.unwrap();
    assert_eq!(delivery.payload(), &Ping { id: 1 });
    delivery.ack().await;
}

#[tokio::test]
async fn transient_failure_is_recovered_via_nack() {
    let bus = InMemoryBus::<Ping>::new();
    bus.publish(Ping { id: 7 }).await.unwrap();

    let attempt_one = bus.receive().await.unwrap();
    assert_eq!(attempt_one.payload().id, 7);
    attempt_one.nack().await;

    let attempt_two = bus.receive().await.unwrap();
    assert_eq!(attempt_two.payload().id, 7);
    attempt_two.ack().await;
}

#[tokio::test]
async fn a_panicking_handler_does_not_lose_the_message() {
    let bus = InMemoryBus::<Ping>::new();
    bus.publish(Ping { id: 99 }).await.unwrap();

    let handle = tokio::spawn({
        let bus = bus.clone();
        async move {
            let delivery = bus.receive().await.unwrap();
            assert_eq!(delivery.payload().id, 99);
            panic!("simulated handler crash before ack");
        }
    });
    assert!(handle.await.is_err());

    let redelivered = tokio::time::timeout(Duration::from_millis(200), bus.receive())
        .await
        .expect("message must be redelivered after the handler task died")
        .unwrap();
    assert_eq!(redelivered.payload().id, 99);
    redelivered.ack().await;
}

#[tokio::test]
async fn ordering_is_fifo_for_a_single_producer() {
    let bus = InMemoryBus::<Ping>::new();
    for id in 0..5 {
        bus.publish(Ping { id }).await.unwrap();
    }

    for expected in 0..5 {
        let delivery = bus.receive().await.unwrap();
        assert_eq!(delivery.payload().id, expected);
        delivery.ack().await;
    }
}

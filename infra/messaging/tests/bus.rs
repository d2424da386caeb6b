use gpilot_messaging::*;

#[derive(Clone, Debug, PartialEq, Eq)]
struct TabActivated(u32);

#[tokio::test]
async fn test_event_flow() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe::<TabActivated>().unwrap();

    assert_eq!(bus.publish(TabActivated(3)).unwrap(), 1);
    assert_eq!(EventReceiverExt::recv(&mut rx).await.as_deref(), Some(&TabActivated(3)));
}

#[tokio::test]
async fn test_publish_without_subscribers_is_not_an_error() {
    let bus = EventBus::new();
    assert_eq!(bus.publish(TabActivated(1)).unwrap(), 0);
}

#[tokio::test]
async fn test_lagged_receiver_recovers() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe_with_capacity::<TabActivated>(2).unwrap();

    for i in 0..50 {
        bus.publish(TabActivated(i)).unwrap();
    }

    let first = EventReceiverExt::recv(&mut rx).await.unwrap();
    assert!(first.0 >= 48, "expected the retained tail, got {}", first.0);
    let second = EventReceiverExt::recv(&mut rx).await.unwrap();
    assert_eq!(second.0, first.0 + 1);
}

#[tokio::test]
async fn test_zero_capacity_is_rejected() {
    let bus = EventBus::new();
    let err = bus.subscribe_with_capacity::<TabActivated>(0).unwrap_err();
    assert_eq!(err.code(), "invalid_capacity");
}

#[tokio::test]
async fn test_channel_keeps_its_first_capacity() {
    let bus = EventBus::new();
    let mut small = bus.subscribe_with_capacity::<TabActivated>(2).unwrap();
    let mut late = bus.subscribe_with_capacity::<TabActivated>(128).unwrap();

    for i in 0..10 {
        bus.publish(TabActivated(i)).unwrap();
    }

    assert!(EventReceiverExt::recv(&mut small).await.unwrap().0 >= 8);
    assert!(EventReceiverExt::recv(&mut late).await.unwrap().0 >= 8);
}

#[tokio::test]
async fn test_shutdown_closes_receivers() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe::<TabActivated>().unwrap();

    assert_eq!(bus.shutdown(), 1);
    assert!(EventReceiverExt::recv(&mut rx).await.is_none());
}

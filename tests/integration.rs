//! End-to-end flows over the in-memory reference store.

mod common;

use common::wait_until;
use likewise::{
    DropReason, EngineConfig, FeedEvent, FeedFilter, ItemId, LikeEngine, LikeProjection,
    LikeStore, MemoryStore, SubscriptionConfig, ViewerId,
};
use std::sync::Arc;
use std::time::Duration;

fn quiet_engine(store: Arc<MemoryStore>) -> LikeEngine {
    LikeEngine::with_config(
        store,
        ViewerId::new("viewer-1"),
        EngineConfig {
            prefetch_like_state: false,
            ..Default::default()
        },
    )
}

#[test]
fn test_like_unlike_roundtrip() {
    let store = Arc::new(MemoryStore::new());
    let item = ItemId::new("thread-1");
    store.seed_item(item.clone(), 10);

    let engine = quiet_engine(Arc::clone(&store));
    engine.track(item.clone(), 10);

    engine.on_user_toggle(&item).unwrap();
    wait_until(|| engine.like_state(&item).unwrap().pending_toggles == 0);
    assert_eq!(
        engine.projection(&item),
        Some(LikeProjection { liked: true, count: 11 })
    );
    assert_eq!(store.count(&item), Some(11));

    engine.on_user_toggle(&item).unwrap();
    wait_until(|| engine.like_state(&item).unwrap().pending_toggles == 0);
    assert_eq!(
        engine.projection(&item),
        Some(LikeProjection { liked: false, count: 10 })
    );
    assert_eq!(store.count(&item), Some(10));
}

#[test]
fn test_prefetch_discovers_existing_like() {
    let store = Arc::new(MemoryStore::new());
    let item = ItemId::new("thread-1");
    let viewer = ViewerId::new("viewer-1");
    store.seed_item(item.clone(), 7);
    // The viewer liked this item in an earlier session.
    store.toggle_like(&item, &viewer).unwrap();

    let engine = LikeEngine::new(store.clone(), viewer);
    engine.track(item.clone(), 8);

    wait_until(|| {
        engine.projection(&item) == Some(LikeProjection { liked: true, count: 8 })
    });
    assert_eq!(engine.like_state(&item).unwrap().server_liked, Some(true));
}

#[test]
fn test_unauthenticated_read_degrades_to_not_liked() {
    let store = Arc::new(MemoryStore::new());
    let item = ItemId::new("thread-1");
    store.seed_item(item.clone(), 5);
    store.set_authenticated(false);

    let engine = LikeEngine::new(store.clone(), ViewerId::new("viewer-1"));
    engine.track(item.clone(), 5);

    // Rendering is not blocked and the unknown settles as not-liked.
    assert_eq!(
        engine.projection(&item),
        Some(LikeProjection { liked: false, count: 5 })
    );
    wait_until(|| engine.like_state(&item).unwrap().server_liked == Some(false));
    assert_eq!(
        engine.projection(&item),
        Some(LikeProjection { liked: false, count: 5 })
    );
}

#[test]
fn test_deleted_item_goes_stale_and_rolls_back() {
    let store = Arc::new(MemoryStore::new());
    let item = ItemId::new("thread-1");
    store.seed_item(item.clone(), 5);

    let engine = quiet_engine(Arc::clone(&store));
    let feed = engine.subscribe(SubscriptionConfig {
        filter: FeedFilter::all(),
        ..Default::default()
    });
    engine.track(item.clone(), 5);
    engine.on_server_state(&item, false, 5).unwrap();

    // Deleted between read and toggle.
    store.remove_item(&item);
    engine.on_user_toggle(&item).unwrap();

    wait_until(|| engine.like_state(&item).unwrap().stale);
    wait_until(|| engine.like_state(&item).unwrap().pending_toggles == 0);
    assert_eq!(
        engine.projection(&item),
        Some(LikeProjection { liked: false, count: 5 })
    );

    let mut saw_stale = false;
    while let Ok(event) = feed.recv_timeout(Duration::from_millis(200)) {
        if event == (FeedEvent::ItemStale { item: item.clone() }) {
            saw_stale = true;
            break;
        }
    }
    assert!(saw_stale);
}

#[test]
fn test_retire_discards_state() {
    let store = Arc::new(MemoryStore::new());
    let item = ItemId::new("thread-1");
    store.seed_item(item.clone(), 5);

    let engine = quiet_engine(store);
    let feed = engine.subscribe(SubscriptionConfig {
        filter: FeedFilter::all(),
        ..Default::default()
    });
    engine.track(item.clone(), 5);
    // Drain the tracking projection.
    feed.recv_timeout(Duration::from_millis(100)).unwrap();

    engine.retire(&item);
    assert!(engine.projection(&item).is_none());
    assert!(engine.on_user_toggle(&item).is_err());
    assert_eq!(
        feed.recv_timeout(Duration::from_millis(100)).unwrap(),
        FeedEvent::ItemRetired { item: item.clone() }
    );

    // Retiring again is a no-op.
    engine.retire(&item);
    assert!(feed.recv_timeout(Duration::from_millis(100)).is_err());
}

#[test]
fn test_eviction_caps_tracked_items() {
    let store = Arc::new(MemoryStore::new());
    let a = ItemId::new("a");
    let b = ItemId::new("b");
    let c = ItemId::new("c");
    for item in [&a, &b, &c] {
        store.seed_item(item.clone(), 1);
    }

    let engine = LikeEngine::with_config(
        store,
        ViewerId::new("viewer-1"),
        EngineConfig {
            max_tracked_items: 2,
            prefetch_like_state: false,
            ..Default::default()
        },
    );
    let feed = engine.subscribe(SubscriptionConfig {
        filter: FeedFilter::all(),
        ..Default::default()
    });

    engine.track(a.clone(), 1);
    engine.track(b.clone(), 1);
    engine.track(c.clone(), 1);

    assert_eq!(engine.stats().tracked_items, 2);
    assert!(engine.projection(&a).is_none());
    assert!(engine.projection(&c).is_some());

    let mut saw_eviction = false;
    while let Ok(event) = feed.recv_timeout(Duration::from_millis(200)) {
        if event == (FeedEvent::ItemRetired { item: a.clone() }) {
            saw_eviction = true;
            break;
        }
    }
    assert!(saw_eviction);
}

#[test]
fn test_subscribe_delivers_current_projections_first() {
    let store = Arc::new(MemoryStore::new());
    let a = ItemId::new("a");
    let b = ItemId::new("b");
    store.seed_item(a.clone(), 1);
    store.seed_item(b.clone(), 2);

    let engine = quiet_engine(store);
    engine.track(a.clone(), 1);
    engine.track(b.clone(), 2);

    let feed = engine.subscribe(SubscriptionConfig {
        filter: FeedFilter::projections(),
        ..Default::default()
    });

    let mut caught_up = Vec::new();
    for _ in 0..2 {
        caught_up.push(feed.recv_timeout(Duration::from_millis(100)).unwrap());
    }
    assert!(caught_up.contains(&FeedEvent::Projection {
        item: a.clone(),
        liked: false,
        count: 1
    }));
    assert!(caught_up.contains(&FeedEvent::Projection {
        item: b.clone(),
        liked: false,
        count: 2
    }));
}

#[test]
fn test_item_filter_scopes_events() {
    let store = Arc::new(MemoryStore::new());
    let a = ItemId::new("a");
    let b = ItemId::new("b");
    store.seed_item(a.clone(), 1);
    store.seed_item(b.clone(), 2);

    let engine = quiet_engine(store);
    engine.track(a.clone(), 1);
    engine.track(b.clone(), 2);

    let feed = engine.subscribe(SubscriptionConfig {
        filter: FeedFilter::items(vec![b.clone()]),
        ..Default::default()
    });
    // Catch-up is filtered too.
    assert_eq!(
        feed.recv_timeout(Duration::from_millis(100)).unwrap(),
        FeedEvent::Projection {
            item: b.clone(),
            liked: false,
            count: 2
        }
    );

    engine.on_user_toggle(&a).unwrap();
    engine.on_user_toggle(&b).unwrap();

    let event = feed.recv_timeout(Duration::from_millis(200)).unwrap();
    assert_eq!(
        event,
        FeedEvent::Projection {
            item: b.clone(),
            liked: true,
            count: 3
        }
    );
}

#[test]
fn test_slow_subscriber_is_dropped() {
    let store = Arc::new(MemoryStore::new());
    let item = ItemId::new("thread-1");
    store.seed_item(item.clone(), 5);

    let engine = quiet_engine(store);
    let feed = engine.subscribe(SubscriptionConfig {
        buffer_size: 1,
        filter: FeedFilter::projections(),
    });

    engine.track(item.clone(), 5); // fills the buffer
    engine.on_user_toggle(&item).unwrap(); // overflows it

    assert_eq!(engine.stats().subscriptions, 0);
    drop(feed);
}

#[test]
fn test_unsubscribe_notifies() {
    let store = Arc::new(MemoryStore::new());
    let engine = quiet_engine(store);

    let feed = engine.subscribe(SubscriptionConfig::default());
    assert_eq!(engine.stats().subscriptions, 1);

    engine.unsubscribe(feed.id);
    assert_eq!(engine.stats().subscriptions, 0);
    assert_eq!(
        feed.recv_timeout(Duration::from_millis(100)).unwrap(),
        FeedEvent::Dropped {
            reason: DropReason::Unsubscribed
        }
    );
}

#[test]
fn test_event_wire_shape() {
    let event = FeedEvent::Projection {
        item: ItemId::new("a"),
        liked: true,
        count: 2,
    };
    assert_eq!(
        serde_json::to_value(&event).unwrap(),
        serde_json::json!({"type": "projection", "item": "a", "liked": true, "count": 2})
    );

    let event = FeedEvent::Dropped {
        reason: DropReason::BufferOverflow,
    };
    assert_eq!(
        serde_json::to_value(&event).unwrap(),
        serde_json::json!({"type": "dropped", "reason": "buffer_overflow"})
    );
}

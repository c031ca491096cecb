//! Redis hall cache against a real Redis instance.
//!
//! These tests are marked as `#[ignore]` by default because they need a
//! running Redis. To run explicitly:
//! ```bash
//! REDIS_URL=redis://127.0.0.1:6379 cargo test --test hall_cache -- --ignored
//! ```

use std::collections::BTreeMap;

use seat_allocator::cache::CacheService;
use seat_allocator::models::{Hall, SeatMap};

async fn cache() -> CacheService {
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
    CacheService::connect(&url, 60)
        .await
        .expect("Failed to connect to Redis")
}

fn hall(id: i64, groups: Vec<u32>) -> Hall {
    let raw: BTreeMap<String, Vec<u32>> = [("1".to_string(), groups)].into_iter().collect();
    Hall {
        id,
        name: "Cached".into(),
        theatre_id: 1,
        seat_map: SeatMap::try_from(raw).unwrap(),
    }
}

// ids unlikely to collide with other runs sharing the instance
fn fresh_id() -> i64 {
    (uuid::Uuid::new_v4().as_u128() >> 65) as i64
}

#[tokio::test]
#[ignore]
async fn stale_fill_after_invalidation_is_dropped() {
    let cache = cache().await;
    let id = fresh_id();
    let old = hall(id, vec![2, 2, 2]);
    let new = hall(id, vec![4, 4, 4]);

    // reader loaded version 1, writer committed version 2 and invalidated,
    // then the reader tries to fill with what it loaded
    cache.invalidate_hall(id, 2).await;
    cache.save_hall(&old, 1).await;
    assert_eq!(cache.get_hall(id).await, None);

    cache.save_hall(&new, 2).await;
    assert_eq!(cache.get_hall(id).await, Some(new.clone()));

    // an older announcement never rolls the version back
    cache.invalidate_hall(id, 1).await;
    cache.save_hall(&old, 1).await;
    assert_eq!(cache.get_hall(id).await, None);
}

#[tokio::test]
#[ignore]
async fn fill_before_invalidation_is_removed_by_it() {
    let cache = cache().await;
    let id = fresh_id();
    let old = hall(id, vec![2, 2, 2]);

    cache.save_hall(&old, 1).await;
    assert_eq!(cache.get_hall(id).await, Some(old));

    cache.invalidate_hall(id, 2).await;
    assert_eq!(cache.get_hall(id).await, None);
}

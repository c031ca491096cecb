use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use tracing::{debug, info, warn};

use crate::models::Hall;

/// Redis cache for hall records. Seat maps change rarely and every booking
/// and alternative search needs one, so they are kept here between requests.
#[derive(Clone)]
pub struct CacheService {
    conn: MultiplexedConnection,
    hall_ttl_seconds: u64,
}

impl CacheService {
    pub async fn connect(redis_url: &str, hall_ttl_seconds: u64) -> redis::RedisResult<Self> {
        let client = Client::open(redis_url)?;
        let conn = client.get_multiplexed_tokio_connection().await?;
        Ok(Self {
            conn,
            hall_ttl_seconds,
        })
    }

    fn hall_key(hall_id: i64) -> String {
        format!("hall:{}", hall_id)
    }

    // Latest hall version any writer has announced
    fn version_key(hall_id: i64) -> String {
        format!("hall:{}:version", hall_id)
    }

    // Cached hall, or None on miss. A broken entry counts as a miss.
    pub async fn get_hall(&self, hall_id: i64) -> Option<Hall> {
        let mut conn = self.conn.clone();
        let data: Option<String> = match conn.get(Self::hall_key(hall_id)).await {
            Ok(data) => data,
            Err(e) => {
                warn!("Hall cache read failed for hall {}: {:?}", hall_id, e);
                return None;
            }
        };

        match data.map(|json| serde_json::from_str::<Hall>(&json)) {
            Some(Ok(hall)) => {
                debug!("Hall cache hit for hall {}", hall_id);
                Some(hall)
            }
            Some(Err(e)) => {
                warn!("Dropping unreadable hall cache entry {}: {:?}", hall_id, e);
                let _: Result<(), _> = conn.del(Self::hall_key(hall_id)).await;
                None
            }
            None => None,
        }
    }

    /// Cache `hall` as loaded at `version`. Skipped when a writer has already
    /// announced a newer version, so a slow reader cannot put back a replaced
    /// seat map.
    pub async fn save_hall(&self, hall: &Hall, version: i64) {
        let data = match serde_json::to_string(hall) {
            Ok(data) => data,
            Err(e) => {
                warn!("Failed to serialize hall {} for cache: {:?}", hall.id, e);
                return;
            }
        };

        let lua_script = r#"
            local latest = tonumber(redis.call('GET', KEYS[2]) or '0')
            if latest > tonumber(ARGV[1]) then
                return 0
            end
            redis.call('SET', KEYS[1], ARGV[2], 'EX', ARGV[3])
            return 1
        "#;

        let mut conn = self.conn.clone();
        let result: redis::RedisResult<i32> = redis::Script::new(lua_script)
            .key(Self::hall_key(hall.id))
            .key(Self::version_key(hall.id))
            .arg(version)
            .arg(data)
            .arg(self.hall_ttl_seconds)
            .invoke_async(&mut conn)
            .await;
        match result {
            Ok(0) => debug!("Skipped caching stale hall {} at version {}", hall.id, version),
            Ok(_) => {}
            Err(e) => warn!("Failed to cache hall {}: {:?}", hall.id, e),
        }
    }

    /// Announce `version` as the hall's latest and drop the cached entry, in
    /// one atomic step.
    pub async fn invalidate_hall(&self, hall_id: i64, version: i64) {
        let lua_script = r#"
            local latest = tonumber(redis.call('GET', KEYS[2]) or '0')
            if tonumber(ARGV[1]) > latest then
                redis.call('SET', KEYS[2], ARGV[1])
            end
            redis.call('DEL', KEYS[1])
            return 1
        "#;

        let mut conn = self.conn.clone();
        let result: redis::RedisResult<i32> = redis::Script::new(lua_script)
            .key(Self::hall_key(hall_id))
            .key(Self::version_key(hall_id))
            .arg(version)
            .invoke_async(&mut conn)
            .await;
        match result {
            Ok(_) => info!("Invalidated hall cache for hall {} at version {}", hall_id, version),
            Err(e) => warn!("Failed to invalidate hall cache for hall {}: {:?}", hall_id, e),
        }
    }
}

use redis::RedisResult;
use std::net::IpAddr;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    /// Counts one request from `client` in the current fixed window and reports whether it is
    /// within `limit`. Each window gets its own key, so counters reset on the window boundary.
    pub async fn allow_request(&self, client: IpAddr, limit: i64, window_seconds: u64) -> RedisResult<bool> {
        let key = window_key(client, window_seconds, SystemTime::now());
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let (count,): (i64,) = redis::pipe()
            .atomic()
            .incr(&key, 1)
            .expire(&key, window_seconds as i64)
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(count <= limit)
    }
}

fn window_key(client: IpAddr, window_seconds: u64, now: SystemTime) -> String {
    let epoch = now.duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);
    format!("busline:ratelimit:{}:{}", client, epoch / window_seconds.max(1))
}

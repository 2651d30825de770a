use crate::error::{Error, Result};
use crate::session::store::{SessionStore, StoreStats};
use crate::session::SessionData;
use async_trait::async_trait;
use deadpool_redis::{Config, Pool, PoolConfig, Runtime};
use redis::AsyncCommands;
use std::time::Duration;

/// Redis-backed session store with connection pooling
///
/// Expiry is delegated to Redis key TTLs, so `cleanup_expired` is a no-op.
/// Connectivity failures and command timeouts surface as
/// `Error::StoreUnavailable` so the middleware can answer 5xx instead of
/// treating an outage as "everyone logged out".
#[derive(Clone)]
pub struct RedisSessionStore {
    pool: Pool,
    prefix: String,
    command_timeout: Duration,
}

impl RedisSessionStore {
    /// Connect with the default prefix and pool size
    pub async fn new(redis_url: &str) -> Result<Self> {
        Self::from_url(redis_url, "authgate:session:", 10, Duration::from_secs(3)).await
    }

    /// Connect with custom prefix, pool size and per-command timeout
    pub async fn from_url(
        redis_url: &str,
        prefix: &str,
        pool_size: usize,
        command_timeout: Duration,
    ) -> Result<Self> {
        let mut cfg = Config::from_url(redis_url);
        cfg.pool = Some(PoolConfig {
            max_size: pool_size,
            ..Default::default()
        });

        let pool = cfg.create_pool(Some(Runtime::Tokio1))?;

        // Fail fast on a dead backend
        let mut conn = pool
            .get()
            .await
            .map_err(|e| Error::store_unavailable(format!("Redis connection failed: {}", e)))?;
        tokio::time::timeout(
            command_timeout,
            redis::cmd("PING").query_async::<String>(&mut conn),
        )
        .await
        .map_err(|_| Error::store_unavailable("Redis connection test timed out"))?
        .map_err(|e| Error::store_unavailable(format!("Redis connection test failed: {}", e)))?;

        Ok(Self {
            pool,
            prefix: prefix.to_string(),
            command_timeout,
        })
    }

    fn session_key(&self, id: &str) -> String {
        format!("{}{}", self.prefix, id)
    }

    async fn connection(&self) -> Result<deadpool_redis::Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| Error::store_unavailable(format!("Redis pool error: {}", e)))
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn read(&self, id: &str) -> Result<Option<SessionData>> {
        let mut conn = self.connection().await?;
        let key = self.session_key(id);

        let json_data: Option<String> = tokio::time::timeout(
            self.command_timeout,
            conn.get::<&str, Option<String>>(&key),
        )
        .await
        .map_err(|_| Error::store_unavailable("Redis GET timed out"))?
        .map_err(|e| Error::store_unavailable(format!("Redis GET failed: {}", e)))?;

        match json_data {
            Some(data) => {
                let session_data: SessionData = serde_json::from_str(&data).map_err(|e| {
                    Error::internal(format!("Corrupted session record for {}: {}", id, e))
                })?;
                Ok(Some(session_data))
            }
            None => Ok(None),
        }
    }

    async fn write(&self, id: &str, data: &SessionData, ttl: Duration) -> Result<()> {
        let mut conn = self.connection().await?;
        let key = self.session_key(id);
        let payload = serde_json::to_string(data)?;

        tokio::time::timeout(
            self.command_timeout,
            conn.set_ex::<&str, String, ()>(&key, payload, ttl.as_secs()),
        )
        .await
        .map_err(|_| Error::store_unavailable("Redis SETEX timed out"))?
        .map_err(|e| Error::store_unavailable(format!("Redis SETEX failed: {}", e)))?;

        Ok(())
    }

    async fn destroy(&self, id: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        let key = self.session_key(id);

        tokio::time::timeout(self.command_timeout, conn.del::<&str, ()>(&key))
            .await
            .map_err(|_| Error::store_unavailable("Redis DEL timed out"))?
            .map_err(|e| Error::store_unavailable(format!("Redis DEL failed: {}", e)))?;

        Ok(())
    }

    async fn exists(&self, id: &str) -> Result<bool> {
        let mut conn = self.connection().await?;
        let key = self.session_key(id);

        let exists: bool =
            tokio::time::timeout(self.command_timeout, conn.exists::<&str, bool>(&key))
            .await
            .map_err(|_| Error::store_unavailable("Redis EXISTS timed out"))?
            .map_err(|e| Error::store_unavailable(format!("Redis EXISTS failed: {}", e)))?;

        Ok(exists)
    }

    async fn cleanup_expired(&self) -> Result<usize> {
        // Redis evicts expired keys itself
        Ok(0)
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }

    async fn stats(&self) -> Result<StoreStats> {
        let mut conn = self.connection().await?;
        let pattern = format!("{}*", self.prefix);

        let keys: Vec<String> = tokio::time::timeout(
            self.command_timeout,
            redis::cmd("KEYS").arg(&pattern).query_async(&mut conn),
        )
        .await
        .map_err(|_| Error::store_unavailable("Redis KEYS timed out"))?
        .map_err(|e| Error::store_unavailable(format!("Redis KEYS failed: {}", e)))?;

        Ok(StoreStats {
            total_sessions: keys.len(),
            active_sessions: keys.len(),
            expired_sessions: 0,
            backend_metrics: std::collections::HashMap::new(),
        })
    }
}

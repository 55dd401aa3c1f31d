//! Redis cache service implementation
//!
//! Prefix-keyed JSON caching used by the CEP lookup and for short-lived
//! query results.

use redis::{Client, AsyncCommands, RedisResult};
use serde::{Serialize, Deserialize};
use tracing::{warn, debug};
use crate::config::settings::Settings;
use crate::utils::errors::{AdmissioError, Result};

/// Redis-backed cache service
#[derive(Debug, Clone)]
pub struct CacheService {
    client: Client,
    settings: Settings,
}

impl CacheService {
    /// Create a new CacheService instance
    pub fn new(settings: Settings) -> Result<Self> {
        let client = Client::open(settings.redis.url.as_str())
            .map_err(AdmissioError::Redis)?;

        Ok(Self { client, settings })
    }

    async fn get_connection(&self) -> Result<redis::aio::Connection> {
        self.client.get_async_connection().await
            .map_err(AdmissioError::Redis)
    }

    /// Set a value with a TTL, falling back to the configured default
    pub async fn set<T>(&self, key: &str, value: &T, ttl_seconds: Option<u64>) -> Result<()>
    where
        T: Serialize,
    {
        let mut conn = self.get_connection().await?;
        let serialized = serde_json::to_string(value)
            .map_err(AdmissioError::Serialization)?;

        let full_key = format!("{}{}", self.settings.redis.prefix, key);
        let ttl = ttl_seconds.unwrap_or(self.settings.redis.ttl_seconds);

        let _: () = conn.set_ex(&full_key, serialized, ttl).await
            .map_err(AdmissioError::Redis)?;

        debug!(key = %full_key, ttl = ttl, "Value set in cache");
        Ok(())
    }

    /// Get a value, None on miss
    pub async fn get<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        let mut conn = self.get_connection().await?;
        let full_key = format!("{}{}", self.settings.redis.prefix, key);

        let result: Option<String> = conn.get(&full_key).await
            .map_err(AdmissioError::Redis)?;

        match result {
            Some(data) => match serde_json::from_str::<T>(&data) {
                Ok(deserialized) => Ok(Some(deserialized)),
                Err(e) => {
                    // Drop corrupted entries instead of failing the caller
                    warn!(key = %full_key, error = %e, "Dropping undeserializable cache entry");
                    let _: () = conn.del(&full_key).await.map_err(AdmissioError::Redis)?;
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Delete a key, returning whether it existed
    pub async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.get_connection().await?;
        let full_key = format!("{}{}", self.settings.redis.prefix, key);

        let deleted: i32 = conn.del(&full_key).await
            .map_err(AdmissioError::Redis)?;

        Ok(deleted > 0)
    }

    /// Health check for the Redis connection
    pub async fn health_check(&self) -> Result<bool> {
        match self.get_connection().await {
            Ok(mut conn) => {
                let result: RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;
                match result {
                    Ok(response) => Ok(response == "PONG"),
                    Err(e) => {
                        warn!(error = %e, "Redis health check failed");
                        Ok(false)
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Redis connection failed");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_service_creation() {
        let settings = Settings::default();
        // Client::open only parses the URL, no connection is made yet
        assert!(CacheService::new(settings).is_ok());
    }

    #[test]
    fn test_invalid_redis_url_rejected() {
        let mut settings = Settings::default();
        settings.redis.url = "not-a-redis-url".to_string();
        assert!(CacheService::new(settings).is_err());
    }
}

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use tracing::{debug, error};

use crate::cache::{CacheResult, ObjectCache};
use crate::config::AppConfig;
use crate::errors::{Result, UmsError};

pub struct RedisObjectCache {
    client: redis::Client,
    key_prefix: String,
    ttl: u64, // 秒
}

impl RedisObjectCache {
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let redis_config = &config.cache.redis;

        let client = redis::Client::open(redis_config.url.clone())
            .map_err(|e| UmsError::cache_connection(format!("Invalid Redis URL: {e}")))?;

        let cache = Self {
            client,
            key_prefix: redis_config.key_prefix.clone(),
            ttl: config.cache.default_ttl,
        };

        // 启动时探测一次连接
        let mut conn = cache
            .get_connection()
            .await
            .map_err(|e| UmsError::cache_connection(format!("Redis connect failed: {e}")))?;
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| UmsError::cache_connection(format!("Redis ping failed: {e}")))?;
        debug!(
            "RedisObjectCache ready (prefix: '{}', TTL: {}s, ping: {})",
            cache.key_prefix, cache.ttl, pong
        );

        Ok(cache)
    }

    async fn get_connection(&self) -> std::result::Result<MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }

    fn make_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl ObjectCache for RedisObjectCache {
    async fn get_raw(&self, key: &str) -> CacheResult<String> {
        let mut conn = match self.get_connection().await {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to get Redis connection: {}", e);
                return CacheResult::ExistsButNoValue;
            }
        };

        let result: redis::RedisResult<Option<String>> = redis::cmd("GET")
            .arg(self.make_key(key))
            .query_async(&mut conn)
            .await;
        match result {
            Ok(Some(data)) => CacheResult::Found(data),
            Ok(None) => CacheResult::NotFound,
            Err(e) => {
                error!("Failed to get key '{}': {}", key, e);
                CacheResult::ExistsButNoValue
            }
        }
    }

    async fn insert_raw(&self, key: String, value: String, ttl: u64) {
        let mut conn = match self.get_connection().await {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to get Redis connection: {}", e);
                return;
            }
        };

        // ttl 为 0 时使用默认 TTL
        let effective_ttl = if ttl == 0 { self.ttl } else { ttl };
        let result: redis::RedisResult<()> = redis::cmd("SET")
            .arg(self.make_key(&key))
            .arg(value)
            .arg("EX")
            .arg(effective_ttl)
            .query_async(&mut conn)
            .await;
        if let Err(e) = result {
            error!("Failed to insert key '{}' into cache: {}", key, e);
        }
    }

    async fn remove(&self, key: &str) {
        let mut conn = match self.get_connection().await {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to get Redis connection: {}", e);
                return;
            }
        };

        let result: redis::RedisResult<i64> = redis::cmd("DEL")
            .arg(self.make_key(key))
            .query_async(&mut conn)
            .await;
        if let Err(e) = result {
            error!("Failed to remove key '{}': {}", key, e);
        }
    }

    async fn invalidate_all(&self) {
        let mut conn = match self.get_connection().await {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to get Redis connection: {}", e);
                return;
            }
        };

        // 只清理本服务前缀下的键
        let listed: redis::RedisResult<Vec<String>> = redis::cmd("KEYS")
            .arg(format!("{}*", self.key_prefix))
            .query_async(&mut conn)
            .await;
        let keys = match listed {
            Ok(keys) => keys,
            Err(e) => {
                error!("Failed to list cache keys: {}", e);
                return;
            }
        };
        if keys.is_empty() {
            return;
        }
        let result: redis::RedisResult<i64> =
            redis::cmd("DEL").arg(keys).query_async(&mut conn).await;
        if let Err(e) = result {
            error!("Failed to invalidate cache: {}", e);
        }
    }
}

//! 缓存层
//!
//! 对外只暴露字符串形式的 `ObjectCache`，调用方自行序列化。
//! 后端在启动时按配置显式选择：`moka`（进程内）或 `redis`。

pub mod object_cache;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use tracing::warn;

use crate::config::AppConfig;
use crate::errors::{Result, UmsError};
use object_cache::{MokaCacheWrapper, RedisObjectCache};

#[derive(Debug, Clone, PartialEq)]
pub enum CacheResult<T> {
    Found(T),
    NotFound,
    // 后端异常时返回，调用方按未命中处理
    ExistsButNoValue,
}

#[async_trait]
pub trait ObjectCache: Send + Sync {
    async fn get_raw(&self, key: &str) -> CacheResult<String>;
    async fn insert_raw(&self, key: String, value: String, ttl: u64);
    async fn remove(&self, key: &str);
    async fn invalidate_all(&self);
}

impl dyn ObjectCache {
    /// 读取并反序列化；反序列化失败时删除脏数据
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.get_raw(key).await {
            CacheResult::Found(json) => match serde_json::from_str::<T>(&json) {
                Ok(value) => Some(value),
                Err(_) => {
                    self.remove(key).await;
                    None
                }
            },
            _ => None,
        }
    }

    pub async fn insert_json<T: Serialize>(&self, key: String, value: &T, ttl: u64) {
        if let Ok(json) = serde_json::to_string(value) {
            self.insert_raw(key, json, ttl).await;
        }
    }
}

/// 按配置创建缓存后端，redis 不可用时回退到 moka
pub async fn create_cache(config: &AppConfig) -> Result<Arc<dyn ObjectCache>> {
    let cache_type = config.cache.cache_type.as_str();
    warn!("Attempting to create {} cache backend", cache_type);

    match cache_type {
        "moka" => Ok(Arc::new(MokaCacheWrapper::new(config))),
        "redis" => match RedisObjectCache::new(config).await {
            Ok(cache) => Ok(Arc::new(cache)),
            Err(e) => {
                warn!("Failed to create redis cache: {}", e);
                warn!("Falling back to memory cache");
                Ok(Arc::new(MokaCacheWrapper::new(config)))
            }
        },
        other => Err(UmsError::cache_connection(format!(
            "Unknown cache backend '{other}', expected 'moka' or 'redis'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_json_helpers_roundtrip_and_evict_garbage() {
        let config = AppConfig::load().expect("config should load");
        let cache: Arc<dyn ObjectCache> = Arc::new(MokaCacheWrapper::new(&config));

        cache.insert_json("answer".into(), &42_i64, 0).await;
        assert_eq!(cache.get_json::<i64>("answer").await, Some(42));

        cache.insert_raw("broken".into(), "not json".into(), 0).await;
        assert_eq!(cache.get_json::<i64>("broken").await, None);
        assert_eq!(cache.get_raw("broken").await, CacheResult::NotFound);
    }
}

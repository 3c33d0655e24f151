// src/services/token_store.rs
//
// TTL-bounded key-value storage for reset artifacts and grants. Redis is the
// durable backend (native expiry); when it is unreachable at call time every
// operation degrades to an in-process map with wall-clock expiry checks.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store operation failed: {0}")]
    Operation(String),
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), StoreError>;
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    /// Idempotent removal.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
    /// Sweep manually-expired entries. Only meaningful for the in-memory
    /// store; Redis keys self-expire.
    async fn cleanup_expired(&self) -> usize;
}

pub struct RedisTokenStore {
    client: Client,
}

impl RedisTokenStore {
    pub fn new(redis_url: &str) -> Result<Self, StoreError> {
        let client =
            Client::open(redis_url).map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(Self { client })
    }

    async fn connection(&self) -> Result<MultiplexedConnection, StoreError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}

#[async_trait]
impl TokenStore for RedisTokenStore {
    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), StoreError> {
        // Clamp to at least 1 second to avoid immediate expiration
        let ttl = ttl_seconds.max(1);
        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(key, value, ttl)
            .await
            .map_err(|e| StoreError::Operation(e.to_string()))
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection().await?;
        conn.get(key)
            .await
            .map_err(|e| StoreError::Operation(e.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(key)
            .await
            .map_err(|e| StoreError::Operation(e.to_string()))
    }

    async fn cleanup_expired(&self) -> usize {
        0
    }
}

/// In-process fallback map. Expiry is enforced by wall-clock comparison on
/// read plus the periodic `cleanup_expired` sweep; contents do not survive a
/// restart, which is acceptable for 10-minute artifacts.
#[derive(Default)]
pub struct MemoryTokenStore {
    entries: RwLock<HashMap<String, (String, DateTime<Utc>)>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), StoreError> {
        let expires_at = Utc::now() + Duration::seconds(ttl_seconds.max(1) as i64);
        self.entries
            .write()
            .await
            .insert(key.to_string(), (value.to_string(), expires_at));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = Utc::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some((value, expires_at)) if *expires_at > now => {
                    return Ok(Some(value.clone()))
                }
                Some(_) => {}
                None => return Ok(None),
            }
        }
        // Stale entry: remove it and report a miss.
        self.entries.write().await.remove(key);
        Ok(None)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn cleanup_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, (_, expires_at)| *expires_at > now);
        before - entries.len()
    }
}

/// Tries the primary store first and silently degrades to the in-memory map
/// when it is unreachable. Degradation is never surfaced to callers.
pub struct FallbackTokenStore<P: TokenStore> {
    primary: P,
    memory: MemoryTokenStore,
}

impl<P: TokenStore> FallbackTokenStore<P> {
    pub fn new(primary: P) -> Self {
        Self {
            primary,
            memory: MemoryTokenStore::new(),
        }
    }
}

#[async_trait]
impl<P: TokenStore> TokenStore for FallbackTokenStore<P> {
    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), StoreError> {
        match self.primary.set(key, value, ttl_seconds).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!("primary store set failed, using in-memory fallback: {}", e);
                self.memory.set(key, value, ttl_seconds).await
            }
        }
    }

    // Asymmetry with `delete`: a primary miss is final, so a record written
    // to the fallback during an outage becomes unreachable once the primary
    // recovers. Best-effort is acceptable for 10-minute artifacts.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.primary.get(key).await {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!("primary store get failed, using in-memory fallback: {}", e);
                self.memory.get(key).await
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        // Remove from both so a record consumed while the primary was down
        // cannot resurface once it comes back.
        let primary_result = self.primary.delete(key).await;
        self.memory.delete(key).await?;
        if let Err(e) = primary_result {
            tracing::warn!("primary store delete failed, removed fallback copy only: {}", e);
        }
        Ok(())
    }

    async fn cleanup_expired(&self) -> usize {
        self.memory.cleanup_expired().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;

    #[tokio::test]
    async fn memory_store_roundtrip() {
        let store = MemoryTokenStore::new();
        store.set("reset:123456", "payload", 60).await.unwrap();
        assert_eq!(
            store.get("reset:123456").await.unwrap(),
            Some("payload".to_string())
        );
    }

    #[tokio::test]
    async fn memory_store_miss_and_idempotent_delete() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.get("missing").await.unwrap(), None);
        store.delete("missing").await.unwrap();
        store.set("k", "v", 60).await.unwrap();
        store.delete("k").await.unwrap();
        store.delete("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn memory_store_expires_on_read() {
        let store = MemoryTokenStore::new();
        store.set("k", "v", 1).await.unwrap();
        tokio::time::sleep(StdDuration::from_millis(1100)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn cleanup_sweeps_only_stale_entries() {
        let store = MemoryTokenStore::new();
        store.set("stale", "v", 1).await.unwrap();
        store.set("fresh", "v", 60).await.unwrap();
        tokio::time::sleep(StdDuration::from_millis(1100)).await;
        assert_eq!(store.cleanup_expired().await, 1);
        assert_eq!(store.get("fresh").await.unwrap(), Some("v".to_string()));
    }

    struct UnreachableStore;

    #[async_trait]
    impl TokenStore for UnreachableStore {
        async fn set(&self, _key: &str, _value: &str, _ttl: u64) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn delete(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn cleanup_expired(&self) -> usize {
            0
        }
    }

    #[tokio::test]
    async fn fallback_degrades_per_operation_when_primary_unreachable() {
        let store = FallbackTokenStore::new(UnreachableStore);

        // Every operation silently lands in the in-memory map.
        store.set("reset:999999", "payload", 60).await.unwrap();
        assert_eq!(
            store.get("reset:999999").await.unwrap(),
            Some("payload".to_string())
        );

        store.delete("reset:999999").await.unwrap();
        assert_eq!(store.get("reset:999999").await.unwrap(), None);
    }

    #[tokio::test]
    async fn fallback_sweep_covers_the_memory_side() {
        let store = FallbackTokenStore::new(UnreachableStore);
        store.set("stale", "v", 1).await.unwrap();
        tokio::time::sleep(StdDuration::from_millis(1100)).await;
        assert_eq!(store.cleanup_expired().await, 1);
    }

    #[tokio::test]
    async fn set_overwrites_previous_value() {
        let store = MemoryTokenStore::new();
        store.set("k", "old", 60).await.unwrap();
        store.set("k", "new", 60).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("new".to_string()));
    }
}

use crate::cache::error::CacheError;
use crate::cache::key::CacheKey;
use crate::cache::store::CacheStore;
use async_trait::async_trait;
use polars::prelude::DataFrame;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// A [`CacheStore`] that keeps frames in memory for the lifetime of the store.
#[derive(Default)]
pub struct MemoryCacheStore {
    frames: RwLock<HashMap<CacheKey, DataFrame>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.frames.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.frames.read().await.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn lookup(&self, key: &CacheKey) -> Result<Option<DataFrame>, CacheError> {
        Ok(self.frames.read().await.get(key).cloned())
    }

    async fn store(&self, key: &CacheKey, frame: &DataFrame) -> Result<(), CacheError> {
        self.frames.write().await.insert(key.clone(), frame.clone());
        Ok(())
    }

    async fn invalidate(&self, key: &CacheKey) -> Result<bool, CacheError> {
        Ok(self.frames.write().await.remove(key).is_some())
    }
}

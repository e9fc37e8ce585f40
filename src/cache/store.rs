use crate::cache::error::CacheError;
use crate::cache::key::CacheKey;
use async_trait::async_trait;
use polars::prelude::DataFrame;

/// Where assembled crime tables are kept between calls.
///
/// A stored frame must come back from [`CacheStore::lookup`] unchanged until
/// it is invalidated. Frames are handed out by value; polars frames share
/// their buffers, so this does not copy the data.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns `Ok(None)` when nothing is cached under `key`.
    async fn lookup(&self, key: &CacheKey) -> Result<Option<DataFrame>, CacheError>;

    /// Stores `frame` under `key`, replacing any previous entry.
    async fn store(&self, key: &CacheKey, frame: &DataFrame) -> Result<(), CacheError>;

    /// Removes the entry for `key`. Returns whether there was one.
    async fn invalidate(&self, key: &CacheKey) -> Result<bool, CacheError>;
}

use crate::cache::error::CacheError;
use crate::cache::key::CacheKey;
use crate::cache::store::CacheStore;
use async_trait::async_trait;
use log::{debug, warn};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};
use tokio::{fs, task};

const CACHE_FILE_PREFIX: &str = "crimedata_";

/// A [`CacheStore`] writing one snappy-compressed parquet file per key.
///
/// Created with [`ParquetCacheStore::temporary`] the files live in a fresh
/// temporary directory that is removed when the store is dropped, so cached
/// data lasts for the session. [`ParquetCacheStore::in_folder`] keeps them
/// in a caller-chosen directory across runs.
pub struct ParquetCacheStore {
    cache_dir: PathBuf,
    // Held so the directory is removed on drop.
    _temp_dir: Option<TempDir>,
}

impl ParquetCacheStore {
    pub fn temporary() -> Result<Self, CacheError> {
        let temp_dir = tempfile::Builder::new()
            .prefix(CACHE_FILE_PREFIX)
            .tempdir()
            .map_err(CacheError::TempDirCreation)?;
        Ok(Self {
            cache_dir: temp_dir.path().to_path_buf(),
            _temp_dir: Some(temp_dir),
        })
    }

    /// Uses `cache_dir`, creating it if it does not exist yet.
    pub async fn in_folder(cache_dir: &Path) -> Result<Self, CacheError> {
        fs::create_dir_all(cache_dir)
            .await
            .map_err(|e| CacheError::CacheDirCreation(cache_dir.to_path_buf(), e))?;
        Ok(Self {
            cache_dir: cache_dir.to_path_buf(),
            _temp_dir: None,
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir
            .join(format!("{CACHE_FILE_PREFIX}{}.parquet", key.as_str()))
    }

    /// Removes every cache file this store manages.
    pub async fn clear(&self) -> Result<usize, CacheError> {
        let mut removed = 0;
        let mut entries = match fs::read_dir(&self.cache_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(CacheError::CacheDeletion(self.cache_dir.clone(), e)),
        };
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CacheError::CacheDeletion(self.cache_dir.clone(), e))?
        {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(CACHE_FILE_PREFIX) && name.ends_with(".parquet") {
                let path = entry.path();
                fs::remove_file(&path)
                    .await
                    .map_err(|e| CacheError::CacheDeletion(path, e))?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn read_parquet(path: &Path) -> PolarsResult<DataFrame> {
    let file = std::fs::File::open(path)?;
    ParquetReader::new(file).finish()
}

#[async_trait]
impl CacheStore for ParquetCacheStore {
    async fn lookup(&self, key: &CacheKey) -> Result<Option<DataFrame>, CacheError> {
        let path = self.path_for(key);
        if fs::metadata(&path).await.is_err() {
            return Ok(None);
        }

        let read_path = path.clone();
        match task::spawn_blocking(move || read_parquet(&read_path)).await? {
            Ok(frame) => {
                debug!("Cache hit for {} at {:?}", key, path);
                Ok(Some(frame))
            }
            Err(e) => {
                warn!("Discarding unreadable cache file {:?}: {}", path, e);
                self.invalidate(key).await?;
                Ok(None)
            }
        }
    }

    async fn store(&self, key: &CacheKey, frame: &DataFrame) -> Result<(), CacheError> {
        let path = self.path_for(key);
        let cache_dir = self.cache_dir.clone();
        let mut frame = frame.clone();

        let written = path.clone();
        task::spawn_blocking(move || {
            // Written next to the target and renamed into place so a failed
            // write never leaves a truncated entry behind.
            let mut temp_file = NamedTempFile::new_in(&cache_dir)
                .map_err(|e| CacheError::ParquetWriteIo(written.clone(), e))?;
            ParquetWriter::new(temp_file.as_file_mut())
                .with_compression(ParquetCompression::Snappy)
                .finish(&mut frame)
                .map_err(|e| CacheError::ParquetWritePolars(written.clone(), e))?;
            temp_file
                .persist(&written)
                .map_err(|e| CacheError::ParquetWriteIo(written.clone(), e.error))?;
            Ok::<(), CacheError>(())
        })
        .await??;

        debug!("Cached {} to {:?}", key, path);
        Ok(())
    }

    async fn invalidate(&self, key: &CacheKey) -> Result<bool, CacheError> {
        let path = self.path_for(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::CacheDeletion(path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::detail_level::DetailLevel;
    use crate::types::request::CitySelection;

    fn frame() -> PolarsResult<DataFrame> {
        df!(
            "uid" => [10_i64, 11, 12],
            "city_name" => ["chicago", "chicago", "detroit"],
            "longitude" => [Some(-87.6), None, Some(-83.0)]
        )
    }

    #[tokio::test]
    async fn test_round_trip_in_folder() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let cache = ParquetCacheStore::in_folder(&dir.path().join("nested")).await?;
        let key = CacheKey::new(DetailLevel::Core, [2019], &CitySelection::All);
        let original = frame()?;

        cache.store(&key, &original).await?;
        assert!(cache.path_for(&key).exists());

        let cached = cache.lookup(&key).await?.expect("frame was stored");
        assert!(cached.equals_missing(&original));

        assert!(cache.invalidate(&key).await?);
        assert!(cache.lookup(&key).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_temporary_dir_is_removed_on_drop() -> Result<(), Box<dyn std::error::Error>> {
        let cache = ParquetCacheStore::temporary()?;
        let dir = cache.cache_dir().to_path_buf();
        let key = CacheKey::new(DetailLevel::Sample, [2018], &CitySelection::All);
        cache.store(&key, &frame()?).await?;
        assert!(dir.exists());

        drop(cache);
        assert!(!dir.exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupt_file_is_a_miss() -> Result<(), Box<dyn std::error::Error>> {
        let cache = ParquetCacheStore::temporary()?;
        let key = CacheKey::new(DetailLevel::Sample, [2018], &CitySelection::All);
        std::fs::write(cache.path_for(&key), b"not parquet")?;

        assert!(cache.lookup(&key).await?.is_none());
        assert!(!cache.path_for(&key).exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_clear_removes_only_cache_files() -> Result<(), Box<dyn std::error::Error>> {
        let cache = ParquetCacheStore::temporary()?;
        for year in [2017, 2018] {
            let key = CacheKey::new(DetailLevel::Sample, [year], &CitySelection::All);
            cache.store(&key, &frame()?).await?;
        }
        let other = cache.cache_dir().join("notes.txt");
        std::fs::write(&other, b"keep me")?;

        assert_eq!(cache.clear().await?, 2);
        assert!(other.exists());
        Ok(())
    }
}

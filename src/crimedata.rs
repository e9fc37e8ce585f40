//! The main entry point for downloading data from the Open Crime Database.

use crate::cache::key::CacheKey;
use crate::cache::parquet::ParquetCacheStore;
use crate::cache::store::CacheStore;
use crate::catalog::osf::OsfCatalogSource;
use crate::catalog::source::{fetch_catalog, summarize_catalog, CatalogSource};
use crate::error::CrimeDataError;
use crate::fetch::assemble::fetch_and_assemble;
use crate::fetch::downloader::{Downloader, HttpDownloader};
use crate::normalize::normalize;
use crate::types::catalog_entry::{CatalogEntry, CityCoverage};
use crate::types::crime_frame::CrimeDataResponse;
use crate::types::detail_level::DetailLevel;
use crate::types::output_format::OutputFormat;
use crate::types::request::{CitiesArg, DataRequest, RequestOptions, YearsArg};
use crate::utils::{ensure_cache_dir_exists, get_cache_dir, is_interactive};
use crate::validate::{validate, Validation};
use bon::bon;
use log::{info, warn};
use polars::prelude::DataFrame;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

/// The client for the Open Crime Database.
///
/// Holds the catalog source, the downloader and the cache store. Requests for
/// the same data are answered from the cache, and concurrent identical
/// requests download the data only once.
///
/// Create an instance using [`CrimeData::new()`] for a cache that lasts as
/// long as the client, [`CrimeData::with_cache_folder()`] or
/// [`CrimeData::with_default_cache_folder()`] for a cache that survives
/// restarts, or [`CrimeData::custom()`] to supply your own collaborators.
///
/// # Examples
///
/// ```no_run
/// # use crimedata::{CrimeData, CrimeDataError};
/// # #[tokio::main]
/// # async fn main() -> Result<(), CrimeDataError> {
/// let client = CrimeData::new()?;
/// let response = client.get_crime_data().call().await?;
/// println!("{}", response.data.frame().head(Some(5)));
/// # Ok(())
/// # }
/// ```
pub struct CrimeData {
    catalog: Arc<dyn CatalogSource>,
    downloader: Arc<dyn Downloader>,
    cache: Arc<dyn CacheStore>,
    key_locks: KeyLocks,
}

type KeyLocks = Mutex<HashMap<CacheKey, Arc<tokio::sync::Mutex<()>>>>;

/// A claim on the lock of one cache key.
///
/// Dropping it forgets the key's lock once no other request holds or awaits
/// it, also when the request future is dropped halfway.
struct KeyLease<'a> {
    locks: &'a KeyLocks,
    key: CacheKey,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl<'a> KeyLease<'a> {
    fn acquire(locks: &'a KeyLocks, key: &CacheKey) -> Self {
        let lock = locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key.clone())
            .or_default()
            .clone();
        Self {
            locks,
            key: key.clone(),
            lock,
        }
    }
}

impl Drop for KeyLease<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // one reference in the map, one here
        if Arc::strong_count(&self.lock) == 2 {
            locks.remove(&self.key);
        }
    }
}

#[bon]
impl CrimeData {
    /// Creates a client that caches into a temporary directory, removed when
    /// the client is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`CrimeDataError::Cache`] if the temporary directory cannot be created.
    pub fn new() -> Result<Self, CrimeDataError> {
        Self::custom().build()
    }

    /// Creates a client that caches into `cache_folder`, so cached requests
    /// survive restarts. The directory is created if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns [`CrimeDataError::CacheDirCreation`] if the directory cannot be created.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use crimedata::{CrimeData, CrimeDataError};
    /// # use std::path::PathBuf;
    /// # async fn run() -> Result<(), CrimeDataError> {
    /// let client = CrimeData::with_cache_folder(PathBuf::from("/tmp/crimedata")).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn with_cache_folder(cache_folder: PathBuf) -> Result<Self, CrimeDataError> {
        ensure_cache_dir_exists(&cache_folder)
            .await
            .map_err(|e| CrimeDataError::CacheDirCreation(cache_folder.clone(), e))?;
        let cache = ParquetCacheStore::in_folder(&cache_folder).await?;
        Self::custom().cache_store(Arc::new(cache)).build()
    }

    /// Creates a client caching into the user's cache directory, typically
    /// `~/.cache/crimedata_rs_cache` on Linux.
    ///
    /// # Errors
    ///
    /// Returns [`CrimeDataError::CacheDirResolution`] if no cache directory is known
    /// for this platform, and [`CrimeDataError::CacheDirCreation`] if it cannot be created.
    pub async fn with_default_cache_folder() -> Result<Self, CrimeDataError> {
        let cache_folder = get_cache_dir().map_err(CrimeDataError::CacheDirResolution)?;
        Self::with_cache_folder(cache_folder).await
    }

    /// Assembles a client from its parts. Any part left out gets the default:
    /// the OSF catalog, the HTTP downloader and a temporary parquet cache.
    ///
    /// # Examples
    ///
    /// ```
    /// # use crimedata::{CrimeData, CrimeDataError, MemoryCacheStore};
    /// # use std::sync::Arc;
    /// # fn main() -> Result<(), CrimeDataError> {
    /// let client = CrimeData::custom()
    ///     .cache_store(Arc::new(MemoryCacheStore::new()))
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    #[builder(start_fn = custom, finish_fn = build)]
    #[doc(hidden)]
    pub fn build_custom(
        catalog: Option<Arc<dyn CatalogSource>>,
        downloader: Option<Arc<dyn Downloader>>,
        cache_store: Option<Arc<dyn CacheStore>>,
    ) -> Result<Self, CrimeDataError> {
        let cache = match cache_store {
            Some(cache) => cache,
            None => Arc::new(ParquetCacheStore::temporary()?),
        };
        Ok(Self {
            catalog: catalog.unwrap_or_else(|| Arc::new(OsfCatalogSource::default())),
            downloader: downloader.unwrap_or_else(|| Arc::new(HttpDownloader::new())),
            cache,
            key_locks: Mutex::new(HashMap::new()),
        })
    }

    /// Fetches crime data for the given years, cities and detail level.
    ///
    /// The catalog of available files is consulted first, so a request for
    /// data that doesn't exist fails before anything is downloaded. Cities
    /// that lack some of the requested years are skipped for those years and
    /// reported in [`CrimeDataResponse::advisories`].
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.years(impl Into<YearsArg>)`: Optional. A year, a list or range of years, or
    ///   numeric text. Defaults to the most recent year available at the detail level.
    /// * `.cities(impl Into<CitiesArg>)`: Optional. One or more city names, in any
    ///   case. Defaults to every city.
    /// * `.data_type(DetailLevel)`: Optional. Defaults to [`DetailLevel::Sample`].
    /// * `.cache(bool)`: Optional. With `false` any cached copy is discarded and the
    ///   data is downloaded again. Defaults to `true`.
    /// * `.quiet(bool)`: Optional. Suppresses progress notices and advisory warnings.
    ///   Defaults to `true` unless stdout is a terminal.
    /// * `.output(OutputFormat)`: Optional. Defaults to [`OutputFormat::Table`].
    ///
    /// # Errors
    ///
    /// * [`CrimeDataError::InvalidArgument`] for malformed years or cities.
    /// * [`CrimeDataError::CatalogUnavailable`] if the catalog cannot be listed.
    /// * [`CrimeDataError::YearsUnavailable`], [`CrimeDataError::CitiesUnavailable`] and
    ///   [`CrimeDataError::NoMatchingData`] if the catalog doesn't cover the request.
    /// * [`CrimeDataError::DownloadFailed`] and [`CrimeDataError::AssemblyFailed`] if a
    ///   file cannot be retrieved or combined. Nothing is cached in that case.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use crimedata::{CrimeData, CrimeDataError, DetailLevel, OutputFormat};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), CrimeDataError> {
    /// let client = CrimeData::new()?;
    /// let response = client
    ///     .get_crime_data()
    ///     .years(2017..=2019)
    ///     .cities(["Chicago", "Detroit"])
    ///     .data_type(DetailLevel::Core)
    ///     .output(OutputFormat::Geo)
    ///     .call()
    ///     .await?;
    ///
    /// for advisory in &response.advisories {
    ///     println!("{advisory}");
    /// }
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn get_crime_data(
        &self,
        #[builder(into)] years: Option<YearsArg>,
        #[builder(into)] cities: Option<CitiesArg>,
        data_type: Option<DetailLevel>,
        cache: Option<bool>,
        quiet: Option<bool>,
        output: Option<OutputFormat>,
    ) -> Result<CrimeDataResponse, CrimeDataError> {
        let years = years.map(YearsArg::resolve).transpose()?;
        let cities = cities.map(CitiesArg::resolve).transpose()?;
        let options = RequestOptions {
            use_cache: cache.unwrap_or(true),
            quiet: quiet.unwrap_or_else(|| !is_interactive()),
            output_format: output.unwrap_or_default(),
        };

        let catalog = fetch_catalog(self.catalog.as_ref(), options.quiet).await?;
        let validation = validate(
            years,
            cities,
            data_type.unwrap_or_default(),
            options,
            &catalog,
        )?;
        self.materialize(validation).await
    }

    /// Lists the years available for every city and detail level, sorted by
    /// detail level and then city.
    pub async fn list_crime_data(&self, quiet: bool) -> Result<Vec<CityCoverage>, CrimeDataError> {
        let catalog = fetch_catalog(self.catalog.as_ref(), quiet).await?;
        Ok(summarize_catalog(&catalog))
    }

    /// Removes the cached data stored under `key`. Returns whether anything was removed.
    pub async fn clear_cache(&self, key: &CacheKey) -> Result<bool, CrimeDataError> {
        Ok(self.cache.invalidate(key).await?)
    }

    async fn materialize(&self, validation: Validation) -> Result<CrimeDataResponse, CrimeDataError> {
        let Validation {
            request,
            entries,
            advisories,
        } = validation;
        let key = CacheKey::for_request(&request);

        let lease = KeyLease::acquire(&self.key_locks, &key);
        let loaded = {
            let _guard = lease.lock.lock().await;
            self.load_or_fetch(&key, &request, &entries).await
        };
        drop(lease);
        let (frame, cache_hit) = loaded?;

        let data = normalize(frame, request.output_format())?;
        Ok(CrimeDataResponse {
            data,
            advisories,
            cache_hit,
            key,
        })
    }

    async fn load_or_fetch(
        &self,
        key: &CacheKey,
        request: &DataRequest,
        entries: &[CatalogEntry],
    ) -> Result<(DataFrame, bool), CrimeDataError> {
        let quiet = request.quiet();
        if request.use_cache() {
            if let Some(frame) = self.cache.lookup(key).await? {
                if !quiet {
                    info!("Loading cached data from previous request");
                }
                return Ok((frame, true));
            }
        } else if self.cache.invalidate(key).await? && !quiet {
            info!("Deleting cached data from previous request");
        }

        let frame = fetch_and_assemble(
            entries,
            request.data_type(),
            self.downloader.as_ref(),
            quiet,
        )
        .await?;

        if let Err(e) = self.cache.store(key, &frame).await {
            warn!("Could not cache data for {}: {}", key, e);
        }
        Ok((frame, false))
    }
}

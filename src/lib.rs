mod cache;
mod catalog;
mod crimedata;
mod error;
mod fetch;
mod normalize;
mod types;
mod utils;
mod validate;

#[cfg(test)]
mod test_support;

pub use crimedata::*;
pub use error::{CrimeDataError, CATALOG_DOCS_URL};

pub use types::advisory::Advisory;
pub use types::catalog_entry::{CatalogEntry, CityCoverage};
pub use types::crime_frame::{CrimeDataResponse, CrimeFrame, GeoCrimeFrame, WGS84};
pub use types::detail_level::DetailLevel;
pub use types::output_format::OutputFormat;
pub use types::request::{CitiesArg, CitySelection, DataRequest, RequestOptions, Year, YearsArg};

pub use catalog::osf::{OsfCatalogSource, DEFAULT_OSF_NODE};
pub use catalog::source::{fetch_catalog, CatalogSource};

pub use cache::key::CacheKey;
pub use cache::memory::MemoryCacheStore;
pub use cache::parquet::ParquetCacheStore;
pub use cache::store::CacheStore;

pub use fetch::downloader::{Downloader, HttpDownloader};

pub use normalize::{normalize, normalize_columns, to_geo};
pub use validate::{validate, Validation};

pub use cache::error::CacheError;
pub use catalog::error::CatalogError;
pub use fetch::error::{AssemblyError, DownloadError, FetchError};

use crate::cache::error::CacheError;
use crate::catalog::error::CatalogError;
use crate::fetch::error::{AssemblyError, DownloadError, FetchError};
use crate::types::detail_level::DetailLevel;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

/// Where the list of available cities and years is documented.
pub const CATALOG_DOCS_URL: &str = "https://osf.io/zyaqn/";

#[derive(Debug, Error)]
pub enum CrimeDataError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to retrieve the list of available data files")]
    CatalogUnavailable(#[from] CatalogError),

    #[error(
        "{data_type} data are not available for year(s) {}. Available years: {}. See {} or call list_crime_data()",
        join(.years), join(.available), CATALOG_DOCS_URL
    )]
    YearsUnavailable {
        data_type: DetailLevel,
        years: Vec<i32>,
        available: Vec<i32>,
    },

    #[error(
        "{data_type} data are not available for {}. See {} or call list_crime_data() for available cities",
        join(.cities), CATALOG_DOCS_URL
    )]
    CitiesUnavailable {
        data_type: DetailLevel,
        cities: Vec<String>,
    },

    #[error(
        "No {data_type} data are available for the requested combination of years ({}) and cities ({cities}). See {}",
        join(.years), CATALOG_DOCS_URL
    )]
    NoMatchingData {
        data_type: DetailLevel,
        years: Vec<i32>,
        cities: String,
    },

    #[error("Failed to download crime data")]
    DownloadFailed(#[from] DownloadError),

    #[error("Failed to assemble downloaded crime data")]
    AssemblyFailed(#[from] AssemblyError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to determine cache directory")]
    CacheDirResolution(#[source] std::io::Error),

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),
}

impl From<FetchError> for CrimeDataError {
    fn from(error: FetchError) -> Self {
        match error {
            FetchError::Download(e) => CrimeDataError::DownloadFailed(e),
            FetchError::Assembly(e) => CrimeDataError::AssemblyFailed(e),
        }
    }
}

fn join<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

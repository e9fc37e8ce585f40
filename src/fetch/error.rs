use crate::types::detail_level::DetailLevel;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Failed to create staging directory")]
    StagingDir(#[source] std::io::Error),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Download or decompression of {url} failed")]
    DownloadIo {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write downloaded file '{0}'")]
    FileWrite(PathBuf, #[source] std::io::Error),

    #[error("No data available at {0}")]
    NotFound(String),
}

#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("Parsing error processing CSV data in '{file}'")]
    CsvRead {
        file: String,
        #[source]
        source: PolarsError,
    },

    #[error("File '{file}' is missing column(s) {} required for {data_type} data", .columns.join(", "))]
    MissingColumns {
        file: String,
        data_type: DetailLevel,
        columns: Vec<String>,
    },

    #[error("Columns of '{file}' do not match those of '{first_file}'")]
    SchemaMismatch { file: String, first_file: String },

    #[error("Failed to combine downloaded files: {0}")]
    Combine(#[source] PolarsError),

    #[error("No files were given to assemble")]
    NoFiles,

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}

/// Failure of one fetch-and-assemble run.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to parse file listing from {0}")]
    JsonParse(String, #[source] reqwest::Error),

    #[error("File listing pagination did not terminate after {0} pages")]
    TooManyPages(usize),

    #[error("Catalog source failed: {0}")]
    Source(String),
}

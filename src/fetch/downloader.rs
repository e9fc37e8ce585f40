use crate::fetch::error::DownloadError;
use crate::types::catalog_entry::CatalogEntry;
use async_compression::tokio::bufread::GzipDecoder;
use async_trait::async_trait;
use futures_util::TryStreamExt;
use log::{debug, warn};
use reqwest::Client;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt};
use tokio_util::io::StreamReader;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Retrieves the file behind a catalog entry.
///
/// Implementations write plain CSV to `destination`, overwriting anything
/// already there, and return the number of bytes written.
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, entry: &CatalogEntry, destination: &Path)
        -> Result<u64, DownloadError>;
}

/// Downloads catalog entries over HTTP, treating `remote_reference` as a URL.
/// Gzip-compressed files are decompressed while streaming.
#[derive(Clone, Default)]
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(
        &self,
        entry: &CatalogEntry,
        destination: &Path,
    ) -> Result<u64, DownloadError> {
        let url = entry.remote_reference.as_str();
        debug!("Downloading data from {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::NetworkRequest(url.to_string(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(match e.status() {
                    Some(reqwest::StatusCode::NOT_FOUND) => DownloadError::NotFound(url.to_string()),
                    Some(status) => DownloadError::HttpStatus {
                        url: url.to_string(),
                        status,
                        source: e,
                    },
                    None => DownloadError::NetworkRequest(url.to_string(), e),
                });
            }
        };

        let stream = response.bytes_stream().map_err(std::io::Error::other);
        let written = write_body(StreamReader::new(stream), destination, url).await?;
        debug!(
            "Successfully downloaded {} bytes for {}",
            written, entry.file_name
        );
        Ok(written)
    }
}

/// Copies `reader` to `destination`, gunzipping it first when the body
/// starts with the gzip magic bytes.
pub(crate) async fn write_body<R>(
    mut reader: R,
    destination: &Path,
    url: &str,
) -> Result<u64, DownloadError>
where
    R: AsyncBufRead + Unpin + Send,
{
    let download_io = |source| DownloadError::DownloadIo {
        url: url.to_string(),
        source,
    };

    let is_gzip = reader
        .fill_buf()
        .await
        .map_err(download_io)?
        .starts_with(&GZIP_MAGIC);

    let mut file = File::create(destination)
        .await
        .map_err(|e| DownloadError::FileWrite(destination.to_path_buf(), e))?;

    let written = if is_gzip {
        let mut decoder = GzipDecoder::new(reader);
        decoder.multiple_members(true);
        tokio::io::copy(&mut decoder, &mut file).await
    } else {
        tokio::io::copy(&mut reader, &mut file).await
    }
    .map_err(download_io)?;

    file.flush()
        .await
        .map_err(|e| DownloadError::FileWrite(destination.to_path_buf(), e))?;
    Ok(written)
}

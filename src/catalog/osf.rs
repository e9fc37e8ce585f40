//! Lists the Open Crime Database files stored on the Open Science Framework.

use crate::catalog::error::CatalogError;
use crate::catalog::file_name::parse_file_name;
use crate::catalog::source::CatalogSource;
use crate::types::catalog_entry::CatalogEntry;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;
use std::collections::VecDeque;

/// The OSF project holding the Open Crime Database.
pub const DEFAULT_OSF_NODE: &str = "zyaqn";
const OSF_API_URL: &str = "https://api.osf.io/v2";
const PAGE_SIZE: usize = 100;
const MAX_PAGES: usize = 1_000;

#[derive(Debug, Deserialize)]
struct OsfPage {
    data: Vec<OsfItem>,
    #[serde(default)]
    links: OsfPageLinks,
}

#[derive(Debug, Default, Deserialize)]
struct OsfPageLinks {
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OsfItem {
    attributes: OsfAttributes,
    #[serde(default)]
    links: OsfItemLinks,
    relationships: Option<OsfRelationships>,
}

#[derive(Debug, Deserialize)]
struct OsfAttributes {
    name: String,
    kind: String,
    date_modified: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OsfItemLinks {
    download: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OsfRelationships {
    files: Option<OsfRelated>,
}

#[derive(Debug, Deserialize)]
struct OsfRelated {
    links: OsfRelatedLinks,
}

#[derive(Debug, Deserialize)]
struct OsfRelatedLinks {
    related: OsfHref,
}

#[derive(Debug, Deserialize)]
struct OsfHref {
    href: String,
}

/// A [`CatalogSource`] backed by the OSF storage API.
///
/// Walks every page of the project's storage listing and descends into
/// folders, keeping the files whose names follow the database's scheme.
pub struct OsfCatalogSource {
    client: Client,
    root_url: String,
}

impl OsfCatalogSource {
    pub fn new(node: &str) -> Self {
        Self::with_client(Client::new(), node)
    }

    pub fn with_client(client: Client, node: &str) -> Self {
        Self {
            client,
            root_url: format!("{OSF_API_URL}/nodes/{node}/files/osfstorage/"),
        }
    }

    async fn get_page(&self, url: &str) -> Result<OsfPage, CatalogError> {
        let response = self
            .client
            .get(url)
            .query(&[("page[size]", PAGE_SIZE)])
            .send()
            .await
            .map_err(|e| CatalogError::NetworkRequest(url.to_string(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(if let Some(status) = e.status() {
                    CatalogError::HttpStatus {
                        url: url.to_string(),
                        status,
                        source: e,
                    }
                } else {
                    CatalogError::NetworkRequest(url.to_string(), e)
                });
            }
        };

        response
            .json::<OsfPage>()
            .await
            .map_err(|e| CatalogError::JsonParse(url.to_string(), e))
    }
}

impl Default for OsfCatalogSource {
    fn default() -> Self {
        Self::new(DEFAULT_OSF_NODE)
    }
}

#[async_trait]
impl CatalogSource for OsfCatalogSource {
    async fn list_files(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        let mut entries = Vec::new();
        let mut pending = VecDeque::from([self.root_url.clone()]);
        let mut pages = 0;

        while let Some(url) = pending.pop_front() {
            pages += 1;
            if pages > MAX_PAGES {
                return Err(CatalogError::TooManyPages(MAX_PAGES));
            }
            let page = self.get_page(&url).await?;
            if let Some(next) = page.links.next {
                pending.push_back(next);
            }
            for item in page.data {
                match item.attributes.kind.as_str() {
                    "folder" => {
                        if let Some(files) = item.relationships.and_then(|r| r.files) {
                            pending.push_back(files.links.related.href);
                        }
                    }
                    _ => {
                        if let Some(entry) = item_to_entry(item) {
                            entries.push(entry);
                        }
                    }
                }
            }
        }

        Ok(entries)
    }
}

fn item_to_entry(item: OsfItem) -> Option<CatalogEntry> {
    let name = item.attributes.name;
    let Some(parsed) = parse_file_name(&name) else {
        debug!("Skipping file outside the naming scheme: {}", name);
        return None;
    };
    let Some(download) = item.links.download else {
        debug!("Skipping file without download link: {}", name);
        return None;
    };
    Some(CatalogEntry {
        city: parsed.city,
        year: parsed.year,
        data_type: parsed.data_type,
        remote_reference: download,
        file_name: name,
        modified: item
            .attributes
            .date_modified
            .as_deref()
            .and_then(parse_modified),
    })
}

/// OSF reports timestamps both with and without an offset.
fn parse_modified(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

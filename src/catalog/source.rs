use crate::catalog::error::CatalogError;
use crate::error::CrimeDataError;
use crate::types::catalog_entry::{CatalogEntry, CityCoverage};
use crate::types::detail_level::DetailLevel;
use crate::types::request::normalize_city;
use async_trait::async_trait;
use log::{info, warn};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Lists the data files that are available remotely.
///
/// Implemented by [`crate::OsfCatalogSource`] for the published database.
/// Other implementations can serve mirrors or fixed test catalogs.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn list_files(&self) -> Result<Vec<CatalogEntry>, CatalogError>;
}

/// Retrieves the catalog and brings it into canonical form: lowercase city
/// names and at most one entry per `(city, year, data_type)`.
pub async fn fetch_catalog(
    source: &dyn CatalogSource,
    quiet: bool,
) -> Result<Vec<CatalogEntry>, CrimeDataError> {
    if !quiet {
        info!("Retrieving list of available crime data files");
    }
    let entries = source.list_files().await?;

    let mut seen = HashSet::new();
    let mut catalog = Vec::with_capacity(entries.len());
    for mut entry in entries {
        entry.city = normalize_city(&entry.city);
        let (city, year, data_type) = entry.identity();
        if seen.insert((city.to_string(), year, data_type)) {
            catalog.push(entry);
        } else {
            warn!(
                "Ignoring duplicate catalog entry {} ({} {} {})",
                entry.file_name, entry.data_type, entry.city, entry.year
            );
        }
    }

    if !quiet {
        info!("Found {} crime data files", catalog.len());
    }
    Ok(catalog)
}

/// Groups the catalog into the years available per city and detail level,
/// sorted by detail level and then city.
pub(crate) fn summarize_catalog(catalog: &[CatalogEntry]) -> Vec<CityCoverage> {
    let mut coverage: BTreeMap<(DetailLevel, String), BTreeSet<i32>> = BTreeMap::new();
    for entry in catalog {
        coverage
            .entry((entry.data_type, entry.city.clone()))
            .or_default()
            .insert(entry.year);
    }
    coverage
        .into_iter()
        .map(|((data_type, city), years)| CityCoverage {
            data_type,
            city,
            years,
        })
        .collect()
}

//! Defines the catalog records describing the remotely hosted data files.

use crate::types::detail_level::DetailLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One remotely available data file of the Open Crime Database.
///
/// The catalog holds at most one entry per `(city, year, data_type)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Lowercase city name, e.g. `"chicago"` or `"san francisco"`.
    pub city: String,
    /// The calendar year the file covers.
    pub year: i32,
    /// The detail level of the file.
    pub data_type: DetailLevel,
    /// A reference the [`crate::Downloader`] can resolve, usually a download URL.
    pub remote_reference: String,
    /// The file name as published by the storage provider.
    pub file_name: String,
    /// When the provider last reported the file as modified, if known.
    pub modified: Option<DateTime<Utc>>,
}

impl CatalogEntry {
    /// The `(city, year, data_type)` tuple that identifies this entry in the catalog.
    pub fn identity(&self) -> (&str, i32, DetailLevel) {
        (&self.city, self.year, self.data_type)
    }

    /// The name the file is given inside a staging directory.
    ///
    /// Always a plain `.csv`, since the downloader decompresses on the fly.
    pub(crate) fn staged_file_name(&self) -> String {
        format!(
            "{}_{}_{}.csv",
            self.data_type,
            self.city.replace(' ', "_"),
            self.year
        )
    }
}

/// The years the catalog offers for one city at one detail level.
///
/// Returned by [`crate::CrimeData::list_crime_data`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityCoverage {
    pub data_type: DetailLevel,
    pub city: String,
    pub years: BTreeSet<i32>,
}

impl CityCoverage {
    pub fn first_year(&self) -> Option<i32> {
        self.years.first().copied()
    }

    pub fn last_year(&self) -> Option<i32> {
        self.years.last().copied()
    }
}

//! Defines the detail levels the Open Crime Database publishes its data at.

use crate::error::CrimeDataError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Columns every detail level must provide.
const COMMON_COLUMNS: [&str; 7] = [
    "uid",
    "city_name",
    "offense_code",
    "offense_type",
    "offense_group",
    "offense_against",
    "date_single",
];

/// Coordinate columns, required for the core and extended levels.
const COORDINATE_COLUMNS: [&str; 2] = ["longitude", "latitude"];

/// The level of detail of the requested crime data.
///
/// Each remote file holds exactly one detail level, and all files assembled
/// in a single request share it, and therefore share a schema.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    /// A 1% random sample of all offenses. Small enough to download quickly.
    #[default]
    Sample,
    /// All offenses with the harmonized core fields.
    Core,
    /// All offenses with the core fields plus every raw field published by the
    /// city, without harmonization.
    Extended,
}

impl DetailLevel {
    /// All levels, in the order the catalog documents them.
    pub const ALL: [DetailLevel; 3] = [DetailLevel::Sample, DetailLevel::Core, DetailLevel::Extended];

    /// The token used for this level in remote file names and cache keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            DetailLevel::Sample => "sample",
            DetailLevel::Core => "core",
            DetailLevel::Extended => "extended",
        }
    }

    /// Whether files of this level carry `longitude`/`latitude`.
    pub fn has_coordinates(&self) -> bool {
        matches!(self, DetailLevel::Core | DetailLevel::Extended)
    }

    /// The columns a downloaded file of this level must contain to be assembled.
    pub(crate) fn required_columns(&self) -> Vec<&'static str> {
        let mut columns = COMMON_COLUMNS.to_vec();
        if self.has_coordinates() {
            columns.extend(COORDINATE_COLUMNS);
        }
        columns
    }
}

/// Formats a `DetailLevel` using its file name token.
///
/// # Examples
///
/// ```
/// use crimedata::DetailLevel;
///
/// assert_eq!(DetailLevel::Core.to_string(), "core");
/// ```
impl fmt::Display for DetailLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a detail level case-insensitively.
///
/// # Examples
///
/// ```
/// use crimedata::DetailLevel;
///
/// assert_eq!("Extended".parse::<DetailLevel>().unwrap(), DetailLevel::Extended);
/// assert!("full".parse::<DetailLevel>().is_err());
/// ```
impl FromStr for DetailLevel {
    type Err = CrimeDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sample" => Ok(DetailLevel::Sample),
            "core" => Ok(DetailLevel::Core),
            "extended" => Ok(DetailLevel::Extended),
            other => Err(CrimeDataError::InvalidArgument(format!(
                "type must be one of 'sample', 'core' or 'extended', got '{other}'"
            ))),
        }
    }
}

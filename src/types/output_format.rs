use crate::error::CrimeDataError;
use std::fmt;
use std::str::FromStr;

/// The shape of the value returned by [`crate::CrimeData::get_crime_data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    /// A plain polars `DataFrame`.
    #[default]
    Table,
    /// A `DataFrame` paired with one WGS84 point per row.
    Geo,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Table => f.write_str("table"),
            OutputFormat::Geo => f.write_str("geo"),
        }
    }
}

/// Parses an output format case-insensitively. `"df"` is accepted for
/// [`OutputFormat::Table`] and `"sf"` for [`OutputFormat::Geo`].
///
/// # Examples
///
/// ```
/// use crimedata::OutputFormat;
///
/// assert_eq!("Geo".parse::<OutputFormat>().unwrap(), OutputFormat::Geo);
/// assert_eq!("df".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
/// ```
impl FromStr for OutputFormat {
    type Err = CrimeDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "table" | "df" => Ok(OutputFormat::Table),
            "geo" | "sf" => Ok(OutputFormat::Geo),
            other => Err(CrimeDataError::InvalidArgument(format!(
                "output must be 'table' or 'geo', got '{other}'"
            ))),
        }
    }
}

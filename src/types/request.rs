//! Loose user input for a crime data request, and the validated [`DataRequest`]
//! every later stage works from.

use crate::error::CrimeDataError;
use crate::types::detail_level::DetailLevel;
use crate::types::output_format::OutputFormat;
use std::collections::BTreeSet;
use std::fmt;
use std::ops::RangeInclusive;

/// A calendar year.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub struct Year(pub i32);

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

/// The years of a request, as supplied by the caller.
///
/// Accepts single years, collections, inclusive ranges and numeric text.
/// Nothing is checked until [`YearsArg::resolve`], which is where malformed
/// input turns into [`CrimeDataError::InvalidArgument`].
///
/// # Examples
///
/// ```
/// use crimedata::YearsArg;
///
/// let a = YearsArg::from(vec![2019, 2018]).resolve().unwrap();
/// let b = YearsArg::from(2018_i64..=2019).resolve().unwrap();
/// let c = YearsArg::from(vec!["2019", " 2018"]).resolve().unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a, c);
///
/// assert!(YearsArg::from("last year").resolve().is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum YearsArg {
    Integers(Vec<i64>),
    Floats(Vec<f64>),
    Text(Vec<String>),
}

impl YearsArg {
    /// Coerces every value to an `i32` year, deduplicated and sorted.
    pub fn resolve(self) -> Result<BTreeSet<i32>, CrimeDataError> {
        let years: Vec<i32> = match self {
            YearsArg::Integers(values) => values
                .into_iter()
                .map(integer_year)
                .collect::<Result<_, _>>()?,
            YearsArg::Floats(values) => values
                .into_iter()
                .map(|value| {
                    if value.is_finite() && value.fract() == 0.0 {
                        integer_year(value as i64)
                    } else {
                        Err(CrimeDataError::InvalidArgument(format!(
                            "year {value} is not a whole number"
                        )))
                    }
                })
                .collect::<Result<_, _>>()?,
            YearsArg::Text(values) => values
                .iter()
                .map(|value| {
                    value.trim().parse::<i64>().map_err(|_| {
                        CrimeDataError::InvalidArgument(format!(
                            "year '{value}' cannot be converted to an integer"
                        ))
                    })
                })
                .map(|parsed| parsed.and_then(integer_year))
                .collect::<Result<_, _>>()?,
        };

        if years.is_empty() {
            return Err(CrimeDataError::InvalidArgument(
                "years must contain at least one year".to_string(),
            ));
        }
        Ok(years.into_iter().collect())
    }
}

fn integer_year(value: i64) -> Result<i32, CrimeDataError> {
    i32::try_from(value).map_err(|_| {
        CrimeDataError::InvalidArgument(format!("year {value} is out of range"))
    })
}

macro_rules! years_from_integer {
    ($($t:ty),*) => {$(
        impl From<$t> for YearsArg {
            fn from(value: $t) -> Self {
                YearsArg::Integers(vec![i64::from(value)])
            }
        }
        impl From<Vec<$t>> for YearsArg {
            fn from(values: Vec<$t>) -> Self {
                YearsArg::Integers(values.into_iter().map(i64::from).collect())
            }
        }
        impl From<&[$t]> for YearsArg {
            fn from(values: &[$t]) -> Self {
                YearsArg::Integers(values.iter().copied().map(i64::from).collect())
            }
        }
        impl<const N: usize> From<[$t; N]> for YearsArg {
            fn from(values: [$t; N]) -> Self {
                YearsArg::Integers(values.into_iter().map(i64::from).collect())
            }
        }
        impl From<RangeInclusive<$t>> for YearsArg {
            fn from(range: RangeInclusive<$t>) -> Self {
                YearsArg::Integers(range.map(i64::from).collect())
            }
        }
    )*};
}

years_from_integer!(i16, u16, i32, u32, i64);

impl From<Year> for YearsArg {
    fn from(year: Year) -> Self {
        YearsArg::Integers(vec![i64::from(year.0)])
    }
}

impl From<Vec<Year>> for YearsArg {
    fn from(years: Vec<Year>) -> Self {
        YearsArg::Integers(years.into_iter().map(|y| i64::from(y.0)).collect())
    }
}

impl From<f64> for YearsArg {
    fn from(value: f64) -> Self {
        YearsArg::Floats(vec![value])
    }
}

impl From<Vec<f64>> for YearsArg {
    fn from(values: Vec<f64>) -> Self {
        YearsArg::Floats(values)
    }
}

impl From<&str> for YearsArg {
    fn from(value: &str) -> Self {
        YearsArg::Text(vec![value.to_string()])
    }
}

impl From<String> for YearsArg {
    fn from(value: String) -> Self {
        YearsArg::Text(vec![value])
    }
}

impl From<Vec<&str>> for YearsArg {
    fn from(values: Vec<&str>) -> Self {
        YearsArg::Text(values.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for YearsArg {
    fn from(values: Vec<String>) -> Self {
        YearsArg::Text(values)
    }
}

/// The cities of a request, as supplied by the caller. Matching is
/// case-insensitive, so `"Chicago"` and `"chicago"` are the same city.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitiesArg(pub Vec<String>);

impl CitiesArg {
    /// Trims and lowercases every city name.
    pub fn resolve(self) -> Result<BTreeSet<String>, CrimeDataError> {
        if self.0.is_empty() {
            return Err(CrimeDataError::InvalidArgument(
                "cities must contain at least one city name".to_string(),
            ));
        }
        self.0
            .into_iter()
            .map(|city| {
                let normalized = normalize_city(&city);
                if normalized.is_empty() {
                    Err(CrimeDataError::InvalidArgument(
                        "city names must not be blank".to_string(),
                    ))
                } else {
                    Ok(normalized)
                }
            })
            .collect()
    }
}

/// Canonical form of a city name: trimmed, lowercase, single spaces.
pub(crate) fn normalize_city(city: &str) -> String {
    city.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl From<&str> for CitiesArg {
    fn from(city: &str) -> Self {
        CitiesArg(vec![city.to_string()])
    }
}

impl From<String> for CitiesArg {
    fn from(city: String) -> Self {
        CitiesArg(vec![city])
    }
}

impl From<Vec<&str>> for CitiesArg {
    fn from(cities: Vec<&str>) -> Self {
        CitiesArg(cities.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for CitiesArg {
    fn from(cities: Vec<String>) -> Self {
        CitiesArg(cities)
    }
}

impl From<&[&str]> for CitiesArg {
    fn from(cities: &[&str]) -> Self {
        CitiesArg(cities.iter().map(|c| c.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for CitiesArg {
    fn from(cities: [&str; N]) -> Self {
        CitiesArg(cities.iter().map(|c| c.to_string()).collect())
    }
}

/// Which cities a validated request covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CitySelection {
    /// Every city the catalog has for the requested years and detail level.
    All,
    /// An explicit, non-empty set of lowercase city names.
    Only(BTreeSet<String>),
}

impl CitySelection {
    pub fn contains(&self, city: &str) -> bool {
        match self {
            CitySelection::All => true,
            CitySelection::Only(cities) => cities.contains(city),
        }
    }
}

impl fmt::Display for CitySelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CitySelection::All => f.write_str("all cities"),
            CitySelection::Only(cities) => {
                let names: Vec<&str> = cities.iter().map(String::as_str).collect();
                f.write_str(&names.join(", "))
            }
        }
    }
}

/// The per-call switches that do not affect which data is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOptions {
    pub use_cache: bool,
    pub quiet: bool,
    pub output_format: OutputFormat,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            quiet: false,
            output_format: OutputFormat::Table,
        }
    }
}

/// A request that has been checked against the catalog.
///
/// Only [`crate::validate`] builds these, so holding one means every
/// requested year and city exists in the catalog for the requested level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRequest {
    pub(crate) years: BTreeSet<i32>,
    pub(crate) cities: CitySelection,
    pub(crate) data_type: DetailLevel,
    pub(crate) options: RequestOptions,
}

impl DataRequest {
    pub fn years(&self) -> &BTreeSet<i32> {
        &self.years
    }

    pub fn cities(&self) -> &CitySelection {
        &self.cities
    }

    pub fn data_type(&self) -> DetailLevel {
        self.data_type
    }

    pub fn use_cache(&self) -> bool {
        self.options.use_cache
    }

    pub fn quiet(&self) -> bool {
        self.options.quiet
    }

    pub fn output_format(&self) -> OutputFormat {
        self.options.output_format
    }
}

//! Deterministic fingerprints of validated requests.

use crate::types::detail_level::DetailLevel;
use crate::types::request::{normalize_city, CitySelection, DataRequest};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fmt;

/// Stands in for "every city" in the canonical form, since no city name can
/// contain it.
const ALL_CITIES: &str = "*";

/// Identifies the cached result of a request.
///
/// Computed from the detail level, the sorted set of years and the sorted set
/// of lowercase cities, so input order and city case do not matter.
///
/// # Examples
///
/// ```
/// use crimedata::{CacheKey, CitySelection, DetailLevel};
///
/// let a = CacheKey::new(DetailLevel::Core, [2019, 2018], &CitySelection::All);
/// let b = CacheKey::new(DetailLevel::Core, [2018, 2019, 2019], &CitySelection::All);
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(
        data_type: DetailLevel,
        years: impl IntoIterator<Item = i32>,
        cities: &CitySelection,
    ) -> Self {
        let digest = Sha256::digest(canonical_form(data_type, years, cities).as_bytes());
        CacheKey(hex::encode(digest))
    }

    pub fn for_request(request: &DataRequest) -> Self {
        Self::new(
            request.data_type(),
            request.years().iter().copied(),
            request.cities(),
        )
    }

    /// The hex digest, usable as a file name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn canonical_form(
    data_type: DetailLevel,
    years: impl IntoIterator<Item = i32>,
    cities: &CitySelection,
) -> String {
    let years: BTreeSet<i32> = years.into_iter().collect();
    let years: Vec<String> = years.iter().map(i32::to_string).collect();
    let cities = match cities {
        CitySelection::All => ALL_CITIES.to_string(),
        CitySelection::Only(cities) => {
            let cities: BTreeSet<String> = cities.iter().map(|c| normalize_city(c)).collect();
            cities.into_iter().collect::<Vec<_>>().join(",")
        }
    };
    format!("type={data_type};years={};cities={cities}", years.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::request::{CitiesArg, YearsArg};

    fn only(cities: &[&str]) -> CitySelection {
        CitySelection::Only(cities.iter().map(|c| c.to_string()).collect())
    }

    #[test]
    fn test_key_ignores_order_and_case() {
        let a = CacheKey::new(DetailLevel::Core, [2019, 2017], &only(&["Chicago", "detroit"]));
        let b = CacheKey::new(DetailLevel::Core, [2017, 2019], &only(&["DETROIT", "chicago"]));
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_is_type_stable_through_resolution() {
        let from_ints = YearsArg::from(vec![2019_i64, 2018]).resolve().unwrap();
        let from_text = YearsArg::from(vec!["2018", "2019"]).resolve().unwrap();
        let cities = CitySelection::Only(CitiesArg::from("Chicago").resolve().unwrap());
        assert_eq!(
            CacheKey::new(DetailLevel::Sample, from_ints, &cities),
            CacheKey::new(DetailLevel::Sample, from_text, &cities)
        );
    }

    #[test]
    fn test_key_differs_per_field() {
        let base = CacheKey::new(DetailLevel::Core, [2019], &only(&["chicago"]));
        assert_ne!(base, CacheKey::new(DetailLevel::Extended, [2019], &only(&["chicago"])));
        assert_ne!(base, CacheKey::new(DetailLevel::Core, [2018], &only(&["chicago"])));
        assert_ne!(base, CacheKey::new(DetailLevel::Core, [2019], &only(&["detroit"])));
        assert_ne!(base, CacheKey::new(DetailLevel::Core, [2019], &CitySelection::All));
        assert_ne!(
            base,
            CacheKey::new(DetailLevel::Core, [2019], &only(&["chicago", "detroit"]))
        );
    }

    #[test]
    fn test_key_is_hex_sha256() {
        let key = CacheKey::new(DetailLevel::Sample, [2020], &CitySelection::All);
        assert_eq!(key.as_str().len(), 64);
        assert!(key.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }
}

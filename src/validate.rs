//! Checks a parsed request against the catalog and selects the files that serve it.

use crate::error::CrimeDataError;
use crate::types::advisory::Advisory;
use crate::types::catalog_entry::CatalogEntry;
use crate::types::detail_level::DetailLevel;
use crate::types::request::{CitySelection, DataRequest, RequestOptions};
use log::warn;
use std::collections::BTreeSet;

/// The outcome of a successful validation.
#[derive(Debug, Clone)]
pub struct Validation {
    pub request: DataRequest,
    /// The catalog entries to download, in catalog order.
    pub entries: Vec<CatalogEntry>,
    /// `(city, year)` combinations of the request without data.
    pub advisories: Vec<Advisory>,
}

/// Validates already-parsed years and cities against the catalog.
///
/// `years` of `None` selects the most recent year the catalog offers at the
/// requested level, and `cities` of `None` selects every city.
///
/// # Errors
///
/// * [`CrimeDataError::NoMatchingData`] if no years were given and the catalog has
///   nothing at the requested level, or if nothing matches the years and cities
///   taken together.
/// * [`CrimeDataError::YearsUnavailable`] if a year has no files at the requested
///   level. Its `available` list is empty when the level has no files at all.
/// * [`CrimeDataError::CitiesUnavailable`] if a city has no files at the requested level.
pub fn validate(
    years: Option<BTreeSet<i32>>,
    cities: Option<BTreeSet<String>>,
    data_type: DetailLevel,
    options: RequestOptions,
    catalog: &[CatalogEntry],
) -> Result<Validation, CrimeDataError> {
    let of_type: Vec<&CatalogEntry> = catalog
        .iter()
        .filter(|entry| entry.data_type == data_type)
        .collect();

    let available_years: BTreeSet<i32> = of_type.iter().map(|entry| entry.year).collect();
    let available_cities: BTreeSet<&str> = of_type.iter().map(|entry| entry.city.as_str()).collect();

    let years = match (years, available_years.last()) {
        (Some(years), _) => years,
        (None, Some(&latest_year)) => BTreeSet::from([latest_year]),
        (None, None) => {
            return Err(CrimeDataError::NoMatchingData {
                data_type,
                years: Vec::new(),
                cities: cities
                    .map(|c| CitySelection::Only(c).to_string())
                    .unwrap_or_else(|| CitySelection::All.to_string()),
            });
        }
    };
    let missing_years: Vec<i32> = years.difference(&available_years).copied().collect();
    if !missing_years.is_empty() {
        return Err(CrimeDataError::YearsUnavailable {
            data_type,
            years: missing_years,
            available: available_years.into_iter().collect(),
        });
    }

    let cities = match cities {
        None => CitySelection::All,
        Some(cities) => {
            let missing_cities: Vec<String> = cities
                .iter()
                .filter(|city| !available_cities.contains(city.as_str()))
                .cloned()
                .collect();
            if !missing_cities.is_empty() {
                return Err(CrimeDataError::CitiesUnavailable {
                    data_type,
                    cities: missing_cities,
                });
            }
            CitySelection::Only(cities)
        }
    };

    let entries: Vec<CatalogEntry> = of_type
        .into_iter()
        .filter(|entry| years.contains(&entry.year) && cities.contains(&entry.city))
        .cloned()
        .collect();
    if entries.is_empty() {
        return Err(CrimeDataError::NoMatchingData {
            data_type,
            years: years.into_iter().collect(),
            cities: cities.to_string(),
        });
    }

    let advisories = missing_combinations(&years, &cities, &entries);
    if !options.quiet {
        for advisory in &advisories {
            warn!("{advisory}");
        }
    }

    Ok(Validation {
        request: DataRequest {
            years,
            cities,
            data_type,
            options,
        },
        entries,
        advisories,
    })
}

/// Every `(city, year)` of an explicit city list that no selected entry covers.
fn missing_combinations(
    years: &BTreeSet<i32>,
    cities: &CitySelection,
    entries: &[CatalogEntry],
) -> Vec<Advisory> {
    let CitySelection::Only(cities) = cities else {
        return Vec::new();
    };
    let mut advisories = Vec::new();
    for city in cities {
        for &year in years {
            let covered = entries
                .iter()
                .any(|entry| entry.city == *city && entry.year == year);
            if !covered {
                advisories.push(Advisory {
                    city: city.clone(),
                    year,
                });
            }
        }
    }
    advisories
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{entry, sample_catalog};

    fn years(values: &[i32]) -> Option<BTreeSet<i32>> {
        Some(values.iter().copied().collect())
    }

    fn cities(values: &[&str]) -> Option<BTreeSet<String>> {
        Some(values.iter().map(|c| c.to_string()).collect())
    }

    #[test]
    fn test_defaults_to_latest_year_and_all_cities() -> Result<(), CrimeDataError> {
        let catalog = sample_catalog();
        let validation = validate(
            None,
            None,
            DetailLevel::Sample,
            RequestOptions::default(),
            &catalog,
        )?;

        let request = &validation.request;
        assert_eq!(request.data_type(), DetailLevel::Sample);
        assert_eq!(request.years().iter().copied().collect::<Vec<_>>(), vec![2019]);
        assert_eq!(request.cities(), &CitySelection::All);
        assert!(validation.entries.iter().all(|e| e.year == 2019));
        assert!(validation.entries.len() > 1);
        assert!(validation.advisories.is_empty());
        Ok(())
    }

    #[test]
    fn test_partial_coverage_produces_advisory() -> Result<(), CrimeDataError> {
        let catalog = sample_catalog();
        let validation = validate(
            years(&[2019]),
            cities(&["chicago", "detroit"]),
            DetailLevel::Core,
            RequestOptions::default(),
            &catalog,
        )?;

        assert_eq!(validation.entries.len(), 1);
        assert_eq!(validation.entries[0].city, "chicago");
        assert_eq!(
            validation.advisories,
            vec![Advisory {
                city: "detroit".to_string(),
                year: 2019
            }]
        );
        Ok(())
    }

    #[test]
    fn test_unknown_year_is_rejected() {
        let catalog = sample_catalog();
        let result = validate(
            years(&[2019, 2099]),
            None,
            DetailLevel::Core,
            RequestOptions::default(),
            &catalog,
        );
        match result {
            Err(CrimeDataError::YearsUnavailable { years, .. }) => assert_eq!(years, vec![2099]),
            other => panic!("expected YearsUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_city_is_rejected() {
        let catalog = sample_catalog();
        let result = validate(
            years(&[2019]),
            cities(&["chicago", "gotham"]),
            DetailLevel::Core,
            RequestOptions::default(),
            &catalog,
        );
        match result {
            Err(CrimeDataError::CitiesUnavailable { cities, .. }) => {
                assert_eq!(cities, vec!["gotham".to_string()])
            }
            other => panic!("expected CitiesUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_cross_product_is_rejected() {
        // 2019 and detroit both exist, just never together
        let catalog = vec![
            entry(DetailLevel::Core, "chicago", 2019),
            entry(DetailLevel::Core, "detroit", 2018),
        ];
        let result = validate(
            years(&[2019]),
            cities(&["detroit"]),
            DetailLevel::Core,
            RequestOptions::default(),
            &catalog,
        );
        assert!(matches!(result, Err(CrimeDataError::NoMatchingData { .. })));
    }

    #[test]
    fn test_level_without_files_is_rejected() {
        let catalog = vec![entry(DetailLevel::Core, "chicago", 2019)];
        let result = validate(
            None,
            None,
            DetailLevel::Extended,
            RequestOptions::default(),
            &catalog,
        );
        assert!(matches!(result, Err(CrimeDataError::NoMatchingData { .. })));
    }

    #[test]
    fn test_explicit_year_at_empty_level_lists_no_available_years() {
        let catalog = vec![entry(DetailLevel::Core, "chicago", 2019)];
        let result = validate(
            years(&[2099]),
            None,
            DetailLevel::Extended,
            RequestOptions::default(),
            &catalog,
        );
        match result {
            Err(CrimeDataError::YearsUnavailable {
                data_type,
                years,
                available,
            }) => {
                assert_eq!(data_type, DetailLevel::Extended);
                assert_eq!(years, vec![2099]);
                assert!(available.is_empty());
            }
            other => panic!("expected YearsUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn test_years_are_checked_per_level() {
        // 2016 exists for sample data only
        let catalog = vec![
            entry(DetailLevel::Sample, "chicago", 2016),
            entry(DetailLevel::Core, "chicago", 2019),
        ];
        let result = validate(
            years(&[2016]),
            None,
            DetailLevel::Core,
            RequestOptions::default(),
            &catalog,
        );
        assert!(matches!(result, Err(CrimeDataError::YearsUnavailable { .. })));
    }
}

//! Parses the naming scheme of Open Crime Database files,
//! `crime_open_database_<type>_<city>_<year>.csv[.gz]`.

use crate::types::detail_level::DetailLevel;

const FILE_PREFIX: &str = "crime_open_database_";
const FILE_EXTENSIONS: [&str; 2] = [".csv.gz", ".csv"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedFileName {
    pub data_type: DetailLevel,
    pub city: String,
    pub year: i32,
}

/// Returns `None` for files outside the naming scheme, such as codebooks.
pub(crate) fn parse_file_name(name: &str) -> Option<ParsedFileName> {
    let lower = name.trim().to_lowercase();
    let stem = lower.strip_prefix(FILE_PREFIX)?;
    let stem = FILE_EXTENSIONS
        .iter()
        .find_map(|extension| stem.strip_suffix(extension))?;

    let (data_type, rest) = stem.split_once('_')?;
    let data_type = data_type.parse::<DetailLevel>().ok()?;

    let (city, year) = rest.rsplit_once('_')?;
    if year.len() != 4 {
        return None;
    }
    let year = year.parse::<i32>().ok()?;

    let city = city
        .split('_')
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if city.is_empty() {
        return None;
    }

    Some(ParsedFileName {
        data_type,
        city,
        year,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_core_file() {
        let parsed = parse_file_name("crime_open_database_core_chicago_2019.csv.gz").unwrap();
        assert_eq!(parsed.data_type, DetailLevel::Core);
        assert_eq!(parsed.city, "chicago");
        assert_eq!(parsed.year, 2019);
    }

    #[test]
    fn test_parse_multi_word_city_and_case() {
        let parsed =
            parse_file_name("Crime_Open_Database_Extended_San_Francisco_2017.csv").unwrap();
        assert_eq!(parsed.data_type, DetailLevel::Extended);
        assert_eq!(parsed.city, "san francisco");
        assert_eq!(parsed.year, 2017);
    }

    #[test]
    fn test_skip_foreign_files() {
        assert_eq!(parse_file_name("code_codebook.pdf"), None);
        assert_eq!(parse_file_name("crime_open_database_core_chicago_2019.Rds"), None);
        assert_eq!(parse_file_name("crime_open_database_raw_chicago_2019.csv"), None);
        assert_eq!(parse_file_name("crime_open_database_core_chicago_19.csv"), None);
        assert_eq!(parse_file_name("crime_open_database_core_2019.csv"), None);
    }
}

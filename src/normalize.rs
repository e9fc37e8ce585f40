//! Coerces assembled crime data to its canonical column types.

use crate::types::crime_frame::{CrimeFrame, GeoCrimeFrame, WGS84};
use crate::types::output_format::OutputFormat;
use geo::Point;
use polars::prelude::*;

const CATEGORICAL_COLUMNS: [&str; 7] = [
    "city_name",
    "offense_code",
    "offense_type",
    "offense_group",
    "offense_against",
    "location_type",
    "location_category",
];

const DATETIME_COLUMNS: [&str; 3] = ["date_single", "date_start", "date_end"];

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Normalizes the columns of `frame` and shapes it as `output` asks.
///
/// Running it on already normalized data changes nothing.
///
/// # Errors
///
/// Fails with [`PolarsError::ColumnNotFound`] when `output` is
/// [`OutputFormat::Geo`] and the frame has no `longitude`/`latitude`.
pub fn normalize(frame: DataFrame, output: OutputFormat) -> PolarsResult<CrimeFrame> {
    let frame = normalize_columns(frame)?;
    match output {
        OutputFormat::Table => Ok(CrimeFrame::Table(frame)),
        OutputFormat::Geo => to_geo(frame).map(CrimeFrame::Geo),
    }
}

/// Casts the offense classification and location columns to `Categorical`
/// and parses text timestamps to millisecond datetimes. Columns that are
/// absent are left alone, and timestamps that do not parse become null.
pub fn normalize_columns(frame: DataFrame) -> PolarsResult<DataFrame> {
    let mut exprs = Vec::new();
    for name in CATEGORICAL_COLUMNS {
        if frame.column(name).is_ok() {
            exprs.push(col(name).cast(DataType::Categorical(None, Default::default())));
        }
    }
    for name in DATETIME_COLUMNS {
        let is_text = frame
            .column(name)
            .map(|column| column.dtype() == &DataType::String)
            .unwrap_or(false);
        if is_text {
            exprs.push(parse_datetime(name));
        }
    }

    if exprs.is_empty() {
        return Ok(frame);
    }
    frame.lazy().with_columns(exprs).collect()
}

fn parse_datetime(name: &str) -> Expr {
    col(name).str().to_datetime(
        Some(TimeUnit::Milliseconds),
        None,
        StrptimeOptions {
            format: Some(DATETIME_FORMAT.into()),
            strict: false,
            exact: true,
            cache: true,
        },
        lit("raise"),
    )
}

/// Pairs every row with a WGS84 point built from `longitude` and `latitude`.
pub fn to_geo(frame: DataFrame) -> PolarsResult<GeoCrimeFrame> {
    let longitude = frame.column("longitude")?.cast(&DataType::Float64)?;
    let latitude = frame.column("latitude")?.cast(&DataType::Float64)?;

    let geometry = longitude
        .f64()?
        .iter()
        .zip(latitude.f64()?.iter())
        .map(|coordinates| match coordinates {
            (Some(x), Some(y)) => Some(Point::new(x, y)),
            _ => None,
        })
        .collect();

    Ok(GeoCrimeFrame {
        frame,
        geometry,
        crs: WGS84.to_string(),
    })
}

use crate::cache::key::CacheKey;
use crate::types::advisory::Advisory;
use geo::Point;
use polars::prelude::DataFrame;

/// The coordinate reference system of the `longitude`/`latitude` columns.
pub const WGS84: &str = "EPSG:4326";

/// A frame of offenses with one point geometry per row.
///
/// `geometry[i]` is `Point(longitude, latitude)` of row `i`, or `None` where
/// either coordinate is missing. The coordinate columns stay in `frame`.
#[derive(Debug, Clone)]
pub struct GeoCrimeFrame {
    pub frame: DataFrame,
    pub geometry: Vec<Option<Point<f64>>>,
    pub crs: String,
}

impl GeoCrimeFrame {
    /// Rows with both coordinates present.
    pub fn located(&self) -> usize {
        self.geometry.iter().flatten().count()
    }
}

/// The data returned for a request, shaped by its [`crate::OutputFormat`].
#[derive(Debug, Clone)]
pub enum CrimeFrame {
    Table(DataFrame),
    Geo(GeoCrimeFrame),
}

impl CrimeFrame {
    /// The tabular data, regardless of output format.
    pub fn frame(&self) -> &DataFrame {
        match self {
            CrimeFrame::Table(frame) => frame,
            CrimeFrame::Geo(geo) => &geo.frame,
        }
    }

    pub fn into_frame(self) -> DataFrame {
        match self {
            CrimeFrame::Table(frame) => frame,
            CrimeFrame::Geo(geo) => geo.frame,
        }
    }

    pub fn as_geo(&self) -> Option<&GeoCrimeFrame> {
        match self {
            CrimeFrame::Geo(geo) => Some(geo),
            CrimeFrame::Table(_) => None,
        }
    }

    pub fn height(&self) -> usize {
        self.frame().height()
    }
}

/// Everything [`crate::CrimeData::get_crime_data`] produces for one request.
#[derive(Debug, Clone)]
pub struct CrimeDataResponse {
    pub data: CrimeFrame,
    /// `(city, year)` combinations that were requested but have no data.
    pub advisories: Vec<Advisory>,
    /// Whether the data came from the cache instead of a download.
    pub cache_hit: bool,
    /// The cache key the data is stored under.
    pub key: CacheKey,
}

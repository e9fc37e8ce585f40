//! Offline fakes shared by the unit tests.

use crate::catalog::error::CatalogError;
use crate::catalog::source::CatalogSource;
use crate::fetch::downloader::Downloader;
use crate::fetch::error::DownloadError;
use crate::types::catalog_entry::CatalogEntry;
use crate::types::detail_level::DetailLevel;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread::{self, ThreadId};
use std::time::Duration;

pub(crate) fn entry(data_type: DetailLevel, city: &str, year: i32) -> CatalogEntry {
    CatalogEntry {
        city: city.to_string(),
        year,
        data_type,
        remote_reference: format!("memory://{data_type}/{}/{year}", city.trim()),
        file_name: format!(
            "crime_open_database_{data_type}_{}_{year}.csv.gz",
            city.trim().replace(' ', "_")
        ),
        modified: None,
    }
}

/// Sample data for chicago and detroit in 2018 and 2019, core data for
/// chicago in both years but for detroit only in 2018.
pub(crate) fn sample_catalog() -> Vec<CatalogEntry> {
    vec![
        entry(DetailLevel::Sample, "chicago", 2018),
        entry(DetailLevel::Sample, "chicago", 2019),
        entry(DetailLevel::Sample, "detroit", 2018),
        entry(DetailLevel::Sample, "detroit", 2019),
        entry(DetailLevel::Core, "chicago", 2018),
        entry(DetailLevel::Core, "chicago", 2019),
        entry(DetailLevel::Core, "detroit", 2018),
    ]
}

/// A CSV file of the given level with one offense per uid, in the given order.
pub(crate) fn crime_csv(data_type: DetailLevel, city: &str, year: i32, uids: &[i64]) -> String {
    let mut header = data_type.required_columns();
    if data_type == DetailLevel::Extended {
        header.push("location_type");
    }
    let mut csv = header.join(",");
    csv.push('\n');
    for (i, uid) in uids.iter().enumerate() {
        let mut row = vec![
            uid.to_string(),
            city.to_string(),
            "13A".to_string(),
            "aggravated assault".to_string(),
            "assault offenses".to_string(),
            "persons".to_string(),
            format!("{year}-0{}-1{} 1{}:30", i % 9 + 1, i % 10, i % 10),
        ];
        if data_type.has_coordinates() {
            row.push(format!("-87.{}", uid.rem_euclid(1000)));
            row.push(format!("41.{}", uid.rem_euclid(1000)));
        }
        if data_type == DetailLevel::Extended {
            row.push("residence/home".to_string());
        }
        csv.push_str(&row.join(","));
        csv.push('\n');
    }
    csv
}

pub(crate) struct FakeCatalog {
    entries: Vec<CatalogEntry>,
    fail: bool,
    calls: AtomicUsize,
}

impl FakeCatalog {
    pub(crate) fn new(entries: Vec<CatalogEntry>) -> Self {
        Self {
            entries,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            entries: Vec::new(),
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogSource for FakeCatalog {
    async fn list_files(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(CatalogError::Source("catalog offline".to_string()));
        }
        Ok(self.entries.clone())
    }
}

/// Serves CSV text keyed by `remote_reference` and counts downloads.
#[derive(Default)]
pub(crate) struct FakeDownloader {
    files: HashMap<String, String>,
    failing: HashSet<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl FakeDownloader {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Serves every entry of `catalog` with two offenses, uids given out of order.
    pub(crate) fn serving(catalog: &[CatalogEntry]) -> Self {
        catalog
            .iter()
            .enumerate()
            .fold(Self::new(), |downloader, (i, entry)| {
                let base = (i as i64 + 1) * 10;
                let csv = crime_csv(entry.data_type, &entry.city, entry.year, &[base + 2, base + 1]);
                downloader.with_file(entry, csv)
            })
    }

    pub(crate) fn with_file(mut self, entry: &CatalogEntry, csv: impl Into<String>) -> Self {
        self.files.insert(entry.remote_reference.clone(), csv.into());
        self
    }

    pub(crate) fn with_failure(mut self, entry: &CatalogEntry) -> Self {
        self.failing.insert(entry.remote_reference.clone());
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Downloader for FakeDownloader {
    async fn download(
        &self,
        entry: &CatalogEntry,
        destination: &Path,
    ) -> Result<u64, DownloadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let reference = &entry.remote_reference;
        if self.failing.contains(reference) {
            return Err(DownloadError::NotFound(reference.clone()));
        }
        let Some(csv) = self.files.get(reference) else {
            return Err(DownloadError::NotFound(reference.clone()));
        };
        tokio::fs::write(destination, csv)
            .await
            .map_err(|e| DownloadError::FileWrite(destination.to_path_buf(), e))?;
        Ok(csv.len() as u64)
    }
}

/// Records every log line together with the thread that emitted it, so a
/// test on a current-thread runtime can look at its own records only.
struct CapturingLogger {
    records: Mutex<Vec<(ThreadId, log::Level, String)>>,
}

static LOGGER: CapturingLogger = CapturingLogger {
    records: Mutex::new(Vec::new()),
};

impl log::Log for CapturingLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((thread::current().id(), record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}

/// Installs the capturing logger (once per process) and returns a handle
/// over the records the calling thread emits from now on.
pub(crate) fn capture_logs() -> LogCapture {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(log::LevelFilter::Trace);
    let thread = thread::current().id();
    let start = LOGGER
        .records
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .len();
    LogCapture { thread, start }
}

pub(crate) struct LogCapture {
    thread: ThreadId,
    start: usize,
}

impl LogCapture {
    /// Records at `level` or more severe, emitted on this thread since capture began.
    pub(crate) fn at_least(&self, level: log::Level) -> Vec<String> {
        LOGGER
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .skip(self.start)
            .filter(|(thread, record_level, _)| *thread == self.thread && *record_level <= level)
            .map(|(_, record_level, message)| format!("{record_level} {message}"))
            .collect()
    }
}

use crate::fetch::downloader::Downloader;
use crate::fetch::error::{AssemblyError, DownloadError, FetchError};
use crate::types::catalog_entry::CatalogEntry;
use crate::types::detail_level::DetailLevel;
use log::{info, warn};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tokio::task;

const STAGING_PREFIX: &str = "crimedata-staging-";

/// Downloads every entry into a staging directory and stacks the files into
/// one frame sorted by `uid`.
///
/// The staging directory is removed when this returns, whether it succeeded
/// or not. On error nothing is returned, so no partial result can be cached.
pub(crate) async fn fetch_and_assemble(
    entries: &[CatalogEntry],
    data_type: DetailLevel,
    downloader: &dyn Downloader,
    quiet: bool,
) -> Result<DataFrame, FetchError> {
    if entries.is_empty() {
        return Err(AssemblyError::NoFiles.into());
    }

    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir()
        .map_err(DownloadError::StagingDir)?;

    let total = entries.len();
    let mut staged = Vec::with_capacity(total);
    for (i, entry) in entries.iter().enumerate() {
        if !quiet {
            info!(
                "Downloading {} data for {} in {} ({}/{})",
                entry.data_type,
                entry.city,
                entry.year,
                i + 1,
                total
            );
        }
        let destination = staging.path().join(entry.staged_file_name());
        if let Err(e) = downloader.download(entry, &destination).await {
            warn!("Download of {} failed: {}", entry.file_name, e);
            return Err(e.into());
        }
        staged.push((entry.file_name.clone(), destination));
    }

    if !quiet {
        info!("Assembling {} {} data file(s)", total, data_type);
    }
    let frame = task::spawn_blocking(move || combine(staged, data_type))
        .await
        .map_err(AssemblyError::from)??;

    drop(staging);
    Ok(frame)
}

/// Reads a staged file with every column as text, so that files of one level
/// always agree on their dtypes.
fn read_staged_csv(path: &Path) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|options| {
            options.with_null_values(Some(NullValues::AllColumnsSingle("NA".into())))
        })
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
}

fn column_names(frame: &DataFrame) -> Vec<String> {
    frame
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}

fn check_required_columns(
    file: &str,
    names: &[String],
    data_type: DetailLevel,
) -> Result<(), AssemblyError> {
    let missing: Vec<String> = data_type
        .required_columns()
        .into_iter()
        .filter(|required| !names.iter().any(|name| name == required))
        .map(str::to_string)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AssemblyError::MissingColumns {
            file: file.to_string(),
            data_type,
            columns: missing,
        })
    }
}

fn combine(
    staged: Vec<(String, PathBuf)>,
    data_type: DetailLevel,
) -> Result<DataFrame, AssemblyError> {
    let mut files = staged.into_iter();
    let Some((first_file, first_path)) = files.next() else {
        return Err(AssemblyError::NoFiles);
    };

    let mut stacked = read_staged_csv(&first_path).map_err(|source| AssemblyError::CsvRead {
        file: first_file.clone(),
        source,
    })?;
    let first_names = column_names(&stacked);
    check_required_columns(&first_file, &first_names, data_type)?;

    for (file, path) in files {
        let frame = read_staged_csv(&path).map_err(|source| AssemblyError::CsvRead {
            file: file.clone(),
            source,
        })?;
        let names = column_names(&frame);
        check_required_columns(&file, &names, data_type)?;

        let same_columns =
            names.len() == first_names.len() && first_names.iter().all(|n| names.contains(n));
        if !same_columns {
            return Err(AssemblyError::SchemaMismatch {
                file,
                first_file: first_file.clone(),
            });
        }

        let aligned = frame
            .select(first_names.iter().map(String::as_str))
            .map_err(AssemblyError::Combine)?;
        stacked.vstack_mut(&aligned).map_err(AssemblyError::Combine)?;
    }

    cast_and_sort(stacked, data_type).map_err(AssemblyError::Combine)
}

fn cast_and_sort(frame: DataFrame, data_type: DetailLevel) -> PolarsResult<DataFrame> {
    let mut casts = vec![col("uid").strict_cast(DataType::Int64)];
    if data_type.has_coordinates() {
        casts.push(col("longitude").strict_cast(DataType::Float64));
        casts.push(col("latitude").strict_cast(DataType::Float64));
    }
    frame
        .lazy()
        .with_columns(casts)
        .sort(
            ["uid"],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .collect()
}

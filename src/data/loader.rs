//! CSV Data Loader Module
//! Decodes legacy-encoded CSV files and loads them into Polars, with a
//! process-wide cache keyed by path and file signature.

use encoding_rs::Encoding;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use polars::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Instant, SystemTime};
use thiserror::Error;

/// Default encoding label of the published population files.
pub const DEFAULT_ENCODING: &str = "euc-kr";
/// Default name of the region column.
pub const DEFAULT_REGION_COLUMN: &str = "행정구역";

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unknown text encoding: {0}")]
    UnknownEncoding(String),
    #[error("{path} is not valid {encoding} text")]
    Decode { path: PathBuf, encoding: String },
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error("Region column '{0}' not found")]
    MissingRegionColumn(String),
}

/// A loaded population table. Read-only after load.
#[derive(Debug, Clone)]
pub struct PopulationTable {
    df: DataFrame,
    region_column: String,
    source: PathBuf,
}

impl PopulationTable {
    /// Wrap an existing DataFrame, checking that the region column exists.
    pub fn from_dataframe(
        df: DataFrame,
        region_column: &str,
        source: impl Into<PathBuf>,
    ) -> Result<Self, ReadError> {
        if df.column(region_column).is_err() {
            return Err(ReadError::MissingRegionColumn(region_column.to_string()));
        }
        Ok(Self {
            df,
            region_column: region_column.to_string(),
            source: source.into(),
        })
    }

    /// Get list of column names in table order.
    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Distinct region values in order of first appearance.
    pub fn regions(&self) -> Vec<String> {
        let Ok(column) = self.df.column(&self.region_column) else {
            return Vec::new();
        };

        let mut seen = std::collections::HashSet::new();
        (0..column.len())
            .filter_map(|i| column.get(i).ok().and_then(|v| cell_text(&v)))
            .filter(|region| seen.insert(region.clone()))
            .collect()
    }

    pub fn row_count(&self) -> usize {
        self.df.height()
    }

    pub fn region_column(&self) -> &str {
        &self.region_column
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }
}

/// Text of a string-like cell, `None` for nulls.
pub(crate) fn cell_text(value: &AnyValue) -> Option<String> {
    match value {
        AnyValue::Null => None,
        AnyValue::String(s) => Some(s.to_string()),
        AnyValue::StringOwned(s) => Some(s.to_string()),
        other => Some(other.to_string().trim_matches('"').to_string()),
    }
}

/// Resolve an encoding label such as `euc-kr` or `utf-8`.
pub fn resolve_encoding(label: &str) -> Result<&'static Encoding, ReadError> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| ReadError::UnknownEncoding(label.to_string()))
}

/// Decode raw bytes strictly; malformed sequences are an error.
pub fn decode_text(bytes: &[u8], encoding: &'static Encoding, path: &Path) -> Result<String, ReadError> {
    let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
    if had_errors {
        return Err(ReadError::Decode {
            path: path.to_path_buf(),
            encoding: encoding.name().to_string(),
        });
    }
    Ok(text.into_owned())
}

/// Parse decoded CSV text with Polars.
///
/// The schema is inferred over the whole file so that a stray token makes its
/// column textual instead of being nulled.
pub fn parse_csv(text: String) -> Result<DataFrame, ReadError> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .into_reader_with_file_handle(Cursor::new(text.into_bytes()))
        .finish()?;
    Ok(df)
}

/// Load a population table without caching.
pub fn load_table(path: &Path, encoding: &str, region_column: &str) -> Result<PopulationTable, ReadError> {
    let started = Instant::now();
    let encoding = resolve_encoding(encoding)?;
    let bytes = fs::read(path).map_err(|source| ReadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let text = decode_text(&bytes, encoding, path)?;
    let df = parse_csv(text)?;
    let table = PopulationTable::from_dataframe(df, region_column, path)?;

    tracing::info!(
        path = %path.display(),
        encoding = encoding.name(),
        rows = table.row_count(),
        columns = table.dataframe().width(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Loaded population table"
    );
    Ok(table)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    path: PathBuf,
    encoding: String,
    region_column: String,
}

/// File length and modification time at load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileSignature {
    len: u64,
    modified: Option<SystemTime>,
}

impl FileSignature {
    fn of(path: &Path) -> Result<Self, ReadError> {
        let meta = fs::metadata(path).map_err(|source| ReadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

struct CachedTable {
    signature: FileSignature,
    table: Arc<PopulationTable>,
}

/// Caches loaded tables for the process lifetime, reloading when the file changes.
#[derive(Default)]
pub struct TableCache {
    entries: Mutex<HashMap<CacheKey, CachedTable>>,
}

static GLOBAL_CACHE: Lazy<TableCache> = Lazy::new(TableCache::default);

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide cache.
    pub fn global() -> &'static TableCache {
        &GLOBAL_CACHE
    }

    /// Return the cached table, loading it when absent or stale.
    pub fn load(
        &self,
        path: &Path,
        encoding: &str,
        region_column: &str,
    ) -> Result<Arc<PopulationTable>, ReadError> {
        let canonical = fs::canonicalize(path).map_err(|source| ReadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let key = CacheKey {
            path: canonical,
            encoding: encoding.to_ascii_lowercase(),
            region_column: region_column.to_string(),
        };
        let signature = FileSignature::of(&key.path)?;

        if let Some(cached) = self.entries.lock().get(&key) {
            if cached.signature == signature {
                tracing::debug!(path = %path.display(), "Population table cache hit");
                return Ok(Arc::clone(&cached.table));
            }
            tracing::info!(path = %path.display(), "Population file changed, reloading");
        }

        // Loaded outside the lock; concurrent misses may both load, last one wins.
        let table = Arc::new(load_table(&key.path, encoding, region_column)?);
        self.entries.lock().insert(
            key,
            CachedTable {
                signature,
                table: Arc::clone(&table),
            },
        );
        Ok(table)
    }

    pub fn invalidate_all(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::EUC_KR;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "행정구역,2023년_남_총인구수,2023년_남_0~4세,2023년_여_0~4세\n\
                          서울특별시,\"10,050\",\"10,000\",\"9,500\"\n\
                          부산광역시,120,100,90\n";

    fn write_euc_kr(text: &str) -> NamedTempFile {
        let (bytes, _, had_errors) = EUC_KR.encode(text);
        assert!(!had_errors);
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&bytes).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn loads_euc_kr_file() {
        let file = write_euc_kr(SAMPLE);
        let table = load_table(file.path(), "euc-kr", DEFAULT_REGION_COLUMN).unwrap();

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.regions(), vec!["서울특별시", "부산광역시"]);
        assert!(table
            .column_names()
            .contains(&"2023년_남_0~4세".to_string()));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_table(Path::new("/nonexistent/population.csv"), "euc-kr", "행정구역")
            .unwrap_err();
        assert!(matches!(err, ReadError::Io { .. }));
    }

    #[test]
    fn wrong_encoding_is_decode_error() {
        let file = write_euc_kr(SAMPLE);
        let err = load_table(file.path(), "utf-8", DEFAULT_REGION_COLUMN).unwrap_err();
        assert!(matches!(err, ReadError::Decode { .. }));
    }

    #[test]
    fn unknown_encoding_label() {
        assert!(matches!(
            resolve_encoding("not-an-encoding"),
            Err(ReadError::UnknownEncoding(_))
        ));
        assert_eq!(resolve_encoding("EUC-KR").unwrap().name(), "EUC-KR");
    }

    #[test]
    fn missing_region_column() {
        let file = write_euc_kr(SAMPLE);
        let err = load_table(file.path(), "euc-kr", "지역").unwrap_err();
        assert!(matches!(err, ReadError::MissingRegionColumn(c) if c == "지역"));
    }

    #[test]
    fn cache_reuses_until_file_changes() {
        let mut file = write_euc_kr(SAMPLE);
        let cache = TableCache::new();

        let first = cache.load(file.path(), "euc-kr", DEFAULT_REGION_COLUMN).unwrap();
        let second = cache.load(file.path(), "EUC-KR", DEFAULT_REGION_COLUMN).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);

        let (extra, _, _) = EUC_KR.encode("대구광역시,5,3,2\n");
        file.write_all(&extra).unwrap();
        file.flush().unwrap();

        let third = cache.load(file.path(), "euc-kr", DEFAULT_REGION_COLUMN).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(third.row_count(), 3);

        cache.invalidate_all();
        assert!(cache.is_empty());
    }
}

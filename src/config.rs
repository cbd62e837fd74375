//! Settings file.
//!
//! Settings are grouped into sections; every field has a default so a partial
//! (or missing) file still yields a usable configuration.

use crate::charts::{Locale, Palette, SeriesColor};
use crate::data::loader::{DEFAULT_ENCODING, DEFAULT_REGION_COLUMN};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default settings file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "population_pyramid.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Root settings structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub data: DataSettings,
    #[serde(default)]
    pub display: DisplaySettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Input file settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSettings {
    #[serde(default = "default_csv_path")]
    pub csv_path: PathBuf,
    /// Text encoding label understood by `encoding_rs`.
    #[serde(default = "default_encoding")]
    pub encoding: String,
    #[serde(default = "default_region_column")]
    pub region_column: String,
}

fn default_csv_path() -> PathBuf {
    PathBuf::from("200812_202312_Korean_Annual_Population.csv")
}

fn default_encoding() -> String {
    DEFAULT_ENCODING.to_string()
}

fn default_region_column() -> String {
    DEFAULT_REGION_COLUMN.to_string()
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
            encoding: default_encoding(),
            region_column: default_region_column(),
        }
    }
}

/// Presentation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplaySettings {
    #[serde(default)]
    pub locale: Locale,
    /// Font family searched in the font directories.
    #[serde(default = "default_font_family")]
    pub font_family: String,
    /// Explicit font file; takes precedence over the family search.
    #[serde(default)]
    pub font_path: Option<PathBuf>,
    /// Extra directories searched before the platform font directories.
    #[serde(default)]
    pub font_dirs: Vec<PathBuf>,
    #[serde(default = "default_true")]
    pub show_trend: bool,
    #[serde(default = "default_male_color")]
    pub male_color: SeriesColor,
    #[serde(default = "default_female_color")]
    pub female_color: SeriesColor,
}

fn default_font_family() -> String {
    "NanumGothic".to_string()
}

fn default_true() -> bool {
    true
}

fn default_male_color() -> SeriesColor {
    SeriesColor::BLUE
}

fn default_female_color() -> SeriesColor {
    SeriesColor::RED
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            locale: Locale::default(),
            font_family: default_font_family(),
            font_path: None,
            font_dirs: Vec::new(),
            show_trend: true,
            male_color: default_male_color(),
            female_color: default_female_color(),
        }
    }
}

impl DisplaySettings {
    pub fn palette(&self) -> Palette {
        Palette {
            male: self.male_color,
            female: self.female_color,
            ..Palette::default()
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Filter used when `RUST_LOG` is not set.
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load settings, using defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Write settings as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_published_file() {
        let settings = Settings::default();
        assert_eq!(settings.data.encoding, "euc-kr");
        assert_eq!(settings.data.region_column, "행정구역");
        assert_eq!(settings.display.locale, Locale::Korean);
        assert!(settings.display.show_trend);
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let settings: Settings = serde_json::from_str(
            r#"{ "data": { "encoding": "utf-8" }, "display": { "locale": "ko-en", "male_color": [0, 0, 255] } }"#,
        )
        .unwrap();
        assert_eq!(settings.data.encoding, "utf-8");
        assert_eq!(settings.data.region_column, "행정구역");
        assert_eq!(settings.display.locale, Locale::Bilingual);
        assert_eq!(settings.display.palette().male, SeriesColor(0, 0, 255));
        assert_eq!(settings.display.palette().female, SeriesColor::RED);
    }

    #[test]
    fn save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");

        let mut settings = Settings::default();
        settings.display.font_family = "Noto Sans KR".into();
        settings.save(&path).unwrap();

        assert_eq!(Settings::load(&path).unwrap(), settings);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load_or_default(&dir.path().join("absent.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn invalid_json_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Settings::load(&path), Err(ConfigError::Parse(_))));
    }
}

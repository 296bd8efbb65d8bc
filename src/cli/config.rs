//! TOML conversion config.
//!
//! ```toml
//! # conversion.toml
//! metadata_file = "subject.json"
//!
//! [output]
//! path = "session.nwb"
//! overwrite = false
//! compression = "zstd"
//! compression_level = 9
//!
//! [metadata.NWBFile]
//! session_start_time = "2021-06-01T09:00:00+00:00"
//!
//! [audio]
//! file_paths = ["trial1.wav", "trial2.wav"]
//!
//! [audio.options]
//! starting_times = [0.0, 20.0]
//! write_as = "stimulus"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use nwbconv::metadata::{load_dict_from_file, load_dict_from_str, MetadataDocument, MetadataFileFormat};

/// Root configuration structure for conversion config files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// JSON or TOML metadata file, merged before the inline overrides.
    pub metadata_file: Option<PathBuf>,

    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,

    /// Inline metadata overrides.
    #[serde(default)]
    pub metadata: toml::Table,

    /// Audio source.
    pub audio: Option<AudioConfig>,
}

/// Configuration of the output file.
#[derive(Debug, Default, Deserialize)]
pub struct OutputConfig {
    /// Destination path.
    pub path: Option<PathBuf>,

    /// Replace an existing file instead of appending.
    #[serde(default)]
    pub overwrite: bool,

    /// Codec for every dataset (zstd, snappy, gzip, lz4, uncompressed).
    pub compression: Option<String>,

    /// Codec level, where the codec has one.
    pub compression_level: Option<i32>,
}

/// Configuration of the audio interface.
#[derive(Debug, Default, Deserialize)]
pub struct AudioConfig {
    /// WAV files, one series each.
    pub file_paths: Vec<PathBuf>,

    /// Conversion options passed to the interface.
    #[serde(default)]
    pub options: toml::Table,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Metadata overrides: the metadata file, then the inline table.
    ///
    /// A relative `metadata_file` is resolved against `base_dir`.
    pub fn metadata_overrides(&self, base_dir: &Path) -> Result<MetadataDocument> {
        let mut metadata = match &self.metadata_file {
            Some(file) => {
                let file = base_dir.join(file);
                load_dict_from_file(&file)
                    .with_context(|| format!("Failed to load metadata file: {}", file.display()))?
            }
            None => MetadataDocument::new(),
        };

        let inline = toml::to_string(&self.metadata).context("Failed to re-encode inline metadata")?;
        metadata.deep_update(&load_dict_from_str(&inline, MetadataFileFormat::Toml)?);
        Ok(metadata)
    }
}

impl AudioConfig {
    /// Conversion options as a JSON mapping.
    pub fn conversion_options(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(&self.options).context("Invalid audio options")? {
            Value::Object(options) => Ok(options),
            _ => anyhow::bail!("audio options must be a table"),
        }
    }
}

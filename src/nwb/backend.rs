use std::collections::BTreeMap;

use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::file::{dataset_location, NwbFile};
use super::series::TimeSeries;
use super::NwbError;

/// Upper bound on the default chunk length, in frames
pub const DEFAULT_CHUNK_FRAMES: usize = 10_000;

/// Default zstd level
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Compression codec for one dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionMethod {
    /// Zstandard
    Zstd,
    /// Snappy
    Snappy,
    /// Gzip
    Gzip,
    /// LZ4 (raw block format)
    Lz4,
    /// No compression
    Uncompressed,
}

impl CompressionMethod {
    /// Every selectable method
    pub const AVAILABLE: [CompressionMethod; 5] = [
        Self::Zstd,
        Self::Snappy,
        Self::Gzip,
        Self::Lz4,
        Self::Uncompressed,
    ];

    /// Name as accepted by [`parse`](Self::parse)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Zstd => "zstd",
            Self::Snappy => "snappy",
            Self::Gzip => "gzip",
            Self::Lz4 => "lz4",
            Self::Uncompressed => "uncompressed",
        }
    }

    /// Look up a method by name (case-insensitive)
    pub fn parse(method: &str) -> Result<Self, NwbError> {
        Self::AVAILABLE
            .into_iter()
            .find(|candidate| candidate.as_str().eq_ignore_ascii_case(method))
            .ok_or_else(|| NwbError::UnsupportedCompression {
                method: method.to_string(),
                available: Self::AVAILABLE
                    .iter()
                    .map(|m| m.as_str().to_string())
                    .collect(),
            })
    }

    /// Parquet codec with the given level (methods without levels ignore it)
    pub(crate) fn to_parquet(self, level: Option<i32>) -> Result<Compression, NwbError> {
        Ok(match self {
            Self::Zstd => Compression::ZSTD(match level {
                Some(level) => ZstdLevel::try_new(level)?,
                None => ZstdLevel::default(),
            }),
            Self::Gzip => Compression::GZIP(match level {
                Some(level) => GzipLevel::try_new(u32::try_from(level).map_err(|_| {
                    NwbError::InvalidData(format!("gzip level must be non-negative, got {}", level))
                })?)?,
                None => GzipLevel::default(),
            }),
            Self::Snappy => Compression::SNAPPY,
            Self::Lz4 => Compression::LZ4_RAW,
            Self::Uncompressed => Compression::UNCOMPRESSED,
        })
    }
}

/// Storage settings for one dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetIoConfiguration {
    /// Object id of the owning series
    pub object_id: Uuid,
    /// Dataset location, e.g. `acquisition/ElectricalSeries/data`
    pub location_in_file: String,
    /// `[frames, channels]`
    pub full_shape: [usize; 2],
    /// Frames per chunk (Parquet row group)
    pub chunk_frames: usize,
    /// Codec
    pub compression_method: CompressionMethod,
    /// Codec level, if the codec takes one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression_level: Option<i32>,
}

impl DatasetIoConfiguration {
    /// Default settings for the data of `series` stored at `location_in_file`
    pub fn for_series(location_in_file: &str, series: &TimeSeries) -> Self {
        let frames = series.data.num_frames;
        Self {
            object_id: series.object_id,
            location_in_file: location_in_file.to_string(),
            full_shape: [frames, series.data.num_channels],
            chunk_frames: frames.clamp(1, DEFAULT_CHUNK_FRAMES),
            compression_method: CompressionMethod::Zstd,
            compression_level: Some(DEFAULT_COMPRESSION_LEVEL),
        }
    }

    /// Check chunking against the dataset shape
    pub fn validate(&self) -> Result<(), NwbError> {
        let frames = self.full_shape[0];
        if self.chunk_frames == 0 {
            return Err(NwbError::InvalidData(format!(
                "{}: chunk_frames must be positive",
                self.location_in_file
            )));
        }
        if frames > 0 && self.chunk_frames > frames {
            return Err(NwbError::InvalidData(format!(
                "{}: chunk_frames {} exceeds the {} frames of the dataset",
                self.location_in_file, self.chunk_frames, frames
            )));
        }
        Ok(())
    }
}

/// Storage settings for every dataset of a file, keyed by location
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendConfiguration {
    /// Per-dataset settings
    pub dataset_configurations: BTreeMap<String, DatasetIoConfiguration>,
}

impl BackendConfiguration {
    /// Default settings for every dataset in `nwbfile`
    pub fn from_nwbfile(nwbfile: &NwbFile) -> Self {
        let dataset_configurations = nwbfile
            .series()
            .into_iter()
            .map(|(location, series)| {
                let location_in_file = dataset_location(&location);
                let configuration = DatasetIoConfiguration::for_series(&location_in_file, series);
                (location_in_file, configuration)
            })
            .collect();
        Self {
            dataset_configurations,
        }
    }

    /// Settings for one location
    pub fn get(&self, location_in_file: &str) -> Option<&DatasetIoConfiguration> {
        self.dataset_configurations.get(location_in_file)
    }

    /// Use the same codec for every dataset
    pub fn apply_global_compression(
        &mut self,
        method: &str,
        level: Option<i32>,
    ) -> Result<(), NwbError> {
        let method = CompressionMethod::parse(method)?;
        method.to_parquet(level)?;
        for configuration in self.dataset_configurations.values_mut() {
            configuration.compression_method = method;
            configuration.compression_level = level;
        }
        Ok(())
    }

    /// Check every dataset's chunking
    pub fn validate(&self) -> Result<(), NwbError> {
        self.dataset_configurations
            .values()
            .try_for_each(DatasetIoConfiguration::validate)
    }

    /// Configurations whose location exists in `nwbfile` under a different
    /// object id, already updated with the new id.
    ///
    /// Fails if the file holds a different number of datasets or a dataset
    /// this configuration does not know about.
    pub fn find_locations_requiring_remapping(
        &self,
        nwbfile: &NwbFile,
    ) -> Result<BTreeMap<String, DatasetIoConfiguration>, NwbError> {
        let current = Self::from_nwbfile(nwbfile);
        if current.dataset_configurations.len() != self.dataset_configurations.len() {
            return Err(NwbError::InvalidData(format!(
                "backend configuration has {} datasets but the file has {}",
                self.dataset_configurations.len(),
                current.dataset_configurations.len()
            )));
        }

        let mut remapped = BTreeMap::new();
        for (location, fresh) in current.dataset_configurations {
            let existing = self
                .dataset_configurations
                .get(&location)
                .ok_or_else(|| NwbError::UnknownLocation(location.clone()))?;
            if existing.object_id != fresh.object_id {
                let mut updated = existing.clone();
                updated.object_id = fresh.object_id;
                updated.full_shape = fresh.full_shape;
                remapped.insert(location, updated);
            }
        }
        Ok(remapped)
    }

    /// Copy of this configuration with `remapped` entries substituted
    pub fn build_remapped_backend(
        &self,
        remapped: BTreeMap<String, DatasetIoConfiguration>,
    ) -> Self {
        let mut backend = self.clone();
        backend.dataset_configurations.extend(remapped);
        backend
    }
}

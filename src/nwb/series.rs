use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::NwbError;

/// Neurodata type of a time series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NeurodataType {
    /// Generic time series
    TimeSeries,
    /// Extracellular voltage traces linked to electrodes
    ElectricalSeries,
    /// Sound pressure waveform
    AcousticWaveformSeries,
    /// Intracellular patch-clamp trace
    PatchClampSeries,
}

impl NeurodataType {
    /// Type name as written to the container
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TimeSeries => "TimeSeries",
            Self::ElectricalSeries => "ElectricalSeries",
            Self::AcousticWaveformSeries => "AcousticWaveformSeries",
            Self::PatchClampSeries => "PatchClampSeries",
        }
    }
}

/// Sample matrix of a time series, stored frame-major.
///
/// `values[frame * num_channels + channel]`. Only the shape is part of the
/// serialized hierarchy; the values live in the Parquet dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesData {
    /// Number of frames (rows)
    pub num_frames: usize,
    /// Number of channels (columns)
    pub num_channels: usize,
    /// Sample values
    #[serde(skip)]
    pub values: Vec<f64>,
}

impl SeriesData {
    /// Build from frame-major values
    pub fn new(num_channels: usize, values: Vec<f64>) -> Result<Self, NwbError> {
        if num_channels == 0 {
            return Err(NwbError::InvalidData(
                "a time series needs at least one channel".to_string(),
            ));
        }
        if values.len() % num_channels != 0 {
            return Err(NwbError::InvalidData(format!(
                "{} values cannot be split into {} channels",
                values.len(),
                num_channels
            )));
        }
        Ok(Self {
            num_frames: values.len() / num_channels,
            num_channels,
            values,
        })
    }

    /// Build a single-channel series
    pub fn single_channel(values: Vec<f64>) -> Self {
        Self {
            num_frames: values.len(),
            num_channels: 1,
            values,
        }
    }

    /// Values of one channel, in frame order
    pub fn channel(&self, channel: usize) -> Vec<f64> {
        self.values
            .iter()
            .skip(channel)
            .step_by(self.num_channels.max(1))
            .copied()
            .collect()
    }

    /// Keep only the first `frames` frames
    pub fn truncated(&self, frames: usize) -> Self {
        let frames = frames.min(self.num_frames);
        Self {
            num_frames: frames,
            num_channels: self.num_channels,
            values: self.values[..frames * self.num_channels].to_vec(),
        }
    }
}

/// How sample times are expressed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Timing {
    /// Regular sampling
    Rate {
        /// Sampling rate in Hz
        rate: f64,
        /// Time of the first sample in seconds
        starting_time: f64,
    },
    /// Explicit per-frame timestamps, stored alongside the data
    Timestamps {
        /// One timestamp per frame, in seconds
        #[serde(skip)]
        values: Vec<f64>,
    },
}

/// A named time series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Unique id, used to match backend configurations
    pub object_id: Uuid,
    /// Name, unique within its parent
    pub name: String,
    /// Description
    pub description: String,
    /// Neurodata type
    pub neurodata_type: NeurodataType,
    /// Sample matrix
    pub data: SeriesData,
    /// Sample times
    pub timing: Timing,
    /// Unit of the converted values
    pub unit: String,
    /// Scalar multiplied into the stored values
    pub conversion: f64,
    /// Scalar added after conversion
    pub offset: f64,
    /// Per-channel factor, applied on top of `conversion`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_conversion: Option<Vec<f64>>,
    /// Rows of the electrodes table, one per channel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub electrodes: Option<Vec<usize>>,
}

impl TimeSeries {
    /// Create a generic series with default unit and scaling
    pub fn new(name: impl Into<String>, data: SeriesData, timing: Timing) -> Self {
        Self {
            object_id: Uuid::new_v4(),
            name: name.into(),
            description: "no description".to_string(),
            neurodata_type: NeurodataType::TimeSeries,
            data,
            timing,
            unit: "unknown".to_string(),
            conversion: 1.0,
            offset: 0.0,
            channel_conversion: None,
            electrodes: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the neurodata type
    pub fn with_neurodata_type(mut self, neurodata_type: NeurodataType) -> Self {
        self.neurodata_type = neurodata_type;
        self
    }

    /// Set the unit
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Set conversion and offset
    pub fn with_scaling(mut self, conversion: f64, offset: f64) -> Self {
        self.conversion = conversion;
        self.offset = offset;
        self
    }

    /// Set per-channel conversion factors
    pub fn with_channel_conversion(mut self, channel_conversion: Vec<f64>) -> Self {
        self.channel_conversion = Some(channel_conversion);
        self
    }

    /// Link each channel to an electrodes-table row
    pub fn with_electrodes(mut self, electrodes: Vec<usize>) -> Self {
        self.electrodes = Some(electrodes);
        self
    }

    /// Sampling rate, when regularly sampled
    pub fn rate(&self) -> Option<f64> {
        match self.timing {
            Timing::Rate { rate, .. } => Some(rate),
            Timing::Timestamps { .. } => None,
        }
    }

    /// Time of the first sample
    pub fn starting_time(&self) -> Option<f64> {
        match &self.timing {
            Timing::Rate { starting_time, .. } => Some(*starting_time),
            Timing::Timestamps { values } => values.first().copied(),
        }
    }

    /// Check shape consistency between data, timing and per-channel fields
    pub fn validate(&self) -> Result<(), NwbError> {
        let data = &self.data;
        if data.num_channels == 0 {
            return Err(NwbError::InvalidData(format!(
                "series '{}' has no channels",
                self.name
            )));
        }
        if data.values.len() != data.num_frames * data.num_channels {
            return Err(NwbError::InvalidData(format!(
                "series '{}' declares {}x{} samples but holds {}",
                self.name,
                data.num_frames,
                data.num_channels,
                data.values.len()
            )));
        }
        match &self.timing {
            Timing::Rate { rate, .. } if !rate.is_finite() || *rate <= 0.0 => {
                return Err(NwbError::InvalidData(format!(
                    "series '{}' has invalid rate {}",
                    self.name, rate
                )));
            }
            Timing::Timestamps { values } if values.len() != data.num_frames => {
                return Err(NwbError::InvalidData(format!(
                    "series '{}' has {} timestamps for {} frames",
                    self.name,
                    values.len(),
                    data.num_frames
                )));
            }
            _ => {}
        }
        if let Some(channel_conversion) = &self.channel_conversion {
            if channel_conversion.len() != data.num_channels {
                return Err(NwbError::InvalidData(format!(
                    "series '{}' has {} channel conversions for {} channels",
                    self.name,
                    channel_conversion.len(),
                    data.num_channels
                )));
            }
        }
        if let Some(electrodes) = &self.electrodes {
            if electrodes.len() != data.num_channels {
                return Err(NwbError::InvalidData(format!(
                    "series '{}' references {} electrodes for {} channels",
                    self.name,
                    electrodes.len(),
                    data.num_channels
                )));
            }
        }
        Ok(())
    }
}

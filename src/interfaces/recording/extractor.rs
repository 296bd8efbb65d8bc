use serde_json::{Map, Value};

use crate::interfaces::InterfaceError;
use crate::nwb::SeriesData;

/// Group name used when an extractor reports none
pub const DEFAULT_GROUP_NAME: &str = "0";

/// Access to a parsed multi-channel recording.
///
/// Vendor binary parsing lives behind this trait; interfaces only see
/// channels, samples and header mappings.
pub trait RecordingExtractor {
    /// Channel ids, in channel order
    fn channel_ids(&self) -> Vec<String>;

    /// Sampling frequency in Hz
    fn sampling_frequency(&self) -> f64;

    /// Frames in the (first) segment
    fn num_frames(&self) -> usize;

    /// Unscaled samples for frames `start_frame..end_frame`, frame-major
    fn traces(&self, start_frame: usize, end_frame: usize) -> Result<SeriesData, InterfaceError>;

    /// Per-channel gain to microvolts
    fn channel_gains(&self) -> Option<Vec<f64>> {
        None
    }

    /// Per-channel offset in microvolts
    fn channel_offsets(&self) -> Option<Vec<f64>> {
        None
    }

    /// Electrode group of each channel
    fn channel_groups(&self) -> Vec<String> {
        vec![DEFAULT_GROUP_NAME.to_string(); self.channel_ids().len()]
    }

    /// Vendor header of each channel (one per continuous-signal file)
    fn channel_headers(&self) -> Vec<Map<String, Value>> {
        Vec::new()
    }

    /// Block-level vendor annotations
    fn raw_annotations(&self) -> Map<String, Value> {
        Map::new()
    }
}

/// Recording held fully in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecording {
    /// Channel ids
    pub channel_ids: Vec<String>,
    /// Sampling frequency in Hz
    pub sampling_frequency: f64,
    /// Samples, one column per channel
    pub data: SeriesData,
    /// Per-channel gains
    pub gains: Option<Vec<f64>>,
    /// Per-channel offsets
    pub offsets: Option<Vec<f64>>,
    /// Per-channel group names; defaults to a single group
    pub groups: Option<Vec<String>>,
    /// Per-channel headers
    pub headers: Vec<Map<String, Value>>,
    /// Block-level annotations
    pub annotations: Map<String, Value>,
}

impl InMemoryRecording {
    /// Wrap samples; channel ids are `0..num_channels`
    pub fn new(sampling_frequency: f64, data: SeriesData) -> Self {
        Self {
            channel_ids: (0..data.num_channels).map(|c| c.to_string()).collect(),
            sampling_frequency,
            data,
            ..Self::default()
        }
    }

    /// Set channel ids
    pub fn with_channel_ids(mut self, channel_ids: Vec<String>) -> Self {
        self.channel_ids = channel_ids;
        self
    }

    /// Set gains and offsets
    pub fn with_scaling(mut self, gains: Vec<f64>, offsets: Vec<f64>) -> Self {
        self.gains = Some(gains);
        self.offsets = Some(offsets);
        self
    }

    /// Set per-channel group names
    pub fn with_groups(mut self, groups: Vec<String>) -> Self {
        self.groups = Some(groups);
        self
    }

    /// Set per-channel headers
    pub fn with_headers(mut self, headers: Vec<Map<String, Value>>) -> Self {
        self.headers = headers;
        self
    }

    /// Set block-level annotations
    pub fn with_annotations(mut self, annotations: Map<String, Value>) -> Self {
        self.annotations = annotations;
        self
    }
}

impl RecordingExtractor for InMemoryRecording {
    fn channel_ids(&self) -> Vec<String> {
        self.channel_ids.clone()
    }

    fn sampling_frequency(&self) -> f64 {
        self.sampling_frequency
    }

    fn num_frames(&self) -> usize {
        self.data.num_frames
    }

    fn traces(&self, start_frame: usize, end_frame: usize) -> Result<SeriesData, InterfaceError> {
        if start_frame > end_frame || end_frame > self.data.num_frames {
            return Err(InterfaceError::Extractor(format!(
                "frames {}..{} out of range for {} frames",
                start_frame, end_frame, self.data.num_frames
            )));
        }
        let channels = self.data.num_channels;
        let values = self.data.values[start_frame * channels..end_frame * channels].to_vec();
        Ok(SeriesData::new(channels, values)?)
    }

    fn channel_gains(&self) -> Option<Vec<f64>> {
        self.gains.clone()
    }

    fn channel_offsets(&self) -> Option<Vec<f64>> {
        self.offsets.clone()
    }

    fn channel_groups(&self) -> Vec<String> {
        self.groups
            .clone()
            .unwrap_or_else(|| vec![DEFAULT_GROUP_NAME.to_string(); self.channel_ids.len()])
    }

    fn channel_headers(&self) -> Vec<Map<String, Value>> {
        self.headers.clone()
    }

    fn raw_annotations(&self) -> Map<String, Value> {
        self.annotations.clone()
    }
}

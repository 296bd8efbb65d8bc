//! Intracellular electrophysiology sources.
//!
//! Like the recording variants, icephys interfaces never parse vendor
//! binaries: each source file is handed over as an [`IcephysExtractor`].

mod abf;

pub use abf::{start_datetime, AbfInterface, ABF_STUB_FRAMES, DEFAULT_STIMULUS_TYPE, LAB_METADATA_KEY};

use serde_json::{Map, Value};

use crate::interfaces::InterfaceError;
use crate::nwb::SeriesData;

/// Access to one parsed intracellular recording file
pub trait IcephysExtractor {
    /// File name, used to match per-session metadata
    fn file_name(&self) -> String;

    /// Vendor header of the file
    fn header(&self) -> Map<String, Value>;

    /// Sampling frequency in Hz
    fn sampling_frequency(&self) -> f64;

    /// Number of sweeps
    fn num_segments(&self) -> usize;

    /// Number of recorded electrodes
    fn num_electrodes(&self) -> usize;

    /// Samples of one sweep, one column per electrode
    fn segment(&self, segment: usize) -> Result<SeriesData, InterfaceError>;

    /// Unit of the samples
    fn unit(&self) -> String {
        "volts".to_string()
    }
}

/// Intracellular recording held fully in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryIcephys {
    /// File name
    pub file_name: String,
    /// Vendor header
    pub header: Map<String, Value>,
    /// Sampling frequency in Hz
    pub sampling_frequency: f64,
    /// One entry per sweep
    pub segments: Vec<SeriesData>,
}

impl InMemoryIcephys {
    /// Wrap sweeps recorded at `sampling_frequency`
    pub fn new(file_name: impl Into<String>, sampling_frequency: f64, segments: Vec<SeriesData>) -> Self {
        Self {
            file_name: file_name.into(),
            sampling_frequency,
            segments,
            ..Self::default()
        }
    }

    /// Set the vendor header
    pub fn with_header(mut self, header: Map<String, Value>) -> Self {
        self.header = header;
        self
    }
}

impl IcephysExtractor for InMemoryIcephys {
    fn file_name(&self) -> String {
        self.file_name.clone()
    }

    fn header(&self) -> Map<String, Value> {
        self.header.clone()
    }

    fn sampling_frequency(&self) -> f64 {
        self.sampling_frequency
    }

    fn num_segments(&self) -> usize {
        self.segments.len()
    }

    fn num_electrodes(&self) -> usize {
        self.segments.first().map(|segment| segment.num_channels).unwrap_or(0)
    }

    fn segment(&self, segment: usize) -> Result<SeriesData, InterfaceError> {
        self.segments.get(segment).cloned().ok_or_else(|| {
            InterfaceError::Extractor(format!(
                "segment {} out of range for {} segments",
                segment,
                self.segments.len()
            ))
        })
    }
}

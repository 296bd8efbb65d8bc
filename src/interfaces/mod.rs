//! # Data Interfaces
//!
//! A data interface adapts one source format to the NWB model. Every interface
//! implements [`DataInterface`], which asks for two things:
//!
//! - the declared parameter tables of the constructor and of `add_to_nwbfile`,
//!   from which the source and conversion-options schemas are derived
//! - `add_to_nwbfile`, which writes the source's content into an open file
//!
//! Everything else (metadata defaults, `create_nwbfile`, `run_conversion`)
//! comes with a default that variants override where they know more.
//!
//! ## Variants
//!
//! | Interface | Source | Output |
//! |-----------|--------|--------|
//! | [`AudioInterface`] | `.wav` files | one `AcousticWaveformSeries` per file |
//! | [`NeuralynxRecordingInterface`] | folder of `.ncs` files | `ElectricalSeries` plus electrodes |
//! | [`AlphaOmegaRecordingInterface`] | folder of `.mpx` files | `ElectricalSeries` plus electrodes |
//! | [`BiocamRecordingInterface`] | one `.bwr` file | `ElectricalSeries` plus electrodes |
//! | [`AbfInterface`] | `.abf` files | one `PatchClampSeries` per sweep and electrode |
//!
//! Recording variants do not parse vendor binaries. They are handed a
//! [`RecordingExtractor`] that exposes channels, samples and headers;
//! intracellular variants get one [`IcephysExtractor`] per file.
//!
//! ## Example
//!
//! ```rust,no_run
//! use nwbconv::interfaces::{AudioInterface, DataInterface, RunOptions};
//! use serde_json::{json, Map, Value};
//!
//! let interface = AudioInterface::new(&["a.wav", "b.wav"], false)?;
//!
//! let mut options = Map::new();
//! options.insert("starting_times".to_string(), json!([0.0, 20.0]));
//!
//! let nwbfile = interface.run_conversion(RunOptions::to_path("session.nwb"), &options)?;
//! assert_eq!(nwbfile.stimulus.len(), 2);
//! # Ok::<(), nwbconv::interfaces::InterfaceError>(())
//! ```

mod audio;
mod base;
mod error;
mod icephys;
mod recording;


pub use audio::{AudioInterface, AUDIO_DESCRIPTION, AUDIO_UNIT, DEFAULT_STUB_FRAMES};
pub use base::{
    base_metadata, extend_metadata_schema, DataInterface, AUTO_SESSION_DESCRIPTION,
    OPTIONS_SCHEMA_EXCLUDE, SOURCE_SCHEMA_EXCLUDE,
};
pub use error::{InterfaceError, ValidationError};
pub use icephys::{
    start_datetime, AbfInterface, IcephysExtractor, InMemoryIcephys, ABF_STUB_FRAMES,
    DEFAULT_STIMULUS_TYPE, LAB_METADATA_KEY,
};
pub use recording::{
    extract_common_header, extract_varying_header, AlphaOmegaRecordingInterface,
    BiocamRecordingInterface, InMemoryRecording, NeuralynxRecordingInterface, RecordingExtractor,
    RecordingInterface, WriteAs, DEFAULT_DEVICE_NAME, DEFAULT_ES_KEY, DEFAULT_GROUP_NAME,
    PER_CHANNEL, STUB_FRAMES,
};

pub use crate::lifecycle::RunOptions;

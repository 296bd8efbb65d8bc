//! # nwbconv - Neurophysiology to NWB Conversion
//!
//! `nwbconv` converts heterogeneous neurophysiology acquisition formats
//! (extracellular recorders, patch-clamp amplifiers, audio sensors) into a
//! single NWB container with harmonized metadata.
//!
//! ## Key Features
//!
//! - **Metadata reconciliation**: each source contributes cheap metadata
//!   defaults; user overrides are deep-merged on top without clobbering
//!   sibling fields.
//!
//! - **Schema-driven validation**: constructor arguments, conversion options
//!   and the merged metadata are validated against JSON-Schema documents
//!   before any output is touched.
//!
//! - **Exactly-once commit**: the output file goes through a small lifecycle
//!   state machine and is replaced atomically, so a failed run never leaves a
//!   half-written file behind.
//!
//! - **Parquet-backed datasets**: every time series is stored as a Parquet
//!   dataset inside a single ZIP container, with per-dataset compression and
//!   chunking.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nwbconv::prelude::*;
//! use serde_json::{json, Map};
//!
//! let audio = AudioInterface::new(&["trial1.wav", "trial2.wav"], true)?;
//!
//! let mut metadata = audio.get_metadata()?;
//! metadata.set_nwbfile_field("session_start_time", "2021-06-01T09:00:00+00:00");
//!
//! let mut options = Map::new();
//! options.insert("starting_times".to_string(), json!([0.0, 20.0]));
//!
//! let nwbfile = audio.run_conversion(
//!     RunOptions::to_path("session.nwb").with_metadata(metadata),
//!     &options,
//! )?;
//! println!("wrote {} stimulus series", nwbfile.stimulus.len());
//! # Ok::<(), nwbconv::interfaces::InterfaceError>(())
//! ```
//!
//! ## Architecture
//!
//! - [`schema`]: parameter tables, Schema Documents and instance validation
//! - [`metadata`]: the Metadata Document, deep merge and header intersection
//! - [`nwb`]: the in-memory NWB model and its on-disk container
//! - [`lifecycle`]: create-or-append handling of the output file
//! - [`interfaces`]: the `DataInterface` trait and the source-format variants
//! - [`converter`]: several interfaces writing into one file
//!
//! ## Container Layout
//!
//! ```text
//! session.nwb (ZIP)
//! ├── mimetype                               # application/x-nwb+zip, stored
//! ├── nwbfile.json                           # file-level fields and hierarchy
//! ├── acquisition/ElectricalSeries/data.parquet
//! └── stimulus/AcousticWaveformSeries/data.parquet
//! ```

#![warn(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod converter;
pub mod interfaces;
pub mod lifecycle;
pub mod metadata;
pub mod nwb;
pub mod schema;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::converter::{ConverterError, ConverterPipe, NwbConverter};
    pub use crate::interfaces::{
        AbfInterface, AlphaOmegaRecordingInterface, AudioInterface, BiocamRecordingInterface,
        DataInterface, IcephysExtractor, InMemoryIcephys, InMemoryRecording, InterfaceError,
        NeuralynxRecordingInterface, RecordingExtractor, RecordingInterface, RunOptions,
        ValidationError,
    };
    pub use crate::lifecycle::{make_or_load_nwbfile, HandleState, NwbFileHandle};
    pub use crate::metadata::{
        dict_deep_update, dict_intersection, load_dict_from_file, MetadataDocument, MetadataError,
    };
    pub use crate::nwb::{
        BackendConfiguration, CompressionMethod, NwbError, NwbFile, NwbIo, SeriesData, TimeSeries,
        Timing,
    };
    pub use crate::schema::{infer_schema, ParamType, Parameter, SchemaDocument, SchemaError};
}

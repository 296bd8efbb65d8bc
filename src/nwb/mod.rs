//! # NWB Container Module
//!
//! In-memory model of an NWB file and its on-disk persistence.
//!
//! [`NwbFile`] holds the file-level fields (identifier, session description,
//! start time) and the object hierarchy:
//!
//! - `devices`, `electrode_groups` and the `electrodes` table
//! - `acquisition` and `stimulus`, the two namespaces a series can be placed in
//! - `processing` modules holding containers such as `LFP`
//!
//! [`NwbIo`] writes the hierarchy as JSON and each series' samples as a
//! Parquet dataset inside a single ZIP archive. Per-dataset codec and chunking
//! come from a [`BackendConfiguration`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use chrono::Utc;
//! use nwbconv::nwb::{BackendConfiguration, NwbFile, NwbIo, SeriesData, TimeSeries, Timing};
//!
//! let mut nwbfile = NwbFile::new("id-1", "demo", Utc::now().fixed_offset());
//! let series = TimeSeries::new(
//!     "Mic",
//!     SeriesData::single_channel(vec![0.0, 0.5, 1.0]),
//!     Timing::Rate { rate: 44_100.0, starting_time: 0.0 },
//! );
//! nwbfile.add_stimulus(series)?;
//!
//! let backend = BackendConfiguration::from_nwbfile(&nwbfile);
//! NwbIo::write(&nwbfile, "demo.nwb", &backend)?;
//! # Ok::<(), nwbconv::nwb::NwbError>(())
//! ```

mod backend;
mod error;
mod file;
mod io;
mod series;

#[cfg(test)]
mod tests;

pub use backend::{
    BackendConfiguration, CompressionMethod, DatasetIoConfiguration, DEFAULT_CHUNK_FRAMES,
    DEFAULT_COMPRESSION_LEVEL,
};
pub use error::NwbError;
pub use file::{
    dataset_location, DataContainer, Device, ElectrodeGroup, ElectrodeRow, NwbFile,
    ProcessingModule, DEFAULT_SESSION_DESCRIPTION,
};
pub use io::NwbIo;
pub use series::{NeurodataType, SeriesData, TimeSeries, Timing};

//! # Metadata Module
//!
//! The Metadata Document is the carrier for every descriptive field that ends
//! up in the output container. It is a free-form nested JSON mapping, so that
//! vendor-specific extension fields pass through untouched, wrapped behind a
//! typed accessor layer for the well-known namespaces:
//!
//! | Namespace | Contents | Typed view |
//! |-----------|----------|------------|
//! | `NWBFile` | session description, identifier, start time, notes | [`NwbFileMetadata`] |
//! | `Subject` | subject id, species, sex | passthrough |
//! | `Ecephys` | `Device`, `ElectrodeGroup`, one entry per electrical series | [`DeviceMetadata`], [`ElectrodeGroupMetadata`], [`SeriesMetadata`] |
//! | `Behavior` | `Audio` list, one entry per audio file | [`SeriesMetadata`] |
//!
//! ## Merge semantics
//!
//! [`dict_deep_update`] merges an override into a base document:
//!
//! 1. Mappings present on both sides are merged key by key, recursively
//! 2. Any other value (scalar or list) on the override side replaces the base value
//! 3. Keys present on only one side are kept
//!
//! Lists are replaced wholesale; there is no element-wise merge.

mod document;
mod error;
mod file;
mod intersection;
mod sections;

#[cfg(test)]
mod tests;

pub use document::{dict_deep_update, MetadataDocument};
pub use error::MetadataError;
pub use file::{load_dict_from_file, load_dict_from_str, MetadataFileFormat};
pub use intersection::dict_intersection;
pub use sections::{
    parse_datetime, DeviceMetadata, ElectrodeGroupMetadata, NwbFileMetadata, SeriesMetadata,
};
pub(crate) use sections::parse_naive_datetime;

//! # Schema Module
//!
//! Schema Documents describe which fields an operation accepts. They are used
//! for three things:
//!
//! - **Source schemas**: the constructor arguments of a data interface
//! - **Conversion-options schemas**: the per-call options of `add_to_nwbfile`
//! - **Metadata schemas**: the shape of the Metadata Document
//!
//! The first two are derived from a statically declared parameter table with
//! [`infer_schema`]. The metadata schema is a static resource
//! ([`base_metadata_schema`]) that each interface extends.
//!
//! ## Type mapping
//!
//! | Declared type | Schema primitive |
//! |---------------|------------------|
//! | `Str`, `FilePath`, `FolderPath` | `string` |
//! | `Int`, `Float` | `number` |
//! | `Bool` | `boolean` |
//! | `List(T)` | `array` (items from `T`) |
//! | `Dict` | `object` |
//! | `Optional(T)` | as `T`, never required |
//!
//! Anything else is rejected with [`SchemaError::UnsupportedType`].

mod constants;
mod error;
mod inference;
mod validation;


pub use constants::*;
pub use error::SchemaError;
pub use inference::{infer_schema, ParamType, Parameter, PropertySchema, SchemaDocument, SchemaType, TypeSpec};
pub use validation::{base_metadata_schema, validate_instance};

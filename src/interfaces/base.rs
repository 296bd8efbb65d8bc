use std::path::Path;

use serde_json::{Map, Value};
use uuid::Uuid;

use super::{InterfaceError, ValidationError};
use crate::lifecycle::{make_or_load_nwbfile, RunOptions};
use crate::metadata::{dict_deep_update, MetadataDocument};
use crate::nwb::NwbFile;
use crate::schema::{base_metadata_schema, infer_schema, Parameter, SchemaDocument, SchemaError};

/// Session description used until the caller supplies one
pub const AUTO_SESSION_DESCRIPTION: &str = "Auto-generated by nwbconv";

/// Parameters excluded from every source schema
pub const SOURCE_SCHEMA_EXCLUDE: &[&str] = &["source_data"];

/// Parameters excluded from every conversion-options schema
pub const OPTIONS_SCHEMA_EXCLUDE: &[&str] = &["nwbfile", "metadata"];

/// Defaults every interface starts from: an auto-generated description and a
/// fresh identifier.
pub fn base_metadata() -> MetadataDocument {
    let mut metadata = MetadataDocument::new();
    metadata.set_nwbfile_field("session_description", AUTO_SESSION_DESCRIPTION);
    metadata.set_nwbfile_field("identifier", Uuid::new_v4().to_string());
    metadata
}

/// Base metadata schema with `additions` deep-merged in
pub fn extend_metadata_schema(additions: Value) -> Result<Value, SchemaError> {
    let mut schema = base_metadata_schema()?;
    if let (Value::Object(base), Value::Object(additions)) = (&mut schema, &additions) {
        dict_deep_update(base, additions);
    }
    Ok(schema)
}

/// A source-format adapter.
///
/// Implementors supply the write operation and their parameter tables; every
/// schema and the full conversion lifecycle come from the provided methods.
pub trait DataInterface {
    /// Name under which the interface registers in a converter
    fn interface_name(&self) -> &str;

    /// Constructor arguments, captured verbatim
    fn source_data(&self) -> &Map<String, Value>;

    /// Whether to log progress
    fn verbose(&self) -> bool;

    /// Declared constructor parameters
    fn source_parameters(&self) -> Vec<Parameter>;

    /// Declared parameters of [`add_to_nwbfile`](Self::add_to_nwbfile)
    fn conversion_option_parameters(&self) -> Vec<Parameter>;

    /// Schema of the constructor arguments
    fn get_source_schema(&self) -> Result<SchemaDocument, SchemaError> {
        infer_schema(&self.source_parameters(), SOURCE_SCHEMA_EXCLUDE)
    }

    /// Schema of the options accepted by [`add_to_nwbfile`](Self::add_to_nwbfile)
    fn get_conversion_options_schema(&self) -> Result<SchemaDocument, SchemaError> {
        infer_schema(&self.conversion_option_parameters(), OPTIONS_SCHEMA_EXCLUDE)
    }

    /// Schema of the Metadata Document this interface understands
    fn get_metadata_schema(&self) -> Result<Value, SchemaError> {
        base_metadata_schema()
    }

    /// Metadata defaults, cheap to compute (no sample data is read)
    fn get_metadata(&self) -> Result<MetadataDocument, InterfaceError> {
        Ok(base_metadata())
    }

    /// Write this source's content into `nwbfile`
    fn add_to_nwbfile(
        &self,
        nwbfile: &mut NwbFile,
        metadata: &MetadataDocument,
        conversion_options: &Map<String, Value>,
    ) -> Result<(), InterfaceError>;

    /// Build a fresh in-memory file from `metadata` and write into it
    fn create_nwbfile(
        &self,
        metadata: &MetadataDocument,
        conversion_options: &Map<String, Value>,
    ) -> Result<NwbFile, InterfaceError> {
        let mut nwbfile = NwbFile::from_metadata(metadata)?;
        self.add_to_nwbfile(&mut nwbfile, metadata, conversion_options)?;
        Ok(nwbfile)
    }

    /// Full conversion: merge metadata over the defaults, acquire the
    /// destination, write, release.
    fn run_conversion(
        &self,
        options: RunOptions,
        conversion_options: &Map<String, Value>,
    ) -> Result<NwbFile, InterfaceError> {
        if options.nwbfile_path.is_none() {
            log::warn!(
                "Using run_conversion() without specifying nwbfile_path is deprecated. To create an \
                 NWBFile in memory, use create_nwbfile(). To append to an existing NWBFile, use \
                 add_to_nwbfile()."
            );
        }

        self.get_conversion_options_schema()?.validate(
            &Value::Object(conversion_options.clone()),
            &format!("{} conversion options", self.interface_name()),
        )?;

        let mut metadata = self.get_metadata()?;
        if let Some(user_metadata) = &options.metadata {
            metadata.deep_update(user_metadata);
        }

        let options = RunOptions {
            verbose: options.verbose || self.verbose(),
            ..options
        };
        make_or_load_nwbfile(options, &metadata, |nwbfile| {
            self.add_to_nwbfile(nwbfile, &metadata, conversion_options)
        })
    }
}

/// Check the captured constructor arguments against the interface's source schema
pub(crate) fn validate_source_data<I: DataInterface + ?Sized>(interface: &I) -> Result<(), InterfaceError> {
    interface.get_source_schema()?.validate(
        &Value::Object(interface.source_data().clone()),
        &format!("{} source data", interface.interface_name()),
    )?;
    Ok(())
}

/// Required string entry of a source-data mapping
pub(crate) fn source_str<'a>(
    source_data: &'a Map<String, Value>,
    key: &str,
) -> Result<&'a str, ValidationError> {
    source_data
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| wrong_type(key, "a string"))
}

/// Boolean option, or `default` when absent
pub(crate) fn bool_option(
    options: &Map<String, Value>,
    key: &str,
    default: bool,
) -> Result<bool, ValidationError> {
    match options.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Bool(value)) => Ok(*value),
        Some(_) => Err(wrong_type(key, "a boolean")),
    }
}

/// String option, or `default` when absent
pub(crate) fn str_option(
    options: &Map<String, Value>,
    key: &str,
    default: &str,
) -> Result<String, ValidationError> {
    match options.get(key) {
        None | Some(Value::Null) => Ok(default.to_string()),
        Some(Value::String(value)) => Ok(value.clone()),
        Some(_) => Err(wrong_type(key, "a string")),
    }
}

/// Non-negative integer option, or `default` when absent
pub(crate) fn usize_option(
    options: &Map<String, Value>,
    key: &str,
    default: usize,
) -> Result<usize, ValidationError> {
    match options.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(value) => value
            .as_u64()
            .and_then(|value| usize::try_from(value).ok())
            .ok_or_else(|| wrong_type(key, "a non-negative integer")),
    }
}

fn wrong_type(field: &str, expected: &str) -> ValidationError {
    ValidationError::WrongType {
        field: field.to_string(),
        expected: expected.to_string(),
    }
}

pub(crate) fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

pub(crate) fn suffix(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

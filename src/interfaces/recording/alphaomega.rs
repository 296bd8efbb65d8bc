//! AlphaOmega recordings (`.mpx` folders).

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::{folder_parameters, RecordingExtractor, RecordingInterface, DEFAULT_ES_KEY};
use crate::interfaces::base::{
    bool_option, has_extension, source_str, str_option, validate_source_data, DataInterface,
    SOURCE_SCHEMA_EXCLUDE,
};
use crate::interfaces::InterfaceError;
use crate::metadata::MetadataDocument;
use crate::nwb::NwbFile;
use crate::schema::{infer_schema, Parameter, SchemaError};

/// AlphaOmega recording interface; the session start comes from the
/// `rec_datetime` block annotation.
pub struct AlphaOmegaRecordingInterface {
    inner: RecordingInterface,
    mpx_files: Vec<PathBuf>,
}

impl AlphaOmegaRecordingInterface {
    /// Registration name
    pub const NAME: &'static str = "AlphaOmegaRecordingInterface";

    /// Open the `.mpx` files in `folder_path`, parsed by `extractor`
    pub fn new(
        folder_path: impl AsRef<Path>,
        extractor: Box<dyn RecordingExtractor>,
        verbose: bool,
        es_key: &str,
    ) -> Result<Self, InterfaceError> {
        let folder_path = folder_path.as_ref();
        let mut mpx_files = Vec::new();
        for entry in std::fs::read_dir(folder_path)? {
            let path = entry?.path();
            if has_extension(&path, "mpx") {
                mpx_files.push(path);
            }
        }
        mpx_files.sort();

        let mut source_data = Map::new();
        source_data.insert(
            "folder_path".to_string(),
            Value::String(folder_path.to_string_lossy().into_owned()),
        );
        source_data.insert("verbose".to_string(), Value::Bool(verbose));
        source_data.insert("es_key".to_string(), Value::String(es_key.to_string()));

        let inner =
            RecordingInterface::new(Self::NAME, extractor, source_data, verbose).with_es_key(es_key);
        let interface = Self { inner, mpx_files };
        validate_source_data(&interface)?;
        Ok(interface)
    }

    /// Create from a source-data mapping, validated against the source schema
    pub fn from_source_data(
        source_data: &Map<String, Value>,
        extractor: Box<dyn RecordingExtractor>,
    ) -> Result<Self, InterfaceError> {
        infer_schema(&folder_parameters(true), SOURCE_SCHEMA_EXCLUDE)?
            .validate(&Value::Object(source_data.clone()), Self::NAME)?;
        let folder_path = source_str(source_data, "folder_path")?;
        let verbose = bool_option(source_data, "verbose", true)?;
        let es_key = str_option(source_data, "es_key", DEFAULT_ES_KEY)?;
        Self::new(folder_path, extractor, verbose, &es_key)
    }

    /// Source files, sorted
    pub fn mpx_files(&self) -> &[PathBuf] {
        &self.mpx_files
    }
}

impl DataInterface for AlphaOmegaRecordingInterface {
    fn interface_name(&self) -> &str {
        Self::NAME
    }

    fn source_data(&self) -> &Map<String, Value> {
        self.inner.source_data()
    }

    fn verbose(&self) -> bool {
        self.inner.verbose()
    }

    fn source_parameters(&self) -> Vec<Parameter> {
        folder_parameters(true)
    }

    fn conversion_option_parameters(&self) -> Vec<Parameter> {
        self.inner.conversion_option_parameters()
    }

    fn get_metadata_schema(&self) -> Result<Value, SchemaError> {
        self.inner.get_metadata_schema()
    }

    fn get_metadata(&self) -> Result<MetadataDocument, InterfaceError> {
        let mut metadata = self.inner.get_metadata()?;
        let annotations = Value::Object(self.inner.extractor().raw_annotations());
        match annotations.pointer("/blocks/0/rec_datetime") {
            Some(rec_datetime) => {
                metadata.set_nwbfile_field("session_start_time", rec_datetime.clone());
            }
            None => log::warn!("AlphaOmega annotations carry no rec_datetime; session start unknown"),
        }
        Ok(metadata)
    }

    fn add_to_nwbfile(
        &self,
        nwbfile: &mut NwbFile,
        metadata: &MetadataDocument,
        conversion_options: &Map<String, Value>,
    ) -> Result<(), InterfaceError> {
        self.inner.add_to_nwbfile(nwbfile, metadata, conversion_options)
    }
}

//! 3Brain Biocam recordings (`.bwr`).

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::{RecordingExtractor, RecordingInterface, DEFAULT_ES_KEY};
use crate::interfaces::base::{
    bool_option, has_extension, source_str, str_option, suffix, validate_source_data, DataInterface,
    SOURCE_SCHEMA_EXCLUDE,
};
use crate::interfaces::InterfaceError;
use crate::metadata::MetadataDocument;
use crate::nwb::NwbFile;
use crate::schema::{infer_schema, ParamType, Parameter, SchemaError};

/// Biocam recording interface over a single `.bwr` file
pub struct BiocamRecordingInterface {
    inner: RecordingInterface,
    file_path: PathBuf,
}

impl BiocamRecordingInterface {
    /// Registration name
    pub const NAME: &'static str = "BiocamRecordingInterface";

    /// Open `file_path`, parsed by `extractor`
    pub fn new(
        file_path: impl AsRef<Path>,
        extractor: Box<dyn RecordingExtractor>,
        verbose: bool,
        es_key: &str,
    ) -> Result<Self, InterfaceError> {
        let file_path = file_path.as_ref().to_path_buf();
        if !has_extension(&file_path, "bwr") {
            return Err(InterfaceError::UnsupportedFormat {
                modality: "Biocam".to_string(),
                expected: "BWR file".to_string(),
                suffixes: vec![suffix(&file_path)],
            });
        }

        let mut source_data = Map::new();
        source_data.insert(
            "file_path".to_string(),
            Value::String(file_path.to_string_lossy().into_owned()),
        );
        source_data.insert("verbose".to_string(), Value::Bool(verbose));
        source_data.insert("es_key".to_string(), Value::String(es_key.to_string()));

        let inner =
            RecordingInterface::new(Self::NAME, extractor, source_data, verbose).with_es_key(es_key);
        let interface = Self { inner, file_path };
        validate_source_data(&interface)?;
        Ok(interface)
    }

    /// Create from a source-data mapping, validated against the source schema
    pub fn from_source_data(
        source_data: &Map<String, Value>,
        extractor: Box<dyn RecordingExtractor>,
    ) -> Result<Self, InterfaceError> {
        infer_schema(&Self::parameters(), SOURCE_SCHEMA_EXCLUDE)?
            .validate(&Value::Object(source_data.clone()), Self::NAME)?;
        let file_path = source_str(source_data, "file_path")?;
        let verbose = bool_option(source_data, "verbose", true)?;
        let es_key = str_option(source_data, "es_key", DEFAULT_ES_KEY)?;
        Self::new(file_path, extractor, verbose, &es_key)
    }

    fn parameters() -> Vec<Parameter> {
        vec![
            Parameter::new("file_path", ParamType::FilePath).with_description("Path to the .bwr file"),
            Parameter::new("verbose", ParamType::Bool).with_default(true),
            Parameter::new("es_key", ParamType::Str).with_default(DEFAULT_ES_KEY),
        ]
    }

    /// Source file
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}

impl DataInterface for BiocamRecordingInterface {
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
        Self::parameters()
    }

    fn conversion_option_parameters(&self) -> Vec<Parameter> {
        self.inner.conversion_option_parameters()
    }

    fn get_metadata_schema(&self) -> Result<Value, SchemaError> {
        self.inner.get_metadata_schema()
    }

    fn get_metadata(&self) -> Result<MetadataDocument, InterfaceError> {
        self.inner.get_metadata()
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

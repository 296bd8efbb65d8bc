//! # Conversion Orchestrator
//!
//! [`NwbConverter`] composes several data interfaces under one destination.
//! Interfaces are kept in registration order; that order decides both how
//! their metadata defaults are merged (later over earlier) and the order in
//! which they write into the shared file.
//!
//! Conversion options are a mapping from interface name to that interface's
//! own options. Interfaces without an entry get empty options. All options
//! are validated before the destination is touched, and a failure in any one
//! interface aborts the whole run.
//!
//! ## Example
//!
//! ```rust,no_run
//! use nwbconv::converter::NwbConverter;
//! use nwbconv::interfaces::{AudioInterface, RunOptions};
//! use serde_json::json;
//!
//! let mut converter = NwbConverter::new();
//! converter.add_interface("Audio", Box::new(AudioInterface::new(&["mic.wav"], false)?))?;
//!
//! let mut metadata = converter.get_metadata()?;
//! metadata.set_nwbfile_field("session_start_time", "2021-06-01T09:00:00+00:00");
//!
//! let options = json!({"Audio": {"write_as": "acquisition"}});
//! converter.run_conversion(
//!     RunOptions::to_path("session.nwb").with_metadata(metadata),
//!     options.as_object(),
//! )?;
//! # Ok::<(), nwbconv::converter::ConverterError>(())
//! ```

mod error;


pub use error::ConverterError;

use serde_json::{json, Map, Value};

use crate::interfaces::DataInterface;
use crate::lifecycle::{make_or_load_nwbfile, RunOptions};
use crate::metadata::{dict_deep_update, MetadataDocument};
use crate::nwb::NwbFile;
use crate::schema::{base_metadata_schema, validate_instance, SchemaError};

/// Orchestrates a conversion from several interfaces into one file
#[derive(Default)]
pub struct NwbConverter {
    interfaces: Vec<(String, Box<dyn DataInterface>)>,
    verbose: bool,
}

/// A converter whose interfaces are named after themselves
pub type ConverterPipe = NwbConverter;

impl NwbConverter {
    /// Create an empty converter
    pub fn new() -> Self {
        Self::default()
    }

    /// Log progress while converting
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Create a converter from named interfaces, in order
    pub fn from_interfaces<I>(interfaces: I) -> Result<Self, ConverterError>
    where
        I: IntoIterator<Item = (String, Box<dyn DataInterface>)>,
    {
        let mut converter = Self::new();
        for (name, interface) in interfaces {
            converter.add_interface(name, interface)?;
        }
        Ok(converter)
    }

    /// Create a converter from a list, naming each interface by its
    /// [`interface_name`](DataInterface::interface_name)
    pub fn from_list(interfaces: Vec<Box<dyn DataInterface>>) -> Result<Self, ConverterError> {
        Self::from_interfaces(
            interfaces
                .into_iter()
                .map(|interface| (interface.interface_name().to_string(), interface)),
        )
    }

    /// Register `interface` under `name`
    pub fn add_interface(
        &mut self,
        name: impl Into<String>,
        interface: Box<dyn DataInterface>,
    ) -> Result<(), ConverterError> {
        let name = name.into();
        if self.interface(&name).is_some() {
            return Err(ConverterError::DuplicateInterface(name));
        }
        log::info!("Added interface '{}' ({})", name, interface.interface_name());
        self.interfaces.push((name, interface));
        Ok(())
    }

    /// Registered names, in registration order
    pub fn interface_names(&self) -> Vec<&str> {
        self.interfaces.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// The interface registered under `name`
    pub fn interface(&self, name: &str) -> Option<&dyn DataInterface> {
        self.interfaces
            .iter()
            .find(|(registered, _)| registered == name)
            .map(|(_, interface)| interface.as_ref())
    }

    /// Source schemas of every interface, keyed by interface name
    pub fn get_source_schema(&self) -> Result<Value, SchemaError> {
        let mut properties = Map::new();
        for (name, interface) in &self.interfaces {
            properties.insert(name.clone(), interface.get_source_schema()?.to_value()?);
        }
        Ok(object_schema(properties))
    }

    /// Conversion-options schemas of every interface, keyed by interface name
    pub fn get_conversion_options_schema(&self) -> Result<Value, SchemaError> {
        let mut properties = Map::new();
        for (name, interface) in &self.interfaces {
            properties.insert(
                name.clone(),
                interface.get_conversion_options_schema()?.to_value()?,
            );
        }
        Ok(object_schema(properties))
    }

    /// Base metadata schema with every interface's additions merged in
    pub fn get_metadata_schema(&self) -> Result<Value, SchemaError> {
        let mut schema = base_metadata_schema()?;
        for (_, interface) in &self.interfaces {
            if let (Value::Object(merged), Value::Object(additions)) =
                (&mut schema, interface.get_metadata_schema()?)
            {
                dict_deep_update(merged, &additions);
            }
        }
        Ok(schema)
    }

    /// Every interface's metadata defaults, merged in registration order
    pub fn get_metadata(&self) -> Result<MetadataDocument, ConverterError> {
        let mut metadata = MetadataDocument::new();
        for (_, interface) in &self.interfaces {
            metadata.deep_update(&interface.get_metadata()?);
        }
        Ok(metadata)
    }

    /// Check `metadata` against the aggregated metadata schema
    pub fn validate_metadata(&self, metadata: &MetadataDocument) -> Result<(), ConverterError> {
        let schema = self.get_metadata_schema()?;
        validate_instance(&schema, &metadata.to_value(), "metadata")?;
        Ok(())
    }

    /// Check every interface's options; keys must name registered interfaces
    pub fn validate_conversion_options(
        &self,
        conversion_options: &Map<String, Value>,
    ) -> Result<(), ConverterError> {
        if let Some(unknown) = conversion_options
            .keys()
            .find(|name| self.interface(name).is_none())
        {
            return Err(ConverterError::UnknownInterface(unknown.clone()));
        }

        for (name, interface) in &self.interfaces {
            let options = conversion_options
                .get(name)
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new()));
            interface
                .get_conversion_options_schema()?
                .validate(&options, name)
                .map_err(|source| ConverterError::InvalidOptions {
                    interface: name.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Let every interface write into `nwbfile`, in registration order
    pub fn add_to_nwbfile(
        &self,
        nwbfile: &mut NwbFile,
        metadata: &MetadataDocument,
        conversion_options: Option<&Map<String, Value>>,
    ) -> Result<(), ConverterError> {
        let empty = Map::new();
        let conversion_options = conversion_options.unwrap_or(&empty);
        for (name, interface) in &self.interfaces {
            interface.add_to_nwbfile(nwbfile, metadata, &options_for(conversion_options, name))?;
            if self.verbose {
                log::info!("'{}' written", name);
            }
        }
        Ok(())
    }

    /// Build a fresh in-memory file from `metadata` and fill it
    pub fn create_nwbfile(
        &self,
        metadata: &MetadataDocument,
        conversion_options: Option<&Map<String, Value>>,
    ) -> Result<NwbFile, ConverterError> {
        let mut nwbfile = NwbFile::from_metadata(metadata)?;
        self.add_to_nwbfile(&mut nwbfile, metadata, conversion_options)?;
        Ok(nwbfile)
    }

    /// Full conversion into one destination.
    ///
    /// Options and the merged metadata are validated before the destination
    /// is acquired. Caller metadata in `options` is merged over the combined
    /// interface defaults.
    pub fn run_conversion(
        &self,
        options: RunOptions,
        conversion_options: Option<&Map<String, Value>>,
    ) -> Result<NwbFile, ConverterError> {
        let empty = Map::new();
        let conversion_options = conversion_options.unwrap_or(&empty);
        self.validate_conversion_options(conversion_options)?;

        let mut metadata = self.get_metadata()?;
        if let Some(user_metadata) = &options.metadata {
            metadata.deep_update(user_metadata);
        }
        self.validate_metadata(&metadata)?;

        let options = RunOptions {
            verbose: options.verbose || self.verbose,
            ..options
        };
        make_or_load_nwbfile(options, &metadata, |nwbfile| {
            self.add_to_nwbfile(nwbfile, &metadata, Some(conversion_options))
        })
    }
}

fn options_for(conversion_options: &Map<String, Value>, name: &str) -> Map<String, Value> {
    conversion_options
        .get(name)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

fn object_schema(properties: Map<String, Value>) -> Value {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "required": [],
        "properties": properties,
        "additionalProperties": false,
    })
}

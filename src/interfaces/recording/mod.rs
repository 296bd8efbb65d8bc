//! Shared base of the extracellular recording interfaces.
//!
//! [`RecordingInterface`] wraps a [`RecordingExtractor`] and writes devices,
//! electrode groups, the electrodes table and one `ElectricalSeries`. Vendor
//! interfaces add source enumeration and metadata extraction on top.

mod alphaomega;
mod biocam;
mod extractor;
mod neuralynx;

pub use alphaomega::AlphaOmegaRecordingInterface;
pub use biocam::BiocamRecordingInterface;
pub use extractor::{InMemoryRecording, RecordingExtractor, DEFAULT_GROUP_NAME};
pub use neuralynx::{
    extract_common_header, extract_varying_header, NeuralynxRecordingInterface, PER_CHANNEL,
};

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use super::base::{base_metadata, bool_option, extend_metadata_schema, str_option, DataInterface};
use super::{InterfaceError, ValidationError};
use crate::metadata::{DeviceMetadata, ElectrodeGroupMetadata, MetadataDocument};
use crate::nwb::{Device, ElectrodeGroup, NeurodataType, NwbFile, TimeSeries, Timing};
use crate::schema::{ParamType, Parameter, SchemaDocument, SchemaError};

/// Default key of the electrical series entry in `Ecephys`
pub const DEFAULT_ES_KEY: &str = "ElectricalSeries";

/// Frames written with `stub_test`
pub const STUB_FRAMES: usize = 100;

/// Name of the device created when metadata names none
pub const DEFAULT_DEVICE_NAME: &str = "Device";

const DEFAULT_DEVICE_DESCRIPTION: &str = "Ecephys probe. Automatically generated.";
const MICROVOLTS_TO_VOLTS: f64 = 1e-6;

/// Where an electrical series is placed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAs {
    /// `acquisition`
    Raw,
    /// `processing/ecephys/LFP`
    Lfp,
    /// `processing/ecephys/Processed`
    Processed,
}

impl WriteAs {
    /// Parse the `write_as` option
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value {
            "raw" => Ok(Self::Raw),
            "lfp" => Ok(Self::Lfp),
            "processed" => Ok(Self::Processed),
            other => Err(ValidationError::InvalidChoice {
                field: "write_as".to_string(),
                value: other.to_string(),
                message: format!(
                    "'write_as' should be 'raw', 'processed' or 'lfp', but instead received value {}",
                    other
                ),
            }),
        }
    }
}

/// Declared constructor parameters shared by folder-based vendors
pub(crate) fn folder_parameters(with_es_key: bool) -> Vec<Parameter> {
    let mut parameters = vec![
        Parameter::new("folder_path", ParamType::FolderPath)
            .with_description("Folder holding the recording files"),
        Parameter::new("verbose", ParamType::Bool).with_default(true),
    ];
    if with_es_key {
        parameters.push(Parameter::new("es_key", ParamType::Str).with_default(DEFAULT_ES_KEY));
    }
    parameters
}

/// Generic recording interface over any [`RecordingExtractor`]
pub struct RecordingInterface {
    name: String,
    source_data: Map<String, Value>,
    verbose: bool,
    es_key: String,
    extractor: Box<dyn RecordingExtractor>,
    properties: BTreeMap<String, Vec<Value>>,
}

impl RecordingInterface {
    /// Wrap `extractor`; `source_data` is recorded verbatim
    pub fn new(
        name: impl Into<String>,
        extractor: Box<dyn RecordingExtractor>,
        source_data: Map<String, Value>,
        verbose: bool,
    ) -> Self {
        Self {
            name: name.into(),
            source_data,
            verbose,
            es_key: DEFAULT_ES_KEY.to_string(),
            extractor,
            properties: BTreeMap::new(),
        }
    }

    /// Use a different `Ecephys` key for the series metadata
    pub fn with_es_key(mut self, es_key: impl Into<String>) -> Self {
        self.es_key = es_key.into();
        self
    }

    /// Key of the series entry in `Ecephys`
    pub fn es_key(&self) -> &str {
        &self.es_key
    }

    /// The wrapped extractor
    pub fn extractor(&self) -> &dyn RecordingExtractor {
        self.extractor.as_ref()
    }

    /// Attach a per-channel property, written as an electrodes-table column
    pub fn set_property(&mut self, key: &str, values: Vec<Value>) -> Result<(), InterfaceError> {
        let channels = self.extractor.channel_ids().len();
        if values.len() != channels {
            return Err(InterfaceError::Extractor(format!(
                "property '{}' has {} values for {} channels",
                key,
                values.len(),
                channels
            )));
        }
        self.properties.insert(key.to_string(), values);
        Ok(())
    }

    /// Per-channel property values
    pub fn property(&self, key: &str) -> Option<&[Value]> {
        self.properties.get(key).map(Vec::as_slice)
    }

    fn unique_groups(&self) -> Vec<String> {
        let mut groups: Vec<String> = Vec::new();
        for group in self.extractor.channel_groups() {
            if !groups.contains(&group) {
                groups.push(group);
            }
        }
        groups
    }

    fn add_devices(&self, nwbfile: &mut NwbFile, metadata: &MetadataDocument) -> Result<(), InterfaceError> {
        for device in metadata.ecephys_devices()? {
            if !nwbfile.devices.contains_key(&device.name) {
                nwbfile.add_device(to_device(device))?;
            }
        }
        Ok(())
    }

    fn add_electrode_groups(
        &self,
        nwbfile: &mut NwbFile,
        metadata: &MetadataDocument,
    ) -> Result<(), InterfaceError> {
        let described = metadata.ecephys_electrode_groups()?;
        let fallback_device = metadata
            .ecephys_devices()?
            .into_iter()
            .next()
            .map(|device| device.name)
            .unwrap_or_else(|| DEFAULT_DEVICE_NAME.to_string());

        for group_name in self.unique_groups() {
            if nwbfile.electrode_groups.contains_key(&group_name) {
                continue;
            }
            let entry = described
                .iter()
                .find(|group| group.name == group_name)
                .cloned()
                .unwrap_or_else(|| ElectrodeGroupMetadata {
                    name: group_name.clone(),
                    description: None,
                    location: None,
                    device: None,
                });
            let device = entry.device.unwrap_or_else(|| fallback_device.clone());
            if !nwbfile.devices.contains_key(&device) {
                nwbfile.add_device(Device {
                    name: device.clone(),
                    description: Some(DEFAULT_DEVICE_DESCRIPTION.to_string()),
                    manufacturer: None,
                })?;
            }
            nwbfile.add_electrode_group(ElectrodeGroup {
                name: entry.name,
                description: entry.description.unwrap_or_else(|| "no description".to_string()),
                location: entry.location.unwrap_or_else(|| "unknown".to_string()),
                device,
            })?;
        }
        Ok(())
    }

    fn add_electrodes(&self, nwbfile: &mut NwbFile) -> Result<Vec<usize>, InterfaceError> {
        let channel_ids = self.extractor.channel_ids();
        let groups = self.extractor.channel_groups();
        if groups.len() != channel_ids.len() {
            return Err(InterfaceError::Extractor(format!(
                "extractor reports {} group names for {} channels",
                groups.len(),
                channel_ids.len()
            )));
        }

        let mut rows = Vec::with_capacity(channel_ids.len());
        for (index, (channel_id, group)) in channel_ids.iter().zip(&groups).enumerate() {
            let row = match nwbfile.find_electrode(channel_id, group) {
                Some(row) => row,
                None => {
                    let properties: Map<String, Value> = self
                        .properties
                        .iter()
                        .map(|(key, values)| (key.clone(), values[index].clone()))
                        .collect();
                    nwbfile.add_electrode(channel_id.clone(), group, properties)?
                }
            };
            rows.push(row);
        }
        Ok(rows)
    }

    fn build_series(
        &self,
        metadata: &MetadataDocument,
        electrodes: Vec<usize>,
        stub_test: bool,
    ) -> Result<TimeSeries, InterfaceError> {
        let num_frames = self.extractor.num_frames();
        let end_frame = if stub_test {
            num_frames.min(STUB_FRAMES)
        } else {
            num_frames
        };
        let data = self.extractor.traces(0, end_frame)?;

        let entry = metadata.electrical_series(&self.es_key)?;
        let name = entry
            .as_ref()
            .map(|entry| entry.name.clone())
            .unwrap_or_else(|| self.es_key.clone());
        let description = entry
            .and_then(|entry| entry.description)
            .unwrap_or_else(|| format!("Acquisition traces for the {}.", name));

        let timing = Timing::Rate {
            rate: self.extractor.sampling_frequency(),
            starting_time: 0.0,
        };
        let mut series = TimeSeries::new(name, data, timing)
            .with_neurodata_type(NeurodataType::ElectricalSeries)
            .with_description(description)
            .with_unit("volts")
            .with_electrodes(electrodes);

        if let Some(gains) = self.extractor.channel_gains() {
            let offset = uniform_offset(self.extractor.channel_offsets())?;
            series = series
                .with_scaling(MICROVOLTS_TO_VOLTS, offset * MICROVOLTS_TO_VOLTS)
                .with_channel_conversion(gains);
        }
        Ok(series)
    }
}

/// The shared offset of all channels, or an error naming the distinct values
fn uniform_offset(offsets: Option<Vec<f64>>) -> Result<f64, ValidationError> {
    let offsets = offsets.unwrap_or_default();
    let mut distinct: Vec<f64> = Vec::new();
    for offset in offsets {
        if !distinct.contains(&offset) {
            distinct.push(offset);
        }
    }
    match distinct.as_slice() {
        [] => Ok(0.0),
        [offset] => Ok(*offset),
        _ => Err(ValidationError::HeterogeneousValues {
            field: "offset".to_string(),
            values: distinct,
        }),
    }
}

fn to_device(device: DeviceMetadata) -> Device {
    Device {
        name: device.name,
        description: device.description,
        manufacturer: device.manufacturer,
    }
}

impl DataInterface for RecordingInterface {
    fn interface_name(&self) -> &str {
        &self.name
    }

    fn source_data(&self) -> &Map<String, Value> {
        &self.source_data
    }

    fn verbose(&self) -> bool {
        self.verbose
    }

    fn source_parameters(&self) -> Vec<Parameter> {
        vec![
            Parameter::new("extractor", ParamType::Opaque("RecordingExtractor")),
            Parameter::new("verbose", ParamType::Bool).with_default(true),
            Parameter::new("es_key", ParamType::Str).with_default(DEFAULT_ES_KEY),
        ]
    }

    fn get_source_schema(&self) -> Result<SchemaDocument, SchemaError> {
        crate::schema::infer_schema(&self.source_parameters(), &["source_data", "extractor"])
    }

    fn conversion_option_parameters(&self) -> Vec<Parameter> {
        vec![
            Parameter::new("nwbfile", ParamType::Opaque("NWBFile")),
            Parameter::new("metadata", ParamType::optional(ParamType::Dict)),
            Parameter::new("stub_test", ParamType::Bool)
                .with_default(false)
                .with_description("Write only the first 100 frames"),
            Parameter::new("write_as", ParamType::Str)
                .with_default("raw")
                .with_description("'raw', 'lfp' or 'processed'"),
            Parameter::new("write_electrical_series", ParamType::Bool).with_default(true),
        ]
    }

    fn get_metadata_schema(&self) -> Result<Value, SchemaError> {
        let named_entry = json!({
            "type": "object",
            "required": ["name"],
            "properties": {
                "name": {"type": "string"},
                "description": {"type": "string"}
            }
        });
        extend_metadata_schema(json!({
            "properties": {
                "Ecephys": {
                    "type": "object",
                    "properties": {
                        "Device": {"type": "array", "items": named_entry},
                        "ElectrodeGroup": {"type": "array", "items": named_entry},
                        (self.es_key.clone()): named_entry
                    }
                }
            }
        }))
    }

    fn get_metadata(&self) -> Result<MetadataDocument, InterfaceError> {
        let mut metadata = base_metadata();
        let groups: Vec<Value> = self
            .unique_groups()
            .into_iter()
            .map(|group| {
                json!({
                    "name": group,
                    "description": "no description",
                    "location": "unknown",
                    "device": DEFAULT_DEVICE_NAME,
                })
            })
            .collect();

        let ecephys = metadata.section_mut("Ecephys");
        ecephys.insert(
            "Device".to_string(),
            json!([{"name": DEFAULT_DEVICE_NAME, "description": DEFAULT_DEVICE_DESCRIPTION}]),
        );
        ecephys.insert("ElectrodeGroup".to_string(), Value::Array(groups));
        ecephys.insert(
            self.es_key.clone(),
            json!({
                "name": self.es_key,
                "description": format!("Acquisition traces for the {}.", self.es_key),
            }),
        );
        Ok(metadata)
    }

    fn add_to_nwbfile(
        &self,
        nwbfile: &mut NwbFile,
        metadata: &MetadataDocument,
        conversion_options: &Map<String, Value>,
    ) -> Result<(), InterfaceError> {
        let stub_test = bool_option(conversion_options, "stub_test", false)?;
        let write_as = WriteAs::parse(&str_option(conversion_options, "write_as", "raw")?)?;
        let write_electrical_series = bool_option(conversion_options, "write_electrical_series", true)?;

        self.add_devices(nwbfile, metadata)?;
        self.add_electrode_groups(nwbfile, metadata)?;
        let electrodes = self.add_electrodes(nwbfile)?;

        if !write_electrical_series {
            return Ok(());
        }

        let series = self.build_series(metadata, electrodes, stub_test)?;
        let name = series.name.clone();
        match write_as {
            WriteAs::Raw => nwbfile.add_acquisition(series)?,
            WriteAs::Lfp => nwbfile
                .processing_module("ecephys", "Intermediate data from extracellular electrophysiology recordings, e.g., LFP.")
                .add_series("LFP", "LFP", series)?,
            WriteAs::Processed => nwbfile
                .processing_module("ecephys", "Processed extracellular electrophysiology data.")
                .add_series("Processed", "FilteredEphys", series)?,
        }
        if self.verbose {
            log::info!("Added {} ({:?}) from {}", name, write_as, self.name);
        }
        Ok(())
    }
}

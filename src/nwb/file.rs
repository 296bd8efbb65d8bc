use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, Local};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::series::TimeSeries;
use super::NwbError;
use crate::metadata::MetadataDocument;

/// Description used when neither the caller nor an interface supplied one
pub const DEFAULT_SESSION_DESCRIPTION: &str = "no description";

/// Recording hardware
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Name
    pub name: String,
    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Manufacturer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
}

/// Physical grouping of electrodes on one device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectrodeGroup {
    /// Name
    pub name: String,
    /// Description
    pub description: String,
    /// Brain location
    pub location: String,
    /// Name of the owning device
    pub device: String,
}

/// One row of the electrodes table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectrodeRow {
    /// Row id
    pub id: usize,
    /// Channel name as reported by the source
    pub channel_name: String,
    /// Electrode group name
    pub group: String,
    /// Brain location
    pub location: String,
    /// Extra per-channel columns (e.g. `filtering`)
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
}

/// A named data interface inside a processing module (e.g. `LFP`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataContainer {
    /// Name
    pub name: String,
    /// Container type, e.g. `LFP` or `FilteredEphys`
    pub neurodata_type: String,
    /// Series held by the container
    pub series: BTreeMap<String, TimeSeries>,
}

/// Group of derived data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingModule {
    /// Name
    pub name: String,
    /// Description
    pub description: String,
    /// Containers by name
    pub containers: BTreeMap<String, DataContainer>,
}

impl ProcessingModule {
    /// Add a series to a container, creating the container if needed
    pub fn add_series(
        &mut self,
        container_name: &str,
        container_type: &str,
        series: TimeSeries,
    ) -> Result<(), NwbError> {
        let container = self
            .containers
            .entry(container_name.to_string())
            .or_insert_with(|| DataContainer {
                name: container_name.to_string(),
                neurodata_type: container_type.to_string(),
                series: BTreeMap::new(),
            });
        if container.series.contains_key(&series.name) {
            return Err(NwbError::DuplicateName {
                namespace: format!("processing/{}/{}", self.name, container_name),
                name: series.name,
            });
        }
        container.series.insert(series.name.clone(), series);
        Ok(())
    }
}

/// In-memory NWB file: file-level fields plus the object hierarchy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NwbFile {
    /// Object id of the root group
    pub object_id: Uuid,
    /// Globally unique identifier
    pub identifier: String,
    /// Description of the session
    pub session_description: String,
    /// Start of the recording session
    pub session_start_time: DateTime<FixedOffset>,
    /// Creation timestamps
    pub file_create_date: Vec<DateTime<FixedOffset>>,
    /// Lab-specific session id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Free-text notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// People who performed the experiment
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub experimenter: Vec<String>,
    /// Institution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    /// Lab
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lab: Option<String>,
    /// Subject fields, passed through
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Map<String, Value>>,
    /// Any other `NWBFile` fields, passed through
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
    /// Devices by name
    #[serde(default)]
    pub devices: BTreeMap<String, Device>,
    /// Electrode groups by name
    #[serde(default)]
    pub electrode_groups: BTreeMap<String, ElectrodeGroup>,
    /// Electrodes table
    #[serde(default)]
    pub electrodes: Vec<ElectrodeRow>,
    /// Raw acquired data
    #[serde(default)]
    pub acquisition: BTreeMap<String, TimeSeries>,
    /// Presented stimuli
    #[serde(default)]
    pub stimulus: BTreeMap<String, TimeSeries>,
    /// Processing modules by name
    #[serde(default)]
    pub processing: BTreeMap<String, ProcessingModule>,
}

impl NwbFile {
    /// Create an empty file
    pub fn new(
        identifier: impl Into<String>,
        session_description: impl Into<String>,
        session_start_time: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            object_id: Uuid::new_v4(),
            identifier: identifier.into(),
            session_description: session_description.into(),
            session_start_time,
            file_create_date: vec![Local::now().fixed_offset()],
            session_id: None,
            notes: None,
            experimenter: Vec::new(),
            institution: None,
            lab: None,
            subject: None,
            extra: Map::new(),
            devices: BTreeMap::new(),
            electrode_groups: BTreeMap::new(),
            electrodes: Vec::new(),
            acquisition: BTreeMap::new(),
            stimulus: BTreeMap::new(),
            processing: BTreeMap::new(),
        }
    }

    /// Create an empty file from the required `NWBFile` fields.
    ///
    /// `session_start_time` is required; a missing identifier becomes a fresh
    /// UUID and a missing description becomes [`DEFAULT_SESSION_DESCRIPTION`].
    pub fn create_from_metadata(metadata: &MetadataDocument) -> Result<Self, NwbError> {
        let fields = metadata.nwbfile()?;
        let session_start_time = fields
            .parsed_session_start_time()?
            .ok_or_else(|| NwbError::MissingField("NWBFile.session_start_time".to_string()))?;

        Ok(Self::new(
            fields
                .identifier
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            fields
                .session_description
                .unwrap_or_else(|| DEFAULT_SESSION_DESCRIPTION.to_string()),
            session_start_time,
        ))
    }

    /// Copy the optional `NWBFile` fields and the `Subject` namespace
    pub fn apply_metadata(&mut self, metadata: &MetadataDocument) -> Result<(), NwbError> {
        let fields = metadata.nwbfile()?;
        if fields.session_id.is_some() {
            self.session_id = fields.session_id;
        }
        if fields.notes.is_some() {
            self.notes = fields.notes;
        }
        if let Some(experimenter) = fields.experimenter {
            self.experimenter = experimenter;
        }
        if fields.institution.is_some() {
            self.institution = fields.institution;
        }
        if fields.lab.is_some() {
            self.lab = fields.lab;
        }
        self.extra.extend(fields.extra);
        if let Some(subject) = metadata.get("Subject").and_then(Value::as_object) {
            self.subject = Some(subject.clone());
        }
        Ok(())
    }

    /// [`create_from_metadata`](Self::create_from_metadata) followed by
    /// [`apply_metadata`](Self::apply_metadata)
    pub fn from_metadata(metadata: &MetadataDocument) -> Result<Self, NwbError> {
        let mut nwbfile = Self::create_from_metadata(metadata)?;
        nwbfile.apply_metadata(metadata)?;
        Ok(nwbfile)
    }

    /// Add a device
    pub fn add_device(&mut self, device: Device) -> Result<(), NwbError> {
        insert_unique(&mut self.devices, "devices", device.name.clone(), device)
    }

    /// Add an electrode group; its device must already exist
    pub fn add_electrode_group(&mut self, group: ElectrodeGroup) -> Result<(), NwbError> {
        if !self.devices.contains_key(&group.device) {
            return Err(NwbError::InvalidData(format!(
                "electrode group '{}' references unknown device '{}'",
                group.name, group.device
            )));
        }
        insert_unique(&mut self.electrode_groups, "electrode_groups", group.name.clone(), group)
    }

    /// Row index of the electrode for `channel_name` in `group`
    pub fn find_electrode(&self, channel_name: &str, group: &str) -> Option<usize> {
        self.electrodes
            .iter()
            .position(|row| row.channel_name == channel_name && row.group == group)
    }

    /// Append an electrode row and return its index; the group must exist
    pub fn add_electrode(
        &mut self,
        channel_name: impl Into<String>,
        group: &str,
        properties: Map<String, Value>,
    ) -> Result<usize, NwbError> {
        let location = self
            .electrode_groups
            .get(group)
            .map(|g| g.location.clone())
            .ok_or_else(|| {
                NwbError::InvalidData(format!("electrode references unknown group '{}'", group))
            })?;
        let id = self.electrodes.len();
        self.electrodes.push(ElectrodeRow {
            id,
            channel_name: channel_name.into(),
            group: group.to_string(),
            location,
            properties,
        });
        Ok(id)
    }

    /// Place a series in the acquisition namespace
    pub fn add_acquisition(&mut self, series: TimeSeries) -> Result<(), NwbError> {
        insert_unique(&mut self.acquisition, "acquisition", series.name.clone(), series)
    }

    /// Place a series in the stimulus namespace
    pub fn add_stimulus(&mut self, series: TimeSeries) -> Result<(), NwbError> {
        insert_unique(&mut self.stimulus, "stimulus", series.name.clone(), series)
    }

    /// Processing module `name`, created with `description` if absent
    pub fn processing_module(&mut self, name: &str, description: &str) -> &mut ProcessingModule {
        self.processing
            .entry(name.to_string())
            .or_insert_with(|| ProcessingModule {
                name: name.to_string(),
                description: description.to_string(),
                containers: BTreeMap::new(),
            })
    }

    /// Every series with its location, e.g. `acquisition/ElectricalSeries`
    pub fn series(&self) -> Vec<(String, &TimeSeries)> {
        let acquisition = self
            .acquisition
            .iter()
            .map(|(name, series)| (format!("acquisition/{}", name), series));
        let stimulus = self
            .stimulus
            .iter()
            .map(|(name, series)| (format!("stimulus/{}", name), series));
        let processing = self.processing.values().flat_map(|module| {
            module.containers.values().flat_map(move |container| {
                container.series.iter().map(move |(name, series)| {
                    (
                        format!("processing/{}/{}/{}", module.name, container.name, name),
                        series,
                    )
                })
            })
        });
        acquisition.chain(stimulus).chain(processing).collect()
    }

    /// Mutable variant of [`series`](Self::series)
    pub fn series_mut(&mut self) -> Vec<(String, &mut TimeSeries)> {
        let acquisition = self
            .acquisition
            .iter_mut()
            .map(|(name, series)| (format!("acquisition/{}", name), series));
        let stimulus = self
            .stimulus
            .iter_mut()
            .map(|(name, series)| (format!("stimulus/{}", name), series));
        let processing = self.processing.values_mut().flat_map(|module| {
            let module_name = module.name.clone();
            module.containers.values_mut().flat_map(move |container| {
                let prefix = format!("processing/{}/{}", module_name, container.name);
                container
                    .series
                    .iter_mut()
                    .map(move |(name, series)| (format!("{}/{}", prefix, name), series))
            })
        });
        acquisition.chain(stimulus).chain(processing).collect()
    }

    /// Check every series and every cross reference
    pub fn validate(&self) -> Result<(), NwbError> {
        for group in self.electrode_groups.values() {
            if !self.devices.contains_key(&group.device) {
                return Err(NwbError::InvalidData(format!(
                    "electrode group '{}' references unknown device '{}'",
                    group.name, group.device
                )));
            }
        }
        for (location, series) in self.series() {
            series.validate()?;
            if let Some(rows) = &series.electrodes {
                if let Some(row) = rows.iter().find(|row| **row >= self.electrodes.len()) {
                    return Err(NwbError::InvalidData(format!(
                        "{} references electrode {} but the table has {} rows",
                        location,
                        row,
                        self.electrodes.len()
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Dataset location of a series' data, e.g. `acquisition/ElectricalSeries/data`
pub fn dataset_location(series_location: &str) -> String {
    format!("{}/data", series_location)
}

fn insert_unique<T>(
    map: &mut BTreeMap<String, T>,
    namespace: &str,
    name: String,
    value: T,
) -> Result<(), NwbError> {
    if map.contains_key(&name) {
        return Err(NwbError::DuplicateName {
            namespace: namespace.to_string(),
            name,
        });
    }
    map.insert(name, value);
    Ok(())
}

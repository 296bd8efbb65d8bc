use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::sections::{DeviceMetadata, ElectrodeGroupMetadata, NwbFileMetadata, SeriesMetadata};
use super::MetadataError;

/// Recursively merge `update` into `base`.
///
/// Mappings present on both sides are merged key by key; every other value in
/// `update` replaces the one in `base`. Lists are replaced, not concatenated.
pub fn dict_deep_update(base: &mut Map<String, Value>, update: &Map<String, Value>) {
    for (key, value) in update {
        if let (Some(Value::Object(base_inner)), Value::Object(update_inner)) =
            (base.get_mut(key), value)
        {
            dict_deep_update(base_inner, update_inner);
            continue;
        }
        base.insert(key.clone(), value.clone());
    }
}

/// Nested metadata mapping with deep-merge semantics.
///
/// Missing namespaces are created on demand by [`section_mut`](Self::section_mut),
/// so interfaces can write `NWBFile.notes` without checking for `NWBFile` first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataDocument(Map<String, Value>);

impl MetadataDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON value; the top level must be an object
    pub fn from_value(value: Value) -> Result<Self, MetadataError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(MetadataError::NotAMapping(json_kind(&other).to_string())),
        }
    }

    /// Borrow the underlying mapping
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume into the underlying mapping
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Clone into a plain JSON value
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    /// Whether the document has no keys
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Top-level value for `key`
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Value at a nested path, e.g. `["NWBFile", "identifier"]`
    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut current = self.0.get(*first)?;
        for key in rest {
            current = current.as_object()?.get(*key)?;
        }
        Some(current)
    }

    /// Set a top-level value
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Remove a top-level value
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Mutable access to a top-level namespace, created if absent.
    ///
    /// A non-mapping value stored under `key` is replaced by an empty mapping.
    pub fn section_mut(&mut self, key: &str) -> &mut Map<String, Value> {
        let entry = self
            .0
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        match entry {
            Value::Object(map) => map,
            _ => unreachable!("section was just replaced by a mapping"),
        }
    }

    /// Merge `other` into this document in place
    pub fn deep_update(&mut self, other: &MetadataDocument) {
        dict_deep_update(&mut self.0, &other.0);
    }

    /// Return a new document with `other` merged over this one
    pub fn merged(&self, other: &MetadataDocument) -> Self {
        let mut result = self.clone();
        result.deep_update(other);
        result
    }

    /// Deserialize the value at `path` into a typed view.
    ///
    /// Returns `Ok(None)` when the path is absent.
    pub fn section<T: DeserializeOwned>(&self, path: &[&str]) -> Result<Option<T>, MetadataError> {
        match self.get_path(path) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|source| MetadataError::InvalidSection {
                    section: path.join("."),
                    source,
                }),
        }
    }

    /// Typed view of the `NWBFile` namespace
    pub fn nwbfile(&self) -> Result<NwbFileMetadata, MetadataError> {
        Ok(self.section(&["NWBFile"])?.unwrap_or_default())
    }

    /// Set a single field in the `NWBFile` namespace
    pub fn set_nwbfile_field(&mut self, key: &str, value: impl Into<Value>) {
        self.section_mut("NWBFile").insert(key.to_string(), value.into());
    }

    /// `Ecephys.Device` entries
    pub fn ecephys_devices(&self) -> Result<Vec<DeviceMetadata>, MetadataError> {
        Ok(self.section(&["Ecephys", "Device"])?.unwrap_or_default())
    }

    /// `Ecephys.ElectrodeGroup` entries
    pub fn ecephys_electrode_groups(&self) -> Result<Vec<ElectrodeGroupMetadata>, MetadataError> {
        Ok(self.section(&["Ecephys", "ElectrodeGroup"])?.unwrap_or_default())
    }

    /// `Ecephys.<es_key>` entry describing one electrical series
    pub fn electrical_series(&self, es_key: &str) -> Result<Option<SeriesMetadata>, MetadataError> {
        self.section(&["Ecephys", es_key])
    }

    /// `Behavior.Audio` entries, one per audio file
    pub fn audio_series(&self) -> Result<Vec<SeriesMetadata>, MetadataError> {
        Ok(self.section(&["Behavior", "Audio"])?.unwrap_or_default())
    }
}

impl From<Map<String, Value>> for MetadataDocument {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for MetadataDocument {
    type Error = MetadataError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

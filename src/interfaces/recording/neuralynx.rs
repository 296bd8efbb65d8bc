//! Neuralynx continuous recordings (`.ncs` folders).

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::{folder_parameters, RecordingExtractor, RecordingInterface};
use crate::interfaces::base::{
    bool_option, has_extension, source_str, validate_source_data, DataInterface, SOURCE_SCHEMA_EXCLUDE,
};
use crate::interfaces::InterfaceError;
use crate::metadata::{dict_intersection, parse_naive_datetime, MetadataDocument};
use crate::nwb::NwbFile;
use crate::schema::{infer_schema, Parameter, SchemaError};

const RECORDING_OPENED: &str = "recording_opened";
const RECORDING_CLOSED: &str = "recording_closed";

/// Key of the per-channel values inside `NWBFile.notes`
pub const PER_CHANNEL: &str = "per_channel";

/// Neuralynx recording interface.
///
/// Enumerates the `.ncs` files of a session folder in natural order and
/// attaches a per-channel `filtering` property built from the `dsp*` header
/// entries. Metadata comes from the header fields shared by every channel.
pub struct NeuralynxRecordingInterface {
    inner: RecordingInterface,
    ncs_files: Vec<PathBuf>,
}

impl NeuralynxRecordingInterface {
    /// Registration name
    pub const NAME: &'static str = "NeuralynxRecordingInterface";

    /// Open the session in `folder_path`, parsed by `extractor`
    pub fn new(
        folder_path: impl AsRef<Path>,
        extractor: Box<dyn RecordingExtractor>,
        verbose: bool,
    ) -> Result<Self, InterfaceError> {
        let folder_path = folder_path.as_ref();
        let mut ncs_files = Vec::new();
        for entry in std::fs::read_dir(folder_path)? {
            let path = entry?.path();
            if has_extension(&path, "ncs") {
                ncs_files.push(path);
            }
        }
        ncs_files.sort_by(|a, b| natural_cmp(&a.to_string_lossy(), &b.to_string_lossy()));

        let mut source_data = Map::new();
        source_data.insert(
            "folder_path".to_string(),
            Value::String(folder_path.to_string_lossy().into_owned()),
        );
        source_data.insert("verbose".to_string(), Value::Bool(verbose));

        let mut inner = RecordingInterface::new(Self::NAME, extractor, source_data, verbose);
        let filtering = filtering_per_channel(&inner.extractor().channel_headers());
        if inner.set_property("filtering", filtering).is_err() {
            log::warn!("filtering could not be extracted.");
        }

        let interface = Self { inner, ncs_files };
        validate_source_data(&interface)?;
        Ok(interface)
    }

    /// Create from a source-data mapping, validated against the source schema
    pub fn from_source_data(
        source_data: &Map<String, Value>,
        extractor: Box<dyn RecordingExtractor>,
    ) -> Result<Self, InterfaceError> {
        infer_schema(&folder_parameters(false), SOURCE_SCHEMA_EXCLUDE)?
            .validate(&Value::Object(source_data.clone()), Self::NAME)?;
        let folder_path = source_str(source_data, "folder_path")?;
        let verbose = bool_option(source_data, "verbose", true)?;
        Self::new(folder_path, extractor, verbose)
    }

    /// Continuous-signal files, in natural order
    pub fn ncs_files(&self) -> &[PathBuf] {
        &self.ncs_files
    }

    /// The shared recording base
    pub fn recording(&self) -> &RecordingInterface {
        &self.inner
    }
}

impl DataInterface for NeuralynxRecordingInterface {
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
        folder_parameters(false)
    }

    fn conversion_option_parameters(&self) -> Vec<Parameter> {
        self.inner.conversion_option_parameters()
    }

    fn get_metadata_schema(&self) -> Result<Value, SchemaError> {
        self.inner.get_metadata_schema()
    }

    fn get_metadata(&self) -> Result<MetadataDocument, InterfaceError> {
        let headers = self.inner.extractor().channel_headers();
        let mut header = extract_common_header(&headers);
        header.retain(|key, _| !is_filter_key(key));

        let mut nwbfile = Map::new();
        if let Some(session_id) = header.remove("SessionUUID") {
            nwbfile.insert("session_id".to_string(), session_id);
        }
        if let Some(opened) = header.remove(RECORDING_OPENED) {
            nwbfile.insert("session_start_time".to_string(), opened);
        }

        let device_name = header
            .remove("AcquisitionSystem")
            .or_else(|| header.remove("HardwareSubSystemType"));
        let mut devices = Vec::new();
        if let Some(name) = device_name {
            let mut device = Map::new();
            device.insert("name".to_string(), name);
            if header.contains_key("ApplicationName") || header.contains_key("ApplicationVersion") {
                let application = header.remove("ApplicationName").map(stringify).unwrap_or_default();
                let version = header.remove("ApplicationVersion").map(stringify).unwrap_or_default();
                device.insert(
                    "description".to_string(),
                    Value::String(format!("{} {}", application, version)),
                );
            }
            devices.push(Value::Object(device));
        }

        let mut notes: Map<String, Value> = header
            .into_iter()
            .map(|(key, value)| (key, Value::String(stringify(value))))
            .collect();
        let varying = extract_varying_header(&headers);
        if !varying.is_empty() {
            notes.insert(PER_CHANNEL.to_string(), Value::Object(varying));
        }
        nwbfile.insert(
            "notes".to_string(),
            Value::String(to_ascii_json(&Value::Object(notes))?),
        );

        let mut vendor = MetadataDocument::new();
        vendor.insert("NWBFile", Value::Object(nwbfile));
        if !devices.is_empty() {
            vendor.section_mut("Ecephys").insert("Device".to_string(), Value::Array(devices));
        }

        let mut metadata = self.inner.get_metadata()?;
        metadata.deep_update(&vendor);
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

/// Header entries shared by every channel.
///
/// Session open and close times usually differ by a few microseconds between
/// channels and drop out of the intersection; when every channel reports them
/// they come back as the earliest open and the latest close.
pub fn extract_common_header(headers: &[Map<String, Value>]) -> Map<String, Value> {
    let mut common = dict_intersection(headers);

    if !common.contains_key(RECORDING_OPENED) {
        if let Some(opened) = extreme_timestamp(headers, RECORDING_OPENED, Ordering::Less) {
            common.insert(RECORDING_OPENED.to_string(), opened);
        }
    }
    if !common.contains_key(RECORDING_CLOSED) {
        if let Some(closed) = extreme_timestamp(headers, RECORDING_CLOSED, Ordering::Greater) {
            common.insert(RECORDING_CLOSED.to_string(), closed);
        }
    }
    common
}

/// Header entries that differ between channels.
///
/// Each key maps to one stringified value per channel, `null` where a channel
/// lacks the key. Filter entries are left out; they live in the `filtering`
/// property.
pub fn extract_varying_header(headers: &[Map<String, Value>]) -> Map<String, Value> {
    let common = dict_intersection(headers);
    let mut varying = Map::new();
    for key in headers.iter().flat_map(|header| header.keys()) {
        if common.contains_key(key) || varying.contains_key(key) || is_filter_key(key) {
            continue;
        }
        let values = headers
            .iter()
            .map(|header| match header.get(key) {
                Some(value) => Value::String(stringify(value.clone())),
                None => Value::Null,
            })
            .collect();
        varying.insert(key.clone(), Value::Array(values));
    }
    varying
}

/// Serialize with every non-ASCII character written as a `\uXXXX` escape
fn to_ascii_json(value: &Value) -> Result<String, serde_json::Error> {
    let text = serde_json::to_string(value)?;
    let mut escaped = String::with_capacity(text.len());
    let mut units = [0u16; 2];
    for c in text.chars() {
        if c.is_ascii() {
            escaped.push(c);
        } else {
            for unit in c.encode_utf16(&mut units) {
                escaped.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    Ok(escaped)
}

/// The minimum (`Less`) or maximum (`Greater`) of `key`, if every header has it
fn extreme_timestamp(headers: &[Map<String, Value>], key: &str, keep: Ordering) -> Option<Value> {
    let values: Option<Vec<&Value>> = headers.iter().map(|header| header.get(key)).collect();
    values?
        .into_iter()
        .reduce(|best, candidate| {
            if compare_timestamps(candidate, best) == keep {
                candidate
            } else {
                best
            }
        })
        .cloned()
}

fn compare_timestamps(a: &Value, b: &Value) -> Ordering {
    let (a, b) = (stringify(a.clone()), stringify(b.clone()));
    match (parse_naive_datetime(&a), parse_naive_datetime(&b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => a.cmp(&b),
    }
}

fn is_filter_key(key: &str) -> bool {
    key.to_lowercase().starts_with("dsp")
}

/// One JSON string per channel with its `dsp*` entries; list values are
/// joined with spaces.
fn filtering_per_channel(headers: &[Map<String, Value>]) -> Vec<Value> {
    headers
        .iter()
        .map(|header| {
            let filters: Map<String, Value> = header
                .iter()
                .filter(|(key, _)| is_filter_key(key))
                .map(|(key, value)| {
                    let text = match value {
                        Value::Array(items) => items
                            .iter()
                            .map(|item| stringify(item.clone()))
                            .collect::<Vec<_>>()
                            .join(" "),
                        other => stringify(other.clone()),
                    };
                    (key.clone(), Value::String(text))
                })
                .collect();
            let filters = Value::Object(filters);
            Value::String(to_ascii_json(&filters).unwrap_or_else(|_| filters.to_string()))
        })
        .collect()
}

fn stringify(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

/// Compare strings treating embedded digit runs as numbers (`CSC2` < `CSC10`)
pub(crate) fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a_chars = a.chars().peekable();
    let mut b_chars = b.chars().peekable();
    loop {
        match (a_chars.peek().copied(), b_chars.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let a_digits = take_digits(&mut a_chars);
                let b_digits = take_digits(&mut b_chars);
                let a_trimmed = a_digits.trim_start_matches('0');
                let b_trimmed = b_digits.trim_start_matches('0');
                let ordering = a_trimmed
                    .len()
                    .cmp(&b_trimmed.len())
                    .then_with(|| a_trimmed.cmp(b_trimmed))
                    .then_with(|| a_digits.len().cmp(&b_digits.len()));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(x), Some(y)) => {
                if x != y {
                    return x.cmp(&y);
                }
                a_chars.next();
                b_chars.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
        digits.push(c);
        chars.next();
    }
    digits
}

//! Axon Binary Format (`.abf`) intracellular recordings.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use serde_json::{json, Map, Value};

use super::IcephysExtractor;
use crate::interfaces::base::{
    base_metadata, bool_option, extend_metadata_schema, has_extension, suffix, validate_source_data,
    DataInterface,
};
use crate::interfaces::{InterfaceError, ValidationError};
use crate::metadata::{load_dict_from_file, parse_naive_datetime, MetadataDocument};
use crate::nwb::{NeurodataType, NwbFile, SeriesData, TimeSeries, Timing};
use crate::schema::{ParamType, Parameter, SchemaError};

/// `stimulus_type` of sessions the metadata file does not describe
pub const DEFAULT_STIMULUS_TYPE: &str = "not described";

/// Top-level metadata key of the DANDI icephys lab metadata
pub const LAB_METADATA_KEY: &str = "ndx-dandi-icephys";

/// Frames kept per sweep with `stub_test`
pub const ABF_STUB_FRAMES: usize = 100;

const START_DATE: &str = "uFileStartDate";
const START_TIME_MS: &str = "uFileStartTimeMS";
const REC_DATETIME: &str = "rec_datetime";
const SESSION_START_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// ABF interface over one or more `.abf` files.
///
/// Each file is one recording session. The session start of the whole
/// conversion is taken from the first file; every session records its start
/// relative to it. An optional metadata file (JSON or TOML) fills in the
/// experimenter, subject, lab metadata and per-session stimulus details.
pub struct AbfInterface {
    file_paths: Vec<PathBuf>,
    metadata_file_path: Option<PathBuf>,
    readers: Vec<Box<dyn IcephysExtractor>>,
    source_data: Map<String, Value>,
    verbose: bool,
}

impl AbfInterface {
    /// Registration name
    pub const NAME: &'static str = "AbfInterface";

    /// Create an interface over `file_paths`, one reader per file
    pub fn new<P: AsRef<Path>>(
        file_paths: &[P],
        readers: Vec<Box<dyn IcephysExtractor>>,
        metadata_file_path: Option<&Path>,
        verbose: bool,
    ) -> Result<Self, InterfaceError> {
        let file_paths: Vec<PathBuf> = file_paths.iter().map(|p| p.as_ref().to_path_buf()).collect();

        let suffixes: Vec<String> = file_paths
            .iter()
            .filter(|path| !has_extension(path, "abf"))
            .map(|path| suffix(path))
            .collect();
        if !suffixes.is_empty() {
            return Err(InterfaceError::UnsupportedFormat {
                modality: "icephys".to_string(),
                expected: "ABF file".to_string(),
                suffixes,
            });
        }
        if file_paths.is_empty() {
            return Err(ValidationError::Missing {
                field: "file_paths".to_string(),
                message: "At least one ABF file is required.".to_string(),
            }
            .into());
        }
        if readers.len() != file_paths.len() {
            return Err(InterfaceError::Extractor(format!(
                "{} readers for {} ABF files",
                readers.len(),
                file_paths.len()
            )));
        }

        let mut source_data = Map::new();
        source_data.insert(
            "file_paths".to_string(),
            file_paths
                .iter()
                .map(|path| Value::String(path.to_string_lossy().into_owned()))
                .collect(),
        );
        source_data.insert(
            "metadata_file_path".to_string(),
            metadata_file_path
                .map(|path| Value::String(path.to_string_lossy().into_owned()))
                .unwrap_or(Value::Null),
        );
        source_data.insert("verbose".to_string(), Value::Bool(verbose));

        let interface = Self {
            file_paths,
            metadata_file_path: metadata_file_path.map(Path::to_path_buf),
            readers,
            source_data,
            verbose,
        };
        validate_source_data(&interface)?;
        Ok(interface)
    }

    /// Source files, in the order given
    pub fn file_paths(&self) -> &[PathBuf] {
        &self.file_paths
    }

    /// Contents of the metadata file, or an empty mapping when none is usable
    fn metafile(&self) -> Result<Map<String, Value>, InterfaceError> {
        match &self.metadata_file_path {
            Some(path) if path.is_file() => Ok(load_dict_from_file(path)?.into_map()),
            Some(path) => {
                log::warn!("Metadata file {} not found; skipping it", path.display());
                Ok(Map::new())
            }
            None => Ok(Map::new()),
        }
    }

    /// One entry per file with its relative start and recording table ids
    fn sessions(&self, metafile: &Map<String, Value>) -> Result<Vec<Value>, InterfaceError> {
        let Some(first) = self.readers.first() else {
            return Ok(Vec::new());
        };
        let first_start = start_datetime(first.as_ref())?;
        let described: &[Value] = metafile
            .get("recording_sessions")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let (mut intracellular, mut simultaneous) = (0usize, 0usize);
        let mut sessions = Vec::with_capacity(self.readers.len());
        for (sequential, reader) in self.readers.iter().enumerate() {
            let file_name = reader.file_name();
            let extra = described
                .iter()
                .find(|session| session.get("abf_file_name").and_then(Value::as_str) == Some(file_name.as_str()));

            let start = start_datetime(reader.as_ref())?;
            let relative = (start - first_start).num_milliseconds() as f64 / 1000.0;

            let mut recordings = Vec::new();
            for _ in 0..reader.num_segments() {
                for _ in 0..reader.num_electrodes() {
                    recordings.push(json!({
                        "intracellular_recordings_table_id": intracellular,
                        "simultaneous_recordings_table_id": simultaneous,
                        "sequential_recordings_table_id": sequential,
                    }));
                    intracellular += 1;
                }
                simultaneous += 1;
            }

            sessions.push(json!({
                "abf_file_name": file_name,
                "relative_session_start_time": relative,
                "icephys_experiment_type": extra
                    .and_then(|session| session.get("icephys_experiment_type"))
                    .cloned()
                    .unwrap_or(Value::Null),
                "stimulus_type": extra
                    .and_then(|session| session.get("stimulus_type"))
                    .cloned()
                    .unwrap_or_else(|| json!(DEFAULT_STIMULUS_TYPE)),
                "recordings": recordings,
            }));
        }
        Ok(sessions)
    }

    fn parameters() -> Vec<Parameter> {
        vec![
            Parameter::new("file_paths", ParamType::list(ParamType::FilePath))
                .with_description("Array of paths to ABF files."),
            Parameter::new("metadata_file_path", ParamType::optional(ParamType::FilePath))
                .with_description("Path to JSON file containing metadata for this experiment."),
            Parameter::new("verbose", ParamType::Bool).with_default(true),
        ]
    }
}

/// Recording start of an ABF file.
///
/// Built from `uFileStartDate` (`YYYYMMDD`) and `uFileStartTimeMS`, rounded to
/// the second. When either is missing this warns and falls back to
/// `rec_datetime`.
pub fn start_datetime(reader: &dyn IcephysExtractor) -> Result<NaiveDateTime, InterfaceError> {
    let header = reader.header();
    let file_name = reader.file_name();

    if let (Some(date), Some(time_ms)) = (header.get(START_DATE), header.get(START_TIME_MS)) {
        let date_text = match date {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        let midnight = NaiveDate::parse_from_str(&date_text, "%Y%m%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .ok_or_else(|| {
                InterfaceError::Extractor(format!(
                    "{} '{}' in {} is not a YYYYMMDD date",
                    START_DATE, date_text, file_name
                ))
            })?;
        let seconds = time_ms
            .as_f64()
            .map(|ms| (ms / 1000.0).round() as i64)
            .ok_or_else(|| {
                InterfaceError::Extractor(format!("{} in {} is not a number", START_TIME_MS, file_name))
            })?;
        return TimeDelta::try_seconds(seconds)
            .and_then(|offset| midnight.checked_add_signed(offset))
            .ok_or_else(|| {
                InterfaceError::Extractor(format!("{} in {} is out of range", START_TIME_MS, file_name))
            });
    }

    log::warn!(
        "{} or {} not found in {}, datetime for recordings might be wrongly stored.",
        START_DATE,
        START_TIME_MS,
        file_name
    );
    header
        .get(REC_DATETIME)
        .and_then(Value::as_str)
        .and_then(parse_naive_datetime)
        .ok_or_else(|| InterfaceError::Extractor(format!("{} carries no {}", file_name, REC_DATETIME)))
}

fn text(value: &Value) -> Value {
    match value {
        Value::String(_) => value.clone(),
        other => Value::String(other.to_string()),
    }
}

impl DataInterface for AbfInterface {
    fn interface_name(&self) -> &str {
        Self::NAME
    }

    fn source_data(&self) -> &Map<String, Value> {
        &self.source_data
    }

    fn verbose(&self) -> bool {
        self.verbose
    }

    fn source_parameters(&self) -> Vec<Parameter> {
        Self::parameters()
    }

    fn conversion_option_parameters(&self) -> Vec<Parameter> {
        vec![
            Parameter::new("nwbfile", ParamType::Opaque("NWBFile")),
            Parameter::new("metadata", ParamType::optional(ParamType::Dict)),
            Parameter::new("stub_test", ParamType::Bool).with_default(false),
        ]
    }

    fn get_metadata_schema(&self) -> Result<Value, SchemaError> {
        extend_metadata_schema(json!({
            "properties": {
                "Icephys": {
                    "type": "object",
                    "properties": {
                        "Sessions": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "required": ["abf_file_name", "relative_session_start_time"],
                                "properties": {
                                    "abf_file_name": {"type": "string"},
                                    "relative_session_start_time": {"type": "number"},
                                    "stimulus_type": {"type": "string"},
                                    "recordings": {"type": "array"}
                                }
                            }
                        }
                    }
                },
                LAB_METADATA_KEY: {"type": "object"}
            }
        }))
    }

    fn get_metadata(&self) -> Result<MetadataDocument, InterfaceError> {
        let metafile = self.metafile()?;
        let mut vendor = MetadataDocument::new();

        if let Some(first) = self.readers.first() {
            let start = start_datetime(first.as_ref())?;
            vendor.set_nwbfile_field(
                "session_start_time",
                start.format(SESSION_START_FORMAT).to_string(),
            );
        }
        match metafile.get("experimenter") {
            Some(Value::Array(names)) => {
                vendor.set_nwbfile_field("experimenter", Value::Array(names.iter().map(text).collect()))
            }
            Some(name) => vendor.set_nwbfile_field("experimenter", json!([text(name)])),
            None => {}
        }

        let subject = vendor.section_mut("Subject");
        for key in ["subject_id", "species"] {
            if let Some(value) = metafile.get(key) {
                subject.insert(key.to_string(), text(value));
            }
        }
        subject.insert(
            "sex".to_string(),
            metafile.get("sex").map(text).unwrap_or_else(|| json!("U")),
        );
        if let Some(dob) = metafile.get("dob").filter(|dob| !dob.is_null()) {
            subject.insert("date_of_birth".to_string(), text(dob));
        }

        let field = |key: &str| metafile.get(key).map(text).unwrap_or_else(|| json!(""));
        vendor.insert(
            LAB_METADATA_KEY,
            json!({
                "cell_id": field("cell_id"),
                "slice_id": field("slice_id"),
                "targeted_layer": field("targeted_layer"),
                "inferred_layer": field("estimate_laminate"),
            }),
        );

        let sessions = self.sessions(&metafile)?;
        vendor
            .section_mut("Icephys")
            .insert("Sessions".to_string(), Value::Array(sessions));

        let mut metadata = base_metadata();
        metadata.deep_update(&vendor);
        Ok(metadata)
    }

    fn add_to_nwbfile(
        &self,
        nwbfile: &mut NwbFile,
        metadata: &MetadataDocument,
        conversion_options: &Map<String, Value>,
    ) -> Result<(), InterfaceError> {
        let stub_test = bool_option(conversion_options, "stub_test", false)?;

        let sessions = match metadata.get_path(&["Icephys", "Sessions"]) {
            Some(Value::Array(sessions)) => sessions.clone(),
            Some(_) => {
                return Err(ValidationError::WrongType {
                    field: "Icephys.Sessions".to_string(),
                    expected: "a list".to_string(),
                }
                .into())
            }
            None => self.sessions(&self.metafile()?)?,
        };
        if sessions.len() != self.readers.len() {
            return Err(ValidationError::CountMismatch {
                field: "Icephys.Sessions".to_string(),
                found: sessions.len(),
                expected: self.readers.len(),
                message: format!(
                    "Incomplete metadata (number of sessions in Icephys {}) is not equal to the number of ABF files {}",
                    sessions.len(),
                    self.readers.len()
                ),
            }
            .into());
        }

        let mut index = 0usize;
        for (reader, session) in self.readers.iter().zip(&sessions) {
            let session_start = session
                .get("relative_session_start_time")
                .and_then(Value::as_f64)
                .unwrap_or(0.0);
            let stimulus_type = session
                .get("stimulus_type")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_STIMULUS_TYPE);
            let rate = reader.sampling_frequency();

            let mut elapsed_frames = 0usize;
            for segment in 0..reader.num_segments() {
                let full = reader.segment(segment)?;
                let starting_time = session_start + elapsed_frames as f64 / rate;
                elapsed_frames += full.num_frames;
                let data = if stub_test {
                    full.truncated(ABF_STUB_FRAMES)
                } else {
                    full
                };

                for electrode in 0..data.num_channels {
                    let series = TimeSeries::new(
                        format!("PatchClampSeries{:03}", index),
                        SeriesData::single_channel(data.channel(electrode)),
                        Timing::Rate { rate, starting_time },
                    )
                    .with_neurodata_type(NeurodataType::PatchClampSeries)
                    .with_description(format!(
                        "{} sweep {} electrode {} (stimulus: {})",
                        reader.file_name(),
                        segment,
                        electrode,
                        stimulus_type
                    ))
                    .with_unit(reader.unit());
                    nwbfile.add_acquisition(series)?;
                    index += 1;
                }
            }
        }

        if self.verbose {
            log::info!("Added {} patch-clamp series from {} ABF files", index, self.readers.len());
        }
        Ok(())
    }
}

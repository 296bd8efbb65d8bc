//! WAV audio as `AcousticWaveformSeries`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::{json, Map, Value};

use super::base::{
    base_metadata, bool_option, extend_metadata_schema, has_extension, str_option, suffix,
    usize_option, validate_source_data, DataInterface, SOURCE_SCHEMA_EXCLUDE,
};
use super::{InterfaceError, ValidationError};
use crate::metadata::MetadataDocument;
use crate::nwb::{NeurodataType, NwbFile, SeriesData, TimeSeries, Timing};
use crate::schema::{infer_schema, ParamType, Parameter, SchemaError};

/// Default `description` of each audio entry
pub const AUDIO_DESCRIPTION: &str = "Acoustic waveform series.";

/// Unit written on every audio series
pub const AUDIO_UNIT: &str = "audio unit";

/// Frames kept per file with `stub_test`
pub const DEFAULT_STUB_FRAMES: usize = 1000;

/// Namespaces audio can be placed in
const WRITE_AS_CHOICES: [&str; 2] = ["stimulus", "acquisition"];

/// Converts one or more WAV files into `AcousticWaveformSeries`.
///
/// Each file becomes one series, described by the matching entry of
/// `Behavior.Audio` in the metadata.
#[derive(Debug)]
pub struct AudioInterface {
    file_paths: Vec<PathBuf>,
    source_data: Map<String, Value>,
    verbose: bool,
}

impl AudioInterface {
    /// Registration name
    pub const NAME: &'static str = "AudioInterface";

    /// Create an interface over `file_paths`; every file must be a `.wav`
    pub fn new<P: AsRef<Path>>(file_paths: &[P], verbose: bool) -> Result<Self, InterfaceError> {
        let file_paths: Vec<PathBuf> = file_paths.iter().map(|p| p.as_ref().to_path_buf()).collect();

        let suffixes: Vec<String> = file_paths
            .iter()
            .filter(|path| !has_extension(path, "wav"))
            .map(|path| suffix(path))
            .collect();
        if !suffixes.is_empty() {
            return Err(InterfaceError::UnsupportedFormat {
                modality: "audio".to_string(),
                expected: "WAV file".to_string(),
                suffixes,
            });
        }

        let mut source_data = Map::new();
        source_data.insert(
            "file_paths".to_string(),
            file_paths
                .iter()
                .map(|path| Value::String(path.to_string_lossy().into_owned()))
                .collect(),
        );
        source_data.insert("verbose".to_string(), Value::Bool(verbose));

        let interface = Self {
            file_paths,
            source_data,
            verbose,
        };
        validate_source_data(&interface)?;
        Ok(interface)
    }

    /// Create from a source-data mapping, validated against the source schema
    pub fn from_source_data(source_data: &Map<String, Value>) -> Result<Self, InterfaceError> {
        infer_schema(&Self::parameters(), SOURCE_SCHEMA_EXCLUDE)?
            .validate(&Value::Object(source_data.clone()), Self::NAME)?;

        let file_paths: Vec<PathBuf> = source_data
            .get("file_paths")
            .and_then(Value::as_array)
            .map(|paths| paths.iter().filter_map(Value::as_str).map(PathBuf::from).collect())
            .unwrap_or_default();
        let verbose = bool_option(source_data, "verbose", false)?;
        Self::new(&file_paths, verbose)
    }

    /// Source files, in the order given
    pub fn file_paths(&self) -> &[PathBuf] {
        &self.file_paths
    }

    fn parameters() -> Vec<Parameter> {
        vec![
            Parameter::new("file_paths", ParamType::list(ParamType::FilePath))
                .with_description("Paths to the .wav files, one series per file"),
            Parameter::new("verbose", ParamType::Bool).with_default(false),
        ]
    }

    fn series_name(index: usize, count: usize) -> String {
        if count == 1 {
            "AcousticWaveformSeries".to_string()
        } else {
            format!("AcousticWaveformSeries{}", index)
        }
    }
}

impl DataInterface for AudioInterface {
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
            Parameter::new("stub_test", ParamType::Bool)
                .with_default(false)
                .with_description("Write only the first stub_frames frames of each file"),
            Parameter::new("stub_frames", ParamType::Int).with_default(DEFAULT_STUB_FRAMES),
            Parameter::new("write_as", ParamType::Str)
                .with_default("stimulus")
                .with_description("'stimulus' or 'acquisition'"),
            Parameter::new("starting_times", ParamType::optional(ParamType::list(ParamType::Float)))
                .with_default(Value::Null)
                .with_description("Start time in seconds of each file"),
        ]
    }

    fn get_metadata_schema(&self) -> Result<Value, SchemaError> {
        extend_metadata_schema(json!({
            "properties": {
                "Behavior": {
                    "type": "object",
                    "properties": {
                        "Audio": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "required": ["name"],
                                "properties": {
                                    "name": {"type": "string"},
                                    "description": {"type": "string"}
                                }
                            }
                        }
                    }
                }
            }
        }))
    }

    fn get_metadata(&self) -> Result<MetadataDocument, InterfaceError> {
        let mut metadata = base_metadata();
        let count = self.file_paths.len();
        let entries: Vec<Value> = (0..count)
            .map(|index| {
                json!({
                    "name": Self::series_name(index, count),
                    "description": AUDIO_DESCRIPTION,
                })
            })
            .collect();
        metadata
            .section_mut("Behavior")
            .insert("Audio".to_string(), Value::Array(entries));
        Ok(metadata)
    }

    fn add_to_nwbfile(
        &self,
        nwbfile: &mut NwbFile,
        metadata: &MetadataDocument,
        conversion_options: &Map<String, Value>,
    ) -> Result<(), InterfaceError> {
        let stub_test = bool_option(conversion_options, "stub_test", false)?;
        let stub_frames = usize_option(conversion_options, "stub_frames", DEFAULT_STUB_FRAMES)?;

        let write_as = str_option(conversion_options, "write_as", "stimulus")?;
        if !WRITE_AS_CHOICES.contains(&write_as.as_str()) {
            return Err(ValidationError::InvalidChoice {
                field: "write_as".to_string(),
                value: write_as,
                message: "Audio can be written either as 'stimulus' or 'acquisition'.".to_string(),
            }
            .into());
        }

        let file_count = self.file_paths.len();
        let audio_metadata = metadata.audio_series()?;
        if audio_metadata.len() != file_count {
            return Err(ValidationError::CountMismatch {
                field: "Behavior.Audio".to_string(),
                found: audio_metadata.len(),
                expected: file_count,
                message: format!(
                    "Incomplete metadata (number of metadata in audio {})is not equal to the number of file_paths {}",
                    audio_metadata.len(),
                    file_count
                ),
            }
            .into());
        }

        let duplicates = duplicate_names(audio_metadata.iter().map(|entry| entry.name.as_str()));
        if !duplicates.is_empty() {
            return Err(ValidationError::NotUnique {
                kind: "AcousticWaveformSeries".to_string(),
                duplicates,
            }
            .into());
        }

        let starting_times = starting_times(conversion_options, file_count)?;

        for ((path, entry), starting_time) in self
            .file_paths
            .iter()
            .zip(&audio_metadata)
            .zip(starting_times)
        {
            let (rate, mut data) = read_wav(path)?;
            if stub_test {
                data = data.truncated(stub_frames);
            }

            let series = TimeSeries::new(entry.name.clone(), data, Timing::Rate { rate, starting_time })
                .with_neurodata_type(NeurodataType::AcousticWaveformSeries)
                .with_description(entry.description.as_deref().unwrap_or(AUDIO_DESCRIPTION))
                .with_unit(AUDIO_UNIT);

            match write_as.as_str() {
                "acquisition" => nwbfile.add_acquisition(series)?,
                _ => nwbfile.add_stimulus(series)?,
            }
            if self.verbose {
                log::info!("Added {} from {} to {}", entry.name, path.display(), write_as);
            }
        }
        Ok(())
    }
}

/// Resolve `starting_times`: present, floats, and one per file
fn starting_times(
    options: &Map<String, Value>,
    file_count: usize,
) -> Result<Vec<f64>, ValidationError> {
    let values = match options.get("starting_times") {
        None | Some(Value::Null) if file_count == 1 => {
            log::warn!("starting_times not provided, setting to 0.0");
            return Ok(vec![0.0]);
        }
        None | Some(Value::Null) => {
            return Err(ValidationError::Missing {
                field: "starting_times".to_string(),
                message: format!(
                    "Argument 'starting_times' must be provided when converting {} audio files.",
                    file_count
                ),
            });
        }
        Some(value) => value,
    };

    let floats: Option<Vec<f64>> = values.as_array().and_then(|items| {
        items
            .iter()
            .map(|item| if item.is_f64() { item.as_f64() } else { None })
            .collect()
    });
    let floats = floats.ok_or_else(|| ValidationError::WrongType {
        field: "starting_times".to_string(),
        expected: "a list of floats".to_string(),
    })?;

    if floats.len() != file_count {
        return Err(ValidationError::CountMismatch {
            field: "starting_times".to_string(),
            found: floats.len(),
            expected: file_count,
            message: format!(
                "The number of entries in 'starting_times' ({}) must be equal to number of audio file paths ({}).",
                floats.len(),
                file_count
            ),
        });
    }
    Ok(floats)
}

/// Decode a WAV file into frame-major samples, keeping the stored values
fn read_wav(path: &Path) -> Result<(f64, SeriesData), InterfaceError> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    let values: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|sample| sample.map(f64::from))
            .collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => reader
            .samples::<i32>()
            .map(|sample| sample.map(f64::from))
            .collect::<Result<_, _>>()?,
    };

    let data = SeriesData::new(usize::from(spec.channels), values)?;
    Ok((f64::from(spec.sample_rate), data))
}

fn duplicate_names<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for name in names {
        *counts.entry(name).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(name, _)| name.to_string())
        .collect()
}

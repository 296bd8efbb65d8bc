use std::path::Path;

use serde_json::Value;

use super::{MetadataDocument, MetadataError};

/// Key the `toml` deserializer uses to smuggle datetimes through serde
const TOML_DATETIME_KEY: &str = "$__toml_private_datetime";

/// Serialization formats accepted for metadata files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataFileFormat {
    /// `.json`
    Json,
    /// `.toml`
    Toml,
}

impl MetadataFileFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self, MetadataError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "json" => Ok(Self::Json),
            "toml" => Ok(Self::Toml),
            other => Err(MetadataError::UnsupportedExtension(other.to_string())),
        }
    }
}

/// Load a Metadata Document from a `.json` or `.toml` file
pub fn load_dict_from_file<P: AsRef<Path>>(path: P) -> Result<MetadataDocument, MetadataError> {
    let path = path.as_ref();
    let format = MetadataFileFormat::from_path(path)?;
    let content = std::fs::read_to_string(path)?;
    load_dict_from_str(&content, format)
}

/// Parse a Metadata Document from a string in the given format.
///
/// TOML datetimes are converted to their RFC 3339 string form.
pub fn load_dict_from_str(
    content: &str,
    format: MetadataFileFormat,
) -> Result<MetadataDocument, MetadataError> {
    let value: Value = match format {
        MetadataFileFormat::Json => serde_json::from_str(content)?,
        MetadataFileFormat::Toml => {
            let mut value: Value = toml::from_str(content)?;
            flatten_toml_datetimes(&mut value);
            value
        }
    };
    MetadataDocument::from_value(value)
}

fn flatten_toml_datetimes(value: &mut Value) {
    match value {
        Value::Object(map) => {
            let datetime = match map.get(TOML_DATETIME_KEY) {
                Some(Value::String(datetime)) if map.len() == 1 => Some(datetime.clone()),
                _ => None,
            };
            match datetime {
                Some(datetime) => *value = Value::String(datetime),
                None => map.values_mut().for_each(flatten_toml_datetimes),
            }
        }
        Value::Array(items) => items.iter_mut().for_each(flatten_toml_datetimes),
        _ => {}
    }
}

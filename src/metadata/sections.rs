use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::MetadataError;

/// Naive layouts accepted for session timestamps after RFC 3339 fails
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
];

/// Typed view of the `NWBFile` namespace
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NwbFileMetadata {
    /// Description of the session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_description: Option<String>,

    /// Unique file identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,

    /// Session start time (ISO 8601)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_start_time: Option<String>,

    /// Lab-specific session id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Free-text notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// People who performed the experiment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experimenter: Option<Vec<String>>,

    /// Institution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,

    /// Lab
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lab: Option<String>,

    /// Extension fields passed through verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NwbFileMetadata {
    /// Parse `session_start_time`, if present
    pub fn parsed_session_start_time(&self) -> Result<Option<DateTime<FixedOffset>>, MetadataError> {
        self.session_start_time
            .as_deref()
            .map(|value| parse_datetime("session_start_time", value))
            .transpose()
    }
}

/// One entry of `Ecephys.Device`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceMetadata {
    /// Device name
    pub name: String,
    /// Device description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Manufacturer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
}

/// One entry of `Ecephys.ElectrodeGroup`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectrodeGroupMetadata {
    /// Group name
    pub name: String,
    /// Group description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Brain location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Name of the device the group belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}

/// Name and description of one time series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesMetadata {
    /// Series name, unique among its siblings
    pub name: String,
    /// Series description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Extension fields passed through verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Parse a session timestamp.
///
/// RFC 3339 strings keep their offset. Naive timestamps (as written by most
/// acquisition systems) are interpreted as UTC with a warning.
pub fn parse_datetime(field: &str, value: &str) -> Result<DateTime<FixedOffset>, MetadataError> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Ok(datetime);
    }

    let naive = parse_naive_datetime(value).ok_or_else(|| MetadataError::InvalidDatetime {
        field: field.to_string(),
        value: value.to_string(),
    })?;

    log::warn!("'{}' has no timezone ({}); assuming UTC", field, value);
    Ok(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc).fixed_offset())
}

/// Parse a timestamp without timezone handling, for ordering comparisons
pub(crate) fn parse_naive_datetime(value: &str) -> Option<NaiveDateTime> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Some(datetime.naive_utc());
    }
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

use crate::metadata::MetadataError;
use crate::nwb::NwbError;
use crate::schema::SchemaError;

/// Assertion-style failures caused by inconsistent metadata or options.
///
/// The messages name the offending field and values; they are fatal for the
/// current run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// A list does not have one entry per source item
    #[error("{message}")]
    CountMismatch {
        /// Field holding the list, e.g. `Behavior.Audio`
        field: String,
        /// Entries found
        found: usize,
        /// Number of source items
        expected: usize,
        /// Full message
        message: String,
    },

    /// A value required in this configuration is absent
    #[error("{message}")]
    Missing {
        /// Field name
        field: String,
        /// Full message
        message: String,
    },

    /// Sibling entries share a name
    #[error("Some of the names for {kind} are not unique.")]
    NotUnique {
        /// Type of the entries, e.g. `AcousticWaveformSeries`
        kind: String,
        /// Names that occur more than once
        duplicates: Vec<String>,
    },

    /// A field has the wrong element type
    #[error("Argument '{field}' must be {expected}.")]
    WrongType {
        /// Field name
        field: String,
        /// Expected type, e.g. `a list of floats`
        expected: String,
    },

    /// A field takes one of a fixed set of values
    #[error("{message}")]
    InvalidChoice {
        /// Field name
        field: String,
        /// Rejected value
        value: String,
        /// Full message
        message: String,
    },

    /// Values that must agree across channels differ
    #[error("'{field}' must be identical for all channels, found {values:?}")]
    HeterogeneousValues {
        /// Field name
        field: String,
        /// Distinct values found
        values: Vec<f64>,
    },
}

/// Errors raised by data interfaces
#[derive(Debug, thiserror::Error)]
pub enum InterfaceError {
    /// Metadata or options are inconsistent with the source
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Schema inference or schema validation failed
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Metadata could not be read or interpreted
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// Output container error
    #[error(transparent)]
    Nwb(#[from] NwbError),

    /// I/O error reading source files
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Source files with an extension the interface cannot read
    #[error(
        "The currently supported file format for {} is {}. Some of the provided files does not match this format: {}.",
        .modality,
        .expected,
        quoted_list(.suffixes)
    )]
    UnsupportedFormat {
        /// Modality, e.g. `audio`
        modality: String,
        /// Supported format, e.g. `WAV file`
        expected: String,
        /// Offending suffixes, e.g. `.test`
        suffixes: Vec<String>,
    },

    /// WAV decoding error
    #[error("Audio error: {0}")]
    Audio(#[from] hound::Error),

    /// The recording extractor failed
    #[error("Extractor error: {0}")]
    Extractor(String),
}

fn quoted_list(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|item| format!("'{}'", item)).collect();
    format!("[{}]", quoted.join(", "))
}

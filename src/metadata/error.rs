/// Errors that can occur during metadata processing
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// I/O error reading metadata file
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Metadata file has an extension we cannot parse
    #[error("Unsupported metadata file extension '{0}' (expected .json or .toml)")]
    UnsupportedExtension(String),

    /// The top level of a metadata file is not a mapping
    #[error("Metadata must be a mapping at the top level, found {0}")]
    NotAMapping(String),

    /// A well-known namespace does not match its typed shape
    #[error("Invalid metadata section '{section}': {source}")]
    InvalidSection {
        /// Dotted path of the section, e.g. `Ecephys.Device`
        section: String,
        /// Underlying deserialization error
        source: serde_json::Error,
    },

    /// A datetime field could not be parsed
    #[error("Invalid datetime for '{field}': '{value}'")]
    InvalidDatetime {
        /// Field name
        field: String,
        /// Offending value
        value: String,
    },
}

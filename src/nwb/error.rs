/// Errors that can occur while building, reading or writing an NWB container
#[derive(Debug, thiserror::Error)]
pub enum NwbError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from the ZIP container library
    #[error("ZIP error: {0}")]
    ZipError(#[from] zip::result::ZipError),

    /// Parquet error
    #[error("Parquet error: {0}")]
    ParquetError(#[from] parquet::errors::ParquetError),

    /// Arrow error
    #[error("Arrow error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// File-level metadata could not be interpreted
    #[error("Metadata error: {0}")]
    MetadataError(#[from] crate::metadata::MetadataError),

    /// An object with the same name already exists in the namespace
    #[error("{namespace} already contains an object named '{name}'")]
    DuplicateName {
        /// Namespace, e.g. `acquisition` or `devices`
        namespace: String,
        /// Conflicting name
        name: String,
    },

    /// A required file-level field is missing
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Content violates a structural invariant
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Artifact on disk is not a valid container
    #[error("Invalid container format: {0}")]
    InvalidFormat(String),

    /// A backend configuration names a dataset that is not in the file
    #[error("Unknown dataset location: {0}")]
    UnknownLocation(String),

    /// Requested compression method is not available
    #[error("Compression method '{method}' is not available; choose one of {available:?}")]
    UnsupportedCompression {
        /// Requested method
        method: String,
        /// Methods that can be used
        available: Vec<String>,
    },
}

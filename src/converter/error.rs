use crate::interfaces::InterfaceError;
use crate::metadata::MetadataError;
use crate::nwb::NwbError;
use crate::schema::SchemaError;

/// Errors raised while composing or running several interfaces
#[derive(Debug, thiserror::Error)]
pub enum ConverterError {
    /// An interface failed; the whole run is aborted
    #[error(transparent)]
    Interface(#[from] InterfaceError),

    /// Schema inference or metadata validation failed
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Metadata could not be read or interpreted
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// Output container error
    #[error(transparent)]
    Nwb(#[from] NwbError),

    /// Two interfaces registered under the same name
    #[error("an interface named '{0}' is already registered")]
    DuplicateInterface(String),

    /// Conversion options name an interface that is not registered
    #[error("conversion options given for unknown interface '{0}'")]
    UnknownInterface(String),

    /// Options for one interface failed validation
    #[error("invalid conversion options for '{interface}': {source}")]
    InvalidOptions {
        /// Interface name
        interface: String,
        /// Validation failure
        #[source]
        source: SchemaError,
    },
}

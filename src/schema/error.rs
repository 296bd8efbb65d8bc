/// Errors raised while deriving or applying a Schema Document
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A parameter's declared type has no entry in the type-mapping table
    #[error("Parameter '{parameter}' has unsupported type '{type_name}'")]
    UnsupportedType {
        /// Name of the offending parameter
        parameter: String,
        /// Declared type name
        type_name: String,
    },

    /// A parameter was declared without a type
    #[error("Parameter '{parameter}' has no type annotation; every schema field must be typed")]
    Unannotated {
        /// Name of the offending parameter
        parameter: String,
    },

    /// The schema document itself could not be compiled
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// An instance failed validation against a schema
    #[error("{context} failed schema validation: {}", errors.join("; "))]
    Invalid {
        /// What was being validated (e.g. "metadata", "conversion options for 'Audio'")
        context: String,
        /// One entry per failing location, formatted as `<pointer>: <message>`
        errors: Vec<String>,
    },

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

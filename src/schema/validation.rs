use jsonschema::JSONSchema;
use serde_json::Value;

use super::SchemaError;

/// Baseline file-level metadata schema, shipped as a package resource
const BASE_METADATA_SCHEMA: &str = include_str!("base_metadata_schema.json");

/// Load the baseline metadata schema.
///
/// Interfaces extend this document with their own namespaces; the base copy
/// only describes `NWBFile` and `Subject`.
pub fn base_metadata_schema() -> Result<Value, SchemaError> {
    Ok(serde_json::from_str(BASE_METADATA_SCHEMA)?)
}

/// Validate `instance` against a JSON-Schema document.
///
/// All failures are collected so the caller sees every offending field at
/// once, each prefixed with its JSON pointer.
pub fn validate_instance(schema: &Value, instance: &Value, context: &str) -> Result<(), SchemaError> {
    let compiled =
        JSONSchema::compile(schema).map_err(|e| SchemaError::InvalidSchema(e.to_string()))?;

    let errors: Vec<String> = match compiled.validate(instance) {
        Ok(()) => return Ok(()),
        Err(errors) => errors
            .map(|error| {
                let pointer = error.instance_path.to_string();
                let pointer = if pointer.is_empty() { "/".to_string() } else { pointer };
                format!("{}: {}", pointer, error)
            })
            .collect(),
    };

    Err(SchemaError::Invalid {
        context: context.to_string(),
        errors,
    })
}

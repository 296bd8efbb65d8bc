use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::SchemaError;

/// Declared type of an operation parameter.
///
/// This is the statically declared counterpart of a typed signature. Every
/// interface lists its constructor and write-options parameters with one of
/// these tags, and [`infer_schema`] maps them onto schema primitives.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamType {
    /// Free text
    Str,
    /// Path to a single file
    FilePath,
    /// Path to a directory
    FolderPath,
    /// Integer value
    Int,
    /// Floating point value
    Float,
    /// Boolean flag
    Bool,
    /// Homogeneous list of the inner type
    List(Box<ParamType>),
    /// Free-form mapping
    Dict,
    /// The inner type or nothing; never required
    Optional(Box<ParamType>),
    /// A type with no schema primitive (e.g. an output container handle).
    /// Only valid for parameters that are excluded from the schema.
    Opaque(&'static str),
}

impl ParamType {
    /// Shorthand for `ParamType::List(Box::new(inner))`
    pub fn list(inner: ParamType) -> Self {
        Self::List(Box::new(inner))
    }

    /// Shorthand for `ParamType::Optional(Box::new(inner))`
    pub fn optional(inner: ParamType) -> Self {
        Self::Optional(Box::new(inner))
    }

    fn type_name(&self) -> String {
        match self {
            Self::Str => "str".to_string(),
            Self::FilePath => "FilePath".to_string(),
            Self::FolderPath => "FolderPath".to_string(),
            Self::Int => "int".to_string(),
            Self::Float => "float".to_string(),
            Self::Bool => "bool".to_string(),
            Self::List(inner) => format!("list[{}]", inner.type_name()),
            Self::Dict => "dict".to_string(),
            Self::Optional(inner) => format!("Optional[{}]", inner.type_name()),
            Self::Opaque(name) => (*name).to_string(),
        }
    }
}

/// Schema primitive a parameter type maps onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    /// JSON string
    String,
    /// JSON number (integers included)
    Number,
    /// JSON boolean
    Boolean,
    /// JSON array
    Array,
    /// JSON object
    Object,
    /// JSON null
    Null,
}

/// Value of a property's `type` keyword
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeSpec {
    /// Exactly one primitive
    Single(SchemaType),
    /// Any of several primitives, e.g. `["array", "null"]`
    Union(Vec<SchemaType>),
}

impl TypeSpec {
    /// The first non-null primitive
    pub fn primary(&self) -> SchemaType {
        match self {
            Self::Single(schema_type) => *schema_type,
            Self::Union(types) => types
                .iter()
                .copied()
                .find(|t| *t != SchemaType::Null)
                .unwrap_or(SchemaType::Null),
        }
    }

    /// Whether an explicit `null` is accepted
    pub fn is_nullable(&self) -> bool {
        match self {
            Self::Single(schema_type) => *schema_type == SchemaType::Null,
            Self::Union(types) => types.contains(&SchemaType::Null),
        }
    }
}

/// One entry of a Schema Document's `properties`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    /// Schema primitive, or a union with `null` for optional parameters
    #[serde(rename = "type")]
    pub schema_type: TypeSpec,

    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Default value used when the field is omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Element schema for arrays
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<PropertySchema>>,
}

/// JSON-Schema-like description of an operation's accepted fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    /// Always `"object"`
    #[serde(rename = "type")]
    pub schema_type: SchemaType,

    /// Accepted fields
    pub properties: BTreeMap<String, PropertySchema>,

    /// Fields that must be present, in declaration order
    pub required: Vec<String>,

    /// Whether fields outside `properties` are accepted
    #[serde(rename = "additionalProperties")]
    pub additional_properties: bool,
}

impl SchemaDocument {
    /// Convert to a plain JSON value
    pub fn to_value(&self) -> Result<Value, SchemaError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Validate a JSON instance against this document
    pub fn validate(&self, instance: &Value, context: &str) -> Result<(), SchemaError> {
        super::validate_instance(&self.to_value()?, instance, context)
    }
}

/// Statically declared parameter of a constructor or write operation
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Parameter name
    pub name: &'static str,
    /// Declared type; `None` means the parameter was left untyped
    pub param_type: Option<ParamType>,
    /// Default value, if the parameter has one
    pub default: Option<Value>,
    /// Human-readable description
    pub description: Option<&'static str>,
}

impl Parameter {
    /// Create a typed parameter without a default (required)
    pub fn new(name: &'static str, param_type: ParamType) -> Self {
        Self {
            name,
            param_type: Some(param_type),
            default: None,
            description: None,
        }
    }

    /// Create an untyped parameter; [`infer_schema`] rejects these
    pub fn untyped(name: &'static str) -> Self {
        Self {
            name,
            param_type: None,
            default: None,
            description: None,
        }
    }

    /// Attach a default value, making the parameter optional
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Attach a description
    pub fn with_description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }
}

/// Map a declared type onto its property schema.
fn map_type(parameter: &str, param_type: &ParamType) -> Result<PropertySchema, SchemaError> {
    let (schema_type, items) = match param_type {
        ParamType::Str | ParamType::FilePath | ParamType::FolderPath => (SchemaType::String, None),
        ParamType::Int | ParamType::Float => (SchemaType::Number, None),
        ParamType::Bool => (SchemaType::Boolean, None),
        ParamType::Dict => (SchemaType::Object, None),
        ParamType::List(inner) => (SchemaType::Array, Some(Box::new(map_type(parameter, inner)?))),
        ParamType::Optional(inner) => {
            let mut property = map_type(parameter, inner)?;
            if !property.schema_type.is_nullable() {
                property.schema_type =
                    TypeSpec::Union(vec![property.schema_type.primary(), SchemaType::Null]);
            }
            return Ok(property);
        }
        ParamType::Opaque(_) => {
            return Err(SchemaError::UnsupportedType {
                parameter: parameter.to_string(),
                type_name: param_type.type_name(),
            })
        }
    };

    Ok(PropertySchema {
        schema_type: TypeSpec::Single(schema_type),
        description: None,
        default: None,
        items,
    })
}

/// Derive a Schema Document from a declared parameter list.
///
/// Parameters named in `exclude` are skipped before any type mapping, so an
/// excluded parameter may carry an [`ParamType::Opaque`] type. A parameter is
/// listed in `required` exactly when it has no default and is not `Optional`.
///
/// # Errors
///
/// - [`SchemaError::Unannotated`] for a parameter declared without a type
/// - [`SchemaError::UnsupportedType`] for a type outside the mapping table
pub fn infer_schema(parameters: &[Parameter], exclude: &[&str]) -> Result<SchemaDocument, SchemaError> {
    let mut properties = BTreeMap::new();
    let mut required = Vec::new();

    for parameter in parameters.iter().filter(|p| !exclude.contains(&p.name)) {
        let param_type = parameter.param_type.as_ref().ok_or_else(|| SchemaError::Unannotated {
            parameter: parameter.name.to_string(),
        })?;

        let mut property = map_type(parameter.name, param_type)?;
        property.description = parameter.description.map(str::to_string);
        property.default = parameter.default.clone().filter(|value| !value.is_null());

        let optional = matches!(param_type, ParamType::Optional(_));
        if parameter.default.is_none() && !optional {
            required.push(parameter.name.to_string());
        }

        properties.insert(parameter.name.to_string(), property);
    }

    Ok(SchemaDocument {
        schema_type: SchemaType::Object,
        properties,
        required,
        additional_properties: false,
    })
}

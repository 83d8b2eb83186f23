//! The BrAPI type model
//!
//! A closed tagged union produced by the reader and consumed by every
//! backend. Values are immutable once constructed: they live for the
//! duration of one generation run and are never mutated. Cross-type
//! relationships are expressed as name lookups ([`ReferenceType`]), never
//! embedded pointers, so recursive type graphs carry no ownership cycles.

use serde::{Deserialize, Serialize};

/// A type read from the BrAPI schema module tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BrApiType {
    Primitive(PrimitiveType),
    Reference(ReferenceType),
    Array(ArrayType),
    Object(ObjectType),
    OneOf(OneOfType),
    AllOf(AllOfType),
    Enum(EnumType),
}

impl BrApiType {
    /// The name a named type is keyed by in a batch.
    ///
    /// None for primitives, arrays and references; a reference points at a
    /// name but is not itself keyed by it.
    pub fn name(&self) -> Option<&str> {
        match self {
            BrApiType::Object(t) => Some(&t.name),
            BrApiType::OneOf(t) => Some(&t.name),
            BrApiType::AllOf(t) => Some(&t.name),
            BrApiType::Enum(t) => Some(&t.name),
            BrApiType::Primitive(_) | BrApiType::Reference(_) | BrApiType::Array(_) => None,
        }
    }

    /// Provenance tag: the module directory the type was read from
    pub fn module(&self) -> Option<&str> {
        match self {
            BrApiType::Object(t) => t.module.as_deref(),
            BrApiType::AllOf(t) => t.module.as_deref(),
            BrApiType::Enum(t) => t.module.as_deref(),
            _ => None,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            BrApiType::Object(t) => t.description.as_deref(),
            BrApiType::OneOf(t) => t.description.as_deref(),
            BrApiType::AllOf(t) => t.description.as_deref(),
            BrApiType::Enum(t) => t.description.as_deref(),
            _ => None,
        }
    }

    /// Whether this is one of the named class variants
    /// (Object, OneOf, AllOf, Enum)
    pub fn is_class(&self) -> bool {
        matches!(
            self,
            BrApiType::Object(_) | BrApiType::OneOf(_) | BrApiType::AllOf(_) | BrApiType::Enum(_)
        )
    }
}

/// Scalar kinds; one singleton value per kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    Boolean,
    Integer,
    Number,
    String,
}

impl PrimitiveType {
    /// Parse a JSON Schema scalar type name
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "boolean" => Some(PrimitiveType::Boolean),
            "integer" => Some(PrimitiveType::Integer),
            "number" => Some(PrimitiveType::Number),
            "string" => Some(PrimitiveType::String),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Integer => "integer",
            PrimitiveType::Number => "number",
            PrimitiveType::String => "string",
        }
    }
}

/// A forward pointer to another named type; never owns the referent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceType {
    pub name: String,
}

/// A wrapper around another type; items may themselves be any variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayType {
    pub items: Box<BrApiType>,
}

/// An object type with ordered properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectType {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    /// Top-level entity eligible for query/mutation generation
    pub primary_model: bool,
    pub properties: Vec<Property>,
}

/// A discriminated union of possible types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneOfType {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub possible_types: Vec<BrApiType>,
}

/// Structural composition; excluded from the recursive class cache and
/// inlined by whichever backend needs it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllOfType {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    pub all_types: Vec<BrApiType>,
}

/// An enumeration of literal values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumType {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    pub value_kind: PrimitiveType,
    pub values: Vec<EnumValue>,
}

/// One enum member: a display name and the literal value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumValue {
    pub name: String,
    pub value: serde_json::Value,
}

/// One object property.
///
/// `required` is derived from the enclosing object's `required` name list
/// at parse time; it is not stored on the schema node itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub ty: BrApiType,
    pub required: bool,
}

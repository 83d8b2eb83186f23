//! Schema Reading
//!
//! Walks the BrAPI schema module tree and parses each document's schema
//! nodes into [`BrApiType`] values. Each immediate subdirectory of the
//! root is a module; its name becomes the provenance tag for the files
//! beneath it. A `$defs` map yields one candidate named type per entry;
//! otherwise the whole document is one candidate.
//!
//! Reading is strictly two-phase: the whole tree is parsed into a flat
//! type list before any cache construction or reference resolution,
//! because references may point at types defined in a different file of
//! the same batch.
//!
//! Unreadable files and unparsable documents abort the read with a
//! [`SchemaError`]. Well-formed but structurally invalid nodes (bad
//! `$ref`, unknown type set, missing `items`) are accumulated through the
//! response algebra, so one pass reports every problem in the batch.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Result, SchemaError};
use crate::model::{
    AllOfType, ArrayType, BrApiType, EnumType, EnumValue, ObjectType, OneOfType, PrimitiveType,
    Property, ReferenceType,
};
use crate::response::{ErrorKind, Response};

/// Reference strings must name the module file and the `$defs` entry
const REF_PATTERN: &str = r"^(?P<module>[A-Za-z0-9_\-]+)\.json#/\$defs/(?P<name>[A-Za-z0-9_]+)$";

/// Reader behavior toggles
#[derive(Debug, Clone, Default)]
pub struct SchemaReaderOptions {
    /// Warn (rather than silently ignore) when a named type appears twice
    /// in one batch. The duplicate is dropped either way; duplicates are
    /// never merged or overwritten.
    pub verbose: bool,
}

/// Parses raw schema documents into the BrAPI type model
pub struct SchemaReader {
    options: SchemaReaderOptions,
    ref_pattern: Regex,
}

impl Default for SchemaReader {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaReader {
    pub fn new() -> Self {
        Self::with_options(SchemaReaderOptions::default())
    }

    pub fn with_options(options: SchemaReaderOptions) -> Self {
        Self {
            options,
            ref_pattern: Regex::new(REF_PATTERN).unwrap(),
        }
    }

    /// Read every schema document up to two directory levels below `root`.
    ///
    /// The outer `Result` carries foundational failures (missing
    /// directory, unreadable file, unparsable JSON) which abort the read.
    /// The inner [`Response`] carries the flat type list, or every
    /// structural error found across the whole batch.
    pub fn read_directory(&self, root: &Path) -> Result<Response<Vec<BrApiType>>> {
        if !root.is_dir() {
            return Err(SchemaError::NotADirectory(root.to_path_buf()));
        }

        let mut batches = Vec::new();
        for entry in WalkDir::new(root)
            .min_depth(1)
            .max_depth(2)
            .sort_by_file_name()
        {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().map(|ext| ext != "json").unwrap_or(true) {
                continue;
            }

            // Only an immediate subdirectory name becomes a module tag;
            // files directly under the root carry none.
            let module = if entry.depth() == 2 {
                path.parent()
                    .and_then(Path::file_name)
                    .and_then(|name| name.to_str())
                    .map(String::from)
            } else {
                None
            };

            debug!(path = %path.display(), module = module.as_deref().unwrap_or("-"), "reading schema file");
            batches.push(self.read_file(path, module.as_deref())?);
        }

        Ok(batches
            .into_iter()
            .collect::<Response<Vec<Vec<BrApiType>>>>()
            .map(|batches| batches.into_iter().flatten().collect())
            .map(|types| self.drop_duplicates(types)))
    }

    /// Read a single document from a file; structural failure is an error.
    pub fn read_path(&self, path: &Path, module: Option<&str>) -> Result<BrApiType> {
        single_type(self.read_file(path, module)?)
    }

    /// Read a single document from a string; structural failure is an error.
    pub fn read_content(&self, content: &str, module: Option<&str>) -> Result<BrApiType> {
        let document: Value = serde_json::from_str(content)?;
        single_type(self.read_document(&document, "Schema", module))
    }

    fn read_file(&self, path: &Path, module: Option<&str>) -> Result<Response<Vec<BrApiType>>> {
        let content = fs::read_to_string(path)?;
        let document: Value = serde_json::from_str(&content).map_err(|source| SchemaError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let fallback_name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("Schema")
            .to_string();

        // Two files may contain identically-named nodes; the path prefix
        // keeps their diagnostics apart.
        Ok(self
            .read_document(&document, &fallback_name, module)
            .prefixed(&format!("{}: ", path.display())))
    }

    /// Parse one document: a `$defs` map yields one candidate per entry,
    /// keyed by entry name; otherwise the whole document is one candidate.
    fn read_document(
        &self,
        document: &Value,
        fallback_name: &str,
        module: Option<&str>,
    ) -> Response<Vec<BrApiType>> {
        if let Some(defs) = document.get("$defs").and_then(Value::as_object) {
            defs.iter()
                .map(|(type_name, node)| self.read_node(node, type_name, module))
                .collect()
        } else {
            self.read_node(document, fallback_name, module)
                .map(|ty| vec![ty])
        }
    }

    /// Classify one schema node into a type model variant
    fn read_node(&self, node: &Value, fallback_name: &str, module: Option<&str>) -> Response<BrApiType> {
        let Some(map) = node.as_object() else {
            return Response::fail(
                ErrorKind::Validation,
                format!("schema node '{}' is not a JSON object", fallback_name),
            );
        };

        if let Some(reference) = map.get("$ref") {
            return self.read_reference(reference, fallback_name);
        }

        // An explicit title (spaces stripped) beats the contextual fallback
        let name = map
            .get("title")
            .and_then(Value::as_str)
            .map(|title| title.replace(' ', ""))
            .unwrap_or_else(|| fallback_name.to_string());
        let description = map
            .get("description")
            .and_then(Value::as_str)
            .map(String::from);

        if map.contains_key("enum") {
            return self.read_enum(map, name, description, module);
        }
        if map.contains_key("oneOf") {
            return self.read_one_of(map, name, description, module);
        }
        if map.contains_key("allOf") {
            return self.read_all_of(map, name, description, module);
        }

        let types = type_set(map);
        match types.as_slice() {
            [] => Response::fail(
                ErrorKind::Validation,
                format!(
                    "schema node '{}' has no type, $ref, enum, oneOf or allOf",
                    name
                ),
            ),
            [single] => match single.as_str() {
                "object" => self.read_object(map, name, description, module),
                "array" => self.read_array(map, &name, module),
                scalar => match PrimitiveType::from_type_name(scalar) {
                    Some(primitive) => Response::success(BrApiType::Primitive(primitive)),
                    None => Response::fail(
                        ErrorKind::Validation,
                        format!("schema node '{}' has unknown type '{}'", name, scalar),
                    ),
                },
            },
            multiple => Response::fail(
                ErrorKind::Validation,
                format!(
                    "schema node '{}' has unsupported type set {:?}",
                    name, multiple
                ),
            ),
        }
    }

    fn read_reference(&self, reference: &Value, fallback_name: &str) -> Response<BrApiType> {
        let Some(ref_string) = reference.as_str() else {
            return Response::fail(
                ErrorKind::Validation,
                format!("$ref in node '{}' is not a string", fallback_name),
            );
        };

        match self.ref_pattern.captures(ref_string) {
            Some(captures) => Response::success(BrApiType::Reference(ReferenceType {
                name: captures["name"].to_string(),
            })),
            None => Response::fail(
                ErrorKind::Validation,
                format!(
                    "$ref '{}' in node '{}' does not match '<module>.json#/$defs/<TypeName>'",
                    ref_string, fallback_name
                ),
            ),
        }
    }

    fn read_object(
        &self,
        map: &Map<String, Value>,
        name: String,
        description: Option<String>,
        module: Option<&str>,
    ) -> Response<BrApiType> {
        let required: HashSet<&str> = map
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let primary_model = map
            .get("brapi-metadata")
            .and_then(|metadata| metadata.get("primaryModel"))
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let properties: Response<Vec<Property>> = match map.get("properties").and_then(Value::as_object) {
            Some(properties) => properties
                .iter()
                .map(|(property_name, node)| {
                    self.read_property(property_name, node, &required, module)
                })
                .collect(),
            None => Response::success(Vec::new()),
        };

        // Boolean additionalProperties only toggles openness; just an
        // object schema yields a synthetic property.
        let additional_schema = map
            .get("additionalProperties")
            .map(Value::is_object)
            .unwrap_or(false);

        properties
            .map_on_condition(additional_schema, |mut properties| {
                let node = &map["additionalProperties"];
                self.read_node(node, &format!("{}AdditionalProperties", name), module)
                    .map(|ty| {
                        properties.push(Property {
                            name: "additionalProperties".to_string(),
                            description: node
                                .get("description")
                                .and_then(Value::as_str)
                                .map(String::from),
                            ty,
                            required: false,
                        });
                        properties
                    })
            })
            .map(|properties| {
                BrApiType::Object(ObjectType {
                    name,
                    description,
                    module: module.map(String::from),
                    primary_model,
                    properties,
                })
            })
    }

    fn read_property(
        &self,
        property_name: &str,
        node: &Value,
        required: &HashSet<&str>,
        module: Option<&str>,
    ) -> Response<Property> {
        let description = node
            .get("description")
            .and_then(Value::as_str)
            .map(String::from);

        self.read_node(node, &sentence_case(property_name), module)
            .map(|ty| Property {
                name: property_name.to_string(),
                description,
                ty,
                required: required.contains(property_name),
            })
    }

    fn read_array(&self, map: &Map<String, Value>, name: &str, module: Option<&str>) -> Response<BrApiType> {
        match map.get("items") {
            Some(items) => self
                .read_node(items, &format!("{}Item", name), module)
                .map(|items| {
                    BrApiType::Array(ArrayType {
                        items: Box::new(items),
                    })
                }),
            None => Response::fail(
                ErrorKind::Validation,
                format!("array node '{}' has no items", name),
            ),
        }
    }

    fn read_one_of(
        &self,
        map: &Map<String, Value>,
        name: String,
        description: Option<String>,
        module: Option<&str>,
    ) -> Response<BrApiType> {
        let Some(branches) = map.get("oneOf").and_then(Value::as_array) else {
            return Response::fail(
                ErrorKind::Validation,
                format!("oneOf in node '{}' is not an array", name),
            );
        };

        branches
            .iter()
            .enumerate()
            .map(|(index, branch)| {
                // Untitled branches get ordinal fallback names
                self.read_node(branch, &format!("{}{}", name, index + 1), module)
            })
            .collect::<Response<Vec<BrApiType>>>()
            .map(|possible_types| {
                BrApiType::OneOf(OneOfType {
                    name,
                    description,
                    possible_types,
                })
            })
    }

    fn read_all_of(
        &self,
        map: &Map<String, Value>,
        name: String,
        description: Option<String>,
        module: Option<&str>,
    ) -> Response<BrApiType> {
        let Some(members) = map.get("allOf").and_then(Value::as_array) else {
            return Response::fail(
                ErrorKind::Validation,
                format!("allOf in node '{}' is not an array", name),
            );
        };

        members
            .iter()
            .enumerate()
            .map(|(index, member)| self.read_node(member, &format!("{}{}", name, index + 1), module))
            .collect::<Response<Vec<BrApiType>>>()
            .map(|all_types| {
                BrApiType::AllOf(AllOfType {
                    name,
                    description,
                    module: module.map(String::from),
                    all_types,
                })
            })
    }

    fn read_enum(
        &self,
        map: &Map<String, Value>,
        name: String,
        description: Option<String>,
        module: Option<&str>,
    ) -> Response<BrApiType> {
        let types = type_set(map);
        let value_kind = match types.as_slice() {
            [] => PrimitiveType::String,
            [single] => match PrimitiveType::from_type_name(single) {
                Some(primitive) => primitive,
                None => {
                    return Response::fail(
                        ErrorKind::Validation,
                        format!("enum node '{}' has non-scalar type '{}'", name, single),
                    )
                }
            },
            multiple => {
                return Response::fail(
                    ErrorKind::Validation,
                    format!("enum node '{}' has unsupported type set {:?}", name, multiple),
                )
            }
        };

        let Some(literals) = map.get("enum").and_then(Value::as_array) else {
            return Response::fail(
                ErrorKind::Validation,
                format!("enum in node '{}' is not an array", name),
            );
        };

        let values = literals
            .iter()
            .map(|literal| EnumValue {
                name: literal
                    .as_str()
                    .map(String::from)
                    .unwrap_or_else(|| literal.to_string()),
                value: literal.clone(),
            })
            .collect();

        Response::success(BrApiType::Enum(EnumType {
            name,
            description,
            module: module.map(String::from),
            value_kind,
            values,
        }))
    }

    /// Apply the duplicate-name policy: the first occurrence of a named
    /// type wins, later ones are dropped. Unnamed types pass through.
    fn drop_duplicates(&self, types: Vec<BrApiType>) -> Vec<BrApiType> {
        let mut seen: HashSet<String> = HashSet::new();
        types
            .into_iter()
            .filter(|ty| match ty.name() {
                Some(name) => {
                    if seen.insert(name.to_string()) {
                        true
                    } else {
                        if self.options.verbose {
                            warn!(name, "ignoring duplicate type name in batch");
                        }
                        false
                    }
                }
                None => true,
            })
            .collect()
    }
}

fn single_type(response: Response<Vec<BrApiType>>) -> Result<BrApiType> {
    let mut types = response.into_result().map_err(SchemaError::InvalidSchema)?;
    if types.len() != 1 {
        return Err(SchemaError::NotASingleType(types.len()));
    }
    Ok(types.remove(0))
}

/// The node's declared type set, with draft 2020-12 nullability stripped
fn type_set(map: &Map<String, Value>) -> Vec<String> {
    match map.get("type") {
        Some(Value::String(ty)) => vec![ty.clone()],
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .filter(|ty| *ty != "null")
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}

/// Uppercase the first character: `tags` -> `Tags`
fn sentence_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn read(node: Value) -> Response<BrApiType> {
        SchemaReader::new().read_node(&node, "Fallback", Some("BrAPI-Core"))
    }

    #[test]
    fn test_primitive_node() {
        let ty = read(json!({"type": "string"})).ok().unwrap();
        assert_eq!(ty, BrApiType::Primitive(PrimitiveType::String));

        let ty = read(json!({"type": ["integer", "null"]})).ok().unwrap();
        assert_eq!(ty, BrApiType::Primitive(PrimitiveType::Integer));
    }

    #[test]
    fn test_title_beats_fallback_with_spaces_stripped() {
        let ty = read(json!({
            "title": "Germplasm Attribute",
            "type": "object",
            "properties": {}
        }))
        .ok()
        .unwrap();
        assert_eq!(ty.name(), Some("GermplasmAttribute"));
    }

    #[test]
    fn test_object_required_and_property_order() {
        let ty = read(json!({
            "title": "Trial",
            "type": "object",
            "required": ["trialName"],
            "properties": {
                "trialName": {"type": "string", "description": "Human readable name"},
                "active": {"type": "boolean"}
            }
        }))
        .ok()
        .unwrap();

        let BrApiType::Object(object) = ty else {
            panic!("expected object");
        };
        assert_eq!(object.module.as_deref(), Some("BrAPI-Core"));
        assert_eq!(object.properties.len(), 2);
        assert_eq!(object.properties[0].name, "trialName");
        assert!(object.properties[0].required);
        assert_eq!(
            object.properties[0].description.as_deref(),
            Some("Human readable name")
        );
        assert_eq!(object.properties[1].name, "active");
        assert!(!object.properties[1].required);
    }

    #[test]
    fn test_additional_properties_yields_synthetic_property() {
        let ty = read(json!({
            "title": "Season",
            "type": "object",
            "properties": {
                "seasonName": {"type": "string"}
            },
            "additionalProperties": {"type": "string"}
        }))
        .ok()
        .unwrap();

        let BrApiType::Object(object) = ty else {
            panic!("expected object");
        };
        let extra = object.properties.last().unwrap();
        assert_eq!(extra.name, "additionalProperties");
        assert!(!extra.required);
        assert_eq!(extra.ty, BrApiType::Primitive(PrimitiveType::String));
    }

    #[test]
    fn test_boolean_additional_properties_is_not_a_property() {
        for toggle in [json!(false), json!(true)] {
            let ty = read(json!({
                "title": "Trial",
                "type": "object",
                "properties": {
                    "trialName": {"type": "string"}
                },
                "additionalProperties": toggle
            }))
            .ok()
            .unwrap();

            let BrApiType::Object(object) = ty else {
                panic!("expected object");
            };
            assert_eq!(object.properties.len(), 1);
            assert_eq!(object.properties[0].name, "trialName");
        }
    }

    #[test]
    fn test_read_content_accepts_closed_object() {
        let reader = SchemaReader::new();
        let ty = reader
            .read_content(
                r#"{"title": "Trial", "type": "object", "properties": {"trialName": {"type": "string"}}, "additionalProperties": false}"#,
                Some("BrAPI-Core"),
            )
            .unwrap();
        assert_eq!(ty.name(), Some("Trial"));
    }

    #[test]
    fn test_primary_model_metadata() {
        let ty = read(json!({
            "title": "Trial",
            "type": "object",
            "brapi-metadata": {"primaryModel": true},
            "properties": {}
        }))
        .ok()
        .unwrap();

        let BrApiType::Object(object) = ty else {
            panic!("expected object");
        };
        assert!(object.primary_model);
    }

    #[test]
    fn test_one_of_untitled_branches_get_ordinal_names() {
        let ty = read(json!({
            "title": "Parent",
            "type": "object",
            "oneOf": [
                {"type": "object", "properties": {"a": {"type": "string"}}},
                {"type": "object", "properties": {"b": {"type": "string"}}}
            ]
        }))
        .ok()
        .unwrap();

        let BrApiType::OneOf(one_of) = ty else {
            panic!("expected oneOf");
        };
        assert_eq!(one_of.name, "Parent");
        let names: Vec<_> = one_of
            .possible_types
            .iter()
            .map(|ty| ty.name().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["Parent1", "Parent2"]);
    }

    #[test]
    fn test_all_of_members() {
        let ty = read(json!({
            "title": "GermplasmDetails",
            "allOf": [
                {"$ref": "BrAPI-Germplasm.json#/$defs/Germplasm"},
                {"type": "object", "properties": {"extra": {"type": "string"}}}
            ]
        }))
        .ok()
        .unwrap();

        let BrApiType::AllOf(all_of) = ty else {
            panic!("expected allOf");
        };
        assert_eq!(all_of.all_types.len(), 2);
        assert_eq!(
            all_of.all_types[0],
            BrApiType::Reference(ReferenceType {
                name: "Germplasm".to_string()
            })
        );
        assert_eq!(all_of.all_types[1].name(), Some("GermplasmDetails2"));
    }

    #[test]
    fn test_titled_array_of_strings() {
        let ty = read(json!({
            "title": "Tags",
            "type": "array",
            "items": {"type": "string"}
        }))
        .ok()
        .unwrap();
        assert_eq!(
            ty,
            BrApiType::Array(ArrayType {
                items: Box::new(BrApiType::Primitive(PrimitiveType::String))
            })
        );
    }

    #[test]
    fn test_untitled_array_property_falls_back_to_sentence_cased_name() {
        let ty = read(json!({
            "title": "Study",
            "type": "object",
            "properties": {
                "tags": {
                    "type": "array",
                    "items": {"type": "object", "properties": {"label": {"type": "string"}}}
                }
            }
        }))
        .ok()
        .unwrap();

        let BrApiType::Object(object) = ty else {
            panic!("expected object");
        };
        let BrApiType::Array(array) = &object.properties[0].ty else {
            panic!("expected array property");
        };
        // The array's fallback name is the sentence-cased property name,
        // so its item object is named after it.
        assert_eq!(array.items.name(), Some("TagsItem"));
    }

    #[test]
    fn test_valid_reference() {
        let ty = read(json!({"$ref": "BrAPI-Core.json#/$defs/Trial"})).ok().unwrap();
        assert_eq!(
            ty,
            BrApiType::Reference(ReferenceType {
                name: "Trial".to_string()
            })
        );
    }

    #[test]
    fn test_bad_reference_is_accumulated_not_aborting() {
        let response = read(json!({
            "title": "Study",
            "type": "object",
            "properties": {
                "trial": {"$ref": "not-a-valid-ref"},
                "location": {"$ref": "also #bad"}
            }
        }));
        assert!(response.is_failure());
        // Both bad refs reported, not just the first
        assert_eq!(response.errors().len(), 2);
        assert!(response.errors()[0].message.contains("not-a-valid-ref"));
        assert!(response.errors()[0].message.contains("Trial"));
    }

    #[test]
    fn test_unknown_type_set() {
        let response = read(json!({"title": "Odd", "type": "decimal"}));
        assert!(response.is_failure());
        assert!(response.errors()[0].message.contains("decimal"));

        let response = read(json!({"title": "Odd", "type": ["object", "string"]}));
        assert!(response.is_failure());

        let response = read(json!({"title": "Odd"}));
        assert!(response.is_failure());
    }

    #[test]
    fn test_enum_values_keep_declaration_order() {
        let ty = read(json!({
            "title": "SeasonType",
            "type": "string",
            "enum": ["SPRING", "SUMMER", "FALL"]
        }))
        .ok()
        .unwrap();

        let BrApiType::Enum(enumeration) = ty else {
            panic!("expected enum");
        };
        assert_eq!(enumeration.value_kind, PrimitiveType::String);
        let names: Vec<_> = enumeration.values.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["SPRING", "SUMMER", "FALL"]);
    }

    #[test]
    fn test_integer_enum_names_are_stringified() {
        let ty = read(json!({
            "title": "Level",
            "type": "integer",
            "enum": [1, 2, 3]
        }))
        .ok()
        .unwrap();

        let BrApiType::Enum(enumeration) = ty else {
            panic!("expected enum");
        };
        assert_eq!(enumeration.value_kind, PrimitiveType::Integer);
        assert_eq!(enumeration.values[0].name, "1");
        assert_eq!(enumeration.values[0].value, json!(1));
    }

    #[test]
    fn test_defs_map_yields_one_type_per_entry() {
        let reader = SchemaReader::new();
        let document = json!({
            "$defs": {
                "Trial": {"type": "object", "properties": {}},
                "TrialList": {"type": "array", "items": {"$ref": "BrAPI-Core.json#/$defs/Trial"}}
            }
        });
        let types = reader
            .read_document(&document, "Trial", Some("BrAPI-Core"))
            .ok()
            .unwrap();
        assert_eq!(types.len(), 2);
        assert_eq!(types[0].name(), Some("Trial"));
    }

    #[test]
    fn test_read_content_single_document() {
        let reader = SchemaReader::new();
        let ty = reader
            .read_content(
                r#"{"title": "Trial", "type": "object", "properties": {}}"#,
                Some("BrAPI-Core"),
            )
            .unwrap();
        assert_eq!(ty.name(), Some("Trial"));
    }

    #[test]
    fn test_read_content_structural_failure_is_an_error() {
        let reader = SchemaReader::new();
        let result = reader.read_content(r#"{"title": "Odd", "type": "decimal"}"#, None);
        assert!(matches!(result, Err(SchemaError::InvalidSchema(_))));
    }

    #[test]
    fn test_sentence_case() {
        assert_eq!(sentence_case("tags"), "Tags");
        assert_eq!(sentence_case("trialName"), "TrialName");
        assert_eq!(sentence_case(""), "");
    }
}

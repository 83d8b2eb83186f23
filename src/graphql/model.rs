//! GraphQL output schema model
//!
//! A small schema representation assembled by the generator and rendered
//! to SDL. Type references are held by name ([`TypeRef::Named`]) and stay
//! lazy until [`GraphQLSchema::build`] runs its forward-reference check,
//! so a field can point at a type defined later in the batch.

use indexmap::IndexMap;

use crate::response::{Response, ResponseError};

/// Scalars every schema can reference without defining them
pub const BUILT_IN_SCALARS: [&str; 5] = ["Boolean", "Int", "Float", "String", "ID"];

/// A type reference: a lazy name, optionally wrapped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Named(String),
    NonNull(Box<TypeRef>),
    List(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    pub fn non_null(self) -> Self {
        TypeRef::NonNull(Box::new(self))
    }

    pub fn list(self) -> Self {
        TypeRef::List(Box::new(self))
    }

    /// The innermost named type
    pub fn base_name(&self) -> &str {
        match self {
            TypeRef::Named(name) => name,
            TypeRef::NonNull(inner) | TypeRef::List(inner) => inner.base_name(),
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, TypeRef::NonNull(_))
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeRef::Named(name) => write!(f, "{}", name),
            TypeRef::NonNull(inner) => write!(f, "{}!", inner),
            TypeRef::List(inner) => write!(f, "[{}]", inner),
        }
    }
}

/// A field argument
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: String,
    pub ty: TypeRef,
}

/// An output field
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub arguments: Vec<Argument>,
}

/// An output object type
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectDef {
    pub name: String,
    pub description: Option<String>,
    pub fields: Vec<Field>,
}

/// A union of named object types
#[derive(Debug, Clone, PartialEq)]
pub struct UnionDef {
    pub name: String,
    pub description: Option<String>,
    pub members: Vec<String>,
}

impl UnionDef {
    /// Runtime member selection for a concrete value.
    ///
    /// Always returns the first declared member; no discriminator
    /// inspection happens yet.
    pub fn resolve_type(&self) -> Option<&str> {
        self.members.first().map(String::as_str)
    }
}

/// An output enum type
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
    pub name: String,
    pub description: Option<String>,
    pub values: Vec<String>,
}

/// Any named type defined by the schema
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDef {
    Object(ObjectDef),
    Union(UnionDef),
    Enum(EnumDef),
}

impl TypeDef {
    pub fn name(&self) -> &str {
        match self {
            TypeDef::Object(def) => &def.name,
            TypeDef::Union(def) => &def.name,
            TypeDef::Enum(def) => &def.name,
        }
    }
}

/// The assembled output schema
#[derive(Debug, Clone, PartialEq)]
pub struct GraphQLSchema {
    pub query: ObjectDef,
    pub mutation: Option<ObjectDef>,
    pub types: IndexMap<String, TypeDef>,
}

impl GraphQLSchema {
    /// Finalize the schema, resolving every lazy named reference.
    ///
    /// Each named reference must point at a defined type or a built-in
    /// scalar, and each union member at a defined object type. Every
    /// unresolved reference is reported, not just the first.
    pub fn build(
        query: ObjectDef,
        mutation: Option<ObjectDef>,
        types: IndexMap<String, TypeDef>,
    ) -> Response<GraphQLSchema> {
        let schema = GraphQLSchema {
            query,
            mutation,
            types,
        };

        let mut errors = Vec::new();
        schema.check_object(&schema.query, &mut errors);
        if let Some(mutation) = &schema.mutation {
            schema.check_object(mutation, &mut errors);
        }
        for def in schema.types.values() {
            match def {
                TypeDef::Object(object) => schema.check_object(object, &mut errors),
                TypeDef::Union(union) => schema.check_union(union, &mut errors),
                TypeDef::Enum(_) => {}
            }
        }

        if errors.is_empty() {
            Response::success(schema)
        } else {
            Response::Failure(errors)
        }
    }

    fn resolves(&self, name: &str) -> bool {
        BUILT_IN_SCALARS.contains(&name) || self.types.contains_key(name)
    }

    fn check_object(&self, object: &ObjectDef, errors: &mut Vec<ResponseError>) {
        for field in &object.fields {
            let base = field.ty.base_name();
            if !self.resolves(base) {
                errors.push(ResponseError::validation(format!(
                    "field '{}.{}' references unknown type '{}'",
                    object.name, field.name, base
                )));
            }
            for argument in &field.arguments {
                let base = argument.ty.base_name();
                if !self.resolves(base) {
                    errors.push(ResponseError::validation(format!(
                        "argument '{}' of '{}.{}' references unknown type '{}'",
                        argument.name, object.name, field.name, base
                    )));
                }
            }
        }
    }

    fn check_union(&self, union: &UnionDef, errors: &mut Vec<ResponseError>) {
        for member in &union.members {
            match self.types.get(member) {
                Some(TypeDef::Object(_)) => {}
                Some(_) => errors.push(ResponseError::validation(format!(
                    "union '{}' member '{}' is not an object type",
                    union.name, member
                ))),
                None => errors.push(ResponseError::validation(format!(
                    "union '{}' references unknown type '{}'",
                    union.name, member
                ))),
            }
        }
    }

    /// Look up a defined type by name
    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    /// Render the schema as SDL text
    pub fn to_sdl(&self) -> String {
        let mut sdl = String::new();
        render_object(&mut sdl, &self.query);
        if let Some(mutation) = &self.mutation {
            sdl.push('\n');
            render_object(&mut sdl, mutation);
        }
        for def in self.types.values() {
            sdl.push('\n');
            match def {
                TypeDef::Object(object) => render_object(&mut sdl, object),
                TypeDef::Union(union) => render_union(&mut sdl, union),
                TypeDef::Enum(enumeration) => render_enum(&mut sdl, enumeration),
            }
        }
        sdl
    }
}

fn render_description(sdl: &mut String, description: &Option<String>, indent: &str) {
    if let Some(description) = description {
        sdl.push_str(&format!("{}\"\"\"{}\"\"\"\n", indent, description));
    }
}

fn render_object(sdl: &mut String, object: &ObjectDef) {
    render_description(sdl, &object.description, "");
    sdl.push_str(&format!("type {} {{\n", object.name));
    for field in &object.fields {
        render_description(sdl, &field.description, "  ");
        if field.arguments.is_empty() {
            sdl.push_str(&format!("  {}: {}\n", field.name, field.ty));
        } else {
            let arguments = field
                .arguments
                .iter()
                .map(|argument| format!("{}: {}", argument.name, argument.ty))
                .collect::<Vec<_>>()
                .join(", ");
            sdl.push_str(&format!("  {}({}): {}\n", field.name, arguments, field.ty));
        }
    }
    sdl.push_str("}\n");
}

fn render_union(sdl: &mut String, union: &UnionDef) {
    render_description(sdl, &union.description, "");
    sdl.push_str(&format!("union {} = {}\n", union.name, union.members.join(" | ")));
}

fn render_enum(sdl: &mut String, enumeration: &EnumDef) {
    render_description(sdl, &enumeration.description, "");
    sdl.push_str(&format!("enum {} {{\n", enumeration.name));
    for value in &enumeration.values {
        sdl.push_str(&format!("  {}\n", value));
    }
    sdl.push_str("}\n");
}

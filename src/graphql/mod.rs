//! GraphQL Assembly
//!
//! The representative backend: consumes the flat type list plus the class
//! cache and assembles a [`GraphQLSchema`]. Every backend follows the same
//! consumption contract: read-only over the IR, dereferencing through
//! the cache, accumulating structural errors through the response algebra.
//!
//! Mapping:
//! - `Object` -> output object type; required properties get a non-null
//!   wrapper
//! - `OneOf` -> union type whose runtime resolver picks the first
//!   declared member
//! - `Array` -> list wrapper around the item type
//! - `Reference` -> lazy named reference, resolved by the schema's own
//!   forward-reference check
//! - `Primitive` -> Boolean / Int / Float / String
//! - `AllOf` -> object type with the members' fields inlined through the
//!   cache
//!
//! Construction is memoized in a local name-keyed registry so a type
//! reachable from several properties is built once. The registry tracks
//! built output types while the class cache guards IR recursion; each
//! backend memoizes in its own output model rather than sharing one
//! mechanism.

pub mod model;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::cache::ClassCache;
use crate::model::{AllOfType, BrApiType, EnumType, ObjectType, OneOfType, PrimitiveType, Property};
use crate::response::{ErrorKind, Response};
use crate::validation::Validation;

pub use model::{
    Argument, EnumDef, Field, GraphQLSchema, ObjectDef, TypeDef, TypeRef, UnionDef,
    BUILT_IN_SCALARS,
};

/// Generator configuration.
///
/// Name formats substitute `{name}` with the entity type name; the result
/// is lower-camel-cased for field names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GraphQLGeneratorOptions {
    pub query_type_name: String,
    pub mutation_type_name: String,
    /// Also assemble a mutation root over the primary models
    pub generate_mutations: bool,
    /// Query field name format; `None` uses the plain entity name
    pub query_name_format: Option<String>,
    /// Append an `s` to query field names instead of supplying a format
    pub pluralize_query_names: Option<bool>,
    pub mutation_name_format: String,
    /// Identifier argument name format, e.g. `{name}DbId` -> `trialDbId`
    pub id_name_format: String,
    /// Use the `ID` scalar for identifier arguments instead of `String`
    pub use_id_type: bool,
}

impl Default for GraphQLGeneratorOptions {
    fn default() -> Self {
        Self {
            query_type_name: "Query".to_string(),
            mutation_type_name: "Mutation".to_string(),
            generate_mutations: false,
            query_name_format: None,
            pluralize_query_names: None,
            mutation_name_format: "update{name}".to_string(),
            id_name_format: "{name}DbId".to_string(),
            use_id_type: true,
        }
    }
}

impl GraphQLGeneratorOptions {
    /// Check the whole options struct in one pass
    pub fn validate(&self) -> Validation {
        Validation::new()
            .assert_that(
                !self.query_type_name.is_empty(),
                "queryTypeName must not be empty",
            )
            .assert_that(
                !self.mutation_type_name.is_empty(),
                "mutationTypeName must not be empty",
            )
            .assert_mutually_exclusive(
                self.query_name_format.is_some(),
                self.pluralize_query_names.is_some(),
                "queryNameFormat and pluralizeQueryNames are mutually exclusive",
            )
            .assert_that(
                self.query_name_format
                    .as_deref()
                    .map(|format| format.contains("{name}"))
                    .unwrap_or(true),
                "queryNameFormat must contain '{name}'",
            )
            .assert_that(
                self.mutation_name_format.contains("{name}"),
                "mutationNameFormat must contain '{name}'",
            )
            .assert_that(
                self.id_name_format.contains("{name}"),
                "idNameFormat must contain '{name}'",
            )
    }

    fn query_field_name(&self, type_name: &str) -> String {
        let formatted = match &self.query_name_format {
            Some(format) => format.replace("{name}", type_name),
            None => type_name.to_string(),
        };
        let mut name = lower_camel(&formatted);
        if self.pluralize_query_names == Some(true) {
            name.push('s');
        }
        name
    }

    fn mutation_field_name(&self, type_name: &str) -> String {
        lower_camel(&self.mutation_name_format.replace("{name}", type_name))
    }

    fn id_argument(&self, type_name: &str) -> Argument {
        let scalar = if self.use_id_type { "ID" } else { "String" };
        Argument {
            name: lower_camel(&self.id_name_format.replace("{name}", type_name)),
            ty: TypeRef::named(scalar).non_null(),
        }
    }
}

/// Assembles a GraphQL schema from one read batch
#[derive(Debug, Default)]
pub struct GraphQLGenerator {
    options: GraphQLGeneratorOptions,
}

impl GraphQLGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: GraphQLGeneratorOptions) -> Self {
        Self { options }
    }

    /// Build the output schema over the whole batch, reporting every
    /// structural problem in one pass.
    pub fn generate(&self, types: &[BrApiType]) -> Response<GraphQLSchema> {
        let validation = self.options.validate();
        if !validation.is_valid() {
            return Response::failure(validation.errors().to_vec());
        }

        let cache = ClassCache::build(BrApiType::is_class, types);
        let mut registry: IndexMap<String, TypeDef> = IndexMap::new();

        let mut results = Vec::new();
        for ty in types.iter().filter(|ty| ty.is_class()) {
            results.push(self.register(ty, &cache, &mut registry));
        }
        let registered: Response<Vec<()>> = results.into_iter().collect();

        let query = self.build_root(&self.options.query_type_name, types, false);
        let mutation = self
            .options
            .generate_mutations
            .then(|| self.build_root(&self.options.mutation_type_name, types, true));

        registered.and_then(|_| GraphQLSchema::build(query, mutation, registry))
    }

    fn register(
        &self,
        ty: &BrApiType,
        cache: &ClassCache,
        registry: &mut IndexMap<String, TypeDef>,
    ) -> Response<()> {
        match ty {
            BrApiType::Object(object) => self.register_object(object, cache, registry),
            BrApiType::OneOf(one_of) => self.register_union(one_of, cache, registry),
            BrApiType::AllOf(all_of) => self.register_all_of(all_of, cache, registry),
            BrApiType::Enum(enumeration) => {
                register_enum(enumeration, registry);
                Response::success(())
            }
            // Unnamed top-level types define nothing by themselves
            BrApiType::Primitive(_) | BrApiType::Reference(_) | BrApiType::Array(_) => {
                Response::success(())
            }
        }
    }

    /// The output type reference for an IR type, registering any named
    /// type it embeds
    fn type_ref(
        &self,
        ty: &BrApiType,
        cache: &ClassCache,
        registry: &mut IndexMap<String, TypeDef>,
    ) -> Response<TypeRef> {
        match ty {
            BrApiType::Primitive(primitive) => Response::success(TypeRef::named(scalar_name(*primitive))),
            // Lazy: resolved by the schema's forward-reference check
            BrApiType::Reference(reference) => Response::success(TypeRef::named(&reference.name)),
            BrApiType::Array(array) => self
                .type_ref(&array.items, cache, registry)
                .map(TypeRef::list),
            BrApiType::Object(object) => self
                .register_object(object, cache, registry)
                .map(|_| TypeRef::named(&object.name)),
            BrApiType::OneOf(one_of) => self
                .register_union(one_of, cache, registry)
                .map(|_| TypeRef::named(&one_of.name)),
            BrApiType::AllOf(all_of) => self
                .register_all_of(all_of, cache, registry)
                .map(|_| TypeRef::named(&all_of.name)),
            BrApiType::Enum(enumeration) => {
                register_enum(enumeration, registry);
                Response::success(TypeRef::named(&enumeration.name))
            }
        }
    }

    fn register_object(
        &self,
        object: &ObjectType,
        cache: &ClassCache,
        registry: &mut IndexMap<String, TypeDef>,
    ) -> Response<()> {
        if registry.contains_key(&object.name) {
            return Response::success(());
        }

        self.fields(&object.properties, cache, registry).map(|fields| {
            registry.insert(
                object.name.clone(),
                TypeDef::Object(ObjectDef {
                    name: object.name.clone(),
                    description: object.description.clone(),
                    fields,
                }),
            );
        })
    }

    fn fields(
        &self,
        properties: &[Property],
        cache: &ClassCache,
        registry: &mut IndexMap<String, TypeDef>,
    ) -> Response<Vec<Field>> {
        let mut results = Vec::new();
        for property in properties {
            results.push(self.type_ref(&property.ty, cache, registry).map(|ty| Field {
                name: property.name.clone(),
                description: property.description.clone(),
                ty: if property.required { ty.non_null() } else { ty },
                arguments: Vec::new(),
            }));
        }
        results.into_iter().collect()
    }

    fn register_union(
        &self,
        one_of: &OneOfType,
        cache: &ClassCache,
        registry: &mut IndexMap<String, TypeDef>,
    ) -> Response<()> {
        if registry.contains_key(&one_of.name) {
            return Response::success(());
        }

        let mut results = Vec::new();
        for possible in &one_of.possible_types {
            let member = self
                .type_ref(possible, cache, registry)
                .and_then(|type_ref| match type_ref {
                    TypeRef::Named(name) => Response::success(name),
                    other => Response::fail(
                        ErrorKind::Validation,
                        format!(
                            "union '{}' member must be a named type, got '{}'",
                            one_of.name, other
                        ),
                    ),
                });
            results.push(member);
        }

        results
            .into_iter()
            .collect::<Response<Vec<String>>>()
            .map(|members| {
                registry.insert(
                    one_of.name.clone(),
                    TypeDef::Union(UnionDef {
                        name: one_of.name.clone(),
                        description: one_of.description.clone(),
                        members,
                    }),
                );
            })
    }

    /// Inline an AllOf composition: the fields of every member, resolved
    /// through the cache, become one object type
    fn register_all_of(
        &self,
        all_of: &AllOfType,
        cache: &ClassCache,
        registry: &mut IndexMap<String, TypeDef>,
    ) -> Response<()> {
        if registry.contains_key(&all_of.name) {
            return Response::success(());
        }

        let mut results = Vec::new();
        for member in &all_of.all_types {
            let fields = cache
                .dereference(member)
                .and_then(|resolved| match resolved {
                    BrApiType::Object(object) => self.fields(&object.properties, cache, registry),
                    _ => Response::fail(
                        ErrorKind::Validation,
                        format!("allOf '{}' member must resolve to an object", all_of.name),
                    ),
                });
            results.push(fields);
        }

        results
            .into_iter()
            .collect::<Response<Vec<Vec<Field>>>>()
            .map(|groups| {
                registry.insert(
                    all_of.name.clone(),
                    TypeDef::Object(ObjectDef {
                        name: all_of.name.clone(),
                        description: all_of.description.clone(),
                        fields: groups.into_iter().flatten().collect(),
                    }),
                );
            })
    }

    /// Assemble a root type over the primary models, one field per model
    /// with a required identifier argument
    fn build_root(&self, name: &str, types: &[BrApiType], mutation: bool) -> ObjectDef {
        let fields = types
            .iter()
            .filter_map(|ty| match ty {
                BrApiType::Object(object) if object.primary_model => Some(object),
                _ => None,
            })
            .map(|object| {
                let field_name = if mutation {
                    self.options.mutation_field_name(&object.name)
                } else {
                    self.options.query_field_name(&object.name)
                };
                Field {
                    name: field_name,
                    description: object.description.clone(),
                    ty: TypeRef::named(&object.name),
                    arguments: vec![self.options.id_argument(&object.name)],
                }
            })
            .collect();

        ObjectDef {
            name: name.to_string(),
            description: None,
            fields,
        }
    }
}

/// The fixed scalar mapping shared by every backend consumer
fn scalar_name(primitive: PrimitiveType) -> &'static str {
    match primitive {
        PrimitiveType::Boolean => "Boolean",
        PrimitiveType::Integer => "Int",
        PrimitiveType::Number => "Float",
        PrimitiveType::String => "String",
    }
}

fn register_enum(enumeration: &EnumType, registry: &mut IndexMap<String, TypeDef>) {
    if registry.contains_key(&enumeration.name) {
        return;
    }
    registry.insert(
        enumeration.name.clone(),
        TypeDef::Enum(EnumDef {
            name: enumeration.name.clone(),
            description: enumeration.description.clone(),
            values: enumeration
                .values
                .iter()
                .map(|value| value.name.clone())
                .collect(),
        }),
    );
}

/// Lowercase the first character: `Trial` -> `trial`
fn lower_camel(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

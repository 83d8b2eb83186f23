//! Class Cache
//!
//! A name-keyed index over one read batch, used to dereference
//! [`ReferenceType`] pointers and to enumerate the named classes a backend
//! cares about. Built fresh for every generation run and discarded
//! afterward.
//!
//! The cache is cycle-safe without a separate visited set: a named type is
//! inserted before its children are visited, so a self-referencing or
//! mutually-referencing object graph terminates recursion the moment a
//! name reappears.

use indexmap::IndexMap;

use crate::model::{BrApiType, ReferenceType};
use crate::response::{ErrorKind, Response};

/// Name-keyed, cycle-safe index over a batch of types
#[derive(Debug, Default)]
pub struct ClassCache {
    classes: IndexMap<String, BrApiType>,
}

impl ClassCache {
    /// Index every named type in `types` (and those nested inside them)
    /// that passes `predicate`.
    ///
    /// `AllOf` composition types are deliberately excluded: backends
    /// inline them rather than treating them as independent cache nodes.
    pub fn build(predicate: impl Fn(&BrApiType) -> bool, types: &[BrApiType]) -> Self {
        let mut cache = Self::default();
        for ty in types {
            cache.insert(&predicate, ty);
        }
        cache
    }

    fn insert(&mut self, predicate: &impl Fn(&BrApiType) -> bool, ty: &BrApiType) {
        match ty {
            BrApiType::Object(object) => {
                // Presence by name doubles as the cycle guard
                if self.classes.contains_key(&object.name) || !predicate(ty) {
                    return;
                }
                self.classes.insert(object.name.clone(), ty.clone());
                for property in &object.properties {
                    self.insert(predicate, &property.ty);
                }
            }
            BrApiType::OneOf(one_of) => {
                if self.classes.contains_key(&one_of.name) || !predicate(ty) {
                    return;
                }
                self.classes.insert(one_of.name.clone(), ty.clone());
                for possible in &one_of.possible_types {
                    self.insert(predicate, possible);
                }
            }
            BrApiType::Enum(enumeration) => {
                if self.classes.contains_key(&enumeration.name) || !predicate(ty) {
                    return;
                }
                self.classes.insert(enumeration.name.clone(), ty.clone());
            }
            // Arrays are unnamed; only their item type can be cached
            BrApiType::Array(array) => self.insert(predicate, &array.items),
            // Composition types are inlined by backends, never cached
            BrApiType::AllOf(_) => {}
            BrApiType::Primitive(_) | BrApiType::Reference(_) => {}
        }
    }

    pub fn get(&self, name: &str) -> Option<&BrApiType> {
        self.classes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Resolve a reference to its named type; identity for anything else.
    ///
    /// A name absent from the batch is a validation failure, never a
    /// silent null.
    pub fn dereference<'a>(&'a self, ty: &'a BrApiType) -> Response<&'a BrApiType> {
        match ty {
            BrApiType::Reference(ReferenceType { name }) => match self.classes.get(name) {
                Some(class) => Response::success(class),
                None => Response::fail(
                    ErrorKind::Validation,
                    format!("reference to unknown type '{}'", name),
                ),
            },
            _ => Response::success(ty),
        }
    }

    /// Names of every class in the batch, in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    /// Every cached class, in insertion order
    pub fn classes(&self) -> impl Iterator<Item = &BrApiType> {
        self.classes.values()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

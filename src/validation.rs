//! Configuration self-checking
//!
//! [`Validation`] is the non-generic sibling of [`crate::Response`], used
//! by option structs to check themselves. Each assertion appends to one
//! error list rather than stopping at the first violation, and
//! [`Validation::merge_prefixed`] lets a parent aggregate a nested
//! struct's violations with a traceable message prefix. One `validate()`
//! call over a deeply nested options tree returns every violation in a
//! single pass.

use crate::response::{ErrorKind, Response, ResponseError};

/// An accumulating list of configuration violations
#[derive(Debug, Default)]
pub struct Validation {
    errors: Vec<ResponseError>,
}

impl Validation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ResponseError] {
        &self.errors
    }

    /// Record a violation unless `condition` holds
    pub fn assert_that(mut self, condition: bool, message: impl Into<String>) -> Self {
        if !condition {
            self.errors
                .push(ResponseError::new(ErrorKind::Validation, message));
        }
        self
    }

    /// Record a violation if `value` is absent
    pub fn assert_some<T>(self, value: Option<&T>, message: impl Into<String>) -> Self {
        let present = value.is_some();
        self.assert_that(present, message)
    }

    /// Record a violation if both fields are set.
    ///
    /// Callers pass the two accessor values directly; which fields they
    /// name is spelled out in the message.
    pub fn assert_mutually_exclusive(
        self,
        first_set: bool,
        second_set: bool,
        message: impl Into<String>,
    ) -> Self {
        self.assert_that(!(first_set && second_set), message)
    }

    /// Aggregate a nested struct's violations
    pub fn merge(mut self, child: Validation) -> Self {
        self.errors.extend(child.errors);
        self
    }

    /// Aggregate a nested struct's violations, prefixing each message
    /// for traceability (e.g. `"queries."`)
    pub fn merge_prefixed(mut self, child: Validation, prefix: &str) -> Self {
        self.errors
            .extend(child.errors.into_iter().map(|e| e.prefixed(prefix)));
        self
    }

    /// Convert into a response: Empty when valid, Failure otherwise
    pub fn into_response(self) -> Response<()> {
        if self.errors.is_empty() {
            Response::empty()
        } else {
            Response::Failure(self.errors)
        }
    }
}

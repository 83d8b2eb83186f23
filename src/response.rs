//! Fail-slow response algebra
//!
//! [`Response`] is the container every reader and generator step returns.
//! It has three states: a value, no value (an absent optional construct,
//! not an error), or a list of accumulated errors.
//!
//! Two composition styles, with a deliberate asymmetry:
//! - [`Response::and_then`] short-circuits: a later step that structurally
//!   depends on an earlier value never runs if that value failed.
//! - [`Response::merge`] and collecting an iterator of responses do NOT
//!   short-circuit: independent siblings each report their own problems,
//!   and the error lists are unioned.
//!
//! Schema and configuration inputs are deep recursive trees; reporting only
//! the first error would force an edit-rerun cycle per problem. Every
//! traversal point reports independently and the algebra composes the
//! reports into one diagnostic list.

use serde::{Deserialize, Serialize};

/// Category of an accumulated error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or missing schema constructs, unresolvable references,
    /// failed configuration assertions
    Validation,
    /// Reserved for authorization subsystems, unused by the reader
    Permission,
    /// Anything else
    Other,
}

/// One accumulated error, attributable to its originating node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
    pub kind: ErrorKind,
}

impl ResponseError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            kind,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Prepend a context prefix to the message
    pub fn prefixed(mut self, prefix: &str) -> Self {
        self.message = format!("{}{}", prefix, self.message);
        self
    }
}

impl std::fmt::Display for ResponseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "[{}] {}", code, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// A computation result carrying either a value, no value, or every error
/// the computation and its merged siblings produced
#[derive(Debug, Clone, PartialEq)]
pub enum Response<T> {
    Success(T),
    Empty,
    Failure(Vec<ResponseError>),
}

impl<T> Response<T> {
    pub fn success(value: T) -> Self {
        Response::Success(value)
    }

    pub fn empty() -> Self {
        Response::Empty
    }

    pub fn fail(kind: ErrorKind, message: impl Into<String>) -> Self {
        Response::Failure(vec![ResponseError::new(kind, message)])
    }

    pub fn fail_with_code(kind: ErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Response::Failure(vec![ResponseError::new(kind, message).with_code(code)])
    }

    pub fn failure(errors: Vec<ResponseError>) -> Self {
        Response::Failure(errors)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Response::Empty)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Response::Failure(_))
    }

    /// Accumulated errors; empty unless this is a Failure
    pub fn errors(&self) -> &[ResponseError] {
        match self {
            Response::Failure(errors) => errors,
            _ => &[],
        }
    }

    /// Transform the success value; Empty and Failure pass through unchanged
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Response<U> {
        match self {
            Response::Success(value) => Response::Success(f(value)),
            Response::Empty => Response::Empty,
            Response::Failure(errors) => Response::Failure(errors),
        }
    }

    /// Chain a dependent step; the only short-circuiting combinator.
    ///
    /// If this response is a Failure, `f` is never invoked and the failure
    /// propagates. Use when the next step cannot be computed without the
    /// value (a field's type cannot be built if the field node failed).
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Response<U>) -> Response<U> {
        match self {
            Response::Success(value) => f(value),
            Response::Empty => Response::Empty,
            Response::Failure(errors) => Response::Failure(errors),
        }
    }

    /// Union this response with an independently computed one.
    ///
    /// If either side is a Failure the result is a Failure carrying the
    /// union of both error lists. Not short-circuiting: this is how two
    /// unrelated siblings each report their own problems.
    pub fn merge<U>(self, other: Response<U>) -> Response<T> {
        match (self, other) {
            (Response::Failure(mut errors), Response::Failure(other_errors)) => {
                errors.extend(other_errors);
                Response::Failure(errors)
            }
            (Response::Failure(errors), _) => Response::Failure(errors),
            (_, Response::Failure(errors)) => Response::Failure(errors),
            (this, _) => this,
        }
    }

    /// Apply `f` to the success value only when `condition` holds.
    ///
    /// Lets an optional schema construct contribute zero value and zero
    /// error when absent, with no null checks at the call site.
    pub fn map_on_condition(self, condition: bool, f: impl FnOnce(T) -> Response<T>) -> Response<T> {
        if condition {
            self.and_then(f)
        } else {
            self
        }
    }

    /// Merge the supplier's response only when `condition` holds
    pub fn merge_on_condition<U>(
        self,
        condition: bool,
        f: impl FnOnce() -> Response<U>,
    ) -> Response<T> {
        if condition {
            let other = f();
            self.merge(other)
        } else {
            self
        }
    }

    /// Prepend a context prefix to every accumulated error message;
    /// Success and Empty pass through unchanged
    pub fn prefixed(self, prefix: &str) -> Self {
        match self {
            Response::Failure(errors) => Response::Failure(
                errors.into_iter().map(|error| error.prefixed(prefix)).collect(),
            ),
            other => other,
        }
    }

    /// The success value, if any
    pub fn ok(self) -> Option<T> {
        match self {
            Response::Success(value) => Some(value),
            _ => None,
        }
    }

    /// Convert into a plain Result, treating Empty as an error
    pub fn into_result(self) -> std::result::Result<T, Vec<ResponseError>> {
        match self {
            Response::Success(value) => Ok(value),
            Response::Empty => Err(vec![ResponseError::new(ErrorKind::Other, "empty response")]),
            Response::Failure(errors) => Err(errors),
        }
    }
}

/// Fail-slow list collection.
///
/// Succeeds only if every element succeeded; on any failure the aggregate
/// error list is the union of every failing element's errors, not merely
/// the first. Empty elements contribute no value and no error.
impl<T> FromIterator<Response<T>> for Response<Vec<T>> {
    fn from_iter<I: IntoIterator<Item = Response<T>>>(iter: I) -> Self {
        let mut values = Vec::new();
        let mut errors = Vec::new();
        for response in iter {
            match response {
                Response::Success(value) => values.push(value),
                Response::Empty => {}
                Response::Failure(errs) => errors.extend(errs),
            }
        }
        if errors.is_empty() {
            Response::Success(values)
        } else {
            Response::Failure(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_passes_empty_and_failure_through() {
        let success: Response<i32> = Response::success(2).map(|v| v * 2);
        assert_eq!(success, Response::Success(4));

        let empty: Response<i32> = Response::Empty.map(|v: i32| v * 2);
        assert!(empty.is_empty());

        let failure: Response<i32> =
            Response::fail(ErrorKind::Validation, "bad").map(|v: i32| v * 2);
        assert!(failure.is_failure());
    }

    #[test]
    fn test_and_then_short_circuits_on_failure() {
        let mut invoked = false;
        let result: Response<i32> = Response::<i32>::fail(ErrorKind::Validation, "bad").and_then(|v| {
            invoked = true;
            Response::success(v + 1)
        });
        assert!(!invoked, "and_then must not invoke f on a failure");
        assert_eq!(result.errors().len(), 1);
    }

    #[test]
    fn test_merge_unions_both_error_lists() {
        let left: Response<i32> = Response::fail(ErrorKind::Validation, "left");
        let right: Response<String> = Response::fail(ErrorKind::Validation, "right");
        let merged = left.merge(right);
        let messages: Vec<&str> = merged.errors().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["left", "right"]);
    }

    #[test]
    fn test_merge_fails_even_when_only_one_side_failed() {
        let merged = Response::success(1).merge(Response::<()>::fail(ErrorKind::Validation, "bad"));
        assert!(merged.is_failure());

        let merged = Response::<()>::fail(ErrorKind::Validation, "bad").merge(Response::success(1));
        assert!(merged.is_failure());
    }

    #[test]
    fn test_collect_all_success() {
        let collected: Response<Vec<i32>> =
            (0..3).map(Response::success).collect();
        assert_eq!(collected, Response::Success(vec![0, 1, 2]));
    }

    #[test]
    fn test_collect_reports_exactly_the_failing_element() {
        let collected: Response<Vec<i32>> = vec![
            Response::success(1),
            Response::fail(ErrorKind::Validation, "only failure"),
            Response::success(3),
        ]
        .into_iter()
        .collect();
        assert_eq!(collected.errors().len(), 1);
        assert_eq!(collected.errors()[0].message, "only failure");
    }

    #[test]
    fn test_collect_unions_two_failing_elements() {
        let collected: Response<Vec<i32>> = vec![
            Response::fail(ErrorKind::Validation, "first"),
            Response::success(2),
            Response::fail(ErrorKind::Validation, "second"),
        ]
        .into_iter()
        .collect();
        let messages: Vec<&str> = collected.errors().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second"]);
    }

    #[test]
    fn test_collect_skips_empty_elements() {
        let collected: Response<Vec<i32>> =
            vec![Response::success(1), Response::Empty, Response::success(3)]
                .into_iter()
                .collect();
        assert_eq!(collected, Response::Success(vec![1, 3]));
    }

    #[test]
    fn test_map_on_condition() {
        let unchanged = Response::success(1).map_on_condition(false, |_| {
            Response::fail(ErrorKind::Validation, "never evaluated")
        });
        assert_eq!(unchanged, Response::Success(1));

        let applied = Response::success(1).map_on_condition(true, |v| Response::success(v + 1));
        assert_eq!(applied, Response::Success(2));
    }

    #[test]
    fn test_merge_on_condition() {
        let unchanged = Response::success(1)
            .merge_on_condition(false, || Response::<()>::fail(ErrorKind::Validation, "skipped"));
        assert_eq!(unchanged, Response::Success(1));

        let merged = Response::success(1)
            .merge_on_condition(true, || Response::<()>::fail(ErrorKind::Validation, "merged"));
        assert!(merged.is_failure());
    }

    #[test]
    fn test_prefixed_touches_only_failures() {
        let failure: Response<i32> = Response::fail(ErrorKind::Validation, "bad ref");
        assert_eq!(failure.prefixed("Trial.json: ").errors()[0].message, "Trial.json: bad ref");

        let success = Response::success(1).prefixed("Trial.json: ");
        assert_eq!(success, Response::Success(1));
    }

    #[test]
    fn test_error_code_and_display() {
        let err = ResponseError::validation("bad ref").with_code("REF001");
        assert_eq!(err.to_string(), "[REF001] bad ref");
        assert_eq!(err.prefixed("Trial: ").message, "Trial: bad ref");
    }
}

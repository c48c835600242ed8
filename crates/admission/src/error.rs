//! Admission error types.
//!
//! Every rule violation is a [`FieldError`]. Independent checks each return a
//! (possibly empty) list and the engine concatenates them into a single
//! [`ValidationErrors`] value; an empty list means the change is admitted.

use std::fmt;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{Status, StatusCause, StatusDetails};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Errors raised while building the admission engine itself.
#[derive(Debug, Error)]
pub enum AdmissionError {
    /// The semantic version pattern failed to compile
    #[error("Invalid version pattern: {0}")]
    VersionPattern(#[from] regex::Error),
}

/// Category of a rule violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// Malformed value (bad version string, bad IP, bad key, missing sub-field)
    Structural,

    /// Attempted change to a field that is already set
    ImmutableField,

    /// Attempted removal of a sticky field that is already set
    UnsettingNotAllowed,

    /// Two mutually exclusive sub-structures populated together
    ConflictingConfiguration,

    /// Disallowed authentication-mode migration
    IllegalProfileTransition,
}

impl ErrorKind {
    /// Stable name, used in logs and CLI output
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Structural => "Structural",
            Self::ImmutableField => "ImmutableField",
            Self::UnsettingNotAllowed => "UnsettingNotAllowed",
            Self::ConflictingConfiguration => "ConflictingConfiguration",
            Self::IllegalProfileTransition => "IllegalProfileTransition",
        }
    }

    /// Kubernetes `StatusCause` reason
    pub fn cause_reason(self) -> &'static str {
        match self {
            Self::ConflictingConfiguration | Self::IllegalProfileTransition => "FieldValueForbidden",
            _ => "FieldValueInvalid",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dot-separated path to a field, e.g. `spec.aadProfile.managedAAD`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FieldPath(String);

impl FieldPath {
    /// Path rooted at `root`
    pub fn new(root: &str) -> Self {
        Self(root.to_string())
    }

    /// Path of the `spec` block, where every governed field lives
    pub fn spec() -> Self {
        Self::new("spec")
    }

    /// Path extended by one segment
    #[must_use]
    pub fn child(&self, name: &str) -> Self {
        Self(format!("{}.{}", self.0, name))
    }

    /// Path in dotted form
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// JSON echo of a rejected value; `null` if it cannot be represented
pub(crate) fn echo<T: Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_default()
}

/// A single rule violation
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("{field_path}: Invalid value: {rejected_value}: {message}")]
pub struct FieldError {
    /// Which rule was violated
    pub kind: ErrorKind,
    /// Field the violation is reported against
    pub field_path: FieldPath,
    /// Echo of the offending value (`null` when the field was removed)
    pub rejected_value: Value,
    /// Human-readable reason
    pub message: String,
}

impl FieldError {
    /// Violation of `kind` at `field_path`
    pub fn new(
        kind: ErrorKind,
        field_path: FieldPath,
        rejected_value: impl Into<Value>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            field_path,
            rejected_value: rejected_value.into(),
            message: message.into(),
        }
    }

    /// Malformed value
    pub fn structural(field_path: FieldPath, value: impl Into<Value>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Structural, field_path, value, message)
    }

    /// Change to a field that is already set
    pub fn immutable(field_path: FieldPath, value: impl Into<Value>) -> Self {
        Self::new(ErrorKind::ImmutableField, field_path, value, "field is immutable")
    }

    /// Removal of a sticky field that is already set
    pub fn unsetting_not_allowed(field_path: FieldPath) -> Self {
        Self::new(
            ErrorKind::UnsettingNotAllowed,
            field_path,
            Value::Null,
            "field is immutable, unsetting is not allowed",
        )
    }

    /// Mutually exclusive shapes populated together
    pub fn conflicting(field_path: FieldPath, value: impl Into<Value>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConflictingConfiguration, field_path, value, message)
    }

    /// Disallowed authentication-mode migration
    pub fn illegal_transition(field_path: FieldPath, value: impl Into<Value>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IllegalProfileTransition, field_path, value, message)
    }
}

/// Ordered collection of every violation found in one evaluation pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Error)]
#[serde(transparent)]
#[error("{}", render(.0))]
pub struct ValidationErrors(Vec<FieldError>);

fn render(errors: &[FieldError]) -> String {
    match errors {
        [] => "no validation errors".to_string(),
        [single] => single.to_string(),
        many => format!(
            "[{}]",
            many.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
        ),
    }
}

impl ValidationErrors {
    /// Empty list, i.e. an admitted change
    pub fn new() -> Self {
        Self::default()
    }

    /// True when nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of recorded violations
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Violations in the order they were recorded
    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.0.iter()
    }

    /// Record one more violation
    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    /// True if any violation of `kind` was recorded
    pub fn contains_kind(&self, kind: ErrorKind) -> bool {
        self.0.iter().any(|e| e.kind == kind)
    }

    /// Violations recorded against exactly `path`
    pub fn at_path<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a FieldError> + 'a {
        self.0.iter().filter(move |e| e.field_path.as_str() == path)
    }

    /// `Ok(())` when nothing was recorded, the full list otherwise
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    /// The recorded violations
    pub fn into_vec(self) -> Vec<FieldError> {
        self.0
    }

    /// Kubernetes `Status` the API server would return for this rejection
    ///
    /// Mirrors `apierrors.NewInvalid`: code 422, reason `Invalid`, and one cause
    /// per violation.
    pub fn to_status(&self, kind: &str, group: &str, name: &str) -> Status {
        let causes = self
            .0
            .iter()
            .map(|e| StatusCause {
                field: Some(e.field_path.to_string()),
                message: Some(format!("Invalid value: {}: {}", e.rejected_value, e.message)),
                reason: Some(e.kind.cause_reason().to_string()),
            })
            .collect();

        Status {
            code: Some(422),
            message: Some(format!("{kind}.{group} \"{name}\" is invalid: {self}")),
            reason: Some("Invalid".to_string()),
            status: Some("Failure".to_string()),
            details: Some(StatusDetails {
                causes: Some(causes),
                group: Some(group.to_string()),
                kind: Some(kind.to_string()),
                name: Some(name.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

impl From<Vec<FieldError>> for ValidationErrors {
    fn from(errors: Vec<FieldError>) -> Self {
        Self(errors)
    }
}

impl FromIterator<FieldError> for ValidationErrors {
    fn from_iter<I: IntoIterator<Item = FieldError>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<FieldError> for ValidationErrors {
    fn extend<I: IntoIterator<Item = FieldError>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for ValidationErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

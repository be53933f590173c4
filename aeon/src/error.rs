//! Error types for model construction and mutation.
//!
//! Every validated model reports failures through [`ValidationError`], which
//! pairs the location of the offending field ([`FieldPath`]) with a
//! machine-checkable [`ErrorKind`]. Scalar adapters (times and angles) report
//! unparseable input through [`ParseError`]; when that happens inside a model
//! the parse error is wrapped into a `ValidationError` carrying the field path.

use std::fmt;

/// Result type for model construction and assignment.
pub type ModelResult<T> = Result<T, ValidationError>;

/// One step in a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

/// Location of a field inside a nested model tree, outermost first.
///
/// Displayed as `requests[0].configurations[1].target.ra`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path consisting of a single field name.
    pub fn field(name: impl Into<String>) -> Self {
        Self(vec![PathSegment::Field(name.into())])
    }

    /// Prepend a field name (used while an error bubbles up to its parent).
    pub fn with_parent_field(mut self, name: impl Into<String>) -> Self {
        self.0.insert(0, PathSegment::Field(name.into()));
        self
    }

    /// Prepend a list index.
    pub fn with_parent_index(mut self, index: usize) -> Self {
        self.0.insert(0, PathSegment::Index(index));
        self
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The innermost field name, if any.
    pub fn last_field(&self) -> Option<&str> {
        self.0.iter().rev().find_map(|segment| match segment {
            PathSegment::Field(name) => Some(name.as_str()),
            PathSegment::Index(_) => None,
        })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if i == 0 => write!(f, "{}", name)?,
                PathSegment::Field(name) => write!(f, ".{}", name)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

/// Failure converting raw input into a time or angle value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid angle '{input}': {reason}")]
    InvalidAngle { input: String, reason: String },

    #[error("invalid time '{input}': {reason}")]
    InvalidTime { input: String, reason: String },
}

impl ParseError {
    pub fn angle(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAngle {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn time(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTime {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

/// What went wrong with a field.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ErrorKind {
    #[error("value must be greater than {limit}")]
    GreaterThan { limit: f64 },

    #[error("value must be greater than or equal to {limit}")]
    GreaterThanEqual { limit: f64 },

    #[error("value must be less than {limit}")]
    LessThan { limit: f64 },

    #[error("value must be less than or equal to {limit}")]
    LessThanEqual { limit: f64 },

    #[error("value must be a finite number")]
    NotFinite,

    #[error("string has {actual} characters, at most {max} allowed")]
    StringTooLong { max: usize, actual: usize },

    #[error("'{value}' is not one of: {}", allowed.join(", "))]
    NotAllowed { value: String, allowed: Vec<String> },

    #[error("required field missing")]
    Missing,

    #[error("list needs at least {min} item(s)")]
    TooShort { min: usize },

    #[error("field not permitted here: {reason}")]
    NotPermitted { reason: String },

    #[error("unknown variant '{value}', expected one of: {}", expected.join(", "))]
    UnknownVariant { value: String, expected: Vec<String> },

    #[error("{0}")]
    Parse(ParseError),

    #[error("{0}")]
    InvalidOrder(String),
}

impl ErrorKind {
    /// Stable tag suitable for programmatic matching.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::GreaterThan { .. } => "greater_than",
            ErrorKind::GreaterThanEqual { .. } => "greater_than_equal",
            ErrorKind::LessThan { .. } => "less_than",
            ErrorKind::LessThanEqual { .. } => "less_than_equal",
            ErrorKind::NotFinite => "not_finite",
            ErrorKind::StringTooLong { .. } => "string_too_long",
            ErrorKind::NotAllowed { .. } => "literal_error",
            ErrorKind::Missing => "missing",
            ErrorKind::TooShort { .. } => "too_short",
            ErrorKind::NotPermitted { .. } => "extra_forbidden",
            ErrorKind::UnknownVariant { .. } => "unknown_variant",
            ErrorKind::Parse(_) => "parse_error",
            ErrorKind::InvalidOrder(_) => "invalid_order",
        }
    }
}

/// A field failed validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{path}: {kind}")]
pub struct ValidationError {
    path: FieldPath,
    kind: ErrorKind,
}

impl ValidationError {
    /// Error not yet attached to a field; callers attach one with [`Self::in_field`].
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            path: FieldPath::new(),
            kind,
        }
    }

    pub fn at(field: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            path: FieldPath::field(field),
            kind,
        }
    }

    pub fn missing(field: impl Into<String>) -> Self {
        Self::at(field, ErrorKind::Missing)
    }

    pub fn not_allowed<S: AsRef<str>>(value: impl Into<String>, allowed: &[S]) -> Self {
        Self::new(ErrorKind::NotAllowed {
            value: value.into(),
            allowed: allowed.iter().map(|s| s.as_ref().to_string()).collect(),
        })
    }

    pub fn not_permitted(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotPermitted {
            reason: reason.into(),
        })
    }

    /// Prefix the path with the containing field.
    pub fn in_field(mut self, field: impl Into<String>) -> Self {
        self.path = self.path.with_parent_field(field);
        self
    }

    /// Prefix the path with a list index.
    pub fn in_index(mut self, index: usize) -> Self {
        self.path = self.path.with_parent_index(index);
        self
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// The innermost field name the error refers to.
    pub fn field(&self) -> Option<&str> {
        self.path.last_field()
    }
}

impl From<ParseError> for ValidationError {
    fn from(err: ParseError) -> Self {
        Self::new(ErrorKind::Parse(err))
    }
}

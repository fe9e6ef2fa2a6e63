/*
Error types for mapdiff
Fatal comparison errors plus the per-key mismatch taxonomy recorded in results.
*/

use crate::types::Type;
use crate::value::Value;
use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Errors that abort a comparison or a report
#[derive(Debug, Error)]
pub enum CompareError {
    /// Source mapping is absent while the target is present
    #[error("source map is nil")]
    SourceMapIsNil,

    /// Target mapping is absent while the source is present
    #[error("target map is nil")]
    TargetMapIsNil,

    /// Report sink failed
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Value cannot be used as a map key
    #[error("unsupported map key: {0}")]
    UnsupportedKey(String),

    /// Document root is neither a mapping nor null
    #[error("invalid document: {0}")]
    InvalidDocument(String),
}

/// Result type for mapdiff operations
pub type Result<T> = core::result::Result<T, CompareError>;

impl From<serde_json::Error> for CompareError {
    fn from(err: serde_json::Error) -> Self {
        CompareError::Serialization(err.to_string())
    }
}

impl serde::ser::Error for CompareError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        CompareError::Serialization(msg.to_string())
    }
}

/// Why a single key did not match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MismatchKind {
    TypeMismatch,
    KindMismatch,
    ValueMismatch,
    SliceSizeMismatch,
    ByteSliceMismatch,
    /// Some nested key mismatched; details live in the children
    InnerKeyMismatch,
    /// Present in the source, absent in the target
    MissingKey,
    /// Present in the target, absent in the source
    ExtraKey,
}

impl MismatchKind {
    pub fn message(&self) -> &'static str {
        match self {
            MismatchKind::TypeMismatch => "type mismatch",
            MismatchKind::KindMismatch => "kind mismatch",
            MismatchKind::ValueMismatch => "value mismatch",
            MismatchKind::SliceSizeMismatch => "slice size mismatch",
            MismatchKind::ByteSliceMismatch => "byte slice mismatch",
            MismatchKind::InnerKeyMismatch => "inner key mismatch",
            MismatchKind::MissingKey => "this key is missing in the target map",
            MismatchKind::ExtraKey => {
                "this key doesn't exist in the source map but exist in the target map"
            }
        }
    }
}

impl fmt::Display for MismatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl Serialize for MismatchKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.message())
    }
}

/// Diagnostic payload attached to a mismatch
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Detail {
    Value(Value),
    Type(Type),
    /// Pre-rendered text (collection snapshots, hex dumps)
    Text(String),
}

impl fmt::Display for Detail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Detail::Value(v) => write!(f, "{v}"),
            Detail::Type(t) => write!(f, "{t}"),
            Detail::Text(s) => f.write_str(s),
        }
    }
}

/// A recorded mismatch with optional expected/found diagnostics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mismatch {
    pub kind: MismatchKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<Detail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub found: Option<Detail>,
}

impl Mismatch {
    /// Mismatch without diagnostics
    pub fn new(kind: MismatchKind) -> Self {
        Self {
            kind,
            expected: None,
            found: None,
        }
    }

    /// Mismatch carrying both sides
    pub fn with_details(
        kind: MismatchKind,
        expected: Option<Detail>,
        found: Option<Detail>,
    ) -> Self {
        Self {
            kind,
            expected,
            found,
        }
    }

    pub fn values(kind: MismatchKind, expected: Value, found: Value) -> Self {
        Self::with_details(kind, Some(Detail::Value(expected)), Some(Detail::Value(found)))
    }

    /// Check if either side carries a diagnostic payload
    pub fn has_details(&self) -> bool {
        self.expected.is_some() || self.found.is_some()
    }
}

impl From<MismatchKind> for Mismatch {
    fn from(kind: MismatchKind) -> Self {
        Mismatch::new(kind)
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if self.has_details() {
            write!(
                f,
                ", expected: {}, found: {}",
                DisplayOpt(&self.expected),
                DisplayOpt(&self.found)
            )?;
        }
        Ok(())
    }
}

/// Renders an absent diagnostic as `null`
pub(crate) struct DisplayOpt<'a>(pub &'a Option<Detail>);

impl fmt::Display for DisplayOpt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(d) => write!(f, "{d}"),
            None => f.write_str("null"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(CompareError::SourceMapIsNil.to_string(), "source map is nil");
        assert_eq!(CompareError::TargetMapIsNil.to_string(), "target map is nil");
    }

    #[test]
    fn test_mismatch_display_without_details() {
        let m = Mismatch::new(MismatchKind::MissingKey);
        assert_eq!(m.to_string(), "this key is missing in the target map");
    }

    #[test]
    fn test_mismatch_display_with_details() {
        let m = Mismatch::values(MismatchKind::ValueMismatch, Value::int(5), Value::int(6));
        assert_eq!(m.to_string(), "value mismatch, expected: 5, found: 6");
    }

    #[test]
    fn test_mismatch_display_one_sided() {
        let m = Mismatch::with_details(
            MismatchKind::KindMismatch,
            None,
            Some(Detail::Value(Value::string("x"))),
        );
        assert_eq!(m.to_string(), "kind mismatch, expected: null, found: x");
    }

    #[test]
    fn test_serialization_error_conversion() {
        let err = serde_json::from_str::<u8>("nope").unwrap_err();
        let err: CompareError = err.into();
        assert!(err.to_string().contains("serialization error"));
    }
}

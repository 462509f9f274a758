//! Error types for the styling engine

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Location of a token or construct in the source text.
///
/// `start` and `end` are character offsets, `line` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SourcePosition {
    pub line: usize,
    pub start: usize,
    pub end: usize,
}

impl SourcePosition {
    pub fn new(line: usize, start: usize, end: usize) -> Self {
        Self { line, start, end }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, offset {}..{}", self.line, self.start, self.end)
    }
}

#[derive(Error, Debug)]
pub enum StyleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Lexical error at {position}: {message}")]
    Lex { position: SourcePosition, message: String },

    #[error("Syntax error at {position}: {message}")]
    Syntax { position: SourcePosition, message: String },

    #[error("Function error at {position}: {message}")]
    Function { position: SourcePosition, message: String },

    #[error("Recursion error at {position}: {message}")]
    Recursion { position: SourcePosition, message: String },

    #[error("Cannot convert value of '{property}': {message}")]
    Conversion { property: String, message: String },

    #[error("Invalid regular expression at {position}: {source}")]
    Regex {
        position: SourcePosition,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },
}

pub type Result<T> = std::result::Result<T, StyleError>;

impl StyleError {
    pub fn lex(position: SourcePosition, message: impl Into<String>) -> Self {
        Self::Lex {
            position,
            message: message.into(),
        }
    }

    pub fn syntax(position: SourcePosition, message: impl Into<String>) -> Self {
        Self::Syntax {
            position,
            message: message.into(),
        }
    }

    pub fn function(position: SourcePosition, message: impl Into<String>) -> Self {
        Self::Function {
            position,
            message: message.into(),
        }
    }

    pub fn recursion(position: SourcePosition, message: impl Into<String>) -> Self {
        Self::Recursion {
            position,
            message: message.into(),
        }
    }

    pub fn conversion(property: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conversion {
            property: property.into(),
            message: message.into(),
        }
    }

    /// Source position of the error, when it is tied to one.
    pub fn position(&self) -> Option<SourcePosition> {
        match self {
            Self::Lex { position, .. }
            | Self::Syntax { position, .. }
            | Self::Function { position, .. }
            | Self::Recursion { position, .. }
            | Self::Regex { position, .. } => Some(*position),
            Self::Io(_) | Self::Conversion { .. } | Self::InvalidFormat { .. } => None,
        }
    }

    /// Whether the engine can skip the offending construct and carry on.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Io(_) | Self::InvalidFormat { .. })
    }

    /// Re-labels a conversion error with the property it was raised for.
    pub(crate) fn for_property(self, property: &str) -> Self {
        match self {
            Self::Conversion { message, .. } => Self::conversion(property, message),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_position() {
        let err = StyleError::syntax(SourcePosition::new(3, 10, 12), "'{' expected");
        assert_eq!(
            err.to_string(),
            "Syntax error at line 3, offset 10..12: '{' expected"
        );
        assert_eq!(err.position(), Some(SourcePosition::new(3, 10, 12)));
    }

    #[test]
    fn test_recoverability() {
        assert!(StyleError::function(SourcePosition::default(), "x").is_recoverable());
        assert!(!StyleError::InvalidFormat {
            message: "bad".to_string()
        }
        .is_recoverable());
    }

    #[test]
    fn test_for_property_relabels_conversion_errors() {
        let err = StyleError::conversion("", "number expected").for_property("width");
        match err {
            StyleError::Conversion { property, .. } => assert_eq!(property, "width"),
            other => panic!("Expected conversion error, got {:?}", other),
        }
    }
}

//! Error surface of the expression engine.
//!
//! Every failure is a structured error carrying a human-readable message.
//! No numeric codes are defined at this layer; mapping to client-facing
//! status codes belongs to the API layer.

use std::fmt;

use docstore_model::ValidationError;

/// Which caller-supplied dictionary a placeholder belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    /// A `#name` placeholder for an attribute name.
    Name,
    /// A `:value` placeholder for an attribute value.
    Value,
}

impl fmt::Display for PlaceholderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => write!(f, "attribute name"),
            Self::Value => write!(f, "attribute value"),
        }
    }
}

/// Errors produced while parsing, resolving, or evaluating expressions.
#[derive(Debug, thiserror::Error)]
pub enum ExpressionError {
    /// Malformed expression text. No partial tree is returned.
    #[error("syntax error: {message}")]
    Syntax {
        /// What was expected and what was found.
        message: String,
    },
    /// A `#name` or `:value` token with no matching dictionary entry.
    #[error("undefined {kind} placeholder: {name}")]
    UndefinedPlaceholder {
        /// Which dictionary was missing the entry.
        kind: PlaceholderKind,
        /// The placeholder token, prefix included.
        name: String,
    },
    /// A dictionary entry never referenced by any resolved expression.
    #[error("unused {kind} placeholder: {name}")]
    UnusedPlaceholder {
        /// Which dictionary holds the untouched entry.
        kind: PlaceholderKind,
        /// The dictionary key, prefix included.
        name: String,
    },
    /// Two update clauses act on the same or prefix-related paths.
    #[error("update clauses conflict: paths '{first}' and '{second}' overlap")]
    PathConflict {
        /// One of the offending paths.
        first: String,
        /// The other offending path.
        second: String,
    },
    /// A function or operator received an operand of the wrong type, or a
    /// function was used in an expression kind that does not allow it.
    #[error("type mismatch: {message}")]
    TypeMismatch {
        /// What went wrong.
        message: String,
    },
    /// A path reference resolved against an item lacking that attribute.
    #[error("attribute does not exist: {path}")]
    MissingAttribute {
        /// The path that failed to resolve.
        path: String,
    },
    /// A value violated the value model's structural invariants.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// An engine invariant was broken, e.g. an unresolved tree reached
    /// evaluation.
    #[error("internal error: {message}")]
    Internal {
        /// Which invariant was broken.
        message: String,
    },
}

impl ExpressionError {
    /// Build a syntax error.
    #[must_use]
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax {
            message: message.into(),
        }
    }

    /// Build a type-mismatch error.
    #[must_use]
    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::TypeMismatch {
            message: message.into(),
        }
    }
}

//! Typed attribute-value model for the docstore expression engine.
//!
//! An item is a mapping from attribute names to [`AttributeValue`]s, which may
//! nest maps and lists. This crate owns the value representation, its JSON
//! wire format (single-key tagged objects, numbers string-encoded to preserve
//! arbitrary precision), the structural validator for wire-form values, and
//! the exact decimal number helpers shared with the expression engine.
// The type-tag abbreviations (S, N, SS, ...) trip the doc-markdown lint.
#![allow(clippy::doc_markdown)]

pub mod attribute_value;
pub mod error;
pub mod number;
pub mod validate;

pub use attribute_value::{AttributeValue, Item};
pub use error::ValidationError;
pub use number::{check_range, format_number, parse_number};
pub use validate::validate_value;

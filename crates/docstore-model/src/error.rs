//! Structural validation errors for attribute values.

/// Error raised when a value violates the value model's structural
/// invariants, or when a number falls outside the model's precision range.
///
/// The `caller` field carries a label identifying where the offending value
/// came from (e.g. which API field supplied it); it is only used to enrich
/// the error message.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// The value is not a single-key object with a recognized type tag.
    #[error("{caller}: value has no recognized type")]
    NoType {
        /// Origin label for the offending value.
        caller: String,
    },
    /// More than one type tag is populated.
    #[error("{caller}: value must have exactly one type tag, found {count}")]
    MultipleTypes {
        /// Origin label for the offending value.
        caller: String,
        /// Number of keys found on the value object.
        count: usize,
    },
    /// The single key is not one of the known type tags.
    #[error("{caller}: unknown type tag '{tag}'")]
    UnknownType {
        /// Origin label for the offending value.
        caller: String,
        /// The unrecognized tag.
        tag: String,
    },
    /// The content under a type tag has the wrong JSON shape.
    #[error("{caller}: malformed {tag} value: {message}")]
    Malformed {
        /// Origin label for the offending value.
        caller: String,
        /// The type tag whose content is malformed.
        tag: &'static str,
        /// What was wrong with it.
        message: String,
    },
    /// A set variant with no elements.
    #[error("{caller}: empty {tag} set not allowed")]
    EmptySet {
        /// Origin label for the offending value.
        caller: String,
        /// The set type tag.
        tag: &'static str,
    },
    /// A set variant with two elements equal by value.
    #[error("{caller}: {tag} set contains duplicate element")]
    DuplicateSetElement {
        /// Origin label for the offending value.
        caller: String,
        /// The set type tag.
        tag: &'static str,
    },
    /// Text that does not parse as a decimal number.
    #[error("invalid number: {message}")]
    InvalidNumber {
        /// What was wrong with the number text.
        message: String,
    },
    /// A number outside the value model's precision or magnitude range.
    #[error("number overflow: {message}")]
    NumberOverflow {
        /// Which limit was exceeded.
        message: String,
    },
}

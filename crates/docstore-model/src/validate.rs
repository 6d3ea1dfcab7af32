//! Structural validation of wire-form attribute values.
//!
//! Validation runs on the raw JSON representation rather than on
//! [`crate::AttributeValue`], because the "zero or multiple type tags"
//! malformation is only representable before deserialization collapses the
//! value into the closed enum.

use base64::Engine;
use bigdecimal::BigDecimal;
use serde_json::Value as Json;

use crate::error::ValidationError;
use crate::number::parse_number;

/// Check a wire-form value against the value model's structural invariants.
///
/// `caller` labels where the value came from (e.g. the API field that
/// supplied it) and is included in every error message.
///
/// # Errors
///
/// Returns a [`ValidationError`] naming the violated invariant.
pub fn validate_value(value: &Json, caller: &str) -> Result<(), ValidationError> {
    let Some(object) = value.as_object() else {
        return Err(ValidationError::NoType {
            caller: caller.to_owned(),
        });
    };
    if object.len() > 1 {
        return Err(ValidationError::MultipleTypes {
            caller: caller.to_owned(),
            count: object.len(),
        });
    }
    let Some((tag, content)) = object.iter().next() else {
        return Err(ValidationError::NoType {
            caller: caller.to_owned(),
        });
    };

    match tag.as_str() {
        "S" => expect_string(content, caller, "S").map(|_| ()),
        "N" => {
            let text = expect_string(content, caller, "N")?;
            parse_number(text).map(|_| ())
        }
        "B" => {
            let text = expect_string(content, caller, "B")?;
            validate_base64(text, caller, "B")
        }
        "SS" => {
            let elements = expect_set(content, caller, "SS")?;
            let mut seen: Vec<&str> = Vec::with_capacity(elements.len());
            for element in elements {
                let text = expect_string(element, caller, "SS")?;
                if seen.contains(&text) {
                    return Err(ValidationError::DuplicateSetElement {
                        caller: caller.to_owned(),
                        tag: "SS",
                    });
                }
                seen.push(text);
            }
            Ok(())
        }
        "NS" => {
            let elements = expect_set(content, caller, "NS")?;
            let mut seen: Vec<BigDecimal> = Vec::with_capacity(elements.len());
            for element in elements {
                let parsed = parse_number(expect_string(element, caller, "NS")?)?;
                if seen.contains(&parsed) {
                    return Err(ValidationError::DuplicateSetElement {
                        caller: caller.to_owned(),
                        tag: "NS",
                    });
                }
                seen.push(parsed);
            }
            Ok(())
        }
        "BS" => {
            let elements = expect_set(content, caller, "BS")?;
            let mut seen: Vec<&str> = Vec::with_capacity(elements.len());
            for element in elements {
                let text = expect_string(element, caller, "BS")?;
                validate_base64(text, caller, "BS")?;
                if seen.contains(&text) {
                    return Err(ValidationError::DuplicateSetElement {
                        caller: caller.to_owned(),
                        tag: "BS",
                    });
                }
                seen.push(text);
            }
            Ok(())
        }
        "BOOL" => expect_bool(content, caller, "BOOL"),
        "NULL" => expect_bool(content, caller, "NULL"),
        "L" => {
            let Some(elements) = content.as_array() else {
                return Err(malformed(caller, "L", "expected an array"));
            };
            for element in elements {
                validate_value(element, caller)?;
            }
            Ok(())
        }
        "M" => {
            let Some(entries) = content.as_object() else {
                return Err(malformed(caller, "M", "expected an object"));
            };
            for entry in entries.values() {
                validate_value(entry, caller)?;
            }
            Ok(())
        }
        other => Err(ValidationError::UnknownType {
            caller: caller.to_owned(),
            tag: other.to_owned(),
        }),
    }
}

fn malformed(caller: &str, tag: &'static str, message: &str) -> ValidationError {
    ValidationError::Malformed {
        caller: caller.to_owned(),
        tag,
        message: message.to_owned(),
    }
}

fn expect_string<'a>(
    content: &'a Json,
    caller: &str,
    tag: &'static str,
) -> Result<&'a str, ValidationError> {
    content
        .as_str()
        .ok_or_else(|| malformed(caller, tag, "expected a string"))
}

fn expect_bool(content: &Json, caller: &str, tag: &'static str) -> Result<(), ValidationError> {
    content
        .as_bool()
        .map(|_| ())
        .ok_or_else(|| malformed(caller, tag, "expected a boolean"))
}

fn expect_set<'a>(
    content: &'a Json,
    caller: &str,
    tag: &'static str,
) -> Result<&'a [Json], ValidationError> {
    let Some(elements) = content.as_array() else {
        return Err(malformed(caller, tag, "expected an array"));
    };
    if elements.is_empty() {
        return Err(ValidationError::EmptySet {
            caller: caller.to_owned(),
            tag,
        });
    }
    Ok(elements)
}

fn validate_base64(text: &str, caller: &str, tag: &'static str) -> Result<(), ValidationError> {
    base64::engine::general_purpose::STANDARD
        .decode(text)
        .map(|_| ())
        .map_err(|_| malformed(caller, tag, "expected base64-encoded content"))
}

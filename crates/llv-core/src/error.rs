//! Validation errors for store mutations.
//!
//! These are values, not panics: every variant names the field or entity
//! involved so the caller can surface a self-correctable message.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A required string argument was missing or blank.
    EmptyField { field: &'static str },
    /// An entity of this name already exists in the same category.
    Duplicate { category: &'static str, name: String },
    /// A referenced entity does not exist in the expected category.
    NotFound { category: &'static str, name: String },
    /// A composition had no component with a string element and numeric weight.
    NoValidComponents { name: String },
    /// A synchronize call resolved zero of its element names.
    NothingToSynchronize,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::EmptyField { field } => {
                write!(f, "required field \"{field}\" is missing or empty")
            }
            EngineError::Duplicate { category, name } => {
                write!(f, "{category} \"{name}\" already exists")
            }
            EngineError::NotFound { category, name } => {
                write!(f, "{category} \"{name}\" not found")
            }
            EngineError::NoValidComponents { name } => {
                write!(
                    f,
                    "rhythm \"{name}\" has no valid components (each needs an element name and a numeric weight)"
                )
            }
            EngineError::NothingToSynchronize => {
                write!(f, "no elements resolved to a known line, loop, or vibe")
            }
        }
    }
}

impl std::error::Error for EngineError {}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_context() {
        let e = EngineError::Duplicate {
            category: "line",
            name: "x".to_string(),
        };
        assert_eq!(e.to_string(), "line \"x\" already exists");

        let e = EngineError::NotFound {
            category: "vibe",
            name: "calm-one".to_string(),
        };
        assert!(e.to_string().contains("calm-one"));
    }
}

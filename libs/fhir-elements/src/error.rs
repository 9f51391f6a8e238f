//! Error types for element construction

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Missing required field: {type_name}.{field}")]
    RequiredFieldMissing {
        type_name: &'static str,
        field: &'static str,
    },

    #[error(
        "Invalid type for choice field {type_name}.{field}: {actual} (expected one of: {})",
        .permitted.join(", ")
    )]
    ChoiceTypeViolation {
        type_name: &'static str,
        field: &'static str,
        actual: &'static str,
        permitted: Vec<&'static str>,
    },

    #[error("Field {type_name}.{field} must contain at least one element")]
    NonEmptyConstraintViolation {
        type_name: &'static str,
        field: &'static str,
    },

    #[error("Invalid value for {type_name}.{field}: {value:?} ({reason})")]
    InvalidPrimitiveValue {
        type_name: &'static str,
        field: String,
        value: String,
        reason: &'static str,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Name of the field the error refers to, if it is a construction error
    pub fn field(&self) -> Option<&str> {
        match self {
            Error::RequiredFieldMissing { field, .. }
            | Error::ChoiceTypeViolation { field, .. }
            | Error::NonEmptyConstraintViolation { field, .. } => Some(*field),
            Error::InvalidPrimitiveValue { field, .. } => Some(field.as_str()),
            Error::Config(_) | Error::Serialization(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choice_violation_lists_alternatives() {
        let err = Error::ChoiceTypeViolation {
            type_name: "Observation",
            field: "value",
            actual: "Coding",
            permitted: vec!["Quantity", "string"],
        };

        assert_eq!(
            err.to_string(),
            "Invalid type for choice field Observation.value: Coding (expected one of: Quantity, string)"
        );
        assert_eq!(err.field(), Some("value"));
    }
}

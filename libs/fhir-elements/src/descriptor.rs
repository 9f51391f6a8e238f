//! Per-type field descriptor tables
//!
//! Every element and resource type lists its fields, in declaration order, as a
//! static table of [`FieldDescriptor`]s. The traversal engine, the choice
//! resolver and the required-field checks all read from these tables, so a
//! new type only has to declare its table.

use crate::choice::{DataType, DataValue};
use crate::error::{Error, Result};

/// Cardinality of a field (min..max)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cardinality {
    /// Minimum occurrences
    pub min: u32,
    /// Maximum occurrences (None means unbounded/*)
    pub max: Option<u32>,
}

impl Cardinality {
    pub const OPTIONAL: Cardinality = Cardinality::new(0, Some(1));
    pub const REQUIRED: Cardinality = Cardinality::new(1, Some(1));
    pub const REPEATED: Cardinality = Cardinality::new(0, None);
    pub const AT_LEAST_ONE: Cardinality = Cardinality::new(1, None);

    pub const fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    /// Check if this field is a list
    pub fn is_array(&self) -> bool {
        self.max.map(|m| m > 1).unwrap_or(true)
    }

    pub fn is_optional(&self) -> bool {
        self.min == 0
    }

    pub fn is_required(&self) -> bool {
        self.min > 0
    }
}

impl std::fmt::Display for Cardinality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.max {
            Some(max) => write!(f, "{}..{}", self.min, max),
            None => write!(f, "{}..*", self.min),
        }
    }
}

/// What a field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// A raw leaf value (element ids, the `value` of a primitive)
    Value(&'static str),
    /// An element of the named type
    Element(&'static str),
    /// One of several data types
    Choice(&'static [DataType]),
    /// An inline resource of any type
    Resource,
}

/// Declared shape of a single field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub cardinality: Cardinality,
    pub field_type: FieldType,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str, cardinality: Cardinality, field_type: FieldType) -> Self {
        Self {
            name,
            cardinality,
            field_type,
        }
    }

    pub const fn value(name: &'static str, type_name: &'static str) -> Self {
        Self::new(name, Cardinality::OPTIONAL, FieldType::Value(type_name))
    }

    pub const fn optional(name: &'static str, type_name: &'static str) -> Self {
        Self::new(name, Cardinality::OPTIONAL, FieldType::Element(type_name))
    }

    pub const fn required(name: &'static str, type_name: &'static str) -> Self {
        Self::new(name, Cardinality::REQUIRED, FieldType::Element(type_name))
    }

    pub const fn repeated(name: &'static str, type_name: &'static str) -> Self {
        Self::new(name, Cardinality::REPEATED, FieldType::Element(type_name))
    }

    pub const fn at_least_one(name: &'static str, type_name: &'static str) -> Self {
        Self::new(name, Cardinality::AT_LEAST_ONE, FieldType::Element(type_name))
    }

    pub const fn choice(
        name: &'static str,
        cardinality: Cardinality,
        permitted: &'static [DataType],
    ) -> Self {
        Self::new(name, cardinality, FieldType::Choice(permitted))
    }

    pub const fn resource(name: &'static str, cardinality: Cardinality) -> Self {
        Self::new(name, cardinality, FieldType::Resource)
    }

    pub fn is_choice(&self) -> bool {
        matches!(self.field_type, FieldType::Choice(_))
    }

    /// Permitted alternatives for a choice field (empty for other fields)
    pub fn permitted_types(&self) -> &'static [DataType] {
        match self.field_type {
            FieldType::Choice(permitted) => permitted,
            _ => &[],
        }
    }

    /// Fail with `RequiredFieldMissing` if a required value is absent.
    pub fn require<T>(&self, type_name: &'static str, value: Option<T>) -> Result<T> {
        value.ok_or_else(|| {
            tracing::debug!(type_name, field = self.name, "required field missing");
            Error::RequiredFieldMissing {
                type_name,
                field: self.name,
            }
        })
    }

    /// Fail with `NonEmptyConstraintViolation` if a 1..* field is empty.
    pub fn require_non_empty<T>(&self, type_name: &'static str, values: Vec<T>) -> Result<Vec<T>> {
        if values.is_empty() {
            tracing::debug!(type_name, field = self.name, "repeated field is empty");
            return Err(Error::NonEmptyConstraintViolation {
                type_name,
                field: self.name,
            });
        }
        Ok(values)
    }

    /// Check an optional choice value against the permitted alternatives.
    ///
    /// The value is returned unchanged; no coercion between alternatives is
    /// attempted.
    pub fn resolve_choice(
        &self,
        type_name: &'static str,
        value: Option<DataValue>,
    ) -> Result<Option<DataValue>> {
        value
            .map(|value| self.check_choice(type_name, value))
            .transpose()
    }

    /// Required variant of [`resolve_choice`](Self::resolve_choice).
    pub fn resolve_required_choice(
        &self,
        type_name: &'static str,
        value: Option<DataValue>,
    ) -> Result<DataValue> {
        let value = self.require(type_name, value)?;
        self.check_choice(type_name, value)
    }

    fn check_choice(&self, type_name: &'static str, value: DataValue) -> Result<DataValue> {
        let permitted = self.permitted_types();
        let actual = value.data_type();
        if permitted.contains(&actual) {
            return Ok(value);
        }

        tracing::debug!(
            type_name,
            field = self.name,
            actual = actual.name(),
            "choice value has a type outside the permitted set"
        );
        Err(Error::ChoiceTypeViolation {
            type_name,
            field: self.name,
            actual: actual.name(),
            permitted: permitted.iter().map(DataType::name).collect(),
        })
    }
}

/// Fields shared by every element: `id` then `extension`
pub const ID: FieldDescriptor = FieldDescriptor::value("id", "string");
pub const EXTENSION: FieldDescriptor = FieldDescriptor::repeated("extension", "Extension");
pub const MODIFIER_EXTENSION: FieldDescriptor =
    FieldDescriptor::repeated("modifierExtension", "Extension");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::{Boolean, FhirString};

    const VALUE: FieldDescriptor = FieldDescriptor::choice(
        "value",
        Cardinality::OPTIONAL,
        &[DataType::Boolean, DataType::String],
    );

    #[test]
    fn cardinality_display() {
        assert_eq!(Cardinality::OPTIONAL.to_string(), "0..1");
        assert_eq!(Cardinality::AT_LEAST_ONE.to_string(), "1..*");
        assert!(Cardinality::REPEATED.is_array());
        assert!(!Cardinality::REQUIRED.is_array());
        assert!(Cardinality::REQUIRED.is_required());
    }

    #[test]
    fn resolve_choice_accepts_permitted_type() {
        let value = DataValue::from(Boolean::from(true));
        let resolved = VALUE.resolve_choice("Test", Some(value.clone())).unwrap();
        assert_eq!(resolved, Some(value));
        assert_eq!(VALUE.resolve_choice("Test", None).unwrap(), None);
    }

    #[test]
    fn resolve_choice_rejects_other_types() {
        let value = DataValue::from(crate::primitive::Integer::from(3));
        let err = VALUE.resolve_choice("Test", Some(value)).unwrap_err();

        match err {
            Error::ChoiceTypeViolation {
                field,
                actual,
                permitted,
                ..
            } => {
                assert_eq!(field, "value");
                assert_eq!(actual, "integer");
                assert_eq!(permitted, vec!["boolean", "string"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn required_choice_must_be_present() {
        let err = VALUE.resolve_required_choice("Test", None).unwrap_err();
        assert!(matches!(
            err,
            Error::RequiredFieldMissing { field: "value", .. }
        ));

        let value = DataValue::from(FhirString::from("text"));
        assert_eq!(
            VALUE.resolve_required_choice("Test", Some(value.clone())).unwrap(),
            value
        );
    }

    #[test]
    fn non_empty_check() {
        let field = FieldDescriptor::at_least_one("author", "Reference");
        assert!(field.require_non_empty::<u8>("Composition", vec![]).is_err());
        assert_eq!(field.require_non_empty("Composition", vec![1]).unwrap(), vec![1]);
    }
}

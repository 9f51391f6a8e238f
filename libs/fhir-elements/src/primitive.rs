//! Primitive data types
//!
//! Primitives are elements too: besides their value they can carry an `id`
//! and extensions, and either may be present without a value. All primitive
//! types share one generic representation, [`Primitive<K>`], where the kind
//! marker `K` fixes the standard's type name, the Rust value type and the
//! lexical rules.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::OnceLock;

use regex::Regex;

use crate::constraint::{Constrained, Constraint};
use crate::descriptor::{FieldDescriptor, EXTENSION, ID};
use crate::element::{Element, ElementBuilder, ElementFields, HasExtensions, HasId};
use crate::error::Result;
use crate::extension::Extension;
use crate::hash::{hash_of, HashCache};
use crate::visitor::{check_primitives, RawValue, Visitable, Walker};

/// Describes one primitive type
pub trait PrimitiveKind:
    fmt::Debug + Clone + Copy + Default + PartialEq + Eq + Hash + Send + Sync + 'static
{
    type Value: fmt::Debug + Clone + PartialEq + Eq + Hash + Send + Sync + 'static;

    /// Type name as defined by the standard
    const TYPE_NAME: &'static str;

    fn raw(value: &Self::Value) -> RawValue<'_>;

    /// Check the lexical form of a value
    fn check(_value: &Self::Value) -> std::result::Result<(), &'static str> {
        Ok(())
    }
}

/// A primitive value with optional id and extensions
///
/// Values made with [`Primitive::new`] or a `From` conversion skip the lexical
/// check until the element that holds them is built, so `FhirString::from("")`
/// exists on its own but fails inside a parent's `build()`. Use
/// `builder().value(..).build()` for a standalone value that is checked
/// immediately.
#[derive(Clone, PartialEq, Eq)]
pub struct Primitive<K: PrimitiveKind> {
    element: ElementFields,
    value: Option<K::Value>,
    hash: HashCache,
    _kind: PhantomData<K>,
}

impl<K: PrimitiveKind> Primitive<K> {
    const FIELDS: &'static [FieldDescriptor] =
        &[ID, EXTENSION, FieldDescriptor::value("value", K::TYPE_NAME)];

    /// A primitive holding just a value.
    ///
    /// The value's lexical form is checked when the element holding it is
    /// built.
    pub fn new(value: impl Into<K::Value>) -> Self {
        Self {
            element: ElementFields::default(),
            value: Some(value.into()),
            hash: HashCache::new(),
            _kind: PhantomData,
        }
    }

    pub fn builder() -> PrimitiveBuilder<K> {
        PrimitiveBuilder::default()
    }

    pub fn to_builder(&self) -> PrimitiveBuilder<K> {
        PrimitiveBuilder {
            element: self.element.clone(),
            value: self.value.clone(),
        }
    }

    pub fn value(&self) -> Option<&K::Value> {
        self.value.as_ref()
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    pub fn hash_code(&self) -> u64 {
        self.hash
            .get_or_compute(|| hash_of(&(&self.element, &self.value)))
    }
}

impl<K: PrimitiveKind> Hash for Primitive<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl<K: PrimitiveKind> fmt::Debug for Primitive<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(K::TYPE_NAME);
        if let Some(id) = &self.element.id {
            s.field("id", id);
        }
        if !self.element.extension.is_empty() {
            s.field("extension", &self.element.extension);
        }
        s.field("value", &self.value).finish()
    }
}

impl<K: PrimitiveKind> HasId for Primitive<K> {
    fn id(&self) -> Option<&str> {
        self.element.id()
    }
}

impl<K: PrimitiveKind> HasExtensions for Primitive<K> {
    fn extension(&self) -> &[Extension] {
        &self.element.extension
    }
}

impl<K: PrimitiveKind> Element for Primitive<K> {
    fn has_children(&self) -> bool {
        self.value.is_some()
    }
}

impl<K: PrimitiveKind> Constrained for Primitive<K> {
    const TYPE_NAME: &'static str = K::TYPE_NAME;
    const BASE: Option<&'static str> = Some("Element");
    const CONSTRAINTS: &'static [Constraint] = &[];
}

impl<K: PrimitiveKind> Visitable for Primitive<K> {
    fn type_name(&self) -> &'static str {
        K::TYPE_NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn fields(&self) -> &'static [FieldDescriptor] {
        Self::FIELDS
    }

    fn walk<'a>(&'a self, walker: &mut Walker<'a, '_>) {
        self.element.walk(walker);
        walker.value(&Self::FIELDS[2], self.value.as_ref().map(K::raw));
    }

    fn primitive_value(&self) -> Option<RawValue<'_>> {
        self.value.as_ref().map(K::raw)
    }

    fn check_value(&self) -> std::result::Result<(), &'static str> {
        match &self.value {
            Some(value) => K::check(value),
            None => Ok(()),
        }
    }
}

/// Builder for any primitive type
#[derive(Debug, Clone)]
pub struct PrimitiveBuilder<K: PrimitiveKind> {
    element: ElementFields,
    value: Option<K::Value>,
}

impl<K: PrimitiveKind> Default for PrimitiveBuilder<K> {
    fn default() -> Self {
        Self {
            element: ElementFields::default(),
            value: None,
        }
    }
}

impl<K: PrimitiveKind> PrimitiveBuilder<K> {
    pub fn value(mut self, value: impl Into<K::Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn build(self) -> Result<Primitive<K>> {
        let primitive = Primitive {
            element: self.element,
            value: self.value,
            hash: HashCache::new(),
            _kind: PhantomData,
        };
        check_primitives(&primitive, K::TYPE_NAME)?;
        Ok(primitive)
    }
}

impl<K: PrimitiveKind> ElementBuilder for PrimitiveBuilder<K> {
    fn element_fields(&mut self) -> &mut ElementFields {
        &mut self.element
    }
}

fn matches(cell: &'static OnceLock<Regex>, pattern: &str, value: &str) -> bool {
    cell.get_or_init(|| Regex::new(pattern).expect("primitive pattern must compile"))
        .is_match(value)
}

/// Primitive kind markers
pub mod kind {
    use super::*;
    use rust_decimal::Decimal as DecimalValue;

    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct Boolean;

    impl PrimitiveKind for Boolean {
        type Value = bool;
        const TYPE_NAME: &'static str = "boolean";

        fn raw(value: &bool) -> RawValue<'_> {
            RawValue::Boolean(*value)
        }
    }

    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct Integer;

    impl PrimitiveKind for Integer {
        type Value = i32;
        const TYPE_NAME: &'static str = "integer";

        fn raw(value: &i32) -> RawValue<'_> {
            RawValue::Integer(*value)
        }
    }

    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct UnsignedInt;

    impl PrimitiveKind for UnsignedInt {
        type Value = u32;
        const TYPE_NAME: &'static str = "unsignedInt";

        fn raw(value: &u32) -> RawValue<'_> {
            RawValue::UnsignedInt(*value)
        }

        fn check(value: &u32) -> std::result::Result<(), &'static str> {
            if *value > i32::MAX as u32 {
                return Err("unsignedInt must not exceed 2147483647");
            }
            Ok(())
        }
    }

    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct Decimal;

    impl PrimitiveKind for Decimal {
        type Value = DecimalValue;
        const TYPE_NAME: &'static str = "decimal";

        fn raw(value: &DecimalValue) -> RawValue<'_> {
            RawValue::Decimal(value)
        }
    }

    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct String;

    impl PrimitiveKind for String {
        type Value = std::string::String;
        const TYPE_NAME: &'static str = "string";

        fn raw(value: &std::string::String) -> RawValue<'_> {
            RawValue::String(value)
        }

        fn check(value: &std::string::String) -> std::result::Result<(), &'static str> {
            if value.is_empty() {
                return Err("string must not be empty");
            }
            Ok(())
        }
    }

    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct Markdown;

    impl PrimitiveKind for Markdown {
        type Value = std::string::String;
        const TYPE_NAME: &'static str = "markdown";

        fn raw(value: &std::string::String) -> RawValue<'_> {
            RawValue::String(value)
        }

        fn check(value: &std::string::String) -> std::result::Result<(), &'static str> {
            if value.trim().is_empty() {
                return Err("markdown must contain non-whitespace content");
            }
            Ok(())
        }
    }

    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct Uri;

    impl PrimitiveKind for Uri {
        type Value = std::string::String;
        const TYPE_NAME: &'static str = "uri";

        fn raw(value: &std::string::String) -> RawValue<'_> {
            RawValue::String(value)
        }

        fn check(value: &std::string::String) -> std::result::Result<(), &'static str> {
            if value.chars().any(char::is_whitespace) {
                return Err("uri must not contain whitespace");
            }
            Ok(())
        }
    }

    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct Code;

    impl PrimitiveKind for Code {
        type Value = std::string::String;
        const TYPE_NAME: &'static str = "code";

        fn raw(value: &std::string::String) -> RawValue<'_> {
            RawValue::String(value)
        }

        fn check(value: &std::string::String) -> std::result::Result<(), &'static str> {
            static PATTERN: OnceLock<Regex> = OnceLock::new();
            if !matches(&PATTERN, r"^[^\s]+( [^\s]+)*$", value) {
                return Err("code must not have leading, trailing or repeated whitespace");
            }
            Ok(())
        }
    }

    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct Id;

    impl PrimitiveKind for Id {
        type Value = std::string::String;
        const TYPE_NAME: &'static str = "id";

        fn raw(value: &std::string::String) -> RawValue<'_> {
            RawValue::String(value)
        }

        fn check(value: &std::string::String) -> std::result::Result<(), &'static str> {
            static PATTERN: OnceLock<Regex> = OnceLock::new();
            if !matches(&PATTERN, r"^[A-Za-z0-9\-\.]{1,64}$", value) {
                return Err("id must be 1-64 characters of [A-Za-z0-9-.]");
            }
            Ok(())
        }
    }

    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct Date;

    impl PrimitiveKind for Date {
        type Value = std::string::String;
        const TYPE_NAME: &'static str = "date";

        fn raw(value: &std::string::String) -> RawValue<'_> {
            RawValue::String(value)
        }

        fn check(value: &std::string::String) -> std::result::Result<(), &'static str> {
            static PATTERN: OnceLock<Regex> = OnceLock::new();
            let pattern = r"^([0-9]([0-9]([0-9][1-9]|[1-9]0)|[1-9]00)|[1-9]000)(-(0[1-9]|1[0-2])(-(0[1-9]|[1-2][0-9]|3[0-1]))?)?$";
            if !matches(&PATTERN, pattern, value) {
                return Err("date must be YYYY, YYYY-MM or YYYY-MM-DD");
            }
            Ok(())
        }
    }

    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct DateTime;

    impl PrimitiveKind for DateTime {
        type Value = std::string::String;
        const TYPE_NAME: &'static str = "dateTime";

        fn raw(value: &std::string::String) -> RawValue<'_> {
            RawValue::String(value)
        }

        fn check(value: &std::string::String) -> std::result::Result<(), &'static str> {
            static PATTERN: OnceLock<Regex> = OnceLock::new();
            let pattern = r"^([0-9]([0-9]([0-9][1-9]|[1-9]0)|[1-9]00)|[1-9]000)(-(0[1-9]|1[0-2])(-(0[1-9]|[1-2][0-9]|3[0-1])(T([01][0-9]|2[0-3]):[0-5][0-9]:([0-5][0-9]|60)(\.[0-9]+)?(Z|(\+|-)((0[0-9]|1[0-3]):[0-5][0-9]|14:00)))?)?)?$";
            if !matches(&PATTERN, pattern, value) {
                return Err("dateTime must be a partial or full date, with a zoned time if a time is given");
            }
            Ok(())
        }
    }

    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct Instant;

    impl PrimitiveKind for Instant {
        type Value = std::string::String;
        const TYPE_NAME: &'static str = "instant";

        fn raw(value: &std::string::String) -> RawValue<'_> {
            RawValue::String(value)
        }

        fn check(value: &std::string::String) -> std::result::Result<(), &'static str> {
            static PATTERN: OnceLock<Regex> = OnceLock::new();
            let pattern = r"^([0-9]([0-9]([0-9][1-9]|[1-9]0)|[1-9]00)|[1-9]000)-(0[1-9]|1[0-2])-(0[1-9]|[1-2][0-9]|3[0-1])T([01][0-9]|2[0-3]):[0-5][0-9]:([0-5][0-9]|60)(\.[0-9]+)?(Z|(\+|-)((0[0-9]|1[0-3]):[0-5][0-9]|14:00))$";
            if !matches(&PATTERN, pattern, value) {
                return Err("instant must be a full date and time with a time zone");
            }
            Ok(())
        }
    }

    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct Xhtml;

    impl PrimitiveKind for Xhtml {
        type Value = std::string::String;
        const TYPE_NAME: &'static str = "xhtml";

        fn raw(value: &std::string::String) -> RawValue<'_> {
            RawValue::String(value)
        }

        fn check(value: &std::string::String) -> std::result::Result<(), &'static str> {
            if !value.trim_start().starts_with("<div") {
                return Err("xhtml must be a single <div> element");
            }
            Ok(())
        }
    }
}

pub type Boolean = Primitive<kind::Boolean>;
pub type Integer = Primitive<kind::Integer>;
pub type UnsignedInt = Primitive<kind::UnsignedInt>;
pub type Decimal = Primitive<kind::Decimal>;
pub type FhirString = Primitive<kind::String>;
pub type Markdown = Primitive<kind::Markdown>;
pub type Uri = Primitive<kind::Uri>;
pub type Code = Primitive<kind::Code>;
pub type Id = Primitive<kind::Id>;
pub type Date = Primitive<kind::Date>;
pub type DateTime = Primitive<kind::DateTime>;
pub type Instant = Primitive<kind::Instant>;
pub type Xhtml = Primitive<kind::Xhtml>;

impl From<bool> for Boolean {
    fn from(value: bool) -> Self {
        Self::new(value)
    }
}

impl From<i32> for Integer {
    fn from(value: i32) -> Self {
        Self::new(value)
    }
}

impl From<u32> for UnsignedInt {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl From<rust_decimal::Decimal> for Decimal {
    fn from(value: rust_decimal::Decimal) -> Self {
        Self::new(value)
    }
}

macro_rules! string_primitive_from {
    ($($alias:ty),* $(,)?) => {
        $(
            impl From<&str> for $alias {
                fn from(value: &str) -> Self {
                    Self::new(value.to_string())
                }
            }

            impl From<String> for $alias {
                fn from(value: String) -> Self {
                    Self::new(value)
                }
            }

            impl $alias {
                pub fn as_str(&self) -> Option<&str> {
                    self.value.as_deref()
                }
            }
        )*
    };
}

string_primitive_from!(FhirString, Markdown, Uri, Code, Id, Date, DateTime, Instant, Xhtml);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn primitive_with_only_extension_is_present() {
        let flagged = Boolean::builder()
            .extension([Extension::builder("http://example.org/data-absent")
                .value(Code::from("unknown"))
                .build()
                .unwrap()])
            .build()
            .unwrap();

        assert!(!flagged.has_value());
        assert!(!flagged.is_absent());
        assert!(Boolean::builder().build().unwrap().is_absent());
    }

    #[test]
    fn code_whitespace_rules() {
        assert!(Code::builder().value("final").build().is_ok());
        assert!(Code::builder().value("two words").build().is_ok());

        let err = Code::builder().value(" final").build().unwrap_err();
        assert!(matches!(err, Error::InvalidPrimitiveValue { type_name: "code", .. }));
        assert!(Code::builder().value("a  b").build().is_err());
    }

    #[test]
    fn date_time_patterns() {
        assert!(Date::builder().value("2024").build().is_ok());
        assert!(Date::builder().value("2024-02-30").build().is_ok());
        assert!(Date::builder().value("2024-13").build().is_err());

        assert!(DateTime::builder().value("2024-05-01").build().is_ok());
        assert!(DateTime::builder().value("2024-05-01T10:00:00Z").build().is_ok());
        assert!(DateTime::builder().value("2024-05-01T10:00:00").build().is_err());

        assert!(Instant::builder().value("2024-05-01T10:00:00.123+02:00").build().is_ok());
        assert!(Instant::builder().value("2024-05-01").build().is_err());
    }

    #[test]
    fn id_and_string_rules() {
        assert!(Id::builder().value("abc-123.x").build().is_ok());
        assert!(Id::builder().value("has space").build().is_err());
        assert!(Id::builder().value("a".repeat(65)).build().is_err());
        assert!(FhirString::builder().value("").build().is_err());
        assert!(Uri::builder().value("http://a b").build().is_err());
    }

    #[test]
    fn equality_and_hash_are_structural() {
        let a = FhirString::from("x");
        let b = FhirString::builder().value("x").build().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.hash_code(), b.hash_code());
        assert_ne!(a, FhirString::from("y"));
        assert_eq!(a.as_str(), Some("x"));
    }

    #[test]
    fn conversions_are_checked_by_the_owner() {
        let loose = FhirString::from("");
        assert_eq!(loose.check_value(), Err("string must not be empty"));
        assert!(FhirString::builder().value("").build().is_err());

        let err = crate::datatypes::Coding::builder()
            .display(loose)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidPrimitiveValue { type_name: "Coding", .. }
        ));
        assert_eq!(err.field(), Some("display"));
    }

    #[test]
    fn to_builder_round_trip() {
        let original = Integer::builder().id("n").value(5).build().unwrap();
        let copy = original.to_builder().build().unwrap();
        assert_eq!(original, copy);
        assert_eq!(copy.value(), Some(&5));
    }
}

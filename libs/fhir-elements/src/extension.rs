//! Extension
//!
//! Every element can carry extensions: a URL naming the definition plus either
//! a value or nested extensions. Any data type of [`DataValue`] may be used as
//! the value.

use std::any::Any;
use std::hash::{Hash, Hasher};

use crate::choice::{DataType, DataValue};
use crate::constraint::{Constrained, Constraint, BASE_LOCATION};
use crate::descriptor::{Cardinality, FieldDescriptor, FieldType, EXTENSION, ID};
use crate::element::{Element, ElementBuilder, ElementFields, HasExtensions, HasId};
use crate::error::{Error, Result};
use crate::hash::{hash_of, HashCache};
use crate::primitive::{kind, PrimitiveKind};
use crate::visitor::{check_primitives, RawValue, Visitable, Walker};

const FIELDS: &[FieldDescriptor] = &[
    ID,
    EXTENSION,
    FieldDescriptor::new("url", Cardinality::REQUIRED, FieldType::Value("uri")),
    FieldDescriptor::choice("value", Cardinality::OPTIONAL, DataType::ALL),
];

const CONSTRAINTS: &[Constraint] = &[Constraint::rule(
    "ext-1",
    BASE_LOCATION,
    "Must have either extensions or value[x], not both",
    "extension.exists() != value.exists()",
)
.with_source("http://hl7.org/fhir/StructureDefinition/Extension")];

/// Optional extension element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    element: ElementFields,
    url: String,
    value: Option<DataValue>,
    hash: HashCache,
}

impl Extension {
    pub fn builder(url: impl Into<String>) -> ExtensionBuilder {
        ExtensionBuilder {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn to_builder(&self) -> ExtensionBuilder {
        ExtensionBuilder {
            element: self.element.clone(),
            url: Some(self.url.clone()),
            value: self.value.clone(),
        }
    }

    /// Identifies the meaning of the extension
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn value(&self) -> Option<&DataValue> {
        self.value.as_ref()
    }

    pub fn hash_code(&self) -> u64 {
        self.hash
            .get_or_compute(|| hash_of(&(&self.element, &self.url, &self.value)))
    }
}

impl Hash for Extension {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl HasId for Extension {
    fn id(&self) -> Option<&str> {
        self.element.id()
    }
}

impl HasExtensions for Extension {
    fn extension(&self) -> &[Extension] {
        &self.element.extension
    }
}

impl Element for Extension {
    fn has_children(&self) -> bool {
        true
    }
}

impl Constrained for Extension {
    const TYPE_NAME: &'static str = "Extension";
    const BASE: Option<&'static str> = Some("Element");
    const CONSTRAINTS: &'static [Constraint] = CONSTRAINTS;
}

impl Visitable for Extension {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn fields(&self) -> &'static [FieldDescriptor] {
        FIELDS
    }

    fn walk<'a>(&'a self, walker: &mut Walker<'a, '_>) {
        self.element.walk(walker);
        walker.value(&FIELDS[2], Some(RawValue::String(&self.url)));
        walker.choice(&FIELDS[3], self.value.as_ref());
    }

    fn constraints(&self) -> &'static [Constraint] {
        CONSTRAINTS
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExtensionBuilder {
    element: ElementFields,
    url: Option<String>,
    value: Option<DataValue>,
}

impl ExtensionBuilder {
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn value(mut self, value: impl Into<DataValue>) -> Self {
        let value = value.into();
        self.value = (!value.is_absent()).then_some(value);
        self
    }

    pub fn build(self) -> Result<Extension> {
        let url = FIELDS[2].require(Extension::TYPE_NAME, self.url)?;
        if let Err(reason) = kind::Uri::check(&url) {
            tracing::debug!(type_name = Extension::TYPE_NAME, url = %url, reason, "invalid extension url");
            return Err(Error::InvalidPrimitiveValue {
                type_name: Extension::TYPE_NAME,
                field: "url".to_string(),
                value: url,
                reason,
            });
        }

        let extension = Extension {
            element: self.element,
            url,
            value: FIELDS[3].resolve_choice(Extension::TYPE_NAME, self.value)?,
            hash: HashCache::new(),
        };
        check_primitives(&extension, Extension::TYPE_NAME)?;
        Ok(extension)
    }
}

impl ElementBuilder for ExtensionBuilder {
    fn element_fields(&mut self) -> &mut ElementFields {
        &mut self.element
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::Coding;
    use crate::primitive::{Code, Date, FhirString};

    #[test]
    fn url_is_required() {
        let err = ExtensionBuilder::default().build().unwrap_err();
        assert!(matches!(
            err,
            Error::RequiredFieldMissing {
                type_name: "Extension",
                field: "url"
            }
        ));
    }

    #[test]
    fn url_must_not_contain_whitespace() {
        let err = Extension::builder("http://example.org/my ext")
            .build()
            .unwrap_err();
        assert_eq!(err.field(), Some("url"));
    }

    #[test]
    fn accepts_complex_values() {
        let extension = Extension::builder("http://example.org/coded")
            .value(Coding::builder().code(Code::from("x")).build().unwrap())
            .build()
            .unwrap();

        assert_eq!(
            extension.value().map(DataValue::data_type),
            Some(DataType::Coding)
        );
    }

    #[test]
    fn invalid_primitive_value_is_rejected() {
        let err = Extension::builder("http://example.org/birth")
            .value(Date::from("2024-13-01"))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPrimitiveValue { type_name: "Extension", .. }));
        assert_eq!(err.field(), Some("value"));
    }

    #[test]
    fn nested_extensions() {
        let inner = Extension::builder("lat")
            .value(FhirString::from("52.1"))
            .build()
            .unwrap();
        let outer = Extension::builder("http://example.org/geo")
            .extension([inner.clone()])
            .build()
            .unwrap();

        assert_eq!(outer.extension(), &[inner]);
        assert!(outer.value().is_none());
        assert_eq!(outer.to_builder().build().unwrap(), outer);
    }

    #[test]
    fn absent_value_is_dropped() {
        let extension = Extension::builder("http://example.org/e")
            .value(Coding::builder().build().unwrap())
            .build()
            .unwrap();
        assert!(extension.value().is_none());
    }
}

use std::any::Any;
use std::hash::{Hash, Hasher};

use crate::choice::{DataType, DataValue};
use crate::constraint::{Constrained, Constraint};
use crate::datatypes::Coding;
use crate::descriptor::{Cardinality, FieldDescriptor, EXTENSION, ID};
use crate::element::{present, Element, ElementBuilder, ElementFields, HasExtensions, HasId};
use crate::error::Result;
use crate::extension::Extension;
use crate::hash::{hash_of, HashCache};
use crate::visitor::{check_primitives, Visitable, Walker};

/// Types allowed for `UsageContext.value[x]`
pub const USAGE_CONTEXT_VALUE: &[DataType] =
    &[DataType::CodeableConcept, DataType::Quantity, DataType::Reference];

const FIELDS: &[FieldDescriptor] = &[
    ID,
    EXTENSION,
    FieldDescriptor::required("code", "Coding"),
    FieldDescriptor::choice("value", Cardinality::REQUIRED, USAGE_CONTEXT_VALUE),
];

/// Describes the clinical or administrative context a resource is meant for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageContext {
    element: ElementFields,
    code: Coding,
    value: DataValue,
    hash: HashCache,
}

impl UsageContext {
    pub fn builder(code: Coding, value: impl Into<DataValue>) -> UsageContextBuilder {
        UsageContextBuilder::default().code(code).value(value)
    }

    pub fn to_builder(&self) -> UsageContextBuilder {
        UsageContextBuilder {
            element: self.element.clone(),
            code: Some(self.code.clone()),
            value: Some(self.value.clone()),
        }
    }

    /// Type of context being specified
    pub fn code(&self) -> &Coding {
        &self.code
    }

    /// Value that defines the context, one of [`USAGE_CONTEXT_VALUE`]
    pub fn value(&self) -> &DataValue {
        &self.value
    }

    pub fn hash_code(&self) -> u64 {
        self.hash
            .get_or_compute(|| hash_of(&(&self.element, &self.code, &self.value)))
    }
}

impl Hash for UsageContext {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl HasId for UsageContext {
    fn id(&self) -> Option<&str> {
        self.element.id()
    }
}

impl HasExtensions for UsageContext {
    fn extension(&self) -> &[Extension] {
        &self.element.extension
    }
}

impl Element for UsageContext {
    fn has_children(&self) -> bool {
        true
    }
}

impl Constrained for UsageContext {
    const TYPE_NAME: &'static str = "UsageContext";
    const BASE: Option<&'static str> = Some("Element");
    const CONSTRAINTS: &'static [Constraint] = &[];
}

impl Visitable for UsageContext {
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
        walker.element(&FIELDS[2], Some(&self.code));
        walker.choice(&FIELDS[3], Some(&self.value));
    }
}

#[derive(Debug, Clone, Default)]
pub struct UsageContextBuilder {
    element: ElementFields,
    code: Option<Coding>,
    value: Option<DataValue>,
}

impl UsageContextBuilder {
    pub fn code(mut self, code: Coding) -> Self {
        self.code = present(code);
        self
    }

    pub fn value(mut self, value: impl Into<DataValue>) -> Self {
        let value = value.into();
        self.value = (!value.is_absent()).then_some(value);
        self
    }

    pub fn build(self) -> Result<UsageContext> {
        let context = UsageContext {
            element: self.element,
            code: FIELDS[2].require(UsageContext::TYPE_NAME, self.code)?,
            value: FIELDS[3].resolve_required_choice(UsageContext::TYPE_NAME, self.value)?,
            hash: HashCache::new(),
        };
        check_primitives(&context, UsageContext::TYPE_NAME)?;
        Ok(context)
    }
}

impl ElementBuilder for UsageContextBuilder {
    fn element_fields(&mut self) -> &mut ElementFields {
        &mut self.element
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::{CodeableConcept, Period};
    use crate::error::Error;
    use crate::primitive::Code;

    fn gender() -> Coding {
        Coding::builder()
            .system("http://terminology.hl7.org/CodeSystem/usage-context-type")
            .code(Code::from("gender"))
            .build()
            .unwrap()
    }

    fn female() -> CodeableConcept {
        CodeableConcept::builder().text("female").build().unwrap()
    }

    #[test]
    fn keeps_permitted_value() {
        let context = UsageContext::builder(gender(), female()).build().unwrap();

        assert_eq!(context.value().data_type(), DataType::CodeableConcept);
        assert_eq!(context.value().get::<CodeableConcept>(), Some(&female()));
        assert_eq!(context.to_builder().build().unwrap(), context);
    }

    #[test]
    fn value_is_required() {
        let err = UsageContextBuilder::default()
            .code(gender())
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::RequiredFieldMissing {
                type_name: "UsageContext",
                field: "value",
            }
        ));
    }

    #[test]
    fn value_outside_permitted_types_is_rejected() {
        let period = Period::builder().start("2024-01-01").build().unwrap();
        let err = UsageContext::builder(gender(), period).build().unwrap_err();

        match err {
            Error::ChoiceTypeViolation {
                type_name,
                field,
                actual,
                permitted,
            } => {
                assert_eq!(type_name, "UsageContext");
                assert_eq!(field, "value");
                assert_eq!(actual, "Period");
                assert_eq!(permitted, vec!["CodeableConcept", "Quantity", "Reference"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

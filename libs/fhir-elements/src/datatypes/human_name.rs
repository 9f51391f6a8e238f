use std::any::Any;
use std::hash::{Hash, Hasher};

use crate::constraint::{Constrained, Constraint};
use crate::descriptor::{FieldDescriptor, EXTENSION, ID};
use crate::element::{
    extend_present, present, replace_present, Element, ElementBuilder, ElementFields,
    HasExtensions, HasId,
};
use crate::error::Result;
use crate::extension::Extension;
use crate::hash::{hash_of, HashCache};
use crate::primitive::{Code, FhirString};
use crate::visitor::{check_primitives, Visitable, Walker};

use super::Period;

const FIELDS: &[FieldDescriptor] = &[
    ID,
    EXTENSION,
    FieldDescriptor::optional("use", "code"),
    FieldDescriptor::optional("text", "string"),
    FieldDescriptor::optional("family", "string"),
    FieldDescriptor::repeated("given", "string"),
    FieldDescriptor::repeated("prefix", "string"),
    FieldDescriptor::repeated("suffix", "string"),
    FieldDescriptor::optional("period", "Period"),
];

/// Name of a human, with text, parts and usage information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HumanName {
    element: ElementFields,
    use_: Option<Code>,
    text: Option<FhirString>,
    family: Option<FhirString>,
    given: Vec<FhirString>,
    prefix: Vec<FhirString>,
    suffix: Vec<FhirString>,
    period: Option<Period>,
    hash: HashCache,
}

impl HumanName {
    pub fn builder() -> HumanNameBuilder {
        HumanNameBuilder::default()
    }

    pub fn to_builder(&self) -> HumanNameBuilder {
        HumanNameBuilder {
            element: self.element.clone(),
            use_: self.use_.clone(),
            text: self.text.clone(),
            family: self.family.clone(),
            given: self.given.clone(),
            prefix: self.prefix.clone(),
            suffix: self.suffix.clone(),
            period: self.period.clone(),
        }
    }

    pub fn use_(&self) -> Option<&Code> {
        self.use_.as_ref()
    }

    pub fn text(&self) -> Option<&FhirString> {
        self.text.as_ref()
    }

    pub fn family(&self) -> Option<&FhirString> {
        self.family.as_ref()
    }

    /// Given names, in the order they are used
    pub fn given(&self) -> &[FhirString] {
        &self.given
    }

    pub fn prefix(&self) -> &[FhirString] {
        &self.prefix
    }

    pub fn suffix(&self) -> &[FhirString] {
        &self.suffix
    }

    pub fn period(&self) -> Option<&Period> {
        self.period.as_ref()
    }

    pub fn hash_code(&self) -> u64 {
        self.hash.get_or_compute(|| {
            hash_of(&(
                &self.element,
                &self.use_,
                &self.text,
                &self.family,
                &self.given,
                &self.prefix,
                &self.suffix,
                &self.period,
            ))
        })
    }
}

impl Hash for HumanName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl HasId for HumanName {
    fn id(&self) -> Option<&str> {
        self.element.id()
    }
}

impl HasExtensions for HumanName {
    fn extension(&self) -> &[Extension] {
        &self.element.extension
    }
}

impl Element for HumanName {
    fn has_children(&self) -> bool {
        self.use_.is_some()
            || self.text.is_some()
            || self.family.is_some()
            || !self.given.is_empty()
            || !self.prefix.is_empty()
            || !self.suffix.is_empty()
            || self.period.is_some()
    }
}

impl Constrained for HumanName {
    const TYPE_NAME: &'static str = "HumanName";
    const BASE: Option<&'static str> = Some("Element");
    const CONSTRAINTS: &'static [Constraint] = &[];
}

impl Visitable for HumanName {
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
        walker.element(&FIELDS[2], self.use_.as_ref());
        walker.element(&FIELDS[3], self.text.as_ref());
        walker.element(&FIELDS[4], self.family.as_ref());
        walker.elements(&FIELDS[5], &self.given);
        walker.elements(&FIELDS[6], &self.prefix);
        walker.elements(&FIELDS[7], &self.suffix);
        walker.element(&FIELDS[8], self.period.as_ref());
    }
}

#[derive(Debug, Clone, Default)]
pub struct HumanNameBuilder {
    element: ElementFields,
    use_: Option<Code>,
    text: Option<FhirString>,
    family: Option<FhirString>,
    given: Vec<FhirString>,
    prefix: Vec<FhirString>,
    suffix: Vec<FhirString>,
    period: Option<Period>,
}

impl HumanNameBuilder {
    pub fn use_(mut self, use_: impl Into<Code>) -> Self {
        self.use_ = present(use_.into());
        self
    }

    pub fn text(mut self, text: impl Into<FhirString>) -> Self {
        self.text = present(text.into());
        self
    }

    pub fn family(mut self, family: impl Into<FhirString>) -> Self {
        self.family = present(family.into());
        self
    }

    /// Append given names
    pub fn given<T: Into<FhirString>>(mut self, given: impl IntoIterator<Item = T>) -> Self {
        extend_present(&mut self.given, given.into_iter().map(Into::into));
        self
    }

    /// Replace all given names
    pub fn set_given<T: Into<FhirString>>(mut self, given: impl IntoIterator<Item = T>) -> Self {
        replace_present(&mut self.given, given.into_iter().map(Into::into));
        self
    }

    pub fn prefix<T: Into<FhirString>>(mut self, prefix: impl IntoIterator<Item = T>) -> Self {
        extend_present(&mut self.prefix, prefix.into_iter().map(Into::into));
        self
    }

    pub fn set_prefix<T: Into<FhirString>>(mut self, prefix: impl IntoIterator<Item = T>) -> Self {
        replace_present(&mut self.prefix, prefix.into_iter().map(Into::into));
        self
    }

    pub fn suffix<T: Into<FhirString>>(mut self, suffix: impl IntoIterator<Item = T>) -> Self {
        extend_present(&mut self.suffix, suffix.into_iter().map(Into::into));
        self
    }

    pub fn set_suffix<T: Into<FhirString>>(mut self, suffix: impl IntoIterator<Item = T>) -> Self {
        replace_present(&mut self.suffix, suffix.into_iter().map(Into::into));
        self
    }

    pub fn period(mut self, period: Period) -> Self {
        self.period = present(period);
        self
    }

    pub fn build(self) -> Result<HumanName> {
        let name = HumanName {
            element: self.element,
            use_: self.use_,
            text: self.text,
            family: self.family,
            given: self.given,
            prefix: self.prefix,
            suffix: self.suffix,
            period: self.period,
            hash: HashCache::new(),
        };
        check_primitives(&name, HumanName::TYPE_NAME)?;
        Ok(name)
    }
}

impl ElementBuilder for HumanNameBuilder {
    fn element_fields(&mut self) -> &mut ElementFields {
        &mut self.element
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_names_keep_order_and_replace() {
        let name = HumanName::builder()
            .family("Chalmers")
            .given(["Peter", "James"])
            .given(["Jim"])
            .build()
            .unwrap();
        let given: Vec<_> = name.given().iter().filter_map(|g| g.as_str()).collect();
        assert_eq!(given, vec!["Peter", "James", "Jim"]);

        let renamed = name.to_builder().set_given(["Jim"]).build().unwrap();
        assert_eq!(renamed.given().len(), 1);
        assert_ne!(renamed, name);
    }

    #[test]
    fn empty_given_name_is_rejected() {
        let err = HumanName::builder().given([""]).build().unwrap_err();
        assert_eq!(err.field(), Some("given"));
    }
}

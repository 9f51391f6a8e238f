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
use crate::primitive::FhirString;
use crate::visitor::{check_primitives, Visitable, Walker};

use super::Coding;

const FIELDS: &[FieldDescriptor] = &[
    ID,
    EXTENSION,
    FieldDescriptor::repeated("coding", "Coding"),
    FieldDescriptor::optional("text", "string"),
];

/// A concept given by codes from terminologies and/or plain text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeableConcept {
    element: ElementFields,
    coding: Vec<Coding>,
    text: Option<FhirString>,
    hash: HashCache,
}

impl CodeableConcept {
    pub fn builder() -> CodeableConceptBuilder {
        CodeableConceptBuilder::default()
    }

    pub fn to_builder(&self) -> CodeableConceptBuilder {
        CodeableConceptBuilder {
            element: self.element.clone(),
            coding: self.coding.clone(),
            text: self.text.clone(),
        }
    }

    pub fn coding(&self) -> &[Coding] {
        &self.coding
    }

    /// Plain text representation of the concept
    pub fn text(&self) -> Option<&FhirString> {
        self.text.as_ref()
    }

    pub fn hash_code(&self) -> u64 {
        self.hash
            .get_or_compute(|| hash_of(&(&self.element, &self.coding, &self.text)))
    }
}

impl Hash for CodeableConcept {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl HasId for CodeableConcept {
    fn id(&self) -> Option<&str> {
        self.element.id()
    }
}

impl HasExtensions for CodeableConcept {
    fn extension(&self) -> &[Extension] {
        &self.element.extension
    }
}

impl Element for CodeableConcept {
    fn has_children(&self) -> bool {
        !self.coding.is_empty() || self.text.is_some()
    }
}

impl Constrained for CodeableConcept {
    const TYPE_NAME: &'static str = "CodeableConcept";
    const BASE: Option<&'static str> = Some("Element");
    const CONSTRAINTS: &'static [Constraint] = &[];
}

impl Visitable for CodeableConcept {
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
        walker.elements(&FIELDS[2], &self.coding);
        walker.element(&FIELDS[3], self.text.as_ref());
    }
}

#[derive(Debug, Clone, Default)]
pub struct CodeableConceptBuilder {
    element: ElementFields,
    coding: Vec<Coding>,
    text: Option<FhirString>,
}

impl CodeableConceptBuilder {
    /// Append codings
    pub fn coding(mut self, coding: impl IntoIterator<Item = Coding>) -> Self {
        extend_present(&mut self.coding, coding);
        self
    }

    /// Replace all codings
    pub fn set_coding(mut self, coding: impl IntoIterator<Item = Coding>) -> Self {
        replace_present(&mut self.coding, coding);
        self
    }

    pub fn text(mut self, text: impl Into<FhirString>) -> Self {
        self.text = present(text.into());
        self
    }

    pub fn build(self) -> Result<CodeableConcept> {
        let concept = CodeableConcept {
            element: self.element,
            coding: self.coding,
            text: self.text,
            hash: HashCache::new(),
        };
        check_primitives(&concept, CodeableConcept::TYPE_NAME)?;
        Ok(concept)
    }
}

impl ElementBuilder for CodeableConceptBuilder {
    fn element_fields(&mut self) -> &mut ElementFields {
        &mut self.element
    }
}

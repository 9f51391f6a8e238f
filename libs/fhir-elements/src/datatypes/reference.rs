use std::any::Any;
use std::hash::{Hash, Hasher};

use crate::constraint::{Constrained, Constraint, BASE_LOCATION};
use crate::descriptor::{FieldDescriptor, EXTENSION, ID};
use crate::element::{present, Element, ElementBuilder, ElementFields, HasExtensions, HasId};
use crate::error::Result;
use crate::extension::Extension;
use crate::hash::{hash_of, HashCache};
use crate::primitive::{FhirString, Uri};
use crate::visitor::{check_primitives, Visitable, Walker};

use super::Identifier;

const FIELDS: &[FieldDescriptor] = &[
    ID,
    EXTENSION,
    FieldDescriptor::optional("reference", "string"),
    FieldDescriptor::optional("type", "uri"),
    FieldDescriptor::optional("identifier", "Identifier"),
    FieldDescriptor::optional("display", "string"),
];

const CONSTRAINTS: &[Constraint] = &[Constraint::rule(
    "ref-1",
    BASE_LOCATION,
    "SHALL have a contained resource if a local reference is provided",
    "reference.startsWith('#').not() or (reference.substring(1).trace('url') in %rootResource.contained.id.trace('ids'))",
)
.with_source("http://hl7.org/fhir/StructureDefinition/Reference")];

/// A reference from one resource to another
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    element: ElementFields,
    reference: Option<FhirString>,
    type_: Option<Uri>,
    identifier: Option<Identifier>,
    display: Option<FhirString>,
    hash: HashCache,
}

impl Reference {
    pub fn builder() -> ReferenceBuilder {
        ReferenceBuilder::default()
    }

    pub fn to_builder(&self) -> ReferenceBuilder {
        ReferenceBuilder {
            element: self.element.clone(),
            reference: self.reference.clone(),
            type_: self.type_.clone(),
            identifier: self.identifier.clone(),
            display: self.display.clone(),
        }
    }

    /// Literal reference, relative, internal (`#id`) or absolute URL
    pub fn reference(&self) -> Option<&FhirString> {
        self.reference.as_ref()
    }

    /// Type the reference refers to (e.g. "Patient")
    pub fn type_(&self) -> Option<&Uri> {
        self.type_.as_ref()
    }

    pub fn identifier(&self) -> Option<&Identifier> {
        self.identifier.as_ref()
    }

    pub fn display(&self) -> Option<&FhirString> {
        self.display.as_ref()
    }

    /// Whether this points at a resource contained in the same record
    pub fn is_local(&self) -> bool {
        self.reference
            .as_ref()
            .and_then(|r| r.as_str())
            .is_some_and(|r| r.starts_with('#'))
    }

    pub fn hash_code(&self) -> u64 {
        self.hash.get_or_compute(|| {
            hash_of(&(
                &self.element,
                &self.reference,
                &self.type_,
                &self.identifier,
                &self.display,
            ))
        })
    }
}

impl Hash for Reference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl HasId for Reference {
    fn id(&self) -> Option<&str> {
        self.element.id()
    }
}

impl HasExtensions for Reference {
    fn extension(&self) -> &[Extension] {
        &self.element.extension
    }
}

impl Element for Reference {
    fn has_children(&self) -> bool {
        self.reference.is_some()
            || self.type_.is_some()
            || self.identifier.is_some()
            || self.display.is_some()
    }
}

impl Constrained for Reference {
    const TYPE_NAME: &'static str = "Reference";
    const BASE: Option<&'static str> = Some("Element");
    const CONSTRAINTS: &'static [Constraint] = CONSTRAINTS;
}

impl Visitable for Reference {
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
        walker.element(&FIELDS[2], self.reference.as_ref());
        walker.element(&FIELDS[3], self.type_.as_ref());
        walker.element(&FIELDS[4], self.identifier.as_ref());
        walker.element(&FIELDS[5], self.display.as_ref());
    }

    fn constraints(&self) -> &'static [Constraint] {
        CONSTRAINTS
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceBuilder {
    element: ElementFields,
    reference: Option<FhirString>,
    type_: Option<Uri>,
    identifier: Option<Identifier>,
    display: Option<FhirString>,
}

impl ReferenceBuilder {
    pub fn reference(mut self, reference: impl Into<FhirString>) -> Self {
        self.reference = present(reference.into());
        self
    }

    pub fn type_(mut self, type_: impl Into<Uri>) -> Self {
        self.type_ = present(type_.into());
        self
    }

    pub fn identifier(mut self, identifier: Identifier) -> Self {
        self.identifier = present(identifier);
        self
    }

    pub fn display(mut self, display: impl Into<FhirString>) -> Self {
        self.display = present(display.into());
        self
    }

    pub fn build(self) -> Result<Reference> {
        let reference = Reference {
            element: self.element,
            reference: self.reference,
            type_: self.type_,
            identifier: self.identifier,
            display: self.display,
            hash: HashCache::new(),
        };
        check_primitives(&reference, Reference::TYPE_NAME)?;
        Ok(reference)
    }
}

impl ElementBuilder for ReferenceBuilder {
    fn element_fields(&mut self) -> &mut ElementFields {
        &mut self.element
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_references() {
        let local = Reference::builder().reference("#p1").build().unwrap();
        let remote = Reference::builder().reference("Patient/1").build().unwrap();
        assert!(local.is_local());
        assert!(!remote.is_local());
        assert!(!Reference::builder().display("x").build().unwrap().is_local());
    }
}

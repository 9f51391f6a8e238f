use std::any::Any;
use std::hash::{Hash, Hasher};

use crate::constraint::{Constrained, Constraint};
use crate::descriptor::{FieldDescriptor, EXTENSION, ID};
use crate::element::{present, Element, ElementBuilder, ElementFields, HasExtensions, HasId};
use crate::error::Result;
use crate::extension::Extension;
use crate::hash::{hash_of, HashCache};
use crate::primitive::{Code, FhirString, Uri};
use crate::visitor::{check_primitives, Visitable, Walker};

use super::{CodeableConcept, Period};

const FIELDS: &[FieldDescriptor] = &[
    ID,
    EXTENSION,
    FieldDescriptor::optional("use", "code"),
    FieldDescriptor::optional("type", "CodeableConcept"),
    FieldDescriptor::optional("system", "uri"),
    FieldDescriptor::optional("value", "string"),
    FieldDescriptor::optional("period", "Period"),
];

/// An identifier intended for computation
///
/// `assigner` is not modelled: a Reference can itself hold an Identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    element: ElementFields,
    use_: Option<Code>,
    type_: Option<CodeableConcept>,
    system: Option<Uri>,
    value: Option<FhirString>,
    period: Option<Period>,
    hash: HashCache,
}

impl Identifier {
    pub fn builder() -> IdentifierBuilder {
        IdentifierBuilder::default()
    }

    pub fn to_builder(&self) -> IdentifierBuilder {
        IdentifierBuilder {
            element: self.element.clone(),
            use_: self.use_.clone(),
            type_: self.type_.clone(),
            system: self.system.clone(),
            value: self.value.clone(),
            period: self.period.clone(),
        }
    }

    /// usual | official | temp | secondary | old
    pub fn use_(&self) -> Option<&Code> {
        self.use_.as_ref()
    }

    pub fn type_(&self) -> Option<&CodeableConcept> {
        self.type_.as_ref()
    }

    /// The namespace for the identifier value
    pub fn system(&self) -> Option<&Uri> {
        self.system.as_ref()
    }

    pub fn value(&self) -> Option<&FhirString> {
        self.value.as_ref()
    }

    pub fn period(&self) -> Option<&Period> {
        self.period.as_ref()
    }

    pub fn hash_code(&self) -> u64 {
        self.hash.get_or_compute(|| {
            hash_of(&(
                &self.element,
                &self.use_,
                &self.type_,
                &self.system,
                &self.value,
                &self.period,
            ))
        })
    }
}

impl Hash for Identifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl HasId for Identifier {
    fn id(&self) -> Option<&str> {
        self.element.id()
    }
}

impl HasExtensions for Identifier {
    fn extension(&self) -> &[Extension] {
        &self.element.extension
    }
}

impl Element for Identifier {
    fn has_children(&self) -> bool {
        self.use_.is_some()
            || self.type_.is_some()
            || self.system.is_some()
            || self.value.is_some()
            || self.period.is_some()
    }
}

impl Constrained for Identifier {
    const TYPE_NAME: &'static str = "Identifier";
    const BASE: Option<&'static str> = Some("Element");
    const CONSTRAINTS: &'static [Constraint] = &[];
}

impl Visitable for Identifier {
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
        walker.element(&FIELDS[3], self.type_.as_ref());
        walker.element(&FIELDS[4], self.system.as_ref());
        walker.element(&FIELDS[5], self.value.as_ref());
        walker.element(&FIELDS[6], self.period.as_ref());
    }
}

#[derive(Debug, Clone, Default)]
pub struct IdentifierBuilder {
    element: ElementFields,
    use_: Option<Code>,
    type_: Option<CodeableConcept>,
    system: Option<Uri>,
    value: Option<FhirString>,
    period: Option<Period>,
}

impl IdentifierBuilder {
    pub fn use_(mut self, use_: impl Into<Code>) -> Self {
        self.use_ = present(use_.into());
        self
    }

    pub fn type_(mut self, type_: CodeableConcept) -> Self {
        self.type_ = present(type_);
        self
    }

    pub fn system(mut self, system: impl Into<Uri>) -> Self {
        self.system = present(system.into());
        self
    }

    pub fn value(mut self, value: impl Into<FhirString>) -> Self {
        self.value = present(value.into());
        self
    }

    pub fn period(mut self, period: Period) -> Self {
        self.period = present(period);
        self
    }

    pub fn build(self) -> Result<Identifier> {
        let identifier = Identifier {
            element: self.element,
            use_: self.use_,
            type_: self.type_,
            system: self.system,
            value: self.value,
            period: self.period,
            hash: HashCache::new(),
        };
        check_primitives(&identifier, Identifier::TYPE_NAME)?;
        Ok(identifier)
    }
}

impl ElementBuilder for IdentifierBuilder {
    fn element_fields(&mut self) -> &mut ElementFields {
        &mut self.element
    }
}

use std::any::Any;
use std::hash::{Hash, Hasher};

use crate::constraint::{Constrained, Constraint};
use crate::descriptor::{FieldDescriptor, EXTENSION, ID};
use crate::element::{present, Element, ElementBuilder, ElementFields, HasExtensions, HasId};
use crate::error::Result;
use crate::extension::Extension;
use crate::hash::{hash_of, HashCache};
use crate::primitive::{Code, Xhtml};
use crate::visitor::{check_primitives, Visitable, Walker};

const FIELDS: &[FieldDescriptor] = &[
    ID,
    EXTENSION,
    FieldDescriptor::required("status", "code"),
    FieldDescriptor::required("div", "xhtml"),
];

const CONSTRAINTS: &[Constraint] = &[
    Constraint::rule(
        "txt-1",
        "Narrative.div",
        "The narrative SHALL contain only the basic html formatting elements and attributes described in chapters 7-11 (except section 4 of chapter 9) and 12 of the HTML 4.0 standard, <a> elements (either name or href), images and internally contained style attributes",
        "htmlChecks()",
    )
    .with_source("http://hl7.org/fhir/StructureDefinition/Narrative"),
    Constraint::rule(
        "txt-2",
        "Narrative.div",
        "The narrative SHALL have some non-whitespace content",
        "htmlChecks()",
    )
    .with_source("http://hl7.org/fhir/StructureDefinition/Narrative"),
];

/// Human-readable summary of a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Narrative {
    element: ElementFields,
    status: Code,
    div: Xhtml,
    hash: HashCache,
}

impl Narrative {
    pub fn builder(status: impl Into<Code>, div: impl Into<Xhtml>) -> NarrativeBuilder {
        NarrativeBuilder::default().status(status).div(div)
    }

    pub fn to_builder(&self) -> NarrativeBuilder {
        NarrativeBuilder {
            element: self.element.clone(),
            status: Some(self.status.clone()),
            div: Some(self.div.clone()),
        }
    }

    /// generated | extensions | additional | empty
    pub fn status(&self) -> &Code {
        &self.status
    }

    /// Limited xhtml content
    pub fn div(&self) -> &Xhtml {
        &self.div
    }

    pub fn hash_code(&self) -> u64 {
        self.hash
            .get_or_compute(|| hash_of(&(&self.element, &self.status, &self.div)))
    }
}

impl Hash for Narrative {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl HasId for Narrative {
    fn id(&self) -> Option<&str> {
        self.element.id()
    }
}

impl HasExtensions for Narrative {
    fn extension(&self) -> &[Extension] {
        &self.element.extension
    }
}

impl Element for Narrative {
    fn has_children(&self) -> bool {
        true
    }
}

impl Constrained for Narrative {
    const TYPE_NAME: &'static str = "Narrative";
    const BASE: Option<&'static str> = Some("Element");
    const CONSTRAINTS: &'static [Constraint] = CONSTRAINTS;
}

impl Visitable for Narrative {
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
        walker.element(&FIELDS[2], Some(&self.status));
        walker.element(&FIELDS[3], Some(&self.div));
    }

    fn constraints(&self) -> &'static [Constraint] {
        CONSTRAINTS
    }
}

#[derive(Debug, Clone, Default)]
pub struct NarrativeBuilder {
    element: ElementFields,
    status: Option<Code>,
    div: Option<Xhtml>,
}

impl NarrativeBuilder {
    pub fn status(mut self, status: impl Into<Code>) -> Self {
        self.status = present(status.into());
        self
    }

    pub fn div(mut self, div: impl Into<Xhtml>) -> Self {
        self.div = present(div.into());
        self
    }

    pub fn build(self) -> Result<Narrative> {
        let narrative = Narrative {
            element: self.element,
            status: FIELDS[2].require(Narrative::TYPE_NAME, self.status)?,
            div: FIELDS[3].require(Narrative::TYPE_NAME, self.div)?,
            hash: HashCache::new(),
        };
        check_primitives(&narrative, Narrative::TYPE_NAME)?;
        Ok(narrative)
    }
}

impl ElementBuilder for NarrativeBuilder {
    fn element_fields(&mut self) -> &mut ElementFields {
        &mut self.element
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn status_and_div_are_required() {
        let err = NarrativeBuilder::default()
            .div("<div xmlns=\"http://www.w3.org/1999/xhtml\">x</div>")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::RequiredFieldMissing { field: "status", .. }));

        let err = NarrativeBuilder::default().status("generated").build().unwrap_err();
        assert!(matches!(err, Error::RequiredFieldMissing { field: "div", .. }));
    }

    #[test]
    fn div_must_be_a_div() {
        let err = Narrative::builder("generated", "<p>x</p>").build().unwrap_err();
        assert_eq!(err.field(), Some("div"));

        let narrative = Narrative::builder("generated", "<div>ok</div>").build().unwrap();
        assert_eq!(narrative.status().as_str(), Some("generated"));
        assert_eq!(narrative.to_builder().build().unwrap(), narrative);
    }
}

use std::any::Any;
use std::hash::{Hash, Hasher};

use crate::constraint::{Constrained, Constraint};
use crate::descriptor::{FieldDescriptor, EXTENSION, ID};
use crate::element::{present, Element, ElementBuilder, ElementFields, HasExtensions, HasId};
use crate::error::Result;
use crate::extension::Extension;
use crate::hash::{hash_of, HashCache};
use crate::primitive::{Boolean, Code, FhirString, Uri};
use crate::visitor::{check_primitives, Visitable, Walker};

const FIELDS: &[FieldDescriptor] = &[
    ID,
    EXTENSION,
    FieldDescriptor::optional("system", "uri"),
    FieldDescriptor::optional("version", "string"),
    FieldDescriptor::optional("code", "code"),
    FieldDescriptor::optional("display", "string"),
    FieldDescriptor::optional("userSelected", "boolean"),
];

/// A reference to a code defined by a terminology system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coding {
    element: ElementFields,
    system: Option<Uri>,
    version: Option<FhirString>,
    code: Option<Code>,
    display: Option<FhirString>,
    user_selected: Option<Boolean>,
    hash: HashCache,
}

impl Coding {
    pub fn builder() -> CodingBuilder {
        CodingBuilder::default()
    }

    pub fn to_builder(&self) -> CodingBuilder {
        CodingBuilder {
            element: self.element.clone(),
            system: self.system.clone(),
            version: self.version.clone(),
            code: self.code.clone(),
            display: self.display.clone(),
            user_selected: self.user_selected.clone(),
        }
    }

    /// Identity of the terminology system
    pub fn system(&self) -> Option<&Uri> {
        self.system.as_ref()
    }

    pub fn version(&self) -> Option<&FhirString> {
        self.version.as_ref()
    }

    /// Symbol in syntax defined by the system
    pub fn code(&self) -> Option<&Code> {
        self.code.as_ref()
    }

    pub fn display(&self) -> Option<&FhirString> {
        self.display.as_ref()
    }

    /// If this coding was chosen directly by the user
    pub fn user_selected(&self) -> Option<&Boolean> {
        self.user_selected.as_ref()
    }

    pub fn hash_code(&self) -> u64 {
        self.hash.get_or_compute(|| {
            hash_of(&(
                &self.element,
                &self.system,
                &self.version,
                &self.code,
                &self.display,
                &self.user_selected,
            ))
        })
    }
}

impl Hash for Coding {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl HasId for Coding {
    fn id(&self) -> Option<&str> {
        self.element.id()
    }
}

impl HasExtensions for Coding {
    fn extension(&self) -> &[Extension] {
        &self.element.extension
    }
}

impl Element for Coding {
    fn has_children(&self) -> bool {
        self.system.is_some()
            || self.version.is_some()
            || self.code.is_some()
            || self.display.is_some()
            || self.user_selected.is_some()
    }
}

impl Constrained for Coding {
    const TYPE_NAME: &'static str = "Coding";
    const BASE: Option<&'static str> = Some("Element");
    const CONSTRAINTS: &'static [Constraint] = &[];
}

impl Visitable for Coding {
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
        walker.element(&FIELDS[2], self.system.as_ref());
        walker.element(&FIELDS[3], self.version.as_ref());
        walker.element(&FIELDS[4], self.code.as_ref());
        walker.element(&FIELDS[5], self.display.as_ref());
        walker.element(&FIELDS[6], self.user_selected.as_ref());
    }
}

#[derive(Debug, Clone, Default)]
pub struct CodingBuilder {
    element: ElementFields,
    system: Option<Uri>,
    version: Option<FhirString>,
    code: Option<Code>,
    display: Option<FhirString>,
    user_selected: Option<Boolean>,
}

impl CodingBuilder {
    pub fn system(mut self, system: impl Into<Uri>) -> Self {
        self.system = present(system.into());
        self
    }

    pub fn version(mut self, version: impl Into<FhirString>) -> Self {
        self.version = present(version.into());
        self
    }

    pub fn code(mut self, code: impl Into<Code>) -> Self {
        self.code = present(code.into());
        self
    }

    pub fn display(mut self, display: impl Into<FhirString>) -> Self {
        self.display = present(display.into());
        self
    }

    pub fn user_selected(mut self, user_selected: impl Into<Boolean>) -> Self {
        self.user_selected = present(user_selected.into());
        self
    }

    pub fn build(self) -> Result<Coding> {
        let coding = Coding {
            element: self.element,
            system: self.system,
            version: self.version,
            code: self.code,
            display: self.display,
            user_selected: self.user_selected,
            hash: HashCache::new(),
        };
        check_primitives(&coding, Coding::TYPE_NAME)?;
        Ok(coding)
    }
}

impl ElementBuilder for CodingBuilder {
    fn element_fields(&mut self) -> &mut ElementFields {
        &mut self.element
    }
}

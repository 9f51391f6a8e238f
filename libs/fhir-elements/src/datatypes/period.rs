use std::any::Any;
use std::hash::{Hash, Hasher};

use crate::constraint::{Constrained, Constraint, BASE_LOCATION};
use crate::descriptor::{FieldDescriptor, EXTENSION, ID};
use crate::element::{present, Element, ElementBuilder, ElementFields, HasExtensions, HasId};
use crate::error::Result;
use crate::extension::Extension;
use crate::hash::{hash_of, HashCache};
use crate::primitive::DateTime;
use crate::visitor::{check_primitives, Visitable, Walker};

const FIELDS: &[FieldDescriptor] = &[
    ID,
    EXTENSION,
    FieldDescriptor::optional("start", "dateTime"),
    FieldDescriptor::optional("end", "dateTime"),
];

const CONSTRAINTS: &[Constraint] = &[Constraint::rule(
    "per-1",
    BASE_LOCATION,
    "If present, start SHALL have a lower value than end",
    "start.hasValue().not() or end.hasValue().not() or (start <= end)",
)
.with_source("http://hl7.org/fhir/StructureDefinition/Period")];

/// Time range defined by start and end date/time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Period {
    element: ElementFields,
    start: Option<DateTime>,
    end: Option<DateTime>,
    hash: HashCache,
}

impl Period {
    pub fn builder() -> PeriodBuilder {
        PeriodBuilder::default()
    }

    pub fn to_builder(&self) -> PeriodBuilder {
        PeriodBuilder {
            element: self.element.clone(),
            start: self.start.clone(),
            end: self.end.clone(),
        }
    }

    pub fn start(&self) -> Option<&DateTime> {
        self.start.as_ref()
    }

    /// End time with inclusive boundary, if not ongoing
    pub fn end(&self) -> Option<&DateTime> {
        self.end.as_ref()
    }

    pub fn hash_code(&self) -> u64 {
        self.hash
            .get_or_compute(|| hash_of(&(&self.element, &self.start, &self.end)))
    }
}

impl Hash for Period {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl HasId for Period {
    fn id(&self) -> Option<&str> {
        self.element.id()
    }
}

impl HasExtensions for Period {
    fn extension(&self) -> &[Extension] {
        &self.element.extension
    }
}

impl Element for Period {
    fn has_children(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }
}

impl Constrained for Period {
    const TYPE_NAME: &'static str = "Period";
    const BASE: Option<&'static str> = Some("Element");
    const CONSTRAINTS: &'static [Constraint] = CONSTRAINTS;
}

impl Visitable for Period {
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
        walker.element(&FIELDS[2], self.start.as_ref());
        walker.element(&FIELDS[3], self.end.as_ref());
    }

    fn constraints(&self) -> &'static [Constraint] {
        CONSTRAINTS
    }
}

#[derive(Debug, Clone, Default)]
pub struct PeriodBuilder {
    element: ElementFields,
    start: Option<DateTime>,
    end: Option<DateTime>,
}

impl PeriodBuilder {
    pub fn start(mut self, start: impl Into<DateTime>) -> Self {
        self.start = present(start.into());
        self
    }

    pub fn end(mut self, end: impl Into<DateTime>) -> Self {
        self.end = present(end.into());
        self
    }

    pub fn build(self) -> Result<Period> {
        let period = Period {
            element: self.element,
            start: self.start,
            end: self.end,
            hash: HashCache::new(),
        };
        check_primitives(&period, Period::TYPE_NAME)?;
        Ok(period)
    }
}

impl ElementBuilder for PeriodBuilder {
    fn element_fields(&mut self) -> &mut ElementFields {
        &mut self.element
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn rejects_malformed_date_time() {
        let err = Period::builder()
            .start("2024-01-01")
            .end("01/02/2024")
            .build()
            .unwrap_err();

        match err {
            Error::InvalidPrimitiveValue {
                type_name,
                field,
                value,
                ..
            } => {
                assert_eq!(type_name, "Period");
                assert_eq!(field, "end");
                assert_eq!(value, "01/02/2024");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

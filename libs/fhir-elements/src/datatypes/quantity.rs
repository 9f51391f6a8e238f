use std::any::Any;
use std::hash::{Hash, Hasher};

use crate::constraint::{Constrained, Constraint, BASE_LOCATION};
use crate::descriptor::{FieldDescriptor, EXTENSION, ID};
use crate::element::{present, Element, ElementBuilder, ElementFields, HasExtensions, HasId};
use crate::error::Result;
use crate::extension::Extension;
use crate::hash::{hash_of, HashCache};
use crate::primitive::{Code, Decimal, FhirString, Uri};
use crate::visitor::{check_primitives, Visitable, Walker};

const FIELDS: &[FieldDescriptor] = &[
    ID,
    EXTENSION,
    FieldDescriptor::optional("value", "decimal"),
    FieldDescriptor::optional("comparator", "code"),
    FieldDescriptor::optional("unit", "string"),
    FieldDescriptor::optional("system", "uri"),
    FieldDescriptor::optional("code", "code"),
];

const CONSTRAINTS: &[Constraint] = &[Constraint::rule(
    "qty-3",
    BASE_LOCATION,
    "If a code for the unit is present, the system SHALL also be present",
    "code.empty() or system.exists()",
)
.with_source("http://hl7.org/fhir/StructureDefinition/Quantity")];

/// A measured or measurable amount
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quantity {
    element: ElementFields,
    value: Option<Decimal>,
    comparator: Option<Code>,
    unit: Option<FhirString>,
    system: Option<Uri>,
    code: Option<Code>,
    hash: HashCache,
}

impl Quantity {
    pub fn builder() -> QuantityBuilder {
        QuantityBuilder::default()
    }

    pub fn to_builder(&self) -> QuantityBuilder {
        QuantityBuilder {
            element: self.element.clone(),
            value: self.value.clone(),
            comparator: self.comparator.clone(),
            unit: self.unit.clone(),
            system: self.system.clone(),
            code: self.code.clone(),
        }
    }

    pub fn value(&self) -> Option<&Decimal> {
        self.value.as_ref()
    }

    /// `<`, `<=`, `>=` or `>`: how to understand the value
    pub fn comparator(&self) -> Option<&Code> {
        self.comparator.as_ref()
    }

    /// Unit representation
    pub fn unit(&self) -> Option<&FhirString> {
        self.unit.as_ref()
    }

    /// System that defines coded unit form
    pub fn system(&self) -> Option<&Uri> {
        self.system.as_ref()
    }

    /// Coded form of the unit
    pub fn code(&self) -> Option<&Code> {
        self.code.as_ref()
    }

    pub fn hash_code(&self) -> u64 {
        self.hash.get_or_compute(|| {
            hash_of(&(
                &self.element,
                &self.value,
                &self.comparator,
                &self.unit,
                &self.system,
                &self.code,
            ))
        })
    }
}

impl Hash for Quantity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl HasId for Quantity {
    fn id(&self) -> Option<&str> {
        self.element.id()
    }
}

impl HasExtensions for Quantity {
    fn extension(&self) -> &[Extension] {
        &self.element.extension
    }
}

impl Element for Quantity {
    fn has_children(&self) -> bool {
        self.value.is_some()
            || self.comparator.is_some()
            || self.unit.is_some()
            || self.system.is_some()
            || self.code.is_some()
    }
}

impl Constrained for Quantity {
    const TYPE_NAME: &'static str = "Quantity";
    const BASE: Option<&'static str> = Some("Element");
    const CONSTRAINTS: &'static [Constraint] = CONSTRAINTS;
}

impl Visitable for Quantity {
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
        walker.element(&FIELDS[2], self.value.as_ref());
        walker.element(&FIELDS[3], self.comparator.as_ref());
        walker.element(&FIELDS[4], self.unit.as_ref());
        walker.element(&FIELDS[5], self.system.as_ref());
        walker.element(&FIELDS[6], self.code.as_ref());
    }

    fn constraints(&self) -> &'static [Constraint] {
        CONSTRAINTS
    }
}

#[derive(Debug, Clone, Default)]
pub struct QuantityBuilder {
    element: ElementFields,
    value: Option<Decimal>,
    comparator: Option<Code>,
    unit: Option<FhirString>,
    system: Option<Uri>,
    code: Option<Code>,
}

impl QuantityBuilder {
    pub fn value(mut self, value: impl Into<Decimal>) -> Self {
        self.value = present(value.into());
        self
    }

    pub fn comparator(mut self, comparator: impl Into<Code>) -> Self {
        self.comparator = present(comparator.into());
        self
    }

    pub fn unit(mut self, unit: impl Into<FhirString>) -> Self {
        self.unit = present(unit.into());
        self
    }

    pub fn system(mut self, system: impl Into<Uri>) -> Self {
        self.system = present(system.into());
        self
    }

    pub fn code(mut self, code: impl Into<Code>) -> Self {
        self.code = present(code.into());
        self
    }

    pub fn build(self) -> Result<Quantity> {
        let quantity = Quantity {
            element: self.element,
            value: self.value,
            comparator: self.comparator,
            unit: self.unit,
            system: self.system,
            code: self.code,
            hash: HashCache::new(),
        };
        check_primitives(&quantity, Quantity::TYPE_NAME)?;
        Ok(quantity)
    }
}

impl ElementBuilder for QuantityBuilder {
    fn element_fields(&mut self) -> &mut ElementFields {
        &mut self.element
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal as DecimalValue;

    #[test]
    fn decimal_value_keeps_scale() {
        let quantity = Quantity::builder()
            .value(DecimalValue::new(7210, 2))
            .unit("mmol/L")
            .system("http://unitsofmeasure.org")
            .code("mmol/L")
            .build()
            .unwrap();

        let value = quantity.value().and_then(|v| v.value()).unwrap();
        assert_eq!(value.to_string(), "72.10");
        assert_eq!(quantity.constraints()[0].id, "qty-3");
    }
}

//! Observation
//!
//! `effective[x]` and `value[x]` are choice fields; components carry their
//! own `value[x]`.

use std::any::Any;
use std::hash::{Hash, Hasher};

use ferrum_elements::choice::{DataType, DataValue};
use ferrum_elements::constraint::{Constrained, Constraint, BASE_LOCATION};
use ferrum_elements::datatypes::{CodeableConcept, Identifier, Narrative, Reference};
use ferrum_elements::descriptor::{Cardinality, FieldDescriptor, EXTENSION, ID, MODIFIER_EXTENSION};
use ferrum_elements::element::{
    extend_present, present, replace_present, BackboneElement, BackboneElementBuilder,
    BackboneFields, Element, ElementBuilder, ElementFields, HasExtensions, HasId,
    HasModifierExtensions, HasNarrative,
};
use ferrum_elements::error::Result;
use ferrum_elements::extension::Extension;
use ferrum_elements::hash::{hash_of, HashCache};
use ferrum_elements::primitive::{Code, Instant};
use ferrum_elements::resource::{
    resource_eq, DomainResource, DomainResourceBuilder, DomainResourceFields, Resource,
    ResourceBuilder, ResourceFields, CONTAINED, IMPLICIT_RULES, LANGUAGE, META, RESOURCE_ID, TEXT,
};
use ferrum_elements::visitor::{check_primitives, Visitable, Walker};

/// Permitted types of `Observation.effective[x]`
pub const OBSERVATION_EFFECTIVE: &[DataType] =
    &[DataType::DateTime, DataType::Period, DataType::Instant];

/// Permitted types of `Observation.value[x]` and `Observation.component.value[x]`
pub const OBSERVATION_VALUE: &[DataType] = &[
    DataType::Quantity,
    DataType::CodeableConcept,
    DataType::String,
    DataType::Boolean,
    DataType::Integer,
    DataType::DateTime,
    DataType::Period,
];

const OBSERVATION_SOURCE: &str = "http://hl7.org/fhir/StructureDefinition/Observation";

const OBSERVATION_CONSTRAINTS: &[Constraint] = &[
    Constraint::rule(
        "obs-6",
        BASE_LOCATION,
        "dataAbsentReason SHALL only be present if Observation.value[x] is not present",
        "dataAbsentReason.empty() or value.empty()",
    )
    .with_source(OBSERVATION_SOURCE),
    Constraint::rule(
        "obs-7",
        BASE_LOCATION,
        "If Observation.code is the same as an Observation.component.code then the value element associated with the code SHALL NOT be present",
        "value.empty() or component.code.where(coding.intersect(%resource.code.coding).exists()).empty()",
    )
    .with_source(OBSERVATION_SOURCE),
];

const OBSERVATION_COMPONENT_FIELDS: &[FieldDescriptor] = &[
    ID,
    EXTENSION,
    MODIFIER_EXTENSION,
    FieldDescriptor::required("code", "CodeableConcept"),
    FieldDescriptor::choice("value", Cardinality::OPTIONAL, OBSERVATION_VALUE),
    FieldDescriptor::optional("dataAbsentReason", "CodeableConcept"),
    FieldDescriptor::repeated("interpretation", "CodeableConcept"),
];

/// Component results, such as the two values of a blood pressure reading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservationComponent {
    backbone: BackboneFields,
    code: CodeableConcept,
    value: Option<DataValue>,
    data_absent_reason: Option<CodeableConcept>,
    interpretation: Vec<CodeableConcept>,
    hash: HashCache,
}

impl ObservationComponent {
    pub fn builder(code: CodeableConcept) -> ObservationComponentBuilder {
        ObservationComponentBuilder::default().code(code)
    }

    pub fn to_builder(&self) -> ObservationComponentBuilder {
        ObservationComponentBuilder {
            backbone: self.backbone.clone(),
            code: Some(self.code.clone()),
            value: self.value.clone(),
            data_absent_reason: self.data_absent_reason.clone(),
            interpretation: self.interpretation.clone(),
        }
    }

    /// Type of component observation (code / type)
    pub fn code(&self) -> &CodeableConcept {
        &self.code
    }

    /// Actual component result
    pub fn value(&self) -> Option<&DataValue> {
        self.value.as_ref()
    }

    pub fn data_absent_reason(&self) -> Option<&CodeableConcept> {
        self.data_absent_reason.as_ref()
    }

    pub fn interpretation(&self) -> &[CodeableConcept] {
        &self.interpretation
    }

    pub fn hash_code(&self) -> u64 {
        self.hash.get_or_compute(|| {
            hash_of(&(
                &self.backbone,
                &self.code,
                &self.value,
                &self.data_absent_reason,
                &self.interpretation,
            ))
        })
    }
}

impl Hash for ObservationComponent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl HasId for ObservationComponent {
    fn id(&self) -> Option<&str> {
        self.backbone.element.id()
    }
}

impl HasExtensions for ObservationComponent {
    fn extension(&self) -> &[Extension] {
        &self.backbone.element.extension
    }
}

impl HasModifierExtensions for ObservationComponent {
    fn modifier_extension(&self) -> &[Extension] {
        &self.backbone.modifier_extension
    }
}

impl Element for ObservationComponent {
    fn has_children(&self) -> bool {
        true
    }
}

impl BackboneElement for ObservationComponent {}

impl Constrained for ObservationComponent {
    const TYPE_NAME: &'static str = "Observation.component";
    const BASE: Option<&'static str> = Some("BackboneElement");
    const CONSTRAINTS: &'static [Constraint] = &[];
}

impl Visitable for ObservationComponent {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn fields(&self) -> &'static [FieldDescriptor] {
        OBSERVATION_COMPONENT_FIELDS
    }

    fn walk<'a>(&'a self, walker: &mut Walker<'a, '_>) {
        self.backbone.walk(walker);
        walker.element(&OBSERVATION_COMPONENT_FIELDS[3], Some(&self.code));
        walker.choice(&OBSERVATION_COMPONENT_FIELDS[4], self.value.as_ref());
        walker.element(&OBSERVATION_COMPONENT_FIELDS[5], self.data_absent_reason.as_ref());
        walker.elements(&OBSERVATION_COMPONENT_FIELDS[6], &self.interpretation);
    }
}

#[derive(Debug, Clone, Default)]
pub struct ObservationComponentBuilder {
    backbone: BackboneFields,
    code: Option<CodeableConcept>,
    value: Option<DataValue>,
    data_absent_reason: Option<CodeableConcept>,
    interpretation: Vec<CodeableConcept>,
}

impl ObservationComponentBuilder {
    pub fn code(mut self, code: CodeableConcept) -> Self {
        self.code = present(code);
        self
    }

    pub fn value(mut self, value: impl Into<DataValue>) -> Self {
        let value = value.into();
        self.value = (!value.is_absent()).then_some(value);
        self
    }

    pub fn data_absent_reason(mut self, data_absent_reason: CodeableConcept) -> Self {
        self.data_absent_reason = present(data_absent_reason);
        self
    }

    /// Append to `interpretation`
    pub fn interpretation(
        mut self,
        interpretation: impl IntoIterator<Item = CodeableConcept>,
    ) -> Self {
        extend_present(&mut self.interpretation, interpretation);
        self
    }

    /// Replace `interpretation`
    pub fn set_interpretation(
        mut self,
        interpretation: impl IntoIterator<Item = CodeableConcept>,
    ) -> Self {
        replace_present(&mut self.interpretation, interpretation);
        self
    }

    pub fn build(self) -> Result<ObservationComponent> {
        let component = ObservationComponent {
            backbone: self.backbone,
            code: OBSERVATION_COMPONENT_FIELDS[3]
                .require(ObservationComponent::TYPE_NAME, self.code)?,
            value: OBSERVATION_COMPONENT_FIELDS[4]
                .resolve_choice(ObservationComponent::TYPE_NAME, self.value)?,
            data_absent_reason: self.data_absent_reason,
            interpretation: self.interpretation,
            hash: HashCache::new(),
        };
        check_primitives(&component, ObservationComponent::TYPE_NAME)?;
        Ok(component)
    }
}

impl ElementBuilder for ObservationComponentBuilder {
    fn element_fields(&mut self) -> &mut ElementFields {
        &mut self.backbone.element
    }
}

impl BackboneElementBuilder for ObservationComponentBuilder {
    fn backbone_fields(&mut self) -> &mut BackboneFields {
        &mut self.backbone
    }
}

const OBSERVATION_FIELDS: &[FieldDescriptor] = &[
    RESOURCE_ID,
    META,
    IMPLICIT_RULES,
    LANGUAGE,
    TEXT,
    CONTAINED,
    EXTENSION,
    MODIFIER_EXTENSION,
    FieldDescriptor::repeated("identifier", "Identifier"),
    FieldDescriptor::required("status", "code"),
    FieldDescriptor::repeated("category", "CodeableConcept"),
    FieldDescriptor::required("code", "CodeableConcept"),
    FieldDescriptor::optional("subject", "Reference"),
    FieldDescriptor::optional("encounter", "Reference"),
    FieldDescriptor::choice("effective", Cardinality::OPTIONAL, OBSERVATION_EFFECTIVE),
    FieldDescriptor::optional("issued", "instant"),
    FieldDescriptor::repeated("performer", "Reference"),
    FieldDescriptor::choice("value", Cardinality::OPTIONAL, OBSERVATION_VALUE),
    FieldDescriptor::optional("dataAbsentReason", "CodeableConcept"),
    FieldDescriptor::repeated("interpretation", "CodeableConcept"),
    FieldDescriptor::repeated("hasMember", "Reference"),
    FieldDescriptor::repeated("component", "Observation.component"),
];

/// Measurements and simple assertions made about a patient, device or
/// other subject
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    domain: DomainResourceFields,
    identifier: Vec<Identifier>,
    status: Code,
    category: Vec<CodeableConcept>,
    code: CodeableConcept,
    subject: Option<Reference>,
    encounter: Option<Reference>,
    effective: Option<DataValue>,
    issued: Option<Instant>,
    performer: Vec<Reference>,
    value: Option<DataValue>,
    data_absent_reason: Option<CodeableConcept>,
    interpretation: Vec<CodeableConcept>,
    has_member: Vec<Reference>,
    component: Vec<ObservationComponent>,
    hash: HashCache,
}

impl Observation {
    pub fn builder(status: impl Into<Code>, code: CodeableConcept) -> ObservationBuilder {
        ObservationBuilder::default()
            .status(status)
            .code(code)
    }

    pub fn to_builder(&self) -> ObservationBuilder {
        ObservationBuilder {
            domain: self.domain.clone(),
            identifier: self.identifier.clone(),
            status: Some(self.status.clone()),
            category: self.category.clone(),
            code: Some(self.code.clone()),
            subject: self.subject.clone(),
            encounter: self.encounter.clone(),
            effective: self.effective.clone(),
            issued: self.issued.clone(),
            performer: self.performer.clone(),
            value: self.value.clone(),
            data_absent_reason: self.data_absent_reason.clone(),
            interpretation: self.interpretation.clone(),
            has_member: self.has_member.clone(),
            component: self.component.clone(),
        }
    }

    pub fn identifier(&self) -> &[Identifier] {
        &self.identifier
    }

    /// registered | preliminary | final | amended +
    pub fn status(&self) -> &Code {
        &self.status
    }

    pub fn category(&self) -> &[CodeableConcept] {
        &self.category
    }

    /// Type of observation (code / type)
    pub fn code(&self) -> &CodeableConcept {
        &self.code
    }

    pub fn subject(&self) -> Option<&Reference> {
        self.subject.as_ref()
    }

    pub fn encounter(&self) -> Option<&Reference> {
        self.encounter.as_ref()
    }

    /// Clinically relevant time/time-period for the observation
    pub fn effective(&self) -> Option<&DataValue> {
        self.effective.as_ref()
    }

    pub fn issued(&self) -> Option<&Instant> {
        self.issued.as_ref()
    }

    pub fn performer(&self) -> &[Reference] {
        &self.performer
    }

    /// Actual result
    pub fn value(&self) -> Option<&DataValue> {
        self.value.as_ref()
    }

    /// Why the result is missing
    pub fn data_absent_reason(&self) -> Option<&CodeableConcept> {
        self.data_absent_reason.as_ref()
    }

    pub fn interpretation(&self) -> &[CodeableConcept] {
        &self.interpretation
    }

    /// Related resource that belongs to the observation group
    pub fn has_member(&self) -> &[Reference] {
        &self.has_member
    }

    pub fn component(&self) -> &[ObservationComponent] {
        &self.component
    }
}

impl Hash for Observation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(Resource::hash_code(self));
    }
}

impl HasId for Observation {
    fn id(&self) -> Option<&str> {
        self.domain.resource.id.as_deref()
    }
}

impl HasExtensions for Observation {
    fn extension(&self) -> &[Extension] {
        &self.domain.extension
    }
}

impl HasModifierExtensions for Observation {
    fn modifier_extension(&self) -> &[Extension] {
        &self.domain.modifier_extension
    }
}

impl HasNarrative for Observation {
    fn text(&self) -> Option<&Narrative> {
        self.domain.text.as_ref()
    }
}

impl Resource for Observation {
    fn resource_fields(&self) -> &ResourceFields {
        &self.domain.resource
    }

    fn as_visitable(&self) -> &dyn Visitable {
        self
    }

    fn hash_code(&self) -> u64 {
        self.hash.get_or_compute(|| {
            hash_of(&(
                (
                    &self.domain,
                    &self.identifier,
                    &self.status,
                    &self.category,
                    &self.code,
                    &self.subject,
                    &self.encounter,
                    &self.effective,
                    &self.issued,
                    &self.performer,
                    &self.value,
                    &self.data_absent_reason,
                ),
                (
                    &self.interpretation,
                    &self.has_member,
                    &self.component,
                ),
            ))
        })
    }

    fn eq_dyn(&self, other: &dyn Resource) -> bool {
        resource_eq(self, other)
    }
}

impl DomainResource for Observation {
    fn domain_resource_fields(&self) -> &DomainResourceFields {
        &self.domain
    }
}

impl Constrained for Observation {
    const TYPE_NAME: &'static str = "Observation";
    const BASE: Option<&'static str> = Some("DomainResource");
    const CONSTRAINTS: &'static [Constraint] = OBSERVATION_CONSTRAINTS;
}

impl Visitable for Observation {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn fields(&self) -> &'static [FieldDescriptor] {
        OBSERVATION_FIELDS
    }

    fn walk<'a>(&'a self, walker: &mut Walker<'a, '_>) {
        self.domain.walk(walker);
        walker.elements(&OBSERVATION_FIELDS[8], &self.identifier);
        walker.element(&OBSERVATION_FIELDS[9], Some(&self.status));
        walker.elements(&OBSERVATION_FIELDS[10], &self.category);
        walker.element(&OBSERVATION_FIELDS[11], Some(&self.code));
        walker.element(&OBSERVATION_FIELDS[12], self.subject.as_ref());
        walker.element(&OBSERVATION_FIELDS[13], self.encounter.as_ref());
        walker.choice(&OBSERVATION_FIELDS[14], self.effective.as_ref());
        walker.element(&OBSERVATION_FIELDS[15], self.issued.as_ref());
        walker.elements(&OBSERVATION_FIELDS[16], &self.performer);
        walker.choice(&OBSERVATION_FIELDS[17], self.value.as_ref());
        walker.element(&OBSERVATION_FIELDS[18], self.data_absent_reason.as_ref());
        walker.elements(&OBSERVATION_FIELDS[19], &self.interpretation);
        walker.elements(&OBSERVATION_FIELDS[20], &self.has_member);
        walker.elements(&OBSERVATION_FIELDS[21], &self.component);
    }

    fn constraints(&self) -> &'static [Constraint] {
        OBSERVATION_CONSTRAINTS
    }
}

#[derive(Debug, Clone, Default)]
pub struct ObservationBuilder {
    domain: DomainResourceFields,
    identifier: Vec<Identifier>,
    status: Option<Code>,
    category: Vec<CodeableConcept>,
    code: Option<CodeableConcept>,
    subject: Option<Reference>,
    encounter: Option<Reference>,
    effective: Option<DataValue>,
    issued: Option<Instant>,
    performer: Vec<Reference>,
    value: Option<DataValue>,
    data_absent_reason: Option<CodeableConcept>,
    interpretation: Vec<CodeableConcept>,
    has_member: Vec<Reference>,
    component: Vec<ObservationComponent>,
}

impl ObservationBuilder {
    /// Append to `identifier`
    pub fn identifier(mut self, identifier: impl IntoIterator<Item = Identifier>) -> Self {
        extend_present(&mut self.identifier, identifier);
        self
    }

    /// Replace `identifier`
    pub fn set_identifier(mut self, identifier: impl IntoIterator<Item = Identifier>) -> Self {
        replace_present(&mut self.identifier, identifier);
        self
    }

    pub fn status(mut self, status: impl Into<Code>) -> Self {
        self.status = present(status.into());
        self
    }

    /// Append to `category`
    pub fn category(mut self, category: impl IntoIterator<Item = CodeableConcept>) -> Self {
        extend_present(&mut self.category, category);
        self
    }

    /// Replace `category`
    pub fn set_category(mut self, category: impl IntoIterator<Item = CodeableConcept>) -> Self {
        replace_present(&mut self.category, category);
        self
    }

    pub fn code(mut self, code: CodeableConcept) -> Self {
        self.code = present(code);
        self
    }

    pub fn subject(mut self, subject: Reference) -> Self {
        self.subject = present(subject);
        self
    }

    pub fn encounter(mut self, encounter: Reference) -> Self {
        self.encounter = present(encounter);
        self
    }

    pub fn effective(mut self, effective: impl Into<DataValue>) -> Self {
        let effective = effective.into();
        self.effective = (!effective.is_absent()).then_some(effective);
        self
    }

    pub fn issued(mut self, issued: impl Into<Instant>) -> Self {
        self.issued = present(issued.into());
        self
    }

    /// Append to `performer`
    pub fn performer(mut self, performer: impl IntoIterator<Item = Reference>) -> Self {
        extend_present(&mut self.performer, performer);
        self
    }

    /// Replace `performer`
    pub fn set_performer(mut self, performer: impl IntoIterator<Item = Reference>) -> Self {
        replace_present(&mut self.performer, performer);
        self
    }

    pub fn value(mut self, value: impl Into<DataValue>) -> Self {
        let value = value.into();
        self.value = (!value.is_absent()).then_some(value);
        self
    }

    pub fn data_absent_reason(mut self, data_absent_reason: CodeableConcept) -> Self {
        self.data_absent_reason = present(data_absent_reason);
        self
    }

    /// Append to `interpretation`
    pub fn interpretation(
        mut self,
        interpretation: impl IntoIterator<Item = CodeableConcept>,
    ) -> Self {
        extend_present(&mut self.interpretation, interpretation);
        self
    }

    /// Replace `interpretation`
    pub fn set_interpretation(
        mut self,
        interpretation: impl IntoIterator<Item = CodeableConcept>,
    ) -> Self {
        replace_present(&mut self.interpretation, interpretation);
        self
    }

    /// Append to `hasMember`
    pub fn has_member(mut self, has_member: impl IntoIterator<Item = Reference>) -> Self {
        extend_present(&mut self.has_member, has_member);
        self
    }

    /// Replace `hasMember`
    pub fn set_has_member(mut self, has_member: impl IntoIterator<Item = Reference>) -> Self {
        replace_present(&mut self.has_member, has_member);
        self
    }

    /// Append to `component`
    pub fn component(mut self, component: impl IntoIterator<Item = ObservationComponent>) -> Self {
        extend_present(&mut self.component, component);
        self
    }

    /// Replace `component`
    pub fn set_component(
        mut self,
        component: impl IntoIterator<Item = ObservationComponent>,
    ) -> Self {
        replace_present(&mut self.component, component);
        self
    }

    pub fn build(self) -> Result<Observation> {
        let observation = Observation {
            domain: self.domain,
            identifier: self.identifier,
            status: OBSERVATION_FIELDS[9].require(Observation::TYPE_NAME, self.status)?,
            category: self.category,
            code: OBSERVATION_FIELDS[11].require(Observation::TYPE_NAME, self.code)?,
            subject: self.subject,
            encounter: self.encounter,
            effective: OBSERVATION_FIELDS[14]
                .resolve_choice(Observation::TYPE_NAME, self.effective)?,
            issued: self.issued,
            performer: self.performer,
            value: OBSERVATION_FIELDS[17].resolve_choice(Observation::TYPE_NAME, self.value)?,
            data_absent_reason: self.data_absent_reason,
            interpretation: self.interpretation,
            has_member: self.has_member,
            component: self.component,
            hash: HashCache::new(),
        };
        observation.domain.resource.check_id(Observation::TYPE_NAME)?;
        check_primitives(&observation, Observation::TYPE_NAME)?;
        Ok(observation)
    }
}

impl ResourceBuilder for ObservationBuilder {
    fn resource_fields(&mut self) -> &mut ResourceFields {
        &mut self.domain.resource
    }
}

impl DomainResourceBuilder for ObservationBuilder {
    fn domain_resource_fields(&mut self) -> &mut DomainResourceFields {
        &mut self.domain
    }
}

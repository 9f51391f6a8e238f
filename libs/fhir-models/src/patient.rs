//! Patient

use std::any::Any;
use std::hash::{Hash, Hasher};

use ferrum_elements::choice::{DataType, DataValue};
use ferrum_elements::constraint::{Constrained, Constraint};
use ferrum_elements::datatypes::{
    CodeableConcept, HumanName, Identifier, Narrative, Period, Reference,
};
use ferrum_elements::descriptor::{Cardinality, FieldDescriptor, EXTENSION, ID, MODIFIER_EXTENSION};
use ferrum_elements::element::{
    extend_present, present, replace_present, BackboneElement, BackboneElementBuilder,
    BackboneFields, Element, ElementBuilder, ElementFields, HasExtensions, HasId,
    HasModifierExtensions, HasNarrative,
};
use ferrum_elements::error::Result;
use ferrum_elements::extension::Extension;
use ferrum_elements::hash::{hash_of, HashCache};
use ferrum_elements::primitive::{Boolean, Code, Date};
use ferrum_elements::resource::{
    resource_eq, DomainResource, DomainResourceBuilder, DomainResourceFields, Resource,
    ResourceBuilder, ResourceFields, CONTAINED, IMPLICIT_RULES, LANGUAGE, META, RESOURCE_ID, TEXT,
};
use ferrum_elements::visitor::{check_primitives, Visitable, Walker};

/// Permitted types of `Patient.deceased[x]`
pub const PATIENT_DECEASED: &[DataType] = &[DataType::Boolean, DataType::DateTime];

/// Permitted types of `Patient.multipleBirth[x]`
pub const PATIENT_MULTIPLE_BIRTH: &[DataType] = &[DataType::Boolean, DataType::Integer];

const CONTACT_CONSTRAINTS: &[Constraint] = &[Constraint::rule(
    "pat-1",
    "Patient.contact",
    "SHALL at least contain a contact's details or a reference to an organization",
    "name.exists() or telecom.exists() or address.exists() or organization.exists()",
)
.with_source("http://hl7.org/fhir/StructureDefinition/Patient")];

const PATIENT_CONTACT_FIELDS: &[FieldDescriptor] = &[
    ID,
    EXTENSION,
    MODIFIER_EXTENSION,
    FieldDescriptor::repeated("relationship", "CodeableConcept"),
    FieldDescriptor::optional("name", "HumanName"),
    FieldDescriptor::optional("gender", "code"),
    FieldDescriptor::optional("organization", "Reference"),
    FieldDescriptor::optional("period", "Period"),
];

/// A contact party (e.g. guardian, partner, friend) for the patient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientContact {
    backbone: BackboneFields,
    relationship: Vec<CodeableConcept>,
    name: Option<HumanName>,
    gender: Option<Code>,
    organization: Option<Reference>,
    period: Option<Period>,
    hash: HashCache,
}

impl PatientContact {
    pub fn builder() -> PatientContactBuilder {
        PatientContactBuilder::default()
    }

    pub fn to_builder(&self) -> PatientContactBuilder {
        PatientContactBuilder {
            backbone: self.backbone.clone(),
            relationship: self.relationship.clone(),
            name: self.name.clone(),
            gender: self.gender.clone(),
            organization: self.organization.clone(),
            period: self.period.clone(),
        }
    }

    pub fn relationship(&self) -> &[CodeableConcept] {
        &self.relationship
    }

    pub fn name(&self) -> Option<&HumanName> {
        self.name.as_ref()
    }

    /// male | female | other | unknown
    pub fn gender(&self) -> Option<&Code> {
        self.gender.as_ref()
    }

    /// Organization that is associated with the contact
    pub fn organization(&self) -> Option<&Reference> {
        self.organization.as_ref()
    }

    pub fn period(&self) -> Option<&Period> {
        self.period.as_ref()
    }

    pub fn hash_code(&self) -> u64 {
        self.hash.get_or_compute(|| {
            hash_of(&(
                &self.backbone,
                &self.relationship,
                &self.name,
                &self.gender,
                &self.organization,
                &self.period,
            ))
        })
    }
}

impl Hash for PatientContact {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl HasId for PatientContact {
    fn id(&self) -> Option<&str> {
        self.backbone.element.id()
    }
}

impl HasExtensions for PatientContact {
    fn extension(&self) -> &[Extension] {
        &self.backbone.element.extension
    }
}

impl HasModifierExtensions for PatientContact {
    fn modifier_extension(&self) -> &[Extension] {
        &self.backbone.modifier_extension
    }
}

impl Element for PatientContact {
    fn has_children(&self) -> bool {
        !self.backbone.modifier_extension.is_empty()
            || !self.relationship.is_empty()
            || self.name.is_some()
            || self.gender.is_some()
            || self.organization.is_some()
            || self.period.is_some()
    }
}

impl BackboneElement for PatientContact {}

impl Constrained for PatientContact {
    const TYPE_NAME: &'static str = "Patient.contact";
    const BASE: Option<&'static str> = Some("BackboneElement");
    const CONSTRAINTS: &'static [Constraint] = CONTACT_CONSTRAINTS;
}

impl Visitable for PatientContact {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn fields(&self) -> &'static [FieldDescriptor] {
        PATIENT_CONTACT_FIELDS
    }

    fn walk<'a>(&'a self, walker: &mut Walker<'a, '_>) {
        self.backbone.walk(walker);
        walker.elements(&PATIENT_CONTACT_FIELDS[3], &self.relationship);
        walker.element(&PATIENT_CONTACT_FIELDS[4], self.name.as_ref());
        walker.element(&PATIENT_CONTACT_FIELDS[5], self.gender.as_ref());
        walker.element(&PATIENT_CONTACT_FIELDS[6], self.organization.as_ref());
        walker.element(&PATIENT_CONTACT_FIELDS[7], self.period.as_ref());
    }

    fn constraints(&self) -> &'static [Constraint] {
        CONTACT_CONSTRAINTS
    }
}

#[derive(Debug, Clone, Default)]
pub struct PatientContactBuilder {
    backbone: BackboneFields,
    relationship: Vec<CodeableConcept>,
    name: Option<HumanName>,
    gender: Option<Code>,
    organization: Option<Reference>,
    period: Option<Period>,
}

impl PatientContactBuilder {
    /// Append to `relationship`
    pub fn relationship(mut self, relationship: impl IntoIterator<Item = CodeableConcept>) -> Self {
        extend_present(&mut self.relationship, relationship);
        self
    }

    /// Replace `relationship`
    pub fn set_relationship(
        mut self,
        relationship: impl IntoIterator<Item = CodeableConcept>,
    ) -> Self {
        replace_present(&mut self.relationship, relationship);
        self
    }

    pub fn name(mut self, name: HumanName) -> Self {
        self.name = present(name);
        self
    }

    pub fn gender(mut self, gender: impl Into<Code>) -> Self {
        self.gender = present(gender.into());
        self
    }

    pub fn organization(mut self, organization: Reference) -> Self {
        self.organization = present(organization);
        self
    }

    pub fn period(mut self, period: Period) -> Self {
        self.period = present(period);
        self
    }

    pub fn build(self) -> Result<PatientContact> {
        let contact = PatientContact {
            backbone: self.backbone,
            relationship: self.relationship,
            name: self.name,
            gender: self.gender,
            organization: self.organization,
            period: self.period,
            hash: HashCache::new(),
        };
        check_primitives(&contact, PatientContact::TYPE_NAME)?;
        Ok(contact)
    }
}

impl ElementBuilder for PatientContactBuilder {
    fn element_fields(&mut self) -> &mut ElementFields {
        &mut self.backbone.element
    }
}

impl BackboneElementBuilder for PatientContactBuilder {
    fn backbone_fields(&mut self) -> &mut BackboneFields {
        &mut self.backbone
    }
}

const PATIENT_LINK_FIELDS: &[FieldDescriptor] = &[
    ID,
    EXTENSION,
    MODIFIER_EXTENSION,
    FieldDescriptor::required("other", "Reference"),
    FieldDescriptor::required("type", "code"),
];

/// Link to another patient resource that concerns the same actual person
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientLink {
    backbone: BackboneFields,
    other: Reference,
    type_: Code,
    hash: HashCache,
}

impl PatientLink {
    pub fn builder(other: Reference, type_: impl Into<Code>) -> PatientLinkBuilder {
        PatientLinkBuilder::default()
            .other(other)
            .type_(type_)
    }

    pub fn to_builder(&self) -> PatientLinkBuilder {
        PatientLinkBuilder {
            backbone: self.backbone.clone(),
            other: Some(self.other.clone()),
            type_: Some(self.type_.clone()),
        }
    }

    /// The other patient or related person resource
    pub fn other(&self) -> &Reference {
        &self.other
    }

    /// replaced-by | replaces | refer | seealso
    pub fn type_(&self) -> &Code {
        &self.type_
    }

    pub fn hash_code(&self) -> u64 {
        self.hash.get_or_compute(|| hash_of(&(&self.backbone, &self.other, &self.type_)))
    }
}

impl Hash for PatientLink {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl HasId for PatientLink {
    fn id(&self) -> Option<&str> {
        self.backbone.element.id()
    }
}

impl HasExtensions for PatientLink {
    fn extension(&self) -> &[Extension] {
        &self.backbone.element.extension
    }
}

impl HasModifierExtensions for PatientLink {
    fn modifier_extension(&self) -> &[Extension] {
        &self.backbone.modifier_extension
    }
}

impl Element for PatientLink {
    fn has_children(&self) -> bool {
        true
    }
}

impl BackboneElement for PatientLink {}

impl Constrained for PatientLink {
    const TYPE_NAME: &'static str = "Patient.link";
    const BASE: Option<&'static str> = Some("BackboneElement");
    const CONSTRAINTS: &'static [Constraint] = &[];
}

impl Visitable for PatientLink {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn fields(&self) -> &'static [FieldDescriptor] {
        PATIENT_LINK_FIELDS
    }

    fn walk<'a>(&'a self, walker: &mut Walker<'a, '_>) {
        self.backbone.walk(walker);
        walker.element(&PATIENT_LINK_FIELDS[3], Some(&self.other));
        walker.element(&PATIENT_LINK_FIELDS[4], Some(&self.type_));
    }
}

#[derive(Debug, Clone, Default)]
pub struct PatientLinkBuilder {
    backbone: BackboneFields,
    other: Option<Reference>,
    type_: Option<Code>,
}

impl PatientLinkBuilder {
    pub fn other(mut self, other: Reference) -> Self {
        self.other = present(other);
        self
    }

    pub fn type_(mut self, type_: impl Into<Code>) -> Self {
        self.type_ = present(type_.into());
        self
    }

    pub fn build(self) -> Result<PatientLink> {
        let link = PatientLink {
            backbone: self.backbone,
            other: PATIENT_LINK_FIELDS[3].require(PatientLink::TYPE_NAME, self.other)?,
            type_: PATIENT_LINK_FIELDS[4].require(PatientLink::TYPE_NAME, self.type_)?,
            hash: HashCache::new(),
        };
        check_primitives(&link, PatientLink::TYPE_NAME)?;
        Ok(link)
    }
}

impl ElementBuilder for PatientLinkBuilder {
    fn element_fields(&mut self) -> &mut ElementFields {
        &mut self.backbone.element
    }
}

impl BackboneElementBuilder for PatientLinkBuilder {
    fn backbone_fields(&mut self) -> &mut BackboneFields {
        &mut self.backbone
    }
}

const PATIENT_FIELDS: &[FieldDescriptor] = &[
    RESOURCE_ID,
    META,
    IMPLICIT_RULES,
    LANGUAGE,
    TEXT,
    CONTAINED,
    EXTENSION,
    MODIFIER_EXTENSION,
    FieldDescriptor::repeated("identifier", "Identifier"),
    FieldDescriptor::optional("active", "boolean"),
    FieldDescriptor::repeated("name", "HumanName"),
    FieldDescriptor::optional("gender", "code"),
    FieldDescriptor::optional("birthDate", "date"),
    FieldDescriptor::choice("deceased", Cardinality::OPTIONAL, PATIENT_DECEASED),
    FieldDescriptor::choice("multipleBirth", Cardinality::OPTIONAL, PATIENT_MULTIPLE_BIRTH),
    FieldDescriptor::repeated("contact", "Patient.contact"),
    FieldDescriptor::optional("managingOrganization", "Reference"),
    FieldDescriptor::repeated("link", "Patient.link"),
];

/// Demographics and other administrative information about an individual
/// receiving care
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patient {
    domain: DomainResourceFields,
    identifier: Vec<Identifier>,
    active: Option<Boolean>,
    name: Vec<HumanName>,
    gender: Option<Code>,
    birth_date: Option<Date>,
    deceased: Option<DataValue>,
    multiple_birth: Option<DataValue>,
    contact: Vec<PatientContact>,
    managing_organization: Option<Reference>,
    link: Vec<PatientLink>,
    hash: HashCache,
}

impl Patient {
    pub fn builder() -> PatientBuilder {
        PatientBuilder::default()
    }

    pub fn to_builder(&self) -> PatientBuilder {
        PatientBuilder {
            domain: self.domain.clone(),
            identifier: self.identifier.clone(),
            active: self.active.clone(),
            name: self.name.clone(),
            gender: self.gender.clone(),
            birth_date: self.birth_date.clone(),
            deceased: self.deceased.clone(),
            multiple_birth: self.multiple_birth.clone(),
            contact: self.contact.clone(),
            managing_organization: self.managing_organization.clone(),
            link: self.link.clone(),
        }
    }

    /// An identifier for this patient
    pub fn identifier(&self) -> &[Identifier] {
        &self.identifier
    }

    /// Whether this patient's record is in active use
    pub fn active(&self) -> Option<&Boolean> {
        self.active.as_ref()
    }

    pub fn name(&self) -> &[HumanName] {
        &self.name
    }

    /// male | female | other | unknown
    pub fn gender(&self) -> Option<&Code> {
        self.gender.as_ref()
    }

    pub fn birth_date(&self) -> Option<&Date> {
        self.birth_date.as_ref()
    }

    /// Indicates if the individual is deceased or not
    pub fn deceased(&self) -> Option<&DataValue> {
        self.deceased.as_ref()
    }

    /// Whether patient is part of a multiple birth
    pub fn multiple_birth(&self) -> Option<&DataValue> {
        self.multiple_birth.as_ref()
    }

    pub fn contact(&self) -> &[PatientContact] {
        &self.contact
    }

    /// Organization that is the custodian of the patient record
    pub fn managing_organization(&self) -> Option<&Reference> {
        self.managing_organization.as_ref()
    }

    pub fn link(&self) -> &[PatientLink] {
        &self.link
    }
}

impl Hash for Patient {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(Resource::hash_code(self));
    }
}

impl HasId for Patient {
    fn id(&self) -> Option<&str> {
        self.domain.resource.id.as_deref()
    }
}

impl HasExtensions for Patient {
    fn extension(&self) -> &[Extension] {
        &self.domain.extension
    }
}

impl HasModifierExtensions for Patient {
    fn modifier_extension(&self) -> &[Extension] {
        &self.domain.modifier_extension
    }
}

impl HasNarrative for Patient {
    fn text(&self) -> Option<&Narrative> {
        self.domain.text.as_ref()
    }
}

impl Resource for Patient {
    fn resource_fields(&self) -> &ResourceFields {
        &self.domain.resource
    }

    fn as_visitable(&self) -> &dyn Visitable {
        self
    }

    fn hash_code(&self) -> u64 {
        self.hash.get_or_compute(|| {
            hash_of(&(
                &self.domain,
                &self.identifier,
                &self.active,
                &self.name,
                &self.gender,
                &self.birth_date,
                &self.deceased,
                &self.multiple_birth,
                &self.contact,
                &self.managing_organization,
                &self.link,
            ))
        })
    }

    fn eq_dyn(&self, other: &dyn Resource) -> bool {
        resource_eq(self, other)
    }
}

impl DomainResource for Patient {
    fn domain_resource_fields(&self) -> &DomainResourceFields {
        &self.domain
    }
}

impl Constrained for Patient {
    const TYPE_NAME: &'static str = "Patient";
    const BASE: Option<&'static str> = Some("DomainResource");
    const CONSTRAINTS: &'static [Constraint] = &[];
}

impl Visitable for Patient {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn fields(&self) -> &'static [FieldDescriptor] {
        PATIENT_FIELDS
    }

    fn walk<'a>(&'a self, walker: &mut Walker<'a, '_>) {
        self.domain.walk(walker);
        walker.elements(&PATIENT_FIELDS[8], &self.identifier);
        walker.element(&PATIENT_FIELDS[9], self.active.as_ref());
        walker.elements(&PATIENT_FIELDS[10], &self.name);
        walker.element(&PATIENT_FIELDS[11], self.gender.as_ref());
        walker.element(&PATIENT_FIELDS[12], self.birth_date.as_ref());
        walker.choice(&PATIENT_FIELDS[13], self.deceased.as_ref());
        walker.choice(&PATIENT_FIELDS[14], self.multiple_birth.as_ref());
        walker.elements(&PATIENT_FIELDS[15], &self.contact);
        walker.element(&PATIENT_FIELDS[16], self.managing_organization.as_ref());
        walker.elements(&PATIENT_FIELDS[17], &self.link);
    }
}

#[derive(Debug, Clone, Default)]
pub struct PatientBuilder {
    domain: DomainResourceFields,
    identifier: Vec<Identifier>,
    active: Option<Boolean>,
    name: Vec<HumanName>,
    gender: Option<Code>,
    birth_date: Option<Date>,
    deceased: Option<DataValue>,
    multiple_birth: Option<DataValue>,
    contact: Vec<PatientContact>,
    managing_organization: Option<Reference>,
    link: Vec<PatientLink>,
}

impl PatientBuilder {
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

    pub fn active(mut self, active: impl Into<Boolean>) -> Self {
        self.active = present(active.into());
        self
    }

    /// Append to `name`
    pub fn name(mut self, name: impl IntoIterator<Item = HumanName>) -> Self {
        extend_present(&mut self.name, name);
        self
    }

    /// Replace `name`
    pub fn set_name(mut self, name: impl IntoIterator<Item = HumanName>) -> Self {
        replace_present(&mut self.name, name);
        self
    }

    pub fn gender(mut self, gender: impl Into<Code>) -> Self {
        self.gender = present(gender.into());
        self
    }

    pub fn birth_date(mut self, birth_date: impl Into<Date>) -> Self {
        self.birth_date = present(birth_date.into());
        self
    }

    pub fn deceased(mut self, deceased: impl Into<DataValue>) -> Self {
        let deceased = deceased.into();
        self.deceased = (!deceased.is_absent()).then_some(deceased);
        self
    }

    pub fn multiple_birth(mut self, multiple_birth: impl Into<DataValue>) -> Self {
        let multiple_birth = multiple_birth.into();
        self.multiple_birth = (!multiple_birth.is_absent()).then_some(multiple_birth);
        self
    }

    /// Append to `contact`
    pub fn contact(mut self, contact: impl IntoIterator<Item = PatientContact>) -> Self {
        extend_present(&mut self.contact, contact);
        self
    }

    /// Replace `contact`
    pub fn set_contact(mut self, contact: impl IntoIterator<Item = PatientContact>) -> Self {
        replace_present(&mut self.contact, contact);
        self
    }

    pub fn managing_organization(mut self, managing_organization: Reference) -> Self {
        self.managing_organization = present(managing_organization);
        self
    }

    /// Append to `link`
    pub fn link(mut self, link: impl IntoIterator<Item = PatientLink>) -> Self {
        extend_present(&mut self.link, link);
        self
    }

    /// Replace `link`
    pub fn set_link(mut self, link: impl IntoIterator<Item = PatientLink>) -> Self {
        replace_present(&mut self.link, link);
        self
    }

    pub fn build(self) -> Result<Patient> {
        let patient = Patient {
            domain: self.domain,
            identifier: self.identifier,
            active: self.active,
            name: self.name,
            gender: self.gender,
            birth_date: self.birth_date,
            deceased: PATIENT_FIELDS[13].resolve_choice(Patient::TYPE_NAME, self.deceased)?,
            multiple_birth: PATIENT_FIELDS[14]
                .resolve_choice(Patient::TYPE_NAME, self.multiple_birth)?,
            contact: self.contact,
            managing_organization: self.managing_organization,
            link: self.link,
            hash: HashCache::new(),
        };
        patient.domain.resource.check_id(Patient::TYPE_NAME)?;
        check_primitives(&patient, Patient::TYPE_NAME)?;
        Ok(patient)
    }
}

impl ResourceBuilder for PatientBuilder {
    fn resource_fields(&mut self) -> &mut ResourceFields {
        &mut self.domain.resource
    }
}

impl DomainResourceBuilder for PatientBuilder {
    fn domain_resource_fields(&mut self) -> &mut DomainResourceFields {
        &mut self.domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrum_elements::error::Error;
    use ferrum_elements::primitive::{DateTime, FhirString};

    #[test]
    fn deceased_accepts_each_alternative() {
        let by_flag = Patient::builder().deceased(Boolean::from(true)).build().unwrap();
        assert_eq!(
            by_flag.deceased().map(DataValue::data_type),
            Some(DataType::Boolean)
        );

        let by_date = Patient::builder()
            .deceased(DateTime::from("2024-03-01T10:00:00Z"))
            .build()
            .unwrap();
        assert!(by_date.deceased().and_then(|d| d.get::<DateTime>()).is_some());
    }

    #[test]
    fn multiple_birth_rejects_string() {
        let err = Patient::builder()
            .multiple_birth(FhirString::from("twin"))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ChoiceTypeViolation {
                field: "multipleBirth",
                actual: "string",
                ..
            }
        ));
    }

    #[test]
    fn link_requires_other_and_type() {
        let other = Reference::builder().reference("Patient/2").build().unwrap();
        let err = PatientLinkBuilder::default().other(other.clone()).build().unwrap_err();
        assert!(matches!(err, Error::RequiredFieldMissing { field: "type", .. }));

        let link = PatientLink::builder(other, "seealso").build().unwrap();
        assert_eq!(link.type_().as_str(), Some("seealso"));
    }

    #[test]
    fn invalid_birth_date_is_rejected() {
        let err = Patient::builder().birth_date("1980-02-31x").build().unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidPrimitiveValue {
                type_name: "Patient",
                ..
            }
        ));
        assert_eq!(err.field(), Some("birthDate"));
    }
}

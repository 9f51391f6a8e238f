//! Composition
//!
//! The basic structure of a document: a header with a tree of sections.

use std::any::Any;
use std::hash::{Hash, Hasher};

use ferrum_elements::constraint::{Constrained, Constraint};
use ferrum_elements::datatypes::{CodeableConcept, Identifier, Narrative, Reference};
use ferrum_elements::descriptor::{FieldDescriptor, EXTENSION, ID, MODIFIER_EXTENSION};
use ferrum_elements::element::{
    extend_present, present, replace_present, BackboneElement, BackboneElementBuilder,
    BackboneFields, Element, ElementBuilder, ElementFields, HasExtensions, HasId,
    HasModifierExtensions, HasNarrative,
};
use ferrum_elements::error::Result;
use ferrum_elements::extension::Extension;
use ferrum_elements::hash::{hash_of, HashCache};
use ferrum_elements::primitive::{Code, DateTime, FhirString};
use ferrum_elements::resource::{
    resource_eq, DomainResource, DomainResourceBuilder, DomainResourceFields, Resource,
    ResourceBuilder, ResourceFields, CONTAINED, IMPLICIT_RULES, LANGUAGE, META, RESOURCE_ID, TEXT,
};
use ferrum_elements::visitor::{check_primitives, Visitable, Walker};

const COMPOSITION_SOURCE: &str = "http://hl7.org/fhir/StructureDefinition/Composition";

const SECTION_CONSTRAINTS: &[Constraint] = &[
    Constraint::rule(
        "cmp-1",
        "Composition.section",
        "A section must contain at least one of text, entries, or sub-sections",
        "text.exists() or entry.exists() or section.exists()",
    )
    .with_source(COMPOSITION_SOURCE),
    Constraint::rule(
        "cmp-2",
        "Composition.section",
        "A section can only have an emptyReason if it is empty",
        "emptyReason.empty() or entry.empty()",
    )
    .with_source(COMPOSITION_SOURCE),
];

const COMPOSITION_ATTESTER_FIELDS: &[FieldDescriptor] = &[
    ID,
    EXTENSION,
    MODIFIER_EXTENSION,
    FieldDescriptor::required("mode", "code"),
    FieldDescriptor::optional("time", "dateTime"),
    FieldDescriptor::optional("party", "Reference"),
];

/// Attests to the accuracy of the composition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositionAttester {
    backbone: BackboneFields,
    mode: Code,
    time: Option<DateTime>,
    party: Option<Reference>,
    hash: HashCache,
}

impl CompositionAttester {
    pub fn builder(mode: impl Into<Code>) -> CompositionAttesterBuilder {
        CompositionAttesterBuilder::default().mode(mode)
    }

    pub fn to_builder(&self) -> CompositionAttesterBuilder {
        CompositionAttesterBuilder {
            backbone: self.backbone.clone(),
            mode: Some(self.mode.clone()),
            time: self.time.clone(),
            party: self.party.clone(),
        }
    }

    /// personal | professional | legal | official
    pub fn mode(&self) -> &Code {
        &self.mode
    }

    pub fn time(&self) -> Option<&DateTime> {
        self.time.as_ref()
    }

    pub fn party(&self) -> Option<&Reference> {
        self.party.as_ref()
    }

    pub fn hash_code(&self) -> u64 {
        self.hash.get_or_compute(|| hash_of(&(&self.backbone, &self.mode, &self.time, &self.party)))
    }
}

impl Hash for CompositionAttester {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl HasId for CompositionAttester {
    fn id(&self) -> Option<&str> {
        self.backbone.element.id()
    }
}

impl HasExtensions for CompositionAttester {
    fn extension(&self) -> &[Extension] {
        &self.backbone.element.extension
    }
}

impl HasModifierExtensions for CompositionAttester {
    fn modifier_extension(&self) -> &[Extension] {
        &self.backbone.modifier_extension
    }
}

impl Element for CompositionAttester {
    fn has_children(&self) -> bool {
        true
    }
}

impl BackboneElement for CompositionAttester {}

impl Constrained for CompositionAttester {
    const TYPE_NAME: &'static str = "Composition.attester";
    const BASE: Option<&'static str> = Some("BackboneElement");
    const CONSTRAINTS: &'static [Constraint] = &[];
}

impl Visitable for CompositionAttester {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn fields(&self) -> &'static [FieldDescriptor] {
        COMPOSITION_ATTESTER_FIELDS
    }

    fn walk<'a>(&'a self, walker: &mut Walker<'a, '_>) {
        self.backbone.walk(walker);
        walker.element(&COMPOSITION_ATTESTER_FIELDS[3], Some(&self.mode));
        walker.element(&COMPOSITION_ATTESTER_FIELDS[4], self.time.as_ref());
        walker.element(&COMPOSITION_ATTESTER_FIELDS[5], self.party.as_ref());
    }
}

#[derive(Debug, Clone, Default)]
pub struct CompositionAttesterBuilder {
    backbone: BackboneFields,
    mode: Option<Code>,
    time: Option<DateTime>,
    party: Option<Reference>,
}

impl CompositionAttesterBuilder {
    pub fn mode(mut self, mode: impl Into<Code>) -> Self {
        self.mode = present(mode.into());
        self
    }

    pub fn time(mut self, time: impl Into<DateTime>) -> Self {
        self.time = present(time.into());
        self
    }

    pub fn party(mut self, party: Reference) -> Self {
        self.party = present(party);
        self
    }

    pub fn build(self) -> Result<CompositionAttester> {
        let attester = CompositionAttester {
            backbone: self.backbone,
            mode: COMPOSITION_ATTESTER_FIELDS[3]
                .require(CompositionAttester::TYPE_NAME, self.mode)?,
            time: self.time,
            party: self.party,
            hash: HashCache::new(),
        };
        check_primitives(&attester, CompositionAttester::TYPE_NAME)?;
        Ok(attester)
    }
}

impl ElementBuilder for CompositionAttesterBuilder {
    fn element_fields(&mut self) -> &mut ElementFields {
        &mut self.backbone.element
    }
}

impl BackboneElementBuilder for CompositionAttesterBuilder {
    fn backbone_fields(&mut self) -> &mut BackboneFields {
        &mut self.backbone
    }
}

const COMPOSITION_SECTION_FIELDS: &[FieldDescriptor] = &[
    ID,
    EXTENSION,
    MODIFIER_EXTENSION,
    FieldDescriptor::optional("title", "string"),
    FieldDescriptor::optional("code", "CodeableConcept"),
    FieldDescriptor::repeated("author", "Reference"),
    FieldDescriptor::optional("focus", "Reference"),
    FieldDescriptor::optional("text", "Narrative"),
    FieldDescriptor::optional("mode", "code"),
    FieldDescriptor::optional("orderedBy", "CodeableConcept"),
    FieldDescriptor::repeated("entry", "Reference"),
    FieldDescriptor::optional("emptyReason", "CodeableConcept"),
    FieldDescriptor::repeated("section", "Composition.section"),
];

/// A section of a composition
///
/// Sections nest: a section may hold further sections, built innermost
/// first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositionSection {
    backbone: BackboneFields,
    title: Option<FhirString>,
    code: Option<CodeableConcept>,
    author: Vec<Reference>,
    focus: Option<Reference>,
    text: Option<Narrative>,
    mode: Option<Code>,
    ordered_by: Option<CodeableConcept>,
    entry: Vec<Reference>,
    empty_reason: Option<CodeableConcept>,
    section: Vec<CompositionSection>,
    hash: HashCache,
}

impl CompositionSection {
    pub fn builder() -> CompositionSectionBuilder {
        CompositionSectionBuilder::default()
    }

    pub fn to_builder(&self) -> CompositionSectionBuilder {
        CompositionSectionBuilder {
            backbone: self.backbone.clone(),
            title: self.title.clone(),
            code: self.code.clone(),
            author: self.author.clone(),
            focus: self.focus.clone(),
            text: self.text.clone(),
            mode: self.mode.clone(),
            ordered_by: self.ordered_by.clone(),
            entry: self.entry.clone(),
            empty_reason: self.empty_reason.clone(),
            section: self.section.clone(),
        }
    }

    /// Label for section (e.g. for ToC)
    pub fn title(&self) -> Option<&FhirString> {
        self.title.as_ref()
    }

    pub fn code(&self) -> Option<&CodeableConcept> {
        self.code.as_ref()
    }

    pub fn author(&self) -> &[Reference] {
        &self.author
    }

    pub fn focus(&self) -> Option<&Reference> {
        self.focus.as_ref()
    }

    /// Text summary of the section, for human interpretation
    pub fn text(&self) -> Option<&Narrative> {
        self.text.as_ref()
    }

    /// working | snapshot | changes
    pub fn mode(&self) -> Option<&Code> {
        self.mode.as_ref()
    }

    pub fn ordered_by(&self) -> Option<&CodeableConcept> {
        self.ordered_by.as_ref()
    }

    /// A reference to data that supports this section
    pub fn entry(&self) -> &[Reference] {
        &self.entry
    }

    pub fn empty_reason(&self) -> Option<&CodeableConcept> {
        self.empty_reason.as_ref()
    }

    /// Nested sections
    pub fn section(&self) -> &[CompositionSection] {
        &self.section
    }

    /// Depth of the deepest section chain below and including this one
    pub fn depth(&self) -> usize {
        1 + self.section.iter().map(Self::depth).max().unwrap_or(0)
    }

    pub fn hash_code(&self) -> u64 {
        self.hash.get_or_compute(|| {
            hash_of(&(
                &self.backbone,
                &self.title,
                &self.code,
                &self.author,
                &self.focus,
                &self.text,
                &self.mode,
                &self.ordered_by,
                &self.entry,
                &self.empty_reason,
                &self.section,
            ))
        })
    }
}

impl Hash for CompositionSection {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl HasId for CompositionSection {
    fn id(&self) -> Option<&str> {
        self.backbone.element.id()
    }
}

impl HasExtensions for CompositionSection {
    fn extension(&self) -> &[Extension] {
        &self.backbone.element.extension
    }
}

impl HasModifierExtensions for CompositionSection {
    fn modifier_extension(&self) -> &[Extension] {
        &self.backbone.modifier_extension
    }
}

impl Element for CompositionSection {
    fn has_children(&self) -> bool {
        !self.backbone.modifier_extension.is_empty()
            || self.title.is_some()
            || self.code.is_some()
            || !self.author.is_empty()
            || self.focus.is_some()
            || self.text.is_some()
            || self.mode.is_some()
            || self.ordered_by.is_some()
            || !self.entry.is_empty()
            || self.empty_reason.is_some()
            || !self.section.is_empty()
    }
}

impl BackboneElement for CompositionSection {}

impl Constrained for CompositionSection {
    const TYPE_NAME: &'static str = "Composition.section";
    const BASE: Option<&'static str> = Some("BackboneElement");
    const CONSTRAINTS: &'static [Constraint] = SECTION_CONSTRAINTS;
}

impl Visitable for CompositionSection {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn fields(&self) -> &'static [FieldDescriptor] {
        COMPOSITION_SECTION_FIELDS
    }

    fn walk<'a>(&'a self, walker: &mut Walker<'a, '_>) {
        self.backbone.walk(walker);
        walker.element(&COMPOSITION_SECTION_FIELDS[3], self.title.as_ref());
        walker.element(&COMPOSITION_SECTION_FIELDS[4], self.code.as_ref());
        walker.elements(&COMPOSITION_SECTION_FIELDS[5], &self.author);
        walker.element(&COMPOSITION_SECTION_FIELDS[6], self.focus.as_ref());
        walker.element(&COMPOSITION_SECTION_FIELDS[7], self.text.as_ref());
        walker.element(&COMPOSITION_SECTION_FIELDS[8], self.mode.as_ref());
        walker.element(&COMPOSITION_SECTION_FIELDS[9], self.ordered_by.as_ref());
        walker.elements(&COMPOSITION_SECTION_FIELDS[10], &self.entry);
        walker.element(&COMPOSITION_SECTION_FIELDS[11], self.empty_reason.as_ref());
        walker.elements(&COMPOSITION_SECTION_FIELDS[12], &self.section);
    }

    fn constraints(&self) -> &'static [Constraint] {
        SECTION_CONSTRAINTS
    }
}

#[derive(Debug, Clone, Default)]
pub struct CompositionSectionBuilder {
    backbone: BackboneFields,
    title: Option<FhirString>,
    code: Option<CodeableConcept>,
    author: Vec<Reference>,
    focus: Option<Reference>,
    text: Option<Narrative>,
    mode: Option<Code>,
    ordered_by: Option<CodeableConcept>,
    entry: Vec<Reference>,
    empty_reason: Option<CodeableConcept>,
    section: Vec<CompositionSection>,
}

impl CompositionSectionBuilder {
    pub fn title(mut self, title: impl Into<FhirString>) -> Self {
        self.title = present(title.into());
        self
    }

    pub fn code(mut self, code: CodeableConcept) -> Self {
        self.code = present(code);
        self
    }

    /// Append to `author`
    pub fn author(mut self, author: impl IntoIterator<Item = Reference>) -> Self {
        extend_present(&mut self.author, author);
        self
    }

    /// Replace `author`
    pub fn set_author(mut self, author: impl IntoIterator<Item = Reference>) -> Self {
        replace_present(&mut self.author, author);
        self
    }

    pub fn focus(mut self, focus: Reference) -> Self {
        self.focus = present(focus);
        self
    }

    pub fn text(mut self, text: Narrative) -> Self {
        self.text = present(text);
        self
    }

    pub fn mode(mut self, mode: impl Into<Code>) -> Self {
        self.mode = present(mode.into());
        self
    }

    pub fn ordered_by(mut self, ordered_by: CodeableConcept) -> Self {
        self.ordered_by = present(ordered_by);
        self
    }

    /// Append to `entry`
    pub fn entry(mut self, entry: impl IntoIterator<Item = Reference>) -> Self {
        extend_present(&mut self.entry, entry);
        self
    }

    /// Replace `entry`
    pub fn set_entry(mut self, entry: impl IntoIterator<Item = Reference>) -> Self {
        replace_present(&mut self.entry, entry);
        self
    }

    pub fn empty_reason(mut self, empty_reason: CodeableConcept) -> Self {
        self.empty_reason = present(empty_reason);
        self
    }

    /// Append to `section`
    pub fn section(mut self, section: impl IntoIterator<Item = CompositionSection>) -> Self {
        extend_present(&mut self.section, section);
        self
    }

    /// Replace `section`
    pub fn set_section(mut self, section: impl IntoIterator<Item = CompositionSection>) -> Self {
        replace_present(&mut self.section, section);
        self
    }

    pub fn build(self) -> Result<CompositionSection> {
        let section = CompositionSection {
            backbone: self.backbone,
            title: self.title,
            code: self.code,
            author: self.author,
            focus: self.focus,
            text: self.text,
            mode: self.mode,
            ordered_by: self.ordered_by,
            entry: self.entry,
            empty_reason: self.empty_reason,
            section: self.section,
            hash: HashCache::new(),
        };
        check_primitives(&section, CompositionSection::TYPE_NAME)?;
        Ok(section)
    }
}

impl ElementBuilder for CompositionSectionBuilder {
    fn element_fields(&mut self) -> &mut ElementFields {
        &mut self.backbone.element
    }
}

impl BackboneElementBuilder for CompositionSectionBuilder {
    fn backbone_fields(&mut self) -> &mut BackboneFields {
        &mut self.backbone
    }
}

const COMPOSITION_FIELDS: &[FieldDescriptor] = &[
    RESOURCE_ID,
    META,
    IMPLICIT_RULES,
    LANGUAGE,
    TEXT,
    CONTAINED,
    EXTENSION,
    MODIFIER_EXTENSION,
    FieldDescriptor::optional("identifier", "Identifier"),
    FieldDescriptor::required("status", "code"),
    FieldDescriptor::required("type", "CodeableConcept"),
    FieldDescriptor::repeated("category", "CodeableConcept"),
    FieldDescriptor::optional("subject", "Reference"),
    FieldDescriptor::optional("encounter", "Reference"),
    FieldDescriptor::required("date", "dateTime"),
    FieldDescriptor::at_least_one("author", "Reference"),
    FieldDescriptor::required("title", "string"),
    FieldDescriptor::optional("confidentiality", "code"),
    FieldDescriptor::repeated("attester", "Composition.attester"),
    FieldDescriptor::optional("custodian", "Reference"),
    FieldDescriptor::repeated("section", "Composition.section"),
];

/// A set of healthcare-related information assembled into a single
/// logical document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composition {
    domain: DomainResourceFields,
    identifier: Option<Identifier>,
    status: Code,
    type_: CodeableConcept,
    category: Vec<CodeableConcept>,
    subject: Option<Reference>,
    encounter: Option<Reference>,
    date: DateTime,
    author: Vec<Reference>,
    title: FhirString,
    confidentiality: Option<Code>,
    attester: Vec<CompositionAttester>,
    custodian: Option<Reference>,
    section: Vec<CompositionSection>,
    hash: HashCache,
}

impl Composition {
    pub fn builder(
        status: impl Into<Code>,
        type_: CodeableConcept,
        date: impl Into<DateTime>,
        author: impl IntoIterator<Item = Reference>,
        title: impl Into<FhirString>,
    ) -> CompositionBuilder {
        CompositionBuilder::default()
            .status(status)
            .type_(type_)
            .date(date)
            .author(author)
            .title(title)
    }

    pub fn to_builder(&self) -> CompositionBuilder {
        CompositionBuilder {
            domain: self.domain.clone(),
            identifier: self.identifier.clone(),
            status: Some(self.status.clone()),
            type_: Some(self.type_.clone()),
            category: self.category.clone(),
            subject: self.subject.clone(),
            encounter: self.encounter.clone(),
            date: Some(self.date.clone()),
            author: self.author.clone(),
            title: Some(self.title.clone()),
            confidentiality: self.confidentiality.clone(),
            attester: self.attester.clone(),
            custodian: self.custodian.clone(),
            section: self.section.clone(),
        }
    }

    pub fn identifier(&self) -> Option<&Identifier> {
        self.identifier.as_ref()
    }

    /// preliminary | final | amended | entered-in-error
    pub fn status(&self) -> &Code {
        &self.status
    }

    /// Kind of composition (LOINC if possible)
    pub fn type_(&self) -> &CodeableConcept {
        &self.type_
    }

    pub fn category(&self) -> &[CodeableConcept] {
        &self.category
    }

    /// Who and/or what the composition is about
    pub fn subject(&self) -> Option<&Reference> {
        self.subject.as_ref()
    }

    pub fn encounter(&self) -> Option<&Reference> {
        self.encounter.as_ref()
    }

    /// Composition editing time
    pub fn date(&self) -> &DateTime {
        &self.date
    }

    /// Who and/or what authored the composition
    pub fn author(&self) -> &[Reference] {
        &self.author
    }

    pub fn title(&self) -> &FhirString {
        &self.title
    }

    pub fn confidentiality(&self) -> Option<&Code> {
        self.confidentiality.as_ref()
    }

    pub fn attester(&self) -> &[CompositionAttester] {
        &self.attester
    }

    pub fn custodian(&self) -> Option<&Reference> {
        self.custodian.as_ref()
    }

    pub fn section(&self) -> &[CompositionSection] {
        &self.section
    }
}

impl Hash for Composition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(Resource::hash_code(self));
    }
}

impl HasId for Composition {
    fn id(&self) -> Option<&str> {
        self.domain.resource.id.as_deref()
    }
}

impl HasExtensions for Composition {
    fn extension(&self) -> &[Extension] {
        &self.domain.extension
    }
}

impl HasModifierExtensions for Composition {
    fn modifier_extension(&self) -> &[Extension] {
        &self.domain.modifier_extension
    }
}

impl HasNarrative for Composition {
    fn text(&self) -> Option<&Narrative> {
        self.domain.text.as_ref()
    }
}

impl Resource for Composition {
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
                    &self.type_,
                    &self.category,
                    &self.subject,
                    &self.encounter,
                    &self.date,
                    &self.author,
                    &self.title,
                    &self.confidentiality,
                    &self.attester,
                ),
                (
                    &self.custodian,
                    &self.section,
                ),
            ))
        })
    }

    fn eq_dyn(&self, other: &dyn Resource) -> bool {
        resource_eq(self, other)
    }
}

impl DomainResource for Composition {
    fn domain_resource_fields(&self) -> &DomainResourceFields {
        &self.domain
    }
}

impl Constrained for Composition {
    const TYPE_NAME: &'static str = "Composition";
    const BASE: Option<&'static str> = Some("DomainResource");
    const CONSTRAINTS: &'static [Constraint] = &[];
}

impl Visitable for Composition {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn fields(&self) -> &'static [FieldDescriptor] {
        COMPOSITION_FIELDS
    }

    fn walk<'a>(&'a self, walker: &mut Walker<'a, '_>) {
        self.domain.walk(walker);
        walker.element(&COMPOSITION_FIELDS[8], self.identifier.as_ref());
        walker.element(&COMPOSITION_FIELDS[9], Some(&self.status));
        walker.element(&COMPOSITION_FIELDS[10], Some(&self.type_));
        walker.elements(&COMPOSITION_FIELDS[11], &self.category);
        walker.element(&COMPOSITION_FIELDS[12], self.subject.as_ref());
        walker.element(&COMPOSITION_FIELDS[13], self.encounter.as_ref());
        walker.element(&COMPOSITION_FIELDS[14], Some(&self.date));
        walker.elements(&COMPOSITION_FIELDS[15], &self.author);
        walker.element(&COMPOSITION_FIELDS[16], Some(&self.title));
        walker.element(&COMPOSITION_FIELDS[17], self.confidentiality.as_ref());
        walker.elements(&COMPOSITION_FIELDS[18], &self.attester);
        walker.element(&COMPOSITION_FIELDS[19], self.custodian.as_ref());
        walker.elements(&COMPOSITION_FIELDS[20], &self.section);
    }
}

#[derive(Debug, Clone, Default)]
pub struct CompositionBuilder {
    domain: DomainResourceFields,
    identifier: Option<Identifier>,
    status: Option<Code>,
    type_: Option<CodeableConcept>,
    category: Vec<CodeableConcept>,
    subject: Option<Reference>,
    encounter: Option<Reference>,
    date: Option<DateTime>,
    author: Vec<Reference>,
    title: Option<FhirString>,
    confidentiality: Option<Code>,
    attester: Vec<CompositionAttester>,
    custodian: Option<Reference>,
    section: Vec<CompositionSection>,
}

impl CompositionBuilder {
    pub fn identifier(mut self, identifier: Identifier) -> Self {
        self.identifier = present(identifier);
        self
    }

    pub fn status(mut self, status: impl Into<Code>) -> Self {
        self.status = present(status.into());
        self
    }

    pub fn type_(mut self, type_: CodeableConcept) -> Self {
        self.type_ = present(type_);
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

    pub fn subject(mut self, subject: Reference) -> Self {
        self.subject = present(subject);
        self
    }

    pub fn encounter(mut self, encounter: Reference) -> Self {
        self.encounter = present(encounter);
        self
    }

    pub fn date(mut self, date: impl Into<DateTime>) -> Self {
        self.date = present(date.into());
        self
    }

    /// Append to `author`
    pub fn author(mut self, author: impl IntoIterator<Item = Reference>) -> Self {
        extend_present(&mut self.author, author);
        self
    }

    /// Replace `author`
    pub fn set_author(mut self, author: impl IntoIterator<Item = Reference>) -> Self {
        replace_present(&mut self.author, author);
        self
    }

    pub fn title(mut self, title: impl Into<FhirString>) -> Self {
        self.title = present(title.into());
        self
    }

    pub fn confidentiality(mut self, confidentiality: impl Into<Code>) -> Self {
        self.confidentiality = present(confidentiality.into());
        self
    }

    /// Append to `attester`
    pub fn attester(mut self, attester: impl IntoIterator<Item = CompositionAttester>) -> Self {
        extend_present(&mut self.attester, attester);
        self
    }

    /// Replace `attester`
    pub fn set_attester(mut self, attester: impl IntoIterator<Item = CompositionAttester>) -> Self {
        replace_present(&mut self.attester, attester);
        self
    }

    pub fn custodian(mut self, custodian: Reference) -> Self {
        self.custodian = present(custodian);
        self
    }

    /// Append to `section`
    pub fn section(mut self, section: impl IntoIterator<Item = CompositionSection>) -> Self {
        extend_present(&mut self.section, section);
        self
    }

    /// Replace `section`
    pub fn set_section(mut self, section: impl IntoIterator<Item = CompositionSection>) -> Self {
        replace_present(&mut self.section, section);
        self
    }

    pub fn build(self) -> Result<Composition> {
        let composition = Composition {
            domain: self.domain,
            identifier: self.identifier,
            status: COMPOSITION_FIELDS[9].require(Composition::TYPE_NAME, self.status)?,
            type_: COMPOSITION_FIELDS[10].require(Composition::TYPE_NAME, self.type_)?,
            category: self.category,
            subject: self.subject,
            encounter: self.encounter,
            date: COMPOSITION_FIELDS[14].require(Composition::TYPE_NAME, self.date)?,
            author: COMPOSITION_FIELDS[15].require_non_empty(Composition::TYPE_NAME, self.author)?,
            title: COMPOSITION_FIELDS[16].require(Composition::TYPE_NAME, self.title)?,
            confidentiality: self.confidentiality,
            attester: self.attester,
            custodian: self.custodian,
            section: self.section,
            hash: HashCache::new(),
        };
        composition.domain.resource.check_id(Composition::TYPE_NAME)?;
        check_primitives(&composition, Composition::TYPE_NAME)?;
        Ok(composition)
    }
}

impl ResourceBuilder for CompositionBuilder {
    fn resource_fields(&mut self) -> &mut ResourceFields {
        &mut self.domain.resource
    }
}

impl DomainResourceBuilder for CompositionBuilder {
    fn domain_resource_fields(&mut self) -> &mut DomainResourceFields {
        &mut self.domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrum_elements::error::Error;

    fn doc_type() -> CodeableConcept {
        CodeableConcept::builder().text("Discharge summary").build().unwrap()
    }

    fn author() -> Reference {
        Reference::builder().reference("Practitioner/1").build().unwrap()
    }

    #[test]
    fn author_must_not_be_empty() {
        let err = Composition::builder("final", doc_type(), "2024-01-01", Vec::new(), "Summary")
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::NonEmptyConstraintViolation {
                type_name: "Composition",
                field: "author"
            }
        ));
    }

    #[test]
    fn absent_authors_do_not_count() {
        let err = Composition::builder(
            "final",
            doc_type(),
            "2024-01-01",
            [Reference::builder().build().unwrap()],
            "Summary",
        )
        .build()
        .unwrap_err();
        assert_eq!(err.field(), Some("author"));
    }

    #[test]
    fn attester_mode_is_required() {
        let err = CompositionAttesterBuilder::default()
            .party(author())
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::RequiredFieldMissing { field: "mode", .. }));
    }

    #[test]
    fn section_depth() {
        let leaf = CompositionSection::builder().title("leaf").build().unwrap();
        let middle = CompositionSection::builder().section([leaf]).build().unwrap();
        let top = CompositionSection::builder()
            .section([middle.clone(), CompositionSection::builder().title("x").build().unwrap()])
            .build()
            .unwrap();
        assert_eq!(top.depth(), 3);
        assert_eq!(middle.depth(), 2);
    }
}

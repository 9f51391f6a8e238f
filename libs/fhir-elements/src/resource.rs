//! Resources
//!
//! A resource is a top-level record with its own identity. Domain resources
//! add narrative, contained resources and extensions. Concrete resource types
//! hold a [`ResourceFields`] or [`DomainResourceFields`] block and expose it
//! through the traits here; their builders get the shared setters from
//! [`ResourceBuilder`] and [`DomainResourceBuilder`].

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::constraint::{Constraint, BASE_LOCATION};
use crate::datatypes::{Meta, Narrative};
use crate::descriptor::{Cardinality, FieldDescriptor, EXTENSION, MODIFIER_EXTENSION};
use crate::element::{
    extend_present, present, replace_present, HasExtensions, HasId, HasModifierExtensions,
    HasNarrative,
};
use crate::error::{Error, Result};
use crate::extension::Extension;
use crate::primitive::{kind, Code, PrimitiveKind, Uri};
use crate::visitor::{RawValue, Visitable, Walker};

pub const RESOURCE_ID: FieldDescriptor = FieldDescriptor::value("id", "id");
pub const META: FieldDescriptor = FieldDescriptor::optional("meta", "Meta");
pub const IMPLICIT_RULES: FieldDescriptor = FieldDescriptor::optional("implicitRules", "uri");
pub const LANGUAGE: FieldDescriptor = FieldDescriptor::optional("language", "code");
pub const TEXT: FieldDescriptor = FieldDescriptor::optional("text", "Narrative");
pub const CONTAINED: FieldDescriptor = FieldDescriptor::resource("contained", Cardinality::REPEATED);

const DOMAIN_RESOURCE_SOURCE: &str = "http://hl7.org/fhir/StructureDefinition/DomainResource";

/// Invariants every domain resource carries
pub const DOMAIN_RESOURCE_CONSTRAINTS: &[Constraint] = &[
    Constraint::rule(
        "dom-2",
        BASE_LOCATION,
        "If the resource is contained in another resource, it SHALL NOT contain nested Resources",
        "contained.contained.empty()",
    )
    .with_source(DOMAIN_RESOURCE_SOURCE),
    Constraint::rule(
        "dom-3",
        BASE_LOCATION,
        "If the resource is contained in another resource, it SHALL be referred to from elsewhere in the resource or SHALL refer to the containing resource",
        "contained.where((('#'+id in (%resource.descendants().reference | %resource.descendants().as(canonical) | %resource.descendants().as(uri) | %resource.descendants().as(url))) or descendants().where(reference = '#').exists() or descendants().where(as(canonical) = '#').exists() or descendants().where(as(canonical) = '#').exists()).not()).trace('unmatched', id).empty()",
    )
    .with_source(DOMAIN_RESOURCE_SOURCE),
    Constraint::rule(
        "dom-4",
        BASE_LOCATION,
        "If a resource is contained in another resource, it SHALL NOT have a meta.versionId or a meta.lastUpdated",
        "contained.meta.versionId.empty() and contained.meta.lastUpdated.empty()",
    )
    .with_source(DOMAIN_RESOURCE_SOURCE),
    Constraint::rule(
        "dom-5",
        BASE_LOCATION,
        "If a resource is contained in another resource, it SHALL NOT have a security label",
        "contained.meta.security.empty()",
    )
    .with_source(DOMAIN_RESOURCE_SOURCE),
    Constraint::warning(
        "dom-6",
        BASE_LOCATION,
        "A resource should have narrative for robust management",
        "text.`div`.exists()",
    )
    .with_source(DOMAIN_RESOURCE_SOURCE),
];

/// A top-level record
pub trait Resource: Visitable + HasId {
    fn resource_fields(&self) -> &ResourceFields;

    fn as_visitable(&self) -> &dyn Visitable;

    /// Structural hash, computed once
    fn hash_code(&self) -> u64;

    /// Structural equality against a resource of any type
    fn eq_dyn(&self, other: &dyn Resource) -> bool;

    fn resource_type(&self) -> &'static str {
        self.type_name()
    }

    fn meta(&self) -> Option<&Meta> {
        self.resource_fields().meta.as_ref()
    }

    fn implicit_rules(&self) -> Option<&Uri> {
        self.resource_fields().implicit_rules.as_ref()
    }

    fn language(&self) -> Option<&Code> {
        self.resource_fields().language.as_ref()
    }
}

/// A resource with narrative, contained resources and extensions
pub trait DomainResource: Resource + HasNarrative + HasExtensions + HasModifierExtensions {
    fn domain_resource_fields(&self) -> &DomainResourceFields;

    fn contained(&self) -> &[ContainedResource] {
        &self.domain_resource_fields().contained
    }

    /// Find a contained resource by its local id
    fn find_contained(&self, id: &str) -> Option<&ContainedResource> {
        self.contained().iter().find(|r| r.id() == Some(id))
    }
}

/// `eq_dyn` for a concrete resource type
pub fn resource_eq<R: Resource + PartialEq>(resource: &R, other: &dyn Resource) -> bool {
    other
        .as_visitable()
        .downcast_ref::<R>()
        .is_some_and(|other| other == resource)
}

/// `id`, `meta`, `implicitRules` and `language`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ResourceFields {
    pub id: Option<String>,
    pub meta: Option<Meta>,
    pub implicit_rules: Option<Uri>,
    pub language: Option<Code>,
}

impl ResourceFields {
    pub fn walk<'a>(&'a self, walker: &mut Walker<'a, '_>) {
        walker.value(&RESOURCE_ID, self.id.as_deref().map(RawValue::String));
        walker.element(&META, self.meta.as_ref());
        walker.element(&IMPLICIT_RULES, self.implicit_rules.as_ref());
        walker.element(&LANGUAGE, self.language.as_ref());
    }

    /// Check the logical id, which is held as a raw value.
    pub fn check_id(&self, type_name: &'static str) -> Result<()> {
        let Some(id) = &self.id else {
            return Ok(());
        };
        kind::Id::check(id).map_err(|reason| {
            tracing::debug!(type_name, id = %id, reason, "invalid resource id");
            Error::InvalidPrimitiveValue {
                type_name,
                field: RESOURCE_ID.name.to_string(),
                value: id.clone(),
                reason,
            }
        })
    }
}

/// Resource fields plus `text`, `contained`, `extension` and `modifierExtension`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DomainResourceFields {
    pub resource: ResourceFields,
    pub text: Option<Narrative>,
    pub contained: Vec<ContainedResource>,
    pub extension: Vec<Extension>,
    pub modifier_extension: Vec<Extension>,
}

impl DomainResourceFields {
    pub fn walk<'a>(&'a self, walker: &mut Walker<'a, '_>) {
        self.resource.walk(walker);
        walker.element(&TEXT, self.text.as_ref());
        walker.resources(&CONTAINED, &self.contained);
        walker.elements(&EXTENSION, &self.extension);
        walker.elements(&MODIFIER_EXTENSION, &self.modifier_extension);
    }
}

/// A resource held inline by another resource
#[derive(Clone)]
pub struct ContainedResource(Arc<dyn Resource>);

impl ContainedResource {
    pub fn new<R: Resource>(resource: R) -> Self {
        Self(Arc::new(resource))
    }

    pub fn resource_type(&self) -> &'static str {
        self.0.resource_type()
    }

    pub fn id(&self) -> Option<&str> {
        self.0.id()
    }

    pub fn resource(&self) -> &dyn Resource {
        self.0.as_ref()
    }

    pub fn as_visitable(&self) -> &dyn Visitable {
        self.0.as_visitable()
    }

    /// The resource, if it is an `R`
    pub fn get<R: Resource>(&self) -> Option<&R> {
        self.as_visitable().downcast_ref::<R>()
    }
}

impl PartialEq for ContainedResource {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.eq_dyn(other.0.as_ref())
    }
}

impl Eq for ContainedResource {}

impl Hash for ContainedResource {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.hash_code());
    }
}

impl fmt::Debug for ContainedResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_visitable(), f)
    }
}

impl<R: Resource> From<R> for ContainedResource {
    fn from(resource: R) -> Self {
        Self::new(resource)
    }
}

/// Setters shared by every resource builder
pub trait ResourceBuilder: Sized {
    fn resource_fields(&mut self) -> &mut ResourceFields;

    fn id(mut self, id: impl Into<String>) -> Self {
        self.resource_fields().id = Some(id.into());
        self
    }

    fn meta(mut self, meta: Meta) -> Self {
        self.resource_fields().meta = present(meta);
        self
    }

    fn implicit_rules(mut self, implicit_rules: impl Into<Uri>) -> Self {
        self.resource_fields().implicit_rules = present(implicit_rules.into());
        self
    }

    fn language(mut self, language: impl Into<Code>) -> Self {
        self.resource_fields().language = present(language.into());
        self
    }
}

/// Setters shared by every domain resource builder
pub trait DomainResourceBuilder: ResourceBuilder {
    fn domain_resource_fields(&mut self) -> &mut DomainResourceFields;

    fn text(mut self, text: Narrative) -> Self {
        self.domain_resource_fields().text = Some(text);
        self
    }

    /// Append contained resources
    fn contained(mut self, contained: impl IntoIterator<Item = ContainedResource>) -> Self {
        self.domain_resource_fields().contained.extend(contained);
        self
    }

    /// Replace all contained resources
    fn set_contained(mut self, contained: impl IntoIterator<Item = ContainedResource>) -> Self {
        let fields = self.domain_resource_fields();
        fields.contained.clear();
        fields.contained.extend(contained);
        self
    }

    fn extension(mut self, extension: impl IntoIterator<Item = Extension>) -> Self {
        extend_present(&mut self.domain_resource_fields().extension, extension);
        self
    }

    fn set_extension(mut self, extension: impl IntoIterator<Item = Extension>) -> Self {
        replace_present(&mut self.domain_resource_fields().extension, extension);
        self
    }

    fn modifier_extension(mut self, extension: impl IntoIterator<Item = Extension>) -> Self {
        extend_present(&mut self.domain_resource_fields().modifier_extension, extension);
        self
    }

    fn set_modifier_extension(mut self, extension: impl IntoIterator<Item = Extension>) -> Self {
        replace_present(&mut self.domain_resource_fields().modifier_extension, extension);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_id_is_checked() {
        let fields = ResourceFields {
            id: Some("bad id".into()),
            ..Default::default()
        };
        let err = fields.check_id("Patient").unwrap_err();
        assert_eq!(err.field(), Some("id"));

        let fields = ResourceFields {
            id: Some("p-1".into()),
            ..Default::default()
        };
        assert!(fields.check_id("Patient").is_ok());
        assert!(ResourceFields::default().check_id("Patient").is_ok());
    }
}

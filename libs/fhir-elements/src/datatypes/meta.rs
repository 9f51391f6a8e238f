use std::any::Any;
use std::hash::{Hash, Hasher};

use crate::constraint::{Constrained, Constraint};
use crate::descriptor::{FieldDescriptor, EXTENSION, ID};
use crate::element::{
    extend_present, present, replace_present, Element, ElementBuilder, ElementFields,
    HasExtensions, HasId,
};
use crate::error::Result;
use crate::extension::Extension;
use crate::hash::{hash_of, HashCache};
use crate::primitive::{Id, Instant, Uri};
use crate::visitor::{check_primitives, Visitable, Walker};

use super::Coding;

const FIELDS: &[FieldDescriptor] = &[
    ID,
    EXTENSION,
    FieldDescriptor::optional("versionId", "id"),
    FieldDescriptor::optional("lastUpdated", "instant"),
    FieldDescriptor::optional("source", "uri"),
    FieldDescriptor::repeated("profile", "canonical"),
    FieldDescriptor::repeated("security", "Coding"),
    FieldDescriptor::repeated("tag", "Coding"),
];

/// Metadata about a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meta {
    element: ElementFields,
    version_id: Option<Id>,
    last_updated: Option<Instant>,
    source: Option<Uri>,
    profile: Vec<Uri>,
    security: Vec<Coding>,
    tag: Vec<Coding>,
    hash: HashCache,
}

impl Meta {
    pub fn builder() -> MetaBuilder {
        MetaBuilder::default()
    }

    pub fn to_builder(&self) -> MetaBuilder {
        MetaBuilder {
            element: self.element.clone(),
            version_id: self.version_id.clone(),
            last_updated: self.last_updated.clone(),
            source: self.source.clone(),
            profile: self.profile.clone(),
            security: self.security.clone(),
            tag: self.tag.clone(),
        }
    }

    pub fn version_id(&self) -> Option<&Id> {
        self.version_id.as_ref()
    }

    pub fn last_updated(&self) -> Option<&Instant> {
        self.last_updated.as_ref()
    }

    pub fn source(&self) -> Option<&Uri> {
        self.source.as_ref()
    }

    /// Profiles the resource claims to conform to
    pub fn profile(&self) -> &[Uri] {
        &self.profile
    }

    pub fn security(&self) -> &[Coding] {
        &self.security
    }

    pub fn tag(&self) -> &[Coding] {
        &self.tag
    }

    pub fn hash_code(&self) -> u64 {
        self.hash.get_or_compute(|| {
            hash_of(&(
                &self.element,
                &self.version_id,
                &self.last_updated,
                &self.source,
                &self.profile,
                &self.security,
                &self.tag,
            ))
        })
    }
}

impl Hash for Meta {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl HasId for Meta {
    fn id(&self) -> Option<&str> {
        self.element.id()
    }
}

impl HasExtensions for Meta {
    fn extension(&self) -> &[Extension] {
        &self.element.extension
    }
}

impl Element for Meta {
    fn has_children(&self) -> bool {
        self.version_id.is_some()
            || self.last_updated.is_some()
            || self.source.is_some()
            || !self.profile.is_empty()
            || !self.security.is_empty()
            || !self.tag.is_empty()
    }
}

impl Constrained for Meta {
    const TYPE_NAME: &'static str = "Meta";
    const BASE: Option<&'static str> = Some("Element");
    const CONSTRAINTS: &'static [Constraint] = &[];
}

impl Visitable for Meta {
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
        walker.element(&FIELDS[2], self.version_id.as_ref());
        walker.element(&FIELDS[3], self.last_updated.as_ref());
        walker.element(&FIELDS[4], self.source.as_ref());
        walker.elements(&FIELDS[5], &self.profile);
        walker.elements(&FIELDS[6], &self.security);
        walker.elements(&FIELDS[7], &self.tag);
    }
}

#[derive(Debug, Clone, Default)]
pub struct MetaBuilder {
    element: ElementFields,
    version_id: Option<Id>,
    last_updated: Option<Instant>,
    source: Option<Uri>,
    profile: Vec<Uri>,
    security: Vec<Coding>,
    tag: Vec<Coding>,
}

impl MetaBuilder {
    pub fn version_id(mut self, version_id: impl Into<Id>) -> Self {
        self.version_id = present(version_id.into());
        self
    }

    pub fn last_updated(mut self, last_updated: impl Into<Instant>) -> Self {
        self.last_updated = present(last_updated.into());
        self
    }

    pub fn source(mut self, source: impl Into<Uri>) -> Self {
        self.source = present(source.into());
        self
    }

    pub fn profile<T: Into<Uri>>(mut self, profile: impl IntoIterator<Item = T>) -> Self {
        extend_present(&mut self.profile, profile.into_iter().map(Into::into));
        self
    }

    pub fn set_profile<T: Into<Uri>>(mut self, profile: impl IntoIterator<Item = T>) -> Self {
        replace_present(&mut self.profile, profile.into_iter().map(Into::into));
        self
    }

    pub fn security(mut self, security: impl IntoIterator<Item = Coding>) -> Self {
        extend_present(&mut self.security, security);
        self
    }

    pub fn set_security(mut self, security: impl IntoIterator<Item = Coding>) -> Self {
        replace_present(&mut self.security, security);
        self
    }

    pub fn tag(mut self, tag: impl IntoIterator<Item = Coding>) -> Self {
        extend_present(&mut self.tag, tag);
        self
    }

    pub fn set_tag(mut self, tag: impl IntoIterator<Item = Coding>) -> Self {
        replace_present(&mut self.tag, tag);
        self
    }

    pub fn build(self) -> Result<Meta> {
        let meta = Meta {
            element: self.element,
            version_id: self.version_id,
            last_updated: self.last_updated,
            source: self.source,
            profile: self.profile,
            security: self.security,
            tag: self.tag,
            hash: HashCache::new(),
        };
        check_primitives(&meta, Meta::TYPE_NAME)?;
        Ok(meta)
    }
}

impl ElementBuilder for MetaBuilder {
    fn element_fields(&mut self) -> &mut ElementFields {
        &mut self.element
    }
}

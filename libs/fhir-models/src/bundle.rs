//! Bundle
//!
//! A container for a collection of resources. Entries hold their resource
//! inline; bundles are resources but not domain resources, so they carry no
//! narrative or extensions of their own.

use std::any::Any;
use std::hash::{Hash, Hasher};

use ferrum_elements::constraint::{Constrained, Constraint, BASE_LOCATION};
use ferrum_elements::datatypes::Identifier;
use ferrum_elements::descriptor::{Cardinality, FieldDescriptor, EXTENSION, ID, MODIFIER_EXTENSION};
use ferrum_elements::element::{
    extend_present, present, replace_present, BackboneElement, BackboneElementBuilder,
    BackboneFields, Element, ElementBuilder, ElementFields, HasExtensions, HasId,
    HasModifierExtensions,
};
use ferrum_elements::error::Result;
use ferrum_elements::extension::Extension;
use ferrum_elements::hash::{hash_of, HashCache};
use ferrum_elements::primitive::{Code, Decimal, FhirString, Instant, UnsignedInt, Uri};
use ferrum_elements::resource::{
    resource_eq, ContainedResource, Resource, ResourceBuilder, ResourceFields, IMPLICIT_RULES,
    LANGUAGE, META, RESOURCE_ID,
};
use ferrum_elements::visitor::{check_primitives, Visitable, Walker};

const BUNDLE_SOURCE: &str = "http://hl7.org/fhir/StructureDefinition/Bundle";

const BUNDLE_CONSTRAINTS: &[Constraint] = &[
    Constraint::rule(
        "bdl-1",
        BASE_LOCATION,
        "total only when a search or history",
        "total.empty() or (type = 'searchset') or (type = 'history')",
    )
    .with_source(BUNDLE_SOURCE),
    Constraint::rule(
        "bdl-2",
        BASE_LOCATION,
        "entry.search only when a search",
        "entry.search.empty() or (type = 'searchset')",
    )
    .with_source(BUNDLE_SOURCE),
    Constraint::rule(
        "bdl-3",
        BASE_LOCATION,
        "entry.request mandatory for batch/transaction/history, otherwise prohibited",
        "entry.all(request.exists() = (%resource.type = 'batch' or %resource.type = 'transaction' or %resource.type = 'history'))",
    )
    .with_source(BUNDLE_SOURCE),
    Constraint::rule(
        "bdl-4",
        BASE_LOCATION,
        "entry.response mandatory for batch-response/transaction-response/history, otherwise prohibited",
        "entry.all(response.exists() = (%resource.type = 'batch-response' or %resource.type = 'transaction-response' or %resource.type = 'history'))",
    )
    .with_source(BUNDLE_SOURCE),
    Constraint::rule(
        "bdl-7",
        BASE_LOCATION,
        "FullUrl must be unique in a bundle, or else entries with the same fullUrl must have different meta.versionId (except in history bundles)",
        "(type = 'history') or entry.where(fullUrl.exists()).select(fullUrl&resource.meta.versionId).isDistinct()",
    )
    .with_source(BUNDLE_SOURCE),
    Constraint::rule(
        "bdl-9",
        BASE_LOCATION,
        "A document must have an identifier with a system and a value",
        "type = 'document' implies (identifier.system.exists() and identifier.value.exists())",
    )
    .with_source(BUNDLE_SOURCE),
    Constraint::rule(
        "bdl-10",
        BASE_LOCATION,
        "A document must have a date",
        "type = 'document' implies (timestamp.hasValue())",
    )
    .with_source(BUNDLE_SOURCE),
    Constraint::rule(
        "bdl-11",
        BASE_LOCATION,
        "A document must have a Composition as the first resource",
        "type = 'document' implies entry.first().resource.is(Composition)",
    )
    .with_source(BUNDLE_SOURCE),
    Constraint::rule(
        "bdl-12",
        BASE_LOCATION,
        "A message must have a MessageHeader as the first resource",
        "type = 'message' implies entry.first().resource.is(MessageHeader)",
    )
    .with_source(BUNDLE_SOURCE),
];

const ENTRY_CONSTRAINTS: &[Constraint] = &[
    Constraint::rule(
        "bdl-5",
        "Bundle.entry",
        "must be a resource unless there's a request or response",
        "resource.exists() or request.exists() or response.exists()",
    )
    .with_source(BUNDLE_SOURCE),
    Constraint::rule(
        "bdl-8",
        "Bundle.entry",
        "fullUrl cannot be a version specific reference",
        "fullUrl.contains('/_history/').not()",
    )
    .with_source(BUNDLE_SOURCE),
];

const BUNDLE_LINK_FIELDS: &[FieldDescriptor] = &[
    ID,
    EXTENSION,
    MODIFIER_EXTENSION,
    FieldDescriptor::required("relation", "string"),
    FieldDescriptor::required("url", "uri"),
];

/// Links related to a bundle or an entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleLink {
    backbone: BackboneFields,
    relation: FhirString,
    url: Uri,
    hash: HashCache,
}

impl BundleLink {
    pub fn builder(relation: impl Into<FhirString>, url: impl Into<Uri>) -> BundleLinkBuilder {
        BundleLinkBuilder::default()
            .relation(relation)
            .url(url)
    }

    pub fn to_builder(&self) -> BundleLinkBuilder {
        BundleLinkBuilder {
            backbone: self.backbone.clone(),
            relation: Some(self.relation.clone()),
            url: Some(self.url.clone()),
        }
    }

    /// Link relation, e.g. "self" or "next"
    pub fn relation(&self) -> &FhirString {
        &self.relation
    }

    pub fn url(&self) -> &Uri {
        &self.url
    }

    pub fn hash_code(&self) -> u64 {
        self.hash.get_or_compute(|| hash_of(&(&self.backbone, &self.relation, &self.url)))
    }
}

impl Hash for BundleLink {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl HasId for BundleLink {
    fn id(&self) -> Option<&str> {
        self.backbone.element.id()
    }
}

impl HasExtensions for BundleLink {
    fn extension(&self) -> &[Extension] {
        &self.backbone.element.extension
    }
}

impl HasModifierExtensions for BundleLink {
    fn modifier_extension(&self) -> &[Extension] {
        &self.backbone.modifier_extension
    }
}

impl Element for BundleLink {
    fn has_children(&self) -> bool {
        true
    }
}

impl BackboneElement for BundleLink {}

impl Constrained for BundleLink {
    const TYPE_NAME: &'static str = "Bundle.link";
    const BASE: Option<&'static str> = Some("BackboneElement");
    const CONSTRAINTS: &'static [Constraint] = &[];
}

impl Visitable for BundleLink {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn fields(&self) -> &'static [FieldDescriptor] {
        BUNDLE_LINK_FIELDS
    }

    fn walk<'a>(&'a self, walker: &mut Walker<'a, '_>) {
        self.backbone.walk(walker);
        walker.element(&BUNDLE_LINK_FIELDS[3], Some(&self.relation));
        walker.element(&BUNDLE_LINK_FIELDS[4], Some(&self.url));
    }
}

#[derive(Debug, Clone, Default)]
pub struct BundleLinkBuilder {
    backbone: BackboneFields,
    relation: Option<FhirString>,
    url: Option<Uri>,
}

impl BundleLinkBuilder {
    pub fn relation(mut self, relation: impl Into<FhirString>) -> Self {
        self.relation = present(relation.into());
        self
    }

    pub fn url(mut self, url: impl Into<Uri>) -> Self {
        self.url = present(url.into());
        self
    }

    pub fn build(self) -> Result<BundleLink> {
        let link = BundleLink {
            backbone: self.backbone,
            relation: BUNDLE_LINK_FIELDS[3].require(BundleLink::TYPE_NAME, self.relation)?,
            url: BUNDLE_LINK_FIELDS[4].require(BundleLink::TYPE_NAME, self.url)?,
            hash: HashCache::new(),
        };
        check_primitives(&link, BundleLink::TYPE_NAME)?;
        Ok(link)
    }
}

impl ElementBuilder for BundleLinkBuilder {
    fn element_fields(&mut self) -> &mut ElementFields {
        &mut self.backbone.element
    }
}

impl BackboneElementBuilder for BundleLinkBuilder {
    fn backbone_fields(&mut self) -> &mut BackboneFields {
        &mut self.backbone
    }
}

const BUNDLE_ENTRY_SEARCH_FIELDS: &[FieldDescriptor] = &[
    ID,
    EXTENSION,
    MODIFIER_EXTENSION,
    FieldDescriptor::optional("mode", "code"),
    FieldDescriptor::optional("score", "decimal"),
];

/// Search related information for an entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleEntrySearch {
    backbone: BackboneFields,
    mode: Option<Code>,
    score: Option<Decimal>,
    hash: HashCache,
}

impl BundleEntrySearch {
    pub fn builder() -> BundleEntrySearchBuilder {
        BundleEntrySearchBuilder::default()
    }

    pub fn to_builder(&self) -> BundleEntrySearchBuilder {
        BundleEntrySearchBuilder {
            backbone: self.backbone.clone(),
            mode: self.mode.clone(),
            score: self.score.clone(),
        }
    }

    /// match | include | outcome
    pub fn mode(&self) -> Option<&Code> {
        self.mode.as_ref()
    }

    pub fn score(&self) -> Option<&Decimal> {
        self.score.as_ref()
    }

    pub fn hash_code(&self) -> u64 {
        self.hash.get_or_compute(|| hash_of(&(&self.backbone, &self.mode, &self.score)))
    }
}

impl Hash for BundleEntrySearch {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl HasId for BundleEntrySearch {
    fn id(&self) -> Option<&str> {
        self.backbone.element.id()
    }
}

impl HasExtensions for BundleEntrySearch {
    fn extension(&self) -> &[Extension] {
        &self.backbone.element.extension
    }
}

impl HasModifierExtensions for BundleEntrySearch {
    fn modifier_extension(&self) -> &[Extension] {
        &self.backbone.modifier_extension
    }
}

impl Element for BundleEntrySearch {
    fn has_children(&self) -> bool {
        !self.backbone.modifier_extension.is_empty()
            || self.mode.is_some()
            || self.score.is_some()
    }
}

impl BackboneElement for BundleEntrySearch {}

impl Constrained for BundleEntrySearch {
    const TYPE_NAME: &'static str = "Bundle.entry.search";
    const BASE: Option<&'static str> = Some("BackboneElement");
    const CONSTRAINTS: &'static [Constraint] = &[];
}

impl Visitable for BundleEntrySearch {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn fields(&self) -> &'static [FieldDescriptor] {
        BUNDLE_ENTRY_SEARCH_FIELDS
    }

    fn walk<'a>(&'a self, walker: &mut Walker<'a, '_>) {
        self.backbone.walk(walker);
        walker.element(&BUNDLE_ENTRY_SEARCH_FIELDS[3], self.mode.as_ref());
        walker.element(&BUNDLE_ENTRY_SEARCH_FIELDS[4], self.score.as_ref());
    }
}

#[derive(Debug, Clone, Default)]
pub struct BundleEntrySearchBuilder {
    backbone: BackboneFields,
    mode: Option<Code>,
    score: Option<Decimal>,
}

impl BundleEntrySearchBuilder {
    pub fn mode(mut self, mode: impl Into<Code>) -> Self {
        self.mode = present(mode.into());
        self
    }

    pub fn score(mut self, score: impl Into<Decimal>) -> Self {
        self.score = present(score.into());
        self
    }

    pub fn build(self) -> Result<BundleEntrySearch> {
        let search = BundleEntrySearch {
            backbone: self.backbone,
            mode: self.mode,
            score: self.score,
            hash: HashCache::new(),
        };
        check_primitives(&search, BundleEntrySearch::TYPE_NAME)?;
        Ok(search)
    }
}

impl ElementBuilder for BundleEntrySearchBuilder {
    fn element_fields(&mut self) -> &mut ElementFields {
        &mut self.backbone.element
    }
}

impl BackboneElementBuilder for BundleEntrySearchBuilder {
    fn backbone_fields(&mut self) -> &mut BackboneFields {
        &mut self.backbone
    }
}

const BUNDLE_ENTRY_REQUEST_FIELDS: &[FieldDescriptor] = &[
    ID,
    EXTENSION,
    MODIFIER_EXTENSION,
    FieldDescriptor::required("method", "code"),
    FieldDescriptor::required("url", "uri"),
    FieldDescriptor::optional("ifNoneMatch", "string"),
    FieldDescriptor::optional("ifModifiedSince", "instant"),
    FieldDescriptor::optional("ifMatch", "string"),
    FieldDescriptor::optional("ifNoneExist", "string"),
];

/// Additional execution information for transaction and batch entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleEntryRequest {
    backbone: BackboneFields,
    method: Code,
    url: Uri,
    if_none_match: Option<FhirString>,
    if_modified_since: Option<Instant>,
    if_match: Option<FhirString>,
    if_none_exist: Option<FhirString>,
    hash: HashCache,
}

impl BundleEntryRequest {
    pub fn builder(method: impl Into<Code>, url: impl Into<Uri>) -> BundleEntryRequestBuilder {
        BundleEntryRequestBuilder::default()
            .method(method)
            .url(url)
    }

    pub fn to_builder(&self) -> BundleEntryRequestBuilder {
        BundleEntryRequestBuilder {
            backbone: self.backbone.clone(),
            method: Some(self.method.clone()),
            url: Some(self.url.clone()),
            if_none_match: self.if_none_match.clone(),
            if_modified_since: self.if_modified_since.clone(),
            if_match: self.if_match.clone(),
            if_none_exist: self.if_none_exist.clone(),
        }
    }

    /// GET | HEAD | POST | PUT | DELETE | PATCH
    pub fn method(&self) -> &Code {
        &self.method
    }

    pub fn url(&self) -> &Uri {
        &self.url
    }

    pub fn if_none_match(&self) -> Option<&FhirString> {
        self.if_none_match.as_ref()
    }

    pub fn if_modified_since(&self) -> Option<&Instant> {
        self.if_modified_since.as_ref()
    }

    pub fn if_match(&self) -> Option<&FhirString> {
        self.if_match.as_ref()
    }

    pub fn if_none_exist(&self) -> Option<&FhirString> {
        self.if_none_exist.as_ref()
    }

    pub fn hash_code(&self) -> u64 {
        self.hash.get_or_compute(|| {
            hash_of(&(
                &self.backbone,
                &self.method,
                &self.url,
                &self.if_none_match,
                &self.if_modified_since,
                &self.if_match,
                &self.if_none_exist,
            ))
        })
    }
}

impl Hash for BundleEntryRequest {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl HasId for BundleEntryRequest {
    fn id(&self) -> Option<&str> {
        self.backbone.element.id()
    }
}

impl HasExtensions for BundleEntryRequest {
    fn extension(&self) -> &[Extension] {
        &self.backbone.element.extension
    }
}

impl HasModifierExtensions for BundleEntryRequest {
    fn modifier_extension(&self) -> &[Extension] {
        &self.backbone.modifier_extension
    }
}

impl Element for BundleEntryRequest {
    fn has_children(&self) -> bool {
        true
    }
}

impl BackboneElement for BundleEntryRequest {}

impl Constrained for BundleEntryRequest {
    const TYPE_NAME: &'static str = "Bundle.entry.request";
    const BASE: Option<&'static str> = Some("BackboneElement");
    const CONSTRAINTS: &'static [Constraint] = &[];
}

impl Visitable for BundleEntryRequest {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn fields(&self) -> &'static [FieldDescriptor] {
        BUNDLE_ENTRY_REQUEST_FIELDS
    }

    fn walk<'a>(&'a self, walker: &mut Walker<'a, '_>) {
        self.backbone.walk(walker);
        walker.element(&BUNDLE_ENTRY_REQUEST_FIELDS[3], Some(&self.method));
        walker.element(&BUNDLE_ENTRY_REQUEST_FIELDS[4], Some(&self.url));
        walker.element(&BUNDLE_ENTRY_REQUEST_FIELDS[5], self.if_none_match.as_ref());
        walker.element(&BUNDLE_ENTRY_REQUEST_FIELDS[6], self.if_modified_since.as_ref());
        walker.element(&BUNDLE_ENTRY_REQUEST_FIELDS[7], self.if_match.as_ref());
        walker.element(&BUNDLE_ENTRY_REQUEST_FIELDS[8], self.if_none_exist.as_ref());
    }
}

#[derive(Debug, Clone, Default)]
pub struct BundleEntryRequestBuilder {
    backbone: BackboneFields,
    method: Option<Code>,
    url: Option<Uri>,
    if_none_match: Option<FhirString>,
    if_modified_since: Option<Instant>,
    if_match: Option<FhirString>,
    if_none_exist: Option<FhirString>,
}

impl BundleEntryRequestBuilder {
    pub fn method(mut self, method: impl Into<Code>) -> Self {
        self.method = present(method.into());
        self
    }

    pub fn url(mut self, url: impl Into<Uri>) -> Self {
        self.url = present(url.into());
        self
    }

    pub fn if_none_match(mut self, if_none_match: impl Into<FhirString>) -> Self {
        self.if_none_match = present(if_none_match.into());
        self
    }

    pub fn if_modified_since(mut self, if_modified_since: impl Into<Instant>) -> Self {
        self.if_modified_since = present(if_modified_since.into());
        self
    }

    pub fn if_match(mut self, if_match: impl Into<FhirString>) -> Self {
        self.if_match = present(if_match.into());
        self
    }

    pub fn if_none_exist(mut self, if_none_exist: impl Into<FhirString>) -> Self {
        self.if_none_exist = present(if_none_exist.into());
        self
    }

    pub fn build(self) -> Result<BundleEntryRequest> {
        let request = BundleEntryRequest {
            backbone: self.backbone,
            method: BUNDLE_ENTRY_REQUEST_FIELDS[3]
                .require(BundleEntryRequest::TYPE_NAME, self.method)?,
            url: BUNDLE_ENTRY_REQUEST_FIELDS[4].require(BundleEntryRequest::TYPE_NAME, self.url)?,
            if_none_match: self.if_none_match,
            if_modified_since: self.if_modified_since,
            if_match: self.if_match,
            if_none_exist: self.if_none_exist,
            hash: HashCache::new(),
        };
        check_primitives(&request, BundleEntryRequest::TYPE_NAME)?;
        Ok(request)
    }
}

impl ElementBuilder for BundleEntryRequestBuilder {
    fn element_fields(&mut self) -> &mut ElementFields {
        &mut self.backbone.element
    }
}

impl BackboneElementBuilder for BundleEntryRequestBuilder {
    fn backbone_fields(&mut self) -> &mut BackboneFields {
        &mut self.backbone
    }
}

const BUNDLE_ENTRY_RESPONSE_FIELDS: &[FieldDescriptor] = &[
    ID,
    EXTENSION,
    MODIFIER_EXTENSION,
    FieldDescriptor::required("status", "string"),
    FieldDescriptor::optional("location", "uri"),
    FieldDescriptor::optional("etag", "string"),
    FieldDescriptor::optional("lastModified", "instant"),
    FieldDescriptor::resource("outcome", Cardinality::OPTIONAL),
];

/// Results of executing a transaction or batch entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleEntryResponse {
    backbone: BackboneFields,
    status: FhirString,
    location: Option<Uri>,
    etag: Option<FhirString>,
    last_modified: Option<Instant>,
    outcome: Option<ContainedResource>,
    hash: HashCache,
}

impl BundleEntryResponse {
    pub fn builder(status: impl Into<FhirString>) -> BundleEntryResponseBuilder {
        BundleEntryResponseBuilder::default().status(status)
    }

    pub fn to_builder(&self) -> BundleEntryResponseBuilder {
        BundleEntryResponseBuilder {
            backbone: self.backbone.clone(),
            status: Some(self.status.clone()),
            location: self.location.clone(),
            etag: self.etag.clone(),
            last_modified: self.last_modified.clone(),
            outcome: self.outcome.clone(),
        }
    }

    /// Status response code (text optional)
    pub fn status(&self) -> &FhirString {
        &self.status
    }

    pub fn location(&self) -> Option<&Uri> {
        self.location.as_ref()
    }

    pub fn etag(&self) -> Option<&FhirString> {
        self.etag.as_ref()
    }

    pub fn last_modified(&self) -> Option<&Instant> {
        self.last_modified.as_ref()
    }

    /// OperationOutcome with hints and warnings
    pub fn outcome(&self) -> Option<&ContainedResource> {
        self.outcome.as_ref()
    }

    pub fn hash_code(&self) -> u64 {
        self.hash.get_or_compute(|| {
            hash_of(&(
                &self.backbone,
                &self.status,
                &self.location,
                &self.etag,
                &self.last_modified,
                &self.outcome,
            ))
        })
    }
}

impl Hash for BundleEntryResponse {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl HasId for BundleEntryResponse {
    fn id(&self) -> Option<&str> {
        self.backbone.element.id()
    }
}

impl HasExtensions for BundleEntryResponse {
    fn extension(&self) -> &[Extension] {
        &self.backbone.element.extension
    }
}

impl HasModifierExtensions for BundleEntryResponse {
    fn modifier_extension(&self) -> &[Extension] {
        &self.backbone.modifier_extension
    }
}

impl Element for BundleEntryResponse {
    fn has_children(&self) -> bool {
        true
    }
}

impl BackboneElement for BundleEntryResponse {}

impl Constrained for BundleEntryResponse {
    const TYPE_NAME: &'static str = "Bundle.entry.response";
    const BASE: Option<&'static str> = Some("BackboneElement");
    const CONSTRAINTS: &'static [Constraint] = &[];
}

impl Visitable for BundleEntryResponse {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn fields(&self) -> &'static [FieldDescriptor] {
        BUNDLE_ENTRY_RESPONSE_FIELDS
    }

    fn walk<'a>(&'a self, walker: &mut Walker<'a, '_>) {
        self.backbone.walk(walker);
        walker.element(&BUNDLE_ENTRY_RESPONSE_FIELDS[3], Some(&self.status));
        walker.element(&BUNDLE_ENTRY_RESPONSE_FIELDS[4], self.location.as_ref());
        walker.element(&BUNDLE_ENTRY_RESPONSE_FIELDS[5], self.etag.as_ref());
        walker.element(&BUNDLE_ENTRY_RESPONSE_FIELDS[6], self.last_modified.as_ref());
        walker.resource(&BUNDLE_ENTRY_RESPONSE_FIELDS[7], self.outcome.as_ref());
    }
}

#[derive(Debug, Clone, Default)]
pub struct BundleEntryResponseBuilder {
    backbone: BackboneFields,
    status: Option<FhirString>,
    location: Option<Uri>,
    etag: Option<FhirString>,
    last_modified: Option<Instant>,
    outcome: Option<ContainedResource>,
}

impl BundleEntryResponseBuilder {
    pub fn status(mut self, status: impl Into<FhirString>) -> Self {
        self.status = present(status.into());
        self
    }

    pub fn location(mut self, location: impl Into<Uri>) -> Self {
        self.location = present(location.into());
        self
    }

    pub fn etag(mut self, etag: impl Into<FhirString>) -> Self {
        self.etag = present(etag.into());
        self
    }

    pub fn last_modified(mut self, last_modified: impl Into<Instant>) -> Self {
        self.last_modified = present(last_modified.into());
        self
    }

    pub fn outcome(mut self, outcome: impl Into<ContainedResource>) -> Self {
        self.outcome = Some(outcome.into());
        self
    }

    pub fn build(self) -> Result<BundleEntryResponse> {
        let response = BundleEntryResponse {
            backbone: self.backbone,
            status: BUNDLE_ENTRY_RESPONSE_FIELDS[3]
                .require(BundleEntryResponse::TYPE_NAME, self.status)?,
            location: self.location,
            etag: self.etag,
            last_modified: self.last_modified,
            outcome: self.outcome,
            hash: HashCache::new(),
        };
        check_primitives(&response, BundleEntryResponse::TYPE_NAME)?;
        Ok(response)
    }
}

impl ElementBuilder for BundleEntryResponseBuilder {
    fn element_fields(&mut self) -> &mut ElementFields {
        &mut self.backbone.element
    }
}

impl BackboneElementBuilder for BundleEntryResponseBuilder {
    fn backbone_fields(&mut self) -> &mut BackboneFields {
        &mut self.backbone
    }
}

const BUNDLE_ENTRY_FIELDS: &[FieldDescriptor] = &[
    ID,
    EXTENSION,
    MODIFIER_EXTENSION,
    FieldDescriptor::repeated("link", "Bundle.link"),
    FieldDescriptor::optional("fullUrl", "uri"),
    FieldDescriptor::resource("resource", Cardinality::OPTIONAL),
    FieldDescriptor::optional("search", "Bundle.entry.search"),
    FieldDescriptor::optional("request", "Bundle.entry.request"),
    FieldDescriptor::optional("response", "Bundle.entry.response"),
];

/// An entry in a bundle: a resource, or information about one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleEntry {
    backbone: BackboneFields,
    link: Vec<BundleLink>,
    full_url: Option<Uri>,
    resource: Option<ContainedResource>,
    search: Option<BundleEntrySearch>,
    request: Option<BundleEntryRequest>,
    response: Option<BundleEntryResponse>,
    hash: HashCache,
}

impl BundleEntry {
    pub fn builder() -> BundleEntryBuilder {
        BundleEntryBuilder::default()
    }

    pub fn to_builder(&self) -> BundleEntryBuilder {
        BundleEntryBuilder {
            backbone: self.backbone.clone(),
            link: self.link.clone(),
            full_url: self.full_url.clone(),
            resource: self.resource.clone(),
            search: self.search.clone(),
            request: self.request.clone(),
            response: self.response.clone(),
        }
    }

    pub fn link(&self) -> &[BundleLink] {
        &self.link
    }

    /// URI for the resource (absolute URL server address or a URN)
    pub fn full_url(&self) -> Option<&Uri> {
        self.full_url.as_ref()
    }

    pub fn resource(&self) -> Option<&ContainedResource> {
        self.resource.as_ref()
    }

    pub fn search(&self) -> Option<&BundleEntrySearch> {
        self.search.as_ref()
    }

    pub fn request(&self) -> Option<&BundleEntryRequest> {
        self.request.as_ref()
    }

    pub fn response(&self) -> Option<&BundleEntryResponse> {
        self.response.as_ref()
    }

    pub fn hash_code(&self) -> u64 {
        self.hash.get_or_compute(|| {
            hash_of(&(
                &self.backbone,
                &self.link,
                &self.full_url,
                &self.resource,
                &self.search,
                &self.request,
                &self.response,
            ))
        })
    }
}

impl Hash for BundleEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl HasId for BundleEntry {
    fn id(&self) -> Option<&str> {
        self.backbone.element.id()
    }
}

impl HasExtensions for BundleEntry {
    fn extension(&self) -> &[Extension] {
        &self.backbone.element.extension
    }
}

impl HasModifierExtensions for BundleEntry {
    fn modifier_extension(&self) -> &[Extension] {
        &self.backbone.modifier_extension
    }
}

impl Element for BundleEntry {
    fn has_children(&self) -> bool {
        !self.backbone.modifier_extension.is_empty()
            || !self.link.is_empty()
            || self.full_url.is_some()
            || self.resource.is_some()
            || self.search.is_some()
            || self.request.is_some()
            || self.response.is_some()
    }
}

impl BackboneElement for BundleEntry {}

impl Constrained for BundleEntry {
    const TYPE_NAME: &'static str = "Bundle.entry";
    const BASE: Option<&'static str> = Some("BackboneElement");
    const CONSTRAINTS: &'static [Constraint] = ENTRY_CONSTRAINTS;
}

impl Visitable for BundleEntry {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn fields(&self) -> &'static [FieldDescriptor] {
        BUNDLE_ENTRY_FIELDS
    }

    fn walk<'a>(&'a self, walker: &mut Walker<'a, '_>) {
        self.backbone.walk(walker);
        walker.elements(&BUNDLE_ENTRY_FIELDS[3], &self.link);
        walker.element(&BUNDLE_ENTRY_FIELDS[4], self.full_url.as_ref());
        walker.resource(&BUNDLE_ENTRY_FIELDS[5], self.resource.as_ref());
        walker.element(&BUNDLE_ENTRY_FIELDS[6], self.search.as_ref());
        walker.element(&BUNDLE_ENTRY_FIELDS[7], self.request.as_ref());
        walker.element(&BUNDLE_ENTRY_FIELDS[8], self.response.as_ref());
    }

    fn constraints(&self) -> &'static [Constraint] {
        ENTRY_CONSTRAINTS
    }
}

#[derive(Debug, Clone, Default)]
pub struct BundleEntryBuilder {
    backbone: BackboneFields,
    link: Vec<BundleLink>,
    full_url: Option<Uri>,
    resource: Option<ContainedResource>,
    search: Option<BundleEntrySearch>,
    request: Option<BundleEntryRequest>,
    response: Option<BundleEntryResponse>,
}

impl BundleEntryBuilder {
    /// Append to `link`
    pub fn link(mut self, link: impl IntoIterator<Item = BundleLink>) -> Self {
        extend_present(&mut self.link, link);
        self
    }

    /// Replace `link`
    pub fn set_link(mut self, link: impl IntoIterator<Item = BundleLink>) -> Self {
        replace_present(&mut self.link, link);
        self
    }

    pub fn full_url(mut self, full_url: impl Into<Uri>) -> Self {
        self.full_url = present(full_url.into());
        self
    }

    pub fn resource(mut self, resource: impl Into<ContainedResource>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn search(mut self, search: BundleEntrySearch) -> Self {
        self.search = present(search);
        self
    }

    pub fn request(mut self, request: BundleEntryRequest) -> Self {
        self.request = present(request);
        self
    }

    pub fn response(mut self, response: BundleEntryResponse) -> Self {
        self.response = present(response);
        self
    }

    pub fn build(self) -> Result<BundleEntry> {
        let entry = BundleEntry {
            backbone: self.backbone,
            link: self.link,
            full_url: self.full_url,
            resource: self.resource,
            search: self.search,
            request: self.request,
            response: self.response,
            hash: HashCache::new(),
        };
        check_primitives(&entry, BundleEntry::TYPE_NAME)?;
        Ok(entry)
    }
}

impl ElementBuilder for BundleEntryBuilder {
    fn element_fields(&mut self) -> &mut ElementFields {
        &mut self.backbone.element
    }
}

impl BackboneElementBuilder for BundleEntryBuilder {
    fn backbone_fields(&mut self) -> &mut BackboneFields {
        &mut self.backbone
    }
}

const BUNDLE_FIELDS: &[FieldDescriptor] = &[
    RESOURCE_ID,
    META,
    IMPLICIT_RULES,
    LANGUAGE,
    FieldDescriptor::optional("identifier", "Identifier"),
    FieldDescriptor::required("type", "code"),
    FieldDescriptor::optional("timestamp", "instant"),
    FieldDescriptor::optional("total", "unsignedInt"),
    FieldDescriptor::repeated("link", "Bundle.link"),
    FieldDescriptor::repeated("entry", "Bundle.entry"),
];

/// A container for a collection of resources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    resource: ResourceFields,
    identifier: Option<Identifier>,
    type_: Code,
    timestamp: Option<Instant>,
    total: Option<UnsignedInt>,
    link: Vec<BundleLink>,
    entry: Vec<BundleEntry>,
    hash: HashCache,
}

impl Bundle {
    pub fn builder(type_: impl Into<Code>) -> BundleBuilder {
        BundleBuilder::default().type_(type_)
    }

    pub fn to_builder(&self) -> BundleBuilder {
        BundleBuilder {
            resource: self.resource.clone(),
            identifier: self.identifier.clone(),
            type_: Some(self.type_.clone()),
            timestamp: self.timestamp.clone(),
            total: self.total.clone(),
            link: self.link.clone(),
            entry: self.entry.clone(),
        }
    }

    /// Persistent identifier for the bundle
    pub fn identifier(&self) -> Option<&Identifier> {
        self.identifier.as_ref()
    }

    /// document | message | transaction | batch | history | searchset | collection | ...
    pub fn type_(&self) -> &Code {
        &self.type_
    }

    /// When the bundle was assembled
    pub fn timestamp(&self) -> Option<&Instant> {
        self.timestamp.as_ref()
    }

    /// If search, the total number of matches
    pub fn total(&self) -> Option<&UnsignedInt> {
        self.total.as_ref()
    }

    pub fn link(&self) -> &[BundleLink] {
        &self.link
    }

    pub fn entry(&self) -> &[BundleEntry] {
        &self.entry
    }

    /// The first link with the given relation
    pub fn link_by_relation(&self, relation: &str) -> Option<&BundleLink> {
        self.link
            .iter()
            .find(|link| link.relation().as_str() == Some(relation))
    }
}

impl Hash for Bundle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(Resource::hash_code(self));
    }
}

impl HasId for Bundle {
    fn id(&self) -> Option<&str> {
        self.resource.id.as_deref()
    }
}

impl Resource for Bundle {
    fn resource_fields(&self) -> &ResourceFields {
        &self.resource
    }

    fn as_visitable(&self) -> &dyn Visitable {
        self
    }

    fn hash_code(&self) -> u64 {
        self.hash.get_or_compute(|| {
            hash_of(&(
                &self.resource,
                &self.identifier,
                &self.type_,
                &self.timestamp,
                &self.total,
                &self.link,
                &self.entry,
            ))
        })
    }

    fn eq_dyn(&self, other: &dyn Resource) -> bool {
        resource_eq(self, other)
    }
}

impl Constrained for Bundle {
    const TYPE_NAME: &'static str = "Bundle";
    const BASE: Option<&'static str> = Some("Resource");
    const CONSTRAINTS: &'static [Constraint] = BUNDLE_CONSTRAINTS;
}

impl Visitable for Bundle {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn fields(&self) -> &'static [FieldDescriptor] {
        BUNDLE_FIELDS
    }

    fn walk<'a>(&'a self, walker: &mut Walker<'a, '_>) {
        self.resource.walk(walker);
        walker.element(&BUNDLE_FIELDS[4], self.identifier.as_ref());
        walker.element(&BUNDLE_FIELDS[5], Some(&self.type_));
        walker.element(&BUNDLE_FIELDS[6], self.timestamp.as_ref());
        walker.element(&BUNDLE_FIELDS[7], self.total.as_ref());
        walker.elements(&BUNDLE_FIELDS[8], &self.link);
        walker.elements(&BUNDLE_FIELDS[9], &self.entry);
    }

    fn constraints(&self) -> &'static [Constraint] {
        BUNDLE_CONSTRAINTS
    }
}

#[derive(Debug, Clone, Default)]
pub struct BundleBuilder {
    resource: ResourceFields,
    identifier: Option<Identifier>,
    type_: Option<Code>,
    timestamp: Option<Instant>,
    total: Option<UnsignedInt>,
    link: Vec<BundleLink>,
    entry: Vec<BundleEntry>,
}

impl BundleBuilder {
    pub fn identifier(mut self, identifier: Identifier) -> Self {
        self.identifier = present(identifier);
        self
    }

    pub fn type_(mut self, type_: impl Into<Code>) -> Self {
        self.type_ = present(type_.into());
        self
    }

    pub fn timestamp(mut self, timestamp: impl Into<Instant>) -> Self {
        self.timestamp = present(timestamp.into());
        self
    }

    pub fn total(mut self, total: impl Into<UnsignedInt>) -> Self {
        self.total = present(total.into());
        self
    }

    /// Append to `link`
    pub fn link(mut self, link: impl IntoIterator<Item = BundleLink>) -> Self {
        extend_present(&mut self.link, link);
        self
    }

    /// Replace `link`
    pub fn set_link(mut self, link: impl IntoIterator<Item = BundleLink>) -> Self {
        replace_present(&mut self.link, link);
        self
    }

    /// Append to `entry`
    pub fn entry(mut self, entry: impl IntoIterator<Item = BundleEntry>) -> Self {
        extend_present(&mut self.entry, entry);
        self
    }

    /// Replace `entry`
    pub fn set_entry(mut self, entry: impl IntoIterator<Item = BundleEntry>) -> Self {
        replace_present(&mut self.entry, entry);
        self
    }

    pub fn build(self) -> Result<Bundle> {
        let bundle = Bundle {
            resource: self.resource,
            identifier: self.identifier,
            type_: BUNDLE_FIELDS[5].require(Bundle::TYPE_NAME, self.type_)?,
            timestamp: self.timestamp,
            total: self.total,
            link: self.link,
            entry: self.entry,
            hash: HashCache::new(),
        };
        bundle.resource.check_id(Bundle::TYPE_NAME)?;
        check_primitives(&bundle, Bundle::TYPE_NAME)?;
        Ok(bundle)
    }
}

impl ResourceBuilder for BundleBuilder {
    fn resource_fields(&mut self) -> &mut ResourceFields {
        &mut self.resource
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrum_elements::error::Error;

    #[test]
    fn type_is_required() {
        let err = BundleBuilder::default().build().unwrap_err();
        assert!(matches!(
            err,
            Error::RequiredFieldMissing {
                type_name: "Bundle",
                field: "type"
            }
        ));
    }

    #[test]
    fn link_requires_relation_and_url() {
        let err = BundleLinkBuilder::default()
            .url("http://x/1")
            .build()
            .unwrap_err();
        assert_eq!(err.field(), Some("relation"));

        let err = BundleLinkBuilder::default()
            .relation("self")
            .build()
            .unwrap_err();
        assert_eq!(err.field(), Some("url"));
    }

    #[test]
    fn finds_links_by_relation() {
        let bundle = Bundle::builder("searchset")
            .link([
                BundleLink::builder("self", "http://x/1").build().unwrap(),
                BundleLink::builder("next", "http://x/2").build().unwrap(),
            ])
            .build()
            .unwrap();

        let next = bundle.link_by_relation("next").unwrap();
        assert_eq!(next.url().as_str(), Some("http://x/2"));
        assert!(bundle.link_by_relation("prev").is_none());
    }

    #[test]
    fn entry_constraints_are_attached_to_the_entry() {
        let entry = BundleEntry::builder().full_url("urn:uuid:1").build().unwrap();
        let ids: Vec<_> = entry.constraints().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["bdl-5", "bdl-8"]);
        assert_eq!(entry.constraints()[0].location, "Bundle.entry");
    }
}

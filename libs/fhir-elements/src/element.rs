//! Element base fields and capability traits
//!
//! The standard's class chain (Element → BackboneElement, Resource →
//! DomainResource) is expressed as small capability traits implemented by each
//! concrete type. Builders get the ancestor setters through the matching
//! builder traits, which return `Self` so fluent chains stay typed at the
//! concrete builder.

use crate::constraint::Constraint;
use crate::datatypes::Narrative;
use crate::descriptor::{EXTENSION, ID, MODIFIER_EXTENSION};
use crate::extension::Extension;
use crate::visitor::{RawValue, Visitable, Walker};

/// Types with a local identifier
pub trait HasId {
    fn id(&self) -> Option<&str>;
}

/// Types carrying extensions
pub trait HasExtensions {
    fn extension(&self) -> &[Extension];

    /// Extensions with the given URL, in order
    fn extensions_by_url<'s>(&'s self, url: &'s str) -> Box<dyn Iterator<Item = &'s Extension> + 's> {
        Box::new(self.extension().iter().filter(move |e| e.url() == url))
    }
}

/// Types carrying modifier extensions
pub trait HasModifierExtensions {
    fn modifier_extension(&self) -> &[Extension];
}

/// Types carrying a human-readable narrative
pub trait HasNarrative {
    fn text(&self) -> Option<&Narrative>;
}

/// Base unit of the model
pub trait Element: Visitable + HasId + HasExtensions {
    /// Whether any field beyond `id` and `extension` is populated. Backbone
    /// elements count `modifierExtension` here.
    fn has_children(&self) -> bool;

    /// An element with nothing populated counts as absent in its parent.
    fn is_absent(&self) -> bool {
        self.id().is_none() && self.extension().is_empty() && !self.has_children()
    }
}

/// Element used for substructure nested inside a resource
pub trait BackboneElement: Element + HasModifierExtensions {}

/// Invariant shared by every element
pub const ELEMENT_CONSTRAINTS: &[Constraint] = &[Constraint::rule(
    "ele-1",
    crate::constraint::BASE_LOCATION,
    "All FHIR elements must have a @value or children",
    "hasValue() or (children().count() > id.count())",
)
.with_source("http://hl7.org/fhir/StructureDefinition/Element")];

/// `id` and `extension`, held by every element
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ElementFields {
    pub id: Option<String>,
    pub extension: Vec<Extension>,
}

impl ElementFields {
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.extension.is_empty()
    }

    pub fn walk<'a>(&'a self, walker: &mut Walker<'a, '_>) {
        walker.value(&ID, self.id.as_deref().map(RawValue::String));
        walker.elements(&EXTENSION, &self.extension);
    }
}

/// Element fields plus `modifierExtension`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BackboneFields {
    pub element: ElementFields,
    pub modifier_extension: Vec<Extension>,
}

impl BackboneFields {
    pub fn is_empty(&self) -> bool {
        self.element.is_empty() && self.modifier_extension.is_empty()
    }

    pub fn walk<'a>(&'a self, walker: &mut Walker<'a, '_>) {
        self.element.walk(walker);
        walker.elements(&MODIFIER_EXTENSION, &self.modifier_extension);
    }
}

/// Keep `value` only if it is not an absent element.
pub fn present<T: Element>(value: T) -> Option<T> {
    if value.is_absent() {
        None
    } else {
        Some(value)
    }
}

/// Append the non-absent elements of `values`, preserving their order.
pub fn extend_present<T: Element>(target: &mut Vec<T>, values: impl IntoIterator<Item = T>) {
    target.extend(values.into_iter().filter(|v| !v.is_absent()));
}

/// Discard `target` and install the non-absent elements of `values`.
pub fn replace_present<T: Element>(target: &mut Vec<T>, values: impl IntoIterator<Item = T>) {
    target.clear();
    extend_present(target, values);
}

/// Setters shared by every element builder
pub trait ElementBuilder: Sized {
    fn element_fields(&mut self) -> &mut ElementFields;

    fn id(mut self, id: impl Into<String>) -> Self {
        self.element_fields().id = Some(id.into());
        self
    }

    /// Append extensions
    fn extension(mut self, extension: impl IntoIterator<Item = Extension>) -> Self {
        extend_present(&mut self.element_fields().extension, extension);
        self
    }

    /// Replace all extensions
    fn set_extension(mut self, extension: impl IntoIterator<Item = Extension>) -> Self {
        replace_present(&mut self.element_fields().extension, extension);
        self
    }
}

/// Setters shared by every backbone element builder
pub trait BackboneElementBuilder: ElementBuilder {
    fn backbone_fields(&mut self) -> &mut BackboneFields;

    /// Append modifier extensions
    fn modifier_extension(mut self, extension: impl IntoIterator<Item = Extension>) -> Self {
        extend_present(&mut self.backbone_fields().modifier_extension, extension);
        self
    }

    /// Replace all modifier extensions
    fn set_modifier_extension(mut self, extension: impl IntoIterator<Item = Extension>) -> Self {
        replace_present(&mut self.backbone_fields().modifier_extension, extension);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::Coding;
    use crate::primitive::{Code, FhirString};

    #[test]
    fn empty_element_is_absent() {
        let coding = Coding::builder().build().unwrap();
        assert!(coding.is_absent());
        assert_eq!(present(coding), None);

        let with_id = Coding::builder().id("a").build().unwrap();
        assert!(!with_id.is_absent());
    }

    #[test]
    fn extend_present_drops_absent_elements() {
        let mut codings = Vec::new();
        extend_present(
            &mut codings,
            [
                Coding::builder().code(Code::from("a")).build().unwrap(),
                Coding::builder().build().unwrap(),
                Coding::builder().code(Code::from("b")).build().unwrap(),
            ],
        );
        assert_eq!(codings.len(), 2);

        replace_present(
            &mut codings,
            [Coding::builder().display(FhirString::from("c")).build().unwrap()],
        );
        assert_eq!(codings.len(), 1);
        assert_eq!(codings[0].display().and_then(|d| d.value()).map(String::as_str), Some("c"));
    }

    #[test]
    fn extensions_by_url_filters_in_order() {
        let coding = Coding::builder()
            .extension([
                crate::Extension::builder("http://a").value(Code::from("1")).build().unwrap(),
                crate::Extension::builder("http://b").value(Code::from("2")).build().unwrap(),
                crate::Extension::builder("http://a").value(Code::from("3")).build().unwrap(),
            ])
            .build()
            .unwrap();

        assert_eq!(coding.extensions_by_url("http://a").count(), 2);
    }
}

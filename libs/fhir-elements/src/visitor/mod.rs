//! Generic traversal protocol
//!
//! Every element and resource implements [`Visitable`], which exposes its
//! runtime type name, its field descriptor table and a `walk` method that
//! enumerates its populated fields through a [`Walker`]. The walker owns the
//! traversal rules (hook order, repeated-field indexing, skipping absent
//! fields), so consumers such as encoders, validators and indexers only
//! implement [`Visitor`].
//!
//! For each node the engine calls, in order:
//!
//! 1. `pre_visit(node)`; if it returns false nothing else fires for the node
//! 2. `visit_start(position, node)`
//! 3. `visit(position, node)`; if it returns true every populated field is
//!    accepted recursively in declaration order
//! 4. `visit_end(position, node)`
//! 5. `post_visit(node)`
//!
//! Raw leaf values (element ids, the value of a primitive) are reported through
//! `visit_value` while their owner's fields are walked.

mod collecting;
mod modifier;
mod path;

pub use collecting::{collect, CollectingVisitor};
pub use modifier::{find_unknown_modifiers, ModifierExtensionScan};
pub use path::{PathAware, PathVisitor};

use std::any::Any;
use std::fmt;

use rust_decimal::Decimal;

use crate::choice::DataValue;
use crate::constraint::Constraint;
use crate::descriptor::FieldDescriptor;
use crate::error::Result;
use crate::resource::ContainedResource;

/// Where a node sits within its parent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPosition<'n> {
    /// Declared field name (or the root name passed to `accept`)
    pub name: &'n str,
    /// Position within a repeated field
    pub index: Option<usize>,
    /// The field is a choice field; branch on the node's runtime type
    pub choice: bool,
}

impl<'n> FieldPosition<'n> {
    pub fn single(name: &'n str) -> Self {
        Self {
            name,
            index: None,
            choice: false,
        }
    }

    pub fn indexed(name: &'n str, index: usize) -> Self {
        Self {
            name,
            index: Some(index),
            choice: false,
        }
    }

    pub fn choice(name: &'n str) -> Self {
        Self {
            name,
            index: None,
            choice: true,
        }
    }
}

/// A raw leaf value carried by an element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawValue<'a> {
    Boolean(bool),
    Integer(i32),
    UnsignedInt(u32),
    Decimal(&'a Decimal),
    String(&'a str),
}

impl RawValue<'_> {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RawValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for RawValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Boolean(b) => write!(f, "{}", b),
            RawValue::Integer(i) => write!(f, "{}", i),
            RawValue::UnsignedInt(u) => write!(f, "{}", u),
            RawValue::Decimal(d) => write!(f, "{}", d),
            RawValue::String(s) => f.write_str(s),
        }
    }
}

/// A node that can be walked generically
pub trait Visitable: Any + fmt::Debug + Send + Sync + 'static {
    /// Runtime type name as defined by the standard (e.g. "Coding", "dateTime")
    fn type_name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    /// Declared fields, in declaration order
    fn fields(&self) -> &'static [FieldDescriptor];

    /// Offer every populated field to the walker, in declaration order.
    fn walk<'a>(&'a self, walker: &mut Walker<'a, '_>);

    /// Structural invariants declared for this type
    fn constraints(&self) -> &'static [Constraint] {
        &[]
    }

    /// The node's own raw value, for primitives
    fn primitive_value(&self) -> Option<RawValue<'_>> {
        None
    }

    /// Check the lexical form of a primitive's value. Non-primitives have
    /// nothing to check.
    fn check_value(&self) -> std::result::Result<(), &'static str> {
        Ok(())
    }

    /// Walk this node as the root of a traversal.
    fn accept<'a>(&'a self, name: &str, visitor: &mut dyn Visitor<'a>)
    where
        Self: Sized,
    {
        accept(self, name, visitor)
    }
}

impl dyn Visitable {
    /// Downcast to a concrete node type
    pub fn downcast_ref<T: Visitable>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn is<T: Visitable>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

/// Traversal callbacks.
///
/// `'a` is the lifetime of the instance being walked, so visitors may keep
/// references to the nodes they are offered.
pub trait Visitor<'a> {
    /// Decide whether to enter the node at all.
    fn pre_visit(&mut self, _node: &'a dyn Visitable) -> bool {
        true
    }

    fn visit_start(&mut self, _position: &FieldPosition<'_>, _node: &'a dyn Visitable) {}

    /// Decide whether to descend into the node's fields.
    fn visit(&mut self, _position: &FieldPosition<'_>, _node: &'a dyn Visitable) -> bool {
        true
    }

    /// A raw leaf value of the node currently being walked
    fn visit_value(&mut self, _position: &FieldPosition<'_>, _value: RawValue<'a>) {}

    fn visit_end(&mut self, _position: &FieldPosition<'_>, _node: &'a dyn Visitable) {}

    fn post_visit(&mut self, _node: &'a dyn Visitable) {}
}

/// Walk `node` as the root of a traversal, reporting it under `name`.
pub fn accept<'a>(node: &'a dyn Visitable, name: &str, visitor: &mut dyn Visitor<'a>) {
    accept_at(node, FieldPosition::single(name), visitor);
}

fn accept_at<'a>(node: &'a dyn Visitable, position: FieldPosition<'_>, visitor: &mut dyn Visitor<'a>) {
    if !visitor.pre_visit(node) {
        return;
    }

    visitor.visit_start(&position, node);
    if visitor.visit(&position, node) {
        let mut walker = Walker {
            visitor: &mut *visitor,
        };
        node.walk(&mut walker);
    }
    visitor.visit_end(&position, node);
    visitor.post_visit(node);
}

/// Drives a visitor over the fields of one node.
///
/// Types call the method matching each field's shape; absent optional values
/// and empty repeated fields produce no calls.
pub struct Walker<'a, 'v> {
    visitor: &'v mut dyn Visitor<'a>,
}

impl<'a, 'v> Walker<'a, 'v> {
    pub fn value(&mut self, field: &FieldDescriptor, value: Option<RawValue<'a>>) {
        if let Some(value) = value {
            self.visitor
                .visit_value(&FieldPosition::single(field.name), value);
        }
    }

    pub fn element<T: Visitable>(&mut self, field: &FieldDescriptor, value: Option<&'a T>) {
        if let Some(value) = value {
            accept_at(value, FieldPosition::single(field.name), &mut *self.visitor);
        }
    }

    pub fn elements<T: Visitable>(&mut self, field: &FieldDescriptor, values: &'a [T]) {
        for (index, value) in values.iter().enumerate() {
            accept_at(
                value,
                FieldPosition::indexed(field.name, index),
                &mut *self.visitor,
            );
        }
    }

    pub fn choice(&mut self, field: &FieldDescriptor, value: Option<&'a DataValue>) {
        if let Some(value) = value {
            accept_at(
                value.as_visitable(),
                FieldPosition::choice(field.name),
                &mut *self.visitor,
            );
        }
    }

    pub fn resource(&mut self, field: &FieldDescriptor, value: Option<&'a ContainedResource>) {
        if let Some(value) = value {
            accept_at(
                value.as_visitable(),
                FieldPosition::single(field.name),
                &mut *self.visitor,
            );
        }
    }

    pub fn resources(&mut self, field: &FieldDescriptor, values: &'a [ContainedResource]) {
        for (index, value) in values.iter().enumerate() {
            accept_at(
                value.as_visitable(),
                FieldPosition::indexed(field.name, index),
                &mut *self.visitor,
            );
        }
    }
}

/// Check the primitive values an instance holds directly.
///
/// Visits the root and its immediate fields only: anything deeper belongs to
/// an element that was checked when it was built.
pub fn check_primitives(node: &dyn Visitable, type_name: &'static str) -> Result<()> {
    struct PrimitiveCheck {
        type_name: &'static str,
        depth: usize,
        failure: Option<crate::Error>,
    }

    impl<'a> Visitor<'a> for PrimitiveCheck {
        fn pre_visit(&mut self, _node: &'a dyn Visitable) -> bool {
            self.failure.is_none()
        }

        fn visit(&mut self, position: &FieldPosition<'_>, node: &'a dyn Visitable) -> bool {
            self.depth += 1;
            if let Err(reason) = node.check_value() {
                tracing::debug!(
                    type_name = self.type_name,
                    field = position.name,
                    reason,
                    "invalid primitive value"
                );
                self.failure = Some(crate::Error::InvalidPrimitiveValue {
                    type_name: self.type_name,
                    field: position.name.to_string(),
                    value: node
                        .primitive_value()
                        .map(|value| value.to_string())
                        .unwrap_or_default(),
                    reason,
                });
                return false;
            }
            self.depth == 1
        }

        fn visit_end(&mut self, _position: &FieldPosition<'_>, _node: &'a dyn Visitable) {
            self.depth -= 1;
        }
    }

    let mut check = PrimitiveCheck {
        type_name,
        depth: 0,
        failure: None,
    };
    accept(node, type_name, &mut check);
    match check.failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::Coding;
    use crate::extension::Extension;
    use crate::prelude::*;
    use crate::primitive::{Code, FhirString, Uri};

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        skip: Option<&'static str>,
    }

    impl<'a> Visitor<'a> for Recorder {
        fn visit_start(&mut self, position: &FieldPosition<'_>, node: &'a dyn Visitable) {
            self.events
                .push(format!("start {}:{}", position.name, node.type_name()));
        }

        fn visit(&mut self, _position: &FieldPosition<'_>, node: &'a dyn Visitable) -> bool {
            Some(node.type_name()) != self.skip
        }

        fn visit_value(&mut self, position: &FieldPosition<'_>, value: RawValue<'a>) {
            self.events.push(format!("value {}={}", position.name, value));
        }

        fn visit_end(&mut self, position: &FieldPosition<'_>, node: &'a dyn Visitable) {
            self.events
                .push(format!("end {}:{}", position.name, node.type_name()));
        }
    }

    fn coding() -> Coding {
        Coding::builder()
            .id("c1")
            .extension([Extension::builder("http://example.org/ext")
                .value(FhirString::from("x"))
                .build()
                .unwrap()])
            .system(Uri::from("http://loinc.org"))
            .code(Code::from("1234-5"))
            .build()
            .unwrap()
    }

    #[test]
    fn walks_fields_in_declaration_order() {
        let coding = coding();
        let mut recorder = Recorder::default();
        coding.accept("coding", &mut recorder);

        assert_eq!(
            recorder.events,
            vec![
                "start coding:Coding",
                "value id=c1",
                "start extension:Extension",
                "value url=http://example.org/ext",
                "start value:string",
                "value value=x",
                "end value:string",
                "end extension:Extension",
                "start system:uri",
                "value value=http://loinc.org",
                "end system:uri",
                "start code:code",
                "value value=1234-5",
                "end code:code",
                "end coding:Coding",
            ]
        );
    }

    #[test]
    fn declined_visit_skips_children_but_closes_node() {
        let coding = coding();
        let mut recorder = Recorder {
            skip: Some("Extension"),
            ..Default::default()
        };
        coding.accept("coding", &mut recorder);

        assert!(recorder.events.contains(&"start extension:Extension".to_string()));
        assert!(recorder.events.contains(&"end extension:Extension".to_string()));
        assert!(!recorder.events.contains(&"start value:string".to_string()));
    }

    #[test]
    fn downcast_from_dyn_node() {
        let coding = coding();
        let node: &dyn Visitable = &coding;
        assert!(node.is::<Coding>());
        assert_eq!(node.downcast_ref::<Coding>(), Some(&coding));
    }
}

//! Path tracking for visitors that report locations
//!
//! Paths use the FHIRPath-style form the standard uses for locations:
//! `Bundle.entry[1].resource.name[0].family`. Singular fields have no index.

use super::{FieldPosition, RawValue, Visitable, Visitor};

/// A visitor that receives the path of every node it is offered
pub trait PathVisitor<'a> {
    /// Entering a node; return false to skip its fields.
    fn enter(&mut self, _path: &str, _position: &FieldPosition<'_>, _node: &'a dyn Visitable) -> bool {
        true
    }

    fn leave(&mut self, _path: &str, _node: &'a dyn Visitable) {}

    /// A raw value at `path` (e.g. `Patient.name[0].family.value`)
    fn value(&mut self, _path: &str, _value: RawValue<'a>) {}
}

/// Adapts a [`PathVisitor`] to the traversal protocol.
pub struct PathAware<V> {
    inner: V,
    path: String,
    segments: Vec<usize>,
}

impl<V> PathAware<V> {
    pub fn new(inner: V) -> Self {
        Self {
            inner,
            path: String::new(),
            segments: Vec::new(),
        }
    }

    pub fn inner(&self) -> &V {
        &self.inner
    }

    pub fn into_inner(self) -> V {
        self.inner
    }

    /// Path of the node currently being visited
    pub fn path(&self) -> &str {
        &self.path
    }

    fn push(&mut self, position: &FieldPosition<'_>) {
        self.segments.push(self.path.len());
        if !self.path.is_empty() {
            self.path.push('.');
        }
        self.path.push_str(position.name);
        if let Some(index) = position.index {
            self.path.push('[');
            self.path.push_str(&index.to_string());
            self.path.push(']');
        }
    }

    fn pop(&mut self) {
        if let Some(len) = self.segments.pop() {
            self.path.truncate(len);
        }
    }
}

impl<'a, V: PathVisitor<'a>> Visitor<'a> for PathAware<V> {
    fn visit_start(&mut self, position: &FieldPosition<'_>, _node: &'a dyn Visitable) {
        self.push(position);
    }

    fn visit(&mut self, position: &FieldPosition<'_>, node: &'a dyn Visitable) -> bool {
        self.inner.enter(&self.path, position, node)
    }

    fn visit_value(&mut self, position: &FieldPosition<'_>, value: RawValue<'a>) {
        let path = format!("{}.{}", self.path, position.name);
        self.inner.value(&path, value);
    }

    fn visit_end(&mut self, _position: &FieldPosition<'_>, node: &'a dyn Visitable) {
        self.inner.leave(&self.path, node);
        self.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::{CodeableConcept, Coding};
    use crate::primitive::{Code, Uri};
    use crate::visitor::accept;

    #[derive(Default)]
    struct Paths(Vec<String>);

    impl<'a> PathVisitor<'a> for Paths {
        fn enter(&mut self, path: &str, _position: &FieldPosition<'_>, _node: &'a dyn Visitable) -> bool {
            self.0.push(path.to_string());
            true
        }

        fn value(&mut self, path: &str, value: RawValue<'a>) {
            self.0.push(format!("{path}={value}"));
        }
    }

    #[test]
    fn builds_indexed_paths() {
        let concept = CodeableConcept::builder()
            .coding([
                Coding::builder()
                    .system(Uri::from("http://snomed.info/sct"))
                    .build()
                    .unwrap(),
                Coding::builder().code(Code::from("x")).build().unwrap(),
            ])
            .build()
            .unwrap();

        let mut visitor = PathAware::new(Paths::default());
        accept(&concept, "CodeableConcept", &mut visitor);

        assert_eq!(
            visitor.into_inner().0,
            vec![
                "CodeableConcept",
                "CodeableConcept.coding[0]",
                "CodeableConcept.coding[0].system",
                "CodeableConcept.coding[0].system.value=http://snomed.info/sct",
                "CodeableConcept.coding[1]",
                "CodeableConcept.coding[1].code",
                "CodeableConcept.coding[1].code.value=x",
            ]
        );
    }
}

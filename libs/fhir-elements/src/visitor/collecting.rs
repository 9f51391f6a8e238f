use super::{accept, FieldPosition, Visitable, Visitor};

/// Collects every node of type `T` reachable from the root, in traversal order.
pub struct CollectingVisitor<'a, T> {
    found: Vec<&'a T>,
}

impl<'a, T: Visitable> CollectingVisitor<'a, T> {
    pub fn new() -> Self {
        Self { found: Vec::new() }
    }

    pub fn into_results(self) -> Vec<&'a T> {
        self.found
    }
}

impl<'a, T: Visitable> Default for CollectingVisitor<'a, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T: Visitable> Visitor<'a> for CollectingVisitor<'a, T> {
    fn visit(&mut self, _position: &FieldPosition<'_>, node: &'a dyn Visitable) -> bool {
        if let Some(found) = node.downcast_ref::<T>() {
            self.found.push(found);
        }
        true
    }
}

/// Collect all nodes of type `T` within `root` (including `root` itself).
pub fn collect<'a, T: Visitable>(root: &'a dyn Visitable) -> Vec<&'a T> {
    let mut visitor = CollectingVisitor::new();
    accept(root, root.type_name(), &mut visitor);
    visitor.into_results()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::{CodeableConcept, Coding};
    use crate::primitive::Code;

    #[test]
    fn collects_nested_codings_in_order() {
        let concept = CodeableConcept::builder()
            .coding([
                Coding::builder().code(Code::from("a")).build().unwrap(),
                Coding::builder().code(Code::from("b")).build().unwrap(),
            ])
            .build()
            .unwrap();

        let codings = collect::<Coding>(&concept);
        let codes: Vec<_> = codings
            .iter()
            .filter_map(|c| c.code().and_then(|code| code.value()))
            .map(String::as_str)
            .collect();
        assert_eq!(codes, vec!["a", "b"]);
    }
}

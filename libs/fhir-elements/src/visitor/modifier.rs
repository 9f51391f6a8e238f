//! Detection of modifier extensions a consumer does not understand
//!
//! A modifier extension can change the meaning of the element that carries it.
//! A consumer that does not recognise one must treat that element as
//! unprocessable rather than silently ignoring the extension.

use std::collections::HashSet;

use super::path::{PathAware, PathVisitor};
use super::{accept, FieldPosition, Visitable};
use crate::extension::Extension;

/// Records the paths of elements carrying unknown modifier extensions.
pub struct ModifierExtensionScan<'u> {
    understood: HashSet<&'u str>,
    unprocessable: Vec<String>,
}

impl<'u> ModifierExtensionScan<'u> {
    pub fn new(understood: impl IntoIterator<Item = &'u str>) -> Self {
        Self {
            understood: understood.into_iter().collect(),
            unprocessable: Vec::new(),
        }
    }

    pub fn into_unprocessable(self) -> Vec<String> {
        self.unprocessable
    }
}

impl<'a> PathVisitor<'a> for ModifierExtensionScan<'_> {
    fn enter(&mut self, path: &str, position: &FieldPosition<'_>, node: &'a dyn Visitable) -> bool {
        if position.name != "modifierExtension" {
            return true;
        }

        if let Some(extension) = node.downcast_ref::<Extension>() {
            if !self.understood.contains(extension.url()) {
                let owner = path.rfind('.').map(|pos| &path[..pos]).unwrap_or(path);
                tracing::debug!(path = owner, url = extension.url(), "unknown modifier extension");
                if self.unprocessable.last().map(String::as_str) != Some(owner) {
                    self.unprocessable.push(owner.to_string());
                }
            }
        }
        false
    }
}

/// Paths of every element under `root` that carries a modifier extension
/// whose URL is not in `understood`.
pub fn find_unknown_modifiers<'u>(
    root: &dyn Visitable,
    understood: impl IntoIterator<Item = &'u str>,
) -> Vec<String> {
    let mut visitor = PathAware::new(ModifierExtensionScan::new(understood));
    accept(root, root.type_name(), &mut visitor);
    visitor.into_inner().into_unprocessable()
}

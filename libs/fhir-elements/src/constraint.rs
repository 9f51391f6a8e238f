//! Constraint metadata
//!
//! Constraints are structural invariants (FHIRPath expressions) declared on a
//! type. The model never evaluates them: they are handed, through the
//! [`ConstraintRegistry`], to an external rule engine.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::{BestPracticeMode, ConstraintsConfig};
use crate::datatypes::{
    CodeableConcept, Coding, HumanName, Identifier, Meta, Narrative, Period, Quantity, Reference,
    UsageContext,
};
use crate::element::ELEMENT_CONSTRAINTS;
use crate::error::Result;
use crate::extension::Extension;
use crate::primitive;
use crate::resource::DOMAIN_RESOURCE_CONSTRAINTS;

/// Location of constraints that apply to the type as a whole
pub const BASE_LOCATION: &str = "(base)";

/// Severity of a constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    /// Must hold
    Rule,
    /// Advisory
    Warning,
}

impl Level {
    /// Severity code used in `ElementDefinition.constraint`
    pub fn severity(&self) -> &'static str {
        match self {
            Level::Rule => "error",
            Level::Warning => "warning",
        }
    }
}

/// A structural invariant declared on a type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Constraint {
    pub id: &'static str,
    pub level: Level,
    /// `(base)` or a path below the type
    pub location: &'static str,
    pub description: &'static str,
    pub expression: &'static str,
    /// Canonical URL of the definition that declares the constraint
    pub source: Option<&'static str>,
}

impl Constraint {
    pub const fn rule(
        id: &'static str,
        location: &'static str,
        description: &'static str,
        expression: &'static str,
    ) -> Self {
        Self {
            id,
            level: Level::Rule,
            location,
            description,
            expression,
            source: None,
        }
    }

    pub const fn warning(
        id: &'static str,
        location: &'static str,
        description: &'static str,
        expression: &'static str,
    ) -> Self {
        Self {
            id,
            level: Level::Warning,
            location,
            description,
            expression,
            source: None,
        }
    }

    pub const fn with_source(mut self, source: &'static str) -> Self {
        self.source = Some(source);
        self
    }

    pub fn is_base(&self) -> bool {
        self.location == BASE_LOCATION
    }
}

/// Static constraint metadata of a type
pub trait Constrained {
    /// Type name as defined by the standard
    const TYPE_NAME: &'static str;
    /// The type this one derives from, whose constraints also apply
    const BASE: Option<&'static str>;
    /// Constraints declared by this type itself
    const CONSTRAINTS: &'static [Constraint];
}

/// A constraint as handed to a rule engine, with its effective level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedConstraint {
    pub constraint: &'static Constraint,
    pub level: Level,
}

#[derive(Serialize)]
struct ConstraintJson<'a> {
    key: &'a str,
    severity: &'a str,
    human: &'a str,
    expression: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'a str>,
}

#[derive(Debug, Clone, Copy)]
struct TypeEntry {
    base: Option<&'static str>,
    constraints: &'static [Constraint],
}

/// Constraint metadata of a set of types, keyed by type name
#[derive(Debug, Clone, Default)]
pub struct ConstraintRegistry {
    types: HashMap<&'static str, TypeEntry>,
}

impl ConstraintRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: Constrained>(&mut self) -> &mut Self {
        self.register_type(T::TYPE_NAME, T::BASE, T::CONSTRAINTS)
    }

    pub fn register_type(
        &mut self,
        type_name: &'static str,
        base: Option<&'static str>,
        constraints: &'static [Constraint],
    ) -> &mut Self {
        tracing::trace!(type_name, count = constraints.len(), "registering constraints");
        self.types.insert(type_name, TypeEntry { base, constraints });
        self
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.types.keys().copied()
    }

    /// Constraints declared by the type itself
    pub fn own(&self, type_name: &str) -> &'static [Constraint] {
        self.types
            .get(type_name)
            .map(|entry| entry.constraints)
            .unwrap_or(&[])
    }

    /// Constraints of the type and all of its bases, most general first
    pub fn all(&self, type_name: &str) -> Vec<&'static Constraint> {
        let mut chain: Vec<&TypeEntry> = Vec::new();
        let mut seen: Vec<&str> = Vec::new();
        let mut current = Some(type_name);

        while let Some(name) = current {
            if seen.contains(&name) {
                break;
            }
            seen.push(name);
            match self.types.get(name) {
                Some(entry) => {
                    chain.push(entry);
                    current = entry.base;
                }
                None => break,
            }
        }

        chain
            .into_iter()
            .rev()
            .flat_map(|entry| entry.constraints)
            .collect()
    }

    /// Look up a constraint applying to `type_name` by id
    pub fn find(&self, type_name: &str, id: &str) -> Option<&'static Constraint> {
        self.all(type_name).into_iter().find(|c| c.id == id)
    }

    /// Constraints to hand to a rule engine for `type_name`.
    ///
    /// Suppressed ids are dropped. An explicit level override wins; otherwise
    /// warning-level constraints follow the best-practice mode.
    pub fn select(&self, type_name: &str, config: &ConstraintsConfig) -> Vec<SelectedConstraint> {
        let selected: Vec<SelectedConstraint> = self
            .all(type_name)
            .into_iter()
            .filter(|c| !config.is_suppressed(c.id))
            .filter_map(|constraint| {
                let level = match config.level_override(constraint.id) {
                    Some(level) => level,
                    None => match (constraint.level, config.best_practice) {
                        (Level::Warning, BestPracticeMode::Ignore) => return None,
                        (Level::Warning, BestPracticeMode::Error) => Level::Rule,
                        (level, _) => level,
                    },
                };
                Some(SelectedConstraint { constraint, level })
            })
            .collect();

        tracing::trace!(type_name, count = selected.len(), "selected constraints");
        selected
    }

    /// A registry holding the base types, [`Extension`] and every datatype
    /// and primitive of this crate.
    pub fn with_core_types() -> Self {
        let mut registry = Self::new();
        registry
            .register_type("Element", None, ELEMENT_CONSTRAINTS)
            .register_type("BackboneElement", Some("Element"), &[])
            .register_type("Resource", None, &[])
            .register_type("DomainResource", Some("Resource"), DOMAIN_RESOURCE_CONSTRAINTS)
            .register::<Extension>()
            .register::<CodeableConcept>()
            .register::<Coding>()
            .register::<HumanName>()
            .register::<Identifier>()
            .register::<Meta>()
            .register::<Narrative>()
            .register::<Period>()
            .register::<Quantity>()
            .register::<Reference>()
            .register::<UsageContext>()
            .register::<primitive::Boolean>()
            .register::<primitive::Integer>()
            .register::<primitive::UnsignedInt>()
            .register::<primitive::Decimal>()
            .register::<primitive::FhirString>()
            .register::<primitive::Markdown>()
            .register::<primitive::Uri>()
            .register::<primitive::Code>()
            .register::<primitive::Id>()
            .register::<primitive::Date>()
            .register::<primitive::DateTime>()
            .register::<primitive::Instant>()
            .register::<primitive::Xhtml>();
        registry
    }

    /// Selected constraints in the `ElementDefinition.constraint` JSON shape
    pub fn to_json(&self, type_name: &str, config: &ConstraintsConfig) -> Result<String> {
        let entries: Vec<ConstraintJson<'_>> = self
            .select(type_name, config)
            .into_iter()
            .map(|selected| ConstraintJson {
                key: selected.constraint.id,
                severity: selected.level.severity(),
                human: selected.constraint.description,
                expression: selected.constraint.expression,
                source: selected.constraint.source,
            })
            .collect();
        Ok(serde_json::to_string_pretty(&entries)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConstraintLevelOverride;

    const BASE: &[Constraint] = &[Constraint::rule("b-1", BASE_LOCATION, "base", "true")];
    const CHILD: &[Constraint] = &[
        Constraint::rule("c-1", BASE_LOCATION, "child rule", "a.exists()"),
        Constraint::warning("c-2", "Child.item", "child advice", "b.empty()")
            .with_source("http://example.org/Child"),
    ];

    fn registry() -> ConstraintRegistry {
        let mut registry = ConstraintRegistry::new();
        registry
            .register_type("Base", None, BASE)
            .register_type("Child", Some("Base"), CHILD);
        registry
    }

    #[test]
    fn all_includes_base_chain_first() {
        let ids: Vec<_> = registry().all("Child").iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["b-1", "c-1", "c-2"]);
        assert!(registry().all("Unknown").is_empty());
        assert_eq!(registry().own("Child").len(), 2);
    }

    #[test]
    fn cyclic_bases_terminate() {
        let mut registry = ConstraintRegistry::new();
        registry
            .register_type("A", Some("B"), BASE)
            .register_type("B", Some("A"), CHILD);
        assert_eq!(registry.all("A").len(), 3);
    }

    #[test]
    fn select_applies_config() {
        let registry = registry();

        let default = registry.select("Child", &ConstraintsConfig::default());
        assert_eq!(default.len(), 3);
        assert_eq!(default[2].level, Level::Warning);

        let strict = ConstraintsConfig {
            best_practice: BestPracticeMode::Error,
            ..Default::default()
        };
        assert_eq!(registry.select("Child", &strict)[2].level, Level::Rule);

        let lenient = ConstraintsConfig {
            best_practice: BestPracticeMode::Ignore,
            suppress: vec!["b-1".to_string()],
            level_overrides: vec![ConstraintLevelOverride {
                id: "c-1".to_string(),
                level: Level::Warning,
            }],
        };
        let selected = registry.select("Child", &lenient);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].constraint.id, "c-1");
        assert_eq!(selected[0].level, Level::Warning);
    }

    #[test]
    fn core_types_inherit_element_invariants() {
        let registry = ConstraintRegistry::with_core_types();
        let ids: Vec<_> = registry.all("Extension").iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["ele-1", "ext-1"]);
        assert_eq!(registry.all("dateTime")[0].id, "ele-1");
        assert_eq!(registry.find("DomainResource", "dom-6").map(|c| c.level), Some(Level::Warning));
        assert!(registry.contains("Narrative"));
        assert_eq!(registry.all("UsageContext")[0].id, "ele-1");
    }

    #[test]
    fn exports_element_definition_shape() {
        let json = registry()
            .to_json("Child", &ConstraintsConfig::default())
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value[2]["key"], "c-2");
        assert_eq!(value[2]["severity"], "warning");
        assert_eq!(value[2]["human"], "child advice");
        assert_eq!(value[2]["source"], "http://example.org/Child");
        assert!(value[0].get("source").is_none());
    }
}

//! Constraint selection settings
//!
//! Controls which constraints a consumer applies and at what level, loaded
//! from YAML so tooling can share one settings file.

use serde::{Deserialize, Serialize};

use crate::constraint::Level;
use crate::error::Result;

/// How warning-level (best practice) constraints are handed on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BestPracticeMode {
    /// Drop them
    Ignore,
    /// Keep them as warnings
    #[default]
    Warn,
    /// Promote them to rules
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintLevelOverride {
    pub id: String,
    pub level: Level,
}

/// Controls which constraint metadata the registry selects
///
/// ```yaml
/// best_practice: Warn
/// suppress:
///   - "dom-6"
/// level_overrides:
///   - id: "obs-7"
///     level: Warning
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintsConfig {
    pub best_practice: BestPracticeMode,
    pub suppress: Vec<String>,
    pub level_overrides: Vec<ConstraintLevelOverride>,
}

impl ConstraintsConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn is_suppressed(&self, id: &str) -> bool {
        self.suppress.iter().any(|s| s == id)
    }

    /// The last override given for `id`
    pub fn level_override(&self, id: &str) -> Option<Level> {
        self.level_overrides
            .iter()
            .rev()
            .find(|o| o.id == id)
            .map(|o| o.level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn loads_partial_yaml() {
        let cfg = ConstraintsConfig::from_yaml(
            r#"
best_practice: Ignore
suppress:
  - "dom-6"
"#,
        )
        .unwrap();

        assert_eq!(cfg.best_practice, BestPracticeMode::Ignore);
        assert!(cfg.is_suppressed("dom-6"));
        assert!(cfg.level_overrides.is_empty());
    }

    #[test]
    fn empty_document_is_default() {
        let cfg = ConstraintsConfig::from_yaml("{}").unwrap();
        assert_eq!(cfg, ConstraintsConfig::default());
        assert_eq!(cfg.best_practice, BestPracticeMode::Warn);
    }

    #[test]
    fn yaml_round_trip() {
        let cfg = ConstraintsConfig {
            best_practice: BestPracticeMode::Error,
            suppress: vec!["ele-1".into()],
            level_overrides: vec![
                ConstraintLevelOverride {
                    id: "obs-7".into(),
                    level: Level::Warning,
                },
                ConstraintLevelOverride {
                    id: "obs-7".into(),
                    level: Level::Rule,
                },
            ],
        };

        let parsed = ConstraintsConfig::from_yaml(&cfg.to_yaml().unwrap()).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.level_override("obs-7"), Some(Level::Rule));
        assert_eq!(parsed.level_override("obs-6"), None);
    }

    #[test]
    fn rejects_unknown_mode() {
        let err = ConstraintsConfig::from_yaml("best_practice: Sometimes").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}

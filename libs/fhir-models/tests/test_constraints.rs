//! Constraint metadata of the resource models

use ferrum_elements::{BestPracticeMode, ConstraintsConfig, Level, Visitable};
use ferrum_models::{constraint_registry, Observation, PatientContact};
use serde_json::Value;

fn ids(constraints: &[&ferrum_elements::Constraint]) -> Vec<&'static str> {
    constraints.iter().map(|c| c.id).collect()
}

#[test]
fn registry_covers_every_model_type() {
    let registry = constraint_registry();
    for type_name in [
        "Bundle",
        "Bundle.link",
        "Bundle.entry",
        "Bundle.entry.search",
        "Bundle.entry.request",
        "Bundle.entry.response",
        "Composition",
        "Composition.attester",
        "Composition.section",
        "Observation",
        "Observation.component",
        "Patient",
        "Patient.contact",
        "Patient.link",
    ] {
        assert!(registry.contains(type_name), "{type_name} is not registered");
    }
}

#[test]
fn base_constraints_come_first() {
    let registry = constraint_registry();

    assert_eq!(
        ids(&registry.all("Observation")),
        vec!["dom-2", "dom-3", "dom-4", "dom-5", "dom-6", "obs-6", "obs-7"]
    );
    assert_eq!(ids(&registry.all("Patient.contact")), vec!["ele-1", "pat-1"]);
    assert_eq!(ids(&registry.all("Bundle"))[0], "bdl-1");
    assert_eq!(
        ids(&registry.all("Composition.section")),
        vec!["ele-1", "cmp-1", "cmp-2"]
    );
}

#[test]
fn instances_report_their_own_constraints() {
    let contact = PatientContact::builder().build().unwrap();
    let own: Vec<_> = contact.constraints().iter().map(|c| c.id).collect();
    assert_eq!(own, vec!["pat-1"]);
    assert_eq!(contact.constraints()[0].location, "Patient.contact");
    assert_eq!(
        constraint_registry().own(contact.type_name()),
        contact.constraints()
    );
    assert_eq!(
        <Observation as ferrum_elements::Constrained>::CONSTRAINTS.len(),
        2
    );
}

#[test]
fn best_practice_mode_changes_warning_levels() {
    let registry = constraint_registry();

    let ignored = ConstraintsConfig {
        best_practice: BestPracticeMode::Ignore,
        ..ConstraintsConfig::default()
    };
    assert!(registry
        .select("Patient", &ignored)
        .iter()
        .all(|s| s.constraint.id != "dom-6"));

    let strict = ConstraintsConfig {
        best_practice: BestPracticeMode::Error,
        ..ConstraintsConfig::default()
    };
    let selected = registry.select("Patient", &strict);
    let dom6 = selected
        .iter()
        .find(|s| s.constraint.id == "dom-6")
        .unwrap();
    assert_eq!(dom6.level, Level::Rule);
}

#[test]
fn yaml_config_drives_json_export() {
    let config = ConstraintsConfig::from_yaml(
        r#"
best_practice: Warn
suppress: ["dom-3"]
level_overrides:
  - id: obs-7
    level: Warning
"#,
    )
    .unwrap();

    let json = constraint_registry().to_json("Observation", &config).unwrap();
    let entries: Vec<Value> = serde_json::from_str(&json).unwrap();

    let keys: Vec<_> = entries.iter().map(|e| e["key"].as_str().unwrap()).collect();
    assert_eq!(keys, vec!["dom-2", "dom-4", "dom-5", "dom-6", "obs-6", "obs-7"]);

    let obs7 = entries.last().unwrap();
    assert_eq!(obs7["severity"], "warning");
    assert_eq!(
        obs7["source"],
        "http://hl7.org/fhir/StructureDefinition/Observation"
    );
    assert_eq!(entries[0]["severity"], "error");
}

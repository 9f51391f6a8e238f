//! Builder behaviour of the resource models

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use ferrum_elements::datatypes::{
    CodeableConcept, Coding, HumanName, Identifier, Period, Quantity, Reference,
};
use ferrum_elements::prelude::*;
use ferrum_elements::primitive::{Boolean, Code, DateTime, FhirString, Integer};
use ferrum_elements::visitor::find_unknown_modifiers;
use ferrum_elements::{ContainedResource, DataType, DataValue, Error, Extension};
use ferrum_models::{
    BundleEntryRequestBuilder, BundleEntryResponseBuilder, Composition, CompositionBuilder,
    CompositionSection, Observation, ObservationBuilder, Patient, PatientContact,
};

fn hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

fn concept(code: &str) -> CodeableConcept {
    CodeableConcept::builder()
        .coding([Coding::builder()
            .system("http://loinc.org")
            .code(code)
            .build()
            .unwrap()])
        .build()
        .unwrap()
}

fn reference(target: &str) -> Reference {
    Reference::builder().reference(target).build().unwrap()
}

fn missing_field(err: Error) -> &'static str {
    match err {
        Error::RequiredFieldMissing { field, .. } => field,
        other => panic!("expected a missing field, got {other}"),
    }
}

#[test]
fn each_required_field_is_reported() {
    let complete = || {
        CompositionBuilder::default()
            .status("final")
            .type_(concept("18842-5"))
            .date("2024-01-01")
            .author([reference("Practitioner/1")])
            .title("Discharge summary")
    };
    assert!(complete().build().is_ok());

    let without_status = CompositionBuilder::default()
        .type_(concept("18842-5"))
        .date("2024-01-01")
        .author([reference("Practitioner/1")])
        .title("Discharge summary");
    assert_eq!(missing_field(without_status.build().unwrap_err()), "status");

    let without_date = CompositionBuilder::default()
        .status("final")
        .type_(concept("18842-5"))
        .author([reference("Practitioner/1")])
        .title("Discharge summary");
    assert_eq!(missing_field(without_date.build().unwrap_err()), "date");

    let without_title = CompositionBuilder::default()
        .status("final")
        .type_(concept("18842-5"))
        .date("2024-01-01")
        .author([reference("Practitioner/1")]);
    assert_eq!(missing_field(without_title.build().unwrap_err()), "title");

    let err = BundleEntryRequestBuilder::default()
        .method("GET")
        .build()
        .unwrap_err();
    assert_eq!(missing_field(err), "url");

    let err = BundleEntryResponseBuilder::default().build().unwrap_err();
    assert_eq!(missing_field(err), "status");
}

#[test]
fn minimal_instance_reads_back_empty() {
    let observation = Observation::builder("final", concept("8867-4"))
        .build()
        .unwrap();

    assert_eq!(observation.status().as_str(), Some("final"));
    assert!(observation.identifier().is_empty());
    assert!(observation.category().is_empty());
    assert!(observation.subject().is_none());
    assert!(observation.effective().is_none());
    assert!(observation.value().is_none());
    assert!(observation.component().is_empty());
    assert!(observation.text().is_none());
    assert!(observation.contained().is_empty());
    assert!(observation.meta().is_none());
}

#[test]
fn value_accepts_every_permitted_type() {
    let alternatives: Vec<DataValue> = vec![
        Quantity::builder().unit("beats/minute").build().unwrap().into(),
        concept("LA6576-8").into(),
        FhirString::from("normal").into(),
        Boolean::from(true).into(),
        Integer::from(72).into(),
        DateTime::from("2024-01-01T10:00:00Z").into(),
        Period::builder().start("2024-01-01").build().unwrap().into(),
    ];

    for value in alternatives {
        let expected = value.data_type();
        let observation = Observation::builder("final", concept("8867-4"))
            .value(value.clone())
            .build()
            .unwrap();
        assert_eq!(observation.value().map(DataValue::data_type), Some(expected));
        assert_eq!(observation.value(), Some(&value));
    }
}

#[test]
fn value_rejects_other_types() {
    let rejected: Vec<DataValue> = vec![
        Code::from("high").into(),
        reference("Patient/1").into(),
        Identifier::builder().value("123").build().unwrap().into(),
    ];

    for value in rejected {
        let actual = value.data_type();
        let err = Observation::builder("final", concept("8867-4"))
            .value(value)
            .build()
            .unwrap_err();
        match err {
            Error::ChoiceTypeViolation {
                field,
                actual: reported,
                permitted,
                ..
            } => {
                assert_eq!(field, "value");
                assert_eq!(reported, actual.name());
                assert_eq!(permitted.len(), 7);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

#[test]
fn stored_choice_keeps_runtime_type() {
    let observation = Observation::builder("final", concept("8867-4"))
        .effective(Period::builder().start("2024-01-01").build().unwrap())
        .build()
        .unwrap();

    let effective = observation.effective().unwrap();
    assert_eq!(effective.data_type(), DataType::Period);
    assert!(effective.get::<Period>().is_some());
    assert!(effective.get::<DateTime>().is_none());
}

#[test]
fn round_trip_copies_collections() {
    let patient = Patient::builder()
        .identifier([Identifier::builder()
            .system("http://hospital.example.org")
            .value("12345")
            .build()
            .unwrap()])
        .name([
            HumanName::builder().family("Chalmers").build().unwrap(),
            HumanName::builder().family("Windsor").build().unwrap(),
        ])
        .birth_date("1974-12-25")
        .build()
        .unwrap();

    let copy = patient.to_builder().build().unwrap();
    assert_eq!(copy, patient);
    assert_eq!(hash(&copy), hash(&patient));
    assert!(!std::ptr::eq(copy.name().as_ptr(), patient.name().as_ptr()));
}

#[test]
fn append_and_replace_repeated_fields() {
    let a = concept("a");
    let b = concept("b");
    let c = concept("c");

    let observation = Observation::builder("final", concept("8867-4"))
        .category([a.clone(), b.clone()])
        .category([c.clone()])
        .build()
        .unwrap();
    assert_eq!(observation.category(), &[a, b, c]);

    let d = concept("d");
    let e = concept("e");
    let replaced = observation
        .to_builder()
        .set_category([d.clone(), e.clone()])
        .build()
        .unwrap();
    assert_eq!(replaced.category(), &[d, e]);
}

#[test]
fn equal_values_hash_alike() {
    let build = |given: [&str; 2]| {
        Patient::builder()
            .name([HumanName::builder().given(given).build().unwrap()])
            .gender("male")
            .build()
            .unwrap()
    };

    let first = build(["Peter", "James"]);
    let second = build(["Peter", "James"]);
    assert_eq!(first, second);
    assert_eq!(hash(&first), hash(&second));

    let reordered = build(["James", "Peter"]);
    assert_ne!(first, reordered);

    let changed = first.to_builder().gender("female").build().unwrap();
    assert_ne!(first, changed);
}

#[test]
fn contained_resources_are_found_by_id() {
    let observation = Observation::builder("final", concept("8867-4"))
        .id("obs1")
        .build()
        .unwrap();

    let patient = Patient::builder()
        .id("p1")
        .contained([ContainedResource::new(observation.clone())])
        .build()
        .unwrap();

    let found = patient.find_contained("obs1").unwrap();
    assert_eq!(found.resource_type(), "Observation");
    assert_eq!(found.get::<Observation>(), Some(&observation));
    assert!(found.get::<Patient>().is_none());
    assert!(patient.find_contained("missing").is_none());

    let copy = patient.to_builder().build().unwrap();
    assert_eq!(copy, patient);
    assert_eq!(hash(&copy), hash(&patient));
}

#[test]
fn invalid_resource_id_is_rejected() {
    let err = Patient::builder().id("not valid").build().unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidPrimitiveValue {
            type_name: "Patient",
            ..
        }
    ));
}

#[test]
fn unknown_modifier_extensions_are_reported() {
    let modifier = Extension::builder("http://example.org/do-not-contact")
        .value(Boolean::from(true))
        .build()
        .unwrap();

    let contact = PatientContact::builder()
        .organization(reference("Organization/1"))
        .modifier_extension([modifier])
        .build()
        .unwrap();
    let patient = Patient::builder().contact([contact]).build().unwrap();

    assert_eq!(
        find_unknown_modifiers(&patient, Vec::new()),
        vec!["Patient.contact[0]".to_string()]
    );
    assert!(find_unknown_modifiers(&patient, ["http://example.org/do-not-contact"]).is_empty());
}

#[test]
fn modifier_only_backbones_are_kept() {
    let modifier = || {
        Extension::builder("http://example.org/confidential")
            .value(Boolean::from(true))
            .build()
            .unwrap()
    };

    let contact = PatientContact::builder()
        .modifier_extension([modifier()])
        .build()
        .unwrap();
    assert!(!contact.is_absent());

    let patient = Patient::builder().contact([contact.clone()]).build().unwrap();
    assert_eq!(patient.contact(), &[contact]);
    assert_eq!(
        find_unknown_modifiers(&patient, Vec::new()),
        vec!["Patient.contact[0]".to_string()]
    );

    let flagged = CompositionSection::builder()
        .modifier_extension([modifier()])
        .build()
        .unwrap();
    let parent = CompositionSection::builder()
        .title("1")
        .section([flagged])
        .build()
        .unwrap();
    assert_eq!(parent.section().len(), 1);

    let composition = Composition::builder(
        "final",
        concept("18842-5"),
        "2024-01-01",
        [reference("Practitioner/1")],
        "Summary",
    )
    .section([parent])
    .build()
    .unwrap();
    assert_eq!(
        find_unknown_modifiers(&composition, Vec::new()),
        vec!["Composition.section[0].section[0]".to_string()]
    );

    let empty = PatientContact::builder().build().unwrap();
    let patient = Patient::builder().contact([empty]).build().unwrap();
    assert!(patient.contact().is_empty());
}

#[test]
fn builders_fail_before_building_parents() {
    let err = ObservationBuilder::default()
        .status("final")
        .code(concept("8867-4"))
        .subject(reference("Patient/1"))
        .effective(Code::from("yesterday"))
        .build()
        .unwrap_err();
    assert_eq!(err.field(), Some("effective"));

    assert!(matches!(
        Composition::builder("final", concept("x"), "2024", Vec::new(), "t").build(),
        Err(Error::NonEmptyConstraintViolation { .. })
    ));
}

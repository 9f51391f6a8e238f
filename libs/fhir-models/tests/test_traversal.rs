//! Traversal tests over built resources

use ferrum_elements::datatypes::{CodeableConcept, HumanName, Narrative, Reference};
use ferrum_elements::primitive::{Boolean, Integer};
use ferrum_elements::visitor::collect;
use ferrum_elements::{accept, FieldPosition, Visitable, Visitor};
use ferrum_models::{Bundle, BundleLink, Composition, CompositionSection, Patient};

/// Records every hook as `"<hook> <type>"`, optionally refusing to descend
/// into one type.
#[derive(Default)]
struct Recorder {
    events: Vec<String>,
    fields: Vec<String>,
    skip: Option<&'static str>,
}

impl Recorder {
    fn skipping(type_name: &'static str) -> Self {
        Self {
            skip: Some(type_name),
            ..Self::default()
        }
    }

    fn count(&self, event: &str) -> usize {
        self.events.iter().filter(|e| e.as_str() == event).count()
    }

    fn of_types(&self, types: &[&str]) -> Vec<&str> {
        self.events
            .iter()
            .map(String::as_str)
            .filter(|e| types.iter().any(|t| e.ends_with(&format!(" {t}"))))
            .collect()
    }
}

impl<'a> Visitor<'a> for Recorder {
    fn pre_visit(&mut self, node: &'a dyn Visitable) -> bool {
        self.events.push(format!("pre {}", node.type_name()));
        true
    }

    fn visit_start(&mut self, position: &FieldPosition<'_>, node: &'a dyn Visitable) {
        self.events.push(format!("start {}", node.type_name()));
        match position.index {
            Some(index) => self.fields.push(format!("{}[{}]", position.name, index)),
            None => self.fields.push(position.name.to_string()),
        }
    }

    fn visit(&mut self, _position: &FieldPosition<'_>, node: &'a dyn Visitable) -> bool {
        self.skip != Some(node.type_name())
    }

    fn visit_end(&mut self, _position: &FieldPosition<'_>, node: &'a dyn Visitable) {
        self.events.push(format!("end {}", node.type_name()));
    }

    fn post_visit(&mut self, node: &'a dyn Visitable) {
        self.events.push(format!("post {}", node.type_name()));
    }
}

fn link(relation: &str, url: &str) -> BundleLink {
    BundleLink::builder(relation, url).build().unwrap()
}

fn patient() -> Patient {
    Patient::builder()
        .active(true)
        .name([HumanName::builder()
            .family("Chalmers")
            .given(["Peter", "James"])
            .build()
            .unwrap()])
        .gender("female")
        .build()
        .unwrap()
}

#[test]
fn bundle_links_are_visited_in_order() {
    let bundle = Bundle::builder("searchset")
        .link([link("self", "http://x/1"), link("next", "http://x/2")])
        .build()
        .unwrap();

    let mut recorder = Recorder::default();
    accept(&bundle, "Bundle", &mut recorder);

    assert_eq!(
        recorder.of_types(&["Bundle", "Bundle.link"]),
        vec![
            "pre Bundle",
            "start Bundle",
            "pre Bundle.link",
            "start Bundle.link",
            "end Bundle.link",
            "post Bundle.link",
            "pre Bundle.link",
            "start Bundle.link",
            "end Bundle.link",
            "post Bundle.link",
            "end Bundle",
            "post Bundle",
        ]
    );

    let urls: Vec<_> = collect::<BundleLink>(&bundle)
        .into_iter()
        .filter_map(|link| link.url().as_str())
        .collect();
    assert_eq!(urls, vec!["http://x/1", "http://x/2"]);
}

#[test]
fn every_populated_field_is_visited_once() {
    let patient = patient();
    let mut recorder = Recorder::default();
    patient.accept("Patient", &mut recorder);

    assert_eq!(
        recorder.fields,
        vec![
            "Patient",
            "active",
            "name[0]",
            "family",
            "given[0]",
            "given[1]",
            "gender",
        ]
    );
    assert_eq!(recorder.count("start string"), 3);
    assert_eq!(recorder.count("end string"), 3);
    assert_eq!(recorder.count("start HumanName"), 1);
    assert_eq!(recorder.count("end HumanName"), 1);
}

#[test]
fn absent_fields_are_not_visited() {
    let patient = Patient::builder().build().unwrap();
    let mut recorder = Recorder::default();
    patient.accept("Patient", &mut recorder);

    assert_eq!(recorder.fields, vec!["Patient"]);
    assert_eq!(
        recorder.events,
        vec!["pre Patient", "start Patient", "end Patient", "post Patient"]
    );
}

#[test]
fn refusing_a_node_skips_its_children() {
    let patient = patient();
    let mut recorder = Recorder::skipping("HumanName");
    patient.accept("Patient", &mut recorder);

    assert_eq!(recorder.count("start HumanName"), 1);
    assert_eq!(recorder.count("end HumanName"), 1);
    assert_eq!(recorder.count("post HumanName"), 1);
    assert!(!recorder.fields.iter().any(|f| f == "family"));
    assert!(!recorder.fields.iter().any(|f| f.starts_with("given")));
    assert_eq!(recorder.fields.last().map(String::as_str), Some("gender"));
}

#[test]
fn choice_fields_are_flagged() {
    struct Choices(Vec<(String, &'static str)>);

    impl<'a> Visitor<'a> for Choices {
        fn visit(&mut self, position: &FieldPosition<'_>, node: &'a dyn Visitable) -> bool {
            if position.choice {
                self.0.push((position.name.to_string(), node.type_name()));
            }
            true
        }
    }

    let patient = Patient::builder()
        .deceased(Boolean::from(false))
        .multiple_birth(Integer::from(2))
        .build()
        .unwrap();

    let mut choices = Choices(Vec::new());
    patient.accept("Patient", &mut choices);
    assert_eq!(
        choices.0,
        vec![
            ("deceased".to_string(), "boolean"),
            ("multipleBirth".to_string(), "integer"),
        ]
    );
}

fn section(title: &str, children: Vec<CompositionSection>) -> CompositionSection {
    CompositionSection::builder()
        .title(title)
        .section(children)
        .build()
        .unwrap()
}

fn nested_composition() -> Composition {
    let div = "<div xmlns=\"http://www.w3.org/1999/xhtml\">leaf</div>";
    let leaf = CompositionSection::builder()
        .title("1.1.1")
        .text(Narrative::builder("generated", div).build().unwrap())
        .build()
        .unwrap();
    let doc_type = CodeableConcept::builder()
        .text("Discharge summary")
        .build()
        .unwrap();
    let author = Reference::builder()
        .reference("Practitioner/1")
        .build()
        .unwrap();

    Composition::builder("final", doc_type, "2024-01-01", [author], "Summary")
        .section([
            section("1", vec![section("1.1", vec![leaf])]),
            section("2", Vec::new()),
        ])
        .build()
        .unwrap()
}

#[test]
fn nested_sections_round_trip() {
    let composition = nested_composition();
    let copy = composition.to_builder().build().unwrap();

    assert_eq!(copy, composition);
    assert_eq!(copy.section()[0].depth(), 3);

    let level3 = &copy.section()[0].section()[0].section()[0];
    assert_eq!(level3.title().and_then(|t| t.as_str()), Some("1.1.1"));
    assert!(level3.text().is_some());
}

#[test]
fn nested_sections_are_visited_depth_first() {
    let composition = nested_composition();

    let titles: Vec<_> = collect::<CompositionSection>(&composition)
        .into_iter()
        .filter_map(|s| s.title().and_then(|t| t.as_str()))
        .collect();
    assert_eq!(titles, vec!["1", "1.1", "1.1.1", "2"]);

    let mut recorder = Recorder::default();
    composition.accept("Composition", &mut recorder);
    let sections: Vec<_> = recorder
        .of_types(&["Composition.section"])
        .into_iter()
        .filter(|e| !e.starts_with("pre ") && !e.starts_with("post "))
        .collect();
    assert_eq!(
        sections,
        vec![
            "start Composition.section",
            "start Composition.section",
            "start Composition.section",
            "end Composition.section",
            "end Composition.section",
            "end Composition.section",
            "start Composition.section",
            "end Composition.section",
        ]
    );
}

//! Property-based tests using QuickCheck

use ferrum_elements::datatypes::{CodeableConcept, Coding, HumanName};
use ferrum_elements::primitive::FhirString;
use quickcheck::{QuickCheck, TestResult};

fn names(values: &[FhirString]) -> Vec<String> {
    values
        .iter()
        .filter_map(|v| v.as_str())
        .map(str::to_string)
        .collect()
}

fn code_of(s: &str) -> String {
    s.chars().filter(char::is_ascii_alphanumeric).collect()
}

/// Property: appending to a repeated field keeps the argument order
#[test]
fn prop_append_preserves_order() {
    fn prop(first: Vec<String>, second: Vec<String>) -> TestResult {
        if first.iter().chain(&second).any(String::is_empty) {
            return TestResult::discard();
        }

        let name = HumanName::builder()
            .given(first.clone())
            .given(second.clone())
            .build()
            .unwrap();

        let expected: Vec<String> = first.into_iter().chain(second).collect();
        TestResult::from_bool(names(name.given()) == expected)
    }

    QuickCheck::new()
        .tests(100)
        .quickcheck(prop as fn(Vec<String>, Vec<String>) -> TestResult);
}

/// Property: replacing a repeated field discards everything appended before
#[test]
fn prop_replace_discards_previous() {
    fn prop(before: Vec<String>, after: Vec<String>) -> TestResult {
        if before.iter().chain(&after).any(String::is_empty) {
            return TestResult::discard();
        }

        let name = HumanName::builder()
            .given(before)
            .set_given(after.clone())
            .build()
            .unwrap();

        TestResult::from_bool(names(name.given()) == after)
    }

    QuickCheck::new()
        .tests(100)
        .quickcheck(prop as fn(Vec<String>, Vec<String>) -> TestResult);
}

/// Property: independently built equal instances agree on equality and hash,
/// and reordering a repeated field breaks equality
#[test]
fn prop_hash_agrees_with_equality() {
    fn build(codes: &[String]) -> CodeableConcept {
        CodeableConcept::builder()
            .coding(
                codes
                    .iter()
                    .map(|c| Coding::builder().code(c.as_str()).build().unwrap()),
            )
            .build()
            .unwrap()
    }

    fn prop(raw: Vec<String>) -> TestResult {
        let codes: Vec<String> = raw.iter().map(|s| code_of(s)).filter(|c| !c.is_empty()).collect();
        if codes.is_empty() {
            return TestResult::discard();
        }

        let a = build(&codes);
        let b = build(&codes);
        if a != b || a.hash_code() != b.hash_code() {
            return TestResult::failed();
        }

        let mut reversed = codes.clone();
        reversed.reverse();
        if reversed == codes {
            return TestResult::passed();
        }
        TestResult::from_bool(build(&reversed) != a)
    }

    QuickCheck::new()
        .tests(100)
        .quickcheck(prop as fn(Vec<String>) -> TestResult);
}

/// Property: to_builder().build() reproduces the instance
#[test]
fn prop_to_builder_round_trip() {
    fn prop(system: String, code: String, display: String, selected: bool) -> TestResult {
        let code = code_of(&code);
        let system = code_of(&system);
        if code.is_empty() || system.is_empty() || display.is_empty() {
            return TestResult::discard();
        }

        let coding = Coding::builder()
            .system(format!("urn:{system}"))
            .code(code)
            .display(display)
            .user_selected(selected)
            .build()
            .unwrap();
        let copy = coding.to_builder().build().unwrap();

        TestResult::from_bool(copy == coding && copy.hash_code() == coding.hash_code())
    }

    QuickCheck::new()
        .tests(100)
        .quickcheck(prop as fn(String, String, String, bool) -> TestResult);
}

//! Property-based tests using QuickCheck

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use ferrum_elements::datatypes::HumanName;
use ferrum_models::Patient;
use quickcheck::{QuickCheck, TestResult};

fn hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

fn patient(families: &[String]) -> Patient {
    Patient::builder()
        .name(
            families
                .iter()
                .map(|family| HumanName::builder().family(family.as_str()).build().unwrap()),
        )
        .build()
        .unwrap()
}

/// Property: patients built from the same names are equal and hash alike
#[test]
fn prop_equal_names_hash_alike() {
    fn prop(families: Vec<String>) -> TestResult {
        if families.iter().any(String::is_empty) {
            return TestResult::discard();
        }

        let first = patient(&families);
        let second = patient(&families);
        TestResult::from_bool(first == second && hash(&first) == hash(&second))
    }

    QuickCheck::new()
        .tests(100)
        .quickcheck(prop as fn(Vec<String>) -> TestResult);
}

/// Property: name order is significant for equality
#[test]
fn prop_name_order_is_significant() {
    fn prop(families: Vec<String>) -> TestResult {
        if families.iter().any(String::is_empty) {
            return TestResult::discard();
        }

        let mut reversed = families.clone();
        reversed.reverse();
        if reversed == families {
            return TestResult::discard();
        }

        TestResult::from_bool(patient(&families) != patient(&reversed))
    }

    QuickCheck::new()
        .tests(100)
        .quickcheck(prop as fn(Vec<String>) -> TestResult);
}

/// Property: copying through a builder preserves equality and hash
#[test]
fn prop_to_builder_round_trip() {
    fn prop(families: Vec<String>, active: bool) -> TestResult {
        if families.iter().any(String::is_empty) {
            return TestResult::discard();
        }

        let original = Patient::builder()
            .active(active)
            .name(
                families
                    .iter()
                    .map(|family| HumanName::builder().family(family.as_str()).build().unwrap()),
            )
            .build()
            .unwrap();
        let copy = original.to_builder().build().unwrap();
        TestResult::from_bool(copy == original && hash(&copy) == hash(&original))
    }

    QuickCheck::new()
        .tests(100)
        .quickcheck(prop as fn(Vec<String>, bool) -> TestResult);
}

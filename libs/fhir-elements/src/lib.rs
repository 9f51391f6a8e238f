//! FHIR Elements - immutable element model with builders, choice types and visitors
//!
//! This crate provides the machinery shared by every FHIR record type:
//!
//! - **Elements**: `id` + `extension` on every node, `modifierExtension` on
//!   backbone elements, with "absent" elements dropped by their parents
//! - **Builders**: required fields as builder arguments, fluent optional
//!   setters, append/replace for repeated fields, validation in `build()`
//! - **Choice fields**: [`DataValue`] checked against each field's permitted
//!   [`DataType`]s
//! - **Visitors**: one generic traversal engine driven by per-type
//!   [`FieldDescriptor`] tables
//! - **Constraints**: invariant metadata per type, selected for a rule engine
//!   through [`ConstraintRegistry`] and [`ConstraintsConfig`]
//!
//! # Architecture Overview
//!
//! ```text
//! Builder (innermost first)
//!      |
//!   build() -> required / choice / non-empty / primitive checks
//!      |
//! Immutable instance (Send + Sync, cached structural hash)
//!      |
//!   accept(visitor) -> Walker -> pre_visit / visit_start / visit / visit_end / post_visit
//! ```
//!
//! # Example
//!
//! ```rust
//! use ferrum_elements::prelude::*;
//! use ferrum_elements::datatypes::{CodeableConcept, Coding};
//! use ferrum_elements::visitor::collect;
//!
//! let concept = CodeableConcept::builder()
//!     .coding([Coding::builder()
//!         .system("http://loinc.org")
//!         .code("8867-4")
//!         .build()
//!         .unwrap()])
//!     .text("Heart rate")
//!     .build()
//!     .unwrap();
//!
//! let codings = collect::<Coding>(&concept);
//! assert_eq!(codings.len(), 1);
//! assert_eq!(concept.to_builder().build().unwrap(), concept);
//! ```

pub mod choice;
pub mod config;
pub mod constraint;
pub mod datatypes;
pub mod descriptor;
pub mod element;
pub mod error;
pub mod extension;
pub mod hash;
pub mod prelude;
pub mod primitive;
pub mod resource;
pub mod visitor;

// Re-export main types
pub use choice::{DataType, DataValue};
pub use config::{BestPracticeMode, ConstraintLevelOverride, ConstraintsConfig};
pub use constraint::{Constrained, Constraint, ConstraintRegistry, Level, SelectedConstraint};
pub use descriptor::{Cardinality, FieldDescriptor, FieldType};
pub use error::{Error, Result};
pub use extension::{Extension, ExtensionBuilder};
pub use resource::{ContainedResource, DomainResourceFields, ResourceFields};
pub use visitor::{accept, check_primitives, FieldPosition, RawValue, Visitable, Visitor, Walker};

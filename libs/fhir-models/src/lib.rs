//! FHIR data models
//!
//! Resource types built on [`ferrum_elements`]: every type here is immutable,
//! constructed through its builder and traversable with any
//! [`Visitor`](ferrum_elements::Visitor).
//!
//! # Module Organization
//!
//! - `bundle`: `Bundle` and its link/entry backbone elements
//! - `composition`: `Composition` with attesters and nested sections
//! - `observation`: `Observation` with components and `value[x]`
//! - `patient`: `Patient` with contacts and links
//!
//! # Example
//!
//! ```rust
//! use ferrum_models::{Bundle, BundleLink};
//!
//! let bundle = Bundle::builder("searchset")
//!     .link([
//!         BundleLink::builder("self", "http://x/1").build().unwrap(),
//!         BundleLink::builder("next", "http://x/2").build().unwrap(),
//!     ])
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(bundle.link().len(), 2);
//! assert_eq!(bundle.to_builder().build().unwrap(), bundle);
//! ```

pub mod bundle;
pub mod composition;
pub mod observation;
pub mod patient;

use ferrum_elements::ConstraintRegistry;

// Re-export commonly used types
pub use bundle::{
    Bundle, BundleBuilder, BundleEntry, BundleEntryBuilder, BundleEntryRequest,
    BundleEntryRequestBuilder, BundleEntryResponse, BundleEntryResponseBuilder, BundleEntrySearch,
    BundleEntrySearchBuilder, BundleLink, BundleLinkBuilder,
};
pub use composition::{
    Composition, CompositionAttester, CompositionAttesterBuilder, CompositionBuilder,
    CompositionSection, CompositionSectionBuilder,
};
pub use observation::{
    Observation, ObservationBuilder, ObservationComponent, ObservationComponentBuilder,
};
pub use patient::{
    Patient, PatientBuilder, PatientContact, PatientContactBuilder, PatientLink,
    PatientLinkBuilder,
};

/// A registry holding the core types plus every model type in this crate.
pub fn constraint_registry() -> ConstraintRegistry {
    let mut registry = ConstraintRegistry::with_core_types();
    registry.register::<Bundle>();
    registry.register::<BundleLink>();
    registry.register::<BundleEntry>();
    registry.register::<BundleEntrySearch>();
    registry.register::<BundleEntryRequest>();
    registry.register::<BundleEntryResponse>();
    registry.register::<Composition>();
    registry.register::<CompositionAttester>();
    registry.register::<CompositionSection>();
    registry.register::<Observation>();
    registry.register::<ObservationComponent>();
    registry.register::<Patient>();
    registry.register::<PatientContact>();
    registry.register::<PatientLink>();
    registry
}

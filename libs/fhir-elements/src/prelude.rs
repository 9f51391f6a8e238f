//! Traits needed to use builders and read instances
//!
//! ```
//! use ferrum_elements::prelude::*;
//! ```

pub use crate::constraint::Constrained;
pub use crate::element::{
    BackboneElement, BackboneElementBuilder, Element, ElementBuilder, HasExtensions, HasId,
    HasModifierExtensions, HasNarrative,
};
pub use crate::resource::{DomainResource, DomainResourceBuilder, Resource, ResourceBuilder};
pub use crate::visitor::{Visitable, Visitor};

//! General-purpose complex data types

mod codeable_concept;
mod coding;
mod human_name;
mod identifier;
mod meta;
mod narrative;
mod period;
mod quantity;
mod reference;
mod usage_context;

pub use codeable_concept::{CodeableConcept, CodeableConceptBuilder};
pub use coding::{Coding, CodingBuilder};
pub use human_name::{HumanName, HumanNameBuilder};
pub use identifier::{Identifier, IdentifierBuilder};
pub use meta::{Meta, MetaBuilder};
pub use narrative::{Narrative, NarrativeBuilder};
pub use period::{Period, PeriodBuilder};
pub use quantity::{Quantity, QuantityBuilder};
pub use reference::{Reference, ReferenceBuilder};
pub use usage_context::{UsageContext, UsageContextBuilder, USAGE_CONTEXT_VALUE};

//! Domain vocabulary of the client data layer.
//!
//! Entity types are the wire DTOs from `ammesso-api-types`; this module adds
//! the client-side notions layered on top of them.

mod types;

pub use ammesso_api_types::{School, SchoolId, SchoolPatch, Season, SeasonId};
pub use types::{ResourceKind, Selector};

//! Application services: selection state, the data-source seam, and the
//! client facade composing them.

pub mod client;
pub mod selection;
pub mod sources;

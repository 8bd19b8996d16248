//! Infrastructure adapters: data-source implementations and telemetry.

pub mod error;
pub mod fixture;
pub mod http;
pub mod telemetry;

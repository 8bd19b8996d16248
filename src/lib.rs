//! Ammesso client data layer.
//!
//! The library behind the Ammesso admissions dashboard and parent portal:
//! it owns the client-side request, cache, and mutation contract so view
//! layers only ever deal with typed entities and render-ready query states.
//!
//! Three cooperating pieces:
//!
//! - **Selection store** ([`SelectionStore`]): UI-scoped selection state
//!   (current school, current season, sidebar collapse) with synchronous
//!   subscriber notification.
//! - **Resource query cache** ([`cache::ResourceCache`]): one authoritative
//!   entry per (resource kind, identifier) key, single-flight deduplication
//!   of in-flight reads, TTL freshness, LRU capacity eviction, and
//!   read-after-write consistency on mutation.
//! - **Data sources** ([`DataSource`]): a live HTTP implementation over the
//!   admissions REST API and a fixture implementation for disconnected
//!   deployments and tests, selected by configuration.
//!
//! [`AdmissionsClient`] is the composition root wiring the three together.
//!
//! ## Configuration
//!
//! Behavior is controlled via `ammesso.toml` plus `AMMESSO_*` environment
//! overrides:
//!
//! ```toml
//! [source]
//! mode = "live"            # or "fixture"
//! base_url = "http://localhost:3000"
//!
//! [cache]
//! stale_after_ms = 30000
//! # ... see config for all options
//! ```

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;

pub use ammesso_api_types as api_types;
pub use application::client::AdmissionsClient;
pub use application::selection::{SelectionState, SelectionStore};
pub use application::sources::{DataSource, SourceError, build_source};
pub use cache::{CacheConfig, QueryState, ResourceCache};
pub use config::{ConfigError, Settings, SourceMode};
pub use domain::{ResourceKind, School, SchoolId, SchoolPatch, Season, SeasonId, Selector};

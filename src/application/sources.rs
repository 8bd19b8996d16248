//! Data-source traits describing backend adapters.
//!
//! `DataSource` is the seam between the cache layer and the admissions API.
//! Which implementation backs it is decided by configuration through
//! [`build_source`], never by call sites.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{SourceMode, SourceSettings};
use crate::domain::{ResourceKind, School, SchoolId, SchoolPatch, Season, SeasonId};
use crate::infra::fixture::FixtureSource;
use crate::infra::http::LiveHttpSource;

#[derive(Debug, Error)]
pub enum SourceError {
    /// Non-success HTTP status on a read or write.
    #[error("{kind} `{id}` request failed with status {status}")]
    Status {
        kind: ResourceKind,
        id: String,
        status: u16,
    },
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("failed to decode {kind} response: {message}")]
    Decode {
        kind: ResourceKind,
        message: String,
    },
    #[error("invalid request URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("fetch task failed: {0}")]
    Task(String),
}

impl SourceError {
    pub fn status(kind: ResourceKind, id: impl Into<String>, status: u16) -> Self {
        Self::Status {
            kind,
            id: id.into(),
            status,
        }
    }

    pub fn decode(kind: ResourceKind, message: impl std::fmt::Display) -> Self {
        Self::Decode {
            kind,
            message: message.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

/// Capability interface over the admissions backend.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Read one school by id.
    async fn school(&self, id: &SchoolId) -> Result<School, SourceError>;

    /// Partially update a school; fields absent from the patch are left
    /// untouched server-side. Returns the full updated entity.
    async fn update_school(&self, id: &SchoolId, patch: SchoolPatch)
    -> Result<School, SourceError>;

    /// Read one season by id.
    async fn season(&self, id: &SeasonId) -> Result<Season, SourceError>;
}

/// Build the configured data source.
pub fn build_source(settings: &SourceSettings) -> Result<Arc<dyn DataSource>, SourceError> {
    match settings.mode {
        SourceMode::Live => Ok(Arc::new(LiveHttpSource::from_settings(settings)?)),
        SourceMode::Fixture => Ok(Arc::new(FixtureSource::new())),
    }
}

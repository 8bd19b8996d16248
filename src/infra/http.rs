//! Live HTTP data source for the admissions API.
//!
//! Thin typed wrapper over reqwest: joins paths onto the configured base
//! URL, attaches the ambient bearer credential when one is configured, and
//! decodes the standard `{ "data": ... }` envelope. Any non-2xx status maps
//! to [`SourceError::Status`] without assuming an error body shape.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use ammesso_api_types::{ApiEnvelope, School, SchoolId, SchoolPatch, Season, SeasonId};

use crate::application::sources::{DataSource, SourceError};
use crate::config::SourceSettings;
use crate::domain::ResourceKind;

pub struct LiveHttpSource {
    client: Client,
    base: Url,
    bearer: Option<String>,
}

impl LiveHttpSource {
    pub fn new(
        base_url: &str,
        bearer: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let base = Url::parse(base_url)?.join("/")?;
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base,
            bearer,
        })
    }

    pub fn from_settings(settings: &SourceSettings) -> Result<Self, SourceError> {
        Self::new(
            &settings.base_url,
            settings.bearer_token.clone(),
            settings.request_timeout(),
        )
    }

    pub fn user_agent() -> &'static str {
        concat!("ammesso/", env!("CARGO_PKG_VERSION"))
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        kind: ResourceKind,
        id: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, SourceError> {
        let url = self.base.join(path)?;
        let mut request = self.client.request(method, url);
        if let Some(token) = &self.bearer {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            debug!(%kind, id, status = status.as_u16(), "request failed");
            return Err(SourceError::status(kind, id, status.as_u16()));
        }

        let bytes = response.bytes().await?;
        let envelope: ApiEnvelope<T> =
            serde_json::from_slice(&bytes).map_err(|err| SourceError::decode(kind, err))?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl DataSource for LiveHttpSource {
    async fn school(&self, id: &SchoolId) -> Result<School, SourceError> {
        self.request(
            Method::GET,
            &format!("api/v1/schools/{id}"),
            ResourceKind::School,
            id.as_str(),
            None,
        )
        .await
    }

    async fn update_school(
        &self,
        id: &SchoolId,
        patch: SchoolPatch,
    ) -> Result<School, SourceError> {
        let body = serde_json::to_value(&patch)
            .map_err(|err| SourceError::decode(ResourceKind::School, err))?;
        self.request(
            Method::PATCH,
            &format!("api/v1/schools/{id}"),
            ResourceKind::School,
            id.as_str(),
            Some(body),
        )
        .await
    }

    async fn season(&self, id: &SeasonId) -> Result<Season, SourceError> {
        self.request(
            Method::GET,
            &format!("api/v1/seasons/{id}"),
            ResourceKind::Season,
            id.as_str(),
            None,
        )
        .await
    }
}

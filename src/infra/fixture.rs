//! Fixture data source.
//!
//! Fixed literal entities behind the same asynchronous contract as the live
//! source, for tests and deployments without backend connectivity. Patches
//! apply onto the stored fixture so write flows remain observable offline.
//! Selected via `source.mode = "fixture"`.

use std::collections::HashMap;

use async_trait::async_trait;
use time::macros::date;
use tokio::sync::RwLock;

use crate::application::sources::{DataSource, SourceError};
use crate::domain::{School, SchoolId, SchoolPatch, Season, SeasonId};

pub const FIXTURE_SCHOOL_NAME: &str = "Oakridge Academy";
pub const FIXTURE_SCHOOL_ADDRESS: &str = "123 Oak Street, Springfield";

pub struct FixtureSource {
    schools: RwLock<HashMap<SchoolId, School>>,
}

impl FixtureSource {
    pub fn new() -> Self {
        Self {
            schools: RwLock::new(HashMap::new()),
        }
    }

    fn school_fixture(id: &SchoolId) -> School {
        School {
            id: id.clone(),
            name: FIXTURE_SCHOOL_NAME.to_string(),
            address: FIXTURE_SCHOOL_ADDRESS.to_string(),
            logo_url: None,
        }
    }

    fn season_fixture(id: &SeasonId) -> Season {
        Season {
            id: id.clone(),
            name: "2026-2027 Admissions".to_string(),
            start_date: date!(2026 - 09 - 01),
            end_date: date!(2027 - 06 - 30),
            is_active: true,
        }
    }
}

impl Default for FixtureSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DataSource for FixtureSource {
    async fn school(&self, id: &SchoolId) -> Result<School, SourceError> {
        if let Some(school) = self.schools.read().await.get(id) {
            return Ok(school.clone());
        }
        Ok(Self::school_fixture(id))
    }

    async fn update_school(
        &self,
        id: &SchoolId,
        patch: SchoolPatch,
    ) -> Result<School, SourceError> {
        let mut guard = self.schools.write().await;
        let mut school = guard
            .get(id)
            .cloned()
            .unwrap_or_else(|| Self::school_fixture(id));

        if let Some(name) = patch.name {
            school.name = name;
        }
        if let Some(address) = patch.address {
            school.address = address;
        }
        if let Some(logo_url) = patch.logo_url {
            school.logo_url = Some(logo_url);
        }

        guard.insert(id.clone(), school.clone());
        Ok(school)
    }

    async fn season(&self, id: &SeasonId) -> Result<Season, SourceError> {
        Ok(Self::season_fixture(id))
    }
}

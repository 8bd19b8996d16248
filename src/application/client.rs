//! Client facade: the composition root wiring selection state, per-kind
//! query caches, and the configured data source.
//!
//! View layers hold one `AdmissionsClient` and read everything through it;
//! failures surface as [`QueryState::Failed`] or `Err(SourceError)`, never
//! as panics.

use std::sync::Arc;

use crate::cache::{CacheConfig, QueryState, ResourceCache};
use crate::config::Settings;
use crate::domain::{School, SchoolId, SchoolPatch, Season, SeasonId, Selector};

use super::selection::SelectionStore;
use super::sources::{DataSource, SourceError, build_source};

pub struct AdmissionsClient {
    source: Arc<dyn DataSource>,
    schools: ResourceCache<SchoolId, School>,
    seasons: ResourceCache<SeasonId, Season>,
    selection: SelectionStore,
}

impl AdmissionsClient {
    pub fn new(source: Arc<dyn DataSource>, cache: &CacheConfig) -> Self {
        Self {
            source,
            schools: ResourceCache::new(
                "school",
                cache.school_limit_non_zero(),
                cache.stale_after(),
            ),
            seasons: ResourceCache::new(
                "season",
                cache.season_limit_non_zero(),
                cache.stale_after(),
            ),
            selection: SelectionStore::new(),
        }
    }

    /// Build a client from loaded settings; `source.mode` decides which data
    /// source implementation backs it.
    pub fn from_settings(settings: &Settings) -> Result<Self, SourceError> {
        Ok(Self::new(build_source(&settings.source)?, &settings.cache))
    }

    pub fn selection(&self) -> &SelectionStore {
        &self.selection
    }

    /// Resolve a school by selector. `Unselected` reports idle without
    /// issuing any call.
    pub async fn school(&self, selector: &Selector<SchoolId>) -> QueryState<School> {
        let Selector::Selected(id) = selector else {
            return QueryState::Idle;
        };
        let source = Arc::clone(&self.source);
        let fetch_id = id.clone();
        self.schools
            .resolve(id.clone(), move || async move {
                source.school(&fetch_id).await
            })
            .await
            .into()
    }

    /// Resolve a season by selector. Symmetric with [`school`](Self::school).
    pub async fn season(&self, selector: &Selector<SeasonId>) -> QueryState<Season> {
        let Selector::Selected(id) = selector else {
            return QueryState::Idle;
        };
        let source = Arc::clone(&self.source);
        let fetch_id = id.clone();
        self.seasons
            .resolve(id.clone(), move || async move {
                source.season(&fetch_id).await
            })
            .await
            .into()
    }

    /// Resolve the school currently selected in the selection store.
    pub async fn current_school(&self) -> QueryState<School> {
        let selector = self.selection.school();
        self.school(&selector).await
    }

    /// Resolve the season currently selected in the selection store.
    pub async fn current_season(&self) -> QueryState<Season> {
        let selector = self.selection.season();
        self.season(&selector).await
    }

    /// Non-blocking view of a school key.
    pub fn school_status(&self, selector: &Selector<SchoolId>) -> QueryState<School> {
        match selector {
            Selector::Unselected => QueryState::Idle,
            Selector::Selected(id) => self.schools.status(id),
        }
    }

    /// Non-blocking view of a season key.
    pub fn season_status(&self, selector: &Selector<SeasonId>) -> QueryState<Season> {
        match selector {
            Selector::Unselected => QueryState::Idle,
            Selector::Selected(id) => self.seasons.status(id),
        }
    }

    /// Partially update a school. On success the cache entry for the school
    /// is replaced with the server's result before this call returns, so a
    /// subsequent read observes the update without a round-trip.
    pub async fn update_school(
        &self,
        id: &SchoolId,
        patch: SchoolPatch,
    ) -> Result<School, SourceError> {
        let updated = self.source.update_school(id, patch).await?;
        self.schools.store(id.clone(), updated.clone());
        Ok(updated)
    }

    /// Drop the cached entry for a school, forcing the next read to fetch.
    pub fn invalidate_school(&self, id: &SchoolId) {
        self.schools.invalidate(id);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::infra::fixture::FixtureSource;

    use super::*;

    /// Delegates to the fixture source while counting backend calls.
    struct CountingSource {
        inner: FixtureSource,
        reads: AtomicUsize,
    }

    impl CountingSource {
        fn new() -> Self {
            Self {
                inner: FixtureSource::new(),
                reads: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl DataSource for CountingSource {
        async fn school(&self, id: &SchoolId) -> Result<School, SourceError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.school(id).await
        }

        async fn update_school(
            &self,
            id: &SchoolId,
            patch: SchoolPatch,
        ) -> Result<School, SourceError> {
            self.inner.update_school(id, patch).await
        }

        async fn season(&self, id: &SeasonId) -> Result<Season, SourceError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.season(id).await
        }
    }

    fn client_with_counting_source() -> (AdmissionsClient, Arc<CountingSource>) {
        let source = Arc::new(CountingSource::new());
        let client = AdmissionsClient::new(
            Arc::clone(&source) as Arc<dyn DataSource>,
            &CacheConfig::default(),
        );
        (client, source)
    }

    #[tokio::test]
    async fn unselected_school_is_idle_and_calls_nothing() {
        let (client, source) = client_with_counting_source();

        let state = client.school(&Selector::Unselected).await;
        assert!(state.is_idle());
        assert!(client.school_status(&Selector::Unselected).is_idle());
        assert_eq!(source.reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn current_school_follows_the_selection_store() {
        let (client, source) = client_with_counting_source();

        assert!(client.current_school().await.is_idle());

        client.selection().select_school(SchoolId::from("school-42"));
        let state = client.current_school().await;

        let school = state.value().expect("school resolved");
        assert_eq!(school.id, SchoolId::from("school-42"));
        assert_eq!(school.name, "Oakridge Academy");
        assert_eq!(school.address, "123 Oak Street, Springfield");
        assert!(school.logo_url.is_none());
        assert_eq!(source.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn repeated_reads_hit_the_cache() {
        let (client, source) = client_with_counting_source();
        let selector = Selector::Selected(SchoolId::from("school-42"));

        client.school(&selector).await;
        client.school(&selector).await;
        client.school(&selector).await;

        assert_eq!(source.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn update_replaces_the_cache_entry_without_a_fetch() {
        let (client, source) = client_with_counting_source();
        let id = SchoolId::from("school-42");

        let updated = client
            .update_school(&id, SchoolPatch::default().name("New Name"))
            .await
            .expect("update succeeds");
        assert_eq!(updated.name, "New Name");

        let state = client.school(&Selector::Selected(id.clone())).await;
        assert_eq!(state.value(), Some(&updated));
        // Served from the write-through entry; the read issued no call.
        assert_eq!(source.reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalidation_forces_a_refetch() {
        let (client, source) = client_with_counting_source();
        let id = SchoolId::from("school-42");
        let selector = Selector::Selected(id.clone());

        client.school(&selector).await;
        client.invalidate_school(&id);
        client.school(&selector).await;

        assert_eq!(source.reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn season_resolution_uses_the_fixture() {
        let (client, _) = client_with_counting_source();

        client.selection().select_season(SeasonId::from("season-9"));
        let state = client.current_season().await;

        let season = state.value().expect("season resolved");
        assert_eq!(season.id, SeasonId::from("season-9"));
        assert!(season.is_active);
    }
}

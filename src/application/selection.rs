//! UI-scoped selection state shared across unrelated views.
//!
//! The store is constructed once at the composition root and handed to
//! dependents explicitly; there is no process-global instance. All
//! operations are total functions over in-memory state, and every mutation
//! notifies subscribers synchronously.

use tokio::sync::watch;
use tracing::debug;

use crate::domain::{SchoolId, SeasonId, Selector};

/// Snapshot of the current selection.
///
/// Created with all-default values at startup; has no server-side
/// counterpart and resets on process restart.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectionState {
    pub school: Selector<SchoolId>,
    pub season: Selector<SeasonId>,
    pub sidebar_collapsed: bool,
}

/// Holds cross-page selection state and notifies observers on change.
pub struct SelectionStore {
    state: watch::Sender<SelectionState>,
}

impl SelectionStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(SelectionState::default());
        Self { state }
    }

    pub fn snapshot(&self) -> SelectionState {
        self.state.borrow().clone()
    }

    pub fn school(&self) -> Selector<SchoolId> {
        self.state.borrow().school.clone()
    }

    pub fn season(&self) -> Selector<SeasonId> {
        self.state.borrow().season.clone()
    }

    pub fn sidebar_collapsed(&self) -> bool {
        self.state.borrow().sidebar_collapsed
    }

    /// Replace the current school selection. Accepts any identifier; no
    /// validation is performed.
    pub fn select_school(&self, id: SchoolId) {
        debug!(school = %id, "selection changed");
        self.state
            .send_modify(|state| state.school = Selector::Selected(id));
    }

    pub fn clear_school(&self) {
        self.state
            .send_modify(|state| state.school = Selector::Unselected);
    }

    /// Replace the current season selection. Symmetric with
    /// [`select_school`](Self::select_school).
    pub fn select_season(&self, id: SeasonId) {
        debug!(season = %id, "selection changed");
        self.state
            .send_modify(|state| state.season = Selector::Selected(id));
    }

    pub fn clear_season(&self) {
        self.state
            .send_modify(|state| state.season = Selector::Unselected);
    }

    /// Flip the sidebar flag; returns the new value.
    pub fn toggle_sidebar(&self) -> bool {
        let mut collapsed = false;
        self.state.send_modify(|state| {
            state.sidebar_collapsed = !state.sidebar_collapsed;
            collapsed = state.sidebar_collapsed;
        });
        collapsed
    }

    /// Observe selection changes. The receiver is marked changed on every
    /// mutation, including writes of an equal value.
    pub fn subscribe(&self) -> watch::Receiver<SelectionState> {
        self.state.subscribe()
    }
}

impl Default for SelectionStore {
    fn default() -> Self {
        Self::new()
    }
}

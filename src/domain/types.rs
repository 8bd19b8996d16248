//! Client-side domain notions shared across the cache and source layers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of entity being cached or fetched.
///
/// Paired with an identifier it names one cache entry and labels failures
/// and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    School,
    Season,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::School => "school",
            ResourceKind::Season => "season",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Explicit selection of a resource identifier.
///
/// Replaces nullable-identifier control flow: a resource is only fetched
/// under `Selected`, and `Unselected` keys report idle without issuing any
/// call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selector<T> {
    #[default]
    Unselected,
    Selected(T),
}

impl<T> Selector<T> {
    pub fn selected(&self) -> Option<&T> {
        match self {
            Selector::Unselected => None,
            Selector::Selected(id) => Some(id),
        }
    }

    pub fn is_selected(&self) -> bool {
        matches!(self, Selector::Selected(_))
    }
}

impl<T> From<Option<T>> for Selector<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(id) => Selector::Selected(id),
            None => Selector::Unselected,
        }
    }
}

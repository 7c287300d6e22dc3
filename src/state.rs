//! Explicit view state for the interactive session.
//!
//! The UI's mutable page/search globals are modeled as a reducer instead:
//! each user interaction produces a new [`ViewState`] computed from the
//! previous state and an [`Action`]. The web layer holds the current value
//! and replaces it wholesale per interaction; nothing mutates shared state
//! in place.

use crate::search::SearchFilter;
use serde::{Deserialize, Serialize};

/// Pages of the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    /// Keyword search with results grouped by domain
    Search,

    /// Browse records by domain
    Browse,

    /// Aggregate counts and charts
    Dashboard,

    /// Feedback submission form
    Feedback,
}

/// The complete interactive state of one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    /// Currently displayed page
    pub page: Page,

    /// Current search text
    pub query: String,

    /// Active domain filter; empty means no restriction
    pub domain_filter: Vec<String>,

    /// Only show records with a real global SME contact
    pub require_sme: bool,
}

impl ViewState {
    /// State at the start of a session: search page, nothing filtered
    pub fn initial() -> Self {
        ViewState {
            page: Page::Search,
            query: String::new(),
            domain_filter: Vec::new(),
            require_sme: false,
        }
    }

    /// The search filter this state describes
    pub fn filter(&self) -> SearchFilter {
        SearchFilter {
            query: self.query.clone(),
            domains: self.domain_filter.clone(),
            require_sme: self.require_sme,
        }
    }
}

/// One user interaction
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Switch to another page
    Navigate(Page),

    /// Replace the search text
    SetQuery(String),

    /// Replace the domain filter
    SetDomains(Vec<String>),

    /// Toggle the has-SME requirement
    SetRequireSme(bool),

    /// Drop the search text and every structural filter
    ClearFilters,
}

/// Compute the next view state from the previous state and one action
///
/// Pure function: the previous state is never mutated, and applying the
/// same action to the same state always yields the same result.
///
/// # Arguments
/// * `state` - The previous view state
/// * `action` - The user interaction
///
/// # Returns
/// * `ViewState` - The next view state
pub fn reduce(state: &ViewState, action: Action) -> ViewState {
    let mut next = state.clone();

    match action {
        Action::Navigate(page) => next.page = page,
        Action::SetQuery(query) => next.query = query,
        Action::SetDomains(domains) => next.domain_filter = domains,
        Action::SetRequireSme(require) => next.require_sme = require,
        Action::ClearFilters => {
            next.query.clear();
            next.domain_filter.clear();
            next.require_sme = false;
        }
    }

    next
}

//! Catalog search with stale-response suppression.
//!
//! The UI fires a search on every keystroke, so responses can arrive out of
//! order. Each issued search carries a monotonically increasing request id
//! and a completion is applied only while its id is still the latest; a
//! stale response is discarded rather than flashed onto the screen.

use std::sync::Arc;

use crate::client::api::{ApiError, UserGamesApi};
use crate::dto::game::{CatalogGameDto, GamesListDto, GamesQueryParams};

/// Handle identifying one issued search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    id: u64,
    term: String,
}

impl SearchTicket {
    /// The search term this ticket was issued for.
    pub fn term(&self) -> &str {
        &self.term
    }
}

/// One user's catalog search session.
pub struct CatalogSearchSession {
    api: Arc<dyn UserGamesApi>,
    next_id: u64,
    latest_id: u64,
    results: Vec<CatalogGameDto>,
    total: u64,
}

impl CatalogSearchSession {
    /// Create an empty session over the given API handle.
    pub fn new(api: Arc<dyn UserGamesApi>) -> Self {
        Self {
            api,
            next_id: 0,
            latest_id: 0,
            results: Vec::new(),
            total: 0,
        }
    }

    /// Results of the most recently applied search.
    pub fn results(&self) -> &[CatalogGameDto] {
        &self.results
    }

    /// Exact match count of the most recently applied search.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Register a new search, superseding every earlier one.
    pub fn issue(&mut self, term: &str) -> SearchTicket {
        self.next_id += 1;
        self.latest_id = self.next_id;
        SearchTicket {
            id: self.next_id,
            term: term.to_string(),
        }
    }

    /// Whether `ticket` is still the latest issued search.
    pub fn is_current(&self, ticket: &SearchTicket) -> bool {
        ticket.id == self.latest_id
    }

    /// Apply a completed search iff its ticket is still the latest.
    /// Returns whether the listing was applied.
    pub fn apply(&mut self, ticket: &SearchTicket, listing: GamesListDto) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.results = listing.results;
        self.total = listing.total;
        true
    }

    /// Issue a search, await it, and apply the result if it is still the
    /// latest. Returns whether the result was applied.
    pub async fn search(&mut self, term: &str) -> Result<bool, ApiError> {
        let ticket = self.issue(term);
        let listing = self
            .api
            .search_games(GamesQueryParams {
                search: Some(term.to_string()),
                ..Default::default()
            })
            .await?;
        Ok(self.apply(&ticket, listing))
    }
}

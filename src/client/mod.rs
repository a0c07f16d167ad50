//! Client-side view models.
//!
//! These mirror the server-held collection locally so a UI can reflect user
//! actions before the server confirms them. Every mutating action follows
//! the same discipline: snapshot the local state, apply the change, issue
//! the request, and restore the snapshot if the server rejects it.

/// Client-facing API abstraction and error type.
pub mod api;
/// Paged backlog view model.
pub mod backlog;
/// Ordered in-progress queue view model.
pub mod queue;
/// Catalog search with stale-response suppression.
pub mod search;

#[cfg(test)]
pub(crate) mod testing;

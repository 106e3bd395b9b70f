//! Repository trait for short link data access.

use crate::domain::entities::{Link, LinkPatch, LinkTarget, NewClick, NewLink};
use crate::error::RepositoryError;
use async_trait::async_trait;

/// Persistence collaborator for links and clicks.
///
/// This is the source of truth behind both cache tiers. Callers on the
/// redirect path bound every call with their own timeout.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Returns whether any link, live or soft-deleted, owns `code`.
    ///
    /// Used by code generation, so deleted codes are never reissued.
    async fn exists(&self, code: &str) -> Result<bool, RepositoryError>;

    /// Looks up the redirect target of a live link.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(target))` if a non-deleted link owns `code`
    /// - `Ok(None)` otherwise
    async fn lookup(&self, code: &str) -> Result<Option<LinkTarget>, RepositoryError>;

    /// Creates a new link.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Conflict`] if the code is already taken.
    async fn create(&self, new_link: NewLink) -> Result<Link, RepositoryError>;

    /// Applies a partial update to a live link.
    ///
    /// Returns `Ok(None)` if no live link owns `code`.
    async fn update(&self, code: &str, patch: LinkPatch) -> Result<Option<Link>, RepositoryError>;

    /// Soft-deletes a link.
    ///
    /// Returns `Ok(true)` if a live link was deleted, `Ok(false)` otherwise.
    async fn soft_delete(&self, code: &str) -> Result<bool, RepositoryError>;

    /// Records a click against the link owning `click.code`.
    async fn record_click(&self, click: NewClick) -> Result<(), RepositoryError>;

    /// Checks connectivity to the store.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

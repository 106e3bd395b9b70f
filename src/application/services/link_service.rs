//! Link lifecycle service: create, update, delete.

use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};

use crate::domain::entities::{Link, LinkPatch, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::infrastructure::cache::{CacheStore, CachedLink};
use crate::utils::alias_validator::validate_custom_alias;
use crate::utils::code_generator::{CodeGenError, DEFAULT_CODE_LENGTH, generate_unique_code};
use crate::utils::url_normalizer::normalize_url;

/// Service for creating and maintaining short links.
///
/// Every mutation is written to the link store first and then reflected in
/// both cache tiers, so a redirect never serves a stale target for longer
/// than one bounded cache operation.
pub struct LinkService {
    repository: Arc<dyn LinkRepository>,
    cache: Arc<CacheStore>,
}

impl LinkService {
    /// Creates a new link service.
    pub fn new(repository: Arc<dyn LinkRepository>, cache: Arc<CacheStore>) -> Self {
        Self { repository, cache }
    }

    /// Creates a short link.
    ///
    /// # Arguments
    ///
    /// - `long_url` - destination, normalized before storage
    /// - `custom_alias` - optional user-chosen code, validated against the alias policy
    /// - `permanent` - `true` (default) redirects with 301, `false` with 302
    ///
    /// # Code Generation
    ///
    /// Without an alias a random 7-character code is generated. If every
    /// attempt collides, generation is retried once with one more character.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the URL or alias is invalid.
    /// Returns [`AppError::Conflict`] if the alias is already taken.
    /// Returns [`AppError::Unavailable`] if no free code could be generated.
    pub async fn create(
        &self,
        long_url: &str,
        custom_alias: Option<&str>,
        permanent: Option<bool>,
    ) -> Result<Link, AppError> {
        let long_url = normalize_url(long_url).map_err(|e| {
            AppError::bad_request("Invalid URL format", json!({ "reason": e.to_string() }))
        })?;

        let code = match custom_alias {
            Some(alias) => {
                validate_custom_alias(alias).into_result().map_err(|e| {
                    AppError::bad_request(e.to_string(), json!({ "alias": alias }))
                })?;
                alias.to_string()
            }
            None => self.generate_code().await?,
        };

        let link = self
            .repository
            .create(NewLink {
                code,
                long_url,
                permanent: permanent.unwrap_or(true),
            })
            .await?;

        self.cache.clear_not_found(&link.code).await;
        self.cache
            .set(&link.code, CachedLink::new(&link.long_url, link.permanent), None);

        info!(code = %link.code, permanent = link.permanent, "Link created");
        Ok(link)
    }

    /// Updates the target URL and/or redirect type of a live link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the patch is empty or the URL is invalid.
    /// Returns [`AppError::NotFound`] if no live link owns `code`.
    pub async fn update(&self, code: &str, mut patch: LinkPatch) -> Result<Link, AppError> {
        if patch.is_empty() {
            return Err(AppError::bad_request(
                "Nothing to update",
                json!({ "fields": ["url", "permanent"] }),
            ));
        }

        if let Some(url) = patch.url.take() {
            patch.url = Some(normalize_url(&url).map_err(|e| {
                AppError::bad_request("Invalid URL format", json!({ "reason": e.to_string() }))
            })?);
        }

        let link = self
            .repository
            .update(code, patch)
            .await?
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "code": code })))?;

        if !self.cache.invalidate(code).await {
            warn!(code = %code, "Cache invalidation failed after update");
        }

        info!(code = %code, "Link updated");
        Ok(link)
    }

    /// Soft-deletes a link and evicts it from the cache.
    ///
    /// The code stays reserved and is never reissued.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no live link owns `code`.
    pub async fn delete(&self, code: &str) -> Result<(), AppError> {
        if !self.repository.soft_delete(code).await? {
            return Err(AppError::not_found("Link not found", json!({ "code": code })));
        }

        if !self.cache.invalidate(code).await {
            warn!(code = %code, "Cache invalidation failed after delete");
        }

        info!(code = %code, "Link deleted");
        Ok(())
    }

    async fn generate_code(&self) -> Result<String, AppError> {
        match self.generate_code_of_length(DEFAULT_CODE_LENGTH).await {
            Err(CodeGenError::CollisionExhausted { attempts }) => {
                warn!(
                    attempts,
                    length = DEFAULT_CODE_LENGTH + 1,
                    "Escalating short code length"
                );
                Ok(self.generate_code_of_length(DEFAULT_CODE_LENGTH + 1).await?)
            }
            result => Ok(result?),
        }
    }

    async fn generate_code_of_length(&self, length: usize) -> Result<String, CodeGenError> {
        generate_unique_code(
            |candidate| {
                let repository = self.repository.clone();
                async move { repository.exists(&candidate).await }
            },
            length,
        )
        .await
    }
}

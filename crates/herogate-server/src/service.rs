//! Hero aggregation: cache lookup, resilient upstream fetch, profile
//! enrichment, error mapping.

use std::sync::Arc;

use futures_util::future::try_join_all;

use herogate_core::{AuthenticatedHero, Hero, HeroListing, HeroProfile, HeroView, UpstreamError};
use herogate_upstream::{RetryPolicy, UpstreamClient, with_retry};

use crate::cache::TtlCache;
use crate::error::ApiError;

/// Values held by the shared response cache. The key scheme keeps list and
/// single-hero entries apart, and public vs authenticated views apart.
#[derive(Clone, Debug)]
pub enum CachedView {
    Listing(HeroListing),
    Single(HeroView),
}

/// Orchestrates the read path: cache, retry-wrapped upstream calls, profile
/// enrichment for authenticated callers, and uniform error mapping.
pub struct HeroService {
    upstream: Arc<UpstreamClient>,
    cache: Arc<TtlCache<CachedView>>,
    retry: RetryPolicy,
}

impl HeroService {
    /// The cache is an explicitly owned collaborator injected here; a single
    /// shared instance serves all requests.
    pub fn new(
        upstream: Arc<UpstreamClient>,
        cache: Arc<TtlCache<CachedView>>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            upstream,
            cache,
            retry,
        }
    }

    /// The hero roster, enriched with profiles when the caller is
    /// authenticated.
    pub async fn list_heroes(&self, authenticated: bool) -> Result<HeroListing, ApiError> {
        let key = listing_cache_key(authenticated);
        if let Some(CachedView::Listing(listing)) = self.cache.get(&key) {
            tracing::debug!(key = %key, "cache hit");
            return Ok(listing);
        }

        let heroes = with_retry(self.retry, "list_heroes", fetch_should_retry, || {
            self.upstream.list_heroes()
        })
        .await
        .map_err(|err| map_fetch_error("list_heroes", err))?;

        let listing = if authenticated {
            HeroListing::Enriched(self.enrich_all(heroes).await?)
        } else {
            HeroListing::Public(heroes)
        };

        self.cache.set(key, CachedView::Listing(listing.clone()));
        Ok(listing)
    }

    /// A single hero by id, enriched when the caller is authenticated.
    pub async fn get_hero(&self, hero_id: &str, authenticated: bool) -> Result<HeroView, ApiError> {
        let key = hero_cache_key(hero_id, authenticated);
        if let Some(CachedView::Single(view)) = self.cache.get(&key) {
            tracing::debug!(key = %key, "cache hit");
            return Ok(view);
        }

        let hero = with_retry(self.retry, "get_hero", fetch_should_retry, || {
            self.upstream.get_hero(hero_id)
        })
        .await
        .map_err(|err| map_fetch_error("get_hero", err))?;

        let view = if authenticated {
            let profile = self.fetch_profile(&hero.id).await?;
            HeroView::Enriched(hero.with_profile(profile))
        } else {
            HeroView::Public(hero)
        };

        self.cache.set(key, CachedView::Single(view.clone()));
        Ok(view)
    }

    /// Profiles for a listing are fetched concurrently, one retry-wrapped
    /// call per hero. The first failure aborts the whole aggregation; no
    /// partial results are served.
    async fn enrich_all(&self, heroes: Vec<Hero>) -> Result<Vec<AuthenticatedHero>, ApiError> {
        let profiles =
            try_join_all(heroes.iter().map(|hero| self.fetch_profile(&hero.id))).await?;

        Ok(heroes
            .into_iter()
            .zip(profiles)
            .map(|(hero, profile)| hero.with_profile(profile))
            .collect())
    }

    async fn fetch_profile(&self, hero_id: &str) -> Result<HeroProfile, ApiError> {
        with_retry(self.retry, "get_hero_profile", fetch_should_retry, || {
            self.upstream.get_hero_profile(hero_id)
        })
        .await
        .map_err(|err| map_fetch_error("get_hero_profile", err))
    }
}

fn listing_cache_key(authenticated: bool) -> String {
    format!("heroes:{}", variant(authenticated))
}

fn hero_cache_key(hero_id: &str, authenticated: bool) -> String {
    format!("hero:{hero_id}:{}", variant(authenticated))
}

fn variant(authenticated: bool) -> &'static str {
    if authenticated { "authenticated" } else { "public" }
}

/// Transient classes are retried; a 404 (mapped to `NotFound` by the
/// client) and a 401 are permanent and never retried.
fn fetch_should_retry(err: &UpstreamError) -> bool {
    matches!(
        err,
        UpstreamError::Business { .. } | UpstreamError::Transport { .. }
    )
}

fn map_fetch_error(context: &str, err: UpstreamError) -> ApiError {
    if err.is_not_found() {
        return ApiError::not_found("Hero not found");
    }
    tracing::error!(context = %context, error = %err, "upstream call failed");
    ApiError::service_unavailable("external API service unavailable")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_cache_keys_encode_auth_variant() {
        assert_eq!(listing_cache_key(false), "heroes:public");
        assert_eq!(listing_cache_key(true), "heroes:authenticated");
        assert_eq!(hero_cache_key("1", false), "hero:1:public");
        assert_eq!(hero_cache_key("1", true), "hero:1:authenticated");
    }

    #[test]
    fn test_retry_predicate_excludes_permanent_failures() {
        assert!(fetch_should_retry(&UpstreamError::business(1000, "x")));
        assert!(fetch_should_retry(&UpstreamError::transport_status(
            500, "boom"
        )));
        assert!(fetch_should_retry(&UpstreamError::transport("refused")));
        assert!(!fetch_should_retry(&UpstreamError::NotFound));
        assert!(!fetch_should_retry(&UpstreamError::Unauthorized));
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let err = map_fetch_error("get_hero", UpstreamError::NotFound);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.message(), "Hero not found");
    }

    #[test]
    fn test_other_failures_map_to_503() {
        let err = map_fetch_error("list_heroes", UpstreamError::transport("refused"));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.message(), "external API service unavailable");

        let err = map_fetch_error("list_heroes", UpstreamError::business(1000, "x"));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}

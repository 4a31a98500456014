use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::collaborators::{CollaboratorError, DetailStore, SearchIndex};
use crate::domain::restaurant::{Restaurant, RestaurantId, MAX_RECOMMENDATIONS};
use crate::retry::RetryPolicy;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("restaurant search failed: {0}")]
    Search(#[source] CollaboratorError),
    #[error("detail lookup for restaurant `{id}` failed: {source}")]
    DetailStore { id: RestaurantId, source: CollaboratorError },
}

/// Turns a cuisine into restaurant records via the search index and detail store.
#[derive(Clone)]
pub struct RecommendationResolver {
    search: Arc<dyn SearchIndex>,
    store: Arc<dyn DetailStore>,
    retry: RetryPolicy,
    limit: usize,
}

impl RecommendationResolver {
    pub fn new(search: Arc<dyn SearchIndex>, store: Arc<dyn DetailStore>) -> Self {
        Self { search, store, retry: RetryPolicy::default(), limit: MAX_RECOMMENDATIONS }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Caps the number of candidates requested from the search index.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.clamp(1, MAX_RECOMMENDATIONS);
        self
    }

    /// Resolves up to `limit` restaurants in search-rank order.
    ///
    /// A blank cuisine resolves to nothing without querying the index. Identifiers
    /// the detail store does not know are skipped; any other failure is returned
    /// so it is never mistaken for "no matches".
    pub async fn resolve(&self, cuisine: &str) -> Result<Vec<Restaurant>, ResolutionError> {
        let cuisine = cuisine.trim();
        if cuisine.is_empty() {
            return Ok(Vec::new());
        }

        let mut ids = self
            .retry
            .run("search_by_cuisine", || self.search.search_by_cuisine(cuisine, self.limit))
            .await
            .map_err(ResolutionError::Search)?;
        ids.truncate(self.limit);
        debug!(
            event_name = "resolver.search_completed",
            cuisine,
            hits = ids.len(),
            "search index returned candidates"
        );

        let mut restaurants = Vec::with_capacity(ids.len());
        for id in ids {
            match self.retry.run("detail_store_get", || self.store.get(&id)).await {
                Ok(Some(restaurant)) => restaurants.push(restaurant),
                Ok(None) | Err(CollaboratorError::NotFound(_)) => {
                    debug!(
                        event_name = "resolver.detail_missing",
                        restaurant_id = %id,
                        "restaurant missing from detail store; skipping"
                    );
                }
                Err(source) => return Err(ResolutionError::DetailStore { id, source }),
            }
        }

        info!(
            event_name = "resolver.resolved",
            cuisine,
            restaurants = restaurants.len(),
            "recommendations resolved"
        );
        Ok(restaurants)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use super::{RecommendationResolver, ResolutionError};
    use crate::collaborators::{CollaboratorError, InMemoryDetailStore, InMemorySearchIndex};
    use crate::domain::restaurant::Restaurant;
    use crate::retry::RetryPolicy;

    fn resolver(
        index: &InMemorySearchIndex,
        store: &InMemoryDetailStore,
    ) -> RecommendationResolver {
        RecommendationResolver::new(Arc::new(index.clone()), Arc::new(store.clone()))
            .with_retry(RetryPolicy { max_retries: 2, base_delay_ms: 1, max_delay_ms: 1 })
    }

    #[tokio::test]
    async fn blank_cuisine_skips_the_search_index() {
        let index = InMemorySearchIndex::default();
        let store = InMemoryDetailStore::default();

        assert!(resolver(&index, &store).resolve("").await.expect("resolve").is_empty());
        assert!(resolver(&index, &store).resolve("   ").await.expect("resolve").is_empty());
        assert_eq!(index.calls(), 0);
    }

    #[tokio::test]
    async fn ids_missing_from_store_are_skipped_in_rank_order() {
        let index = InMemorySearchIndex::default();
        index.insert("Mexican", ["A", "B", "C"]);
        let store = InMemoryDetailStore::default();
        store.insert(Restaurant::new("A").with_name("Alpha"));
        store.insert(Restaurant::new("C").with_name("Gamma").with_rating(Decimal::new(4, 0)));

        let restaurants = resolver(&index, &store).resolve("Mexican").await.expect("resolve");

        let ids: Vec<_> = restaurants.iter().map(|restaurant| restaurant.id.0.as_str()).collect();
        assert_eq!(ids, vec!["A", "C"]);
    }

    #[tokio::test]
    async fn at_most_five_candidates_are_resolved() {
        let index = InMemorySearchIndex::default();
        index.insert("Thai", ["1", "2", "3", "4", "5", "6", "7"]);
        let store = InMemoryDetailStore::default();
        for id in ["1", "2", "3", "4", "5", "6", "7"] {
            store.insert(Restaurant::new(id));
        }

        let restaurants = resolver(&index, &store).resolve("Thai").await.expect("resolve");
        assert_eq!(restaurants.len(), 5);
    }

    #[tokio::test]
    async fn no_hits_is_an_empty_success() {
        let index = InMemorySearchIndex::default();
        let store = InMemoryDetailStore::default();

        let restaurants = resolver(&index, &store).resolve("Ethiopian").await.expect("resolve");
        assert!(restaurants.is_empty());
        assert_eq!(index.calls(), 1);
    }

    #[tokio::test]
    async fn search_backend_failure_is_not_reported_as_no_results() {
        let index = InMemorySearchIndex::default();
        index.fail_with(CollaboratorError::Malformed("missing hits".to_owned()));
        let store = InMemoryDetailStore::default();

        let error = resolver(&index, &store).resolve("Thai").await.expect_err("must fail");
        assert!(matches!(error, ResolutionError::Search(CollaboratorError::Malformed(_))));
    }

    #[tokio::test]
    async fn transient_search_failure_is_retried() {
        let index = InMemorySearchIndex::default();
        index.insert("Thai", ["A"]);
        index.fail_next_with(CollaboratorError::Unavailable("503".to_owned()));
        let store = InMemoryDetailStore::default();
        store.insert(Restaurant::new("A"));

        let restaurants = resolver(&index, &store).resolve("Thai").await.expect("resolve");
        assert_eq!(restaurants.len(), 1);
        assert_eq!(index.calls(), 2);
    }

    #[tokio::test]
    async fn detail_store_outage_aborts_resolution() {
        let index = InMemorySearchIndex::default();
        index.insert("Thai", ["A"]);
        let store = InMemoryDetailStore::default();
        store.fail_with(CollaboratorError::Unavailable("throttled".to_owned()));

        let error = resolver(&index, &store).resolve("Thai").await.expect_err("must fail");
        assert!(matches!(error, ResolutionError::DetailStore { ref id, .. } if id.0 == "A"));
    }
}

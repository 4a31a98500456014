use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{sqlite::SqliteRow, Row};

use concierge_core::collaborators::{CollaboratorError, DetailStore, SearchIndex};
use concierge_core::domain::restaurant::{Restaurant, RestaurantId};

use super::RepositoryError;
use crate::DbPool;

/// Restaurant detail records keyed by `business_id`.
#[derive(Clone)]
pub struct SqlDetailStore {
    pool: DbPool,
}

impl SqlDetailStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(
        &self,
        id: &RestaurantId,
    ) -> Result<Option<Restaurant>, RepositoryError> {
        let row = sqlx::query(
            "SELECT business_id, name, address, rating, review_count
             FROM restaurant
             WHERE business_id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(restaurant_from_row).transpose()
    }

    /// Inserts or replaces a record. `cuisine` feeds the local cuisine index.
    pub async fn save(
        &self,
        restaurant: &Restaurant,
        cuisine: Option<&str>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO restaurant (business_id, name, address, rating, review_count, cuisine, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(business_id) DO UPDATE SET
                name = excluded.name,
                address = excluded.address,
                rating = excluded.rating,
                review_count = excluded.review_count,
                cuisine = excluded.cuisine,
                updated_at = excluded.updated_at",
        )
        .bind(&restaurant.id.0)
        .bind(restaurant.name.as_deref())
        .bind(restaurant.address.as_deref())
        .bind(restaurant.rating.map(|rating| rating.to_string()))
        .bind(restaurant.review_count.map(i64::from))
        .bind(cuisine)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn count(&self) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query("SELECT COUNT(*) AS count FROM restaurant")
            .fetch_one(&self.pool)
            .await?
            .try_get("count")?;
        u64::try_from(count)
            .map_err(|_| RepositoryError::Decode(format!("invalid restaurant count: {count}")))
    }
}

#[async_trait]
impl DetailStore for SqlDetailStore {
    async fn get(&self, id: &RestaurantId) -> Result<Option<Restaurant>, CollaboratorError> {
        Ok(self.find_by_id(id).await?)
    }
}

/// Cuisine lookup over the local `restaurant` table, for deployments without
/// an external search cluster. Ranks by rating, then review count.
#[derive(Clone)]
pub struct SqlCuisineIndex {
    pool: DbPool,
}

impl SqlCuisineIndex {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_ids(
        &self,
        cuisine: &str,
        size: usize,
    ) -> Result<Vec<RestaurantId>, RepositoryError> {
        let limit = i64::try_from(size).unwrap_or(i64::MAX);
        let rows = sqlx::query(
            "SELECT business_id
             FROM restaurant
             WHERE cuisine = ? COLLATE NOCASE
             ORDER BY CAST(rating AS REAL) DESC NULLS LAST,
                      review_count DESC NULLS LAST,
                      business_id ASC
             LIMIT ?",
        )
        .bind(cuisine.trim())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<RestaurantId, RepositoryError> {
                Ok(RestaurantId(row.try_get("business_id")?))
            })
            .collect()
    }
}

#[async_trait]
impl SearchIndex for SqlCuisineIndex {
    async fn search_by_cuisine(
        &self,
        cuisine: &str,
        size: usize,
    ) -> Result<Vec<RestaurantId>, CollaboratorError> {
        Ok(self.find_ids(cuisine, size).await?)
    }
}

fn restaurant_from_row(row: SqliteRow) -> Result<Restaurant, RepositoryError> {
    let rating = row
        .try_get::<Option<String>, _>("rating")?
        .map(|value| {
            Decimal::from_str(&value)
                .map_err(|_| RepositoryError::Decode(format!("invalid rating `{value}`")))
        })
        .transpose()?;
    let review_count = row
        .try_get::<Option<i64>, _>("review_count")?
        .map(|value| {
            u32::try_from(value)
                .map_err(|_| RepositoryError::Decode(format!("invalid review_count {value}")))
        })
        .transpose()?;

    Ok(Restaurant {
        id: RestaurantId(row.try_get("business_id")?),
        name: row.try_get("name")?,
        address: row.try_get("address")?,
        rating,
        review_count,
    })
}

#[cfg(test)]
mod tests {
    use concierge_core::collaborators::{CollaboratorError, DetailStore, SearchIndex};
    use concierge_core::domain::restaurant::{Restaurant, RestaurantId};
    use rust_decimal::Decimal;

    use super::{SqlCuisineIndex, SqlDetailStore};
    use crate::{connect_with_settings, migrations, DbPool};

    async fn pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    #[tokio::test]
    async fn saved_record_round_trips_through_detail_store() {
        let store = SqlDetailStore::new(pool().await);
        let restaurant = Restaurant::new("abc")
            .with_name("Taqueria")
            .with_address("1 Main St")
            .with_rating(Decimal::new(45, 1))
            .with_review_count(120);
        store.save(&restaurant, Some("Mexican")).await.expect("save");

        let loaded = store.get(&RestaurantId("abc".to_string())).await.expect("get");
        assert_eq!(loaded, Some(restaurant));
    }

    #[tokio::test]
    async fn partial_record_keeps_absent_fields() {
        let store = SqlDetailStore::new(pool().await);
        store.save(&Restaurant::new("bare"), None).await.expect("save");

        let loaded = store.get(&RestaurantId("bare".to_string())).await.expect("get");
        assert_eq!(loaded, Some(Restaurant::new("bare")));
    }

    #[tokio::test]
    async fn unknown_id_is_none() {
        let store = SqlDetailStore::new(pool().await);
        let loaded = store.get(&RestaurantId("missing".to_string())).await.expect("get");
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn corrupt_rating_is_malformed() {
        let pool = pool().await;
        sqlx::query(
            "INSERT INTO restaurant (business_id, rating, updated_at) VALUES ('x', 'five', '2026-01-01T00:00:00Z')",
        )
        .execute(&pool)
        .await
        .expect("insert");

        let error = SqlDetailStore::new(pool)
            .get(&RestaurantId("x".to_string()))
            .await
            .expect_err("decode fails");
        assert!(matches!(error, CollaboratorError::Malformed(_)));
    }

    #[tokio::test]
    async fn cuisine_index_matches_case_insensitively_and_caps_size() {
        let pool = pool().await;
        let store = SqlDetailStore::new(pool.clone());
        for (id, rating) in [("a", 30), ("b", 48), ("c", 41), ("d", 35)] {
            store
                .save(&Restaurant::new(id).with_rating(Decimal::new(rating, 1)), Some("Thai"))
                .await
                .expect("save");
        }
        store.save(&Restaurant::new("z"), Some("Mexican")).await.expect("save");

        let ids = SqlCuisineIndex::new(pool).search_by_cuisine("thai", 3).await.expect("search");
        let ids: Vec<_> = ids.iter().map(|id| id.0.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "d"]);
    }

    #[tokio::test]
    async fn cuisine_without_matches_is_empty() {
        let index = SqlCuisineIndex::new(pool().await);
        assert!(index.search_by_cuisine("Ethiopian", 5).await.expect("search").is_empty());
    }
}

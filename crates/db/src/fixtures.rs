use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::Deserialize;

use concierge_core::domain::restaurant::{Restaurant, RestaurantId};

use crate::connection::DbPool;
use crate::repositories::{RepositoryError, SqlDetailStore};

/// One restaurant in a seed file. Only `business_id` is required.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RestaurantSeed {
    pub business_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub rating: Option<Decimal>,
    #[serde(default)]
    pub review_count: Option<u32>,
    #[serde(default)]
    pub cuisine: Option<String>,
}

impl RestaurantSeed {
    pub fn to_restaurant(&self) -> Restaurant {
        Restaurant {
            id: RestaurantId(self.business_id.trim().to_string()),
            name: self.name.clone(),
            address: self.address.clone(),
            rating: self.rating,
            review_count: self.review_count,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeedResult {
    pub restaurants_loaded: usize,
    pub cuisines: BTreeSet<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RestaurantSeedDataset {
    pub records: Vec<RestaurantSeed>,
}

impl RestaurantSeedDataset {
    /// Parses a JSON array of restaurant records.
    pub fn from_json(raw: &str) -> Result<Self, RepositoryError> {
        let records: Vec<RestaurantSeed> = serde_json::from_str(raw)
            .map_err(|error| RepositoryError::Decode(format!("invalid seed file: {error}")))?;

        if let Some(position) =
            records.iter().position(|record| record.business_id.trim().is_empty())
        {
            return Err(RepositoryError::Decode(format!(
                "seed record #{} has an empty business_id",
                position + 1
            )));
        }

        Ok(Self { records })
    }

    /// Upserts every record; a repeated `business_id` keeps the last occurrence.
    pub async fn load(&self, pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let store = SqlDetailStore::new(pool.clone());
        let mut result = SeedResult::default();

        for record in &self.records {
            let cuisine = record.cuisine.as_deref().map(str::trim).filter(|c| !c.is_empty());
            store.save(&record.to_restaurant(), cuisine).await?;
            result.restaurants_loaded += 1;
            if let Some(cuisine) = cuisine {
                result.cuisines.insert(cuisine.to_string());
            }
        }

        Ok(result)
    }
}

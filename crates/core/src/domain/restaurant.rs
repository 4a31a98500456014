use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Upper bound on recommendations returned for one request.
pub const MAX_RECOMMENDATIONS: usize = 5;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RestaurantId(pub String);

impl fmt::Display for RestaurantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Restaurant record from the detail store. Any field besides the id may be absent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restaurant {
    #[serde(rename = "business_id")]
    pub id: RestaurantId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub rating: Option<Decimal>,
    #[serde(default)]
    pub review_count: Option<u32>,
}

impl Restaurant {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: RestaurantId(id.into()),
            name: None,
            address: None,
            rating: None,
            review_count: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_rating(mut self, rating: Decimal) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_review_count(mut self, review_count: u32) -> Self {
        self.review_count = Some(review_count);
        self
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::Restaurant;

    #[test]
    fn partial_record_deserializes_with_absent_fields() {
        let restaurant: Restaurant =
            serde_json::from_str(r#"{"business_id":"abc","name":"Taqueria"}"#).expect("decode");

        assert_eq!(restaurant.id.0, "abc");
        assert_eq!(restaurant.name.as_deref(), Some("Taqueria"));
        assert_eq!(restaurant.address, None);
        assert_eq!(restaurant.rating, None);
        assert_eq!(restaurant.review_count, None);
    }

    #[test]
    fn builder_fills_optional_fields() {
        let restaurant = Restaurant::new("r-1")
            .with_name("Casa")
            .with_address("1 Main St")
            .with_rating(Decimal::new(45, 1))
            .with_review_count(120);

        assert_eq!(restaurant.rating.map(|rating| rating.to_string()).as_deref(), Some("4.5"));
        assert_eq!(restaurant.review_count, Some(120));
    }
}

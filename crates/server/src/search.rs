use std::time::Duration;

use async_trait::async_trait;
use concierge_core::collaborators::{CollaboratorError, SearchIndex};
use concierge_core::config::SearchConfig;
use concierge_core::domain::restaurant::RestaurantId;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::debug;

use crate::transport::{status_error, transport_error};

const CUISINE_FIELD: &str = "Cuisine";
const ID_POINTER: &str = "/_source/RestaurantID";

/// Cuisine search against an Elasticsearch-compatible `_search` endpoint.
#[derive(Clone)]
pub struct HttpSearchIndex {
    client: reqwest::Client,
    endpoint: String,
    username: Option<String>,
    password: Option<SecretString>,
}

impl HttpSearchIndex {
    pub fn new(config: &SearchConfig) -> Result<Self, reqwest::Error> {
        let client =
            reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/{}/_search",
                config.base_url.trim_end_matches('/'),
                config.index.trim_matches('/')
            ),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SearchIndex for HttpSearchIndex {
    async fn search_by_cuisine(
        &self,
        cuisine: &str,
        size: usize,
    ) -> Result<Vec<RestaurantId>, CollaboratorError> {
        let mut request = self.client.get(&self.endpoint).json(&query_body(cuisine, size));
        if let Some(username) = &self.username {
            request = request
                .basic_auth(username, self.password.as_ref().map(|secret| secret.expose_secret()));
        }

        let response = request.send().await.map_err(|error| transport_error("search", &error))?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(
                event_name = "resolver.search_status",
                endpoint = %self.endpoint,
                status = status.as_u16(),
                "search returned a non-success status"
            );
            return Err(status_error("search", status, &body));
        }

        let body: Value = response.json().await.map_err(|error| {
            CollaboratorError::Malformed(format!("search response is not JSON: {error}"))
        })?;
        extract_ids(&body)
    }
}

fn query_body(cuisine: &str, size: usize) -> Value {
    json!({
        "size": size,
        "query": { "match": { CUISINE_FIELD: cuisine } }
    })
}

/// Reads `hits.hits[*]._source.RestaurantID` in hit order. Hits without a
/// usable identifier are skipped.
fn extract_ids(body: &Value) -> Result<Vec<RestaurantId>, CollaboratorError> {
    let hits = body.pointer("/hits/hits").and_then(Value::as_array).ok_or_else(|| {
        CollaboratorError::Malformed("search response has no hits.hits array".to_string())
    })?;

    Ok(hits
        .iter()
        .filter_map(|hit| match hit.pointer(ID_POINTER) {
            Some(Value::String(id)) if !id.trim().is_empty() => Some(RestaurantId(id.clone())),
            Some(Value::Number(id)) => Some(RestaurantId(id.to_string())),
            _ => None,
        })
        .collect())
}

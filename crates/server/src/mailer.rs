use std::time::Duration;

use async_trait::async_trait;
use concierge_core::collaborators::{CollaboratorError, EmailMessageId, EmailSender, OutgoingEmail};
use concierge_core::config::EmailConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::transport::{status_error, transport_error};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendResponse {
    message_id: Option<String>,
}

/// Transactional email over a JSON HTTP API authenticated with a bearer token.
#[derive(Clone)]
pub struct HttpEmailSender {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<SecretString>,
}

impl HttpEmailSender {
    pub fn new(config: &EmailConfig) -> Result<Self, reqwest::Error> {
        let client =
            reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
        Ok(Self { client, api_url: config.api_url.clone(), api_key: config.api_key.clone() })
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send(&self, email: &OutgoingEmail) -> Result<EmailMessageId, CollaboratorError> {
        let mut request = self.client.post(&self.api_url).json(email);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response = request.send().await.map_err(|error| transport_error("email", &error))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error("email", status, &body));
        }

        // Any 2xx is a delivered send; the id is informational.
        let body = response.text().await.unwrap_or_default();
        let message_id = serde_json::from_str::<SendResponse>(&body)
            .ok()
            .and_then(|payload| payload.message_id)
            .filter(|id| !id.trim().is_empty());

        Ok(message_id.map(EmailMessageId).unwrap_or_else(|| {
            let synthesized = format!("accepted-{}", Uuid::new_v4());
            warn!(
                event_name = "notifier.email_receipt_missing",
                status = status.as_u16(),
                message_id = %synthesized,
                "email api accepted the send without a messageId"
            );
            EmailMessageId(synthesized)
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::State,
        http::{HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use concierge_core::collaborators::{CollaboratorError, EmailSender, OutgoingEmail};
    use concierge_core::config::{AppConfig, EmailConfig};
    use serde_json::{json, Value};

    use super::HttpEmailSender;
    use crate::test_support::spawn_stub;

    type Captured = Arc<Mutex<Vec<(Option<String>, Value)>>>;

    async fn accept(
        State(captured): State<Captured>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        let auth = headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        captured.lock().expect("lock").push((auth, body));
        Json(json!({ "messageId": "0100-abc" }))
    }

    fn email() -> OutgoingEmail {
        OutgoingEmail {
            source: "concierge@example.com".to_string(),
            destination: vec!["guest@example.com".to_string()],
            subject: "Your Thai Restaurant Recommendations".to_string(),
            body_text: "1. Thai Palace".to_string(),
            body_html: "<li>Thai Palace</li>".to_string(),
        }
    }

    fn config(api_url: String) -> EmailConfig {
        EmailConfig { api_url, ..AppConfig::default().email }
    }

    #[tokio::test]
    async fn send_posts_camel_case_payload_with_bearer_token() {
        let captured = Captured::default();
        let base_url = spawn_stub(
            Router::new().route("/v1/send", post(accept)).with_state(captured.clone()),
        )
        .await;
        let sender = HttpEmailSender::new(&EmailConfig {
            api_key: Some("key-123".to_string().into()),
            ..config(format!("{base_url}/v1/send"))
        })
        .expect("client");

        let id = sender.send(&email()).await.expect("send");

        assert_eq!(id.0, "0100-abc");
        let captured = captured.lock().expect("lock").clone();
        assert_eq!(captured[0].0.as_deref(), Some("Bearer key-123"));
        assert_eq!(captured[0].1["destination"], json!(["guest@example.com"]));
        assert_eq!(captured[0].1["bodyHtml"], "<li>Thai Palace</li>");
    }

    #[tokio::test]
    async fn client_error_is_rejected() {
        let base_url = spawn_stub(Router::new().route(
            "/v1/send",
            post(|| async { (StatusCode::BAD_REQUEST, "Email address is not verified") }),
        ))
        .await;
        let sender = HttpEmailSender::new(&config(format!("{base_url}/v1/send"))).expect("client");

        let error = sender.send(&email()).await.expect_err("rejected");
        assert!(matches!(error, CollaboratorError::Rejected(ref m) if m.contains("not verified")));
    }

    #[tokio::test]
    async fn server_error_is_unavailable() {
        let base_url = spawn_stub(Router::new().route(
            "/v1/send",
            post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        ))
        .await;
        let sender = HttpEmailSender::new(&config(format!("{base_url}/v1/send"))).expect("client");

        assert!(sender.send(&email()).await.expect_err("outage").is_retryable());
    }

    #[tokio::test]
    async fn accepted_send_without_message_id_still_counts_as_delivered() {
        let base_url = spawn_stub(
            Router::new().route("/v1/send", post(|| async { Json(json!({ "status": "queued" })) })),
        )
        .await;
        let sender = HttpEmailSender::new(&config(format!("{base_url}/v1/send"))).expect("client");

        let id = sender.send(&email()).await.expect("2xx is delivered");
        assert!(id.0.starts_with("accepted-"));
    }

    #[tokio::test]
    async fn accepted_send_with_empty_body_still_counts_as_delivered() {
        let base_url = spawn_stub(
            Router::new().route("/v1/send", post(|| async { StatusCode::ACCEPTED })),
        )
        .await;
        let sender = HttpEmailSender::new(&config(format!("{base_url}/v1/send"))).expect("client");

        assert!(sender.send(&email()).await.is_ok());
    }
}

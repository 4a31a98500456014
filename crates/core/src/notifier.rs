use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tera::{Context, Tera};
use thiserror::Error;
use tracing::{info, warn};

use crate::collaborators::{CollaboratorError, EmailMessageId, EmailSender, OutgoingEmail};
use crate::domain::request::QueuedRequest;
use crate::domain::restaurant::Restaurant;
use crate::retry::RetryPolicy;

pub const UNKNOWN_NAME: &str = "Unknown Restaurant";
pub const UNKNOWN_ADDRESS: &str = "Address not available";
pub const UNRATED: &str = "Not rated";
pub const NO_REVIEWS: &str = "No reviews";

const RECOMMENDATIONS_TEXT: &str = "recommendations.txt";
const RECOMMENDATIONS_HTML: &str = "recommendations.html";
const NO_RESULTS_TEXT: &str = "no_results.txt";
const NO_RESULTS_HTML: &str = "no_results.html";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTemplate {
    Recommendations,
    NoResults,
}

impl NotificationTemplate {
    pub fn select(restaurants: &[Restaurant]) -> Self {
        if restaurants.is_empty() {
            Self::NoResults
        } else {
            Self::Recommendations
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recommendations => "recommendations",
            Self::NoResults => "no_results",
        }
    }
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("email template failed to render: {0}")]
    Template(String),
    #[error("email delivery failed: {0}")]
    Delivery(#[source] CollaboratorError),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationReceipt {
    pub message_id: EmailMessageId,
    pub template: NotificationTemplate,
}

/// One numbered line item, with placeholders already substituted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
struct ListingEntry {
    position: usize,
    name: String,
    address: String,
    rating: String,
    review_count: String,
}

impl ListingEntry {
    fn new(position: usize, restaurant: &Restaurant) -> Self {
        Self {
            position,
            name: restaurant.name.clone().unwrap_or_else(|| UNKNOWN_NAME.to_owned()),
            address: restaurant.address.clone().unwrap_or_else(|| UNKNOWN_ADDRESS.to_owned()),
            rating: restaurant
                .rating
                .map(|rating| format!("{}/5", rating.normalize()))
                .unwrap_or_else(|| UNRATED.to_owned()),
            review_count: restaurant
                .review_count
                .map(|count| count.to_string())
                .unwrap_or_else(|| NO_REVIEWS.to_owned()),
        }
    }
}

/// Formats recommendation emails and hands them to the email sender.
#[derive(Clone)]
pub struct Notifier {
    sender: Arc<dyn EmailSender>,
    source: String,
    templates: Arc<Tera>,
    retry: RetryPolicy,
}

impl Notifier {
    pub fn new(
        sender: Arc<dyn EmailSender>,
        source: impl Into<String>,
    ) -> Result<Self, NotificationError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (
                RECOMMENDATIONS_TEXT,
                include_str!("../../../templates/email/recommendations.txt.tera"),
            ),
            (
                RECOMMENDATIONS_HTML,
                include_str!("../../../templates/email/recommendations.html.tera"),
            ),
            (NO_RESULTS_TEXT, include_str!("../../../templates/email/no_results.txt.tera")),
            (NO_RESULTS_HTML, include_str!("../../../templates/email/no_results.html.tera")),
        ])
        .map_err(|error| NotificationError::Template(error.to_string()))?;

        Ok(Self {
            sender,
            source: source.into(),
            templates: Arc::new(tera),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Renders the email for `request` without sending it.
    pub fn compose(
        &self,
        request: &QueuedRequest,
        restaurants: &[Restaurant],
    ) -> Result<(NotificationTemplate, OutgoingEmail), NotificationError> {
        let template = NotificationTemplate::select(restaurants);
        let entries: Vec<ListingEntry> = restaurants
            .iter()
            .enumerate()
            .map(|(index, restaurant)| ListingEntry::new(index + 1, restaurant))
            .collect();

        let mut context = Context::new();
        context.insert("cuisine", &request.cuisine);
        context.insert("dining_time", &request.dining_time);
        context.insert("party_size", &request.number_of_people);
        context.insert("entries", &entries);

        let (subject, text_name, html_name) = match template {
            NotificationTemplate::Recommendations => (
                format!("Your {} Restaurant Recommendations", request.cuisine),
                RECOMMENDATIONS_TEXT,
                RECOMMENDATIONS_HTML,
            ),
            NotificationTemplate::NoResults => (
                "Restaurant Recommendations - No Results".to_owned(),
                NO_RESULTS_TEXT,
                NO_RESULTS_HTML,
            ),
        };

        let render = |name: &str| {
            self.templates
                .render(name, &context)
                .map_err(|error| NotificationError::Template(error.to_string()))
        };

        let email = OutgoingEmail {
            source: self.source.clone(),
            destination: vec![request.email.clone()],
            subject,
            body_text: render(text_name)?,
            body_html: render(html_name)?,
        };
        Ok((template, email))
    }

    /// Sends the recommendation (or no-results) email. Transient transport
    /// failures are retried per the retry policy; a rejection is returned as is.
    pub async fn notify(
        &self,
        request: &QueuedRequest,
        restaurants: &[Restaurant],
    ) -> Result<NotificationReceipt, NotificationError> {
        let (template, email) = self.compose(request, restaurants)?;

        match self.retry.run("email_send", || self.sender.send(&email)).await {
            Ok(message_id) => {
                info!(
                    event_name = "notifier.email_sent",
                    template = template.as_str(),
                    message_id = %message_id,
                    restaurants = restaurants.len(),
                    "notification email sent"
                );
                Ok(NotificationReceipt { message_id, template })
            }
            Err(error) => {
                warn!(
                    event_name = "notifier.email_failed",
                    template = template.as_str(),
                    error = %error,
                    "notification email was not delivered"
                );
                Err(NotificationError::Delivery(error))
            }
        }
    }
}

use concierge_core::collaborators::CollaboratorError;
use reqwest::StatusCode;

const MAX_BODY_EXCERPT: usize = 200;

pub fn transport_error(service: &str, error: &reqwest::Error) -> CollaboratorError {
    CollaboratorError::Unavailable(format!("{service} request failed: {error}"))
}

/// Maps a non-success HTTP status onto the collaborator taxonomy.
///
/// Client errors are permanent except throttling and request timeouts, which
/// are treated like server errors and left to the retry policy.
pub fn status_error(service: &str, status: StatusCode, body: &str) -> CollaboratorError {
    let excerpt: String = body.chars().take(MAX_BODY_EXCERPT).collect();
    let detail = format!("{service} returned {status}: {}", excerpt.trim());

    let transient = status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::REQUEST_TIMEOUT;
    if status.is_client_error() && !transient {
        CollaboratorError::Rejected(detail)
    } else {
        CollaboratorError::Unavailable(detail)
    }
}

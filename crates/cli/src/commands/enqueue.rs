use std::fs;
use std::path::Path;
use std::sync::Arc;

use concierge_core::{QueuedRequest, RequestSubmitter};
use concierge_db::SqlMessageQueue;

use crate::commands::{
    load_sqlite_config, open_database, runtime, CommandResult, Failure, EXIT_DATABASE, EXIT_INPUT,
};

pub fn run(path: &Path) -> CommandResult {
    let config = match load_sqlite_config("enqueue") {
        Ok(config) => config,
        Err(result) => return result,
    };

    let request = match read_request(path) {
        Ok(request) => request,
        Err(failure) => return CommandResult::from_failure("enqueue", failure),
    };

    let runtime = match runtime("enqueue") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = open_database(&config).await?;
        let queue = SqlMessageQueue::new(pool.clone(), config.queue.visibility_timeout());
        let submitted = RequestSubmitter::new(Arc::new(queue))
            .submit(&request)
            .await
            .map_err(|error| ("enqueue", error.to_string(), EXIT_DATABASE));
        pool.close().await;
        submitted
    });

    match result {
        Ok(ticket) => CommandResult::success(
            "enqueue",
            format!(
                "queued {} request as message {} (fingerprint {})",
                request.cuisine, ticket.message_id, ticket.fingerprint
            ),
        ),
        Err(failure) => CommandResult::from_failure("enqueue", failure),
    }
}

/// Accepts the same object shape the consumer reads off the queue.
fn read_request(path: &Path) -> Result<QueuedRequest, Failure> {
    let raw = fs::read_to_string(path).map_err(|error| {
        ("invalid_input", format!("could not read `{}`: {error}", path.display()), EXIT_INPUT)
    })?;
    QueuedRequest::from_message_body(&raw)
        .map_err(|error| ("invalid_input", error.to_string(), EXIT_INPUT))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::read_request;

    #[test]
    fn incomplete_request_file_is_invalid_input() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("request.json");
        fs::write(&path, r#"{"Location": "Queens", "Cuisine": "Thai"}"#).expect("write");

        let (class, message, code) = read_request(&path).expect_err("incomplete");

        assert_eq!(class, "invalid_input");
        assert!(message.contains("DiningTime"));
        assert_eq!(code, 6);
    }

    #[test]
    fn missing_file_names_the_path() {
        let (_, message, _) =
            read_request(std::path::Path::new("/nonexistent/request.json")).expect_err("missing");
        assert!(message.contains("/nonexistent/request.json"));
    }
}

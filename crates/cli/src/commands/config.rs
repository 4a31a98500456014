use std::env;
use std::fs;
use std::path::Path;

use concierge_core::config::{resolve_config_path, AppConfig, LoadOptions};
use secrecy::{ExposeSecret, SecretString};
use toml::Value;

struct Field {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

impl Field {
    fn new(key: &'static str, value: impl ToString, env_keys: &'static [&'static str]) -> Self {
        Self { key, value: value.to_string(), env_keys }
    }
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    render(&config, config_file_doc.as_ref(), config_file_path.as_deref())
}

fn render(config: &AppConfig, doc: Option<&Value>, path: Option<&Path>) -> String {
    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    for field in fields(config) {
        let source = field_source(field.key, field.env_keys, doc, path);
        lines.push(render_line(field.key, &field.value, source));
    }

    lines.join("\n")
}

fn fields(config: &AppConfig) -> Vec<Field> {
    vec![
        Field::new("database.url", &config.database.url, &["CONCIERGE_DATABASE_URL"]),
        Field::new(
            "database.max_connections",
            config.database.max_connections,
            &["CONCIERGE_DATABASE_MAX_CONNECTIONS"],
        ),
        Field::new(
            "database.timeout_secs",
            config.database.timeout_secs,
            &["CONCIERGE_DATABASE_TIMEOUT_SECS"],
        ),
        Field::new("backend.kind", format!("{:?}", config.backend.kind), &["CONCIERGE_BACKEND"]),
        Field::new(
            "queue.wait_time_secs",
            config.queue.wait_time_secs,
            &["CONCIERGE_QUEUE_WAIT_TIME_SECS"],
        ),
        Field::new(
            "queue.visibility_timeout_secs",
            config.queue.visibility_timeout_secs,
            &["CONCIERGE_QUEUE_VISIBILITY_TIMEOUT_SECS"],
        ),
        Field::new(
            "queue.poll_interval_secs",
            config.queue.poll_interval_secs,
            &["CONCIERGE_QUEUE_POLL_INTERVAL_SECS"],
        ),
        Field::new(
            "search.provider",
            config.search.provider.as_str(),
            &["CONCIERGE_SEARCH_PROVIDER"],
        ),
        Field::new("search.base_url", &config.search.base_url, &["CONCIERGE_SEARCH_BASE_URL"]),
        Field::new("search.index", &config.search.index, &["CONCIERGE_SEARCH_INDEX"]),
        Field::new(
            "search.username",
            config.search.username.as_deref().unwrap_or("<unset>"),
            &["CONCIERGE_SEARCH_USERNAME"],
        ),
        Field::new(
            "search.password",
            redact(config.search.password.as_ref()),
            &["CONCIERGE_SEARCH_PASSWORD"],
        ),
        Field::new("search.result_size", config.search.result_size, &[]),
        Field::new("email.api_url", &config.email.api_url, &["CONCIERGE_EMAIL_API_URL"]),
        Field::new(
            "email.api_key",
            redact(config.email.api_key.as_ref()),
            &["CONCIERGE_EMAIL_API_KEY"],
        ),
        Field::new("email.sender", &config.email.sender, &["CONCIERGE_EMAIL_SENDER"]),
        Field::new(
            "retry.max_retries",
            config.retry.max_retries,
            &["CONCIERGE_RETRY_MAX_RETRIES"],
        ),
        Field::new("worker.enabled", config.worker.enabled, &["CONCIERGE_WORKER_ENABLED"]),
        Field::new(
            "worker.on_notification_failure",
            config.worker.on_notification_failure.as_str(),
            &["CONCIERGE_WORKER_ON_NOTIFICATION_FAILURE"],
        ),
        Field::new(
            "server.bind_address",
            &config.server.bind_address,
            &["CONCIERGE_SERVER_BIND_ADDRESS"],
        ),
        Field::new("server.port", config.server.port, &["CONCIERGE_SERVER_PORT"]),
        Field::new(
            "logging.level",
            &config.logging.level,
            &["CONCIERGE_LOGGING_LEVEL", "CONCIERGE_LOG_LEVEL"],
        ),
        Field::new(
            "logging.format",
            format!("{:?}", config.logging.format),
            &["CONCIERGE_LOGGING_FORMAT", "CONCIERGE_LOG_FORMAT"],
        ),
    ]
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact(secret: Option<&SecretString>) -> &'static str {
    match secret {
        Some(secret) if secret.expose_secret().trim().is_empty() => "<empty>",
        Some(_) => "<redacted>",
        None => "<unset>",
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use concierge_core::config::AppConfig;
    use toml::Value;

    use super::render;

    #[test]
    fn secrets_are_redacted_and_file_keys_are_attributed() {
        let mut config = AppConfig::default();
        config.email.api_key = Some("live-key-value".to_string().into());
        config.email.sender = "dining@example.com".to_string();
        let doc: Value = "[email]\nsender = \"dining@example.com\"\n".parse().expect("toml");
        let path = PathBuf::from("concierge.toml");

        let output = render(&config, Some(&doc), Some(&path));

        assert!(!output.contains("live-key-value"));
        assert!(output.contains("- email.api_key = <redacted> (source: default)"));
        assert!(output
            .contains("- email.sender = dining@example.com (source: file (concierge.toml))"));
        assert!(output.contains("- search.password = <unset> (source: default)"));
    }

    #[test]
    fn every_line_after_the_header_names_a_source() {
        let output = render(&AppConfig::default(), None, None);

        assert!(output.lines().skip(1).all(|line| line.ends_with("(source: default)")));
    }
}

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::retry::RetryPolicy;

pub const DEFAULT_CONFIG_FILE: &str = "concierge.toml";
pub const NESTED_CONFIG_FILE: &str = "config/concierge.toml";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub backend: BackendConfig,
    pub queue: QueueConfig,
    pub search: SearchConfig,
    pub email: EmailConfig,
    pub retry: RetryConfig,
    pub worker: WorkerConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct BackendConfig {
    pub kind: BackendKind,
}

#[derive(Clone, Debug)]
pub struct QueueConfig {
    pub wait_time_secs: u64,
    pub visibility_timeout_secs: u64,
    pub poll_interval_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SearchConfig {
    pub provider: SearchProvider,
    pub base_url: String,
    pub index: String,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub timeout_secs: u64,
    pub result_size: usize,
}

#[derive(Clone, Debug)]
pub struct EmailConfig {
    pub api_url: String,
    pub api_key: Option<SecretString>,
    pub sender: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

#[derive(Clone, Debug)]
pub struct WorkerConfig {
    pub enabled: bool,
    pub on_notification_failure: NotificationFailurePolicy,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Sqlite,
    Memory,
}

/// Where cuisine lookups are answered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchProvider {
    /// Elasticsearch-compatible HTTP endpoint at `search.base_url`.
    Http,
    /// The local `restaurant` table; requires the sqlite backend.
    Sqlite,
}

impl SearchProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Sqlite => "sqlite",
        }
    }
}

/// What the consumer does with a message whose notification could not be sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationFailurePolicy {
    /// Leave the message for redelivery after its visibility timeout.
    Retain,
    /// Acknowledge the message anyway.
    Delete,
}

impl NotificationFailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Retain => "retain",
            Self::Delete => "delete",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub backend: Option<BackendKind>,
    pub log_level: Option<String>,
    pub search_base_url: Option<String>,
    pub email_api_url: Option<String>,
    pub email_sender: Option<String>,
    pub worker_enabled: Option<bool>,
    pub server_port: Option<u16>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://concierge.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            backend: BackendConfig { kind: BackendKind::Sqlite },
            queue: QueueConfig {
                wait_time_secs: 5,
                visibility_timeout_secs: 30,
                poll_interval_secs: 10,
            },
            search: SearchConfig {
                provider: SearchProvider::Http,
                base_url: "http://localhost:9200".to_string(),
                index: "restaurants".to_string(),
                username: None,
                password: None,
                timeout_secs: 10,
                result_size: 5,
            },
            email: EmailConfig {
                api_url: "http://localhost:8025/api/v1/send".to_string(),
                api_key: None,
                sender: "concierge@localhost".to_string(),
                timeout_secs: 10,
            },
            retry: RetryConfig { max_retries: 2, base_delay_ms: 200, max_delay_ms: 2_000 },
            worker: WorkerConfig {
                enabled: false,
                on_notification_failure: NotificationFailurePolicy::Retain,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::Validation(format!(
                "unsupported backend `{other}` (expected sqlite|memory)"
            ))),
        }
    }
}

impl std::str::FromStr for SearchProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(ConfigError::Validation(format!(
                "unsupported search provider `{other}` (expected http|sqlite)"
            ))),
        }
    }
}

impl std::str::FromStr for NotificationFailurePolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "retain" => Ok(Self::Retain),
            "delete" => Ok(Self::Delete),
            other => Err(ConfigError::Validation(format!(
                "unsupported notification failure policy `{other}` (expected retain|delete)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl QueueConfig {
    pub fn wait_time(&self) -> Duration {
        Duration::from_secs(self.wait_time_secs)
    }

    pub fn visibility_timeout(&self) -> Duration {
        Duration::from_secs(self.visibility_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay_ms: self.base_delay_ms,
            max_delay_ms: self.max_delay_ms,
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(backend) = patch.backend {
            if let Some(kind) = backend.kind {
                self.backend.kind = kind;
            }
        }

        if let Some(queue) = patch.queue {
            if let Some(wait_time_secs) = queue.wait_time_secs {
                self.queue.wait_time_secs = wait_time_secs;
            }
            if let Some(visibility_timeout_secs) = queue.visibility_timeout_secs {
                self.queue.visibility_timeout_secs = visibility_timeout_secs;
            }
            if let Some(poll_interval_secs) = queue.poll_interval_secs {
                self.queue.poll_interval_secs = poll_interval_secs;
            }
        }

        if let Some(search) = patch.search {
            if let Some(provider) = search.provider {
                self.search.provider = provider;
            }
            if let Some(base_url) = search.base_url {
                self.search.base_url = base_url;
            }
            if let Some(index) = search.index {
                self.search.index = index;
            }
            if let Some(username) = search.username {
                self.search.username = Some(username);
            }
            if let Some(password) = search.password {
                self.search.password = Some(secret_value(password));
            }
            if let Some(timeout_secs) = search.timeout_secs {
                self.search.timeout_secs = timeout_secs;
            }
            if let Some(result_size) = search.result_size {
                self.search.result_size = result_size;
            }
        }

        if let Some(email) = patch.email {
            if let Some(api_url) = email.api_url {
                self.email.api_url = api_url;
            }
            if let Some(api_key) = email.api_key {
                self.email.api_key = Some(secret_value(api_key));
            }
            if let Some(sender) = email.sender {
                self.email.sender = sender;
            }
            if let Some(timeout_secs) = email.timeout_secs {
                self.email.timeout_secs = timeout_secs;
            }
        }

        if let Some(retry) = patch.retry {
            if let Some(max_retries) = retry.max_retries {
                self.retry.max_retries = max_retries;
            }
            if let Some(base_delay_ms) = retry.base_delay_ms {
                self.retry.base_delay_ms = base_delay_ms;
            }
            if let Some(max_delay_ms) = retry.max_delay_ms {
                self.retry.max_delay_ms = max_delay_ms;
            }
        }

        if let Some(worker) = patch.worker {
            if let Some(enabled) = worker.enabled {
                self.worker.enabled = enabled;
            }
            if let Some(policy) = worker.on_notification_failure {
                self.worker.on_notification_failure = policy;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("CONCIERGE_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("CONCIERGE_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_env("CONCIERGE_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("CONCIERGE_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_env("CONCIERGE_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("CONCIERGE_BACKEND") {
            self.backend.kind = value.parse()?;
        }

        if let Some(value) = read_env("CONCIERGE_QUEUE_WAIT_TIME_SECS") {
            self.queue.wait_time_secs = parse_env("CONCIERGE_QUEUE_WAIT_TIME_SECS", &value)?;
        }
        if let Some(value) = read_env("CONCIERGE_QUEUE_VISIBILITY_TIMEOUT_SECS") {
            self.queue.visibility_timeout_secs =
                parse_env("CONCIERGE_QUEUE_VISIBILITY_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("CONCIERGE_QUEUE_POLL_INTERVAL_SECS") {
            self.queue.poll_interval_secs =
                parse_env("CONCIERGE_QUEUE_POLL_INTERVAL_SECS", &value)?;
        }

        if let Some(value) = read_env("CONCIERGE_SEARCH_PROVIDER") {
            self.search.provider = value.parse()?;
        }
        if let Some(value) = read_env("CONCIERGE_SEARCH_BASE_URL") {
            self.search.base_url = value;
        }
        if let Some(value) = read_env("CONCIERGE_SEARCH_INDEX") {
            self.search.index = value;
        }
        if let Some(value) = read_env("CONCIERGE_SEARCH_USERNAME") {
            self.search.username = Some(value);
        }
        if let Some(value) = read_env("CONCIERGE_SEARCH_PASSWORD") {
            self.search.password = Some(secret_value(value));
        }
        if let Some(value) = read_env("CONCIERGE_SEARCH_TIMEOUT_SECS") {
            self.search.timeout_secs = parse_env("CONCIERGE_SEARCH_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("CONCIERGE_EMAIL_API_URL") {
            self.email.api_url = value;
        }
        if let Some(value) = read_env("CONCIERGE_EMAIL_API_KEY") {
            self.email.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("CONCIERGE_EMAIL_SENDER") {
            self.email.sender = value;
        }

        if let Some(value) = read_env("CONCIERGE_RETRY_MAX_RETRIES") {
            self.retry.max_retries = parse_env("CONCIERGE_RETRY_MAX_RETRIES", &value)?;
        }

        if let Some(value) = read_env("CONCIERGE_WORKER_ENABLED") {
            self.worker.enabled = parse_env("CONCIERGE_WORKER_ENABLED", &value)?;
        }
        if let Some(value) = read_env("CONCIERGE_WORKER_ON_NOTIFICATION_FAILURE") {
            self.worker.on_notification_failure = value.parse()?;
        }

        if let Some(value) = read_env("CONCIERGE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("CONCIERGE_SERVER_PORT") {
            self.server.port = parse_env("CONCIERGE_SERVER_PORT", &value)?;
        }

        let log_level =
            read_env("CONCIERGE_LOGGING_LEVEL").or_else(|| read_env("CONCIERGE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("CONCIERGE_LOGGING_FORMAT").or_else(|| read_env("CONCIERGE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(backend) = overrides.backend {
            self.backend.kind = backend;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(base_url) = overrides.search_base_url {
            self.search.base_url = base_url;
        }
        if let Some(api_url) = overrides.email_api_url {
            self.email.api_url = api_url;
        }
        if let Some(sender) = overrides.email_sender {
            self.email.sender = sender;
        }
        if let Some(enabled) = overrides.worker_enabled {
            self.worker.enabled = enabled;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_queue(&self.queue)?;
        validate_search(&self.search)?;
        if self.search.provider == SearchProvider::Sqlite && self.backend.kind != BackendKind::Sqlite
        {
            return Err(ConfigError::Validation(
                "search.provider = sqlite requires backend.kind = sqlite".to_string(),
            ));
        }
        validate_email(&self.email)?;
        validate_retry(&self.retry)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from(NESTED_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_queue(queue: &QueueConfig) -> Result<(), ConfigError> {
    if !(1..=20).contains(&queue.wait_time_secs) {
        return Err(ConfigError::Validation(
            "queue.wait_time_secs must be in range 1..=20".to_string(),
        ));
    }

    if queue.visibility_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "queue.visibility_timeout_secs must be greater than zero".to_string(),
        ));
    }

    if queue.poll_interval_secs == 0 {
        return Err(ConfigError::Validation(
            "queue.poll_interval_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_search(search: &SearchConfig) -> Result<(), ConfigError> {
    validate_http_url("search.base_url", &search.base_url)?;

    if search.index.trim().is_empty() {
        return Err(ConfigError::Validation("search.index is required".to_string()));
    }

    if search.password.is_some() && search.username.is_none() {
        return Err(ConfigError::Validation(
            "search.password is set but search.username is missing".to_string(),
        ));
    }

    if search.timeout_secs == 0 || search.timeout_secs > 120 {
        return Err(ConfigError::Validation(
            "search.timeout_secs must be in range 1..=120".to_string(),
        ));
    }

    if !(1..=5).contains(&search.result_size) {
        return Err(ConfigError::Validation(
            "search.result_size must be in range 1..=5".to_string(),
        ));
    }

    Ok(())
}

fn validate_email(email: &EmailConfig) -> Result<(), ConfigError> {
    validate_http_url("email.api_url", &email.api_url)?;

    let sender = email.sender.trim();
    if sender.is_empty() || !sender.contains('@') {
        return Err(ConfigError::Validation(
            "email.sender must be an email address (e.g. `concierge@example.com`)".to_string(),
        ));
    }

    let blank_key =
        email.api_key.as_ref().map(|key| key.expose_secret().trim().is_empty()).unwrap_or(false);
    if blank_key {
        return Err(ConfigError::Validation(
            "email.api_key is set but empty; remove it or provide a key".to_string(),
        ));
    }

    if email.timeout_secs == 0 || email.timeout_secs > 120 {
        return Err(ConfigError::Validation(
            "email.timeout_secs must be in range 1..=120".to_string(),
        ));
    }

    Ok(())
}

fn validate_retry(retry: &RetryConfig) -> Result<(), ConfigError> {
    if retry.max_retries > 10 {
        return Err(ConfigError::Validation("retry.max_retries must be at most 10".to_string()));
    }

    if retry.max_delay_ms < retry.base_delay_ms {
        return Err(ConfigError::Validation(
            "retry.max_delay_ms must be greater than or equal to retry.base_delay_ms".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn validate_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    if !value.starts_with("http://") && !value.starts_with("https://") {
        return Err(ConfigError::Validation(format!("{key} must start with http:// or https://")));
    }
    Ok(())
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    backend: Option<BackendPatch>,
    queue: Option<QueuePatch>,
    search: Option<SearchPatch>,
    email: Option<EmailPatch>,
    retry: Option<RetryPatch>,
    worker: Option<WorkerPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct BackendPatch {
    kind: Option<BackendKind>,
}

#[derive(Debug, Default, Deserialize)]
struct QueuePatch {
    wait_time_secs: Option<u64>,
    visibility_timeout_secs: Option<u64>,
    poll_interval_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchPatch {
    provider: Option<SearchProvider>,
    base_url: Option<String>,
    index: Option<String>,
    username: Option<String>,
    password: Option<String>,
    timeout_secs: Option<u64>,
    result_size: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct EmailPatch {
    api_url: Option<String>,
    api_key: Option<String>,
    sender: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RetryPatch {
    max_retries: Option<u32>,
    base_delay_ms: Option<u64>,
    max_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct WorkerPatch {
    enabled: Option<bool>,
    on_notification_failure: Option<NotificationFailurePolicy>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

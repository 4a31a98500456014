use std::sync::Arc;

use concierge_core::collaborators::{
    DetailStore, EmailSender, InMemoryDetailStore, InMemoryMessageQueue, InMemorySearchIndex,
    MessageQueue, RecordingEmailSender, SearchIndex,
};
use concierge_core::config::{AppConfig, BackendKind, ConfigError, LoadOptions, SearchProvider};
use concierge_core::{
    ConsumerConfig, DialogEngine, NotificationError, Notifier, QueueConsumer,
    RecommendationResolver, RequestSubmitter,
};
use concierge_db::{
    connect_with_config, migrations, DbPool, SqlCuisineIndex, SqlDetailStore, SqlMessageQueue,
};
use thiserror::Error;
use tracing::info;

use crate::mailer::HttpEmailSender;
use crate::search::HttpSearchIndex;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: Option<DbPool>,
    pub queue_probe: Option<SqlMessageQueue>,
    pub dialog: DialogEngine,
    pub consumer: QueueConsumer,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("http client could not be built: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error("notification templates failed to load: {0}")]
    Templates(#[source] NotificationError),
}

struct Collaborators {
    queue: Arc<dyn MessageQueue>,
    search: Arc<dyn SearchIndex>,
    store: Arc<dyn DetailStore>,
    email: Arc<dyn EmailSender>,
    db_pool: Option<DbPool>,
    queue_probe: Option<SqlMessageQueue>,
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        backend = ?config.backend.kind,
        search_provider = config.search.provider.as_str(),
        "starting application bootstrap"
    );

    let collaborators = match config.backend.kind {
        BackendKind::Sqlite => sqlite_collaborators(&config).await?,
        BackendKind::Memory => memory_collaborators(&config),
    };

    let retry = config.retry.policy();
    let resolver = RecommendationResolver::new(collaborators.search, collaborators.store)
        .with_retry(retry.clone())
        .with_limit(config.search.result_size);
    let notifier = Notifier::new(collaborators.email, config.email.sender.clone())
        .map_err(BootstrapError::Templates)?
        .with_retry(retry);
    let consumer = QueueConsumer::new(
        collaborators.queue.clone(),
        resolver,
        notifier,
        ConsumerConfig {
            wait: config.queue.wait_time(),
            on_notification_failure: config.worker.on_notification_failure,
        },
    );
    let dialog = DialogEngine::new(RequestSubmitter::new(collaborators.queue));

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        on_notification_failure = config.worker.on_notification_failure.as_str(),
        "application components wired"
    );

    Ok(Application {
        config,
        db_pool: collaborators.db_pool,
        queue_probe: collaborators.queue_probe,
        dialog,
        consumer,
    })
}

async fn sqlite_collaborators(config: &AppConfig) -> Result<Collaborators, BootstrapError> {
    let db_pool =
        connect_with_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let queue = SqlMessageQueue::new(db_pool.clone(), config.queue.visibility_timeout());
    let search: Arc<dyn SearchIndex> = match config.search.provider {
        SearchProvider::Http => Arc::new(
            HttpSearchIndex::new(&config.search).map_err(BootstrapError::HttpClient)?,
        ),
        SearchProvider::Sqlite => Arc::new(SqlCuisineIndex::new(db_pool.clone())),
    };

    Ok(Collaborators {
        queue: Arc::new(queue.clone()),
        search,
        store: Arc::new(SqlDetailStore::new(db_pool.clone())),
        email: Arc::new(HttpEmailSender::new(&config.email).map_err(BootstrapError::HttpClient)?),
        db_pool: Some(db_pool),
        queue_probe: Some(queue),
    })
}

/// Process-local doubles for every collaborator; nothing leaves the process.
fn memory_collaborators(config: &AppConfig) -> Collaborators {
    Collaborators {
        queue: Arc::new(InMemoryMessageQueue::with_visibility_timeout(
            config.queue.visibility_timeout(),
        )),
        search: Arc::new(InMemorySearchIndex::default()),
        store: Arc::new(InMemoryDetailStore::default()),
        email: Arc::new(RecordingEmailSender::default()),
        db_pool: None,
        queue_probe: None,
    }
}

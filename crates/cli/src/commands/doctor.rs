use concierge_core::config::{AppConfig, BackendKind, LoadOptions, SearchProvider};
use concierge_db::{connect_with_config, ping, SqlMessageQueue};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn pass(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Pass, details: details.into() }
    }

    fn fail(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Fail, details: details.into() }
    }

    fn skipped(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Skipped, details: details.into() }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck::pass(
                "config_validation",
                "configuration loaded and validated",
            ));
            checks.push(check_delivery_settings(&config));
            checks.extend(check_storage(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck::fail("config_validation", error.to_string()));
            for name in ["delivery_settings", "database_connectivity", "queue_schema"] {
                checks.push(DoctorCheck::skipped(name, "skipped because configuration did not load"));
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status != CheckStatus::Fail);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_delivery_settings(config: &AppConfig) -> DoctorCheck {
    let search = match config.search.provider {
        SearchProvider::Http => {
            format!("search via {}/{}", config.search.base_url, config.search.index)
        }
        SearchProvider::Sqlite => "search via local restaurant table".to_string(),
    };
    let credentials =
        if config.email.api_key.is_some() { "with api key" } else { "without api key" };

    DoctorCheck::pass(
        "delivery_settings",
        format!(
            "{search}; email via {} {credentials}; on notification failure: {}",
            config.email.api_url,
            config.worker.on_notification_failure.as_str()
        ),
    )
}

fn check_storage(config: &AppConfig) -> Vec<DoctorCheck> {
    if config.backend.kind == BackendKind::Memory {
        return vec![
            DoctorCheck::skipped("database_connectivity", "memory backend has no database"),
            DoctorCheck::skipped("queue_schema", "memory backend keeps the queue in process"),
        ];
    }

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return vec![
                DoctorCheck::fail(
                    "database_connectivity",
                    format!("failed to initialize async runtime: {error}"),
                ),
                DoctorCheck::skipped("queue_schema", "skipped because the runtime did not start"),
            ];
        }
    };

    runtime.block_on(async {
        let pool = match connect_with_config(&config.database).await {
            Ok(pool) => pool,
            Err(error) => {
                return vec![
                    DoctorCheck::fail(
                        "database_connectivity",
                        format!("failed to connect to database: {error}"),
                    ),
                    DoctorCheck::skipped(
                        "queue_schema",
                        "skipped because the database is unreachable",
                    ),
                ];
            }
        };

        let mut checks = Vec::new();
        match ping(&pool).await {
            Ok(()) => checks.push(DoctorCheck::pass(
                "database_connectivity",
                format!("connected using `{}`", config.database.url),
            )),
            Err(error) => checks.push(DoctorCheck::fail(
                "database_connectivity",
                format!("database query failed: {error}"),
            )),
        }

        let queue = SqlMessageQueue::new(pool.clone(), config.queue.visibility_timeout());
        match queue.depth().await {
            Ok(depth) => checks.push(DoctorCheck::pass(
                "queue_schema",
                format!("{} visible, {} in flight", depth.visible, depth.in_flight),
            )),
            Err(error) => checks.push(DoctorCheck::fail(
                "queue_schema",
                format!("request queue is not readable ({error}); run `concierge migrate`"),
            )),
        }

        pool.close().await;
        checks
    })
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

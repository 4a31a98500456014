use std::time::Duration;

use concierge_core::{ConsumerOutcome, QueueConsumer};
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

/// Calls `process_once` on every tick until `shutdown` flips to `true`.
///
/// Ticks that fall behind a slow invocation are delayed rather than bunched,
/// so at most one invocation runs at a time.
pub async fn run(consumer: QueueConsumer, every: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        event_name = "system.worker.started",
        correlation_id = "worker",
        poll_interval_ms = every.as_millis() as u64,
        "queue worker started"
    );

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                let outcome = consumer.process_once().await;
                if let ConsumerOutcome::Idle = outcome {
                    debug!(event_name = "system.worker.idle", correlation_id = "worker", "queue empty");
                }
            }
        }
    }

    info!(event_name = "system.worker.stopped", correlation_id = "worker", "queue worker stopped");
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use concierge_core::collaborators::{
        InMemoryDetailStore, InMemoryMessageQueue, InMemorySearchIndex, RecordingEmailSender,
    };
    use concierge_core::config::NotificationFailurePolicy;
    use concierge_core::{
        ConsumerConfig, Notifier, QueueConsumer, QueuedRequest, RecommendationResolver,
        RetryPolicy,
    };
    use tokio::sync::watch;

    use super::run;

    fn request(cuisine: &str) -> String {
        QueuedRequest {
            location: "Brooklyn".to_string(),
            cuisine: cuisine.to_string(),
            dining_time: "20:00".to_string(),
            number_of_people: "4".to_string(),
            email: "guest@example.com".to_string(),
        }
        .to_message_body()
        .expect("serialize request")
    }

    #[tokio::test]
    async fn worker_drains_queue_and_stops_on_shutdown() {
        let queue = InMemoryMessageQueue::default();
        queue.push_raw(request("Thai"));
        queue.push_raw(request("Mexican"));
        let sender = RecordingEmailSender::default();

        let consumer = QueueConsumer::new(
            Arc::new(queue.clone()),
            RecommendationResolver::new(
                Arc::new(InMemorySearchIndex::default()),
                Arc::new(InMemoryDetailStore::default()),
            )
            .with_retry(RetryPolicy::none()),
            Notifier::new(Arc::new(sender.clone()), "concierge@example.com")
                .expect("templates")
                .with_retry(RetryPolicy::none()),
            ConsumerConfig {
                wait: Duration::ZERO,
                on_notification_failure: NotificationFailurePolicy::Retain,
            },
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run(consumer, Duration::from_millis(5), shutdown_rx));

        for _ in 0..200 {
            if queue.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        shutdown_tx.send(true).expect("worker is listening");
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("worker should stop promptly")
            .expect("worker task should not panic");

        assert!(queue.is_empty());
        assert_eq!(sender.sent().len(), 2);
    }
}

/// VIP notification dispatcher
///
/// Periodically promotes long-standing accounts to VIP and tells them so.
///
/// # Architecture
///
/// ```text
/// tick()
///   ├─> UserStore::users_to_notify    (eligibility evaluated in SQL)
///   └─> for each user
///         ├─> UserStore::mark_notified (ledger row + vip_status, one transaction)
///         └─> NotificationPublisher::publish (key "notification")
/// ```
///
/// Per user the states are `Eligible -> Marked -> Published`. The mark is the
/// idempotency barrier: once it commits, no later tick selects the user
/// again, whether or not the publish that follows succeeds. A failed publish
/// is logged and counted, never retried, so a user receives the message at
/// most once.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskhub_shared::memory::{MemoryPublisher, MemoryStore};
/// use taskhub_worker::dispatcher::NotificationDispatcher;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() {
/// let dispatcher = NotificationDispatcher::new(
///     Arc::new(MemoryStore::new()),
///     Arc::new(MemoryPublisher::new()),
/// );
///
/// let shutdown = CancellationToken::new();
/// dispatcher.run(shutdown).await;
/// # }
/// ```

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use taskhub_shared::error::CoreResult;
use taskhub_shared::events::{
    vip_status_message, NotificationPublisher, STATUS_UPDATE_SUBJECT, VIP_MESSAGE_KEY,
};
use taskhub_shared::models::MarkOutcome;
use taskhub_shared::store::UserStore;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Default seconds between ticks
pub const DEFAULT_DISPATCH_INTERVAL_SECS: u64 = 60;

/// Default account age before a user becomes eligible
pub const DEFAULT_MIN_ACCOUNT_AGE_DAYS: i64 = 30;

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Time between the starts of two ticks
    pub interval: Duration,

    /// Accounts created more recently than this are not eligible
    pub min_account_age: chrono::Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_DISPATCH_INTERVAL_SECS),
            min_account_age: chrono::Duration::days(DEFAULT_MIN_ACCOUNT_AGE_DAYS),
        }
    }
}

/// Counters for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Users returned by the eligibility query
    pub eligible: usize,

    /// Users this tick marked
    pub marked: usize,

    /// Messages accepted by the queue
    pub published: usize,

    /// Marked users whose message could not be published
    pub publish_failures: usize,

    /// Users marked by someone else, or deleted, since the query ran
    pub skipped: usize,
}

pub struct NotificationDispatcher {
    users: Arc<dyn UserStore>,
    publisher: Arc<dyn NotificationPublisher>,
    config: DispatcherConfig,
}

impl NotificationDispatcher {
    pub fn new(users: Arc<dyn UserStore>, publisher: Arc<dyn NotificationPublisher>) -> Self {
        Self::with_config(users, publisher, DispatcherConfig::default())
    }

    pub fn with_config(
        users: Arc<dyn UserStore>,
        publisher: Arc<dyn NotificationPublisher>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            users,
            publisher,
            config,
        }
    }

    /// Runs one dispatch pass
    ///
    /// # Errors
    ///
    /// Durable store failures abort the pass. Users marked before the failure
    /// stay marked.
    pub async fn tick(&self) -> CoreResult<TickReport> {
        let created_before = Utc::now() - self.config.min_account_age;
        let eligible = self
            .users
            .users_to_notify(STATUS_UPDATE_SUBJECT, created_before)
            .await?;

        let mut report = TickReport {
            eligible: eligible.len(),
            ..TickReport::default()
        };

        for user in eligible {
            match self
                .users
                .mark_notified(&user.email, STATUS_UPDATE_SUBJECT)
                .await?
            {
                MarkOutcome::Marked => report.marked += 1,
                outcome => {
                    tracing::debug!(user_id = %user.id, ?outcome, "Skipping user");
                    report.skipped += 1;
                    continue;
                }
            }

            match self
                .publisher
                .publish(VIP_MESSAGE_KEY, &vip_status_message(&user.email))
                .await
            {
                Ok(entry_id) => {
                    tracing::info!(user_id = %user.id, entry_id = %entry_id, "VIP notification published");
                    report.published += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        user_id = %user.id,
                        error = %e,
                        "VIP notification not published; user stays marked"
                    );
                    report.publish_failures += 1;
                }
            }
        }

        Ok(report)
    }

    /// Ticks on the configured interval until `shutdown` is cancelled
    ///
    /// Ticks run one after another in this task, so they never overlap. A
    /// tick in progress completes before the loop observes cancellation.
    pub async fn run(&self, shutdown: CancellationToken) {
        tracing::info!(
            interval_secs = self.config.interval.as_secs(),
            min_account_age_days = self.config.min_account_age.num_days(),
            "Notification dispatcher starting"
        );

        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Notification dispatcher shut down");
                    break;
                }
                _ = ticker.tick() => {
                    match self.tick().await {
                        Ok(report) if report.eligible > 0 => {
                            tracing::info!(
                                eligible = report.eligible,
                                marked = report.marked,
                                published = report.published,
                                publish_failures = report.publish_failures,
                                skipped = report.skipped,
                                "Dispatch tick finished"
                            );
                        }
                        Ok(_) => tracing::debug!("Dispatch tick found no eligible users"),
                        Err(e) => tracing::error!(error = %e, "Dispatch tick failed"),
                    }
                }
            }
        }
    }
}

use crate::dispatch::{DispatchSummary, Dispatcher};
use crate::push::PushClients;
use crate::store::SubscriptionStore;
use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Timelike, Utc};

/// Dispatch-log entries older than this are dropped on every run.
const LOG_RETENTION_HOURS: i64 = 48;

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleOutcome {
    pub target_time: String,
    pub users_found: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<DispatchSummary>,
}

/// Wall clock in the fixed reference zone, regardless of where the server
/// happens to run.
pub fn reference_now(offset: FixedOffset) -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&offset)
}

/// One execution-log key per user per minute.
fn slot_id(now: &DateTime<FixedOffset>) -> String {
    now.format("%Y-%m-%dT%H:%M").to_string()
}

/// The cron entry point: find users whose notification time matches `now`
/// to the minute, claim their slot, and dispatch only for them.
///
/// Zero candidates is a normal outcome. A slow run overlapping the next
/// trigger cannot double-notify: the slot claim is first-writer-wins.
#[tracing::instrument(name = "Run scheduled dispatch", skip(store, clients), fields(now = %now))]
pub async fn run_due_dispatch(
    store: &dyn SubscriptionStore,
    clients: &PushClients,
    now: DateTime<FixedOffset>,
) -> anyhow::Result<ScheduleOutcome> {
    store
        .prune_log_before(Utc::now() - Duration::hours(LOG_RETENTION_HOURS))
        .await?;

    let minute = NaiveTime::from_hms(now.hour(), now.minute(), 0);
    let due = store.users_due_at(minute).await?;
    let target_time = minute.format("%H:%M").to_string();

    let slot = slot_id(&now);
    let mut claimed = Vec::with_capacity(due.len());
    for user in &due {
        if store.claim_slot(*user, &slot).await? {
            claimed.push(*user);
        } else {
            tracing::info!(user_id = %user, %slot, "Slot already claimed; skipping.");
        }
    }

    if claimed.is_empty() {
        tracing::info!(%target_time, "No users due; nothing to dispatch.");
        return Ok(ScheduleOutcome {
            target_time,
            users_found: due.len(),
            result: None,
        });
    }

    let targets = store.active_targets_for_users(&claimed).await?;
    let summary = Dispatcher::new(store, clients).run(targets).await;
    Ok(ScheduleOutcome {
        target_time,
        users_found: due.len(),
        result: Some(summary),
    })
}

mod diesel_store;

pub use diesel_store::DieselStore;

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use uuid::Uuid;

/// Which push channel a record belongs to. Each channel has its own table
/// and its own single-active-device policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    WebPush,
    Fcm,
}

/// Where a notification gets delivered.
#[derive(Debug, Clone)]
pub enum DeliveryTarget {
    WebPush {
        endpoint: String,
        p256dh_key: String,
        auth_key: String,
    },
    Fcm {
        token: String,
    },
}

impl DeliveryTarget {
    pub fn channel(&self) -> Channel {
        match self {
            DeliveryTarget::WebPush { .. } => Channel::WebPush,
            DeliveryTarget::Fcm { .. } => Channel::Fcm,
        }
    }
}

/// An `is_active = true` row, the only kind eligible for delivery.
#[derive(Debug, Clone)]
pub struct ActiveTarget {
    pub id: Uuid,
    pub user_id: Uuid,
    pub target: DeliveryTarget,
}

#[derive(Debug, Clone)]
pub struct WordEntry {
    pub word: String,
    pub meaning: String,
}

/// The dispatcher's and scheduler's view of persistence.
///
/// Backed by Postgres in production ([`DieselStore`]); the state machines on
/// top are exercised against an in-memory implementation in unit tests.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn active_targets(&self) -> anyhow::Result<Vec<ActiveTarget>>;

    async fn active_targets_for_users(&self, users: &[Uuid]) -> anyhow::Result<Vec<ActiveTarget>>;

    async fn words_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<WordEntry>>;

    /// The terminal-failure write: the push service told us the target is
    /// permanently dead, stop targeting it.
    async fn deactivate(&self, channel: Channel, id: Uuid) -> anyhow::Result<()>;

    /// Users with an enabled setting inside `minute`'s minute who own at
    /// least one active target.
    async fn users_due_at(&self, minute: NaiveTime) -> anyhow::Result<Vec<Uuid>>;

    /// Insert-or-ignore an execution-log row; true iff this call inserted
    /// it. Two overlapping scheduler runs cannot both claim a slot.
    async fn claim_slot(&self, user_id: Uuid, slot: &str) -> anyhow::Result<bool>;

    /// Expiry for the execution log; old slots are irrelevant.
    async fn prune_log_before(&self, cutoff: DateTime<Utc>) -> anyhow::Result<()>;
}

use crate::push::{DeliveryOutcome, PushClients, WordReminder};
use crate::store::{ActiveTarget, SubscriptionStore};
use rand::seq::SliceRandom;
use uuid::Uuid;

/// The response body caps per-target detail at this many entries.
const RESULT_DETAIL_LIMIT: usize = 10;

pub struct Dispatcher<'a> {
    store: &'a dyn SubscriptionStore,
    clients: &'a PushClients,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchSummary {
    pub total_targets: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub skipped_count: usize,
    pub results: Vec<TargetResult>,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetResult {
    pub target_id: Uuid,
    pub status: TargetStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetStatus {
    Sent,
    Skipped,
    Deactivated,
    Failed,
}

impl<'a> Dispatcher<'a> {
    pub fn new(store: &'a dyn SubscriptionStore, clients: &'a PushClients) -> Self {
        Self { store, clients }
    }

    /// One delivery attempt per target, no retry within a run, no
    /// short-circuit: a failing record never aborts the batch.
    #[tracing::instrument(name = "Dispatch notifications", skip(self, targets))]
    pub async fn run(&self, targets: Vec<ActiveTarget>) -> DispatchSummary {
        let mut summary = DispatchSummary {
            total_targets: targets.len(),
            success_count: 0,
            failure_count: 0,
            skipped_count: 0,
            results: Vec::new(),
        };
        for target in &targets {
            let (status, detail) = self.process(target).await;
            match status {
                TargetStatus::Sent => summary.success_count += 1,
                TargetStatus::Skipped => summary.skipped_count += 1,
                TargetStatus::Deactivated | TargetStatus::Failed => summary.failure_count += 1,
            }
            if summary.results.len() < RESULT_DETAIL_LIMIT {
                summary.results.push(TargetResult {
                    target_id: target.id,
                    status,
                    detail,
                });
            }
        }
        tracing::info!(
            success = summary.success_count,
            failure = summary.failure_count,
            skipped = summary.skipped_count,
            total = summary.total_targets,
            "Dispatch run completed.",
        );
        summary
    }

    async fn process(&self, target: &ActiveTarget) -> (TargetStatus, Option<String>) {
        let words = match self.store.words_for_user(target.user_id).await {
            Ok(words) => words,
            Err(error) => {
                tracing::warn!(error.cause_chain = ?error, target_id = %target.id,
                    "Failed to fetch vocabulary words; leaving the record for the next run.");
                return (TargetStatus::Failed, Some(format!("{:#}", error)));
            }
        };
        let word = match words.choose(&mut rand::thread_rng()) {
            Some(word) => word,
            None => return (TargetStatus::Skipped, Some("no vocabulary words".into())),
        };
        let reminder = WordReminder {
            word: word.word.clone(),
            meaning: word.meaning.clone(),
        };

        let client = self.clients.for_target(&target.target);
        match client.deliver(&target.target, &reminder).await {
            Ok(DeliveryOutcome::Delivered) => (TargetStatus::Sent, None),
            Ok(DeliveryOutcome::Gone) => {
                match self
                    .store
                    .deactivate(target.target.channel(), target.id)
                    .await
                {
                    Ok(()) => (
                        TargetStatus::Deactivated,
                        Some("push service reported the target gone".into()),
                    ),
                    Err(error) => {
                        tracing::error!(error.cause_chain = ?error, target_id = %target.id,
                            "Failed to deactivate a dead record.");
                        (TargetStatus::Failed, Some(format!("{:#}", error)))
                    }
                }
            }
            Ok(DeliveryOutcome::Rejected { status, detail }) => {
                tracing::warn!(status, %detail, target_id = %target.id,
                    "Push service rejected the delivery; keeping the record active.");
                (
                    TargetStatus::Failed,
                    Some(format!("push service answered {}: {}", status, detail)),
                )
            }
            Err(error) => {
                tracing::warn!(error.cause_chain = ?error, target_id = %target.id,
                    "Delivery attempt errored; keeping the record active.");
                (TargetStatus::Failed, Some(format!("{:#}", error)))
            }
        }
    }
}

use super::{ActiveTarget, Channel, DeliveryTarget, SubscriptionStore, WordEntry};
use crate::models::{FcmToken, NewDispatchLogEntry, PushSubscription, VocabularyWord};
use crate::startup::VocabDbConn;
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Timelike, Utc};
use diesel::{ExpressionMethods, PgConnection, QueryDsl, RunQueryDsl};
use std::collections::HashSet;
use uuid::Uuid;

pub struct DieselStore<'a> {
    conn: &'a VocabDbConn,
}

impl<'a> DieselStore<'a> {
    pub fn new(conn: &'a VocabDbConn) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl SubscriptionStore for DieselStore<'_> {
    async fn active_targets(&self) -> anyhow::Result<Vec<ActiveTarget>> {
        let subscriptions = self
            .conn
            .run(|c: &mut PgConnection| {
                use crate::schema::push_subscriptions::dsl::*;
                push_subscriptions
                    .filter(is_active.eq(true))
                    .load::<PushSubscription>(c)
            })
            .await
            .context("Failed to fetch active push subscriptions.")?;
        let tokens = self
            .conn
            .run(|c: &mut PgConnection| {
                use crate::schema::fcm_tokens::dsl::*;
                fcm_tokens.filter(is_active.eq(true)).load::<FcmToken>(c)
            })
            .await
            .context("Failed to fetch active FCM tokens.")?;
        Ok(collect_targets(subscriptions, tokens))
    }

    async fn active_targets_for_users(&self, users: &[Uuid]) -> anyhow::Result<Vec<ActiveTarget>> {
        let scope = users.to_vec();
        let subscriptions = {
            let scope = scope.clone();
            self.conn
                .run(move |c: &mut PgConnection| {
                    use crate::schema::push_subscriptions::dsl::*;
                    push_subscriptions
                        .filter(is_active.eq(true))
                        .filter(user_id.eq_any(scope))
                        .load::<PushSubscription>(c)
                })
                .await
                .context("Failed to fetch active push subscriptions.")?
        };
        let tokens = self
            .conn
            .run(move |c: &mut PgConnection| {
                use crate::schema::fcm_tokens::dsl::*;
                fcm_tokens
                    .filter(is_active.eq(true))
                    .filter(user_id.eq_any(scope))
                    .load::<FcmToken>(c)
            })
            .await
            .context("Failed to fetch active FCM tokens.")?;
        Ok(collect_targets(subscriptions, tokens))
    }

    async fn words_for_user(&self, user: Uuid) -> anyhow::Result<Vec<WordEntry>> {
        let words = self
            .conn
            .run(move |c: &mut PgConnection| {
                use crate::schema::vocabulary_words::dsl::*;
                vocabulary_words
                    .filter(user_id.eq(user))
                    .load::<VocabularyWord>(c)
            })
            .await
            .with_context(|| format!("Failed to fetch vocabulary words for user {}.", user))?;
        Ok(words
            .into_iter()
            .map(|w| WordEntry {
                word: w.word,
                meaning: w.meaning,
            })
            .collect())
    }

    async fn deactivate(&self, channel: Channel, target_id: Uuid) -> anyhow::Result<()> {
        self.conn
            .run(move |c: &mut PgConnection| match channel {
                Channel::WebPush => {
                    use crate::schema::push_subscriptions::dsl::*;
                    diesel::update(push_subscriptions.filter(id.eq(target_id)))
                        .set(is_active.eq(false))
                        .execute(c)
                }
                Channel::Fcm => {
                    use crate::schema::fcm_tokens::dsl::*;
                    diesel::update(fcm_tokens.filter(id.eq(target_id)))
                        .set(is_active.eq(false))
                        .execute(c)
                }
            })
            .await
            .with_context(|| format!("Failed to deactivate record {}.", target_id))?;
        Ok(())
    }

    async fn users_due_at(&self, minute: NaiveTime) -> anyhow::Result<Vec<Uuid>> {
        let lower = NaiveTime::from_hms(minute.hour(), minute.minute(), 0);
        let upper = NaiveTime::from_hms(minute.hour(), minute.minute(), 59);
        let due: Vec<Uuid> = self
            .conn
            .run(move |c: &mut PgConnection| {
                use crate::schema::notification_settings::dsl::*;
                notification_settings
                    .filter(is_enabled.eq(true))
                    .filter(notification_time.ge(lower))
                    .filter(notification_time.le(upper))
                    .select(user_id)
                    .load::<Uuid>(c)
            })
            .await
            .context("Failed to fetch notification settings.")?;
        if due.is_empty() {
            return Ok(Vec::new());
        }

        let with_subscription: Vec<Uuid> = {
            let due = due.clone();
            self.conn
                .run(move |c: &mut PgConnection| {
                    use crate::schema::push_subscriptions::dsl::*;
                    push_subscriptions
                        .filter(is_active.eq(true))
                        .filter(user_id.eq_any(due))
                        .select(user_id)
                        .distinct()
                        .load::<Uuid>(c)
                })
                .await
                .context("Failed to fetch active push subscriptions.")?
        };
        let with_token: Vec<Uuid> = {
            let due = due.clone();
            self.conn
                .run(move |c: &mut PgConnection| {
                    use crate::schema::fcm_tokens::dsl::*;
                    fcm_tokens
                        .filter(is_active.eq(true))
                        .filter(user_id.eq_any(due))
                        .select(user_id)
                        .distinct()
                        .load::<Uuid>(c)
                })
                .await
                .context("Failed to fetch active FCM tokens.")?
        };

        let reachable: HashSet<Uuid> = with_subscription
            .into_iter()
            .chain(with_token.into_iter())
            .collect();
        Ok(due.into_iter().filter(|u| reachable.contains(u)).collect())
    }

    async fn claim_slot(&self, user: Uuid, slot: &str) -> anyhow::Result<bool> {
        let slot = slot.to_string();
        let inserted = self
            .conn
            .run(move |c: &mut PgConnection| {
                use crate::schema::dispatch_log;
                diesel::insert_into(dispatch_log::table)
                    .values(NewDispatchLogEntry {
                        id: &Uuid::new_v4(),
                        user_id: &user,
                        slot: &slot,
                        created_at: &Utc::now(),
                    })
                    .on_conflict_do_nothing()
                    .execute(c)
            })
            .await
            .context("Failed to record a dispatch-log entry.")?;
        Ok(inserted == 1)
    }

    async fn prune_log_before(&self, cutoff: DateTime<Utc>) -> anyhow::Result<()> {
        self.conn
            .run(move |c: &mut PgConnection| {
                use crate::schema::dispatch_log::dsl::*;
                diesel::delete(dispatch_log.filter(created_at.lt(cutoff))).execute(c)
            })
            .await
            .context("Failed to prune the dispatch log.")?;
        Ok(())
    }
}

fn collect_targets(
    subscriptions: Vec<PushSubscription>,
    tokens: Vec<FcmToken>,
) -> Vec<ActiveTarget> {
    subscriptions
        .into_iter()
        .map(|s| ActiveTarget {
            id: s.id,
            user_id: s.user_id,
            target: DeliveryTarget::WebPush {
                endpoint: s.endpoint,
                p256dh_key: s.p256dh_key,
                auth_key: s.auth_key,
            },
        })
        .chain(tokens.into_iter().map(|t| ActiveTarget {
            id: t.id,
            user_id: t.user_id,
            target: DeliveryTarget::Fcm { token: t.token },
        }))
        .collect()
}

use crate::domain::{NotificationTime, PushEndpoint};
use crate::models::{NewFcmToken, NewNotificationSetting, NewPushSubscription};
use crate::routes::error_chain_fmt;
use crate::startup::VocabDbConn;
use anyhow::Context;
use chrono::Utc;
use diesel::{
    Connection, ExpressionMethods, OptionalExtension, PgConnection, QueryDsl, RunQueryDsl,
};
use rocket::http::Status;
use rocket::response::Responder;
use rocket::serde::json::Json;
use rocket::{Request, Response};
use uuid::Uuid;

#[derive(serde::Deserialize)]
pub struct WebPushRegistration {
    pub user_id: Uuid,
    pub endpoint: String,
    pub p256dh_key: String,
    pub auth_key: String,
    pub user_agent: Option<String>,
}

#[derive(serde::Deserialize)]
pub struct FcmRegistration {
    pub user_id: Uuid,
    pub token: String,
    pub device_info: Option<String>,
}

#[derive(serde::Deserialize)]
pub struct NotificationTimeUpdate {
    pub user_id: Uuid,
    pub notification_time: String,
    pub is_enabled: bool,
}

#[derive(serde::Serialize)]
pub struct RegistrationResponse {
    pub status: &'static str,
}

#[derive(Debug, PartialEq, Eq)]
enum PersistOutcome {
    Registered,
    Unchanged,
}

impl From<PersistOutcome> for RegistrationResponse {
    fn from(outcome: PersistOutcome) -> Self {
        RegistrationResponse {
            status: match outcome {
                PersistOutcome::Registered => "registered",
                PersistOutcome::Unchanged => "unchanged",
            },
        }
    }
}

#[derive(thiserror::Error)]
pub enum SubscribeError {
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for SubscribeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl<'r> Responder<'r, 'static> for SubscribeError {
    fn respond_to(self, _request: &'r Request<'_>) -> rocket::response::Result<'static> {
        tracing::warn!("SubscribeError: {:?}", self);
        Response::build()
            .status(match self {
                SubscribeError::Invalid(_) => Status::BadRequest,
                SubscribeError::UnexpectedError(_) => Status::InternalServerError,
            })
            .ok()
    }
}

/// Persist a browser push subscription. Registering a new device
/// deactivates the user's previous subscriptions: delivery targets at most
/// one device per channel.
#[tracing::instrument(
    name = "Register a Web Push subscription",
    skip(body, conn),
    fields(user_id = %body.user_id)
)]
#[post("/subscriptions/web-push", data = "<body>")]
pub async fn register_web_push(
    body: Json<WebPushRegistration>,
    conn: VocabDbConn,
) -> Result<Json<RegistrationResponse>, SubscribeError> {
    let body = body.into_inner();
    PushEndpoint::parse(&body.endpoint).map_err(SubscribeError::Invalid)?;
    let outcome = conn
        .run(move |c: &mut PgConnection| persist_web_push(c, &body))
        .await
        .context("Failed to persist the push subscription.")?;
    Ok(Json(outcome.into()))
}

#[tracing::instrument(
    name = "Register an FCM token",
    skip(body, conn),
    fields(user_id = %body.user_id)
)]
#[post("/subscriptions/fcm", data = "<body>")]
pub async fn register_fcm(
    body: Json<FcmRegistration>,
    conn: VocabDbConn,
) -> Result<Json<RegistrationResponse>, SubscribeError> {
    let body = body.into_inner();
    if body.token.trim().is_empty() {
        return Err(SubscribeError::Invalid(
            "An FCM registration token must not be empty.".into(),
        ));
    }
    let outcome = conn
        .run(move |c: &mut PgConnection| persist_fcm_token(c, &body))
        .await
        .context("Failed to persist the FCM token.")?;
    Ok(Json(outcome.into()))
}

/// Upsert the user's reminder time; at most one setting per user.
#[tracing::instrument(
    name = "Update a notification-time setting",
    skip(body, conn),
    fields(user_id = %body.user_id)
)]
#[put("/settings/notification-time", data = "<body>")]
pub async fn update_notification_time(
    body: Json<NotificationTimeUpdate>,
    conn: VocabDbConn,
) -> Result<Json<RegistrationResponse>, SubscribeError> {
    let body = body.into_inner();
    let time = NotificationTime::parse(&body.notification_time).map_err(SubscribeError::Invalid)?;
    conn.run(move |c: &mut PgConnection| {
        use crate::schema::notification_settings::dsl::*;
        diesel::insert_into(notification_settings)
            .values(NewNotificationSetting {
                user_id: &body.user_id,
                notification_time: &time.as_time(),
                is_enabled: body.is_enabled,
                updated_at: &Utc::now(),
            })
            .on_conflict(user_id)
            .do_update()
            .set((
                notification_time.eq(time.as_time()),
                is_enabled.eq(body.is_enabled),
                updated_at.eq(Utc::now()),
            ))
            .execute(c)
    })
    .await
    .context("Failed to upsert the notification setting.")?;
    Ok(Json(RegistrationResponse {
        status: "registered",
    }))
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    pub web_push_total: i64,
    pub web_push_active: i64,
    pub fcm_total: i64,
    pub fcm_active: i64,
    pub has_words: bool,
}

/// Operational snapshot of one user's registrations, mirroring what the
/// settings screen shows.
#[tracing::instrument(name = "Check subscription status", skip(conn))]
#[get("/subscriptions/status?<user_id>")]
pub async fn subscription_status(
    user_id: Uuid,
    conn: VocabDbConn,
) -> Result<Json<SubscriptionStatus>, SubscribeError> {
    let subscriber = user_id;
    let status = conn
        .run(move |c: &mut PgConnection| -> diesel::QueryResult<SubscriptionStatus> {
            let (web_push_total, web_push_active) = {
                use crate::schema::push_subscriptions::dsl::*;
                let total = push_subscriptions
                    .filter(user_id.eq(subscriber))
                    .count()
                    .get_result::<i64>(c)?;
                let active = push_subscriptions
                    .filter(user_id.eq(subscriber))
                    .filter(is_active.eq(true))
                    .count()
                    .get_result::<i64>(c)?;
                (total, active)
            };
            let (fcm_total, fcm_active) = {
                use crate::schema::fcm_tokens::dsl::*;
                let total = fcm_tokens
                    .filter(user_id.eq(subscriber))
                    .count()
                    .get_result::<i64>(c)?;
                let active = fcm_tokens
                    .filter(user_id.eq(subscriber))
                    .filter(is_active.eq(true))
                    .count()
                    .get_result::<i64>(c)?;
                (total, active)
            };
            let words = {
                use crate::schema::vocabulary_words::dsl::*;
                vocabulary_words
                    .filter(user_id.eq(subscriber))
                    .count()
                    .get_result::<i64>(c)?
            };
            Ok(SubscriptionStatus {
                web_push_total,
                web_push_active,
                fcm_total,
                fcm_active,
                has_words: words > 0,
            })
        })
        .await
        .context("Failed to query the subscription status.")?;
    Ok(Json(status))
}

fn persist_web_push(
    conn: &PgConnection,
    body: &WebPushRegistration,
) -> diesel::QueryResult<PersistOutcome> {
    use crate::schema::push_subscriptions::dsl::*;
    conn.transaction(|| {
        let already_active = push_subscriptions
            .select(id)
            .filter(user_id.eq(body.user_id))
            .filter(endpoint.eq(&body.endpoint))
            .filter(is_active.eq(true))
            .first::<Uuid>(conn)
            .optional()?;
        if already_active.is_some() {
            return Ok(PersistOutcome::Unchanged);
        }

        // Deactivate first: two concurrent registrations must never leave
        // two active rows.
        diesel::update(
            push_subscriptions
                .filter(user_id.eq(body.user_id))
                .filter(is_active.eq(true)),
        )
        .set(is_active.eq(false))
        .execute(conn)?;

        diesel::insert_into(push_subscriptions)
            .values(NewPushSubscription {
                id: &Uuid::new_v4(),
                user_id: &body.user_id,
                endpoint: &body.endpoint,
                p256dh_key: &body.p256dh_key,
                auth_key: &body.auth_key,
                user_agent: body.user_agent.as_deref(),
                is_active: true,
                created_at: &Utc::now(),
            })
            .execute(conn)?;
        Ok(PersistOutcome::Registered)
    })
}

fn persist_fcm_token(
    conn: &PgConnection,
    body: &FcmRegistration,
) -> diesel::QueryResult<PersistOutcome> {
    use crate::schema::fcm_tokens::dsl::*;
    conn.transaction(|| {
        let already_active = fcm_tokens
            .select(id)
            .filter(user_id.eq(body.user_id))
            .filter(token.eq(&body.token))
            .filter(is_active.eq(true))
            .first::<Uuid>(conn)
            .optional()?;
        if already_active.is_some() {
            return Ok(PersistOutcome::Unchanged);
        }

        diesel::update(
            fcm_tokens
                .filter(user_id.eq(body.user_id))
                .filter(is_active.eq(true)),
        )
        .set(is_active.eq(false))
        .execute(conn)?;

        diesel::insert_into(fcm_tokens)
            .values(NewFcmToken {
                id: &Uuid::new_v4(),
                user_id: &body.user_id,
                token: &body.token,
                device_info: body.device_info.as_deref(),
                is_active: true,
                created_at: &Utc::now(),
            })
            .execute(conn)?;
        Ok(PersistOutcome::Registered)
    })
}

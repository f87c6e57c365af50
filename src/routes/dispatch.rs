use crate::dispatch::{DispatchSummary, Dispatcher};
use crate::guards::OperatorAuth;
use crate::push::PushClients;
use crate::routes::error_chain_fmt;
use crate::startup::VocabDbConn;
use crate::store::{DieselStore, SubscriptionStore};
use chrono::Utc;
use rocket::http::Status;
use rocket::response::Responder;
use rocket::serde::json::Json;
use rocket::{Request, Response, State};

#[derive(serde::Serialize)]
pub struct DispatchReport {
    pub message: &'static str,
    pub timestamp: String,
    pub summary: DispatchSummary,
}

#[derive(thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl<'r> Responder<'r, 'static> for DispatchError {
    fn respond_to(self, _request: &'r Request<'_>) -> rocket::response::Result<'static> {
        tracing::error!("DispatchError: {:?}", self);
        Response::build().status(Status::InternalServerError).ok()
    }
}

/// Send one reminder to every active record, regardless of notification
/// times. Operator-only; used for smoke tests and manual nudges.
#[tracing::instrument(name = "Dispatch to all active records", skip(_auth, conn, clients))]
#[post("/notifications/dispatch")]
pub async fn dispatch_notifications(
    _auth: OperatorAuth,
    conn: VocabDbConn,
    clients: &State<PushClients>,
) -> Result<Json<DispatchReport>, DispatchError> {
    let store = DieselStore::new(&conn);
    let targets = store.active_targets().await?;
    let summary = Dispatcher::new(&store, clients.inner()).run(targets).await;
    Ok(Json(DispatchReport {
        message: "dispatch completed",
        timestamp: Utc::now().to_rfc3339(),
        summary,
    }))
}

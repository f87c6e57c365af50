use crate::configuration::ScheduleSettings;
use crate::guards::OperatorAuth;
use crate::push::PushClients;
use crate::routes::error_chain_fmt;
use crate::scheduler::{reference_now, run_due_dispatch, ScheduleOutcome};
use crate::startup::VocabDbConn;
use crate::store::DieselStore;
use rocket::http::Status;
use rocket::response::Responder;
use rocket::serde::json::Json;
use rocket::{Request, Response, State};

#[derive(serde::Serialize)]
pub struct ScheduleReport {
    pub message: &'static str,
    #[serde(flatten)]
    pub outcome: ScheduleOutcome,
}

#[derive(thiserror::Error)]
pub enum ScheduleError {
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for ScheduleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl<'r> Responder<'r, 'static> for ScheduleError {
    fn respond_to(self, _request: &'r Request<'_>) -> rocket::response::Result<'static> {
        tracing::error!("ScheduleError: {:?}", self);
        Response::build().status(Status::InternalServerError).ok()
    }
}

/// The minute-granular trigger. An external cron hits this every minute;
/// only users whose notification time matches the current minute in the
/// reference zone receive anything.
#[tracing::instrument(name = "Run the per-minute schedule", skip_all)]
#[post("/notifications/schedule")]
pub async fn run_schedule(
    _auth: OperatorAuth,
    conn: VocabDbConn,
    clients: &State<PushClients>,
    schedule: &State<ScheduleSettings>,
) -> Result<Json<ScheduleReport>, ScheduleError> {
    let offset = schedule
        .reference_offset()
        .map_err(|e| anyhow::anyhow!(e).context("Invalid schedule configuration."))?;
    let store = DieselStore::new(&conn);
    let outcome = run_due_dispatch(&store, clients.inner(), reference_now(offset)).await?;
    Ok(Json(ScheduleReport {
        message: "schedule run completed",
        outcome,
    }))
}

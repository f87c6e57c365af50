use crate::configuration::OperatorSettings;
use crate::guards::BasicAuth;
use anyhow::anyhow;
use rocket::http::Status;
use rocket::outcome::{try_outcome, Outcome};
use rocket::request::FromRequest;
use rocket::Request;
use secrecy::ExposeSecret;

/// Proof that the request carried the configured operator credentials.
/// The dispatch and scheduler endpoints are operator-facing, not end-user
/// facing, so credentials live in configuration rather than a users table.
pub struct OperatorAuth {
    // prevents construction outside of this module
    _private: (),
}

#[async_trait]
impl<'r> FromRequest<'r> for OperatorAuth {
    type Error = anyhow::Error;

    async fn from_request(request: &'r Request<'_>) -> rocket::request::Outcome<Self, Self::Error> {
        let basic_auth = try_outcome!(request.guard::<BasicAuth>().await);
        let expected = match request.rocket().state::<OperatorSettings>() {
            Some(settings) => settings,
            None => {
                return Outcome::Failure((
                    Status::InternalServerError,
                    anyhow!("Operator credentials are not configured."),
                ))
            }
        };

        if basic_auth.username == expected.username
            && basic_auth.password.expose_secret() == expected.password.expose_secret()
        {
            Outcome::Success(OperatorAuth { _private: () })
        } else {
            Outcome::Failure((
                Status::Unauthorized,
                anyhow!("Invalid operator credentials."),
            ))
        }
    }
}

use anyhow::{anyhow, Context};
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::Request;
use secrecy::Secret;

/// Raw credentials from an `Authorization: Basic` header. Validation happens
/// in [`super::OperatorAuth`].
pub struct BasicAuth {
    pub(crate) username: String,
    pub(crate) password: Secret<String>,
}

impl BasicAuth {
    fn parse(header_value: &str) -> Result<Self, anyhow::Error> {
        let encoded = header_value
            .strip_prefix("Basic ")
            .context("The authorization scheme was not 'Basic'.")?;
        let decoded = base64::decode_config(encoded, base64::STANDARD)
            .context("Failed to base64-decode 'Basic' credentials.")?;
        let decoded =
            String::from_utf8(decoded).context("The decoded credentials are not valid UTF8.")?;
        let (username, password) = decoded
            .split_once(':')
            .ok_or_else(|| anyhow!("'Basic' credentials must be 'username:password'."))?;
        Ok(Self {
            username: username.to_string(),
            password: Secret::new(password.to_string()),
        })
    }
}

#[async_trait]
impl<'r> FromRequest<'r> for BasicAuth {
    type Error = anyhow::Error;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let header = match request.headers().get_one("Authorization") {
            Some(header) => header,
            None => {
                return Outcome::Failure((
                    Status::Unauthorized,
                    anyhow!("The 'Authorization' header was missing."),
                ))
            }
        };
        match BasicAuth::parse(header) {
            Ok(auth) => Outcome::Success(auth),
            Err(e) => Outcome::Failure((Status::Unauthorized, e)),
        }
    }
}

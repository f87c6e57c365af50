use rocket::http::{Header, Status};
use rocket::response::{Responder, Response};
use rocket::Request;

/// 401 carrying the challenge header, so operator tooling knows to retry
/// with Basic credentials.
pub struct RequestBasicAuth;

impl<'r> Responder<'r, 'static> for RequestBasicAuth {
    fn respond_to(self, _request: &'r Request<'_>) -> rocket::response::Result<'static> {
        Response::build()
            .status(Status::Unauthorized)
            .header(Header::new(
                "WWW-Authenticate",
                r#"Basic realm="notifications""#,
            ))
            .ok()
    }
}

#[catch(401)]
pub fn unauthorized_request_credentials() -> RequestBasicAuth {
    RequestBasicAuth
}

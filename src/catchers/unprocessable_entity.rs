use rocket::http::Status;
use rocket::Request;

// Rocket answers 422 when a JSON body parses but fails to deserialize; the
// registration API promises a plain 400 for any malformed payload.
#[catch(422)]
pub fn unprocessable_entity_to_bad_request(_req: &Request) -> Status {
    Status::BadRequest
}

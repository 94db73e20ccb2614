// src/web/identity.rs
//! Caller identity taken from the `X-User-Id` header set by the upstream auth layer

use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::Request;
use tracing::warn;

pub const USER_ID_HEADER: &str = "X-User-Id";

pub struct CallerId(pub String);

impl CallerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug)]
pub enum IdentityError {
    Missing,
    Invalid,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for CallerId {
    type Error = IdentityError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match req.headers().get_one(USER_ID_HEADER).map(str::trim) {
            Some(id) if id.is_empty() || id.len() > 128 => {
                warn!("Rejected malformed {} header", USER_ID_HEADER);
                Outcome::Error((Status::Unauthorized, IdentityError::Invalid))
            }
            Some(id) => Outcome::Success(CallerId(id.to_string())),
            None => {
                warn!("Missing {} header", USER_ID_HEADER);
                Outcome::Error((Status::Unauthorized, IdentityError::Missing))
            }
        }
    }
}

use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::error::AppError;

/// The owner id resolved by `AuthMiddleware` for the current request.
///
/// Handlers on protected routes take this as an argument and hand the inner id to
/// the workflows as the owner. If the middleware did not run, extraction fails with
/// `AppError::Unauthorized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUserId(pub i32);

impl FromRequest for AuthenticatedUserId {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedUserId>().copied() {
            Some(user_id) => ready(Ok(user_id)),
            None => {
                log::error!(
                    "No authenticated user on {}. Is AuthMiddleware applied?",
                    req.path()
                );
                ready(Err(AppError::Unauthorized.into()))
            }
        }
    }
}

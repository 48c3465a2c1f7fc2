use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage, HttpRequest,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::extractors::AuthenticatedUserId;
use crate::auth::token::TokenService;
use crate::error::AppError;

/// Name of the cookie carrying the bearer credential.
pub const TOKEN_COOKIE: &str = "token";

/// Pulls the bearer credential out of the request.
///
/// The `token` cookie takes precedence over an `Authorization: Bearer <token>` header.
/// Empty values count as absent.
pub fn bearer_credential(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(TOKEN_COOKIE) {
        let value = cookie.value().trim();
        if !value.is_empty() {
            return Some(value.to_owned());
        }
    }

    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
}

/// Verifies the bearer credential on every request under the wrapped scope and
/// attaches the resolved [`AuthenticatedUserId`] to the request extensions.
///
/// Requires a `web::Data<TokenService>` in the application data.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S> AuthMiddlewareService<S> {
    // Answers with the error body rather than an `Err`
    fn reject<B>(
        req: ServiceRequest,
        err: AppError,
    ) -> LocalBoxFuture<'static, Result<ServiceResponse<EitherBody<B>>, Error>>
    where
        B: 'static,
    {
        let res = req.error_response(err).map_into_right_body();
        Box::pin(ready(Ok(res)))
    }
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // Registration, login and logout are reachable without a credential
        if req.path().starts_with("/api/auth/") {
            let fut = self.service.call(req);
            return Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) });
        }

        let tokens = match req.app_data::<web::Data<TokenService>>() {
            Some(tokens) => tokens.clone(),
            None => {
                let app_err = AppError::internal("TokenService is not registered as app data");
                return Self::reject(req, app_err);
            }
        };

        let credential = match bearer_credential(req.request()) {
            Some(credential) => credential,
            None => {
                log::warn!("Missing bearer credential for {}", req.path());
                return Self::reject(req, AppError::Unauthorized);
            }
        };

        match tokens.verify(&credential) {
            Ok(user_id) => {
                log::debug!("Authorized user ID: {}", user_id);
                req.extensions_mut().insert(AuthenticatedUserId(user_id));
                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            Err(cause) => {
                log::warn!("Rejected bearer credential: {}", cause);
                Self::reject(req, cause.into())
            }
        }
    }
}

use crate::{
    auth::{LoginRequest, RegisterRequest, TokenService, TOKEN_COOKIE},
    error::AppError,
    services::AuthService,
};
use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::{post, web, HttpResponse, Responder};
use serde_json::json;
use validator::Validate;

/// Register a new user
///
/// Creates a new user account. No token is issued; the client logs in afterwards.
#[post("/register")]
pub async fn register(
    auth: web::Data<AuthService>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    let profile = auth
        .register(
            &register_data.name,
            &register_data.email,
            &register_data.password,
        )
        .await?;

    Ok(HttpResponse::Created().json(profile))
}

/// Login user
///
/// Authenticates a user and returns a bearer token, also set as an HttpOnly cookie.
#[post("/login")]
pub async fn login(
    auth: web::Data<AuthService>,
    tokens: web::Data<TokenService>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let session = auth.login(&login_data.email, &login_data.password).await?;

    let cookie = Cookie::build(TOKEN_COOKIE, session.token.clone())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .max_age(CookieDuration::seconds(tokens.ttl().num_seconds()))
        .finish();

    Ok(HttpResponse::Ok().cookie(cookie).json(session))
}

/// Logout user
///
/// Tokens are not tracked server side, so logging out only expires the cookie.
#[post("/logout")]
pub async fn logout() -> impl Responder {
    let mut cookie = Cookie::build(TOKEN_COOKIE, "")
        .path("/")
        .http_only(true)
        .finish();
    cookie.make_removal();

    HttpResponse::Ok().cookie(cookie).json(json!({
        "message": "Logged out"
    }))
}

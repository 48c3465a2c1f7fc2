use crate::{
    auth::AuthenticatedUserId, error::AppError, models::UpdateUserRequest,
    services::AuthService,
};
use actix_web::{delete, get, put, web, HttpResponse, Responder};
use validator::Validate;

/// Returns the profile of the authenticated user.
#[get("/me")]
pub async fn get_profile(
    auth: web::Data<AuthService>,
    user_id: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let profile = auth.profile(user_id.0).await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// Changes the name and email of the authenticated user.
///
/// ## Responses:
/// - `200 OK`: the updated profile.
/// - `404 Not Found`: the account no longer exists.
/// - `409 Conflict`: another account already uses the email.
/// - `422 Unprocessable Entity`: validation failed.
#[put("/me")]
pub async fn update_profile(
    auth: web::Data<AuthService>,
    user_id: AuthenticatedUserId,
    user_data: web::Json<UpdateUserRequest>,
) -> Result<impl Responder, AppError> {
    user_data.validate()?;

    let profile = auth
        .update_user(user_id.0, &user_data.name, &user_data.email)
        .await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// Soft-deletes the authenticated user. Their tasks stay in storage.
#[delete("/me")]
pub async fn delete_account(
    auth: web::Data<AuthService>,
    user_id: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    auth.delete_user(user_id.0).await?;
    Ok(HttpResponse::NoContent().finish())
}

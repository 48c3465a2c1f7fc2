use crate::{
    auth::AuthenticatedUserId,
    error::AppError,
    models::{CreateTaskInput, UpdateTaskInput},
    services::TaskService,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

/// Retrieves every task of the authenticated user.
///
/// Tasks whose due date has passed are marked `overdue` before the list is read,
/// so the response never shows a stale `pending` or `in_progress` task.
/// Tasks are ordered by creation date in descending order.
///
/// ## Responses:
/// - `200 OK`: Returns a JSON array of `Task` objects.
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
/// - `500 Internal Server Error`: For storage errors.
#[get("")]
pub async fn get_tasks(
    tasks: web::Data<TaskService>,
    user_id: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let tasks = tasks.get_by_user(user_id.0).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a new task for the authenticated user.
///
/// ## Request Body:
/// - `title`: The title of the task (required).
/// - `description` (optional): A description of the task.
/// - `due_date` (optional): RFC 3339 timestamp.
/// - `status` (optional): `pending`, `in_progress` or `completed`. Defaults to `pending`.
///
/// A due date in the past either yields an `overdue` task or `422`, depending on
/// the configured past-due policy.
///
/// ## Responses:
/// - `201 Created`: Returns the newly created `Task` object as JSON.
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
/// - `422 Unprocessable Entity`: Validation failed or the due date was refused.
#[post("")]
pub async fn create_task(
    tasks: web::Data<TaskService>,
    user_id: AuthenticatedUserId,
    task_data: web::Json<CreateTaskInput>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task = tasks.create(task_data.into_inner(), user_id.0).await?;
    Ok(HttpResponse::Created().json(task))
}

/// Administrative lookup of any task regardless of owner. Not provided yet.
#[get("/admin/{id}")]
pub async fn get_task_admin(
    tasks: web::Data<TaskService>,
    _user_id: AuthenticatedUserId,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = tasks.get_by_id(task_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Retrieves a specific task by its ID.
///
/// ## Responses:
/// - `200 OK`: Returns the `Task` object as JSON if found and owned by the user.
/// - `404 Not Found`: The task does not exist or is not owned by the authenticated user.
#[get("/{id}")]
pub async fn get_task(
    tasks: web::Data<TaskService>,
    user_id: AuthenticatedUserId,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = tasks
        .get_by_id_and_user(task_id.into_inner(), user_id.0)
        .await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Partially updates a task. Only the fields present in the body change.
///
/// ## Request Body:
/// Any of `title`, `description`, `due_date` (`null` clears it) and `status`.
///
/// ## Responses:
/// - `200 OK`: Returns the updated `Task` object as JSON.
/// - `404 Not Found`: The task does not exist or is not owned by the authenticated user.
/// - `422 Unprocessable Entity`: Validation failed.
#[put("/{id}")]
pub async fn update_task(
    tasks: web::Data<TaskService>,
    user_id: AuthenticatedUserId,
    task_id: web::Path<Uuid>,
    task_data: web::Json<UpdateTaskInput>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task = tasks
        .update_task(task_data.into_inner(), task_id.into_inner(), user_id.0)
        .await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Deletes a task by its ID.
///
/// ## Responses:
/// - `204 No Content`: On successful deletion.
/// - `404 Not Found`: The task does not exist or is not owned by the authenticated user.
#[delete("/{id}")]
pub async fn delete_task(
    tasks: web::Data<TaskService>,
    user_id: AuthenticatedUserId,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    tasks.delete_task(task_id.into_inner(), user_id.0).await?;
    Ok(HttpResponse::NoContent().finish())
}

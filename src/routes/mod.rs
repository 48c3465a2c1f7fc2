pub mod auth;
pub mod health;
pub mod tasks;
pub mod users;

use actix_web::{error::PathError, web, HttpRequest};

use crate::error::AppError;

/// A task id that does not parse is reported like any other unknown task.
fn task_path_error(err: PathError, req: &HttpRequest) -> actix_web::Error {
    log::debug!("Unparseable task path {}: {}", req.path(), err);
    AppError::TaskNotFoundOrUnauthorized.into()
}

/// Registers the `/api` routes. Expects `AuthService`, `TaskService` and
/// `TokenService` as app data and `AuthMiddleware` around the enclosing scope.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::login)
            .service(auth::register)
            .service(auth::logout),
    )
    .service(
        web::scope("/users")
            .service(users::get_profile)
            .service(users::update_profile)
            .service(users::delete_account),
    )
    .service(
        web::scope("/tasks")
            .app_data(web::PathConfig::default().error_handler(task_path_error))
            .service(tasks::get_tasks)
            .service(tasks::create_task)
            .service(tasks::get_task_admin)
            .service(tasks::get_task)
            .service(tasks::update_task)
            .service(tasks::delete_task),
    );
}

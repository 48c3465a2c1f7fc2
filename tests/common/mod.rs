#![allow(dead_code)]

use actix_cors::Cors;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::middleware::Logger;
use actix_web::{http::header, test, web, App};
use chrono::Duration;
use serde_json::json;
use std::sync::Arc;

use taskkeeper::auth::{AuthMiddleware, AuthResponse, CredentialService, TokenService};
use taskkeeper::routes::{self, health};
use taskkeeper::services::{AuthService, PastDuePolicy, TaskService};
use taskkeeper::store::{MemoryTaskRepository, MemoryUserRepository};

pub const TEST_SECRET: &str = "integration-test-secret";

/// Services wired to fresh in-memory stores.
pub struct TestState {
    pub users: Arc<MemoryUserRepository>,
    pub tasks: Arc<MemoryTaskRepository>,
    pub tokens: Arc<TokenService>,
    pub auth_service: web::Data<AuthService>,
    pub task_service: web::Data<TaskService>,
}

impl TestState {
    pub fn new() -> Self {
        Self::with_policy(PastDuePolicy::MarkOverdue)
    }

    pub fn with_policy(policy: PastDuePolicy) -> Self {
        let users = Arc::new(MemoryUserRepository::new());
        let tasks = Arc::new(MemoryTaskRepository::new());
        let tokens = Arc::new(TokenService::new(TEST_SECRET, Duration::hours(2)));
        // Lowest bcrypt cost keeps the suite fast
        let credentials = CredentialService::new(4).expect("bcrypt setup");

        let auth_service = web::Data::new(AuthService::new(
            users.clone(),
            credentials,
            tokens.clone(),
        ));
        let task_service = web::Data::new(TaskService::new(
            tasks.clone(),
            users.clone(),
            policy,
        ));

        Self {
            users,
            tasks,
            tokens,
            auth_service,
            task_service,
        }
    }
}

/// The production app layout on top of `state`.
pub async fn init_app(
    state: &TestState,
) -> impl Service<
    actix_http::Request,
    Response = ServiceResponse<impl MessageBody>,
    Error = actix_web::Error,
> {
    test::init_service(
        App::new()
            .app_data(state.auth_service.clone())
            .app_data(state.task_service.clone())
            .app_data(web::Data::from(state.tokens.clone()))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            ),
    )
    .await
}

// Helper struct to hold auth details
pub struct TestUser {
    pub id: i32,
    pub token: String,
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

pub async fn register_and_login_user(
    app: &impl Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    name: &str,
    email: &str,
    password: &str,
) -> Result<TestUser, String> {
    let req_register = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "name": name,
            "email": email,
            "password": password
        }))
        .to_request();
    let resp_register = test::call_service(app, req_register).await;
    let register_status = resp_register.status();
    if !register_status.is_success() {
        let body = test::read_body(resp_register).await;
        return Err(format!(
            "Failed to register user. Status: {}. Body: {}",
            register_status,
            String::from_utf8_lossy(&body)
        ));
    }

    let req_login = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": email, "password": password }))
        .to_request();
    let resp_login = test::call_service(app, req_login).await;
    let login_status = resp_login.status();
    let body = test::read_body(resp_login).await;
    if !login_status.is_success() {
        return Err(format!(
            "Failed to log in. Status: {}. Body: {}",
            login_status,
            String::from_utf8_lossy(&body)
        ));
    }

    let auth_response: AuthResponse = serde_json::from_slice(&body)
        .map_err(|e| format!("Failed to parse login response: {}", e))?;
    Ok(TestUser {
        id: auth_response.user_id,
        token: auth_response.token,
    })
}

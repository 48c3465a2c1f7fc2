use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use std::io;
use std::sync::Arc;

use taskkeeper::auth::{AuthMiddleware, CredentialService, TokenService};
use taskkeeper::config::Config;
use taskkeeper::routes::{self, health};
use taskkeeper::services::{AuthService, TaskService};
use taskkeeper::store::{
    MemoryTaskRepository, MemoryUserRepository, PgTaskRepository, PgUserRepository,
    TaskRepository, UserRepository,
};

fn startup_error(context: &str, error: impl std::fmt::Display) -> io::Error {
    log::error!("{}: {}", context, error);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, error))
}

async fn build_stores(
    config: &Config,
) -> io::Result<(Arc<dyn UserRepository>, Arc<dyn TaskRepository>)> {
    match &config.database_url {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .acquire_timeout(std::time::Duration::from_secs(
                    config.db_acquire_timeout_secs,
                ))
                .connect(database_url)
                .await
                .map_err(|e| startup_error("Failed to connect to database", e))?;

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(|e| startup_error("Failed to run migrations", e))?;

            log::info!("Using PostgreSQL storage");
            let users: Arc<dyn UserRepository> = Arc::new(PgUserRepository::new(pool.clone()));
            let tasks: Arc<dyn TaskRepository> = Arc::new(PgTaskRepository::new(pool));
            Ok((users, tasks))
        }
        None => {
            log::warn!("DATABASE_URL not set, using in-memory storage. Data is lost on restart");
            let users: Arc<dyn UserRepository> = Arc::new(MemoryUserRepository::new());
            let tasks: Arc<dyn TaskRepository> = Arc::new(MemoryTaskRepository::new());
            Ok((users, tasks))
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(|e| startup_error("Invalid configuration", e))?;
    let (users, tasks) = build_stores(&config).await?;

    let tokens = Arc::new(TokenService::new(
        &config.jwt_secret,
        chrono::Duration::minutes(config.token_ttl_minutes),
    ));
    let credentials = CredentialService::new(config.bcrypt_cost)
        .map_err(|e| startup_error("Failed to initialise password hashing", e))?;

    let auth_service = web::Data::new(AuthService::new(
        users.clone(),
        credentials,
        tokens.clone(),
    ));
    let task_service = web::Data::new(TaskService::new(tasks, users, config.past_due_policy));
    let token_service = web::Data::from(tokens);

    log::info!(
        "Starting taskkeeper server at {} (past due policy: {})",
        config.server_url(),
        config.past_due_policy
    );
    HttpServer::new(move || {
        App::new()
            .app_data(auth_service.clone())
            .app_data(task_service.clone())
            .app_data(token_service.clone())
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
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}

#![doc = "The `taskkeeper` library crate."]
#![doc = ""]
#![doc = "Authentication and task lifecycle logic for the taskkeeper backend: password"]
#![doc = "hashing, bearer tokens, the access guard, owner-scoped task workflows with"]
#![doc = "due-date driven status, the storage interfaces and their implementations,"]
#![doc = "and the actix-web routes the binary (`main.rs`) mounts."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

pub use crate::error::AppError;

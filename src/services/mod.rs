//! Workflows the HTTP layer calls into. They depend only on the repository traits
//! in [`crate::store`], never on a concrete storage engine.

pub mod tasks;
pub mod users;

pub use tasks::{PastDuePolicy, TaskService};
pub use users::AuthService;

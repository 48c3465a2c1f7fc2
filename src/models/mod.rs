pub mod task;
pub mod user;

pub use task::{derive_status, CreateTaskInput, Task, TaskStatus, UpdateTaskInput};
pub use user::{NewUser, UpdateUserRequest, User, UserProfile};

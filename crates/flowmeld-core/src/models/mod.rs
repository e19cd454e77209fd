//! Data models for FlowMeld API entities.
//!
//! - `User`: the profile returned by `user/me/`
//! - `TokenPair`: access/refresh credentials from the token endpoints
//! - `Task`, `Persona`: dashboard data owned by the signed-in user

pub mod persona;
pub mod task;
pub mod token;
pub mod user;

pub use persona::Persona;
pub use task::{Task, TaskPriority, TaskStatus};
pub use token::{RefreshedToken, TokenPair};
pub use user::User;

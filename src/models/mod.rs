//! Data models for the drone site backend.
//!
//! Field names follow the JSON contract consumed by the admin dashboard.

mod blog;
mod catalog;
mod log;
mod permission;
mod query;
mod user;
mod verification;

pub use blog::*;
pub use catalog::*;
pub use log::*;
pub use permission::*;
pub use query::*;
pub use user::*;
pub use verification::*;

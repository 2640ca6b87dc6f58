//! Admin dashboard client.
//!
//! Front-end state machines for the admin dashboard and the public forms,
//! driving the REST API through [`AdminClient`]. Everything here is UI logic
//! without rendering: which view is shown, what is cached, which requests go
//! out and in what order.

mod client;
mod dialog;
mod forms;
mod permission_editor;
mod session_gate;
mod tabs;

pub use client::*;
pub use dialog::*;
pub use forms::*;
pub use permission_editor::*;
pub use session_gate::*;
pub use tabs::*;

use crate::models::Flag;

/// Dashboard views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
    CreateUser,
    EditPermissions(i64),
}

impl Route {
    /// Flag a session must hold to open this view. `None` means any
    /// authenticated user.
    pub fn required_flag(self) -> Option<Flag> {
        match self {
            Route::Login | Route::Dashboard => None,
            Route::CreateUser => Some(Flag::CreateUser),
            Route::EditPermissions(_) => Some(Flag::UpdatePermissions),
        }
    }
}

#[cfg(test)]
mod testing;

//! Session state for a logged-in operator.
//!
//! A `Session` is created at login and handed to every menu handler by
//! value reference. There is no global login state; logging out drops the
//! session and control returns to the guest menu.

use usms_core::{Role, User};

/// The identity behind the current menu loop.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

impl Session {
    pub fn for_user(user: &User) -> Self {
        Session {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }
}

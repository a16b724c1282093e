//! Roles, users, the demo credential directory and the explicit login session.

pub mod guard;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

pub use guard::{GuardDecision, Route, RouteGuard};

/// Password shared by every demo account.
pub const DEMO_PASSWORD: &str = "password123";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    RenewalUser,
    GunDealer,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::RenewalUser, Role::GunDealer, Role::Admin];

    /// Landing route for the role, used after login and on guard redirects.
    pub fn home(self) -> Route {
        match self {
            Role::RenewalUser => Route::Renewal,
            Role::GunDealer => Route::DealerRegistration,
            Role::Admin => Route::Dashboard,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Role::RenewalUser => "RENEWAL_USER",
            Role::GunDealer => "GUN_DEALER",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
}

/// Checks a login attempt against a user directory.
pub trait Authenticator {
    fn authenticate(&self, email: &str, password: &str) -> Result<User, AuthError>;
}

struct DirectoryEntry {
    email: &'static str,
    name: &'static str,
    role: Role,
}

/// Fixed set of demo accounts, one per role.
pub struct DemoDirectory {
    entries: Vec<DirectoryEntry>,
}

impl DemoDirectory {
    pub fn new() -> Self {
        Self {
            entries: vec![
                DirectoryEntry {
                    email: "user@renewal.com",
                    name: "Renewal User",
                    role: Role::RenewalUser,
                },
                DirectoryEntry {
                    email: "dealer@guns.com",
                    name: "Gun Dealer",
                    role: Role::GunDealer,
                },
                DirectoryEntry {
                    email: "admin@police.gov.gh",
                    name: "Police Admin",
                    role: Role::Admin,
                },
            ],
        }
    }

    pub fn emails(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|entry| entry.email)
    }
}

impl Default for DemoDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl Authenticator for DemoDirectory {
    fn authenticate(&self, email: &str, password: &str) -> Result<User, AuthError> {
        if password != DEMO_PASSWORD {
            return Err(AuthError::InvalidCredentials);
        }
        self.entries
            .iter()
            .find(|entry| entry.email == email.trim())
            .map(|entry| User {
                id: "1".into(),
                email: entry.email.to_string(),
                name: entry.name.to_string(),
                role: entry.role,
            })
            .ok_or(AuthError::InvalidCredentials)
    }
}

/// The signed-in user, if any. Created empty, filled by [`Session::login`],
/// emptied by [`Session::logout`].
#[derive(Debug, Clone, Default)]
pub struct Session {
    user: Option<User>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|user| user.role)
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Stores the user and returns the route they should land on.
    pub fn login(&mut self, user: User) -> Route {
        let home = user.role.home();
        info!(email = %user.email, role = %user.role, "session started");
        self.user = Some(user);
        home
    }

    /// Clears the session; the caller returns to the login route.
    pub fn logout(&mut self) -> Route {
        if let Some(user) = self.user.take() {
            info!(email = %user.email, "session ended");
        }
        Route::Login
    }
}

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use super::{Role, Session};
use crate::errors::PortalError;

/// Every page the portal exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Root,
    Login,
    SignUp,
    Dashboard,
    Licenses,
    Alerts,
    Renewal,
    DealerRegistration,
}

impl Route {
    pub const ALL: [Route; 8] = [
        Route::Root,
        Route::Login,
        Route::SignUp,
        Route::Dashboard,
        Route::Licenses,
        Route::Alerts,
        Route::Renewal,
        Route::DealerRegistration,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Route::Root => "/",
            Route::Login => "/login",
            Route::SignUp => "/signup",
            Route::Dashboard => "/dashboard",
            Route::Licenses => "/licenses",
            Route::Alerts => "/alerts",
            Route::Renewal => "/renewal",
            Route::DealerRegistration => "/dealer-registration",
        }
    }

    /// Roles allowed on the route; `None` for public pages.
    pub fn allowed_roles(self) -> Option<&'static [Role]> {
        match self {
            Route::Root | Route::Login | Route::SignUp => None,
            Route::Dashboard | Route::Licenses | Route::Alerts => Some(&[Role::Admin]),
            Route::Renewal => Some(&[Role::RenewalUser]),
            Route::DealerRegistration => Some(&[Role::GunDealer]),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Route {
    type Err = PortalError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let normalized = if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{trimmed}")
        };
        let normalized = if normalized.len() > 1 {
            normalized.trim_end_matches('/').to_string()
        } else {
            normalized
        };
        Route::ALL
            .into_iter()
            .find(|route| route.path() == normalized)
            .ok_or_else(|| PortalError::NotFound(format!("route `{trimmed}`")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(Route),
}

/// Decides whether the session may open a route.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteGuard;

impl RouteGuard {
    pub fn new() -> Self {
        Self
    }

    pub fn check(&self, session: &Session, route: Route) -> GuardDecision {
        let decision = Self::decide(session.role(), route);
        debug!(route = %route, ?decision, "route guard");
        decision
    }

    fn decide(role: Option<Role>, route: Route) -> GuardDecision {
        if route == Route::Root {
            return GuardDecision::Redirect(Route::Login);
        }
        let Some(allowed) = route.allowed_roles() else {
            return GuardDecision::Allow;
        };
        match role {
            None => GuardDecision::Redirect(Route::Login),
            Some(role) if allowed.contains(&role) => GuardDecision::Allow,
            Some(role) => GuardDecision::Redirect(role.home()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Authenticator, DemoDirectory, DEMO_PASSWORD};

    fn session_for(email: &str) -> Session {
        let mut session = Session::new();
        let user = DemoDirectory::new()
            .authenticate(email, DEMO_PASSWORD)
            .unwrap();
        session.login(user);
        session
    }

    #[test]
    fn anonymous_users_go_to_login() {
        let guard = RouteGuard::new();
        let session = Session::new();
        for route in [Route::Dashboard, Route::Renewal, Route::DealerRegistration] {
            assert_eq!(
                guard.check(&session, route),
                GuardDecision::Redirect(Route::Login)
            );
        }
        assert_eq!(guard.check(&session, Route::SignUp), GuardDecision::Allow);
    }

    #[test]
    fn dealer_is_sent_home_from_dashboard() {
        let guard = RouteGuard::new();
        let session = session_for("dealer@guns.com");
        assert_eq!(
            guard.check(&session, Route::Dashboard),
            GuardDecision::Redirect(Route::DealerRegistration)
        );
        assert_eq!(
            guard.check(&session, Route::DealerRegistration),
            GuardDecision::Allow
        );
    }

    #[test]
    fn renewal_user_cannot_open_alerts() {
        let guard = RouteGuard::new();
        let session = session_for("user@renewal.com");
        assert_eq!(
            guard.check(&session, Route::Alerts),
            GuardDecision::Redirect(Route::Renewal)
        );
    }

    #[test]
    fn root_always_redirects_to_login() {
        let guard = RouteGuard::new();
        assert_eq!(
            guard.check(&session_for("admin@police.gov.gh"), Route::Root),
            GuardDecision::Redirect(Route::Login)
        );
    }

    #[test]
    fn parses_paths_with_or_without_slash() {
        assert_eq!("/dashboard".parse::<Route>().unwrap(), Route::Dashboard);
        assert_eq!(
            "dealer-registration/".parse::<Route>().unwrap(),
            Route::DealerRegistration
        );
        assert_eq!("/".parse::<Route>().unwrap(), Route::Root);
        assert!("/settings".parse::<Route>().is_err());
    }
}

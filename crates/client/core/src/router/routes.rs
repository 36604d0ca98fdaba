//! Static route table.

use std::collections::HashSet;

use strum::{Display, EnumIter};
use thiserror::Error;

/// Views the client knows how to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum ViewId {
    Home,
    Login,
    Simulation,
    Quantum,
}

/// A path mapped to a view, with its access-control flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub path: String,
    pub view: ViewId,
    pub requires_auth: bool,
}

impl Route {
    pub fn public(path: impl Into<String>, view: ViewId) -> Self {
        Self {
            path: path.into(),
            view,
            requires_auth: false,
        }
    }

    pub fn protected(path: impl Into<String>, view: ViewId) -> Self {
        Self {
            path: path.into(),
            view,
            requires_auth: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("no route matches path {0}")]
    NotFound(String),

    #[error("route path must start with '/': {0}")]
    InvalidPath(String),

    #[error("duplicate route path: {0}")]
    DuplicatePath(String),

    #[error("route table has no {0} route")]
    MissingLoginRoute(ViewId),

    #[error("login route {0} must not require authentication")]
    ProtectedLoginRoute(String),
}

/// Immutable set of routes plus the designated login route.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
    login: usize,
}

impl RouteTable {
    /// Validate and build a table. `login_view` names the redirect target for
    /// unauthenticated access to protected routes.
    pub fn new(routes: Vec<Route>, login_view: ViewId) -> Result<Self, RouteError> {
        let mut seen = HashSet::new();
        for route in &routes {
            if !route.path.starts_with('/') {
                return Err(RouteError::InvalidPath(route.path.clone()));
            }
            if !seen.insert(normalize(&route.path)) {
                return Err(RouteError::DuplicatePath(route.path.clone()));
            }
        }

        let login = routes
            .iter()
            .position(|route| route.view == login_view)
            .ok_or(RouteError::MissingLoginRoute(login_view))?;

        if routes[login].requires_auth {
            return Err(RouteError::ProtectedLoginRoute(routes[login].path.clone()));
        }

        Ok(Self { routes, login })
    }

    /// The routes every RIQA client ships with.
    pub fn standard() -> Self {
        let routes = vec![
            Route::public("/", ViewId::Home),
            Route::public("/login", ViewId::Login),
            Route::protected("/simulate", ViewId::Simulation),
            Route::protected("/quantum", ViewId::Quantum),
        ];

        Self {
            routes,
            login: 1,
        }
    }

    /// Find the route for a path, ignoring query, fragment and trailing slash.
    pub fn resolve(&self, path: &str) -> Option<&Route> {
        let wanted = normalize(path);
        self.routes.iter().find(|route| normalize(&route.path) == wanted)
    }

    pub fn login_route(&self) -> &Route {
        &self.routes[self.login]
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::standard()
    }
}

fn normalize(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

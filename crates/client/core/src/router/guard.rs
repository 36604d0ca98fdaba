//! Navigation guard and the navigator that enforces it.

use std::sync::Arc;

use super::routes::{Route, RouteError, RouteTable};
use crate::session::SessionContext;

/// Progress of a single navigation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Pending,
    Allowed,
    Redirected,
}

/// Outcome of evaluating the guard against one route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    RedirectToLogin,
}

/// Decides whether a route may render given the current session.
///
/// The session is read on every call; nothing is cached between navigations.
#[derive(Clone, Debug)]
pub struct NavigationGuard {
    session: SessionContext,
}

impl NavigationGuard {
    pub fn new(session: SessionContext) -> Self {
        Self { session }
    }

    pub fn evaluate(&self, route: &Route) -> GuardDecision {
        if !route.requires_auth || self.session.is_authenticated() {
            GuardDecision::Allow
        } else {
            GuardDecision::RedirectToLogin
        }
    }
}

/// Receives the route that actually won a navigation.
pub trait ViewRenderer {
    fn render(&mut self, route: &Route);
}

/// Record of one completed navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    /// Path as requested by the caller
    pub requested: String,
    pub state: GuardState,
    /// Route that was rendered
    pub route: Route,
}

impl Navigation {
    fn pending(requested: &str, route: &Route) -> Self {
        Self {
            requested: requested.to_string(),
            state: GuardState::Pending,
            route: route.clone(),
        }
    }

    fn settle(mut self, decision: GuardDecision, login: &Route) -> Self {
        match decision {
            GuardDecision::Allow => self.state = GuardState::Allowed,
            GuardDecision::RedirectToLogin => {
                // The requested path is dropped; login does not bounce back.
                self.state = GuardState::Redirected;
                self.route = login.clone();
            }
        }
        self
    }

    pub fn was_redirected(&self) -> bool {
        self.state == GuardState::Redirected
    }
}

/// Resolves paths, runs the guard, then hands the winning route to the
/// renderer.
pub struct Navigator<R> {
    routes: Arc<RouteTable>,
    guard: NavigationGuard,
    renderer: R,
    current: Option<Route>,
}

impl<R: ViewRenderer> Navigator<R> {
    pub fn new(routes: Arc<RouteTable>, guard: NavigationGuard, renderer: R) -> Self {
        Self {
            routes,
            guard,
            renderer,
            current: None,
        }
    }

    /// Navigate to `path`.
    ///
    /// The guard settles before the renderer is called, and the renderer is
    /// called exactly once with either the requested route or the login
    /// route. Unknown paths render nothing.
    pub fn navigate(&mut self, path: &str) -> Result<Navigation, RouteError> {
        let route = self
            .routes
            .resolve(path)
            .ok_or_else(|| RouteError::NotFound(path.to_string()))?;

        let pending = Navigation::pending(path, route);
        let decision = self.guard.evaluate(route);
        let navigation = pending.settle(decision, self.routes.login_route());

        if navigation.was_redirected() {
            tracing::info!(
                "Navigation to {} requires sign-in, redirecting to {}",
                path,
                navigation.route.path
            );
        } else {
            tracing::debug!("Navigating to {}", navigation.route.path);
        }

        self.renderer.render(&navigation.route);
        self.current = Some(navigation.route.clone());

        Ok(navigation)
    }

    /// Last rendered route, if any navigation succeeded yet.
    pub fn current(&self) -> Option<&Route> {
        self.current.as_ref()
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::UserId;
    use crate::router::ViewId;
    use crate::session::{AuthenticatedUser, SessionEvent, SessionHandler, session_channel};

    #[derive(Default)]
    struct Recorder {
        rendered: Vec<ViewId>,
    }

    impl ViewRenderer for Recorder {
        fn render(&mut self, route: &Route) {
            self.rendered.push(route.view);
        }
    }

    fn navigator() -> (Navigator<Recorder>, SessionHandler) {
        let (_events, handler, ctx) = session_channel(4);
        let navigator = Navigator::new(
            Arc::new(RouteTable::standard()),
            NavigationGuard::new(ctx),
            Recorder::default(),
        );
        (navigator, handler)
    }

    fn sign_in(handler: &SessionHandler) {
        handler.apply(SessionEvent::SignedIn(AuthenticatedUser::new(
            UserId::new("u1"),
            "tok",
        )));
    }

    #[test]
    fn unauthenticated_simulate_redirects_to_login() {
        let (mut nav, _handler) = navigator();

        let navigation = nav.navigate("/simulate").unwrap();

        assert_eq!(navigation.state, GuardState::Redirected);
        assert_eq!(navigation.requested, "/simulate");
        assert_eq!(navigation.route.path, "/login");
        assert_eq!(nav.current().unwrap().path, "/login");
        assert_eq!(nav.renderer().rendered, vec![ViewId::Login]);
    }

    #[test]
    fn protected_routes_never_render_without_session() {
        let (mut nav, _handler) = navigator();
        let protected: Vec<String> = nav
            .routes()
            .routes()
            .iter()
            .filter(|route| route.requires_auth)
            .map(|route| route.path.clone())
            .collect();
        assert!(!protected.is_empty());

        for path in &protected {
            let navigation = nav.navigate(path).unwrap();
            assert!(navigation.was_redirected());
            assert!(!navigation.route.requires_auth);
        }

        assert!(nav.renderer().rendered.iter().all(|view| *view == ViewId::Login));
    }

    #[test]
    fn public_routes_allowed_regardless_of_session() {
        let (mut nav, handler) = navigator();

        for signed_in in [false, true] {
            if signed_in {
                sign_in(&handler);
            }
            for path in ["/", "/login"] {
                let navigation = nav.navigate(path).unwrap();
                assert_eq!(navigation.state, GuardState::Allowed);
                assert_eq!(navigation.route.path, path);
            }
        }
    }

    #[test]
    fn guard_rereads_session_on_every_navigation() {
        let (mut nav, handler) = navigator();

        assert!(nav.navigate("/quantum").unwrap().was_redirected());

        sign_in(&handler);
        let allowed = nav.navigate("/quantum").unwrap();
        assert_eq!(allowed.state, GuardState::Allowed);
        assert_eq!(allowed.route.view, ViewId::Quantum);

        handler.apply(SessionEvent::SignedOut);
        assert!(nav.navigate("/quantum").unwrap().was_redirected());

        assert_eq!(
            nav.renderer().rendered,
            vec![ViewId::Login, ViewId::Quantum, ViewId::Login]
        );
    }

    #[test]
    fn unknown_path_renders_nothing() {
        let (mut nav, _handler) = navigator();

        let err = nav.navigate("/nowhere").unwrap_err();

        assert_eq!(err, RouteError::NotFound("/nowhere".into()));
        assert!(nav.renderer().rendered.is_empty());
        assert!(nav.current().is_none());
    }

    #[test]
    fn pending_settles_to_allowed() {
        let route = Route::public("/", ViewId::Home);
        let login = Route::public("/login", ViewId::Login);

        let navigation = Navigation::pending("/", &route);
        assert_eq!(navigation.state, GuardState::Pending);

        let settled = navigation.settle(GuardDecision::Allow, &login);
        assert_eq!(settled.state, GuardState::Allowed);
        assert_eq!(settled.route, route);
    }
}

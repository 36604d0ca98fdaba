//! Path-to-view routing with authentication gating.
//!
//! - [`routes`]: the static [`RouteTable`] built once at startup
//! - [`guard`]: the [`NavigationGuard`] and the [`Navigator`] that runs it
//!   before any view renders
mod guard;
mod routes;

pub use guard::{GuardDecision, GuardState, Navigation, NavigationGuard, Navigator, ViewRenderer};
pub use routes::{Route, RouteError, RouteTable, ViewId};

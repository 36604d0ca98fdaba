//! Client-side primitives shared by every RIQA front-end.
//!
//! Holds the pieces that decide *what* the client may show and *who* it is
//! acting for, independent of any transport:
//! - [`session`]: single-owner session state fed by authentication events
//! - [`router`]: static route table and the navigation guard enforcing it
//! - [`record`]: simulation records and realtime update payloads
pub mod record;
pub mod router;
pub mod session;

pub use record::{
    NewSimulation, RecordId, SIMULATION_UPDATE, SimulationRecord, SimulationUpdateEvent, UserId,
};
pub use router::{
    GuardDecision, GuardState, Navigation, NavigationGuard, Navigator, Route, RouteError,
    RouteTable, ViewId, ViewRenderer,
};
pub use session::{
    AuthenticatedUser, Session, SessionContext, SessionEvent, SessionEvents, SessionHandler,
    session_channel,
};

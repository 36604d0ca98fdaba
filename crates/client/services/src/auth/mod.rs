//! Authentication provider backed by Firebase Identity Toolkit.
//!
//! The provider never writes session state itself: it reports sign-in,
//! sign-out and failures as [`client_core::SessionEvent`]s.
mod firebase;

pub use firebase::{AuthProviderError, FirebaseAuth, FirebaseAuthConfig, IDENTITY_TOOLKIT_URL};

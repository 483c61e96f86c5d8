//! Reading session: lifecycle, tag store and polling
//!
//! [`SessionController`] is the single owner of session state. HTTP handlers
//! and the process entry point only ever call its methods.

pub mod controller;
pub mod state;
pub mod store;

pub use controller::{SessionController, SessionSettings};
pub use state::{SessionState, SessionStatus, SourceKind};
pub use store::TagStore;

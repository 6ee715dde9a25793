//! Credential models handed out by the gate.

pub mod credential;
pub mod secret;

pub use credential::*;
pub use secret::*;

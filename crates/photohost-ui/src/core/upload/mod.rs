//! Upload widget core: batch validation, progress math, and the session state machine.

pub mod progress;
pub mod selection;
pub mod session;

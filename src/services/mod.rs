//! Backend operations, one module per concern.
//!
//! Services talk to the backends and decode results. They never touch the
//! state store; `AppContext` turns their results into actions.

pub mod comments;
pub mod polls;
pub mod session;
pub mod votes;

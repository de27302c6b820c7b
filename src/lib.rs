//! Sondaj: public opinion polls with votes, comments and reactions.
//!
//! ARCHITECTURE
//! ============
//! A single explicit state store (`state::Store`) holds the whole view model.
//! Every change flows through `state::reduce`, a pure function over a closed
//! `Action` enum. `context::AppContext` owns the backends (documents,
//! identity, blobs, preferences), keeps one live subscription per concern
//! (`subscriptions::LiveQuery`) and turns user intents into backend writes
//! plus reducer actions.
//!
//! Backends are traits. The in-memory implementations in `backend` are used
//! by the CLI and by every test.

pub mod backend;
pub mod config;
pub mod consent;
pub mod context;
pub mod error;
pub mod notify;
pub mod rich_text;
pub mod services;
pub mod share;
pub mod state;
pub mod subscriptions;
pub mod tally;
pub mod types;
pub mod util;
pub mod validate;
pub mod view_state;
pub mod views;

pub use context::{AppContext, AppProvider, Backends};
pub use error::{AppError, ErrorCode};

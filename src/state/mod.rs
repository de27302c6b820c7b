//! View-model state: the reducer, its sub-states, and the shared store.

pub mod app;
pub mod auth;
pub mod modal;
pub mod polls;
pub mod store;

pub use app::{Action, AppState, reduce};
pub use modal::{ModalDescriptor, ModalKind, ModalRegistry};
pub use polls::PollsData;
pub use store::Store;

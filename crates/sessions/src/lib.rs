//! In-memory per-conversation state for the face-swap flow.
//!
//! Nothing is persisted: a process restart forgets every open conversation.

pub mod state_store;

pub use state_store::{SessionState, SessionStore};

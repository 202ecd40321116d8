//! Conversation plugins.
//!
//! [`FaceSwapPlugin`] walks a user through sending a source face and a
//! target picture, then hands both to the remote face-swap service and
//! replies with the result URL.

pub mod error;
pub mod face_swap;

pub use {
    error::{Error, Result},
    face_swap::{FaceSwapPlugin, replies},
};

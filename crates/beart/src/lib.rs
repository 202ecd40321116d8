//! Client for the BeArt face-swap web service.
//!
//! [`BeArtClient`] speaks the two-step create/poll protocol. Callers that
//! only need "give me a result URL for these two faces" depend on the
//! [`FaceSwapService`] trait instead, which makes the remote side swappable
//! in tests.

pub mod client;
pub mod error;
pub mod types;

use {async_trait::async_trait, faceswap_media::ImageBlob};

pub use {
    client::BeArtClient,
    error::{Error, Result, Stage},
};

/// Something that can put the face from `source` onto `target`.
#[async_trait]
pub trait FaceSwapService: Send + Sync {
    /// Run one swap to completion and return the result image URL.
    async fn swap(&self, source: &ImageBlob, target: &ImageBlob) -> Result<String>;
}

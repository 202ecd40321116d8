//! Inbound image handling: magic-byte sniffing, validated blobs, and the
//! fallback chain that turns a host message into image bytes.
//!
//! Images are never decoded or re-encoded locally.

pub mod acquire;
pub mod blob;
pub mod error;
pub mod mime;

pub use {
    acquire::ImageAcquirer,
    blob::ImageBlob,
    error::{Error, Result},
    mime::{ImageFormat, is_supported_image, mime_type_for},
};

use thiserror::Error;

/// Errors surfaced by host-side collaborators (attachments, file access).
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The host could not materialize an attachment.
    #[error("attachment unavailable: {0}")]
    Attachment(String),
}

impl Error {
    #[must_use]
    pub fn attachment(reason: impl Into<String>) -> Self {
        Self::Attachment(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

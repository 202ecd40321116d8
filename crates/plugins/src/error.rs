use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] faceswap_config::Error),

    #[error(transparent)]
    Swap(#[from] faceswap_beart::Error),

    /// The session moved on between reading and updating it.
    #[error("session {key} is no longer {expected}")]
    SessionConflict { key: String, expected: &'static str },
}

impl Error {
    #[must_use]
    pub fn session_conflict(key: impl Into<String>, expected: &'static str) -> Self {
        Self::SessionConflict {
            key: key.into(),
            expected,
        }
    }

    /// Remote job failures get the generic reply; everything else is
    /// surfaced with its message.
    pub fn is_job_failure(&self) -> bool {
        matches!(self, Self::Swap(e) if e.is_job_failure())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

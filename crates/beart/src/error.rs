use std::{error::Error as StdError, fmt};

/// Which endpoint a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CreateJob,
    GetJob,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CreateJob => "create-job",
            Self::GetJob => "get-job",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request never produced a response (connect, timeout, body read).
    #[error("{stage} request failed: {source}")]
    Transport {
        stage: Stage,
        #[source]
        source: reqwest::Error,
    },

    #[error("{stage} returned HTTP {status}")]
    HttpStatus { stage: Stage, status: u16 },

    #[error("{stage} response is malformed: {reason}")]
    InvalidResponse { stage: Stage, reason: String },

    /// HTTP 200, but the service refused to create the job.
    #[error("create-job rejected with code {code}: {message}")]
    CreateRejected { code: i64, message: String },

    /// HTTP 200, but the status code is neither success nor "processing".
    #[error("get-job rejected with code {code}")]
    PollRejected { code: i64 },

    #[error("job still processing after {attempts} attempts")]
    MaxRetriesExceeded { attempts: u32 },

    #[error("{context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn external<E>(context: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }

    #[must_use]
    pub fn invalid(stage: Stage, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            stage,
            reason: reason.into(),
        }
    }

    /// Whether the remote job failed (as opposed to a local fault).
    ///
    /// Job failures are reported to users with a single generic message.
    pub fn is_job_failure(&self) -> bool {
        !matches!(self, Self::External { .. })
    }

    /// Endpoint the failure belongs to, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Transport { stage, .. }
            | Self::HttpStatus { stage, .. }
            | Self::InvalidResponse { stage, .. } => Some(*stage),
            Self::CreateRejected { .. } => Some(Stage::CreateJob),
            Self::PollRejected { .. } | Self::MaxRetriesExceeded { .. } => Some(Stage::GetJob),
            Self::External { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

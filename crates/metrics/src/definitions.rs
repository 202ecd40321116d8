//! Metric name and label definitions.
//!
//! Centralizing these keeps dashboards and emitting code in sync.

/// Remote face-swap job metrics
pub mod faceswap {
    /// Jobs accepted by the remote service
    pub const JOBS_CREATED_TOTAL: &str = "faceswap_jobs_created_total";
    /// Jobs that produced a result URL
    pub const JOBS_COMPLETED_TOTAL: &str = "faceswap_jobs_completed_total";
    /// Jobs that failed at creation, while polling, or by running out of attempts
    pub const JOBS_FAILED_TOTAL: &str = "faceswap_jobs_failed_total";
    /// Status requests issued while waiting for a job
    pub const POLL_ATTEMPTS_TOTAL: &str = "faceswap_poll_attempts_total";
    /// Wall time from upload to result, in seconds
    pub const JOB_DURATION_SECONDS: &str = "faceswap_job_duration_seconds";
}

/// Conversation session metrics
pub mod sessions {
    /// Sessions opened by the trigger phrase
    pub const STARTED_TOTAL: &str = "faceswap_sessions_started_total";
    /// Sessions currently waiting for an image
    pub const ACTIVE: &str = "faceswap_sessions_active";
}

/// Inbound image metrics
pub mod images {
    /// Images accepted by the format check
    pub const ACCEPTED_TOTAL: &str = "faceswap_images_accepted_total";
    /// Images rejected by the format check
    pub const REJECTED_TOTAL: &str = "faceswap_images_rejected_total";
    /// Images whose bytes could not be obtained
    pub const ACQUISITION_FAILED_TOTAL: &str = "faceswap_images_acquisition_failed_total";
}

/// Host plugin dispatch metrics
pub mod plugins {
    /// Inbound messages offered to the registry
    pub const MESSAGES_DISPATCHED_TOTAL: &str = "faceswap_plugin_messages_dispatched_total";
    /// Replies produced by a plugin
    pub const REPLIES_TOTAL: &str = "faceswap_plugin_replies_total";
}

/// Common label keys
pub mod labels {
    pub const STAGE: &str = "stage";
    pub const FORMAT: &str = "format";
    pub const PLUGIN: &str = "plugin";
}

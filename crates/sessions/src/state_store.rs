//! Session state store keyed by conversation key.
//!
//! A key is present exactly while its conversation is mid-flow. The lock is
//! never held across an `.await`; the host delivers messages for one key
//! sequentially, so read-then-write sequences per key do not race.

use std::{collections::HashMap, sync::Mutex};

use {faceswap_media::ImageBlob, tracing::debug};

#[cfg(feature = "metrics")]
use faceswap_metrics::{counter, gauge, sessions as session_metrics};

/// Where a conversation stands. Absence from the store means idle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Trigger received; waiting for the face to transplant.
    AwaitingSource,
    /// Source accepted; waiting for the picture to put it on.
    AwaitingTarget { source: ImageBlob },
    /// Both images collected; the remote job is running.
    Processing {
        source: ImageBlob,
        target: ImageBlob,
    },
}

impl SessionState {
    pub fn source(&self) -> Option<&ImageBlob> {
        match self {
            Self::AwaitingSource => None,
            Self::AwaitingTarget { source } | Self::Processing { source, .. } => Some(source),
        }
    }

    pub fn target(&self) -> Option<&ImageBlob> {
        match self {
            Self::Processing { target, .. } => Some(target),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::AwaitingSource => "awaiting_source",
            Self::AwaitingTarget { .. } => "awaiting_target",
            Self::Processing { .. } => "processing",
        }
    }
}

/// Process-wide map of open conversations.
///
/// Created when the plugin starts and cleared on shutdown.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, SessionState>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_map<R>(&self, f: impl FnOnce(&mut HashMap<String, SessionState>) -> R) -> R {
        let mut guard = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let out = f(&mut guard);
        #[cfg(feature = "metrics")]
        gauge!(session_metrics::ACTIVE).set(guard.len() as f64);
        out
    }

    /// Open (or reopen) a conversation in [`SessionState::AwaitingSource`].
    ///
    /// Returns the state that was overwritten, if any.
    pub fn start(&self, key: &str) -> Option<SessionState> {
        let previous = self.with_map(|map| map.insert(key.to_string(), SessionState::AwaitingSource));
        #[cfg(feature = "metrics")]
        counter!(session_metrics::STARTED_TOTAL).increment(1);
        debug!(
            session_key = key,
            replaced = previous.as_ref().map(SessionState::label),
            "session started"
        );
        previous
    }

    /// Snapshot of the state for `key`.
    pub fn get(&self, key: &str) -> Option<SessionState> {
        self.with_map(|map| map.get(key).cloned())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.with_map(|map| map.contains_key(key))
    }

    /// Record the source image and move to [`SessionState::AwaitingTarget`].
    ///
    /// Returns `false` (and changes nothing) unless the session is awaiting
    /// its source.
    pub fn accept_source(&self, key: &str, source: ImageBlob) -> bool {
        self.with_map(|map| match map.get_mut(key) {
            Some(state @ SessionState::AwaitingSource) => {
                *state = SessionState::AwaitingTarget { source };
                true
            },
            _ => false,
        })
    }

    /// Record the target image and move to [`SessionState::Processing`].
    ///
    /// Returns the `(source, target)` pair to submit, or `None` (and changes
    /// nothing) unless the session is awaiting its target.
    pub fn accept_target(&self, key: &str, target: ImageBlob) -> Option<(ImageBlob, ImageBlob)> {
        self.with_map(|map| {
            let state = map.get_mut(key)?;
            let SessionState::AwaitingTarget { source } = state else {
                return None;
            };
            let source = source.clone();
            *state = SessionState::Processing {
                source: source.clone(),
                target: target.clone(),
            };
            Some((source, target))
        })
    }

    /// End a conversation. Returns its last state.
    pub fn remove(&self, key: &str) -> Option<SessionState> {
        let removed = self.with_map(|map| map.remove(key));
        if let Some(state) = &removed {
            debug!(session_key = key, state = state.label(), "session removed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.with_map(|map| map.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every open conversation. Returns how many were dropped.
    pub fn clear(&self) -> usize {
        self.with_map(|map| {
            let count = map.len();
            map.clear();
            count
        })
    }
}

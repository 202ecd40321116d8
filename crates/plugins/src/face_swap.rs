//! `Huanl` face-swap plugin.
//!
//! Conversation per session key:
//!
//! ```text
//! idle --trigger--> awaiting source --image--> awaiting target --image--> processing --> idle
//! ```
//!
//! The trigger phrase restarts the flow from any state. Images from users
//! without an open session pass through untouched.

use std::{path::Path, sync::Arc};

use {
    async_trait::async_trait,
    bytes::Bytes,
    faceswap_beart::{BeArtClient, FaceSwapService},
    faceswap_channels::{MessagePlugin, PluginInfo},
    faceswap_common::types::{InboundMessage, MessageContent, Reply},
    faceswap_config::{FaceSwapConfig, load_config},
    faceswap_media::{ImageAcquirer, ImageBlob},
    faceswap_sessions::{SessionState, SessionStore},
    tracing::{debug, error, info, warn},
};

#[cfg(feature = "metrics")]
use faceswap_metrics::{counter, images as image_metrics, labels};

use crate::error::{Error, Result};

/// User-facing reply texts.
pub mod replies {
    use std::fmt::Display;

    pub const SOURCE_PROMPT: &str = "请发送一张带有人脸的源图片";
    pub const TARGET_PROMPT: &str = "请发送需要替换的目标人脸图片";
    pub const UNSUPPORTED_FORMAT: &str = "图片格式不支持，请使用jpg/png/gif/webp/bmp格式";
    pub const ACQUISITION_FAILED: &str = "获取图片失败，请重试";
    pub const PROCESSING_FAILED: &str = "处理失败";

    /// Reply for failures that are not a remote job failure.
    pub fn unexpected(err: &impl Display) -> String {
        format!("{PROCESSING_FAILED}: {err}")
    }
}

pub const PLUGIN_NAME: &str = "Huanl";
pub const PLUGIN_PRIORITY: i32 = -1;

fn plugin_info() -> PluginInfo {
    PluginInfo {
        name: PLUGIN_NAME.into(),
        description: "BeArt AI换脸插件".into(),
        version: "0.1".into(),
        author: "lanvent".into(),
        priority: PLUGIN_PRIORITY,
    }
}

pub struct FaceSwapPlugin {
    info: PluginInfo,
    trigger: String,
    sessions: SessionStore,
    acquirer: ImageAcquirer,
    swapper: Arc<dyn FaceSwapService>,
}

impl FaceSwapPlugin {
    pub fn new(config: &FaceSwapConfig, swapper: Arc<dyn FaceSwapService>) -> Self {
        Self {
            info: plugin_info(),
            trigger: config.trigger_prefix.clone(),
            sessions: SessionStore::new(),
            acquirer: ImageAcquirer::new(&config.media),
            swapper,
        }
    }

    /// Build the plugin against the real BeArt service.
    pub fn from_config(config: &FaceSwapConfig) -> Self {
        Self::new(config, Arc::new(BeArtClient::new(&config.beart)))
    }

    /// Load `path` and build the plugin. A missing file is an error.
    pub fn from_config_file(path: &Path) -> Result<Self> {
        let config = load_config(path)?;
        Ok(Self::from_config(&config))
    }

    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Open (or restart) the session for `key` and ask for the source face.
    pub fn on_trigger(&self, key: &str) -> Reply {
        self.sessions.start(key);
        info!(session_key = key, "face swap requested");
        Reply::text(replies::SOURCE_PROMPT)
    }

    /// Feed one image into the session for `key`.
    ///
    /// Returns `None` when `key` has no open session.
    pub async fn on_image(&self, key: &str, data: Bytes) -> Option<Reply> {
        let state = self.sessions.get(key)?;

        let blob = match ImageBlob::new(data) {
            Ok(blob) => blob,
            Err(e) => {
                #[cfg(feature = "metrics")]
                counter!(image_metrics::REJECTED_TOTAL).increment(1);
                info!(session_key = key, state = state.label(), error = %e, "image rejected");
                return Some(Reply::text(replies::UNSUPPORTED_FORMAT));
            },
        };

        #[cfg(feature = "metrics")]
        counter!(image_metrics::ACCEPTED_TOTAL, labels::FORMAT => blob.format().to_string())
            .increment(1);

        match self.advance(key, state, blob).await {
            Ok(reply) => reply,
            Err(e) => {
                self.sessions.remove(key);
                if e.is_job_failure() {
                    warn!(session_key = key, error = %e, "face swap failed");
                    Some(Reply::text(replies::PROCESSING_FAILED))
                } else {
                    error!(session_key = key, error = %e, "failed to handle image");
                    Some(Reply::text(replies::unexpected(&e)))
                }
            },
        }
    }

    async fn advance(&self, key: &str, state: SessionState, blob: ImageBlob) -> Result<Option<Reply>> {
        match state {
            SessionState::AwaitingSource => {
                let format = blob.format();
                if !self.sessions.accept_source(key, blob) {
                    return Err(Error::session_conflict(key, "awaiting_source"));
                }
                debug!(session_key = key, %format, "source image stored");
                Ok(Some(Reply::text(replies::TARGET_PROMPT)))
            },
            SessionState::AwaitingTarget { .. } => {
                let (source, target) = self
                    .sessions
                    .accept_target(key, blob)
                    .ok_or_else(|| Error::session_conflict(key, "awaiting_target"))?;
                debug!(session_key = key, format = %target.format(), "target image stored");

                let outcome = self.swapper.swap(&source, &target).await;
                self.sessions.remove(key);
                let url = outcome?;

                info!(session_key = key, url = %url, "face swap completed");
                Ok(Some(Reply::image_url(url)))
            },
            SessionState::Processing { .. } => {
                debug!(session_key = key, "swap in progress, ignoring image");
                Ok(None)
            },
        }
    }

    async fn on_image_message(&self, msg: &InboundMessage) -> Option<Reply> {
        let key = msg.session_key();
        if !self.sessions.contains(&key) {
            return None;
        }

        match self.acquirer.acquire(msg).await {
            Ok(data) => self.on_image(&key, data).await,
            Err(e) => {
                warn!(session_key = %key, error = %e, "could not obtain image bytes");
                Some(Reply::text(replies::ACQUISITION_FAILED))
            },
        }
    }
}

#[async_trait]
impl MessagePlugin for FaceSwapPlugin {
    fn info(&self) -> &PluginInfo {
        &self.info
    }

    async fn start(&self) -> anyhow::Result<()> {
        info!(trigger = %self.trigger, "face swap plugin initialized");
        Ok(())
    }

    async fn handle(&self, msg: &InboundMessage) -> anyhow::Result<Option<Reply>> {
        let reply = match &msg.content {
            MessageContent::Text(text) if text.trim() == self.trigger => {
                Some(self.on_trigger(&msg.session_key()))
            },
            MessageContent::Image(_) => self.on_image_message(msg).await,
            MessageContent::Text(_) | MessageContent::Other => None,
        };
        Ok(reply)
    }

    async fn shutdown(&self) {
        let dropped = self.sessions.clear();
        info!(dropped, "face swap plugin stopped");
    }
}

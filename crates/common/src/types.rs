//! Message types exchanged between the host chat framework and plugins.

use std::{fmt, path::PathBuf, sync::Arc};

use {
    async_trait::async_trait,
    bytes::Bytes,
    serde::{Deserialize, Serialize},
};

// ── Inbound ─────────────────────────────────────────────────────────────────

/// Image content as delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagePayload {
    /// Raw bytes, already in memory.
    Bytes(Bytes),
    /// A local file path or an `http(s)://` URL.
    Reference(String),
    /// Nothing inline; the bytes live behind the message's [`HostAttachment`].
    Pending,
}

/// Body of an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    Text(String),
    Image(ImagePayload),
    /// Voice, files, stickers and anything else plugins usually ignore.
    Other,
}

/// Host-side handle to a message attachment.
///
/// Hosts that download attachments lazily implement this so a plugin can
/// ask for the file to be materialized on disk.
#[async_trait]
pub trait HostAttachment: Send + Sync {
    /// Path where the host keeps (or will keep) the attachment.
    fn content_path(&self) -> Option<PathBuf>;

    /// Whether the attachment has already been downloaded.
    fn is_prepared(&self) -> bool;

    /// Download the attachment to [`content_path`](Self::content_path).
    async fn prepare(&self) -> crate::Result<()>;
}

/// A single inbound message handed to plugins.
#[derive(Clone)]
pub struct InboundMessage {
    /// Sender of the message.
    pub user_id: String,
    /// Group the message was posted in, `None` for direct messages.
    pub group_id: Option<String>,
    pub content: MessageContent,
    pub attachment: Option<Arc<dyn HostAttachment>>,
}

impl fmt::Debug for InboundMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InboundMessage")
            .field("user_id", &self.user_id)
            .field("group_id", &self.group_id)
            .field("content", &self.content)
            .field("attachment", &self.attachment.is_some())
            .finish()
    }
}

impl InboundMessage {
    pub fn text(user_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            group_id: None,
            content: MessageContent::Text(text.into()),
            attachment: None,
        }
    }

    pub fn image(user_id: impl Into<String>, payload: ImagePayload) -> Self {
        Self {
            user_id: user_id.into(),
            group_id: None,
            content: MessageContent::Image(payload),
            attachment: None,
        }
    }

    #[must_use]
    pub fn in_group(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    #[must_use]
    pub fn with_attachment(mut self, attachment: Arc<dyn HostAttachment>) -> Self {
        self.attachment = Some(attachment);
        self
    }

    pub fn is_group(&self) -> bool {
        self.group_id.is_some()
    }

    /// Conversation key: `"{group}_{user}"` in groups, the sender id otherwise.
    ///
    /// Two users in the same group get independent sessions.
    pub fn session_key(&self) -> String {
        match &self.group_id {
            Some(group_id) => format!("{group_id}_{}", self.user_id),
            None => self.user_id.clone(),
        }
    }
}

// ── Outbound ────────────────────────────────────────────────────────────────

/// A plugin's answer to an inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Reply {
    Text(String),
    /// A remote image the host should fetch and display.
    ImageUrl(String),
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn image_url(url: impl Into<String>) -> Self {
        Self::ImageUrl(url.into())
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::ImageUrl(url) => write!(f, "[image] {url}"),
        }
    }
}

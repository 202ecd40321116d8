use {
    anyhow::Result,
    async_trait::async_trait,
    faceswap_common::types::{InboundMessage, Reply},
    serde::Serialize,
};

/// Static description of a plugin, shown by hosts in plugin listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginInfo {
    /// Unique plugin name, also used as its registry id.
    pub name: String,
    pub description: String,
    pub version: String,
    pub author: String,
    /// Higher runs earlier. Negative values let other plugins go first.
    pub priority: i32,
}

/// Core message plugin trait. Each conversational feature implements this.
#[async_trait]
pub trait MessagePlugin: Send + Sync {
    fn info(&self) -> &PluginInfo;

    /// Registry id (the plugin name).
    fn id(&self) -> &str {
        &self.info().name
    }

    fn priority(&self) -> i32 {
        self.info().priority
    }

    /// Called once when the host registers the plugin. No-op by default.
    async fn start(&self) -> Result<()> {
        Ok(())
    }

    /// Handle one inbound message.
    ///
    /// `Ok(Some(reply))` consumes the message and stops dispatch.
    /// `Ok(None)` passes it on to lower-priority plugins.
    async fn handle(&self, msg: &InboundMessage) -> Result<Option<Reply>>;

    /// Release in-memory state before the host exits. No-op by default.
    async fn shutdown(&self) {}
}

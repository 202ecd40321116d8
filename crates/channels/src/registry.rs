use std::sync::Arc;

use {
    faceswap_common::types::{InboundMessage, Reply},
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use faceswap_metrics::{counter, labels, plugins as plugin_metrics};

use crate::{
    error::{Error, Result},
    plugin::MessagePlugin,
};

/// A reply together with the plugin that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    pub plugin: String,
    pub reply: Reply,
}

/// Registry of loaded message plugins, kept in dispatch order.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn MessagePlugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `plugin` and add it to the registry.
    ///
    /// Plugins are ordered by descending priority; equal priorities keep
    /// registration order.
    pub async fn register(&mut self, plugin: Arc<dyn MessagePlugin>) -> Result<()> {
        let name = plugin.id().to_string();
        if self.get(&name).is_some() {
            return Err(Error::duplicate(name));
        }

        plugin
            .start()
            .await
            .map_err(|e| Error::external(format!("starting {name}"), e))?;

        let priority = plugin.priority();
        let at = self
            .plugins
            .iter()
            .position(|p| p.priority() < priority)
            .unwrap_or(self.plugins.len());
        self.plugins.insert(at, plugin);

        info!(plugin = %name, priority, "plugin registered");
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn MessagePlugin>> {
        self.plugins.iter().find(|p| p.id() == name)
    }

    /// Plugin names in dispatch order.
    pub fn list(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Offer `msg` to each plugin in turn until one replies.
    ///
    /// A plugin error is logged and treated like a pass.
    pub async fn dispatch(&self, msg: &InboundMessage) -> Option<Dispatched> {
        #[cfg(feature = "metrics")]
        counter!(plugin_metrics::MESSAGES_DISPATCHED_TOTAL).increment(1);

        for plugin in &self.plugins {
            match plugin.handle(msg).await {
                Ok(Some(reply)) => {
                    #[cfg(feature = "metrics")]
                    counter!(plugin_metrics::REPLIES_TOTAL, labels::PLUGIN => plugin.id().to_string())
                        .increment(1);
                    debug!(plugin = plugin.id(), user_id = %msg.user_id, "plugin replied");
                    return Some(Dispatched {
                        plugin: plugin.id().to_string(),
                        reply,
                    });
                },
                Ok(None) => {},
                Err(e) => {
                    warn!(plugin = plugin.id(), error = %e, "plugin failed to handle message");
                },
            }
        }
        None
    }

    /// Shut every plugin down, highest priority first.
    pub async fn shutdown(&self) {
        for plugin in &self.plugins {
            plugin.shutdown().await;
            debug!(plugin = plugin.id(), "plugin shut down");
        }
    }
}

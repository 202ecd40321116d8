//! Host-side plugin system.
//!
//! A host chat framework wraps every inbound message in an
//! [`InboundMessage`](faceswap_common::types::InboundMessage) and offers it
//! to the registered [`MessagePlugin`]s in priority order. The first plugin
//! that answers consumes the message.

pub mod error;
pub mod plugin;
pub mod registry;

pub use {
    error::{Error, Result},
    plugin::{MessagePlugin, PluginInfo},
    registry::{Dispatched, PluginRegistry},
};

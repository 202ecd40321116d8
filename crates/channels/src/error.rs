use std::error::Error as StdError;

/// Crate-wide result type for plugin registry operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A plugin with the same name is already registered.
    #[error("plugin already registered: {name}")]
    DuplicatePlugin { name: String },

    /// Wrapped source error from a plugin lifecycle hook.
    #[error("plugin operation failed: {context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn duplicate(name: impl std::fmt::Display) -> Self {
        Self::DuplicatePlugin {
            name: name.to_string(),
        }
    }

    #[must_use]
    pub fn external(context: impl Into<String>, source: anyhow::Error) -> Self {
        Self::External {
            context: context.into(),
            source: source.into(),
        }
    }
}

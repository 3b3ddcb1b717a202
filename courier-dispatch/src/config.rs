//! Server-advertised limits.

use crate::BoxFuture;
use crate::errors::DispatchError;

/// Limits advertised by the server configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServerLimits {
    /// Maximum length, in characters, of a message text field.
    pub message_length_max: usize,
    /// Maximum length, in characters, of a media caption.
    pub caption_length_max: usize,
}

impl Default for ServerLimits {
    fn default() -> Self {
        Self { message_length_max: 4096, caption_length_max: 1024 }
    }
}

/// Source of the current server configuration.
///
/// Retrieval is a suspension point: implementations may need a round
/// trip the first time, then serve a cached copy.
pub trait ConfigProvider: Send + Sync {
    /// The currently advertised limits.
    fn current(&self) -> BoxFuture<'_, Result<ServerLimits, DispatchError>>;
}

/// A fixed configuration, served without any round trip.
///
/// Used before the first real config fetch and throughout tests.
#[derive(Clone, Debug, Default)]
pub struct StaticConfig {
    limits: ServerLimits,
}

impl StaticConfig {
    /// Serve exactly `limits`.
    pub fn new(limits: ServerLimits) -> Self {
        Self { limits }
    }
}

impl ConfigProvider for StaticConfig {
    fn current(&self) -> BoxFuture<'_, Result<ServerLimits, DispatchError>> {
        let limits = self.limits.clone();
        Box::pin(async move { Ok(limits) })
    }
}

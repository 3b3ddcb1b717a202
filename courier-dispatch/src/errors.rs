//! Error types for courier-dispatch.

use std::{fmt, io};

// ─── RpcError ─────────────────────────────────────────────────────────────────

/// An error returned by the remote server in response to a call.
///
/// Numeric values are stripped from the name and placed in [`RpcError::value`].
///
/// # Example
/// `FLOOD_WAIT_30` → `RpcError { code: 420, name: "FLOOD_WAIT", value: Some(30) }`
#[derive(Clone, Debug, PartialEq)]
pub struct RpcError {
    /// HTTP-like status code.
    pub code: i32,
    /// Error name in SCREAMING_SNAKE_CASE with digits removed.
    pub name: String,
    /// Numeric suffix extracted from the name, if any.
    pub value: Option<u32>,
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RPC {}: {}", self.code, self.name)?;
        if let Some(v) = self.value {
            write!(f, " (value: {v})")?;
        }
        Ok(())
    }
}

impl std::error::Error for RpcError {}

impl RpcError {
    /// Parse a raw server error message like `"FLOOD_WAIT_30"`.
    pub fn from_wire(code: i32, message: &str) -> Self {
        // Numeric suffix after the last underscore becomes `value`.
        if let Some(idx) = message.rfind('_') {
            let suffix = &message[idx + 1..];
            if !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit()) {
                if let Ok(v) = suffix.parse::<u32>() {
                    let name = message[..idx].to_string();
                    return Self { code, name, value: Some(v) };
                }
            }
        }
        Self { code, name: message.to_string(), value: None }
    }

    /// Match on the error name, with optional wildcard prefix/suffix `'*'`.
    ///
    /// # Examples
    /// - `err.is("FLOOD_WAIT")` — exact match
    /// - `err.is("PHONE_CODE_*")` — starts-with match
    /// - `err.is("*_INVALID")` — ends-with match
    pub fn is(&self, pattern: &str) -> bool {
        if let Some(prefix) = pattern.strip_suffix('*') {
            self.name.starts_with(prefix)
        } else if let Some(suffix) = pattern.strip_prefix('*') {
            self.name.ends_with(suffix)
        } else {
            self.name == pattern
        }
    }

    /// Returns the flood-wait duration in seconds, if this is a FLOOD_WAIT error.
    pub fn flood_wait_seconds(&self) -> Option<u64> {
        if self.code == 420 && self.name == "FLOOD_WAIT" {
            self.value.map(|v| v as u64)
        } else {
            None
        }
    }
}

// ─── DispatchError ────────────────────────────────────────────────────────────

/// The error type surfaced on a caller's future by the dispatch layer.
#[derive(Debug)]
pub enum DispatchError {
    /// A delegation target could not be resolved, or the directory
    /// reported the session's own datacenter for a foreign identifier.
    Routing(String),
    /// Chunking could not bring a payload under the advertised limit.
    Oversized {
        /// Measured text length after normalization.
        len: usize,
        /// Server-advertised maximum.
        max: usize,
    },
    /// The method registry has no entry for the invoked method.
    UnknownMethod(String),
    /// The server rejected the call.
    Rpc(RpcError),
    /// Transport failure on send or flush.
    Io(io::Error),
    /// The call's fan-out was cancelled before this element was submitted.
    Cancelled,
    /// The response channel was dropped (e.g. the session shut down).
    Dropped,
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Routing(s)           => write!(f, "routing error: {s}"),
            Self::Oversized { len, max } =>
                write!(f, "payload of {len} chars cannot be chunked under the {max}-char limit"),
            Self::UnknownMethod(m)     => write!(f, "unknown method: {m}"),
            Self::Rpc(e)               => write!(f, "{e}"),
            Self::Io(e)                => write!(f, "I/O error: {e}"),
            Self::Cancelled            => write!(f, "call cancelled"),
            Self::Dropped              => write!(f, "request dropped"),
        }
    }
}

impl std::error::Error for DispatchError {}

impl From<io::Error> for DispatchError {
    fn from(e: io::Error) -> Self { Self::Io(e) }
}

impl From<RpcError> for DispatchError {
    fn from(e: RpcError) -> Self { Self::Rpc(e) }
}

impl DispatchError {
    /// Returns `true` if this is the named RPC error (supports `'*'` wildcards).
    pub fn is(&self, pattern: &str) -> bool {
        match self {
            Self::Rpc(e) => e.is(pattern),
            _            => false,
        }
    }

    /// If this is a FLOOD_WAIT error, returns how many seconds to wait.
    pub fn flood_wait_seconds(&self) -> Option<u64> {
        match self {
            Self::Rpc(e) => e.flood_wait_seconds(),
            _            => None,
        }
    }
}

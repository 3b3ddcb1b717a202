//! Message identifiers.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A 64-bit message identifier.
///
/// The upper 32 bits are derived from the current Unix time; the lower
/// 32 bits are a monotonically increasing counter within the second,
/// shifted left so the two least significant bits are zero (required
/// for client-originated messages).
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct MsgId(pub u64);

impl MsgId {
    /// Generate a new identifier from the system clock and `counter`.
    ///
    /// Allocate through [`crate::SessionState::next_msg_id`] rather than
    /// calling this directly so the counter stays properly sequenced.
    pub(crate) fn generate(counter: u32) -> Self {
        let unix_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let id = (unix_secs << 32) | (u64::from(counter) << 2);
        Self(id)
    }
}

impl fmt::Display for MsgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

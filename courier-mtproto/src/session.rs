//! Per-session protocol state.

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};

use crate::msg_id::MsgId;

/// Shared per-connection session state.
///
/// Unlike a plain counter struct, `SessionState` is held concurrently by
/// the dispatch layer (which reads key readiness) and by a connection
/// implementation (which allocates identifiers and sequence numbers at
/// write time), so all fields are atomics.
///
/// # Example
///
/// ```rust
/// use courier_mtproto::SessionState;
///
/// let session = SessionState::new();
/// assert!(!session.has_key());
/// let id = session.next_msg_id();
/// assert_eq!(id.0 & 0b11, 0);
/// ```
pub struct SessionState {
    /// Counter feeding message-identifier generation.
    msg_counter: AtomicU32,
    /// The sequence number for the next content-related message.
    /// Even for content-unrelated messages, odd for content-related.
    seq_no: AtomicI32,
    /// Whether a session (temp auth) key exists yet.
    has_key: AtomicBool,
}

impl SessionState {
    /// Create fresh session state with no auth key.
    pub fn new() -> Self {
        Self {
            msg_counter: AtomicU32::new(0),
            seq_no: AtomicI32::new(0),
            has_key: AtomicBool::new(false),
        }
    }

    /// Allocate a new message identifier.
    pub fn next_msg_id(&self) -> MsgId {
        let counter = self.msg_counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        MsgId::generate(counter)
    }

    /// Return the next sequence number.
    ///
    /// Content-related messages get odd numbers and advance the counter
    /// by 2, leaving even slots for content-unrelated messages (acks,
    /// pings, containers), which do not advance it.
    pub fn next_seq_no(&self, content_related: bool) -> i32 {
        if content_related {
            let n = self.seq_no.fetch_add(2, Ordering::Relaxed);
            n | 1
        } else {
            self.seq_no.load(Ordering::Relaxed) & !1
        }
    }

    /// Whether a session key exists.
    ///
    /// Until this returns `true`, only unqualified bootstrap calls may
    /// leave the session unencrypted; everything else must be held back
    /// by the session owner.
    pub fn has_key(&self) -> bool {
        self.has_key.load(Ordering::Acquire)
    }

    /// Record that a session key now exists (or was destroyed).
    ///
    /// Called by the handshake layer, which is outside this crate.
    pub fn set_has_key(&self, present: bool) {
        self.has_key.store(present, Ordering::Release);
        log::debug!("[session] auth key present: {present}");
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

//! The outgoing message store.
//!
//! A session's map from message identifier to the full outgoing record,
//! including container membership. Owned exclusively by the session's
//! dispatcher behind one mutex; every mutation path (submit, recall,
//! acknowledgment, settlement) goes through that boundary.

use std::collections::HashMap;

use courier_mtproto::MsgId;

use crate::errors::DispatchError;
use crate::message::OutgoingMessage;
use crate::reply::{ResponseBody, ResponseSlot};

/// A stored outgoing record: the message plus delivery bookkeeping.
pub struct StoredMessage {
    /// The message as submitted. Its body is dropped on acknowledgment.
    pub message: OutgoingMessage,
    /// Ordered member identifiers, present only on a batch placeholder.
    pub container: Option<Vec<MsgId>>,
    /// Whether the server has acknowledged receipt.
    pub acked: bool,
    /// Whether a response has already been matched to this identifier.
    pub response_seen: bool,
    pub(crate) promise: Option<ResponseSlot>,
}

impl StoredMessage {
    pub(crate) fn new(message: OutgoingMessage, promise: Option<ResponseSlot>) -> Self {
        Self { message, container: None, acked: false, response_seen: false, promise }
    }

    /// Whether the record still holds a resendable body.
    pub fn has_body(&self) -> bool {
        self.message.body.is_some()
    }
}

/// Map from message identifier to outgoing record.
///
/// Tolerant of missing entries: completion and eviction may race with
/// late lookups, so absence is never an error here.
#[derive(Default)]
pub struct OutgoingStore {
    map: HashMap<MsgId, StoredMessage>,
}

impl OutgoingStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a freshly submitted record under its assigned identifier.
    pub(crate) fn insert(&mut self, id: MsgId, record: StoredMessage) {
        self.map.insert(id, record);
    }

    /// Look up a record.
    pub fn get(&self, id: MsgId) -> Option<&StoredMessage> {
        self.map.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: MsgId) -> Option<&mut StoredMessage> {
        self.map.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: MsgId) -> Option<StoredMessage> {
        self.map.remove(&id)
    }

    /// Number of tracked records.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the store tracks no records.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// The identifiers a recall of `id` denotes: the member list if the
    /// record is a container placeholder, otherwise `id` itself.
    pub fn expand(&self, id: MsgId) -> Vec<MsgId> {
        match self.map.get(&id).and_then(|r| r.container.as_ref()) {
            Some(members) => members.clone(),
            None => vec![id],
        }
    }

    /// Register a batch placeholder for messages the transport packed
    /// together.
    pub(crate) fn insert_container(&mut self, id: MsgId, members: Vec<MsgId>) {
        let placeholder = OutgoingMessage {
            name: "msg_container".to_string(),
            body: None,
            kind: crate::message::MsgKind::Object,
            content_related: false,
            unencrypted: false,
            queue: None,
            user_related: false,
        };
        let mut record = StoredMessage::new(placeholder, None);
        record.container = Some(members);
        self.map.insert(id, record);
    }

    /// Mark `id` acknowledged and reclaim its payload. An acknowledged
    /// message can no longer be regenerated byte-for-byte, so a later
    /// recall skips it.
    pub(crate) fn acknowledge(&mut self, id: MsgId) {
        if let Some(record) = self.map.get_mut(&id) {
            record.acked = true;
            record.message.body = None;
        }
    }

    /// Mark that a response has been matched to `id`.
    pub(crate) fn mark_response_seen(&mut self, id: MsgId) {
        if let Some(record) = self.map.get_mut(&id) {
            record.response_seen = true;
        }
    }

    /// Remove a resendable record, yielding its message and promise.
    ///
    /// Returns `None` (leaving the record, if any, untouched) when no
    /// stored body exists: the message already completed, was evicted
    /// on acknowledgment, or was never tracked here.
    pub(crate) fn take_for_resend(
        &mut self,
        id: MsgId,
    ) -> Option<(OutgoingMessage, Option<ResponseSlot>)> {
        if !self.map.get(&id).is_some_and(StoredMessage::has_body) {
            return None;
        }
        let record = self.map.remove(&id)?;
        Some((record.message, record.promise))
    }

    /// Resolve the stored promise for `id` and evict the record.
    ///
    /// Returns `false` if the identifier was unknown (already settled,
    /// superseded by a resend, or never tracked here).
    pub(crate) fn settle(&mut self, id: MsgId, result: Result<ResponseBody, DispatchError>) -> bool {
        match self.map.remove(&id) {
            Some(record) => {
                if let Some(promise) = record.promise {
                    // The receiver may be gone (fire-and-forget callers).
                    let _ = promise.send(result);
                }
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MsgKind;

    fn record(name: &str) -> StoredMessage {
        StoredMessage::new(
            OutgoingMessage {
                name: name.to_string(),
                body: Some(crate::params::Params::new()),
                kind: MsgKind::Object,
                content_related: true,
                unencrypted: false,
                queue: None,
                user_related: false,
            },
            None,
        )
    }

    #[test]
    fn expand_returns_members_for_containers_and_self_otherwise() {
        let mut store = OutgoingStore::new();
        store.insert(MsgId(4), record("a"));
        store.insert_container(MsgId(100), vec![MsgId(4), MsgId(8)]);

        assert_eq!(store.expand(MsgId(100)), vec![MsgId(4), MsgId(8)]);
        assert_eq!(store.expand(MsgId(4)), vec![MsgId(4)]);
        // Unknown ids expand to themselves; the caller handles absence.
        assert_eq!(store.expand(MsgId(999)), vec![MsgId(999)]);
    }

    #[test]
    fn acknowledge_drops_the_body() {
        let mut store = OutgoingStore::new();
        store.insert(MsgId(4), record("a"));
        assert!(store.get(MsgId(4)).is_some_and(|r| r.has_body()));
        store.acknowledge(MsgId(4));
        let r = store.get(MsgId(4)).expect("record kept");
        assert!(r.acked);
        assert!(!r.has_body());
    }

    #[test]
    fn settle_is_idempotent_on_missing_ids() {
        let mut store = OutgoingStore::new();
        assert!(!store.settle(MsgId(4), Ok(vec![])));
        store.insert(MsgId(4), record("a"));
        assert!(store.settle(MsgId(4), Ok(vec![1])));
        assert!(!store.settle(MsgId(4), Ok(vec![1])));
    }
}

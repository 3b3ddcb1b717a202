//! Outgoing message records.

use crate::params::{Params, Value};

/// Whether a message invokes a remote method or carries a bare protocol object.
#[derive(Clone, Debug, PartialEq)]
pub enum MsgKind {
    /// A remote method call; a response of `response_type` is expected.
    Method {
        /// Expected response shape, from the method registry.
        response_type: String,
    },
    /// A protocol object; no RPC response is expected by contract.
    Object,
}

/// One unit of content submitted to the transport.
///
/// Clone-able so the recall engine can regenerate the wire content
/// byte-for-byte from stored state.
#[derive(Clone, Debug)]
pub struct OutgoingMessage {
    /// Method or object name.
    pub name: String,
    /// Structured payload. `None` once evicted (the message can no
    /// longer be resent) and on container placeholders.
    pub body: Option<Params>,
    /// Method call or protocol object.
    pub kind: MsgKind,
    /// Whether this message participates in ack/ordering accounting.
    pub content_related: bool,
    /// True only if no session key exists yet and (for methods) the
    /// name is an unqualified bootstrap name. Never forced true by
    /// queue or routing decisions.
    pub unencrypted: bool,
    /// Logical ordering lane, independent of other lanes.
    pub queue: Option<String>,
    /// Identity-sensitive call, treated specially by downstream bookkeeping.
    pub user_related: bool,
}

impl OutgoingMessage {
    /// Whether this record is a method call.
    pub fn is_method(&self) -> bool {
        matches!(self.kind, MsgKind::Method { .. })
    }
}

/// Secret-chat operations that must stay ordered relative to each other,
/// independently of the general method stream.
pub(crate) const SECRET_QUEUE_METHODS: &[&str] = &[
    "messages.setEncryptedTyping",
    "messages.readEncryptedHistory",
    "messages.sendEncrypted",
    "messages.sendEncryptedFile",
    "messages.sendEncryptedService",
    "messages.receivedQueue",
];

/// The `secret` ordering lane.
pub(crate) const SECRET_QUEUE: &str = "secret";

/// Identity-sensitive calls: self-lookup, authorization export,
/// difference fetch.
pub(crate) fn is_user_related(method: &str, args: &Params) -> bool {
    if method == "auth.exportAuthorization" || method == "updates.getDifference" {
        return true;
    }
    if method != "users.getUsers" {
        return false;
    }
    // Self-lookup only: id == [inputUserSelf]
    match args.get("id") {
        Some(Value::List(items)) => {
            items.len() == 1
                && matches!(
                    &items[0],
                    Value::Map(m) if m.constructor_name() == Some("inputUserSelf") && m.len() == 1
                )
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_lookup_is_user_related() {
        let args = Params::new().with(
            "id",
            vec![Value::Map(Params::constructor("inputUserSelf"))],
        );
        assert!(is_user_related("users.getUsers", &args));
        assert!(is_user_related("auth.exportAuthorization", &Params::new()));
        assert!(is_user_related("updates.getDifference", &Params::new()));
    }

    #[test]
    fn other_lookups_are_not_user_related() {
        let args = Params::new().with(
            "id",
            vec![Value::Map(Params::constructor("inputUser").with("user_id", Value::Long(5)))],
        );
        assert!(!is_user_related("users.getUsers", &args));
        assert!(!is_user_related("messages.sendMessage", &Params::new()));
    }
}

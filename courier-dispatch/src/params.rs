//! Structured dynamic call arguments.
//!
//! Calls flow through this layer before any wire serialization exists,
//! so arguments are modeled as ordered field maps rather than generated
//! request structs. The `_` field names a constructor, as in TL.

use std::collections::BTreeMap;

// ─── Value ────────────────────────────────────────────────────────────────────

/// A single argument value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Boolean flag.
    Bool(bool),
    /// 32-bit integer.
    Int(i32),
    /// 64-bit integer.
    Long(i64),
    /// Raw bytes (already wire-encoded fields land here).
    Bytes(Vec<u8>),
    /// UTF-8 text.
    Text(String),
    /// Ordered list.
    List(Vec<Value>),
    /// Nested constructor / field map.
    Map(Params),
}

impl From<&str> for Value {
    fn from(s: &str) -> Self { Self::Text(s.to_string()) }
}

impl From<String> for Value {
    fn from(s: String) -> Self { Self::Text(s) }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self { Self::Bool(v) }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self { Self::Int(v) }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self { Self::Long(v) }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self { Self::List(v) }
}

impl From<Params> for Value {
    fn from(v: Params) -> Self { Self::Map(v) }
}

// ─── Params ───────────────────────────────────────────────────────────────────

/// An ordered map of argument fields.
///
/// ```rust
/// use courier_dispatch::params::Params;
///
/// let args = Params::new()
///     .with("peer", "@someone")
///     .with("message", "hello");
/// assert_eq!(args.str("message"), Some("hello"));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Params(BTreeMap<String, Value>);

impl Params {
    /// Create an empty field map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a constructor map: `{"_": name}`.
    pub fn constructor(name: &str) -> Self {
        Self::new().with("_", name)
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Insert or replace a field.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Look up a field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Look up a text field.
    pub fn str(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(Value::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// The constructor name, if this map carries one.
    pub fn constructor_name(&self) -> Option<&str> {
        self.str("_")
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Length in characters of a text field, or `None` if absent.
    pub fn text_len(&self, key: &str) -> Option<usize> {
        self.str(key).map(|s| s.chars().count())
    }

    /// If the arguments embed an inline-message identifier bound to a
    /// datacenter, return that datacenter id.
    ///
    /// Matches `{"id": {"_": "inputBotInlineMessageID…", "dc_id": n, …}, …}`.
    pub fn inline_dc(&self) -> Option<i32> {
        let Some(Value::Map(id)) = self.get("id") else { return None };
        let ctor = id.constructor_name()?;
        if !ctor.starts_with("inputBotInlineMessageID") {
            return None;
        }
        match id.get("dc_id") {
            Some(Value::Int(dc)) => Some(*dc),
            _ => None,
        }
    }

    /// Encode a numeric ping identifier to its fixed-width signed
    /// little-endian form, in place.
    ///
    /// A serialization-boundary requirement of the wire format: the
    /// `ping_id` field travels as raw 8 bytes, not as a bare integer.
    pub fn pack_ping_id(&mut self) {
        if let Some(Value::Long(n)) = self.get("ping_id") {
            let bytes = n.to_le_bytes().to_vec();
            self.set("ping_id", Value::Bytes(bytes));
        }
    }
}

// ─── CallArgs ─────────────────────────────────────────────────────────────────

/// Arguments to a dispatched call.
#[derive(Clone, Debug, PartialEq)]
pub enum CallArgs {
    /// One argument set.
    Single(Params),
    /// A fan-out batch: each element is dispatched independently as a
    /// postponed call sharing the method name and options.
    Batch(Vec<Params>),
}

impl From<Params> for CallArgs {
    fn from(p: Params) -> Self { Self::Single(p) }
}

impl From<Vec<Params>> for CallArgs {
    fn from(v: Vec<Params>) -> Self { Self::Batch(v) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_dc_extraction() {
        let args = Params::new().with(
            "id",
            Params::constructor("inputBotInlineMessageID")
                .with("dc_id", 4)
                .with("id", Value::Long(99)),
        );
        assert_eq!(args.inline_dc(), Some(4));

        let other = Params::new().with("id", Params::constructor("inputMessageID").with("dc_id", 4));
        assert_eq!(other.inline_dc(), None);
    }

    #[test]
    fn ping_id_packs_to_signed_le_bytes() {
        let mut args = Params::new().with("ping_id", Value::Long(-2));
        args.pack_ping_id();
        assert_eq!(
            args.get("ping_id"),
            Some(&Value::Bytes((-2i64).to_le_bytes().to_vec()))
        );
    }

    #[test]
    fn text_len_counts_chars_not_bytes() {
        let args = Params::new().with("message", "héllo");
        assert_eq!(args.text_len("message"), Some(5));
    }
}

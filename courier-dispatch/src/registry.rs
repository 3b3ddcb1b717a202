//! Method metadata lookup.

use std::collections::HashMap;

/// Metadata the dispatcher needs about a remote method.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MethodInfo {
    /// The expected response shape.
    pub response_type: String,
}

/// Lookup of method metadata by name.
///
/// A miss is fatal to the call: without the response type the message
/// cannot be tracked.
pub trait MethodRegistry: Send + Sync {
    /// Metadata for `method`, if known.
    fn lookup(&self, method: &str) -> Option<MethodInfo>;
}

/// A plain in-memory method table.
#[derive(Clone, Debug, Default)]
pub struct TableRegistry {
    methods: HashMap<String, MethodInfo>,
}

impl TableRegistry {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration.
    pub fn with_method(mut self, name: &str, response_type: &str) -> Self {
        self.methods.insert(
            name.to_string(),
            MethodInfo { response_type: response_type.to_string() },
        );
        self
    }

    /// Register a method.
    pub fn insert(&mut self, name: &str, response_type: &str) {
        self.methods.insert(
            name.to_string(),
            MethodInfo { response_type: response_type.to_string() },
        );
    }
}

impl MethodRegistry for TableRegistry {
    fn lookup(&self, method: &str) -> Option<MethodInfo> {
        self.methods.get(method).cloned()
    }
}

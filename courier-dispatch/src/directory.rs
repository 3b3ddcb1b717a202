//! Datacenter directory.
//!
//! Resolves a [`DcKey`] to the sibling dispatcher (or connection) that
//! owns it, so cross-datacenter routing is an explicit tail call to
//! another instance rather than recursion on the current one.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, Weak};

use crate::Dispatcher;
use crate::connection::{Connection, DcKey};

/// Resolves datacenter slots to their session dispatchers.
pub trait Directory<C: Connection>: Send + Sync + Sized + 'static {
    /// The dispatcher owning `key`, if one is registered.
    fn dispatcher(&self, key: &DcKey) -> Option<Arc<Dispatcher<C, Self>>>;

    /// The connection behind `key`, if one is registered.
    fn connection(&self, key: &DcKey) -> Option<Arc<C>> {
        self.dispatcher(key).map(|d| Arc::clone(d.connection()))
    }

    /// Whether a dispatcher is registered for `key`. The key carries
    /// the media-variant suffix, so `has(DcKey::media(2))` asks for the
    /// secondary connection of datacenter 2.
    fn has(&self, key: &DcKey) -> bool {
        self.dispatcher(key).is_some()
    }
}

/// A table of per-slot dispatcher registrations.
///
/// Holds weak references so the table (which each dispatcher also
/// holds) does not keep torn-down sessions alive.
pub struct DcTable<C: Connection> {
    slots: RwLock<HashMap<DcKey, Weak<Dispatcher<C, DcTable<C>>>>>,
}

impl<C: Connection> DcTable<C> {
    /// Create an empty table.
    pub fn new() -> Arc<Self> {
        Arc::new(Self { slots: RwLock::new(HashMap::new()) })
    }

    /// Register `dispatcher` under its own datacenter key.
    pub fn register(&self, dispatcher: &Arc<Dispatcher<C, DcTable<C>>>) {
        let key = dispatcher.dc();
        log::debug!("[directory] registering dispatcher for DC {key}");
        self.slots
            .write()
            .expect("directory lock poisoned")
            .insert(key, Arc::downgrade(dispatcher));
    }

    /// Drop the registration for `key`.
    pub fn unregister(&self, key: &DcKey) {
        self.slots.write().expect("directory lock poisoned").remove(key);
    }
}

impl<C: Connection> Directory<C> for DcTable<C> {
    fn dispatcher(&self, key: &DcKey) -> Option<Arc<Dispatcher<C, Self>>> {
        self.slots
            .read()
            .expect("directory lock poisoned")
            .get(key)
            .and_then(Weak::upgrade)
    }
}

//! Shared test doubles: a spy connection and dispatcher builders.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use courier_dispatch::config::{ServerLimits, StaticConfig};
use courier_dispatch::message::OutgoingMessage;
use courier_dispatch::normalize::{Normalizer, PlainNormalizer};
use courier_dispatch::registry::TableRegistry;
use courier_dispatch::{
    Collaborators, Connection, DcKey, DcTable, DispatchError, Dispatcher, MsgId,
};

// ─── SpyConn ──────────────────────────────────────────────────────────────────

/// One recorded submission.
pub struct SentRecord {
    pub id: MsgId,
    pub message: OutgoingMessage,
    pub flush: bool,
}

/// A transport spy: records every send and flush, assigns sequential
/// identifiers, and can be armed to fail from the nth send onward.
pub struct SpyConn {
    next_id: AtomicU64,
    pub sends: Mutex<Vec<SentRecord>>,
    pub flushes: AtomicUsize,
    fail_from: AtomicUsize,
}

impl SpyConn {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicU64::new(4),
            sends: Mutex::new(Vec::new()),
            flushes: AtomicUsize::new(0),
            fail_from: AtomicUsize::new(usize::MAX),
        })
    }

    /// Fail every send once `n` sends have been recorded.
    pub fn fail_from(&self, n: usize) {
        self.fail_from.store(n, Ordering::Relaxed);
    }

    pub fn send_count(&self) -> usize {
        self.sends.lock().unwrap().len()
    }

    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::Relaxed)
    }

    /// The identifier assigned to the `i`th send.
    pub fn sent_id(&self, i: usize) -> MsgId {
        self.sends.lock().unwrap()[i].id
    }

    pub fn with_send<R>(&self, i: usize, f: impl FnOnce(&SentRecord) -> R) -> R {
        f(&self.sends.lock().unwrap()[i])
    }
}

impl Connection for SpyConn {
    async fn send(&self, message: OutgoingMessage, flush: bool) -> Result<MsgId, DispatchError> {
        let mut sends = self.sends.lock().unwrap();
        if sends.len() >= self.fail_from.load(Ordering::Relaxed) {
            return Err(DispatchError::Io(std::io::Error::other("spy transport failure")));
        }
        let id = MsgId(self.next_id.fetch_add(4, Ordering::Relaxed));
        sends.push(SentRecord { id, message, flush });
        Ok(id)
    }

    async fn flush(&self) -> Result<(), DispatchError> {
        self.flushes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

// ─── Builders ─────────────────────────────────────────────────────────────────

pub type TestDispatcher = Arc<Dispatcher<SpyConn, DcTable<SpyConn>>>;

/// A registry covering every method the tests invoke.
pub fn full_registry() -> TableRegistry {
    TableRegistry::new()
        .with_method("messages.sendMessage", "Updates")
        .with_method("messages.sendEncrypted", "messages.SentEncryptedMessage")
        .with_method("messages.editInlineBotMessage", "Bool")
        .with_method("users.getUsers", "Vector<User>")
        .with_method("auth.sendCode", "auth.SentCode")
        .with_method("auth.exportAuthorization", "auth.ExportedAuthorization")
        .with_method("updates.getDifference", "updates.Difference")
        .with_method("upload.saveFilePart", "Bool")
        .with_method("req_pq_multi", "ResPQ")
        .with_method("ping_delay_disconnect", "Pong")
}

pub fn collaborators_with(max_text: usize, normalizer: Arc<dyn Normalizer>) -> Collaborators {
    Collaborators {
        config: Arc::new(StaticConfig::new(ServerLimits {
            message_length_max: max_text,
            caption_length_max: max_text,
        })),
        normalizer,
        registry: Arc::new(full_registry()),
        ..Collaborators::default()
    }
}

pub fn plain_collaborators(max_text: usize) -> Collaborators {
    collaborators_with(max_text, Arc::new(PlainNormalizer))
}

/// Build a dispatcher on `dc` with its own spy connection and register
/// it with `table`.
pub fn dispatcher_on(
    table: &Arc<DcTable<SpyConn>>,
    dc: DcKey,
    collaborators: Collaborators,
) -> (TestDispatcher, Arc<SpyConn>) {
    let conn = SpyConn::new();
    let dispatcher = Dispatcher::new(dc, conn.clone(), table.clone(), collaborators);
    table.register(&dispatcher);
    (dispatcher, conn)
}

/// Poll `cond` until it holds or a short deadline passes.
pub async fn eventually(mut cond: impl FnMut() -> bool) {
    for _ in 0..200 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("condition not met in time");
}

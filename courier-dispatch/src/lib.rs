//! # courier-dispatch
//!
//! The call-dispatch and session layer of an MTProto-style RPC client:
//! turns a logical "invoke remote method / send protocol object" request
//! into correctly-framed, correctly-routed, correctly-queued outgoing
//! messages, and resolves the eventual server response back to the
//! caller.
//!
//! ## Features
//! - Encryption-readiness gating: only unqualified bootstrap calls are
//!   flagged for unencrypted send before a session key exists
//! - Multi-datacenter routing: inline-message calls and file-bearing
//!   calls are silently forwarded to the right sibling dispatcher
//! - Oversized payloads losslessly split into an ordered chunk batch
//! - Fan-out batches with ordered, fail-fast aggregate responses
//! - Recall/resend from stored state, with container expansion and
//!   cross-datacenter overrides
//! - Explicit write-resume / check-resume wake conditions
//!
//! Transport framing, encryption, serialization and datacenter
//! discovery live behind the [`Connection`] and [`Directory`] seams.

#![deny(unsafe_code)]

pub mod config;
pub mod connection;
pub mod directory;
mod errors;
pub mod message;
pub mod normalize;
pub mod options;
pub mod params;
mod recall;
pub mod registry;
pub mod reply;
pub mod signal;
pub mod store;

pub use connection::{Connection, DcKey};
pub use directory::{DcTable, Directory};
pub use errors::{DispatchError, RpcError};
pub use options::{CallOptions, ObjectOptions, RecallOptions};
pub use params::{CallArgs, Params, Value};
pub use reply::{PendingResponse, Reply, Response, ResponseBody, ResponseSlot};
pub use signal::ResumeSignal;

pub use courier_mtproto::{MsgId, SessionState, content_related};

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::Mutex;

use config::{ConfigProvider, StaticConfig};
use message::{MsgKind, OutgoingMessage, SECRET_QUEUE, SECRET_QUEUE_METHODS, is_user_related};
use normalize::{MarkdownNormalizer, Normalizer};
use registry::{MethodRegistry, TableRegistry};
use store::{OutgoingStore, StoredMessage};

/// Boxed future alias used by the object-safe collaborator traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The text field chunking and normalization operate on.
const TEXT_FIELD: &str = "message";

// ─── Collaborators ────────────────────────────────────────────────────────────

/// The pluggable collaborators a session dispatcher consults.
pub struct Collaborators {
    /// Server-advertised limits (suspension point).
    pub config: Arc<dyn ConfigProvider>,
    /// Markup normalization and chunk splitting (suspension points).
    pub normalizer: Arc<dyn Normalizer>,
    /// Method metadata lookup.
    pub registry: Arc<dyn MethodRegistry>,
    /// Shared wire-session state (key readiness).
    pub session: Arc<SessionState>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            config: Arc::new(StaticConfig::default()),
            normalizer: Arc::new(MarkdownNormalizer),
            registry: Arc::new(TableRegistry::new()),
            session: Arc::new(SessionState::new()),
        }
    }
}

// ─── Dispatcher ───────────────────────────────────────────────────────────────

/// One session's call dispatcher.
///
/// One instance exists per connection slot (datacenter, plus media
/// variants), each owning its outgoing message store exclusively. Every
/// store mutation path (submission, recall, acknowledgment, settlement)
/// goes through this type's single mutex boundary.
///
/// Within one queue name, messages are submitted to the connection in
/// the order this dispatcher processed them; across distinct queue
/// names no ordering is guaranteed.
pub struct Dispatcher<C: Connection, D: Directory<C>> {
    dc: DcKey,
    conn: Arc<C>,
    directory: Arc<D>,
    config: Arc<dyn ConfigProvider>,
    normalizer: Arc<dyn Normalizer>,
    registry: Arc<dyn MethodRegistry>,
    session: Arc<SessionState>,
    pub(crate) store: Mutex<OutgoingStore>,
    writer: ResumeSignal,
    checker: ResumeSignal,
}

impl<C: Connection, D: Directory<C>> Dispatcher<C, D> {
    /// Create a dispatcher for the connection slot `dc`.
    ///
    /// The caller registers the returned instance with its directory so
    /// sibling sessions can route to it.
    pub fn new(dc: DcKey, conn: Arc<C>, directory: Arc<D>, collaborators: Collaborators) -> Arc<Self> {
        Arc::new(Self {
            dc,
            conn,
            directory,
            config: collaborators.config,
            normalizer: collaborators.normalizer,
            registry: collaborators.registry,
            session: collaborators.session,
            store: Mutex::new(OutgoingStore::new()),
            writer: ResumeSignal::new(),
            checker: ResumeSignal::new(),
        })
    }

    /// The connection slot this dispatcher owns.
    pub fn dc(&self) -> DcKey {
        self.dc
    }

    /// The connection this dispatcher submits to.
    pub fn connection(&self) -> &Arc<C> {
        &self.conn
    }

    /// The directory used for cross-datacenter routing.
    pub fn directory(&self) -> &Arc<D> {
        &self.directory
    }

    /// The shared wire-session state.
    pub fn session(&self) -> &Arc<SessionState> {
        &self.session
    }

    /// The write-resume signal, raised after a batch of postponed sends
    /// finishes enqueuing. Consumed by [`Dispatcher::drive_writer`].
    pub fn writer_signal(&self) -> &ResumeSignal {
        &self.writer
    }

    /// The check-resume signal, raised after any single non-batched
    /// send. Consumed by the external ack/response tracker.
    pub fn checker_signal(&self) -> &ResumeSignal {
        &self.checker
    }

    // ── Dispatch ───────────────────────────────────────────────────────────

    /// Build and enqueue a remote-method call.
    ///
    /// Routing is evaluated in fixed order before any message is built:
    /// inline-message datacenter delegation, media-connection
    /// delegation, secret-queue tagging. Fan-out batches and oversized
    /// texts expand into postponed element calls followed by one shared
    /// write-resume.
    pub async fn dispatch_method(
        &self,
        method: &str,
        args: CallArgs,
        opts: CallOptions,
    ) -> Result<Reply, DispatchError> {
        // Inline-message calls belong to the datacenter that issued the
        // identifier; forward the whole call there.
        if let CallArgs::Single(params) = &args {
            if let Some(dc) = params.inline_dc() {
                if dc != self.dc.id {
                    return self.forward_to(DcKey::main(dc), method, args, opts).await;
                }
            }
        }

        // Keep large-payload traffic off the control channel.
        if opts.file && !self.dc.media && self.directory.has(&DcKey::media(self.dc.id)) {
            log::info!("[dispatch] using media connection for {method}");
            return self.forward_to(DcKey::media(self.dc.id), method, args, opts).await;
        }

        let mut opts = opts;
        if SECRET_QUEUE_METHODS.contains(&method) {
            opts.queue = Some(SECRET_QUEUE.to_string());
        }

        let params = match args {
            CallArgs::Batch(elements) => {
                opts.multiple = true;
                return self.dispatch_batch(method, elements, opts).await;
            }
            CallArgs::Single(params) => params,
        };

        // Oversized text becomes an ordered chunk batch on its own
        // lane. Length is measured raw first, then after normalization,
        // so markup that collapses under the limit is not split.
        if let Some(raw_len) = params.text_len(TEXT_FIELD) {
            let limits = self.config.current().await?;
            let max = limits.message_length_max;
            if raw_len > max {
                let normalized = self.normalizer.normalize(params.clone()).await?;
                if normalized.text_len(TEXT_FIELD).is_some_and(|len| len > max) {
                    let chunks = self.normalizer.split(params, max).await?;
                    for chunk in &chunks {
                        if let Some(len) = chunk.text_len(TEXT_FIELD) {
                            if len > max {
                                // No partial chunk is sent.
                                return Err(DispatchError::Oversized { len, max });
                            }
                        }
                    }
                    opts.queue = Some(method.to_string());
                    opts.multiple = true;
                    return self.dispatch_batch(method, chunks, opts).await;
                }
            }
        }

        self.assemble_and_send(method, params, opts).await
    }

    /// Build and enqueue a non-method protocol object.
    ///
    /// No RPC response is expected by contract; the returned identifier
    /// is the write acknowledgement. A caller-supplied promise from
    /// [`ObjectOptions::promise`] is attached to the stored record.
    pub async fn dispatch_object(
        &self,
        object: &str,
        args: Params,
        opts: ObjectOptions,
    ) -> Result<MsgId, DispatchError> {
        let message = OutgoingMessage {
            name: object.to_string(),
            body: Some(args),
            kind: MsgKind::Object,
            content_related: content_related(object),
            unencrypted: !self.session.has_key(),
            queue: opts.queue.clone(),
            user_related: false,
        };

        let msg_id = self.conn.send(message.clone(), !opts.postpone).await?;
        self.store
            .lock()
            .await
            .insert(msg_id, StoredMessage::new(message, opts.promise));
        Ok(msg_id)
    }

    /// Dispatch a method and wait for its (aggregate) response.
    ///
    /// With [`CallOptions::no_response`] set this resolves to
    /// [`Response::Ack`] immediately; submission still happens.
    pub async fn call(
        &self,
        method: &str,
        args: impl Into<CallArgs>,
        opts: CallOptions,
    ) -> Result<Response, DispatchError> {
        self.dispatch_method(method, args.into(), opts).await?.wait().await
    }

    // ── Internals ──────────────────────────────────────────────────────────

    /// Type-erased recursion point: cross-datacenter delegation and
    /// fan-out elements re-enter `dispatch_method` through this box.
    fn dispatch_method_boxed<'a>(
        &'a self,
        method: &'a str,
        args: CallArgs,
        opts: CallOptions,
    ) -> Pin<Box<dyn Future<Output = Result<Reply, DispatchError>> + Send + 'a>> {
        Box::pin(self.dispatch_method(method, args, opts))
    }

    /// Forward the whole call to the dispatcher owning `key`.
    ///
    /// Delegation cannot loop: the destination's own slot differs from
    /// this one, and a directory that hands back the current session is
    /// a hard routing error.
    async fn forward_to(
        &self,
        key: DcKey,
        method: &str,
        args: CallArgs,
        opts: CallOptions,
    ) -> Result<Reply, DispatchError> {
        let target = self
            .directory
            .dispatcher(&key)
            .ok_or_else(|| DispatchError::Routing(format!("no dispatcher for DC {key}")))?;
        if target.dc() == self.dc {
            return Err(DispatchError::Routing(format!(
                "directory resolved DC {key} back to the current session (DC {})",
                self.dc
            )));
        }
        log::debug!("[dispatch] forwarding {method} from DC {} to DC {key}", self.dc);
        target.dispatch_method_boxed(method, args, opts).await
    }

    /// Submit each element as a postponed call, then raise one shared
    /// write-resume (unless the caller requested deferral).
    async fn dispatch_batch(
        &self,
        method: &str,
        elements: Vec<Params>,
        opts: CallOptions,
    ) -> Result<Reply, DispatchError> {
        let element_opts = opts.fanout_element();
        let mut pending = Vec::with_capacity(elements.len());
        for element in elements {
            // Abandoned fan-outs stop spawning further elements;
            // already-submitted ones are not retracted.
            if opts.cancel.is_cancelled() {
                return Err(DispatchError::Cancelled);
            }
            let reply = self
                .dispatch_method_boxed(method, CallArgs::Single(element), element_opts.clone())
                .await?;
            pending.extend(reply.into_pending());
        }
        if !opts.postpone {
            self.writer.resume();
        }
        Ok(if opts.no_response { Reply::Ack } else { Reply::Batch(pending) })
    }

    /// Merge computed fields into the record, store it under the
    /// send-assigned identifier, and arm response tracking.
    async fn assemble_and_send(
        &self,
        method: &str,
        params: Params,
        opts: CallOptions,
    ) -> Result<Reply, DispatchError> {
        let info = self
            .registry
            .lookup(method)
            .ok_or_else(|| DispatchError::UnknownMethod(method.to_string()))?;

        let mut body = self.normalizer.normalize(params).await?;
        body.pack_ping_id();

        // Pure function of key presence and method name; routing and
        // queue decisions never feed into it.
        let unencrypted = !self.session.has_key() && !method.contains('.');

        let message = OutgoingMessage {
            name: method.to_string(),
            user_related: is_user_related(method, &body),
            body: Some(body),
            kind: MsgKind::Method { response_type: info.response_type },
            content_related: content_related(method),
            unencrypted,
            queue: opts.queue.clone(),
        };

        let (slot, pending) = PendingResponse::channel();
        let msg_id = self.conn.send(message.clone(), !opts.postpone).await?;
        self.store
            .lock()
            .await
            .insert(msg_id, StoredMessage::new(message, Some(slot)));
        self.checker.resume();

        Ok(if opts.no_response { Reply::Ack } else { Reply::Single(pending) })
    }

    // ── Writer pump ────────────────────────────────────────────────────────

    /// The session's writer pump: waits on the write-resume signal and
    /// drains the connection's outgoing queue. Spawn exactly one per
    /// dispatcher.
    pub async fn drive_writer(&self) {
        loop {
            self.writer.resumed().await;
            if let Err(e) = self.conn.flush().await {
                log::warn!("[dispatch] flush failed on DC {}: {e}", self.dc);
            }
        }
    }

    // ── Store maintenance (transport / response-matcher facing) ────────────

    /// Record that the transport packed `members` into one container
    /// sent under `container_id`.
    pub async fn register_container(&self, container_id: MsgId, members: Vec<MsgId>) {
        self.store.lock().await.insert_container(container_id, members);
    }

    /// Mark `id` acknowledged and reclaim its payload.
    pub async fn acknowledge(&self, id: MsgId) {
        self.store.lock().await.acknowledge(id);
    }

    /// Mark that a response has been matched to `id`.
    pub async fn mark_response_seen(&self, id: MsgId) {
        self.store.lock().await.mark_response_seen(id);
    }

    /// Resolve the stored promise for `id` with `result` and evict the
    /// record. Returns `false` if the identifier was unknown.
    pub async fn settle(&self, id: MsgId, result: Result<ResponseBody, DispatchError>) -> bool {
        self.store.lock().await.settle(id, result)
    }

    /// Run a read-only closure against the outgoing store.
    pub async fn with_store<R>(&self, f: impl FnOnce(&OutgoingStore) -> R) -> R {
        let store = self.store.lock().await;
        f(&store)
    }
}

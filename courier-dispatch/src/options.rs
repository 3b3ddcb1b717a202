//! Typed call options.

use tokio_util::sync::CancellationToken;

use crate::reply::ResponseSlot;

/// Options recognized by [`crate::Dispatcher::dispatch_method`].
#[derive(Clone, Debug)]
pub struct CallOptions {
    /// Treat the arguments as a fan-out batch. Set implicitly when
    /// [`crate::params::CallArgs::Batch`] is passed, and internally by
    /// the chunking path.
    pub multiple: bool,
    /// Enqueue without forcing the message onto the wire; the caller
    /// (or a later write-resume) triggers the flush.
    pub postpone: bool,
    /// Logical ordering lane.
    pub queue: Option<String>,
    /// Do not wait for the decoded response: the caller receives an
    /// already-resolved acknowledgement, while submission still happens.
    pub no_response: bool,
    /// File-bearing call; eligible for the media connection.
    pub file: bool,
    /// Abandoning a fan-out cancels this token's children before each
    /// element submission; elements already submitted are not retracted.
    pub cancel: CancellationToken,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            multiple: false,
            postpone: false,
            queue: None,
            no_response: false,
            file: false,
            cancel: CancellationToken::new(),
        }
    }
}

impl CallOptions {
    /// Options for one element of a fan-out batch: postponed, not
    /// itself a batch, never swallowing the response handle.
    pub(crate) fn fanout_element(&self) -> Self {
        Self {
            multiple: false,
            postpone: true,
            queue: self.queue.clone(),
            no_response: false,
            file: self.file,
            cancel: self.cancel.clone(),
        }
    }
}

/// Options recognized by [`crate::Dispatcher::dispatch_object`].
#[derive(Debug, Default)]
pub struct ObjectOptions {
    /// Enqueue without forcing the message onto the wire.
    pub postpone: bool,
    /// Logical ordering lane.
    pub queue: Option<String>,
    /// Caller-supplied promise to attach to the record. No RPC response
    /// is expected by contract, but the transport may still resolve it.
    pub promise: Option<ResponseSlot>,
}

/// Options recognized by [`crate::Dispatcher::recall`].
#[derive(Clone, Debug, Default)]
pub struct RecallOptions {
    /// Re-enqueue without flushing; a later flush picks the batch up.
    pub postpone: bool,
    /// Resend through this datacenter's connection instead of the
    /// session's own. An override equal to the session's datacenter is
    /// ignored.
    pub datacenter: Option<i32>,
}

//! Caller-visible response handles.

use tokio::sync::oneshot;
use tokio::task::JoinSet;

use crate::errors::DispatchError;

/// Raw response payload, as delivered by the response matcher.
pub type ResponseBody = Vec<u8>;

/// The sending half of a stored promise; resolved by the transport's
/// response matcher via [`crate::Dispatcher::settle`].
pub type ResponseSlot = oneshot::Sender<Result<ResponseBody, DispatchError>>;

/// A pending response to a single submitted message.
#[derive(Debug)]
pub struct PendingResponse {
    rx: oneshot::Receiver<Result<ResponseBody, DispatchError>>,
}

impl PendingResponse {
    /// Create a linked (slot, pending) pair.
    pub(crate) fn channel() -> (ResponseSlot, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }

    /// Wait for the response.
    pub async fn wait(self) -> Result<ResponseBody, DispatchError> {
        match self.rx.await {
            Ok(result) => result,
            Err(_) => Err(DispatchError::Dropped),
        }
    }
}

/// What a dispatch call hands back to the caller.
#[derive(Debug)]
pub enum Reply {
    /// Fire-and-forget: the caller opted out of waiting for a response.
    Ack,
    /// One pending response.
    Single(PendingResponse),
    /// Ordered pending responses of a fan-out batch.
    Batch(Vec<PendingResponse>),
}

/// A resolved [`Reply`].
#[derive(Debug, PartialEq)]
pub enum Response {
    /// The write acknowledgement of a fire-and-forget call.
    Ack,
    /// A single decoded response payload.
    Body(ResponseBody),
    /// Per-element payloads of a fan-out batch, in input order.
    Batch(Vec<ResponseBody>),
}

impl Reply {
    /// Wait for resolution.
    ///
    /// A batch preserves caller-supplied element order in the result
    /// regardless of completion order, and fails as soon as any element
    /// fails. Must be awaited within a Tokio runtime.
    pub async fn wait(self) -> Result<Response, DispatchError> {
        match self {
            Self::Ack => Ok(Response::Ack),
            Self::Single(pending) => pending.wait().await.map(Response::Body),
            Self::Batch(pendings) => {
                let count = pendings.len();
                let mut set = JoinSet::new();
                for (index, pending) in pendings.into_iter().enumerate() {
                    set.spawn(async move { (index, pending.wait().await) });
                }
                let mut slots: Vec<Option<ResponseBody>> = (0..count).map(|_| None).collect();
                while let Some(joined) = set.join_next().await {
                    let (index, result) = joined.map_err(|_| DispatchError::Dropped)?;
                    slots[index] = Some(result?);
                }
                let mut ordered = Vec::with_capacity(count);
                for slot in slots {
                    ordered.push(slot.ok_or(DispatchError::Dropped)?);
                }
                Ok(Response::Batch(ordered))
            }
        }
    }

    /// The pending handles of this reply, in order. Empty for [`Reply::Ack`].
    pub fn into_pending(self) -> Vec<PendingResponse> {
        match self {
            Self::Ack => Vec::new(),
            Self::Single(p) => vec![p],
            Self::Batch(v) => v,
        }
    }
}

//! The connection seam.

use std::fmt;
use std::future::Future;

use courier_mtproto::MsgId;

use crate::errors::DispatchError;
use crate::message::OutgoingMessage;

/// Identifies one logical connection slot: a datacenter plus its
/// optional media variant.
///
/// Displays as the original string keys: `"2"`, `"2_media"`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DcKey {
    /// Datacenter identifier.
    pub id: i32,
    /// Whether this is the secondary (media) connection.
    pub media: bool,
}

impl DcKey {
    /// The main connection slot of `id`.
    pub fn main(id: i32) -> Self {
        Self { id, media: false }
    }

    /// The media connection slot of `id`.
    pub fn media(id: i32) -> Self {
        Self { id, media: true }
    }
}

impl fmt::Display for DcKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.media {
            write!(f, "{}_media", self.id)
        } else {
            write!(f, "{}", self.id)
        }
    }
}

/// A transport-level connection, as the dispatch layer sees it.
///
/// Framing, encryption and socket I/O live behind this seam. The
/// implementation assigns the message identifier at actual send time,
/// may batch when `flush` is false, and forces queued messages onto the
/// wire on [`Connection::flush`].
pub trait Connection: Send + Sync + 'static {
    /// Queue `message`; force it onto the wire when `flush` is true.
    /// Returns the identifier assigned to the message.
    fn send(
        &self,
        message: OutgoingMessage,
        flush: bool,
    ) -> impl Future<Output = Result<MsgId, DispatchError>> + Send;

    /// Force all queued messages onto the wire.
    fn flush(&self) -> impl Future<Output = Result<(), DispatchError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dc_keys_display_like_directory_keys() {
        assert_eq!(DcKey::main(2).to_string(), "2");
        assert_eq!(DcKey::media(2).to_string(), "2_media");
        assert_ne!(DcKey::main(2), DcKey::media(2));
    }
}

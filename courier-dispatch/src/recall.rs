//! The recall/resend engine.
//!
//! Invoked externally by an ack-timeout or NAK handler when delivery of
//! a previously submitted message is in doubt. Regenerates the denoted
//! message(s) byte-for-byte from stored state and re-queues them,
//! across datacenters if instructed.

use crate::connection::{Connection, DcKey};
use crate::directory::Directory;
use crate::errors::DispatchError;
use crate::options::RecallOptions;
use crate::store::StoredMessage;
use crate::{Dispatcher, MsgId};

impl<C: Connection, D: Directory<C>> Dispatcher<C, D> {
    /// Resend the message(s) denoted by `message_id`.
    ///
    /// A container placeholder expands to its members. Identifiers
    /// without a stored body are logged and skipped — they already
    /// completed or were superseded, so their absence is not an error.
    /// Each resent message gets a fresh identifier and record; the old
    /// identifier's bookkeeping is dropped so a stale response cannot
    /// be mis-attributed, and the caller's promise migrates to the new
    /// record.
    ///
    /// Unless postponed, the target connection is flushed at the end:
    /// the override datacenter's if one was given, the session's own
    /// otherwise.
    pub async fn recall(&self, message_id: MsgId, opts: RecallOptions) -> Result<(), DispatchError> {
        // An override naming this session's own datacenter is no override.
        let datacenter = opts.datacenter.filter(|dc| *dc != self.dc().id);
        let target = match datacenter {
            Some(dc) => {
                let key = DcKey::main(dc);
                let conn = self.directory().connection(&key).ok_or_else(|| {
                    DispatchError::Routing(format!("no connection for DC {key}"))
                })?;
                Some(conn)
            }
            None => None,
        };

        let ids = self.store.lock().await.expand(message_id);

        for id in ids {
            let taken = {
                let mut store = self.store.lock().await;
                match store.take_for_resend(id) {
                    Some(taken) => Some(taken),
                    None => {
                        let label = store
                            .get(id)
                            .map(|record| record.message.name.clone())
                            .unwrap_or_else(|| id.to_string());
                        log::warn!("[dispatch] could not resend {label}");
                        None
                    }
                }
            };

            let Some((message, promise)) = taken else { continue };

            let sent = match &target {
                Some(conn) => conn.send(message.clone(), false).await,
                None => self.connection().send(message.clone(), false).await,
            };

            match sent {
                Ok(new_id) => {
                    // Fresh record: ack pending, no response seen.
                    self.store
                        .lock()
                        .await
                        .insert(new_id, StoredMessage::new(message, promise));
                }
                Err(e) => {
                    // Keep the caller's promise alive under the old
                    // identifier so a later recall can retry.
                    self.store
                        .lock()
                        .await
                        .insert(id, StoredMessage::new(message, promise));
                    return Err(e);
                }
            }
        }

        if !opts.postpone {
            match &target {
                Some(conn) => conn.flush().await?,
                None => self.connection().flush().await?,
            }
        }
        Ok(())
    }
}

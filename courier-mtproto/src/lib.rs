//! MTProto-style wire-session state.
//!
//! This crate owns the small amount of per-session protocol state the
//! dispatch layer and a connection implementation share:
//! * Message identifier allocation (clock-derived, counter-sequenced)
//! * Sequence-number accounting (odd for content-related messages)
//! * Auth-key readiness (whether encrypted sends are possible yet)
//! * Content-related classification of protocol constructors
//!
//! It is intentionally transport- and crypto-agnostic: framing and
//! encryption live behind the connection seam.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod content;
pub mod msg_id;
pub mod session;

pub use content::content_related;
pub use msg_id::MsgId;
pub use session::SessionState;

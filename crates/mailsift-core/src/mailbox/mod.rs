//! Gmail mailbox access.
//!
//! [`GmailClient`] speaks the REST API with a caller-supplied access token.
//! [`Mailbox`] ties it to a session: it obtains a fresh token, lists the
//! inbox, fetches every listed message concurrently and decodes each one.

mod decode;
mod gmail;
mod service;

pub use decode::{DecodedMessage, decode_message};
pub use gmail::{
    DEFAULT_LABEL, DEFAULT_MAX_RESULTS, GMAIL_API_BASE, GmailClient, LabelChange, LabeledMessage,
    ListQuery, MessageList, MessageRef, Profile, RawMessage,
};
pub use service::{BatchItem, InboxPage, Mailbox};

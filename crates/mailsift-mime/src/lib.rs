//! # mailsift-mime
//!
//! Turns mailbox API message payloads into plain text.
//!
//! ## Features
//!
//! - **Payload decoding**: depth-first search of arbitrarily nested MIME
//!   trees, preferring `text/plain` over `text/html`
//! - **Transfer decoding**: standard and URL-safe Base64, with or without padding
//! - **Header decoding**: RFC 2047 encoded words (B and Q) and HTML entities
//! - **HTML stripping**: lossy tag removal and whitespace collapsing
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailsift_mime::{MessagePart, extract_body_text, decode_header_text};
//!
//! let payload: MessagePart = serde_json::from_str(raw_json)?;
//! let headers = payload.headers();
//!
//! println!("Subject: {}", headers.get_decoded("Subject"));
//! println!("{}", extract_body_text(&payload));
//!
//! assert_eq!(decode_header_text("=?UTF-8?Q?Hi_there?="), "Hi there");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod content_type;
mod error;
mod header;

pub mod encoding;
pub mod html;
pub mod payload;

pub use content_type::ContentType;
pub use encoding::{
    decode_base64url_lossy, decode_base64url_text, decode_encoded_words, decode_text_lossy,
};
pub use error::{Error, Result};
pub use header::{HeaderField, Headers, decode_header_text};
pub use html::{decode_html_entities, strip_tags};
pub use payload::{MessagePart, PartBody, PartNode, extract_body_text};

//! # mailsift-core
//!
//! Session and mailbox services for Mailsift.
//!
//! This crate provides:
//! - **Sessions** - random session ids and token record storage
//! - **Login lifecycle** - authorization redirect, callback validation,
//!   single-flight token refresh and logout
//! - **Cookies** - `Set-Cookie` values for the login round trip
//! - **Mailbox** - Gmail listing, concurrent message fetch and decoding
//! - **Configuration** - environment-driven settings
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use mailsift_core::{Config, InMemoryTokenStore, Mailbox, TokenManager};
//!
//! let config = Config::from_env()?;
//! let tokens = Arc::new(TokenManager::new(
//!     config.oauth_client()?,
//!     Arc::new(InMemoryTokenStore::new()),
//! ));
//! let login = tokens.begin_login()?;
//! // send the user to login.url, then on the callback:
//! let session = tokens.complete_callback(&params, Some(login.state.as_str()), Some(login.pkce.verifier())).await?;
//! let mailbox = Mailbox::new(Arc::clone(&tokens), config.gmail_client()?);
//! let page = mailbox.inbox(&session, &config.list_query()).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod auth;
pub mod config;
mod error;
pub mod mailbox;
pub mod session;

pub use auth::{CallbackParams, CookieSpec, LoginRequest, TokenManager};
pub use config::Config;
pub use error::{Error, Result};
pub use mailbox::{
    BatchItem, DecodedMessage, GmailClient, InboxPage, LabelChange, LabeledMessage, ListQuery,
    Mailbox, Profile, RawMessage, decode_message,
};
pub use session::{InMemoryTokenStore, SessionId, TokenStore};

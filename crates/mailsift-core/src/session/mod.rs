//! Session identity and token storage.
//!
//! A session is an opaque random id handed to the user agent in a cookie.
//! The token record lives server side, keyed by that id.

mod model;
mod store;

pub use model::SessionId;
pub use store::{InMemoryTokenStore, TokenStore};

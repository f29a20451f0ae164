//! Login lifecycle: authorization redirect, callback validation, token
//! refresh and logout.

mod callback;
pub mod cookies;
mod manager;

pub use callback::{CallbackParams, LoginRequest};
pub use cookies::CookieSpec;
pub use manager::TokenManager;

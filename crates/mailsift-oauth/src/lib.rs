//! # mailsift-oauth
//!
//! `OAuth2` authorization code flow with PKCE for mail providers.
//!
//! ## Features
//!
//! - **PKCE**: CSPRNG verifiers and S256 challenges (RFC 7636)
//! - **Authorization URLs**: deterministic query construction
//! - **Token endpoint**: code exchange and refresh grants
//! - **Token bookkeeping**: stored records with a 60 second expiry buffer
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailsift_oauth::{AuthorizationRequest, OAuthClient, PkceChallenge, Provider, random_hex};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OAuthClient::new("your_client_id", Provider::google()?)
//!         .with_client_secret("your_secret")
//!         .with_redirect_uri("http://localhost:5173/auth/callback");
//!
//!     let pkce = PkceChallenge::generate()?;
//!     let state = random_hex(16)?;
//!     let url = client.authorization_url(&AuthorizationRequest::new(&state, pkce.challenge()))?;
//!     println!("Visit: {url}");
//!
//!     // After the redirect comes back with ?code=...&state=...
//!     let grant = client.exchange_code("code_from_redirect", pkce.verifier()).await?;
//!     println!("Access token expires in {}s", grant.expires_in);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
pub mod flow;
pub mod provider;
pub mod token;

pub use error::{Error, Result};
pub use flow::{
    AccessType, AuthorizationRequest, OAuthClient, PkceChallenge, challenge_from_verifier,
    random_hex, random_verifier,
};
pub use provider::Provider;
pub use token::{TokenGrant, TokenRecord};

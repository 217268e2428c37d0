//! OAuth2 Authorization Code + PKCE client pieces.
//!
//! - [`pkce`] - verifier/challenge/state/nonce generation
//! - [`authorize`] - authorization redirect URL assembly
//! - [`token`] - one-shot code-for-token exchange
//! - [`userinfo`] - claim resolution from an access token

pub mod authorize;
pub mod pkce;
pub mod token;
pub mod userinfo;

pub use authorize::AuthorizationUrlBuilder;
pub use pkce::{PkceChallenge, PkceError, PkceMaterial, PkceVerifier, RandomToken};
pub use token::{TokenClient, TokenResponse};
pub use userinfo::{UserInfoClient, UserProfile};

//! PKCE (Proof Key for Code Exchange) material.
//!
//! Implements RFC 7636 with the S256 method only. One [`PkceMaterial`] is
//! generated per authorization attempt; the verifier and state are held
//! server-side in the session until the callback arrives and are single-use.
//!
//! # Example
//!
//! ```
//! use bancroft_auth::oauth::{PkceChallenge, PkceMaterial};
//!
//! let material = PkceMaterial::generate();
//! let challenge = PkceChallenge::from_verifier(&material.verifier);
//! assert_eq!(challenge, material.challenge);
//! ```

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Errors that can occur validating PKCE values.
#[derive(Debug, thiserror::Error)]
pub enum PkceError {
    /// Verifier length is outside the valid range (43-128 characters).
    #[error("Invalid verifier length: must be 43-128 characters, got {0}")]
    InvalidVerifierLength(usize),

    /// Verifier contains invalid characters.
    #[error("Invalid verifier characters: must be URL-safe base64 ([A-Za-z0-9-._~])")]
    InvalidVerifierCharacters,
}

// =============================================================================
// PKCE Verifier
// =============================================================================

/// PKCE code verifier.
///
/// A high-entropy cryptographic random string using the unreserved
/// characters `[A-Z] / [a-z] / [0-9] / "-" / "." / "_" / "~"`, 43-128
/// characters long per RFC 7636 section 4.1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PkceVerifier(String);

impl PkceVerifier {
    /// Create a verifier from an existing string.
    ///
    /// # Errors
    ///
    /// Returns an error if the length is not 43-128 characters or the
    /// string contains characters outside `[A-Za-z0-9-._~]`.
    pub fn new(verifier: String) -> Result<Self, PkceError> {
        let len = verifier.len();
        if !(43..=128).contains(&len) {
            return Err(PkceError::InvalidVerifierLength(len));
        }
        if !verifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_' || c == '~')
        {
            return Err(PkceError::InvalidVerifierCharacters);
        }
        Ok(Self(verifier))
    }

    /// Generate a cryptographically random verifier.
    ///
    /// 32 random bytes, base64url-encoded to 43 characters. The thread RNG
    /// is seeded from the operating system; if no secure entropy source is
    /// available it panics rather than falling back to a weak one.
    #[must_use]
    pub fn generate() -> Self {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        // `gen` is a reserved keyword in Rust 2024, so we use r#gen
        let bytes: [u8; 32] = rng.r#gen();
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Get the verifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PkceVerifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// PKCE Challenge
// =============================================================================

/// PKCE code challenge: `BASE64URL(SHA256(ASCII(code_verifier)))`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PkceChallenge(String);

impl PkceChallenge {
    /// Derive the S256 challenge from a verifier.
    #[must_use]
    pub fn from_verifier(verifier: &PkceVerifier) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(verifier.0.as_bytes());
        Self(URL_SAFE_NO_PAD.encode(hasher.finalize()))
    }

    /// Get the challenge as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// State and Nonce
// =============================================================================

/// Opaque random token used for the OAuth `state` parameter (CSRF
/// cross-check on the callback) and the OIDC `nonce`.
///
/// 16 random bytes, base64url-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomToken(String);

impl RandomToken {
    /// Generate a new random token.
    #[must_use]
    pub fn generate() -> Self {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        let bytes: [u8; 16] = rng.r#gen();
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Get the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for RandomToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// PKCE Material
// =============================================================================

/// Everything generated for one authorization attempt.
///
/// Created once per attempt, stored server-side, discarded after one use.
/// Starting a new attempt must replace any previous material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PkceMaterial {
    /// Code verifier, sent only on the token exchange.
    pub verifier: PkceVerifier,

    /// Code challenge, sent on the authorization redirect.
    pub challenge: PkceChallenge,

    /// OAuth `state` for the CSRF cross-check on the callback.
    pub state: RandomToken,

    /// OIDC `nonce` for replay protection.
    pub nonce: RandomToken,
}

impl PkceMaterial {
    /// Generate fresh material for a new authorization attempt.
    ///
    /// Pure function of entropy; no side effects.
    #[must_use]
    pub fn generate() -> Self {
        let verifier = PkceVerifier::generate();
        let challenge = PkceChallenge::from_verifier(&verifier);
        Self {
            verifier,
            challenge,
            state: RandomToken::generate(),
            nonce: RandomToken::generate(),
        }
    }
}

//! OTP challenge types.
//!
//! A challenge moves through `ISSUED -> {VALIDATED | EXPIRED | FAILED}`,
//! and a resend supersedes it with a fresh `ISSUED` challenge under a new
//! queue name. At most one pending challenge exists per session.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Lifecycle state of one issued challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeState {
    /// Passcode sent, awaiting validation.
    Issued,
    /// Validated with the canonical success code.
    Validated,
    /// Expired at the gateway.
    Expired,
    /// Failed (attempt limit or gateway fault).
    Failed,
}

/// One issued OTP challenge.
///
/// Passcodes are not globally addressable: they are scoped to the
/// `(cell_number, queue_name)` pair the gateway assigned at issue time,
/// so the queue name must be presented on validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpChallenge {
    /// Number the passcode was delivered to.
    pub cell_number: String,

    /// Gateway-assigned routing token scoping this challenge.
    pub queue_name: String,

    /// Raw response code returned at issue time.
    pub response_code: String,

    /// When the challenge was issued.
    #[serde(with = "time::serde::rfc3339")]
    pub issued_at: OffsetDateTime,

    /// Current lifecycle state.
    pub state: ChallengeState,
}

impl OtpChallenge {
    /// Returns `true` while the challenge is awaiting validation.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self.state, ChallengeState::Issued)
    }

    /// Returns the time left before a resend is accepted, or `None` once
    /// the cooldown has elapsed. A UX throttle only; a production gateway
    /// enforces its own limit.
    #[must_use]
    pub fn resend_cooldown_remaining(&self, cooldown: Duration, now: OffsetDateTime) -> Option<Duration> {
        let elapsed = now - self.issued_at;
        let cooldown = time::Duration::try_from(cooldown).unwrap_or(time::Duration::ZERO);
        if elapsed >= cooldown {
            None
        } else {
            Duration::try_from(cooldown - elapsed).ok()
        }
    }

    /// The number with all but the last three digits masked, for display.
    #[must_use]
    pub fn masked_cell_number(&self) -> String {
        mask_cell_number(&self.cell_number)
    }
}

/// Masks a phone number down to its trailing three digits.
#[must_use]
pub fn mask_cell_number(number: &str) -> String {
    let digits: Vec<char> = number.chars().filter(char::is_ascii_digit).collect();
    if digits.len() <= 3 {
        return "*".repeat(digits.len());
    }
    let visible: String = digits[digits.len() - 3..].iter().collect();
    format!("{}{visible}", "*".repeat(digits.len() - 3))
}

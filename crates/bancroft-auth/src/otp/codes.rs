//! OTP gateway response-code table.
//!
//! The gateway answers every send/validate with a numeric response code.
//! This table is the single interpretation layer: every code maps to one
//! classification and one user-facing message, and nothing else in the
//! system inspects raw codes.

/// Canonical success code returned by the gateway.
pub const SUCCESS_CODE: &str = "0000";

/// Interpreted gateway response code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpResponseCode {
    /// `0000` - the operation succeeded.
    Success,

    /// `1001` - the submitted passcode is wrong; the user may retry.
    InvalidOtp,

    /// `1002` - attempt limit reached; the user must verify through a
    /// manual channel.
    TooManyAttempts,

    /// `1003` - the passcode expired and the gateway reissued one to the
    /// same number. Informational, not blocking.
    ExpiredReissued,

    /// `9999` or any unrecognised code - a gateway-side fault.
    TechnicalError,
}

impl OtpResponseCode {
    /// Maps a raw gateway code through the fixed table.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code {
            SUCCESS_CODE => Self::Success,
            "1001" => Self::InvalidOtp,
            "1002" => Self::TooManyAttempts,
            "1003" => Self::ExpiredReissued,
            _ => Self::TechnicalError,
        }
    }

    /// The wire code this classification maps back to.
    #[must_use]
    pub fn as_code(&self) -> &'static str {
        match self {
            Self::Success => SUCCESS_CODE,
            Self::InvalidOtp => "1001",
            Self::TooManyAttempts => "1002",
            Self::ExpiredReissued => "1003",
            Self::TechnicalError => "9999",
        }
    }

    /// The message shown next to the passcode input.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Success => "Verified",
            Self::InvalidOtp => "Invalid OTP, please try again",
            Self::TooManyAttempts => {
                "Too many incorrect attempts. Please contact your branch to verify manually"
            }
            Self::ExpiredReissued => "Your OTP expired. A new code has been sent to your phone",
            Self::TechnicalError => "A technical error occurred. Please try again later",
        }
    }

    /// Returns `true` for the canonical success code.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Returns `true` if the user may simply try again with a new code.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::InvalidOtp | Self::ExpiredReissued)
    }

    /// Returns `true` for codes that inform rather than block; the
    /// challenge stays pending.
    #[must_use]
    pub fn is_informational(&self) -> bool {
        matches!(self, Self::ExpiredReissued)
    }

    /// Returns `true` if the user cannot proceed on this channel.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::TooManyAttempts | Self::TechnicalError)
    }
}

impl std::fmt::Display for OtpResponseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_code())
    }
}

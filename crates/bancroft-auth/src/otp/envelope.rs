//! OTP gateway envelope handling.
//!
//! The gateway speaks a small XML envelope. The parsing boundary is kept
//! intentionally thin: only `vers_v_response_code` and `otp_qname` are
//! extracted, by pattern, and nothing outside this module ever sees raw
//! XML.

use std::sync::LazyLock;

use regex::Regex;

static RESPONSE_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<vers_v_response_code>\s*([^<]*?)\s*</vers_v_response_code>")
        .expect("response code pattern is valid")
});

static QUEUE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<otp_qname>\s*([^<]*?)\s*</otp_qname>").expect("queue name pattern is valid")
});

/// Gateway function selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpFunction {
    /// Issue a new passcode.
    Generate,
    /// Validate a submitted passcode.
    Validate,
}

impl OtpFunction {
    /// Wire value for `otp_function_id`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generate => "GEN",
            Self::Validate => "VAL",
        }
    }
}

/// Fields extracted from a gateway response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeFields {
    /// Raw response code, interpreted only by the fixed table.
    pub response_code: String,

    /// Queue name scoping the challenge, when the gateway returned one.
    pub queue_name: Option<String>,
}

/// Errors extracting fields from a gateway response.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    /// The response carried no `vers_v_response_code` element.
    #[error("gateway response has no response code")]
    MissingResponseCode,
}

/// Builds the request envelope for a gateway call.
///
/// `queue_name` is required for validation (passcodes are scoped to
/// `(cell_number, queue_name)`) and empty on generation; `otp` carries
/// the submitted passcode on validation only.
#[must_use]
pub fn build_envelope(
    function: OtpFunction,
    cell_number: &str,
    country_code: &str,
    queue_name: Option<&str>,
    otp: Option<&str>,
) -> String {
    let mut body = String::new();
    body.push_str("<otp_request>");
    push_element(&mut body, "otp_function_id", function.as_str());
    push_element(&mut body, "otp_cell_no", cell_number);
    push_element(&mut body, "otp_country_code", country_code);
    push_element(&mut body, "otp_qname", queue_name.unwrap_or(""));
    if let Some(otp) = otp {
        push_element(&mut body, "otp_otp", otp);
    }
    body.push_str("</otp_request>");
    body
}

/// Extracts the response code and queue name from a gateway response.
///
/// # Errors
///
/// Returns [`EnvelopeError::MissingResponseCode`] when the body carries
/// no response code at all; a missing queue name is legal (validation
/// responses do not always echo it).
pub fn extract_fields(body: &str) -> Result<EnvelopeFields, EnvelopeError> {
    let response_code = RESPONSE_CODE_RE
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or(EnvelopeError::MissingResponseCode)?;

    let queue_name = QUEUE_NAME_RE
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|q| !q.is_empty());

    Ok(EnvelopeFields {
        response_code,
        queue_name,
    })
}

fn push_element(body: &mut String, name: &str, value: &str) {
    body.push('<');
    body.push_str(name);
    body.push('>');
    body.push_str(value);
    body.push_str("</");
    body.push_str(name);
    body.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_envelope_shape() {
        let body = build_envelope(OtpFunction::Generate, "0821234567", "27", None, None);

        assert!(body.contains("<otp_function_id>GEN</otp_function_id>"));
        assert!(body.contains("<otp_cell_no>0821234567</otp_cell_no>"));
        assert!(body.contains("<otp_country_code>27</otp_country_code>"));
        assert!(body.contains("<otp_qname></otp_qname>"));
        assert!(!body.contains("<otp_otp>"));
    }

    #[test]
    fn test_validate_envelope_carries_queue_and_code() {
        let body = build_envelope(
            OtpFunction::Validate,
            "0821234567",
            "27",
            Some("Q-7F3A"),
            Some("482910"),
        );

        assert!(body.contains("<otp_function_id>VAL</otp_function_id>"));
        assert!(body.contains("<otp_qname>Q-7F3A</otp_qname>"));
        assert!(body.contains("<otp_otp>482910</otp_otp>"));
    }

    #[test]
    fn test_extract_fields_from_send_response() {
        let body = "<otp_response>\
            <vers_v_response_code>0000</vers_v_response_code>\
            <otp_qname>Q-7F3A</otp_qname>\
            </otp_response>";

        let fields = extract_fields(body).unwrap();
        assert_eq!(fields.response_code, "0000");
        assert_eq!(fields.queue_name.as_deref(), Some("Q-7F3A"));
    }

    #[test]
    fn test_extract_fields_without_queue_name() {
        let body = "<otp_response><vers_v_response_code>1001</vers_v_response_code></otp_response>";

        let fields = extract_fields(body).unwrap();
        assert_eq!(fields.response_code, "1001");
        assert!(fields.queue_name.is_none());
    }

    #[test]
    fn test_extract_tolerates_surrounding_whitespace() {
        let body = "<otp_response>\n  <vers_v_response_code> 0000 </vers_v_response_code>\n\
            <otp_qname>\nQ-1\n</otp_qname>\n</otp_response>";

        let fields = extract_fields(body).unwrap();
        assert_eq!(fields.response_code, "0000");
        assert_eq!(fields.queue_name.as_deref(), Some("Q-1"));
    }

    #[test]
    fn test_missing_response_code_is_an_error() {
        let err = extract_fields("<otp_response></otp_response>").unwrap_err();
        assert!(matches!(err, EnvelopeError::MissingResponseCode));
    }

    #[test]
    fn test_empty_queue_name_is_treated_as_absent() {
        let body = "<otp_response>\
            <vers_v_response_code>0000</vers_v_response_code>\
            <otp_qname></otp_qname>\
            </otp_response>";

        let fields = extract_fields(body).unwrap();
        assert!(fields.queue_name.is_none());
    }
}

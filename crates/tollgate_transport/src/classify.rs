//! Pure mapping from outcomes to classified failures.

use crate::HttpResponse;
use std::time::Duration;
use tollgate_error::{NetworkError, TransportError, TransportErrorKind};

/// JSON fields checked, in order, for a server-supplied message.
const MESSAGE_FIELDS: [&str; 4] = ["message", "error_description", "error", "detail"];

/// Classify a non-2xx response.
///
/// The kind depends only on the status. The message is the server's own when
/// the kind accepts one and the body carries one, else the kind's fallback.
///
/// # Examples
///
/// ```
/// use tollgate_error::TransportErrorKind;
/// use tollgate_transport::{classify_response, HttpResponse};
///
/// let response = HttpResponse::new(409, r#"{"message":"Email already registered"}"#);
/// let err = classify_response(&response);
/// assert_eq!(err.kind, TransportErrorKind::Conflict);
/// assert_eq!(err.message, "Email already registered");
/// assert_eq!(err.status_code, Some(409));
/// ```
pub fn classify_response(response: &HttpResponse) -> TransportError {
    let kind = TransportErrorKind::from_status(response.status);
    let message = kind
        .accepts_server_message()
        .then(|| server_message(response))
        .flatten()
        .unwrap_or_else(|| kind.fallback_message().to_string());

    let retry_after = match kind {
        TransportErrorKind::RateLimited => retry_after(response),
        _ => None,
    };

    TransportError::new(kind, message)
        .with_status(response.status)
        .with_retry_after(retry_after)
}

/// Classify a request that produced no response.
pub fn classify_network(err: &NetworkError) -> TransportError {
    if err.timed_out {
        TransportError::new(
            TransportErrorKind::Network,
            "The server took too long to respond. Please try again.",
        )
    } else {
        TransportError::fallback(TransportErrorKind::Network)
    }
}

/// Extract a human-readable message from an error body.
///
/// Accepts a JSON string, a JSON object with one of the usual message fields,
/// or a `text/plain` body.
pub fn server_message(response: &HttpResponse) -> Option<String> {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(&response.body) {
        return match value {
            serde_json::Value::String(s) => non_empty(s),
            serde_json::Value::Object(map) => MESSAGE_FIELDS
                .iter()
                .filter_map(|field| map.get(*field).and_then(|v| v.as_str()))
                .find_map(|s| non_empty(s.to_string())),
            _ => None,
        };
    }

    let is_plain = response
        .header("content-type")
        .is_some_and(|ct| ct.starts_with("text/plain"));
    if is_plain {
        non_empty(response.text())
    } else {
        None
    }
}

/// `Retry-After` expressed in seconds.
fn retry_after(response: &HttpResponse) -> Option<Duration> {
    response
        .header("retry-after")
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// `s` unchanged, unless it is blank.
fn non_empty(s: String) -> Option<String> {
    (!s.trim().is_empty()).then_some(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_message_fields() {
        let r = HttpResponse::new(422, r#"{"detail":"name is required"}"#);
        assert_eq!(server_message(&r).as_deref(), Some("name is required"));

        let r = HttpResponse::new(
            400,
            r#"{"error":"invalid_grant","error_description":"Token is not active"}"#,
        );
        assert_eq!(server_message(&r).as_deref(), Some("Token is not active"));

        let r = HttpResponse::new(409, r#""duplicate""#);
        assert_eq!(server_message(&r).as_deref(), Some("duplicate"));
    }

    #[test]
    fn test_blank_or_missing_message_falls_back() {
        let r = HttpResponse::new(404, r#"{"message":"   "}"#);
        assert!(server_message(&r).is_none());

        let r = HttpResponse::new(404, r#"{"code":17}"#);
        assert!(server_message(&r).is_none());

        let r = HttpResponse::new(404, "<html>nope</html>")
            .with_header("Content-Type", "text/html");
        assert!(server_message(&r).is_none());
    }

    #[test]
    fn test_plain_text_body() {
        let r = HttpResponse::new(418, "I'm a teapot\n")
            .with_header("Content-Type", "text/plain; charset=utf-8");
        let err = classify_response(&r);
        assert_eq!(err.kind, TransportErrorKind::Unknown);
        assert_eq!(err.message, "I'm a teapot\n");
    }

    #[test]
    fn test_conflict_and_validation_messages_not_trimmed() {
        let r = HttpResponse::new(409, r#"{"message":"  Email already registered "}"#);
        assert_eq!(classify_response(&r).message, "  Email already registered ");

        let r = HttpResponse::new(422, r#"{"detail":"name:\n  required\n"}"#);
        let err = classify_response(&r);
        assert_eq!(err.kind, TransportErrorKind::Validation);
        assert_eq!(err.message, "name:\n  required\n");
    }

    #[test]
    fn test_server_error_hides_body() {
        let r = HttpResponse::new(500, r#"{"message":"NullPointerException at line 3"}"#);
        let err = classify_response(&r);
        assert_eq!(err.kind, TransportErrorKind::ServerError);
        assert_eq!(err.message, TransportErrorKind::ServerError.fallback_message());
    }

    #[test]
    fn test_retry_after_on_429() {
        let r = HttpResponse::new(429, "").with_header("Retry-After", "12");
        let err = classify_response(&r);
        assert_eq!(err.kind, TransportErrorKind::RateLimited);
        assert_eq!(err.retry_after, Some(Duration::from_secs(12)));
    }

    #[test]
    fn test_network_timeout_message() {
        let err = classify_network(&NetworkError::timeout("deadline elapsed"));
        assert_eq!(err.kind, TransportErrorKind::Network);
        assert!(err.message.contains("too long"));
        assert!(err.status_code.is_none());
    }
}

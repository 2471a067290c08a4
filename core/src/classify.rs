//! Maps raw failures into the `ApiError` taxonomy.

use crate::error::{ApiError, TransportFailure};
use crate::http::HttpResponse;

const PREVIEW_CHAR_LIMIT: usize = 160;

/// Classify a received response. Returns `None` for success statuses.
///
/// `session_exchange` is true for login/register, where a 403 also means the
/// credentials were refused.
pub fn classify_response(response: &HttpResponse, session_exchange: bool) -> Option<ApiError> {
    let status = response.status;
    let preview = body_preview(&response.body);
    match status {
        200..=399 => None,
        401 => Some(ApiError::Authentication {
            status: Some(status),
            message: message_or_default(preview, "unauthorized"),
        }),
        403 if session_exchange => Some(ApiError::Authentication {
            status: Some(status),
            message: message_or_default(preview, "forbidden"),
        }),
        400..=499 => Some(ApiError::Validation {
            status,
            body: preview,
        }),
        _ => Some(ApiError::Server {
            status,
            message: message_or_default(preview, "no response body"),
        }),
    }
}

/// Classify a failure where no response was received.
pub fn classify_failure(failure: TransportFailure) -> ApiError {
    match failure {
        TransportFailure::NoResponse { message, timed_out } => {
            ApiError::NetworkUnavailable { message, timed_out }
        }
        TransportFailure::Local(message) => ApiError::Configuration(message),
    }
}

/// A success response whose JSON body failed to parse.
pub fn malformed_body(status: u16, error: &serde_json::Error) -> ApiError {
    ApiError::Server {
        status,
        message: format!("malformed response body: {error}"),
    }
}

fn message_or_default(preview: String, default: &str) -> String {
    if preview.is_empty() {
        default.to_string()
    } else {
        preview
    }
}

fn body_preview(body: &[u8]) -> String {
    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    #[rstest]
    #[case::ok(200, false, "none")]
    #[case::no_content(204, false, "none")]
    #[case::unauthorized(401, false, "auth")]
    #[case::unauthorized_login(401, true, "auth")]
    #[case::forbidden(403, false, "validation")]
    #[case::forbidden_login(403, true, "auth")]
    #[case::not_found(404, false, "validation")]
    #[case::unprocessable(422, false, "validation")]
    #[case::internal(500, false, "server")]
    #[case::unavailable(503, true, "server")]
    fn maps_statuses_to_taxonomy(
        #[case] status: u16,
        #[case] session_exchange: bool,
        #[case] expected: &str,
    ) {
        let classified = classify_response(&response(status, "detail"), session_exchange);
        match expected {
            "none" => assert!(classified.is_none()),
            "auth" => assert!(matches!(
                classified,
                Some(ApiError::Authentication { status: Some(s), .. }) if s == status
            )),
            "validation" => assert!(matches!(
                classified,
                Some(ApiError::Validation { status: s, .. }) if s == status
            )),
            "server" => assert!(matches!(
                classified,
                Some(ApiError::Server { status: s, .. }) if s == status
            )),
            _ => panic!("unsupported expectation: {expected}"),
        }
    }

    #[test]
    fn no_response_maps_to_network_unavailable() {
        let err = classify_failure(TransportFailure::NoResponse {
            message: "connection refused".into(),
            timed_out: false,
        });
        assert!(matches!(
            err,
            ApiError::NetworkUnavailable {
                timed_out: false,
                ..
            }
        ));
    }

    #[test]
    fn local_failure_maps_to_configuration() {
        let err = classify_failure(TransportFailure::Local("relative URL".into()));
        assert_eq!(err, ApiError::Configuration("relative URL".into()));
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(500);
        let Some(ApiError::Validation { body, .. }) =
            classify_response(&response(400, &body), false)
        else {
            panic!("expected validation error");
        };
        assert_eq!(body.chars().count(), PREVIEW_CHAR_LIMIT + 3);
        assert!(body.ends_with("..."));
    }

    #[test]
    fn empty_unauthorized_body_gets_default_message() {
        let Some(ApiError::Authentication { message, .. }) =
            classify_response(&response(401, ""), false)
        else {
            panic!("expected authentication error");
        };
        assert_eq!(message, "unauthorized");
    }
}

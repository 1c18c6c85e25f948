//! Shared-secret authentication for trigger endpoints.
//!
//! Authorization is an explicit result consumed by pattern matching in the
//! handlers, not an error thrown through the call stack.

use axum::http::{header, HeaderMap};

#[derive(Debug, PartialEq, Eq)]
pub enum TriggerAuth {
    Authorized,
    Rejected(&'static str),
}

/// Compare the `Authorization: Bearer <secret>` header against the
/// configured trigger secret.
pub fn authorize_trigger(headers: &HeaderMap, secret: &str) -> TriggerAuth {
    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match provided {
        None => TriggerAuth::Rejected("Authorization header required"),
        Some(value) => {
            let expected = format!("Bearer {secret}");
            if value == expected {
                TriggerAuth::Authorized
            } else {
                TriggerAuth::Rejected("invalid trigger secret")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(value).expect("valid header value"),
        );
        headers
    }

    #[test]
    fn accepts_matching_secret() {
        let headers = headers_with("Bearer s3cret");
        assert_eq!(authorize_trigger(&headers, "s3cret"), TriggerAuth::Authorized);
    }

    #[test]
    fn rejects_wrong_or_missing_secret() {
        let wrong = headers_with("Bearer nope");
        assert!(matches!(
            authorize_trigger(&wrong, "s3cret"),
            TriggerAuth::Rejected(_)
        ));

        let bare = headers_with("s3cret");
        assert!(matches!(
            authorize_trigger(&bare, "s3cret"),
            TriggerAuth::Rejected(_)
        ));

        assert!(matches!(
            authorize_trigger(&HeaderMap::new(), "s3cret"),
            TriggerAuth::Rejected(_)
        ));
    }
}

//! Syntactic push-token validation.

/// Whether `token` has the provider's push-token shape:
/// `ExponentPushToken[...]` or `ExpoPushToken[...]` with a non-empty id.
///
/// Purely syntactic; a well-formed token can still turn out to be
/// unregistered, which only a delivery receipt reveals.
pub fn is_valid_push_token(token: &str) -> bool {
    let inner = token
        .strip_prefix("ExponentPushToken[")
        .or_else(|| token.strip_prefix("ExpoPushToken["));
    match inner {
        Some(rest) => rest.strip_suffix(']').is_some_and(|id| !id.is_empty()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_both_token_prefixes() {
        assert!(is_valid_push_token("ExponentPushToken[Lr8GYZN8RV-BkHZrnG4eBW]"));
        assert!(is_valid_push_token("ExpoPushToken[abc123]"));
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert!(!is_valid_push_token(""));
        assert!(!is_valid_push_token("ExponentPushToken[]"));
        assert!(!is_valid_push_token("ExponentPushToken[abc"));
        assert!(!is_valid_push_token("abc]"));
        assert!(!is_valid_push_token("fcm:some-android-token"));
        assert!(!is_valid_push_token("ExponentPushToken"));
    }
}

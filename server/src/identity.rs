//! Identity key extraction from the request path.

use std::borrow::Cow;

/// Return the final segment of the percent-decoded `path`.
///
/// The whole path is decoded before splitting, so an encoded `/` separates
/// segments. There are no failure modes: an empty trailing segment is
/// returned as the empty string, and a path that does not decode to UTF-8
/// yields its raw final segment. Interpretation is left to the lookup
/// callback.
#[must_use]
pub fn identity_key(path: &str) -> Cow<'_, str> {
    match urlencoding::decode(path) {
        Ok(Cow::Borrowed(decoded)) => Cow::Borrowed(last_segment(decoded)),
        Ok(Cow::Owned(decoded)) => Cow::Owned(last_segment(&decoded).to_string()),
        Err(_) => Cow::Borrowed(last_segment(path)),
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, last)| last)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_segment() {
        assert_eq!(identity_key("/alice"), "alice");
    }

    #[test]
    fn test_nested_segment() {
        assert_eq!(identity_key("/ssh/alice"), "alice");
        assert_eq!(identity_key("/a/b/c/carl@smallstep.com"), "carl@smallstep.com");
    }

    #[test]
    fn test_empty_segment() {
        assert_eq!(identity_key("/"), "");
        assert_eq!(identity_key("/ssh/"), "");
        assert_eq!(identity_key(""), "");
    }

    #[test]
    fn test_no_slash() {
        assert_eq!(identity_key("alice"), "alice");
    }

    #[test]
    fn test_percent_decoding() {
        assert_eq!(identity_key("/carl%40smallstep.com"), "carl@smallstep.com");
        assert_eq!(identity_key("/ssh/first%20last"), "first last");
    }

    #[test]
    fn test_encoded_slash_splits_segments() {
        assert_eq!(identity_key("/a%2Fb"), "b");
        assert_eq!(identity_key("/ssh/team%2Falice"), "alice");
        assert_eq!(identity_key("/alice%2F"), "");
    }

    #[test]
    fn test_invalid_utf8_is_passed_through() {
        assert_eq!(identity_key("/%FF"), "%FF");
    }
}

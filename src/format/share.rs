//! Share links: the JSON envelope carried in a URL query parameter.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::{PowerTreeError, Result};
use crate::tree::PowerTree;

/// Query parameter holding the encoded tree.
pub const SHARE_PARAM: &str = "s";

/// Characters escaped by JavaScript's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Build a link to `base_url` that carries the whole tree.
pub fn share_link(base_url: &str, tree: &PowerTree) -> Result<String> {
    let json = super::to_json(tree)?;
    let separator = if base_url.contains('?') { '&' } else { '?' };
    Ok(format!(
        "{base_url}{separator}{SHARE_PARAM}={}",
        utf8_percent_encode(&json, URI_COMPONENT)
    ))
}

/// Extract the raw (still encoded) share parameter from a URL or query string.
pub fn share_param(url: &str) -> Option<&str> {
    let query = match url.split_once('?') {
        Some((_, q)) => q,
        None => url,
    };
    let query = query.split('#').next().unwrap_or_default();
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == SHARE_PARAM)
        .map(|(_, value)| value)
}

/// Decode a raw share parameter back into JSON text.
pub fn decode_param(raw: &str) -> Result<String> {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| PowerTreeError::share_link(format!("parameter is not valid UTF-8: {e}")))
}

/// Rebuild a tree from a share link (or a bare query string).
pub fn from_share_link(url: &str) -> Result<PowerTree> {
    let raw = share_param(url)
        .ok_or_else(|| PowerTreeError::share_link(format!("no '{SHARE_PARAM}' parameter")))?;
    super::from_json(&decode_param(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::FieldKey;

    #[test]
    fn test_link_round_trip() {
        let mut tree = PowerTree::new();
        let src = tree.add_source("12V IN", 12.0);
        tree.add_load(src, "Fan & LEDs", 0.75).unwrap();

        let link = share_link("https://example.com/powertree/", &tree).unwrap();
        assert!(link.starts_with("https://example.com/powertree/?s=%5B0.1%2C"));
        assert!(!link.contains(' '));

        let restored = from_share_link(&link).unwrap();
        let load = restored.children(restored.roots()[0])[0];
        assert_eq!(restored.node(load).unwrap().name, "Fan & LEDs");
        assert_eq!(restored.value(load, FieldKey::IIn), Some(0.75));
    }

    #[test]
    fn test_share_param_lookup() {
        assert_eq!(share_param("http://h/p?x=1&s=abc#top"), Some("abc"));
        assert_eq!(share_param("s=xyz"), Some("xyz"));
        assert_eq!(share_param("http://h/p?x=1"), None);
    }

    #[test]
    fn test_plus_decodes_to_space() {
        assert_eq!(decode_param("a+b%20c").unwrap(), "a b c");
    }

    #[test]
    fn test_bad_link_rejected() {
        assert!(from_share_link("http://h/p").is_err());
        assert!(from_share_link("http://h/p?s=%5B0.1").unwrap_err().is_load_failure());
        assert!(from_share_link("http://h/p?s=%FF").unwrap_err().is_load_failure());
    }
}

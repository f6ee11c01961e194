use press_types::ContentId;

/// Prefix of every article entry key.
pub const KEY_PREFIX: &str = "article-";

/// Persisted key for an article payload: `"article-" + hex(cid)`.
pub fn cache_key(id: &ContentId) -> String {
    format!("{KEY_PREFIX}{}", id.to_hex())
}

/// Recover the id from a persisted key. Keys outside the article namespace,
/// or with a malformed id, yield `None`.
pub fn parse_cache_key(key: &str) -> Option<ContentId> {
    key.strip_prefix(KEY_PREFIX)
        .and_then(|hex| ContentId::from_hex(hex).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_roundtrip() {
        let id = ContentId::for_payload(b"article");
        let key = cache_key(&id);
        assert!(key.starts_with("article-"));
        assert_eq!(parse_cache_key(&key), Some(id));
    }

    #[test]
    fn foreign_keys_are_ignored() {
        assert_eq!(parse_cache_key("connected_wallet"), None);
        assert_eq!(parse_cache_key("article-zz"), None);
    }
}

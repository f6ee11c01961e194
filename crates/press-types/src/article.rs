use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::cid::ContentId;
use crate::error::TypeError;
use crate::timestamp::Timestamp;

/// Ordered article labels.
///
/// Labels are trimmed on entry, blank labels are dropped, and a label equal
/// (case-sensitive) to one already present is ignored. Insertion order is
/// preserved. Deserialized lists go through the same rules.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Tags(Vec<String>);

impl Tags {
    /// Create an empty tag list.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Add a label. Returns `false` if it was blank or already present.
    pub fn insert(&mut self, tag: impl AsRef<str>) -> bool {
        let tag = tag.as_ref().trim();
        if tag.is_empty() || self.0.iter().any(|t| t == tag) {
            return false;
        }
        self.0.push(tag.to_string());
        true
    }

    /// Remove the label at `index`, if any.
    pub fn remove(&mut self, index: usize) -> Option<String> {
        (index < self.0.len()).then(|| self.0.remove(index))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for Tags {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut tags = Tags::new();
        for tag in iter {
            tags.insert(tag);
        }
        tags
    }
}

impl From<Vec<String>> for Tags {
    fn from(raw: Vec<String>) -> Self {
        raw.into_iter().collect()
    }
}

impl From<Tags> for Vec<String> {
    fn from(tags: Tags) -> Self {
        tags.0
    }
}

/// An article as submitted, before author and time are attached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArticleDraft {
    pub title: String,
    pub content: String,
    pub tags: Tags,
}

impl ArticleDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            tags: Tags::new(),
        }
    }

    pub fn with_tag(mut self, tag: impl AsRef<str>) -> Self {
        self.tags.insert(tag);
        self
    }

    pub fn with_tags<S: AsRef<str>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        for tag in tags {
            self.tags.insert(tag);
        }
        self
    }

    /// Title and content must both be non-blank. Tags may be empty.
    pub fn validate(&self) -> Result<(), TypeError> {
        check_body(&self.title, &self.content)
    }
}

fn check_body(title: &str, content: &str) -> Result<(), TypeError> {
    if title.trim().is_empty() {
        return Err(TypeError::InvalidDraft("title must not be empty".into()));
    }
    if content.trim().is_empty() {
        return Err(TypeError::InvalidDraft("content must not be empty".into()));
    }
    Ok(())
}

/// A published (or about to be published) article.
///
/// The serialized payload deliberately omits `cid`: the id is derived from
/// the payload, so it cannot be part of it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Process-local id, `"{timestamp}-{author}"`.
    pub id: String,
    pub title: String,
    pub content: String,
    pub tags: Tags,
    pub author: Address,
    pub timestamp: Timestamp,
    #[serde(skip)]
    pub cid: Option<ContentId>,
}

impl Article {
    /// Attach author and creation time to a validated draft.
    pub fn compose(
        draft: ArticleDraft,
        author: Address,
        timestamp: Timestamp,
    ) -> Result<Self, TypeError> {
        draft.validate()?;
        Ok(Self {
            id: Self::local_id(&author, timestamp),
            title: draft.title,
            content: draft.content,
            tags: draft.tags,
            author,
            timestamp,
            cid: None,
        })
    }

    /// Same rule as [`ArticleDraft::validate`].
    pub fn validate(&self) -> Result<(), TypeError> {
        check_body(&self.title, &self.content)
    }

    /// The process-local id for an article by `author` created at `timestamp`.
    pub fn local_id(author: &Address, timestamp: Timestamp) -> String {
        format!("{}-{}", timestamp.as_millis(), author)
    }

    /// Serialize to the canonical payload bytes.
    pub fn to_payload(&self) -> Result<Vec<u8>, TypeError> {
        serde_json::to_vec(self).map_err(|e| TypeError::Serialization(e.to_string()))
    }

    /// Decode a payload fetched under `cid`, attaching the id.
    pub fn from_payload(cid: ContentId, payload: &[u8]) -> Result<Self, TypeError> {
        let mut article: Article = serde_json::from_slice(payload)
            .map_err(|e| TypeError::Serialization(e.to_string()))?;
        article.cid = Some(cid);
        Ok(article)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn author() -> Address {
        Address::from_bytes([0x11; 20])
    }

    #[test]
    fn tags_are_deduplicated_in_order() {
        let tags: Tags = ["go", "go", "rust"].into_iter().collect();
        assert_eq!(tags.as_slice(), ["go", "rust"]);
    }

    #[test]
    fn tag_dedup_is_case_sensitive() {
        let tags: Tags = ["Rust", "rust"].into_iter().collect();
        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn blank_tags_are_dropped_and_trimmed() {
        let mut tags = Tags::new();
        assert!(!tags.insert("   "));
        assert!(tags.insert("  news "));
        assert!(!tags.insert("news"));
        assert_eq!(tags.as_slice(), ["news"]);
    }

    #[test]
    fn remove_by_index() {
        let mut tags: Tags = ["a", "b", "c"].into_iter().collect();
        assert_eq!(tags.remove(1), Some("b".to_string()));
        assert_eq!(tags.remove(9), None);
        assert_eq!(tags.as_slice(), ["a", "c"]);
    }

    #[test]
    fn draft_requires_title_and_content() {
        assert!(ArticleDraft::new("", "body").validate().is_err());
        assert!(ArticleDraft::new("title", "  ").validate().is_err());
        assert!(ArticleDraft::new("title", "body").validate().is_ok());
    }

    #[test]
    fn compose_assigns_local_id() {
        let ts = Timestamp::from_millis(1234);
        let article = Article::compose(ArticleDraft::new("t", "c"), author(), ts).unwrap();
        assert_eq!(article.id, format!("1234-{}", author()));
        assert!(article.cid.is_none());
    }

    #[test]
    fn payload_excludes_cid() {
        let mut article =
            Article::compose(ArticleDraft::new("t", "c"), author(), Timestamp::from_millis(1))
                .unwrap();
        let before = article.to_payload().unwrap();
        article.cid = Some(ContentId::for_payload(&before));
        let after = article.to_payload().unwrap();
        assert_eq!(before, after);
        assert!(!String::from_utf8(after).unwrap().contains("cid"));
    }

    #[test]
    fn from_payload_attaches_cid() {
        let article = Article::compose(
            ArticleDraft::new("t", "c").with_tags(["x", "y"]),
            author(),
            Timestamp::from_millis(5),
        )
        .unwrap();
        let payload = article.to_payload().unwrap();
        let cid = ContentId::for_payload(&payload);
        let decoded = Article::from_payload(cid, &payload).unwrap();
        assert_eq!(decoded.cid, Some(cid));
        assert_eq!(decoded.tags.as_slice(), ["x", "y"]);
        assert_eq!(decoded.author, author());
    }

    #[test]
    fn decoded_tags_are_trimmed_and_deduplicated() {
        let tags: Tags = serde_json::from_str(r#"["go", " go ", "", "rust", "go"]"#).unwrap();
        assert_eq!(tags.as_slice(), ["go", "rust"]);
        assert_eq!(serde_json::to_string(&tags).unwrap(), r#"["go","rust"]"#);
    }

    #[test]
    fn from_payload_rejects_garbage() {
        let err = Article::from_payload(ContentId::null(), b"{not json").unwrap_err();
        assert!(matches!(err, TypeError::Serialization(_)));
    }

    proptest! {
        #[test]
        fn tags_never_contain_duplicates(input in proptest::collection::vec("[a-c]{0,2}", 0..16)) {
            let tags: Tags = input.iter().collect();
            let mut seen = std::collections::HashSet::new();
            for tag in tags.iter() {
                prop_assert!(!tag.is_empty());
                prop_assert!(seen.insert(tag.to_string()));
            }
        }
    }
}

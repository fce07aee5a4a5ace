//! Raw content nodes, as delivered by the backing content store.
//!
//! Nodes arrive in the store's own JSON shape (camelCase, null-tolerant
//! lists) and are normalized into typed [`Resource`](super::Resource)
//! records by the collect pass. Nothing in here is derived; these are pure
//! inputs.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::resource::ResourceKind;

/// Deserialize a term list, treating `null` as empty
fn deserialize_terms<'de, D>(deserializer: D) -> Result<Vec<TermRef>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<Vec<TermRef>> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

/// Filesystem-like location shared by every node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeLocation {
    /// Bare file name, e.g. `0th-post.md`.
    pub filename: String,
    /// Absolute path in the content store.
    pub path: String,
    /// Path relative to the content root. Resource identity derives from
    /// this field alone.
    pub relative_path: String,
}

/// A nested tag/author reference inside a post or page node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TermRef {
    pub slug: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// The site config singleton node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigNode {
    pub id: String,
    #[serde(flatten)]
    pub location: NodeLocation,
    /// Raw site settings, passed through untouched.
    #[serde(default)]
    pub values: JsonValue,
}

/// A post or page node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryNode {
    pub id: String,
    #[serde(flatten)]
    pub location: NodeLocation,
    #[serde(default)]
    pub title: Option<String>,
    pub slug: String,
    /// Publication date, `YYYY-MM-DD` or RFC 3339. Absent dates fall back
    /// to "now" when locator fields are derived.
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "deserialize_terms")]
    pub tags: Vec<TermRef>,
    #[serde(default, deserialize_with = "deserialize_terms")]
    pub authors: Vec<TermRef>,
    /// Nested content body (raw JSON, never inspected by the router).
    #[serde(default)]
    pub body: Option<JsonValue>,
}

/// A tag or author node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermNode {
    pub id: String,
    #[serde(flatten)]
    pub location: NodeLocation,
    #[serde(default)]
    pub name: Option<String>,
    pub slug: String,
}

/// A raw content node, tagged by kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentNode {
    Config(ConfigNode),
    Post(EntryNode),
    Page(EntryNode),
    Author(TermNode),
    Tag(TermNode),
}

impl ContentNode {
    /// The resource kind this node normalizes into.
    pub const fn kind(&self) -> ResourceKind {
        match self {
            Self::Config(_) => ResourceKind::Config,
            Self::Post(_) => ResourceKind::Post,
            Self::Page(_) => ResourceKind::Page,
            Self::Author(_) => ResourceKind::Author,
            Self::Tag(_) => ResourceKind::Tag,
        }
    }

    /// The node's filesystem-like location.
    pub const fn location(&self) -> &NodeLocation {
        match self {
            Self::Config(n) => &n.location,
            Self::Post(n) | Self::Page(n) => &n.location,
            Self::Author(n) | Self::Tag(n) => &n.location,
        }
    }

    /// The node's slug, when it has one (config does not).
    pub fn slug(&self) -> Option<&str> {
        match self {
            Self::Config(_) => None,
            Self::Post(n) | Self::Page(n) => Some(&n.slug),
            Self::Author(n) | Self::Tag(n) => Some(&n.slug),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_post_node() {
        let json = r#"{
            "type": "post",
            "id": "abc123",
            "filename": "0th-post.md",
            "path": "/content/posts/0th-post.md",
            "relativePath": "posts/0th-post.md",
            "title": "0th Post",
            "slug": "0th-post",
            "date": "2024-01-15",
            "tags": [{ "slug": "tag-1", "name": "Tag One" }],
            "authors": [{ "slug": "pedro" }]
        }"#;
        let node: ContentNode = serde_json::from_str(json).unwrap();

        assert_eq!(node.kind(), ResourceKind::Post);
        assert_eq!(node.slug(), Some("0th-post"));
        assert_eq!(node.location().relative_path, "posts/0th-post.md");

        let ContentNode::Post(post) = node else {
            panic!("expected post");
        };
        assert_eq!(post.tags[0].slug, "tag-1");
        assert_eq!(post.authors[0].slug, "pedro");
        assert!(post.authors[0].name.is_none());
    }

    #[test]
    fn test_null_tags_tolerated() {
        let json = r#"{
            "type": "post",
            "id": "abc",
            "filename": "x.md",
            "path": "/content/x.md",
            "relativePath": "x.md",
            "slug": "x",
            "tags": null
        }"#;
        let node: ContentNode = serde_json::from_str(json).unwrap();
        let ContentNode::Post(post) = node else {
            panic!("expected post");
        };
        assert!(post.tags.is_empty());
    }

    #[test]
    fn test_config_has_no_slug() {
        let json = r#"{
            "type": "config",
            "id": "cfg",
            "filename": "config.json",
            "path": "/content/config.json",
            "relativePath": "config.json"
        }"#;
        let node: ContentNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.kind(), ResourceKind::Config);
        assert!(node.slug().is_none());
    }
}

//! Routing configuration types.
//!
//! A [`RoutesConfig`] is the declarative description of a site's URL space,
//! arriving already parsed and validated from whatever format the embedding
//! tool uses (YAML, TOML, ...). Three independent sections:
//!
//! | Section       | Purpose                                               |
//! |---------------|-------------------------------------------------------|
//! | `routes`      | Named static paths, optionally channel controllers    |
//! | `collections` | Permalink templates that *own* posts exclusively      |
//! | `taxonomies`  | Built-in grouping dimensions (tag, author)            |
//!
//! Declaration order is semantically significant everywhere: it is the
//! router precedence and the collection-ownership tie-break. All sections
//! are therefore plain `Vec`s, never unordered maps.

use serde::{Deserialize, Serialize};

use crate::resource::ResourceKind;

/// Default number of posts per pagination page.
pub const DEFAULT_PAGE_SIZE: usize = 5;

// ============================================================================
// RoutesConfig
// ============================================================================

/// Full routing configuration for a site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutesConfig {
    /// Named static routes, in declaration order.
    #[serde(default)]
    pub routes: Vec<RouteDef>,

    /// Post collections, in declaration order. Earlier collections claim
    /// posts away from later ones.
    #[serde(default)]
    pub collections: Vec<CollectionDef>,

    /// Taxonomy dimensions, one per kind.
    #[serde(default)]
    pub taxonomies: Vec<TaxonomyDef>,
}

impl RoutesConfig {
    /// Configuration with no routes, collections, or taxonomies at all.
    pub fn empty() -> Self {
        Self {
            routes: Vec::new(),
            collections: Vec::new(),
            taxonomies: Vec::new(),
        }
    }

    /// Look up the taxonomy entry for a kind, if configured.
    pub fn taxonomy(&self, kind: TaxonomyKind) -> Option<&TaxonomyDef> {
        self.taxonomies.iter().find(|t| t.kind == kind)
    }
}

/// The stock configuration: one collection at `/` with `/:slug/` permalinks,
/// plus tag and author taxonomies.
impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            routes: Vec::new(),
            collections: vec![CollectionDef {
                path: "/".to_string(),
                permalink: "/:slug/".to_string(),
                templates: vec!["index".to_string()],
                filter: None,
                limit: None,
                order: None,
            }],
            taxonomies: vec![
                TaxonomyDef {
                    kind: TaxonomyKind::Tag,
                    permalink: "/tag/:slug".to_string(),
                    filter: "tag:%s".to_string(),
                    limit: None,
                },
                TaxonomyDef {
                    kind: TaxonomyKind::Author,
                    permalink: "/author/:slug".to_string(),
                    filter: "author:%s".to_string(),
                    limit: None,
                },
            ],
        }
    }
}

// ============================================================================
// Routes
// ============================================================================

/// A named static route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteDef {
    /// The literal path this route serves, e.g. `/features/`.
    pub path: String,

    /// Templates to render, in fallback order.
    #[serde(default)]
    pub templates: Vec<String>,

    /// Channel controller: makes the route a filterable, paginated browse
    /// view over posts.
    #[serde(default)]
    pub controller: Option<ChannelDef>,

    /// Query bindings attached to the route.
    #[serde(default)]
    pub data: Vec<DataBinding>,
}

impl RouteDef {
    /// Bindings that declare this route the canonical owner of a resource.
    pub fn redirect_bindings(&self) -> impl Iterator<Item = &DataBinding> {
        self.data.iter().filter(|b| b.redirect)
    }
}

/// Channel controller settings on a route.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelDef {
    /// Filter expression selecting the channel's posts.
    #[serde(default)]
    pub filter: Option<String>,

    /// Posts per page; `DEFAULT_PAGE_SIZE` when absent.
    #[serde(default)]
    pub limit: Option<usize>,

    /// Ordering expression, echoed into the routing context.
    #[serde(default)]
    pub order: Option<String>,
}

impl ChannelDef {
    pub fn page_size(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE)
    }
}

/// A query binding on a route (`data: page.home` in the source config).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataBinding {
    /// Resource kind the binding queries.
    pub kind: ResourceKind,

    /// Slug of the bound resource.
    pub slug: String,

    /// When true, this route becomes the canonical URL for the bound
    /// resource: every other router matching it must redirect here.
    #[serde(default)]
    pub redirect: bool,
}

impl DataBinding {
    pub fn new(kind: ResourceKind, slug: impl Into<String>) -> Self {
        Self {
            kind,
            slug: slug.into(),
            redirect: false,
        }
    }

    pub fn with_redirect(mut self) -> Self {
        self.redirect = true;
        self
    }
}

// ============================================================================
// Collections
// ============================================================================

/// A post collection: a permalink template plus the filter deciding which
/// posts it owns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionDef {
    /// Collection root, e.g. `/` or `/blog/`.
    pub path: String,

    /// Permalink template compiled per owned post, e.g. `/blog/:slug/`.
    pub permalink: String,

    /// Templates to render, in fallback order.
    #[serde(default)]
    pub templates: Vec<String>,

    /// Filter deciding membership; absent means "every post".
    #[serde(default)]
    pub filter: Option<String>,

    /// Posts per page; `DEFAULT_PAGE_SIZE` when absent.
    #[serde(default)]
    pub limit: Option<usize>,

    /// Ordering expression, echoed into the routing context.
    #[serde(default)]
    pub order: Option<String>,
}

impl CollectionDef {
    pub fn page_size(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// Collection root with the trailing slash guaranteed.
    pub fn root(&self) -> String {
        if self.path.ends_with('/') {
            self.path.clone()
        } else {
            format!("{}/", self.path)
        }
    }
}

// ============================================================================
// Taxonomies
// ============================================================================

/// Built-in grouping dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxonomyKind {
    Tag,
    Author,
}

impl TaxonomyKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tag => "tag",
            Self::Author => "author",
        }
    }

    /// The resource kind a term of this taxonomy is stored as.
    pub const fn term_kind(self) -> ResourceKind {
        match self {
            Self::Tag => ResourceKind::Tag,
            Self::Author => ResourceKind::Author,
        }
    }
}

/// One taxonomy dimension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomyDef {
    /// The taxonomy kind this entry configures.
    pub kind: TaxonomyKind,

    /// Permalink template for term pages, e.g. `/tag/:slug`.
    pub permalink: String,

    /// Filter template with a `%s` slug placeholder, e.g. `tag:%s`.
    pub filter: String,

    /// Posts per page on term channels; `DEFAULT_PAGE_SIZE` when absent.
    #[serde(default)]
    pub limit: Option<usize>,
}

impl TaxonomyDef {
    pub fn page_size(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// Instantiate the filter template for a concrete term slug.
    pub fn filter_for(&self, slug: &str) -> String {
        self.filter.replace("%s", slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_shape() {
        let config = RoutesConfig::default();
        assert!(config.routes.is_empty());
        assert_eq!(config.collections.len(), 1);
        assert_eq!(config.collections[0].path, "/");
        assert_eq!(config.collections[0].permalink, "/:slug/");
        assert_eq!(config.taxonomies.len(), 2);
        assert_eq!(
            config.taxonomy(TaxonomyKind::Tag).unwrap().permalink,
            "/tag/:slug"
        );
        assert_eq!(
            config.taxonomy(TaxonomyKind::Author).unwrap().filter,
            "author:%s"
        );
    }

    #[test]
    fn test_filter_substitution() {
        let tax = TaxonomyDef {
            kind: TaxonomyKind::Tag,
            permalink: "/tag/:slug".to_string(),
            filter: "tag:%s".to_string(),
            limit: None,
        };
        assert_eq!(tax.filter_for("tag-1"), "tag:tag-1");
    }

    #[test]
    fn test_collection_root_normalized() {
        let mut collection = RoutesConfig::default().collections.remove(0);
        assert_eq!(collection.root(), "/");
        collection.path = "/blog".to_string();
        assert_eq!(collection.root(), "/blog/");
    }

    #[test]
    fn test_page_size_fallback() {
        let channel = ChannelDef::default();
        assert_eq!(channel.page_size(), DEFAULT_PAGE_SIZE);

        let channel = ChannelDef {
            limit: Some(10),
            ..Default::default()
        };
        assert_eq!(channel.page_size(), 10);
    }

    #[test]
    fn test_deserialize_from_toml() {
        let raw = r#"
            [[routes]]
            path = "/features/"
            templates = ["features"]

            [[routes.data]]
            kind = "page"
            slug = "features"
            redirect = true

            [[collections]]
            path = "/blog/"
            permalink = "/blog/:slug/"
            filter = "tag:blog"
            limit = 10

            [[taxonomies]]
            kind = "tag"
            permalink = "/tag/:slug"
            filter = "tag:%s"
        "#;
        let config: RoutesConfig = toml::from_str(raw).unwrap();

        assert_eq!(config.routes.len(), 1);
        let binding = &config.routes[0].data[0];
        assert_eq!(binding.kind, ResourceKind::Page);
        assert_eq!(binding.slug, "features");
        assert!(binding.redirect);

        assert_eq!(config.collections[0].page_size(), 10);
        assert_eq!(config.taxonomies[0].kind, TaxonomyKind::Tag);
    }

    #[test]
    fn test_declaration_order_preserved() {
        let raw = r#"
            [[collections]]
            path = "/featured/"
            permalink = "/featured/:slug/"
            filter = "featured:true"

            [[collections]]
            path = "/"
            permalink = "/:slug/"
        "#;
        let config: RoutesConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.collections[0].path, "/featured/");
        assert_eq!(config.collections[1].path, "/");
    }
}

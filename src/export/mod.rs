//! Typed records read from a WordPress WXR export.

pub mod wxr_reader;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostStatus {
    Published,
    Draft,
    Other(String),
}

impl From<&str> for PostStatus {
    fn from(value: &str) -> Self {
        match value.trim() {
            "publish" => PostStatus::Published,
            "draft" => PostStatus::Draft,
            other => PostStatus::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaxonomyDomain {
    Category,
    PostTag,
    Other(String),
}

impl From<&str> for TaxonomyDomain {
    fn from(value: &str) -> Self {
        match value {
            "category" => TaxonomyDomain::Category,
            "post_tag" => TaxonomyDomain::PostTag,
            other => TaxonomyDomain::Other(other.to_string()),
        }
    }
}

/// A `<category>` entry of an item. Categories and tags share the element,
/// the `domain` attribute tells them apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRef {
    pub name: String,
    pub domain: TaxonomyDomain,
    pub nicename: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostMeta {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostRecord {
    pub id: String,
    pub title: String,
    pub pub_date: String,
    pub post_date: String,
    pub slug: String,
    pub content_html: String,
    pub excerpt_html: String,
    pub status: PostStatus,
    pub author: String,
    pub categories: Vec<CategoryRef>,
    pub meta: Vec<PostMeta>,
}

impl PostRecord {
    /// Values of every meta entry whose key contains `key_part`.
    pub fn meta_values<'a>(&'a self, key_part: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.meta.iter()
            .filter(move |m| m.key.contains(key_part))
            .map(|m| m.value.as_str())
    }

    pub fn in_domain<'a>(&'a self, domain: &'a TaxonomyDomain) -> impl Iterator<Item = &'a CategoryRef> + 'a {
        self.categories.iter().filter(move |c| &c.domain == domain)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRecord {
    pub post_id: String,
    pub attachment_url: String,
}

/// Channel level `<wp:category>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTaxonomy {
    pub title: String,
    pub slug: String,
    pub parent_slug: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default)]
pub struct ExportData {
    pub posts: Vec<PostRecord>,
    pub attachments: Vec<AttachmentRecord>,
    pub categories: Vec<CategoryTaxonomy>,
}

use chrono::{DateTime, Local};

use crate::config::{DirectoryRule, Layout, MissingThumbnail, Site};
use crate::error::ConvertError;
use crate::export::{AttachmentRecord, PostRecord, PostStatus, TaxonomyDomain};
use crate::text_utils::{resolve_date, slugify};

pub const DEFAULT_ARTICLE_DIR: &str = "article";

/// Everything the frontmatter and the writer need to know about a post.
#[derive(Debug, Clone, PartialEq)]
pub struct PostMetadata {
    pub title: String,
    pub date: DateTime<Local>,
    pub slug: String,
    pub description: String,
    pub thumbnail_url: Option<String>,
    /// Text of the first `category` entry, the trip label.
    pub trip: Option<String>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub draft: bool,
    pub author: String,
    pub directory: String,
    pub hero_urls: Vec<String>,
}

pub fn resolve_slug(post: &PostRecord) -> String {
    if post.slug.is_empty() {
        slugify(&post.title)
    } else {
        post.slug.clone()
    }
}

/// WordPress ids are compared loosely: `"42"`, `" 42"` and `"042"` all match.
fn loose_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    if a == b {
        return true;
    }
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x == y,
        _ => false,
    }
}

pub fn thumbnail_id(post: &PostRecord) -> Option<&str> {
    post.meta_values("_thumbnail_id").next()
}

pub fn find_thumbnail<'a>(thumbnail_id: &str, attachments: &'a [AttachmentRecord]) -> Option<&'a AttachmentRecord> {
    attachments.iter().find(|a| loose_eq(&a.post_id, thumbnail_id))
}

/// Applies the directory rules in order. Later matches override earlier ones.
pub fn article_directory(categories: &[String], rules: &[DirectoryRule]) -> String {
    let mut directory = DEFAULT_ARTICLE_DIR.to_string();
    for rule in rules {
        if rule.categories.iter().any(|c| categories.contains(c)) {
            directory = rule.directory.clone();
        }
    }
    directory
}

fn hero_urls(post: &PostRecord) -> Vec<String> {
    post.meta.iter()
        .filter(|m| m.key.contains("opengraph-image") || m.key.contains("twitter-image"))
        .map(|m| m.value.clone())
        .filter(|url| url.starts_with("http"))
        .collect()
}

pub fn extract_metadata(post: &PostRecord, attachments: &[AttachmentRecord], site: &Site) -> Result<PostMetadata, ConvertError> {
    let title = post.title.clone();

    let date = resolve_date(&post.pub_date, &post.post_date).ok_or_else(|| ConvertError::InvalidDate {
        title: title.clone(),
        pub_date: post.pub_date.clone(),
        post_date: post.post_date.clone(),
    })?;

    let thumbnail_url = match thumbnail_id(post) {
        Some(id) => match find_thumbnail(id, attachments) {
            Some(attachment) => Some(attachment.attachment_url.clone()),
            None if site.missing_thumbnail() == MissingThumbnail::Fail => {
                return Err(ConvertError::MissingThumbnail { title, thumbnail_id: id.to_string() });
            }
            None => None,
        },
        None if site.missing_thumbnail() == MissingThumbnail::Fail => {
            return Err(ConvertError::MissingThumbnail { title, thumbnail_id: String::new() });
        }
        None => None,
    };

    let first_category = post.in_domain(&TaxonomyDomain::Category).next();
    let categories: Vec<String> = post.in_domain(&TaxonomyDomain::Category).map(|c| c.name.clone()).collect();
    let tags: Vec<String> = post.in_domain(&TaxonomyDomain::PostTag).map(|c| c.name.clone()).collect();

    let directory = match site.layout {
        Layout::Trip => match first_category {
            Some(category) if !category.nicename.is_empty() => category.nicename.clone(),
            Some(category) => slugify(&category.name),
            None => return Err(ConvertError::MissingCategory { title }),
        },
        Layout::Article => article_directory(&categories, &site.directory_rules()),
    };

    Ok(PostMetadata {
        slug: resolve_slug(post),
        date,
        description: post.excerpt_html.clone(),
        thumbnail_url,
        trip: first_category.map(|c| c.name.clone()),
        categories,
        tags,
        draft: post.status == PostStatus::Draft,
        author: post.author.clone(),
        directory,
        hero_urls: hero_urls(post),
        title,
    })
}

use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use spdlog::{debug, info};

use crate::error::ExportError;
use crate::export::{AttachmentRecord, CategoryRef, CategoryTaxonomy, ExportData, PostMeta, PostRecord, PostStatus};

#[derive(Default)]
struct RawItem {
    post_type: String,
    id: String,
    title: String,
    pub_date: String,
    post_date: String,
    slug: String,
    content: String,
    excerpt: String,
    status: String,
    author: String,
    attachment_url: String,
    categories: Vec<CategoryRef>,
    meta: Vec<PostMeta>,
}

#[derive(Default)]
struct RawCategory {
    title: String,
    slug: String,
    parent: String,
    description: String,
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

impl RawItem {
    fn set_field(&mut self, name: &str, value: String) {
        match name {
            "content:encoded" => self.content = value,
            "excerpt:encoded" => self.excerpt = value.trim().to_string(),
            _ => {
                let value = value.trim().to_string();
                match name {
                    "wp:post_type" => self.post_type = value,
                    "wp:post_id" => self.id = value,
                    "title" => self.title = value,
                    "pubDate" => self.pub_date = value,
                    "wp:post_date" => self.post_date = value,
                    "wp:post_name" => self.slug = value,
                    "wp:status" => self.status = value,
                    "dc:creator" => self.author = value,
                    "wp:attachment_url" => self.attachment_url = value,
                    _ => {}
                }
            }
        }
    }

    fn store(self, export: &mut ExportData) {
        match self.post_type.as_str() {
            "post" => export.posts.push(PostRecord {
                id: self.id,
                title: self.title,
                pub_date: self.pub_date,
                post_date: self.post_date,
                slug: self.slug,
                content_html: self.content,
                excerpt_html: self.excerpt,
                status: PostStatus::from(self.status.as_str()),
                author: self.author,
                categories: self.categories,
                meta: self.meta,
            }),
            "attachment" => export.attachments.push(AttachmentRecord {
                post_id: self.id,
                attachment_url: self.attachment_url,
            }),
            other => debug!("Skipping item '{}' of type {}", self.title, other),
        }
    }
}

fn category_attrs(e: &BytesStart) -> Result<(String, String), quick_xml::Error> {
    let mut domain = String::new();
    let mut nicename = String::new();

    for attr in e.attributes() {
        let attr = attr?;
        let value = attr.unescape_value()?.to_string();
        match attr.key.as_ref() {
            b"domain" => domain = value,
            b"nicename" => nicename = value,
            _ => {}
        }
    }

    Ok((domain, nicename))
}

fn xml_error<R>(reader: &Reader<R>, source: quick_xml::Error) -> ExportError {
    ExportError::Xml {
        position: reader.buffer_position() as u64,
        source,
    }
}

/// Parses a whole WXR document.
///
/// Only `post` and `attachment` items are kept; pages, menu items and the
/// like are skipped. Channel level `<wp:category>` entries become the
/// category taxonomy.
pub fn parse_export(xml: &str) -> Result<ExportData, ExportError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut export = ExportData::default();
    let mut stack: Vec<String> = vec![];
    let mut text = String::new();
    let mut seen_channel = false;

    let mut item: Option<RawItem> = None;
    let mut taxonomy: Option<RawCategory> = None;
    let mut category_ref: Option<(String, String)> = None;
    let mut meta: Option<PostMeta> = None;

    loop {
        let event = match reader.read_event_into(&mut buf) {
            Ok(event) => event,
            Err(e) => return Err(xml_error(&reader, e)),
        };

        match event {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                text.clear();

                match name.as_str() {
                    "channel" => seen_channel = true,
                    "item" => item = Some(RawItem::default()),
                    "wp:category" if item.is_none() => taxonomy = Some(RawCategory::default()),
                    "category" if item.is_some() => {
                        let attrs = category_attrs(&e).map_err(|e| xml_error(&reader, e))?;
                        category_ref = Some(attrs);
                    }
                    "wp:postmeta" => meta = Some(PostMeta { key: String::new(), value: String::new() }),
                    _ => {}
                }

                stack.push(name);
            }
            Event::Text(e) => {
                let value = e.unescape().map_err(|e| xml_error(&reader, quick_xml::Error::from(e)))?;
                text.push_str(&value);
            }
            Event::CData(e) => {
                text.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Event::End(_) => {
                let name = stack.pop().unwrap_or_default();
                let parent = stack.last().map(|s| s.as_str()).unwrap_or_default();
                let value = std::mem::take(&mut text);

                match (parent, name.as_str()) {
                    (_, "item") => {
                        if let Some(raw) = item.take() {
                            raw.store(&mut export);
                        }
                    }
                    ("channel", "wp:category") => {
                        if let Some(raw) = taxonomy.take() {
                            export.categories.push(CategoryTaxonomy {
                                title: raw.title,
                                slug: raw.slug,
                                parent_slug: non_empty(raw.parent),
                                description: non_empty(raw.description),
                            });
                        }
                    }
                    ("wp:category", field) => {
                        if let Some(ref mut raw) = taxonomy {
                            let value = value.trim().to_string();
                            match field {
                                "wp:cat_name" => raw.title = value,
                                "wp:category_nicename" => raw.slug = value,
                                "wp:category_parent" => raw.parent = value,
                                "wp:category_description" => raw.description = value,
                                _ => {}
                            }
                        }
                    }
                    ("wp:postmeta", field) => {
                        if let Some(ref mut m) = meta {
                            match field {
                                "wp:meta_key" => m.key = value.trim().to_string(),
                                "wp:meta_value" => m.value = value.trim().to_string(),
                                _ => {}
                            }
                        }
                    }
                    ("item", "wp:postmeta") => {
                        if let (Some(m), Some(ref mut raw)) = (meta.take(), item.as_mut()) {
                            raw.meta.push(m);
                        }
                    }
                    ("item", "category") => {
                        if let (Some((domain, nicename)), Some(ref mut raw)) = (category_ref.take(), item.as_mut()) {
                            raw.categories.push(CategoryRef {
                                name: value.trim().to_string(),
                                domain: domain.as_str().into(),
                                nicename,
                            });
                        }
                    }
                    ("item", field) => {
                        if let Some(ref mut raw) = item {
                            raw.set_field(field, value);
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !seen_channel {
        return Err(ExportError::MissingChannel);
    }

    Ok(export)
}

pub async fn read_export(path: &Path) -> Result<ExportData, ExportError> {
    let xml = tokio::fs::read_to_string(path).await.map_err(|source| ExportError::Read {
        path: path.display().to_string(),
        source,
    })?;

    let export = parse_export(&xml)?;
    info!("Parsed export {}: {} posts, {} attachments, {} categories",
        path.display(), export.posts.len(), export.attachments.len(), export.categories.len());

    Ok(export)
}

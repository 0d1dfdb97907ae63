use crate::config::Trip;
use crate::export::CategoryTaxonomy;
use crate::metadata::PostMetadata;
use crate::text_utils::format_iso_local;

/// YAML frontmatter, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frontmatter {
    lines: Vec<String>,
}

pub fn single_quoted(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

pub fn double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn needs_quotes(value: &str) -> bool {
    const INDICATORS: &[char] = &['-', '?', ':', ',', '[', ']', '{', '}', '#', '&', '*', '!', '|', '>', '\'', '"', '%', '@', '`'];
    const RESERVED: &[&str] = &["true", "false", "yes", "no", "on", "off", "null", "~", "y", "n"];

    value.is_empty()
        || value.starts_with(INDICATORS)
        || value.starts_with(char::is_whitespace)
        || value.ends_with(char::is_whitespace)
        || value.ends_with(':')
        || value.contains(": ")
        || value.contains(" #")
        || value.contains(|c: char| c.is_control())
        || RESERVED.contains(&value.to_lowercase().as_str())
        || value.parse::<f64>().is_ok()
}

/// Plain scalar when YAML reads it back unchanged, quoted otherwise.
pub fn yaml_scalar(value: &str) -> String {
    if !needs_quotes(value) {
        value.to_string()
    } else if value.contains(|c: char| c.is_control()) {
        double_quoted(value)
    } else {
        single_quoted(value)
    }
}

impl Frontmatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value written exactly as given.
    pub fn raw(&mut self, key: &str, value: &str) -> &mut Self {
        self.lines.push(format!("{}: {}", key, value));
        self
    }

    pub fn scalar(&mut self, key: &str, value: &str) -> &mut Self {
        self.raw(key, &yaml_scalar(value))
    }

    pub fn optional(&mut self, key: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            self.scalar(key, value);
        }
        self
    }

    /// Block list. Nothing is written for an empty list.
    pub fn list(&mut self, key: &str, items: &[String]) -> &mut Self {
        if items.is_empty() {
            return self;
        }

        self.lines.push(format!("{}:", key));
        for item in items {
            self.lines.push(format!("  - {}", yaml_scalar(item)));
        }
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::from("---\n");
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str("---\n");
        out
    }
}

fn flow_list(values: &[i64]) -> String {
    let values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("[{}]", values.join(", "))
}

pub fn trip_frontmatter(meta: &PostMetadata, trip: &Trip, hero: Option<&str>) -> Frontmatter {
    let mut fm = Frontmatter::new();
    fm.raw("title", &single_quoted(&meta.title))
        .raw("date", &format_iso_local(&meta.date))
        .raw("description", &double_quoted(&meta.description))
        .scalar("trip", meta.trip.as_deref().unwrap_or_default())
        .scalar("place", &trip.place)
        .scalar("timezone", &trip.timezone)
        .scalar("location", &trip.location)
        .optional("image", meta.thumbnail_url.as_deref())
        .scalar("gallery", &trip.gallery)
        .raw("map", &flow_list(&trip.map))
        .optional("hero", hero)
        .list("tags", &meta.tags);
    fm
}

pub fn article_frontmatter(meta: &PostMetadata, include_author: bool, hero: Option<&str>) -> Frontmatter {
    let mut fm = Frontmatter::new();
    if include_author {
        fm.scalar("author", &meta.author);
    }
    fm.raw("title", &single_quoted(&meta.title))
        .raw("date", &format_iso_local(&meta.date))
        .raw("description", &double_quoted(&meta.description))
        .optional("image", meta.thumbnail_url.as_deref());
    if meta.draft {
        fm.raw("draft", "true");
    }
    fm.optional("hero", hero)
        .list("categories", &meta.categories)
        .list("tags", &meta.tags);
    fm
}

pub fn category_frontmatter(category: &CategoryTaxonomy) -> Frontmatter {
    let mut fm = Frontmatter::new();
    fm.raw("title", &single_quoted(&category.title))
        .optional("parent", category.parent_slug.as_deref());
    if let Some(description) = &category.description {
        fm.raw("description", &double_quoted(description));
    }
    fm
}

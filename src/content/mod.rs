//! Turns the HTML body of a WordPress post into clean markdown.
//!
//! [`parse`] repairs and parses the body into a [`Fragment`]. The fragment
//! can be changed in place (see the image localizer) before
//! [`Fragment::into_markdown`] runs the rest of the pipeline.

use crate::error::NormalizeError;

pub mod blocks;
pub mod code_blocks;
pub mod convert;
pub mod embeds;
pub mod fragment;
pub mod repair;
pub mod shortcodes;

pub use fragment::{Element, Fragment, Node};

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedContent {
    pub markdown: String,
    /// Unbalanced tags and dropped elements. Never fatal.
    pub warnings: Vec<String>,
}

pub fn parse(raw_html: &str) -> Fragment {
    let repaired = repair::repair_html(raw_html);
    let mut fragment = Fragment::parse(&repaired);
    blocks::promote_lazy_images(&mut fragment.nodes);
    fragment
}

impl Fragment {
    pub fn into_markdown(self) -> Result<NormalizedContent, NormalizeError> {
        let Fragment { mut nodes, mut warnings } = self;

        fragment::remove_comments(&mut nodes);
        code_blocks::fix_code_blocks(&mut nodes);
        embeds::normalize_embeds(&mut nodes);
        blocks::drop_unsupported(&mut nodes, &mut warnings);
        shortcodes::cleanup_shortcodes(&mut nodes);
        blocks::wrap_paragraphs(&mut nodes);

        let markdown = convert::to_markdown(&nodes)?;
        let markdown = convert::unescape_url_underscores(&markdown);
        convert::validate(&markdown)?;

        Ok(NormalizedContent { markdown, warnings })
    }
}

pub fn normalize(raw_html: &str) -> Result<NormalizedContent, NormalizeError> {
    parse(raw_html).into_markdown()
}

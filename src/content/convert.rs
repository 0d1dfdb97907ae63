use htmd::element_handler::{HandlerResult, Handlers};
use htmd::options::{BulletListMarker, CodeBlockFence, CodeBlockStyle, HeadingStyle, Options};
use htmd::{Element, HtmlToMarkdown};
use lazy_static::lazy_static;
use markdown::ParseOptions;
use regex::Regex;

use crate::content::fragment::{converter_html, Node, RAW_MARKDOWN_ATTR, RAW_MARKDOWN_TAG};
use crate::error::NormalizeError;

lazy_static! {
    static ref URL_START_REGEX: Regex = Regex::new(r"https?://").unwrap();
}

fn converter() -> HtmlToMarkdown {
    HtmlToMarkdown::builder()
        .options(Options {
            heading_style: HeadingStyle::Atx,
            bullet_list_marker: BulletListMarker::Dash,
            code_block_style: CodeBlockStyle::Fenced,
            code_block_fence: CodeBlockFence::Backticks,
            ..Default::default()
        })
        .add_handler(vec![RAW_MARKDOWN_TAG], |_: &dyn Handlers, element: Element| {
            let markdown = element.attrs.iter()
                .find(|a| a.name.local.to_string() == RAW_MARKDOWN_ATTR)
                .map(|a| a.value.to_string())?;

            Some(HandlerResult {
                content: format!("\n\n{}\n\n", markdown),
                markdown_translated: true,
            })
        })
        .build()
}

/// Serializes the cleaned tree. Raw nodes come out verbatim as their own
/// blocks; everything else goes through `htmd`.
pub fn to_markdown(nodes: &[Node]) -> Result<String, NormalizeError> {
    let html = converter_html(nodes);
    let markdown = converter().convert(&html)
        .map_err(|e| NormalizeError::Convert(e.to_string()))?;

    let markdown = markdown.trim();
    if markdown.is_empty() {
        return Ok(String::new());
    }
    Ok(format!("{}\n", markdown))
}

/// Undoes underscore escaping inside URLs: on every newline terminated line,
/// `\_` after the first `http://` or `https://` becomes `_`.
pub fn unescape_url_underscores(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len());

    for line in markdown.split_inclusive('\n') {
        match URL_START_REGEX.find(line) {
            Some(m) if line.ends_with('\n') => {
                let (head, tail) = line.split_at(m.start());
                out.push_str(head);
                out.push_str(&tail.replace("\\_", "_"));
            }
            _ => out.push_str(line),
        }
    }

    out
}

/// The output has to parse as markdown before it is written anywhere.
pub fn validate(markdown: &str) -> Result<(), NormalizeError> {
    markdown::to_mdast(markdown, &ParseOptions::default())
        .map_err(|e| NormalizeError::Markdown(e.to_string()))?;
    Ok(())
}

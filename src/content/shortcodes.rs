use lazy_static::lazy_static;
use regex::Regex;

use crate::content::fragment::{Element, Node};

lazy_static! {
    static ref SHORTCODE_RULES: Vec<(Regex, &'static str)> = vec![
        (Regex::new(r"\[embed\]\s*(\S+?)\s*\[/embed\]").unwrap(), "$1"),
        (Regex::new(r"\[(?:youtube|vimeo)[=\s]+([^\]\s]+)[^\]]*\]").unwrap(), "$1"),
        (Regex::new(r"\[/?caption[^\]]*\]").unwrap(), ""),
        (Regex::new(r"\[/?gallery[^\]]*\]").unwrap(), ""),
        (Regex::new(r"\[/?contact-form(?:-7)?[^\]]*\]").unwrap(), ""),
        // Visual Composer, Divi, Avada and Enfold layout tokens
        (Regex::new(r"\[/?(?:vc_|et_pb_|fusion_|av_)[\w-]*[^\]]*\]").unwrap(), ""),
    ];
    static ref SPACES_REGEX: Regex = Regex::new(r" {2,}").unwrap();
}

pub fn strip_shortcodes(text: &str) -> String {
    if !text.contains('[') {
        return text.to_string();
    }

    let mut result = text.to_string();
    for (regex, replacement) in SHORTCODE_RULES.iter() {
        result = regex.replace_all(&result, *replacement).into_owned();
    }

    if result.len() != text.len() {
        result = SPACES_REGEX.replace_all(&result, " ").into_owned();
    }
    result
}

fn is_empty_block(element: &Element) -> bool {
    matches!(element.name.as_str(), "p" | "li" | "blockquote" | "ul" | "ol" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
        && element.children.iter().all(|n| match n {
            Node::Text(t) => t.trim().is_empty(),
            Node::Element(e) => e.name == "br",
            Node::Comment(_) => true,
            Node::Raw(_) => false,
        })
}

/// Removes WordPress shortcodes from text, keeping what they wrap, and
/// drops the blocks left empty.
pub fn cleanup_shortcodes(nodes: &mut Vec<Node>) {
    for node in nodes.iter_mut() {
        match node {
            Node::Text(text) => *text = strip_shortcodes(text),
            Node::Element(e) => cleanup_shortcodes(&mut e.children),
            Node::Comment(_) | Node::Raw(_) => {}
        }
    }

    nodes.retain(|n| match n {
        Node::Element(e) => !is_empty_block(e),
        _ => true,
    });
}

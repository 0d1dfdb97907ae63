use lazy_static::lazy_static;
use regex::Regex;

use crate::content::fragment::{for_each_element_mut, Element, Node};
use crate::util::html::is_block_element;

lazy_static! {
    static ref PARAGRAPH_BREAK_REGEX: Regex = Regex::new(r"\n[ \t\r]*\n").unwrap();
}

fn is_unsupported(tag: &str) -> bool {
    matches!(tag, "style" | "template" | "form" | "input" | "button" | "select" | "textarea" | "svg" | "canvas")
}

/// Removes elements that have no markdown form, with a warning for each.
pub fn drop_unsupported(nodes: &mut Vec<Node>, warnings: &mut Vec<String>) {
    nodes.retain_mut(|node| match node {
        Node::Element(e) if is_unsupported(&e.name) => {
            warnings.push(format!("dropped <{}>", e.name));
            false
        }
        Node::Element(e) => {
            drop_unsupported(&mut e.children, warnings);
            true
        }
        _ => true,
    });
}

/// Lazy loading plugins keep the real URL in `data-src` and leave `src`
/// empty or holding a `data:` placeholder.
pub fn promote_lazy_images(nodes: &mut [Node]) {
    for_each_element_mut(nodes, &mut |e| {
        if e.name != "img" {
            return;
        }

        let src = e.attr("src").map(str::trim).unwrap_or_default();
        if !src.is_empty() && !src.starts_with("data:") {
            return;
        }

        let lazy = ["data-src", "data-lazy-src"].iter()
            .filter_map(|a| e.attr(a))
            .map(str::trim)
            .find(|v| !v.is_empty())
            .map(str::to_string);
        if let Some(lazy) = lazy {
            e.set_attr("src", &lazy);
        }
    });
}

fn flush_paragraph(pending: &mut Vec<Node>, result: &mut Vec<Node>) {
    let children = std::mem::take(pending);
    let blank = children.iter().all(|n| matches!(n, Node::Text(t) if t.trim().is_empty()));
    if !blank {
        result.push(Node::Element(Element::with_children("p", children)));
    }
}

/// Wraps bare top-level text and inline elements into paragraphs, breaking
/// on blank lines the way the classic editor shows them.
pub fn wrap_paragraphs(nodes: &mut Vec<Node>) {
    let mut result = Vec::with_capacity(nodes.len());
    let mut pending: Vec<Node> = vec![];

    for node in nodes.drain(..) {
        match node {
            Node::Text(text) => {
                for (i, segment) in PARAGRAPH_BREAK_REGEX.split(&text).enumerate() {
                    if i > 0 {
                        flush_paragraph(&mut pending, &mut result);
                    }
                    if !segment.is_empty() {
                        pending.push(Node::Text(segment.to_string()));
                    }
                }
            }
            Node::Element(e) if !is_block_element(&e.name) => pending.push(Node::Element(e)),
            other => {
                flush_paragraph(&mut pending, &mut result);
                result.push(other);
            }
        }
    }

    flush_paragraph(&mut pending, &mut result);
    *nodes = result;
}

use html5ever::tendril::TendrilSink;
use html5ever::{parse_fragment, LocalName, Namespace, ParseOpts, QualName};
use lazy_static::lazy_static;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use regex::Regex;

use crate::util::html::{escape, is_void_element};

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Custom element standing in for a [`Node::Raw`] when the tree is handed
/// to the markdown converter.
pub const RAW_MARKDOWN_TAG: &str = "wxr-raw";
pub const RAW_MARKDOWN_ATTR: &str = "data-markdown";

/// Owned HTML tree of a post body. Text and attribute values are stored
/// decoded; [`Fragment::to_html`] escapes them again.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
    /// Markdown that goes to the output as is: fenced code and embedded HTML.
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Element {
            name: name.to_string(),
            attrs: vec![],
            children: vec![],
        }
    }

    pub fn with_children(name: &str, children: Vec<Node>) -> Self {
        Element {
            children,
            ..Element::new(name)
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attrs.push((name.to_string(), value.to_string())),
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|c| c.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn text_content(&self) -> String {
        let mut buf = String::new();
        collect_text(&self.children, &mut buf);
        buf
    }

    pub fn to_html(&self) -> String {
        let mut buf = String::new();
        write_element(self, &mut buf, false);
        buf
    }
}

fn collect_text(nodes: &[Node], buf: &mut String) {
    for node in nodes {
        match node {
            Node::Element(e) => collect_text(&e.children, buf),
            Node::Text(t) => buf.push_str(t),
            Node::Comment(_) | Node::Raw(_) => {}
        }
    }
}

fn write_nodes(nodes: &[Node], buf: &mut String, raw_markers: bool) {
    for node in nodes {
        match node {
            Node::Element(e) => write_element(e, buf, raw_markers),
            Node::Text(t) => buf.push_str(&escape(t)),
            Node::Comment(c) => {
                buf.push_str("<!--");
                buf.push_str(c);
                buf.push_str("-->");
            }
            Node::Raw(markdown) if raw_markers => {
                buf.push_str(&format!(
                    "<{tag} {attr}=\"{}\"></{tag}>",
                    escape(markdown),
                    tag = RAW_MARKDOWN_TAG,
                    attr = RAW_MARKDOWN_ATTR,
                ));
            }
            Node::Raw(markdown) => buf.push_str(markdown),
        }
    }
}

fn write_element(element: &Element, buf: &mut String, raw_markers: bool) {
    buf.push('<');
    buf.push_str(&element.name);
    for (key, value) in &element.attrs {
        buf.push(' ');
        buf.push_str(key);
        if !value.is_empty() {
            buf.push_str("=\"");
            buf.push_str(&escape(value));
            buf.push('"');
        }
    }
    buf.push('>');

    if is_void_element(&element.name) {
        return;
    }

    write_nodes(&element.children, buf, raw_markers);
    buf.push_str("</");
    buf.push_str(&element.name);
    buf.push('>');
}

/// HTML for the markdown converter: raw nodes become [`RAW_MARKDOWN_TAG`]
/// elements carrying their markdown in [`RAW_MARKDOWN_ATTR`].
pub fn converter_html(nodes: &[Node]) -> String {
    let mut buf = String::new();
    write_nodes(nodes, &mut buf, true);
    buf
}

pub fn for_each_element(nodes: &[Node], f: &mut dyn FnMut(&Element)) {
    for node in nodes {
        if let Node::Element(e) = node {
            f(e);
            for_each_element(&e.children, f);
        }
    }
}

pub fn for_each_element_mut(nodes: &mut [Node], f: &mut dyn FnMut(&mut Element)) {
    for node in nodes.iter_mut() {
        if let Node::Element(e) = node {
            f(e);
            for_each_element_mut(&mut e.children, f);
        }
    }
}

/// Drops every comment node, WordPress block markers included.
pub fn remove_comments(nodes: &mut Vec<Node>) {
    nodes.retain(|n| !matches!(n, Node::Comment(_)));
    for node in nodes.iter_mut() {
        if let Node::Element(e) = node {
            remove_comments(&mut e.children);
        }
    }
}

fn ends_url(c: char) -> bool {
    c.is_whitespace() || matches!(c, '"' | '\'' | '<' | '>' | '(' | ')' | '[' | ']' | ',')
}

/// Replaces whole occurrences of `from`: a match followed by more URL
/// characters (`a.jpg` inside `a.jpg.webp`) is left alone.
fn replace_url(value: &str, from: &str, to: &str) -> Option<String> {
    let mut result = String::with_capacity(value.len());
    let mut replaced = false;
    let mut rest = value;

    while let Some(pos) = rest.find(from) {
        let end = pos + from.len();
        result.push_str(&rest[..pos]);
        if rest[end..].chars().next().map_or(true, ends_url) {
            result.push_str(to);
            replaced = true;
        } else {
            result.push_str(from);
        }
        rest = &rest[end..];
    }

    if !replaced {
        return None;
    }
    result.push_str(rest);
    Some(result)
}

fn rewrite_nodes(nodes: &mut [Node], from: &str, to: &str) -> usize {
    let mut count = 0;
    for node in nodes.iter_mut() {
        match node {
            Node::Element(e) => {
                for (_, value) in e.attrs.iter_mut() {
                    if let Some(rewritten) = replace_url(value, from, to) {
                        *value = rewritten;
                        count += 1;
                    }
                }
                count += rewrite_nodes(&mut e.children, from, to);
            }
            Node::Text(text) => {
                if let Some(rewritten) = replace_url(text, from, to) {
                    *text = rewritten;
                    count += 1;
                }
            }
            Node::Comment(_) | Node::Raw(_) => {}
        }
    }
    count
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub nodes: Vec<Node>,
    pub warnings: Vec<String>,
}

impl Fragment {
    /// Parses an HTML fragment the way a browser parses the inside of a
    /// `<body>`. Malformed markup never fails the parse, it only shows up in
    /// `warnings`.
    pub fn parse(html: &str) -> Fragment {
        let context = QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from("body"));
        let dom = parse_fragment(RcDom::default(), ParseOpts::default(), context, vec![])
            .one(html);

        // The parsed nodes hang off a synthetic <html> root
        let root = dom.document.children.borrow().iter()
            .find(|h| matches!(h.data, NodeData::Element { .. }))
            .cloned();

        Fragment {
            nodes: root.map(|root| convert_children(&root)).unwrap_or_default(),
            warnings: lint_tags(html),
        }
    }

    pub fn to_html(&self) -> String {
        let mut buf = String::new();
        write_nodes(&self.nodes, &mut buf, false);
        buf
    }

    /// `src` values of images, in document order and without duplicates.
    pub fn image_sources(&self) -> Vec<String> {
        let mut sources: Vec<String> = vec![];
        for_each_element(&self.nodes, &mut |e| {
            if !matches!(e.name.as_str(), "img" | "source") {
                return;
            }
            if let Some(src) = e.attr("src") {
                let src = src.trim();
                if !src.is_empty() && !src.ends_with(".js") && !sources.iter().any(|s| s == src) {
                    sources.push(src.to_string());
                }
            }
        });
        sources
    }

    /// Replaces every occurrence of the URL `from`, in attribute values
    /// (`srcset` lists included) and in text. Returns how many attributes
    /// and text nodes changed.
    pub fn rewrite_url(&mut self, from: &str, to: &str) -> usize {
        if from.is_empty() {
            return 0;
        }
        rewrite_nodes(&mut self.nodes, from, to)
    }
}

fn convert_children(handle: &Handle) -> Vec<Node> {
    handle.children.borrow().iter()
        .filter_map(convert_node)
        .collect()
}

fn convert_node(handle: &Handle) -> Option<Node> {
    match &handle.data {
        NodeData::Element { name, attrs, .. } => {
            let attrs = attrs.borrow().iter()
                .map(|a| (a.name.local.to_string(), a.value.to_string()))
                .collect();

            Some(Node::Element(Element {
                name: name.local.to_string(),
                attrs,
                children: convert_children(handle),
            }))
        }
        NodeData::Text { contents } => Some(Node::Text(contents.borrow().to_string())),
        NodeData::Comment { contents } => Some(Node::Comment(contents.to_string())),
        _ => None,
    }
}

/// Elements whose end tag may be left out.
fn is_optional_close(tag: &str) -> bool {
    matches!(tag, "p" | "li" | "dt" | "dd" | "tr" | "td" | "th" | "thead" | "tbody" | "tfoot" | "option")
}

/// Scans the tags of `html` and reports unclosed and stray ones. Script and
/// style bodies are raw text and never scanned.
pub fn lint_tags(html: &str) -> Vec<String> {
    lazy_static! {
        static ref COMMENT_REGEX: Regex = Regex::new(r"(?s)<!--.*?-->").unwrap();
        static ref RAW_TEXT_REGEX: Regex =
            Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>").unwrap();
        static ref TAG_REGEX: Regex = Regex::new(r"<(/?)([a-zA-Z][a-zA-Z0-9-]*)(?:\s[^>]*?)?(/?)>").unwrap();
    }

    let html = COMMENT_REGEX.replace_all(html, "");
    let html = RAW_TEXT_REGEX.replace_all(&html, "");
    let mut warnings = vec![];
    let mut stack: Vec<String> = vec![];

    for cap in TAG_REGEX.captures_iter(&html) {
        let closing = !cap[1].is_empty();
        let self_closing = !cap[3].is_empty();
        let tag = cap[2].to_lowercase();

        if is_void_element(&tag) || self_closing {
            continue;
        }

        if !closing {
            stack.push(tag);
            continue;
        }

        match stack.iter().rposition(|t| *t == tag) {
            Some(pos) => {
                for unclosed in stack.drain(pos..).skip(1) {
                    if !is_optional_close(&unclosed) {
                        warnings.push(format!("unclosed <{}> before </{}>", unclosed, tag));
                    }
                }
            }
            None => warnings.push(format!("stray </{}>", tag)),
        }
    }

    for unclosed in stack {
        if !is_optional_close(&unclosed) {
            warnings.push(format!("unclosed <{}>", unclosed));
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(node: &Node) -> &Element {
        match node {
            Node::Element(e) => e,
            other => panic!("expected an element, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_fragment() {
        let fragment = Fragment::parse(r#"<p class="lead">Fish &amp; <b>chips</b></p><!-- wp:more -->"#);
        assert_eq!(fragment.nodes.len(), 2);

        let p = element(&fragment.nodes[0]);
        assert_eq!(p.name, "p");
        assert!(p.has_class("lead"));
        assert_eq!(p.text_content(), "Fish & chips");
        assert_eq!(fragment.nodes[1], Node::Comment(" wp:more ".to_string()));
        assert!(fragment.warnings.is_empty());
    }

    #[test]
    fn test_round_trip_html() {
        let html = r#"<p>a &lt; b <img src="x.png" alt="&quot;q&quot;"></p>"#;
        assert_eq!(Fragment::parse(html).to_html(), html);
    }

    #[test]
    fn test_named_and_numeric_references() {
        let fragment = Fragment::parse("<p title=\"caf&eacute;\">&frac12; &rarr; na&iuml;ve &hearts; &#x27;&#65;</p>");
        let p = element(&fragment.nodes[0]);
        assert_eq!(p.attr("title"), Some("café"));
        assert_eq!(p.text_content(), "½ → naïve ♥ 'A");
    }

    #[test]
    fn test_invalid_references_replaced() {
        let fragment = Fragment::parse("<p>x &#0; y &#xD800; z &#x110000;</p>");
        let text = element(&fragment.nodes[0]).text_content();
        assert!(!text.contains('\0'));
        assert_eq!(text, "x \u{FFFD} y \u{FFFD} z \u{FFFD}");

        // C1 controls map to their windows-1252 characters
        let fragment = Fragment::parse("<p>&#128;&#150;</p>");
        assert_eq!(element(&fragment.nodes[0]).text_content(), "\u{20AC}\u{2013}");
    }

    #[test]
    fn test_bare_ampersands_kept() {
        let fragment = Fragment::parse("<p>fish & chips; ?a=1&b=2 &unknown;</p>");
        assert_eq!(element(&fragment.nodes[0]).text_content(), "fish & chips; ?a=1&b=2 &unknown;");
    }

    #[test]
    fn test_implied_end_tags() {
        let fragment = Fragment::parse("<ul><li>a<li>b</ul><p>one<p>two");
        let list = element(&fragment.nodes[0]);
        let items: Vec<String> = list.children.iter().map(|n| element(n).text_content()).collect();
        assert_eq!(items, vec!["a", "b"]);
        assert_eq!(fragment.nodes.len(), 3);
        assert_eq!(element(&fragment.nodes[2]).text_content(), "two");
    }

    #[test]
    fn test_script_is_raw_text() {
        let fragment = Fragment::parse("<div>a<script>if (a < b) { document.write('<p>') }</script>b</div>");
        let div = element(&fragment.nodes[0]);
        assert_eq!(div.children.len(), 3);
        assert_eq!(div.children[2], Node::Text("b".to_string()));
        assert!(fragment.warnings.is_empty());
    }

    #[test]
    fn test_remove_comments() {
        let mut fragment = Fragment::parse("<!-- a --><div><!-- b --><p>x</p></div>");
        remove_comments(&mut fragment.nodes);
        assert_eq!(fragment.to_html(), "<div><p>x</p></div>");
    }

    #[test]
    fn test_raw_nodes_in_converter_html() {
        let nodes = vec![
            Node::Element(Element::with_children("p", vec![Node::Text("a".to_string())])),
            Node::Raw("```\nx < y\n```".to_string()),
        ];
        assert_eq!(
            converter_html(&nodes),
            "<p>a</p><wxr-raw data-markdown=\"```\nx &lt; y\n```\"></wxr-raw>"
        );
    }

    #[test]
    fn test_lint_tags() {
        assert!(lint_tags("<p>one<p>two<ul><li>a<li>b</ul>").is_empty());
        assert_eq!(lint_tags("<div><span>x</div>"), vec!["unclosed <span> before </div>"]);
        assert_eq!(lint_tags("text</em>"), vec!["stray </em>"]);
        assert_eq!(lint_tags("<blockquote>quote"), vec!["unclosed <blockquote>"]);
        assert!(lint_tags("<!-- <div> --><br/><img src=x>").is_empty());
        assert!(lint_tags("<style>p > em { }</style><script>'</div>'</script>").is_empty());
    }

    #[test]
    fn test_image_sources_and_rewrite() {
        let mut fragment = Fragment::parse(concat!(
            r#"<a href="https://x.com/a.jpg"><img src="https://x.com/a.jpg"></a>"#,
            r#"<img src="https://x.com/a.jpg"><img src="./img/b.png">"#,
            r#"<script src="https://x.com/app.js"></script><img src="https://x.com/c.gif">"#,
        ));

        assert_eq!(fragment.image_sources(), vec!["https://x.com/a.jpg", "./img/b.png", "https://x.com/c.gif"]);
        assert_eq!(fragment.rewrite_url("https://x.com/a.jpg", "./img/a.jpg"), 3);
        assert_eq!(fragment.image_sources(), vec!["./img/a.jpg", "./img/b.png", "https://x.com/c.gif"]);
    }

    #[test]
    fn test_rewrite_srcset_and_text() {
        let mut fragment = Fragment::parse(concat!(
            r#"<img src="https://x.com/a.jpg" srcset="https://x.com/a.jpg 1x, https://x.com/a-2x.jpg 2x">"#,
            r#"<a href="https://x.com/a.jpg.webp">https://x.com/a.jpg</a>"#,
        ));

        assert_eq!(fragment.rewrite_url("https://x.com/a.jpg", "./img/a.jpg"), 3);
        assert_eq!(fragment.to_html(), concat!(
            r#"<img src="./img/a.jpg" srcset="./img/a.jpg 1x, https://x.com/a-2x.jpg 2x">"#,
            r#"<a href="https://x.com/a.jpg.webp">./img/a.jpg</a>"#,
        ));
        assert_eq!(fragment.rewrite_url("", "./img/x.jpg"), 0);
    }
}

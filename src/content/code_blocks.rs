use lazy_static::lazy_static;
use regex::Regex;

use crate::content::fragment::{Element, Node};

lazy_static! {
    static ref BRUSH_REGEX: Regex = Regex::new(r"brush:\s*([\w+#-]+)").unwrap();
}

fn language_from(element: &Element) -> Option<String> {
    if let Some(class) = element.attr("class") {
        if let Some(cap) = BRUSH_REGEX.captures(class) {
            return Some(cap[1].to_lowercase());
        }
        let lang = class.split_whitespace()
            .find_map(|c| c.strip_prefix("language-").or_else(|| c.strip_prefix("lang-")))
            .filter(|l| !l.is_empty());
        if let Some(lang) = lang {
            return Some(lang.to_lowercase());
        }
    }

    element.attr("lang")
        .or_else(|| element.attr("data-lang"))
        .map(|l| l.trim().to_lowercase())
        .filter(|l| !l.is_empty())
}

/// Looks at the `<pre>` first, then at a `<code>` directly inside it.
fn detect_language(pre: &Element) -> Option<String> {
    language_from(pre).or_else(|| {
        pre.children.iter().find_map(|n| match n {
            Node::Element(e) if e.name == "code" => language_from(e),
            _ => None,
        })
    })
}

fn collect_code(nodes: &[Node], buf: &mut String) {
    for node in nodes {
        match node {
            Node::Text(t) => buf.push_str(t),
            Node::Element(e) if e.name == "br" => buf.push('\n'),
            Node::Element(e) => {
                collect_code(&e.children, buf);
                if matches!(e.name.as_str(), "p" | "div") && !buf.ends_with('\n') {
                    buf.push('\n');
                }
            }
            Node::Comment(_) | Node::Raw(_) => {}
        }
    }
}

pub fn code_text(pre: &Element) -> String {
    let mut buf = String::new();
    collect_code(&pre.children, &mut buf);

    let text = buf.replace('\u{00A0}', " ").replace("\r\n", "\n");
    let text = text.strip_prefix('\n').unwrap_or(&text);
    text.trim_end().to_string()
}

/// Fence long enough that no backtick run in `code` closes it early.
pub fn fenced(code: &str, lang: Option<&str>) -> String {
    let longest = code.split(|c| c != '`').map(str::len).max().unwrap_or(0);
    let fence = "`".repeat(longest.max(2) + 1);
    format!("{}{}\n{}\n{}", fence, lang.unwrap_or_default(), code, fence)
}

/// Replaces every `<pre>` with a fenced code block.
pub fn fix_code_blocks(nodes: &mut [Node]) {
    for node in nodes.iter_mut() {
        let Node::Element(e) = node else {
            continue;
        };

        if e.name != "pre" {
            fix_code_blocks(&mut e.children);
            continue;
        }

        let lang = detect_language(e);
        let code = fenced(&code_text(e), lang.as_deref());
        *node = Node::Raw(code);
    }
}

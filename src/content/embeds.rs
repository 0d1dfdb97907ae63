use crate::content::fragment::{Element, Node};

const SOCIAL_EMBED_CLASSES: [&str; 3] = ["twitter-tweet", "instagram-media", "tiktok-embed"];

fn kept_attributes(tag: &str) -> &'static [&'static str] {
    match tag {
        "iframe" => &["src", "width", "height", "title", "allow", "allowfullscreen", "frameborder", "loading"],
        "video" | "audio" => &["src", "poster", "controls", "width", "height", "loop", "muted", "preload"],
        "source" => &["src", "type"],
        "object" => &["data", "type", "width", "height"],
        "embed" => &["src", "type", "width", "height"],
        "param" => &["name", "value"],
        _ => &["class", "cite", "lang", "dir", "href"],
    }
}

fn fix_protocol(value: &str) -> String {
    match value.strip_prefix("//") {
        Some(rest) => format!("https://{}", rest),
        None => value.to_string(),
    }
}

/// Copy of an embed element with only harmless attributes, protocol
/// relative URLs made absolute and scripts removed.
fn sanitize(element: &Element) -> Element {
    let allowed = kept_attributes(&element.name);
    let attrs = element.attrs.iter()
        .filter(|(k, _)| allowed.contains(&k.as_str()) || k.starts_with("data-"))
        .map(|(k, v)| match k.as_str() {
            "src" | "data" | "href" | "poster" => (k.clone(), fix_protocol(v)),
            _ => (k.clone(), v.clone()),
        })
        .collect();

    let children = element.children.iter()
        .filter_map(|n| match n {
            Node::Element(e) if is_script(e) => None,
            Node::Element(e) => Some(Node::Element(sanitize(e))),
            Node::Comment(_) => None,
            other => Some(other.clone()),
        })
        .collect();

    Element {
        name: element.name.clone(),
        attrs,
        children,
    }
}

fn is_script(element: &Element) -> bool {
    matches!(element.name.as_str(), "script" | "noscript")
}

fn is_media(element: &Element) -> bool {
    matches!(element.name.as_str(), "iframe" | "video" | "audio" | "object" | "embed")
}

fn is_social_embed(element: &Element) -> bool {
    element.name == "blockquote" && SOCIAL_EMBED_CLASSES.iter().any(|c| element.has_class(c))
}

fn find_by_class<'a>(nodes: &'a [Node], class: &str) -> Option<&'a Element> {
    nodes.iter().find_map(|n| match n {
        Node::Element(e) if e.has_class(class) => Some(e),
        Node::Element(e) => find_by_class(&e.children, class),
        _ => None,
    })
}

/// Gutenberg embed block: the URL sits as plain text in the wrapper div.
fn block_embed(figure: &Element) -> Option<Vec<Node>> {
    let wrapper = find_by_class(&figure.children, "wp-block-embed__wrapper")?;
    let url = wrapper.text_content().trim().to_string();
    if url.is_empty() {
        return None;
    }

    let mut nodes = vec![Node::Element(Element::with_children("p", vec![Node::Text(url)]))];

    let caption = figure.children.iter().find_map(|n| match n {
        Node::Element(e) if e.name == "figcaption" => Some(e),
        _ => None,
    });
    if let Some(caption) = caption {
        if !caption.text_content().trim().is_empty() {
            nodes.push(Node::Element(Element::with_children("p", caption.children.clone())));
        }
    }

    Some(nodes)
}

/// Drops scripts and turns embedded media and tables into raw HTML the
/// markdown output keeps verbatim.
pub fn normalize_embeds(nodes: &mut Vec<Node>) {
    let mut result = Vec::with_capacity(nodes.len());

    for node in nodes.drain(..) {
        let mut element = match node {
            Node::Element(e) => e,
            other => {
                result.push(other);
                continue;
            }
        };

        if is_script(&element) {
            continue;
        }

        if is_media(&element) || is_social_embed(&element) {
            result.push(Node::Raw(sanitize(&element).to_html()));
            continue;
        }

        if element.name == "table" {
            result.push(Node::Raw(element.to_html()));
            continue;
        }

        if element.name == "figure" && element.attr("class").is_some_and(|c| c.contains("wp-block-embed")) {
            if let Some(replacement) = block_embed(&element) {
                result.extend(replacement);
                continue;
            }
        }

        normalize_embeds(&mut element.children);
        result.push(Node::Element(element));
    }

    *nodes = result;
}

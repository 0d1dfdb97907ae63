use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    static ref CODE_SHORTCODE_REGEX: Regex = Regex::new(r"(?s)\[(?:sourcecode|code)([^\]]*)\](.*?)\[/(?:sourcecode|code)\]").unwrap();
    static ref SHORTCODE_LANG_REGEX: Regex = Regex::new(r#"(?:lang|language)\s*=\s*["'“”]?([\w+#-]+)"#).unwrap();

    /// Rules applied in order to the raw post body.
    static ref REPAIR_RULES: Vec<(Regex, &'static str)> = vec![
        // Attribute values delimited by curly quotes, literal or encoded
        (Regex::new(r"(\s[\w:-]+)=(?:[“”″]|&#822[01];|&#8243;)([^“”″<>]*?)(?:[“”″]|&#822[01];|&#8243;)").unwrap(), r#"$1="$2""#),
        (Regex::new(r"<p(?:\s[^>]*)?>\s*(<pre[\s>])").unwrap(), "$1"),
        (Regex::new(r"(</pre>)\s*</p>").unwrap(), "$1"),
        (Regex::new(r"</br\s*>").unwrap(), "<br>"),
        (Regex::new(r"&amp;(nbsp|amp|#[0-9]+|#x[0-9a-fA-F]+);").unwrap(), "&$1;"),
    ];
}

fn code_shortcode_to_html(caps: &Captures) -> String {
    let body = caps[2].replace('<', "&lt;").replace('>', "&gt;");

    match SHORTCODE_LANG_REGEX.captures(&caps[1]) {
        Some(lang) => format!("<pre><code class=\"language-{}\">{}</code></pre>", lang[1].to_lowercase(), body),
        None => format!("<pre><code>{}</code></pre>", body),
    }
}

/// Fixes the markup damage WordPress editors and plugins leave behind, before
/// the body is parsed.
pub fn repair_html(html: &str) -> String {
    let mut html = CODE_SHORTCODE_REGEX.replace_all(html, code_shortcode_to_html).into_owned();

    for (regex, replacement) in REPAIR_RULES.iter() {
        html = regex.replace_all(&html, *replacement).into_owned();
    }

    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curly_quoted_attributes() {
        assert_eq!(repair_html(r#"<a href=”https://x.com/a”>x</a>"#), r#"<a href="https://x.com/a">x</a>"#);
        assert_eq!(repair_html(r#"<img src=&#8221;a.png&#8221; alt=“b”>"#), r#"<img src="a.png" alt="b">"#);
        assert_eq!(repair_html("He said “hi” to me"), "He said “hi” to me");
    }

    #[test]
    fn test_pre_inside_paragraph() {
        assert_eq!(repair_html("<p><pre>x</pre></p>"), "<pre>x</pre>");
        assert_eq!(repair_html("<p class=\"a\">\n<pre class=\"b\">x</pre>\n</p>"), "<pre class=\"b\">x</pre>");
        assert_eq!(repair_html("<p>preface</p>"), "<p>preface</p>");
    }

    #[test]
    fn test_breaks_and_entities() {
        assert_eq!(repair_html("a</br>b</br >c"), "a<br>b<br>c");
        assert_eq!(repair_html("a&amp;nbsp;b &amp;#8217; c &amp; d"), "a&nbsp;b &#8217; c &amp; d");
    }

    #[test]
    fn test_code_shortcodes() {
        assert_eq!(
            repair_html("[code lang=\"Rust\"]\nif a < b {}\n[/code]"),
            "<pre><code class=\"language-rust\">\nif a &lt; b {}\n</code></pre>"
        );
        assert_eq!(repair_html("<p>[sourcecode]x[/sourcecode]</p>"), "<pre><code>x</code></pre>");
        assert_eq!(repair_html("[code language='cpp']int x;[/code]"), "<pre><code class=\"language-cpp\">int x;</code></pre>");
    }
}

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use tiny_http::{Header, Response, Server};

pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01";
pub const JPEG: &[u8] = b"\xFF\xD8\xFF\xE0\0\x10JFIF\0";
pub const GIF: &[u8] = b"GIF89a\x01\0\x01\0";

/// Serves a few fixed image paths on a background thread. Returns the base
/// URL and a counter of the requests received.
pub fn start_image_server() -> (String, Arc<AtomicUsize>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let port = server.server_addr().to_ip().unwrap().port();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    thread::spawn(move || {
        for request in server.incoming_requests() {
            counter.fetch_add(1, Ordering::SeqCst);
            let (status, content_type, body) = match request.url() {
                "/wp-content/uploads/2020/01/a.png" => (200, "image/png", PNG.to_vec()),
                "/wp-content/uploads/2020/01/og.jpg" => (200, "image/jpeg", JPEG.to_vec()),
                "/wp-content/uploads/2020/01/anim.gif" => (200, "image/gif", GIF.to_vec()),
                "/photo" => (200, "application/octet-stream", JPEG.to_vec()),
                "/page.jpg" => (200, "text/html", b"<html></html>".to_vec()),
                "/garbage.gif" => (200, "image/gif", b"not an image".to_vec()),
                _ => (500, "text/plain", b"boom".to_vec()),
            };
            let response = Response::from_data(body)
                .with_status_code(status)
                .with_header(Header::from_bytes("Content-Type", content_type).unwrap());
            let _ = request.respond(response);
        }
    });

    (format!("http://127.0.0.1:{}", port), hits)
}

pub const WXR_EXPORT: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<rss version="2.0"
	xmlns:excerpt="http://wordpress.org/export/1.2/excerpt/"
	xmlns:content="http://purl.org/rss/1.0/modules/content/"
	xmlns:dc="http://purl.org/dc/elements/1.1/"
	xmlns:wp="http://wordpress.org/export/1.2/">
<channel>
	<title>Travels through a lens</title>
	<link>https://example.com</link>
	<image>
		<url>https://example.com/icon.png</url>
		<title>Channel icon</title>
	</image>
	<wp:category>
		<wp:term_id>2</wp:term_id>
		<wp:category_nicename><![CDATA[trips]]></wp:category_nicename>
		<wp:category_parent><![CDATA[]]></wp:category_parent>
		<wp:cat_name><![CDATA[Trips]]></wp:cat_name>
		<wp:category_description><![CDATA[All the trips]]></wp:category_description>
	</wp:category>
	<wp:category>
		<wp:term_id>3</wp:term_id>
		<wp:category_nicename><![CDATA[photo-of-the-day]]></wp:category_nicename>
		<wp:category_parent><![CDATA[trips]]></wp:category_parent>
		<wp:cat_name><![CDATA[Photo of the Day]]></wp:cat_name>
	</wp:category>
	<item>
		<title>Hello 'World'</title>
		<link>https://example.com/2020/01/22/hello-world/</link>
		<pubDate>Wed, 22 Jan 2020 03:14:05 +0000</pubDate>
		<dc:creator><![CDATA[thiago]]></dc:creator>
		<content:encoded><![CDATA[<p>Hi</p>]]></content:encoded>
		<excerpt:encoded><![CDATA[A "quoted" excerpt]]></excerpt:encoded>
		<wp:post_id>10</wp:post_id>
		<wp:post_date><![CDATA[2020-01-22 14:14:05]]></wp:post_date>
		<wp:post_name><![CDATA[]]></wp:post_name>
		<wp:status><![CDATA[publish]]></wp:status>
		<wp:post_type><![CDATA[post]]></wp:post_type>
		<category domain="category" nicename="trips"><![CDATA[Trips]]></category>
		<category domain="post_tag" nicename="sydney"><![CDATA[sydney]]></category>
		<category domain="post_tag" nicename="beach-sun">beach &amp; sun</category>
		<wp:postmeta>
			<wp:meta_key><![CDATA[_edit_last]]></wp:meta_key>
			<wp:meta_value><![CDATA[1]]></wp:meta_value>
		</wp:postmeta>
		<wp:postmeta>
			<wp:meta_key><![CDATA[_thumbnail_id]]></wp:meta_key>
			<wp:meta_value><![CDATA[20]]></wp:meta_value>
		</wp:postmeta>
	</item>
	<item>
		<title>A draft</title>
		<pubDate>Mon, 30 Nov -0001 00:00:00 +0000</pubDate>
		<dc:creator><![CDATA[thiago]]></dc:creator>
		<content:encoded><![CDATA[<!-- wp:paragraph --><p>Work in progress</p><!-- /wp:paragraph -->]]></content:encoded>
		<excerpt:encoded><![CDATA[]]></excerpt:encoded>
		<wp:post_id>11</wp:post_id>
		<wp:post_date><![CDATA[2020-02-01 10:00:00]]></wp:post_date>
		<wp:post_name><![CDATA[a-draft]]></wp:post_name>
		<wp:status><![CDATA[draft]]></wp:status>
		<wp:post_type><![CDATA[post]]></wp:post_type>
		<category domain="category" nicename="photo-of-the-day"><![CDATA[Photo of the Day]]></category>
	</item>
	<item>
		<title>Uncategorised thoughts</title>
		<pubDate>Sat, 01 Feb 2020 10:00:00 +0000</pubDate>
		<dc:creator><![CDATA[thiago]]></dc:creator>
		<content:encoded><![CDATA[<p>No category here</p>]]></content:encoded>
		<excerpt:encoded><![CDATA[]]></excerpt:encoded>
		<wp:post_id>12</wp:post_id>
		<wp:post_date><![CDATA[2020-02-01 21:00:00]]></wp:post_date>
		<wp:post_name><![CDATA[uncategorised-thoughts]]></wp:post_name>
		<wp:status><![CDATA[publish]]></wp:status>
		<wp:post_type><![CDATA[post]]></wp:post_type>
		<category domain="post_tag" nicename="misc"><![CDATA[misc]]></category>
	</item>
	<item>
		<title>bondi</title>
		<wp:post_id>20</wp:post_id>
		<wp:post_type><![CDATA[attachment]]></wp:post_type>
		<wp:attachment_url><![CDATA[https://example.com/wp-content/uploads/2020/01/bondi.jpg]]></wp:attachment_url>
	</item>
	<item>
		<title>About</title>
		<wp:post_id>30</wp:post_id>
		<wp:post_type><![CDATA[page]]></wp:post_type>
		<content:encoded><![CDATA[<p>About me</p>]]></content:encoded>
	</item>
</channel>
</rss>
"#;

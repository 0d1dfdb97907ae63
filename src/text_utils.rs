use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use lazy_static::lazy_static;
use regex::Regex;

const WP_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Resolves the publish date of a post in the given time zone.
///
/// `pubDate` (RFC 2822) wins when it parses. Drafts carry a bogus
/// `pubDate` such as `Mon, 30 Nov -0001 00:00:00 +0000`, in which case the
/// wall-clock `wp:post_date` is used, interpreted in `tz`.
pub fn resolve_date_in<Tz: TimeZone>(pub_date: &str, post_date: &str, tz: &Tz) -> Option<DateTime<Tz>> {
    if let Ok(date) = DateTime::parse_from_rfc2822(pub_date.trim()) {
        return Some(date.with_timezone(tz));
    }

    let naive = NaiveDateTime::parse_from_str(post_date.trim(), WP_DATE_FORMAT).ok()?;
    tz.from_local_datetime(&naive).earliest()
}

pub fn resolve_date(pub_date: &str, post_date: &str) -> Option<DateTime<Local>> {
    resolve_date_in(pub_date, post_date, &Local)
}

/// `YYYY-MM-DDTHH:mm:ss±HH:mm`, using the offset of the date's own zone.
pub fn format_iso_local<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

/// Builds a URL slug from a post title.
pub fn slugify(title: &str) -> String {
    lazy_static! {
        static ref NOT_SLUG_CHAR: Regex = Regex::new(r"[^\w\s-]").unwrap();
        static ref SEPARATORS: Regex = Regex::new(r"[\s-]+").unwrap();
    }

    let ascii = unidecode::unidecode(title);
    let kept = NOT_SLUG_CHAR.replace_all(&ascii, "");
    let kept = kept.replace('*', "");
    let joined = SEPARATORS.replace_all(kept.trim(), "-");

    joined.trim_matches('-').to_lowercase()
}

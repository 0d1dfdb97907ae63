use thiserror::Error;

/// Failures that stop a single post from being written.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("post '{title}' has no category")]
    MissingCategory { title: String },

    #[error("post '{title}' references thumbnail {thumbnail_id} which is not an exported attachment")]
    MissingThumbnail { title: String, thumbnail_id: String },

    #[error("post '{title}' has no usable date (pubDate='{pub_date}', post_date='{post_date}')")]
    InvalidDate { title: String, pub_date: String, post_date: String },

    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("unable to convert post HTML: {0}")]
    Convert(String),

    #[error("generated markdown is invalid: {0}")]
    Markdown(String),
}

/// Failures reading the export itself. These abort the whole run.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("unable to read export {path}: {source}")]
    Read { path: String, source: std::io::Error },

    #[error("unable to parse export XML at byte {position}: {source}")]
    Xml { position: u64, source: quick_xml::Error },

    #[error("export has no rss channel")]
    MissingChannel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_error_is_transparent() {
        let err = ConvertError::from(NormalizeError::Markdown("unexpected end".to_string()));
        assert!(matches!(err, ConvertError::Normalize(NormalizeError::Markdown(_))));
        assert_eq!(err.to_string(), "generated markdown is invalid: unexpected end");
    }
}

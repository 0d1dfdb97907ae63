use std::path::Path;

use anyhow::{bail, Context};
use reqwest::header::CONTENT_TYPE;
use spdlog::{debug, info, warn};
use url::Url;

use crate::content::Fragment;

pub const LOCAL_IMAGE_PREFIX: &str = "./img";

/// Downloads the images a post references into the post's `img` directory
/// and points the post at the local copies.
#[derive(Debug, Clone, Default)]
pub struct ImageLocalizer {
    client: reqwest::Client,
}

/// File name for a downloaded image: the URL path flattened with `-`, its
/// extension replaced by the one matching the actual bytes.
pub fn image_file_name(url: &Url, bytes: &[u8]) -> anyhow::Result<String> {
    let format = image::guess_format(bytes).context("Unknown image signature")?;
    let ext = format.extensions_str().first().copied().unwrap_or("img");

    let flat = url.path().trim_start_matches('/').replace('/', "-").replace('*', "");
    let stem = Path::new(&flat)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("image");

    Ok(format!("{}.{}", stem, ext))
}

fn is_image_content_type(content_type: &str) -> bool {
    content_type.starts_with("image/") || content_type.contains("octet-stream")
}

impl ImageLocalizer {
    pub fn new() -> Self {
        ImageLocalizer {
            client: reqwest::Client::new(),
        }
    }

    /// Localizes every image of the fragment, one at a time. Returns the
    /// local paths, in document order. Images that cannot be fetched keep
    /// their remote URL.
    pub async fn localize(&self, fragment: &mut Fragment, img_dir: &Path) -> Vec<String> {
        let mut localized = vec![];

        for url in fragment.image_sources() {
            if url.starts_with(LOCAL_IMAGE_PREFIX) {
                debug!("Image {} already local", url);
                continue;
            }

            if let Some(local) = self.localize_url(&url, img_dir).await {
                fragment.rewrite_url(&url, &local);
                localized.push(local);
            }
        }

        localized
    }

    pub async fn localize_url(&self, url: &str, img_dir: &Path) -> Option<String> {
        match self.download(url, img_dir).await {
            Ok(Some(local)) => {
                info!("Localized {} as {}", url, local);
                Some(local)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Keeping remote image {}: {:#}", url, e);
                None
            }
        }
    }

    async fn download(&self, url: &str, img_dir: &Path) -> anyhow::Result<Option<String>> {
        let parsed = Url::parse(url).with_context(|| format!("Not an absolute URL: {}", url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!("Unsupported scheme {}", parsed.scheme());
        }

        let response = self.client.get(parsed.clone()).send().await?;
        let status = response.status();
        if status.as_u16() >= 400 {
            bail!("Server answered {}", status);
        }

        let content_type = response.headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_lowercase();
        if !is_image_content_type(&content_type) {
            info!("Keeping remote reference to {}, content type is '{}'", url, content_type);
            return Ok(None);
        }

        let bytes = response.bytes().await?;
        let name = image_file_name(&parsed, &bytes)?;

        tokio::fs::create_dir_all(img_dir).await
            .with_context(|| format!("Cannot create {}", img_dir.display()))?;
        let target = img_dir.join(&name);
        tokio::fs::write(&target, &bytes).await
            .with_context(|| format!("Cannot write {}", target.display()))?;

        Ok(Some(format!("{}/{}", LOCAL_IMAGE_PREFIX, name)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use crate::content;
    use crate::test_data::{start_image_server, JPEG, PNG};

    use super::*;

    #[test]
    fn test_image_file_name() {
        let url = Url::parse("https://x.com/wp-content/uploads/a*b.final.jpeg").unwrap();
        assert_eq!(image_file_name(&url, PNG).unwrap(), "wp-content-uploads-ab.final.png");

        let url = Url::parse("https://x.com/").unwrap();
        assert_eq!(image_file_name(&url, JPEG).unwrap(), "image.jpg");

        assert!(image_file_name(&url, b"plain text").is_err());
    }

    #[tokio::test]
    async fn test_localize_with_failures() {
        let (base, _) = start_image_server();
        let dir = tempfile::tempdir().unwrap();
        let img_dir = dir.path().join("trips").join("img");

        let good = format!("{}/wp-content/uploads/2020/01/a.png", base);
        let broken = format!("{}/broken.jpg", base);
        let html = format!(r#"<p><a href="{good}"><img src="{good}"></a><img src="{broken}"></p>"#);
        let mut fragment = content::parse(&html);

        let localized = ImageLocalizer::new().localize(&mut fragment, &img_dir).await;
        assert_eq!(localized, vec!["./img/wp-content-uploads-2020-01-a.png"]);
        assert!(img_dir.join("wp-content-uploads-2020-01-a.png").exists());

        let html = fragment.to_html();
        assert_eq!(html.matches("./img/wp-content-uploads-2020-01-a.png").count(), 2);
        assert!(!html.contains(&good));
        assert!(html.contains(&broken));
    }

    #[tokio::test]
    async fn test_content_type_and_signature() {
        let (base, _) = start_image_server();
        let dir = tempfile::tempdir().unwrap();
        let localizer = ImageLocalizer::new();

        let local = localizer.localize_url(&format!("{}/photo", base), dir.path()).await;
        assert_eq!(local.as_deref(), Some("./img/photo.jpg"));
        assert!(dir.path().join("photo.jpg").exists());

        assert_eq!(localizer.localize_url(&format!("{}/page.jpg", base), dir.path()).await, None);
        assert_eq!(localizer.localize_url(&format!("{}/garbage.gif", base), dir.path()).await, None);
        assert_eq!(localizer.localize_url("/relative/a.png", dir.path()).await, None);
        assert_eq!(localizer.localize_url("ftp://x.com/a.png", dir.path()).await, None);
    }

    #[tokio::test]
    async fn test_already_local_is_untouched() {
        let (_, hits) = start_image_server();
        let dir = tempfile::tempdir().unwrap();

        let mut fragment = content::parse(r#"<p><img src="./img/a.png"><img src="./img/b.jpg"></p>"#);
        let before = fragment.clone();

        let localized = ImageLocalizer::new().localize(&mut fragment, dir.path()).await;
        assert!(localized.is_empty());
        assert_eq!(fragment, before);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}

use std::io;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use spdlog::debug;

use crate::export::CategoryTaxonomy;
use crate::frontmatter::{category_frontmatter, Frontmatter};

pub const CATEGORY_DIR: &str = "category";
pub const IMAGE_DIR: &str = "img";

/// Lays out the generated site under a root directory.
#[derive(Debug, Clone)]
pub struct SiteWriter {
    root: PathBuf,
}

/// Rejects names that would escape the directory they are written into.
fn check_component(name: &str) -> io::Result<&str> {
    let name = name.trim();
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(io::Error::new(ErrorKind::InvalidInput, format!("Invalid file name '{}'", name)));
    }
    Ok(name)
}

impl SiteWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        SiteWriter { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn post_dir(&self, directory: &str) -> PathBuf {
        self.root.join(directory)
    }

    pub fn img_dir(&self, directory: &str) -> PathBuf {
        self.post_dir(directory).join(IMAGE_DIR)
    }

    async fn write_document(&self, dir: PathBuf, name: &str, frontmatter: &Frontmatter, body: &str) -> io::Result<PathBuf> {
        let name = check_component(name)?;
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(format!("{}.md", name));
        let mut content = frontmatter.render();
        content.push_str(body);

        tokio::fs::write(&path, content).await?;
        debug!("Wrote {}", path.display());
        Ok(path)
    }

    /// Writes `<root>/<directory>/<slug>.md`.
    pub async fn write_post(&self, directory: &str, slug: &str, frontmatter: &Frontmatter, body: &str) -> io::Result<PathBuf> {
        let directory = check_component(directory)?;
        self.write_document(self.post_dir(directory), slug, frontmatter, body).await
    }

    /// Writes `<root>/category/<slug>.md`, a frontmatter only document.
    pub async fn write_category(&self, category: &CategoryTaxonomy) -> io::Result<PathBuf> {
        self.write_document(self.root.join(CATEGORY_DIR), &category.slug, &category_frontmatter(category), "").await
    }
}

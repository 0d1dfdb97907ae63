use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use spdlog::{debug, error, info};
use tokio::task::JoinSet;

use crate::config::{Config, Layout};
use crate::content;
use crate::error::{ConvertError, ExportError};
use crate::export::wxr_reader::read_export;
use crate::export::{AttachmentRecord, CategoryTaxonomy, ExportData, PostRecord};
use crate::frontmatter::{article_frontmatter, trip_frontmatter};
use crate::images::ImageLocalizer;
use crate::metadata::extract_metadata;
use crate::writer::SiteWriter;

/// Read-only state shared by every conversion task.
pub struct JobContext {
    pub config: Config,
    pub attachments: Vec<AttachmentRecord>,
    pub writer: SiteWriter,
    pub localizer: Option<ImageLocalizer>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub posts_written: usize,
    pub posts_failed: usize,
    pub categories_written: usize,
    pub categories_failed: usize,
    pub images_localized: usize,
    pub failures: Vec<String>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.posts_failed == 0 && self.categories_failed == 0
    }
}

enum TaskOutcome {
    Post { title: String, pub_date: String, result: anyhow::Result<usize> },
    Category { slug: String, result: std::io::Result<()> },
}

impl JobContext {
    pub fn new(config: Config, attachments: Vec<AttachmentRecord>) -> Self {
        let writer = SiteWriter::new(config.paths.output_dir.clone());
        let localizer = config.site.localize_images.then(ImageLocalizer::new);
        JobContext { config, attachments, writer, localizer }
    }

    fn writes_category_index(&self) -> bool {
        self.config.site.layout == Layout::Article && self.config.site.write_category_index
    }

    /// Converts one post and writes it. Returns how many images were localized.
    pub async fn process_post(&self, post: PostRecord) -> anyhow::Result<usize> {
        let meta = extract_metadata(&post, &self.attachments, &self.config.site)?;
        debug!("Converting '{}' into {}/{}", meta.title, meta.directory, meta.slug);

        let mut fragment = content::parse(&post.content_html);

        let mut localized = vec![];
        if let Some(ref localizer) = self.localizer {
            let img_dir = self.writer.img_dir(&meta.directory);
            if let Some(url) = meta.hero_urls.first() {
                if let Some(local) = localizer.localize_url(url, &img_dir).await {
                    fragment.rewrite_url(url, &local);
                    localized.push(local);
                }
            }
            localized.extend(localizer.localize(&mut fragment, &img_dir).await);
        }
        let hero = localized.iter().find(|p| !p.ends_with("gif")).map(String::as_str);

        let content = fragment.into_markdown().map_err(ConvertError::Normalize)?;
        for warning in &content.warnings {
            debug!("{}: {}", meta.slug, warning);
        }

        let frontmatter = match self.config.site.layout {
            Layout::Trip => trip_frontmatter(&meta, &self.config.trip, hero),
            Layout::Article => article_frontmatter(&meta, self.config.site.include_author, hero),
        };

        let path = self.writer.write_post(&meta.directory, &meta.slug, &frontmatter, &content.markdown).await
            .with_context(|| format!("Cannot write post {}/{}", meta.directory, meta.slug))?;
        info!("Wrote {}", path.display());

        Ok(localized.len())
    }

    pub async fn write_category(&self, category: &CategoryTaxonomy) -> std::io::Result<()> {
        let path = self.writer.write_category(category).await?;
        info!("Wrote category {}", path.display());
        Ok(())
    }
}

/// Converts every post of the export, and the category index when the
/// layout asks for it. All tasks are awaited before the summary is returned.
pub async fn convert_export(config: Config, export: ExportData) -> RunSummary {
    let ExportData { posts, attachments, categories } = export;
    let ctx = Arc::new(JobContext::new(config, attachments));

    let mut tasks = JoinSet::new();

    for post in posts {
        let ctx = ctx.clone();
        tasks.spawn(async move {
            let title = post.title.clone();
            let pub_date = post.pub_date.clone();
            let result = ctx.process_post(post).await;
            TaskOutcome::Post { title, pub_date, result }
        });
    }

    if ctx.writes_category_index() {
        for category in categories {
            let ctx = ctx.clone();
            tasks.spawn(async move {
                let result = ctx.write_category(&category).await;
                TaskOutcome::Category { slug: category.slug, result }
            });
        }
    }

    let mut summary = RunSummary::default();

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(TaskOutcome::Post { result: Ok(images), .. }) => {
                summary.posts_written += 1;
                summary.images_localized += images;
            }
            Ok(TaskOutcome::Post { title, pub_date, result: Err(e) }) => {
                error!("Failed to convert post '{}' (pubDate '{}'): {:#}", title, pub_date, e);
                summary.posts_failed += 1;
                summary.failures.push(format!("post '{}': {:#}", title, e));
            }
            Ok(TaskOutcome::Category { result: Ok(()), .. }) => summary.categories_written += 1,
            Ok(TaskOutcome::Category { slug, result: Err(e) }) => {
                error!("Failed to write category {}: {}", slug, e);
                summary.categories_failed += 1;
                summary.failures.push(format!("category '{}': {}", slug, e));
            }
            Err(e) => {
                error!("Conversion task did not finish: {}", e);
                summary.posts_failed += 1;
                summary.failures.push(format!("task: {}", e));
            }
        }
    }

    info!("Done. {} posts written, {} failed. {} categories written, {} failed. {} images localized",
        summary.posts_written, summary.posts_failed,
        summary.categories_written, summary.categories_failed,
        summary.images_localized);

    summary
}

/// Reads the configured export and converts it.
pub async fn run(config: Config) -> Result<RunSummary, ExportError> {
    let export = read_export(&config.paths.export_file).await?;
    Ok(convert_export(config, export).await)
}

pub async fn write_report(summary: &RunSummary, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    tokio::fs::write(path, json).await
        .with_context(|| format!("Cannot write report {}", path.display()))?;
    Ok(())
}

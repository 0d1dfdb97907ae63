use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::{fs, io};

use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct Paths {
    pub export_file: PathBuf,
    pub output_dir: PathBuf,
}

/// Decides how posts are grouped into directories and which frontmatter
/// fields are written.
#[derive(Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// One directory per trip (first category), travel fields in the frontmatter.
    Trip,
    /// `article/` by default, moved by directory rules; categories and authors are kept.
    Article,
}

#[derive(Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MissingThumbnail {
    Fail,
    Omit,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct DirectoryRule {
    pub categories: Vec<String>,
    pub directory: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Site {
    pub layout: Layout,
    pub on_missing_thumbnail: Option<MissingThumbnail>,
    #[serde(default)]
    pub localize_images: bool,
    #[serde(default = "default_true")]
    pub include_author: bool,
    #[serde(default = "default_true")]
    pub write_category_index: bool,
    pub directory_rules: Option<Vec<DirectoryRule>>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Trip {
    #[serde(default = "default_place")]
    pub place: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default = "default_gallery")]
    pub gallery: String,
    #[serde(default = "default_map")]
    pub map: Vec<i64>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Log {
    pub level: LogLevel,
    pub log_to_console: bool,
    pub location: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Copy, Clone)]
pub enum LogLevel {
    Critical = 0,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub paths: Paths,
    #[serde(default)]
    pub site: Site,
    #[serde(default)]
    pub trip: Trip,
    pub log: Option<Log>,
}

fn default_true() -> bool { true }
fn default_place() -> String { "Australia".to_string() }
fn default_timezone() -> String { "Australia/Sydney".to_string() }
fn default_location() -> String { "Somewhere".to_string() }
fn default_gallery() -> String { "gallery".to_string() }
fn default_map() -> Vec<i64> { vec![0, 1, 2] }

impl Default for Site {
    fn default() -> Self {
        Self {
            layout: Layout::Trip,
            on_missing_thumbnail: None,
            localize_images: false,
            include_author: true,
            write_category_index: true,
            directory_rules: None,
        }
    }
}

impl Default for Trip {
    fn default() -> Self {
        Self {
            place: default_place(),
            timezone: default_timezone(),
            location: default_location(),
            gallery: default_gallery(),
            map: default_map(),
        }
    }
}

impl Site {
    pub fn missing_thumbnail(&self) -> MissingThumbnail {
        self.on_missing_thumbnail.unwrap_or(match self.layout {
            Layout::Trip => MissingThumbnail::Fail,
            Layout::Article => MissingThumbnail::Omit,
        })
    }

    pub fn directory_rules(&self) -> Vec<DirectoryRule> {
        match self.directory_rules {
            Some(ref rules) => rules.clone(),
            None => default_directory_rules(),
        }
    }
}

pub fn default_directory_rules() -> Vec<DirectoryRule> {
    let rule = |categories: &[&str], directory: &str| DirectoryRule {
        categories: categories.iter().map(|c| c.to_string()).collect(),
        directory: directory.to_string(),
    };

    vec![
        rule(&["Photo of the Day"], "potd"),
        rule(&["Series"], "series"),
        rule(&["Review", "Initial Impression", "Real Life Review"], "review"),
    ]
}

impl Config {
    pub fn new(export_file: PathBuf, output_dir: PathBuf, layout: Layout) -> Self {
        Config {
            paths: Paths { export_file, output_dir },
            site: Site { layout, ..Site::default() },
            trip: Trip::default(),
            log: None,
        }
    }
}

pub fn parse_config(cfg_content: &str) -> io::Result<Config> {
    toml::from_str::<Config>(cfg_content).map_err(|e| io::Error::new(
        ErrorKind::InvalidData, format!("Error parsing configuration file: {}", e)))
}

pub fn read_config(cfg_path: &Path) -> io::Result<Config> {
    let cfg_content = match fs::read_to_string(cfg_path) {
        Ok(content) => content,
        Err(e) => return Err(io::Error::new(e.kind(), format!("Error opening configuration file {}: {}", cfg_path.display(), e))),
    };

    parse_config(&cfg_content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config() {
        let cfg = parse_config(r#"
[paths]
export_file = "travelsthroughalens.xml"
output_dir = "travelens"
"#).unwrap();

        assert_eq!(cfg.paths.output_dir, PathBuf::from("travelens"));
        assert_eq!(cfg.site.layout, Layout::Trip);
        assert_eq!(cfg.site.missing_thumbnail(), MissingThumbnail::Fail);
        assert!(!cfg.site.localize_images);
        assert_eq!(cfg.trip.place, "Australia");
        assert_eq!(cfg.trip.map, vec![0, 1, 2]);
        assert!(cfg.log.is_none());
    }

    #[test]
    fn test_article_config() {
        let cfg = parse_config(r#"
[paths]
export_file = "../visualvoyager.xml"
output_dir = "visualvoyager"

[site]
layout = "article"
localize_images = true

[[site.directory_rules]]
categories = ["Gear"]
directory = "gear"

[log]
level = "Debug"
log_to_console = true
"#).unwrap();

        assert_eq!(cfg.site.layout, Layout::Article);
        assert_eq!(cfg.site.missing_thumbnail(), MissingThumbnail::Omit);
        assert!(cfg.site.localize_images);
        assert!(cfg.site.include_author);
        assert_eq!(cfg.site.directory_rules(), vec![DirectoryRule {
            categories: vec!["Gear".to_string()],
            directory: "gear".to_string(),
        }]);
        assert!(cfg.log.unwrap().log_to_console);
    }

    #[test]
    fn test_thumbnail_policy_override() {
        let cfg = parse_config(r#"
[paths]
export_file = "a.xml"
output_dir = "out"

[site]
layout = "trip"
on_missing_thumbnail = "omit"
"#).unwrap();

        assert_eq!(cfg.site.missing_thumbnail(), MissingThumbnail::Omit);
        assert_eq!(cfg.site.directory_rules(), default_directory_rules());
    }

    #[test]
    fn test_sample_config() {
        let cfg = parse_config(include_str!("../wxr2md.toml")).unwrap();
        assert_eq!(cfg.site.layout, Layout::Trip);
        assert_eq!(cfg.site.directory_rules(), default_directory_rules());
        assert!(cfg.log.unwrap().location.is_none());
    }

    #[test]
    fn test_invalid_config() {
        let err = parse_config("[paths]\nexport_file = 3").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }
}

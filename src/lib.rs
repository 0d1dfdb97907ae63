pub mod config;
pub mod content;
pub mod converter;
pub mod error;
pub mod export;
pub mod frontmatter;
pub mod images;
pub mod logger;
pub mod metadata;
pub mod text_utils;
pub mod writer;
mod util;
#[cfg(test)]
mod test_data;

use std::fmt::{Display, Formatter};
use std::path::Path;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use spdlog::{error, info, warn};

use wxr2md::config::Layout;
use wxr2md::converter::{run, write_report};
use wxr2md::logger::configure_logger;

use crate::config::open_config;

mod config;

const CFG_FILE_NAME: &str = "wxr2md.toml";
const DEFAULT_OUTPUT_DIR: &str = "site";

/// Converts a WordPress WXR export into a tree of markdown posts
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Config path
    #[arg(short, long)]
    config_path: Option<String>,

    /// WXR export to convert. Overrides paths.export_file
    #[arg(short, long)]
    input: Option<String>,

    /// Directory where the site is written. Overrides paths.output_dir
    #[arg(short, long)]
    output_dir: Option<String>,

    /// Site layout. Overrides site.layout
    #[arg(short, long)]
    layout: Option<LayoutArg>,

    /// Writes the run summary as JSON to this file
    #[arg(long)]
    report: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LayoutArg {
    /// One directory per trip, travel fields in the frontmatter
    Trip,
    /// Article directories chosen by category, category index written
    Article,
}

impl Display for LayoutArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutArg::Trip => write!(f, "trip"),
            LayoutArg::Article => write!(f, "article"),
        }
    }
}

impl From<LayoutArg> for Layout {
    fn from(value: LayoutArg) -> Self {
        match value {
            LayoutArg::Trip => Layout::Trip,
            LayoutArg::Article => Layout::Article,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match open_config(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err);
            eprintln!("Please run wxr2md --help");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = configure_logger(config.log.as_ref()) {
        warn!("Error creating logger sinks. Using console instead. Desc={}", err);
    }

    info!("Starting wxr2md =-=-=-=-=-=-=-=-=-=-=-=-=-=-=-");

    let summary = match run(config).await {
        Ok(summary) => summary,
        Err(err) => {
            error!("Nothing converted: {}", err);
            return ExitCode::FAILURE;
        }
    };

    if let Some(ref report) = args.report {
        if let Err(err) = write_report(&summary, Path::new(report)).await {
            error!("{:#}", err);
        }
    }

    if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

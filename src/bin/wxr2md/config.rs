use std::env;
use std::path::PathBuf;

use wxr2md::config::{read_config, Config, Layout};

use crate::{Args, CFG_FILE_NAME, DEFAULT_OUTPUT_DIR};

fn get_config_path() -> Option<PathBuf> {
    let exe_dir = env::current_exe().ok()
        .and_then(|exe| exe.parent().map(|p| p.to_path_buf()));
    let candidates = [exe_dir, env::current_dir().ok(), dirs::config_dir()];

    candidates.into_iter()
        .flatten()
        .map(|dir| dir.join(CFG_FILE_NAME))
        .find(|path| path.exists())
}

fn default_config(args: &Args) -> Result<Config, String> {
    let Some(ref input) = args.input else {
        return Err(format!("Could not find {} and no --input was given", CFG_FILE_NAME));
    };

    println!("No configuration found. Using built-in defaults");
    let output_dir = args.output_dir.clone().unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string());
    let layout = args.layout.map(Layout::from).unwrap_or(Layout::Trip);
    Ok(Config::new(PathBuf::from(input), PathBuf::from(output_dir), layout))
}

/// Loads the configuration and applies the command line overrides.
pub(crate) fn open_config(args: &Args) -> Result<Config, String> {
    let config_path = args.config_path.as_ref().map(PathBuf::from).or_else(get_config_path);

    let mut config = match config_path {
        Some(path) => {
            println!("Reading config from {}", path.display());
            read_config(&path).map_err(|e| e.to_string())?
        }
        None => default_config(args)?,
    };

    if let Some(ref input) = args.input {
        config.paths.export_file = PathBuf::from(input);
    }
    if let Some(ref output_dir) = args.output_dir {
        config.paths.output_dir = PathBuf::from(output_dir);
    }
    if let Some(layout) = args.layout {
        config.site.layout = layout.into();
    }

    if let Some(ref mut log) = config.log {
        if log.location.is_none() {
            log.location = dirs::cache_dir().map(|dir| dir.join("wxr2md").join("log").join("wxr2md.log"));
        }
        match log.location {
            Some(ref location) => println!("Log enabled. Files will be written in {}", location.display()),
            None => println!("Log enabled. No cache dir found, using stdout"),
        }
    } else {
        println!("Log disabled. Using stdout");
    }

    println!("Converting {} into {}", config.paths.export_file.display(), config.paths.output_dir.display());
    Ok(config)
}

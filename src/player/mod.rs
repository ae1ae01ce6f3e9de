pub mod app;
pub mod audio;
pub mod decoder;
pub mod thumbnail;
pub mod ui;

use std::error::Error;
use std::fs::File;
use std::path::PathBuf;

use app::PlayerOptions;
use tapedeck::config::Config;

pub fn run(
    files: Vec<PathBuf>,
    options: PlayerOptions,
    config: &Config,
) -> Result<(), Box<dyn Error>> {
    init_logging(config)?;
    app::run_with_files(files, options)
}

fn init_logging(config: &Config) -> Result<(), Box<dyn Error>> {
    use simplelog::{CombinedLogger, WriteLogger};

    let log_path = config.log_path()?;
    CombinedLogger::init(vec![WriteLogger::new(
        config.log_level_filter()?,
        simplelog::Config::default(),
        File::create(&log_path)?,
    )])?;

    Ok(())
}

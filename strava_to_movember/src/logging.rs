
use std::path::Path;

use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

/// Dropping a `log4rs.yml` here overrides the built-in logger setup.
pub const LOG_CONFIG_FILE: &str = "log4rs.yml";

const STDERR_APPENDER: &str = "stderr";
const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {h({l})} {t} - {m}{n}";

/// Only warnings and errors reach the terminal unless `verbose` is set.
pub fn build_log_config(verbose: bool) -> anyhow::Result<Config> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build(STDERR_APPENDER, Box::new(stderr)))
        .build(Root::builder().appender(STDERR_APPENDER).build(level))?;
    Ok(config)
}

/// Uses `log4rs.yml` from `config_dir` when present, the stderr
/// logger otherwise.
pub fn init_logging(config_dir: Option<&Path>, verbose: bool) -> anyhow::Result<()> {
    if let Some(file) = config_dir.map(|dir| dir.join(LOG_CONFIG_FILE)) {
        if file.is_file() {
            log4rs::init_file(&file, Default::default())?;
            log::debug!("Logging configured from {}", file.display());
            return Ok(());
        }
    }
    log4rs::init_config(build_log_config(verbose)?)?;
    Ok(())
}

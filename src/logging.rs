//! log4rs setup for the binary.

use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::error::Error;
use std::path::Path;

/// Config file picked up from the working directory when present.
pub const LOG4RS_FILE: &str = "log4rs.yml";

const INFO_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} - {m}{n}";
const DEBUG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {t} [{l:<5.5}] - {m}{n}";

/// Console config to stderr: INFO, or DEBUG with target and level columns.
pub fn console_config(debug: bool) -> Result<Config, Box<dyn Error>> {
    let (level, pattern) = if debug {
        (LevelFilter::Debug, DEBUG_PATTERN)
    } else {
        (LevelFilter::Info, INFO_PATTERN)
    };
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level))?;
    Ok(config)
}

/// Install the logger. `--debug` always wins over [`LOG4RS_FILE`].
pub fn init_logging(debug: bool) -> Result<(), Box<dyn Error>> {
    if !debug && Path::new(LOG4RS_FILE).exists() {
        log4rs::init_file(LOG4RS_FILE, Default::default())?;
        log::debug!("Logging configured from {LOG4RS_FILE}");
        return Ok(());
    }
    log4rs::init_config(console_config(debug)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_config_levels() {
        assert_eq!(console_config(false).unwrap().root().level(), LevelFilter::Info);
        assert_eq!(console_config(true).unwrap().root().level(), LevelFilter::Debug);
    }
}

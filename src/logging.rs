use anyhow::Result;
use log::LevelFilter;

/// Environment variable holding the log level (`error`..`trace`)
pub const LOG_LEVEL_ENV: &str = "OFFICE_MARKDOWN_LOG";

/// Level from `OFFICE_MARKDOWN_LOG`, `info` when unset or unparsable
pub fn level_from_env() -> LevelFilter {
    std::env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(LevelFilter::Info)
}

/// Route `log` records to stderr with local timestamps
pub fn init_logging(level: LevelFilter) -> Result<()> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .level_for("zip", LevelFilter::Warn)
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}

// File logging: env_logger piped into the log file, truncated every run
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use env_logger::{Builder, Env, Target};
use log::Record;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_line(timestamp: &str, record: &Record) -> String {
    format!("{timestamp} - {} - {}", record.level(), record.args())
}

/// Creates the parent directory if needed and opens `path` truncated, so every
/// run starts with an empty log.
pub fn open_log_file(path: &Path) -> anyhow::Result<File> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create log directory {}", dir.display()))?;
    }
    File::create(path).with_context(|| format!("failed to open log file {}", path.display()))
}

/// Installs the global logger writing to `path`. Level defaults to debug;
/// `RUST_LOG` overrides it.
pub fn init(path: &Path) -> anyhow::Result<()> {
    let file = open_log_file(path)?;

    Builder::from_env(Env::default().default_filter_or("debug"))
        .target(Target::Pipe(Box::new(file)))
        .format(|buf, record| {
            let timestamp = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
            writeln!(buf, "{}", format_line(&timestamp, record))
        })
        .try_init()
        .context("failed to install logger")?;
    Ok(())
}

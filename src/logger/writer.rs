//! Log file opening for the file layer

use std::fs::{File, OpenOptions};
use std::sync::Arc;

use crate::logger::LoggerError;
use crate::logger::config::FileConfig;

/// Open the configured log file, creating its directory if needed.
///
/// The returned handle is shared by the file layer; `&File` writes are
/// unbuffered, so every event reaches the file in one `write` call.
pub(crate) fn open_log_file(config: &FileConfig) -> Result<Arc<File>, LoggerError> {
    if let Some(parent) = config.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(config.append)
        .truncate(!config.append)
        .open(&config.path)?;

    Ok(Arc::new(file))
}

// typings-worker/src/log.rs
// Append-only diagnostic log shared with the parent for troubleshooting
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Timestamped line log written to the file given by `--logFile`.
///
/// A log without a path is disabled and every call is a no-op. The first
/// failed append disables the log for the rest of the process.
#[derive(Debug, Clone, Default)]
pub struct FileLog {
    path: Option<PathBuf>,
}

impl FileLog {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// Check before building expensive log text; `write_line` cannot skip it
    pub fn is_enabled(&self) -> bool {
        self.path.is_some()
    }

    pub fn write_line(&mut self, text: &str) {
        let Some(path) = self.path.as_ref() else {
            return;
        };

        let line = format!("[{}] {}\n", now_string(), text);
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| file.write_all(line.as_bytes()));

        if let Err(e) = result {
            tracing::warn!("Disabling log file {}: {}", path.display(), e);
            self.path = None;
        }
    }
}

fn now_string() -> String {
    chrono::Local::now().format("%H:%M:%S%.3f").to_string()
}

/// Indent every line of `text` by four spaces, each on a fresh line
pub fn indent(text: &str) -> String {
    text.lines().map(|line| format!("\n    {}", line)).collect()
}

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::trace::trace::TraceEvent;

/// JSONL sink for apply-run events, one line per page pass.
///
/// Best-effort: a trace file that cannot be opened disables the logger, and
/// write failures drop the event with a warning. The apply run never fails
/// because of tracing.
pub struct TraceLogger {
    sink: Option<TraceSink>,
}

struct TraceSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl TraceLogger {
    /// Append to `path`, creating it if needed.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let opened = OpenOptions::new().create(true).append(true).open(path);

        let sink = match opened {
            Ok(file) => Some(TraceSink {
                path: path.to_path_buf(),
                file: Mutex::new(file),
            }),
            Err(e) => {
                warn!("Apply trace disabled, cannot open {}: {}", path.display(), e);
                None
            }
        };
        Self { sink }
    }

    pub fn disabled() -> Self {
        Self { sink: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.sink.as_ref().map(|s| s.path.as_path())
    }

    pub fn log(&self, event: &TraceEvent) {
        let Some(sink) = &self.sink else {
            return;
        };

        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                warn!("Dropping trace event for page {}: {}", event.page, e);
                return;
            }
        };

        let Ok(mut file) = sink.file.lock() else {
            warn!("Trace file {} lock poisoned", sink.path.display());
            return;
        };
        match writeln!(file, "{}", line) {
            Ok(()) => debug!(page = event.page, decision = ?event.decision, "trace event written"),
            Err(e) => warn!("Failed to append to {}: {}", sink.path.display(), e),
        }
    }
}

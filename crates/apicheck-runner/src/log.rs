//! Logger handle passed to the runner and executor
//!
//! Lines go to `tracing` (the CLI installs the subscriber and its filter)
//! or, for tests, into an in-memory buffer.

use std::sync::{Arc, Mutex};

pub use tracing::Level;

#[derive(Debug, Clone)]
enum Sink {
    Tracing,
    Memory(Arc<Mutex<Vec<(Level, String)>>>),
}

#[derive(Debug, Clone)]
pub struct Logger {
    verbose: bool,
    sink: Sink,
}

impl Logger {
    /// Emit through `tracing`.
    #[must_use]
    pub fn tracing(verbose: bool) -> Self {
        Self {
            verbose,
            sink: Sink::Tracing,
        }
    }

    /// Record lines in memory; read them back with [`Logger::lines`].
    #[must_use]
    pub fn memory(verbose: bool) -> Self {
        Self {
            verbose,
            sink: Sink::Memory(Arc::default()),
        }
    }

    #[must_use]
    pub const fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn write_log(&self, level: Level, message: &str) {
        match &self.sink {
            Sink::Tracing => match level {
                Level::ERROR => tracing::error!("{message}"),
                Level::WARN => tracing::warn!("{message}"),
                Level::INFO => tracing::info!("{message}"),
                Level::DEBUG => tracing::debug!("{message}"),
                _ => tracing::trace!("{message}"),
            },
            Sink::Memory(lines) => {
                if let Ok(mut lines) = lines.lock() {
                    lines.push((level, message.to_string()));
                }
            }
        }
    }

    /// Request/response and failure detail; only written in verbose mode.
    pub fn detail(&self, message: &str) {
        if self.verbose {
            self.write_log(Level::DEBUG, message);
        }
    }

    /// Recorded lines (memory sink only).
    #[must_use]
    pub fn lines(&self) -> Vec<(Level, String)> {
        match &self.sink {
            Sink::Tracing => Vec::new(),
            Sink::Memory(lines) => lines.lock().map(|l| l.clone()).unwrap_or_default(),
        }
    }
}

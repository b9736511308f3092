//! Degradation reporting

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::CloneError;
use crate::options::{LogMode, LogSink};

/// Routes reports to the configured sink according to the log mode
#[derive(Debug)]
pub(crate) struct Reporter {
    mode: LogMode,
    sink: Option<LogSink>,
    reported: AtomicUsize,
}

impl Reporter {
    pub(crate) fn new(mode: LogMode, sink: Option<LogSink>) -> Self {
        Self {
            mode,
            sink,
            reported: AtomicUsize::new(0),
        }
    }

    /// Paths are only worth building when they will be shown
    pub(crate) fn wants_paths(&self) -> bool {
        self.mode == LogMode::Verbose
    }

    pub(crate) fn report(&self, err: CloneError) {
        if self.mode == LogMode::Silent {
            return;
        }
        self.reported.fetch_add(1, Ordering::Relaxed);
        match &self.sink {
            Some(sink) => sink.emit(&err),
            None => match err.path() {
                Some(path) => tracing::warn!(path = %path, "{err}"),
                None => tracing::warn!("{err}"),
            },
        }
    }

    pub(crate) fn reported(&self) -> usize {
        self.reported.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn collecting(mode: LogMode) -> (Reporter, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = seen.clone();
            LogSink::new(move |err| seen.lock().push(err.to_string()))
        };
        (Reporter::new(mode, Some(sink)), seen)
    }

    #[test]
    fn test_silent_reports_nothing() {
        let (reporter, seen) = collecting(LogMode::Silent);
        reporter.report(CloneError::InvalidOptions("x".into()));
        assert!(seen.lock().is_empty());
        assert_eq!(reporter.reported(), 0);
        assert!(!reporter.wants_paths());
    }

    #[test]
    fn test_sink_receives_each_report_once() {
        let (reporter, seen) = collecting(LogMode::Quiet);
        reporter.report(CloneError::Unclonable {
            kind: "WeakMap",
            path: None,
        });
        assert_eq!(seen.lock().len(), 1);
        assert_eq!(reporter.reported(), 1);
    }
}

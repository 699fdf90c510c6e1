//! Logging setup and request-scoped timing.
//!
//! The cache core only logs non-sensitive metadata. Redaction is decided
//! here, independently, on every formatted line before it reaches stderr.

use std::collections::HashMap;
use std::io::{self, Write};
use std::time::{Duration, Instant};

use tracing::{debug, warn};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

use crate::utils::redact::redact_sensitive;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "chunkstash=info";

/// Maximum labels a [`RequestTimer`] tracks at once.
pub const MAX_TIMED_LABELS: usize = 32;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(RedactingMakeWriter::new(io::stderr));

    let result = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if result.is_err() {
        debug!("Tracing subscriber already installed");
    }
}

/// [`MakeWriter`] that redacts each formatted event before writing it.
#[derive(Debug, Clone)]
pub struct RedactingMakeWriter<F> {
    make_inner: F,
}

impl<F> RedactingMakeWriter<F> {
    pub fn new(make_inner: F) -> Self {
        Self { make_inner }
    }
}

impl<'a, F, W> MakeWriter<'a> for RedactingMakeWriter<F>
where
    F: Fn() -> W + 'static,
    W: Write,
{
    type Writer = RedactingWriter<W>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter {
            buf: Vec::new(),
            inner: (self.make_inner)(),
        }
    }
}

/// Buffers one event and writes the redacted text on flush or drop.
pub struct RedactingWriter<W: Write> {
    buf: Vec<u8>,
    inner: W,
}

impl<W: Write> RedactingWriter<W> {
    fn flush_redacted(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let text = String::from_utf8_lossy(&self.buf);
        let redacted = redact_sensitive(&text);
        self.inner.write_all(redacted.as_bytes())?;
        self.buf.clear();
        self.inner.flush()
    }
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_redacted()
    }
}

impl<W: Write> Drop for RedactingWriter<W> {
    fn drop(&mut self) {
        let _ = self.flush_redacted();
    }
}

/// Phase timings for a single request.
///
/// Owned by the request that creates it and dropped with it, so timings
/// never accumulate across requests. Holds at most [`MAX_TIMED_LABELS`]
/// unfinished labels; further `start` calls are ignored.
#[derive(Debug)]
pub struct RequestTimer {
    request: &'static str,
    started: HashMap<&'static str, Instant>,
}

impl RequestTimer {
    pub fn new(request: &'static str) -> Self {
        Self {
            request,
            started: HashMap::new(),
        }
    }

    /// Start (or restart) timing `label`.
    pub fn start(&mut self, label: &'static str) {
        if self.started.len() >= MAX_TIMED_LABELS && !self.started.contains_key(label) {
            warn!(request = self.request, label, "Too many open timers, ignoring");
            return;
        }
        self.started.insert(label, Instant::now());
    }

    /// Stop timing `label` and log the elapsed time.
    pub fn finish(&mut self, label: &'static str) -> Option<Duration> {
        let elapsed = self.started.remove(label)?.elapsed();
        debug!(
            request = self.request,
            label,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "Timing"
        );
        Some(elapsed)
    }

    /// Number of labels started but not finished.
    pub fn open(&self) -> usize {
        self.started.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Capture {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn test_redacting_writer_masks_on_drop() {
        let capture = Capture::default();
        let sink = capture.clone();
        let make = RedactingMakeWriter::new(move || sink.clone());
        {
            let mut w = make.make_writer();
            w.write_all(b"login password=hunter2 ").unwrap();
            w.write_all(b"done\n").unwrap();
            assert_eq!(capture.text(), "", "nothing written before flush/drop");
        }
        assert_eq!(capture.text(), "login password=[REDACTED] done\n");
    }

    #[test]
    fn test_subscriber_output_is_redacted() {
        let capture = Capture::default();
        let sink = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(RedactingMakeWriter::new(move || sink.clone()))
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(key = "0badcafe", "sent Bearer abcdef123456");
        });

        let text = capture.text();
        assert!(text.contains("Bearer [REDACTED]"), "{text}");
        assert!(text.contains("0badcafe"));
        assert!(!text.contains("abcdef123456"));
    }

    #[test]
    fn test_request_timer_start_finish() {
        let mut timer = RequestTimer::new("test");
        timer.start("phase");
        assert_eq!(timer.open(), 1);
        assert!(timer.finish("phase").is_some());
        assert_eq!(timer.open(), 0);
        assert!(timer.finish("phase").is_none());
    }

    #[test]
    fn test_request_timer_is_bounded() {
        const LABELS: [&str; MAX_TIMED_LABELS + 1] = [
            "l00", "l01", "l02", "l03", "l04", "l05", "l06", "l07", "l08", "l09", "l10", "l11",
            "l12", "l13", "l14", "l15", "l16", "l17", "l18", "l19", "l20", "l21", "l22", "l23",
            "l24", "l25", "l26", "l27", "l28", "l29", "l30", "l31", "l32",
        ];
        let mut timer = RequestTimer::new("test");
        for label in LABELS {
            timer.start(label);
        }
        assert_eq!(timer.open(), MAX_TIMED_LABELS);
        assert!(timer.finish("l32").is_none());

        // Restarting an existing label is still allowed at capacity.
        timer.start("l00");
        assert_eq!(timer.open(), MAX_TIMED_LABELS);
    }
}

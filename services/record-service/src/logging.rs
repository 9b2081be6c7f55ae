//! Console and request-log setup.
//!
//! The console subscriber is installed globally and carries startup and
//! fatal diagnostics. Request events go to a separate [`Dispatch`] that
//! appends one JSON object per line to the configured log file; the
//! dispatch is handed to the service handler rather than installed
//! globally.

use tracing::Dispatch;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use crate::config::LogConfig;
use crate::error::Result;

/// Install the human-readable console subscriber as the global default.
///
/// The filter comes from `RUST_LOG` when set.
pub fn init_console() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "record_service=info,tonic=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build a JSON-lines dispatch writing to `writer` at `level` and above.
///
/// Only events emitted by this crate are written; libraries called from a
/// handler (sqlx, redis, tonic) stay out of the request log. Event fields
/// are flattened to the top level of each object next to `timestamp`,
/// `level` and `message`.
pub fn json_dispatch<W>(writer: W, level: LevelFilter) -> Dispatch
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .json()
        .flatten_event(true)
        .with_current_span(false)
        .with_span_list(false)
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(Targets::new().with_target(env!("CARGO_CRATE_NAME"), level));

    Dispatch::new(tracing_subscriber::registry().with(layer))
}

/// Open the append-only request log described by `config`.
///
/// The returned guard flushes buffered lines when dropped and must live as
/// long as the dispatch is in use. Write failures after this point are
/// dropped by the background writer.
///
/// # Errors
///
/// Returns error if the log directory cannot be created or the file cannot
/// be opened for appending.
pub fn open_request_log(config: &LogConfig) -> Result<(Dispatch, WorkerGuard)> {
    std::fs::create_dir_all(&config.directory)?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(&config.file)
        .build(&config.directory)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    Ok((json_dispatch(writer, config.level_filter()), guard))
}

/// In-memory log capture for tests.
#[cfg(test)]
pub(crate) mod capture {
    use std::io;
    use std::sync::{Arc, Mutex, PoisonError};
    use tracing_subscriber::fmt::MakeWriter;

    /// Shared buffer collecting everything written by a [`super::json_dispatch`].
    #[derive(Clone, Default)]
    pub struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl CapturedLog {
        /// Parsed JSON objects, one per written line.
        pub fn events(&self) -> Vec<serde_json::Value> {
            let buf = self.0.lock().unwrap_or_else(PoisonError::into_inner);
            String::from_utf8_lossy(&buf)
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(|line| serde_json::from_str(line).expect("log line is JSON"))
                .collect()
        }

        /// Values of the `event` field, in write order.
        pub fn event_names(&self) -> Vec<String> {
            self.events()
                .iter()
                .filter_map(|e| e["event"].as_str().map(str::to_string))
                .collect()
        }
    }

    impl io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLog {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }
}

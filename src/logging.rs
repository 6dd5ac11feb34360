//! Logging: timestamped `[Updater]` lines to the console and an append-only
//! log file under the install root.
//!
//! Output format is part of the external interface (operators and the parent
//! launcher grep these files): `[<timestamp>][Updater] <message>`. Built on
//! tracing-subscriber with two fmt layers sharing one event format; the
//! `SLIPWAY_LOG` environment variable overrides the level filter. A failure
//! to open the log file degrades to console-only logging - a broken log
//! directory must never abort an update run.

use std::fmt;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt as fmt_layer};

/// File name of the append-only log inside the `Log/` directory.
pub const LOG_FILE: &str = "updater.log";

/// `[<timestamp>][Updater] <message>` line format.
#[derive(Debug, Clone, Copy, Default)]
struct UpdaterFormat;

impl<S, N> FormatEvent<S, N> for UpdaterFormat
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> fmt::Result {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        write!(writer, "[{timestamp}][Updater] ")?;
        if *event.metadata().level() != Level::INFO {
            write!(writer, "{}: ", event.metadata().level())?;
        }
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Install the global subscriber.
///
/// `verbose` maps to DEBUG, `quiet` to ERROR, the default to INFO;
/// `SLIPWAY_LOG` takes precedence when set. Safe to call more than once (the
/// second call is a no-op), and never fails the run.
pub fn init(log_dir: &Path, verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_env("SLIPWAY_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let console = fmt_layer::layer().event_format(UpdaterFormat).with_writer(std::io::stdout);

    let file_result = std::fs::create_dir_all(log_dir)
        .and_then(|()| OpenOptions::new().create(true).append(true).open(log_dir.join(LOG_FILE)));

    match file_result {
        Ok(file) => {
            let file_layer = fmt_layer::layer()
                .event_format(UpdaterFormat)
                .with_ansi(false)
                .with_writer(Arc::new(file));
            let _ = tracing_subscriber::registry().with(filter).with(console).with(file_layer).try_init();
        }
        Err(err) => {
            let _ = tracing_subscriber::registry().with(filter).with(console).try_init();
            tracing::warn!(
                "could not open log file under {} ({err}); logging to console only",
                log_dir.display()
            );
        }
    }
}

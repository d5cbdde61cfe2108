//! Status reporting and the persistent error log.

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{Event, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Name of the error log kept in the output directory
pub const LOG_FILE_NAME: &str = "0logs.log";

/// Sink for human-readable progress messages
pub trait StatusReporter: Send + Sync {
    /// Show a message immediately
    fn status(&self, message: &str);

    /// Show a message and record it in the error log
    fn error(&self, message: &str) {
        tracing::error!("{}", message);
        self.status(message);
    }
}

/// Console status line backed by an indicatif spinner
pub struct ConsoleStatus {
    spinner: Option<ProgressBar>,
}

impl ConsoleStatus {
    /// Falls back to plain stdout lines when progress is disabled or stderr is not a terminal
    pub fn new(show_progress: bool) -> Self {
        let spinner = show_progress.then(|| {
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            spinner.enable_steady_tick(Duration::from_millis(120));
            spinner.set_message("Ready");
            spinner
        });

        Self {
            spinner: spinner.filter(|spinner| !spinner.is_hidden()),
        }
    }

    /// Stop the spinner, leaving the last message on screen
    pub fn finish(&self) {
        if let Some(spinner) = &self.spinner {
            spinner.finish();
        }
    }
}

impl StatusReporter for ConsoleStatus {
    fn status(&self, message: &str) {
        match &self.spinner {
            Some(spinner) => {
                spinner.println(format!("{} {}", style("•").green(), message));
                spinner.set_message(message.to_string());
            }
            None => println!("{}", message),
        }
    }

    fn error(&self, message: &str) {
        tracing::error!("{}", message);
        match &self.spinner {
            Some(spinner) => {
                spinner.println(format!("{} {}", style("✗").red(), message));
                spinner.set_message(message.to_string());
            }
            None => println!("{}", message),
        }
    }
}

/// Error log lines: `YYYY-MM-DD HH:MM:SS [LEVEL]: message`, local time
struct ErrorLogFormat;

impl<S, N> FormatEvent<S, N> for ErrorLogFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(
            writer,
            "{} [{}]: ",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            event.metadata().level()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Install the console and error-log layers.
///
/// The console layer honours `RUST_LOG`; the file layer appends ERROR events to
/// `0logs.log` in `output_dir`.
pub fn init_logging(output_dir: &Path, verbose: bool) -> Result<()> {
    let log_path = output_dir.join(LOG_FILE_NAME);
    let log_file = fs_err::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .context("Failed to open error log")?;

    let default_filter = if verbose { "tube2mp3=debug" } else { "tube2mp3=warn" };

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        );

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .event_format(ErrorLogFormat)
        .with_filter(LevelFilter::ERROR);

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to initialise logging")?;

    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::StatusReporter;
    use std::sync::Mutex;

    /// Reporter that records every message for assertions
    #[derive(Default)]
    pub struct RecordingStatus {
        pub messages: Mutex<Vec<String>>,
        pub errors: Mutex<Vec<String>>,
    }

    impl RecordingStatus {
        pub fn messages(&self) -> Vec<String> {
            self.messages.lock().unwrap().clone()
        }

        pub fn errors(&self) -> Vec<String> {
            self.errors.lock().unwrap().clone()
        }
    }

    impl StatusReporter for RecordingStatus {
        fn status(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }

        fn error(&self, message: &str) {
            self.errors.lock().unwrap().push(message.to_string());
            self.status(message);
        }
    }
}

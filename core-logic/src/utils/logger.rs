use chrono::Local;
use nu_ansi_term::{Color, Style};
use std::fmt;
use std::fmt::Write as _;
use tracing::{Event, Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{format::Writer, FmtContext, FormatEvent, FormatFields, FormattedFields},
    prelude::*,
    registry::LookupSpan,
    EnvFilter, Layer,
};

/// Target used for every operator-facing line (balances, transfers, outcomes).
pub const RESULT_TARGET: &str = "task_result";

/// Installs the console and rolling-file layers.
///
/// The console shows `task_result` lines at INFO and everything else at WARN,
/// unless `RUST_LOG` is set, in which case it takes over the console filter.
/// The returned guard flushes the file writer and must be kept alive.
pub fn setup_logger(log_dir: &str, file_prefix: &str) -> Option<WorkerGuard> {
    std::fs::create_dir_all(log_dir).ok();

    let file_appender = tracing_appender::rolling::hourly(log_dir, file_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // File keeps the full picture: results plus retry warnings
    let file_filter = tracing_subscriber::filter::Targets::new()
        .with_target(RESULT_TARGET, Level::INFO)
        .with_default(Level::WARN);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .event_format(FileFormatter)
        .with_filter(file_filter);

    let env_filter = EnvFilter::try_from_default_env().ok();

    let console_targets = tracing_subscriber::filter::Targets::new()
        .with_target(RESULT_TARGET, Level::INFO)
        .with_default(Level::WARN);

    let console_layer = env_filter.is_none().then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stdout)
            .with_ansi(true)
            .event_format(TerminalFormatter)
            .with_filter(console_targets)
    });

    let console_env_layer = env_filter.map(|filter| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stdout)
            .with_ansi(true)
            .event_format(TerminalFormatter)
            .with_filter(filter)
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .with(console_env_layer)
        .init();

    Some(guard)
}

// --- Formatters ---

/// Collects the message plus any structured fields as `key=value`.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }
}

impl MessageVisitor {
    fn collect(event: &Event<'_>) -> Self {
        let mut visitor = Self::default();
        event.record(&mut visitor);
        visitor
    }

    fn line(&self) -> String {
        format!("{}{}", self.message, self.fields)
    }
}

/// `[field=value] ` for every span around the event, outermost first.
fn span_prefix<S, N>(ctx: &FmtContext<'_, S, N>) -> String
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    let mut prefix = String::new();
    if let Some(scope) = ctx.event_scope() {
        for span in scope.from_root() {
            let extensions = span.extensions();
            if let Some(fields) = extensions.get::<FormattedFields<N>>() {
                if !fields.is_empty() {
                    let _ = write!(prefix, "[{}] ", fields);
                }
            }
        }
    }
    prefix
}

/// Outcome words highlighted on the console.
const HIGHLIGHTS: [(&str, Color); 6] = [
    ("Success", Color::LightGreen),
    ("Finished", Color::LightGreen),
    ("FAILED", Color::LightRed),
    ("Failed", Color::LightRed),
    ("Insufficient", Color::LightRed),
    ("pending", Color::Yellow),
];

fn highlight(msg: &str) -> String {
    HIGHLIGHTS.iter().fold(msg.to_string(), |acc, (word, color)| {
        if acc.contains(word) {
            let painted = Style::new().fg(*color).bold().paint(*word).to_string();
            acc.replace(word, &painted)
        } else {
            acc
        }
    })
}

pub struct TerminalFormatter;

impl<S, N> FormatEvent<S, N> for TerminalFormatter
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
        let line = format!(
            "{}{}",
            span_prefix(ctx),
            highlight(&MessageVisitor::collect(event).line())
        );

        match *event.metadata().level() {
            Level::ERROR => write!(writer, "{}", Color::Red.paint(line))?,
            Level::WARN => write!(writer, "{}", Color::Yellow.paint(line))?,
            _ => write!(writer, "{}", line)?,
        }
        writeln!(writer)
    }
}

pub struct FileFormatter;

impl<S, N> FormatEvent<S, N> for FileFormatter
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
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let metadata = event.metadata();

        write!(
            writer,
            "{} [{}] {}: {}",
            timestamp,
            metadata.level(),
            metadata.target(),
            span_prefix(ctx)
        )?;
        writeln!(writer, "{}", MessageVisitor::collect(event).line())
    }
}

use std::fmt;

use nu_ansi_term::{Color, Style};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    EnvFilter,
    fmt::{
        FmtContext, FormatEvent, FormatFields,
        format::Writer,
        time::{FormatTime, SystemTime},
    },
    registry::LookupSpan,
};

/// Installs the global subscriber. Verbosity is controlled with `RUST_LOG`, defaulting to `info`
/// plus a line for each http request.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .event_format(OperatorFormat)
        .init();
}

/// Prints `<time> <level> <source>: <fields>`. Sources are short names an operator understands,
/// rather than module paths.
struct OperatorFormat;

impl<S, N> FormatEvent<S, N> for OperatorFormat
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
        let metadata = event.metadata();
        let level = *metadata.level();
        let source = source_name(metadata.target());

        if writer.has_ansi_escapes() {
            let dimmed = Style::new().dimmed();
            write!(writer, "{}", dimmed.prefix())?;
            SystemTime.format_time(&mut writer)?;
            write!(writer, "{} ", dimmed.suffix())?;
            write!(writer, "{:>5} ", level_color(level).paint(level.as_str()))?;
            write!(writer, "{}: ", Style::new().bold().paint(source))?;
        } else {
            SystemTime.format_time(&mut writer)?;
            write!(writer, " {:>5} {source}: ", level.as_str())?;
        }
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

fn level_color(level: Level) -> Color {
    match level {
        Level::ERROR => Color::Red,
        Level::WARN => Color::Yellow,
        Level::INFO => Color::Green,
        Level::DEBUG => Color::Blue,
        Level::TRACE => Color::Purple,
    }
}

/// Maps the target of an event to the part of the system it stems from.
fn source_name(target: &str) -> &str {
    let crate_name = target.split("::").next().unwrap_or(target);
    match crate_name {
        "tower_http" => "http",
        "axum" | "hyper" | "hyper_util" => "server",
        "embedded_ui" => match target {
            "embedded_ui" => "server",
            t if t.starts_with("embedded_ui::server") || t.starts_with("embedded_ui::shutdown") => {
                "server"
            }
            _ => "ui",
        },
        _ => target,
    }
}

use std::str::FromStr;

use nu_ansi_term::Color::{Blue, Magenta, Red, Yellow};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    fmt::{
        self,
        format::{FmtSpan, Writer},
        FmtContext, FormatEvent, FormatFields,
    },
    registry::LookupSpan,
};

use crate::{cli::Args, utils::Colored};

#[derive(Default)]
struct MessageVisitor {
    message: Option<String>,
    fields: Vec<String>,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{value:?}"));
        } else {
            self.fields.push(format!("{}={value:?}", field.name()));
        }
    }
}

pub struct CustomFormatter;

impl<S, N> FormatEvent<S, N> for CustomFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let level = *event.metadata().level();
        match level {
            Level::TRACE => write!(writer, "{} ", Colored(Magenta, "[TRACE]")),
            Level::DEBUG => write!(writer, "{} ", Colored(Blue, "[DEBUG]")),
            Level::INFO => write!(writer, ""),
            Level::WARN => write!(writer, "{} ", Colored(Yellow, "[WARN]")),
            Level::ERROR => write!(writer, "{} ", Colored(Red, "[ERROR]")),
        }?;

        if let Some(message) = visitor.message {
            write!(writer, "{message}")?;
        }

        // Event fields (sql, params) are shown at debug and trace only.
        if level >= Level::DEBUG && !visitor.fields.is_empty() {
            write!(writer, " {}", Colored(Blue, visitor.fields.join(" ")))?;
        }

        writeln!(writer)
    }
}

/// Level from the verbosity flags, else `default_level` from the config.
fn filter_level(args: &Args, default_level: Option<&str>) -> Level {
    if args.quiet {
        Level::ERROR
    } else if args.verbose >= 2 {
        Level::TRACE
    } else if args.verbose == 1 {
        Level::DEBUG
    } else {
        default_level
            .and_then(|level| Level::from_str(level).ok())
            .unwrap_or(Level::INFO)
    }
}

pub fn setup_logging(args: &Args, default_level: Option<&str>) {
    let filter_level = filter_level(args, default_level);

    let builder = fmt::Subscriber::builder()
        .with_env_filter(format!("accrue={filter_level}"))
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(std::io::stderr)
        .compact()
        .without_time();

    let subscriber: Box<dyn Subscriber + Send + Sync> = if args.json {
        Box::new(builder.json().flatten_event(true).finish())
    } else {
        Box::new(builder.event_format(CustomFormatter).finish())
    };

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("a tracing subscriber was already installed");
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn test_filter_level_flags_override_config() {
        let args = Args::parse_from(["accrue", "-vv", "count", "users"]);
        assert_eq!(filter_level(&args, Some("warn")), Level::TRACE);

        let args = Args::parse_from(["accrue", "-q", "count", "users"]);
        assert_eq!(filter_level(&args, Some("debug")), Level::ERROR);

        let args = Args::parse_from(["accrue", "count", "users"]);
        assert_eq!(filter_level(&args, Some("warn")), Level::WARN);
        assert_eq!(filter_level(&args, None), Level::INFO);
        assert_eq!(filter_level(&args, Some("bogus")), Level::INFO);
    }
}

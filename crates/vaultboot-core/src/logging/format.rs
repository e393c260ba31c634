//! Single-line event format: `machine | timestamp [LEVEL] | message`

use std::fmt;

use chrono::Local;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f %:z";

/// Event formatter prefixing every line with the machine name
#[derive(Debug, Clone)]
pub struct MachineFormat {
    machine: String,
}

impl MachineFormat {
    pub fn new(machine: impl Into<String>) -> Self {
        Self {
            machine: machine.into(),
        }
    }

    pub fn machine(&self) -> &str {
        &self.machine
    }
}

/// Fixed-width four-letter level code
fn level_label(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "VRBS",
        Level::DEBUG => "DBUG",
        Level::INFO => "INFO",
        Level::WARN => "WARN",
        Level::ERROR => "EROR",
    }
}

impl<S, N> FormatEvent<S, N> for MachineFormat
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
            "{} | {} [{}] | ",
            self.machine,
            Local::now().format(TIMESTAMP_FORMAT),
            level_label(event.metadata().level())
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_line_layout() {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_max_level(Level::DEBUG)
            .event_format(MachineFormat::new("web-01"))
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("Vault read timed out");
            tracing::debug!("layer merged");
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 2, "{}", output);
        assert!(lines[0].starts_with("web-01 | "), "{}", lines[0]);
        assert!(lines[0].contains(" [WARN] | Vault read timed out"), "{}", lines[0]);
        assert!(lines[1].contains(" [DBUG] | layer merged"), "{}", lines[1]);
    }

    #[test]
    fn test_level_labels() {
        for level in [Level::TRACE, Level::DEBUG, Level::INFO, Level::WARN, Level::ERROR] {
            assert_eq!(level_label(&level).len(), 4);
        }
        assert_eq!(level_label(&Level::TRACE), "VRBS");
        assert_eq!(level_label(&Level::DEBUG), "DBUG");
        assert_eq!(level_label(&Level::INFO), "INFO");
        assert_eq!(level_label(&Level::ERROR), "EROR");
    }
}

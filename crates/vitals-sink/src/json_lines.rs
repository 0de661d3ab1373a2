use crate::error::SinkError;
use crate::Sink;
use std::io::{self, Stdout, Write};
use vitals_core::Event;

/// Writes one JSON object per line and flushes after each event so
/// downstream readers see a live stream.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    out: W,
    label: &'static str,
}

impl JsonLinesSink<Stdout> {
    pub fn stdout() -> Self {
        Self {
            out: io::stdout(),
            label: "stdout",
        }
    }
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            label: "writer",
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Sink for JsonLinesSink<W> {
    fn publish(&mut self, event: &Event) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.out, event)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.out.flush()?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("json-lines({})", self.label)
    }
}

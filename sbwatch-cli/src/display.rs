//! Terminal display
//!
//! A terminal cannot redraw earlier output in place, so each render writes
//! only the part of the job's text that has not been shown yet.

use sbwatch_runner::{Display, DisplayId};
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};
use tracing::warn;

struct Shown<W> {
    writer: W,
    lengths: HashMap<DisplayId, usize>,
}

/// Display writing incremental job output to a stream
pub struct TerminalDisplay<W: Write + Send> {
    inner: Mutex<Shown<W>>,
}

impl TerminalDisplay<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> TerminalDisplay<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: Mutex::new(Shown {
                writer,
                lengths: HashMap::new(),
            }),
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.inner
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .writer
    }
}

impl<W: Write + Send> Display for TerminalDisplay<W> {
    fn upsert(&self, id: DisplayId, text: &str) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let Shown { writer, lengths } = &mut *inner;
        let shown = lengths.get(&id).copied().unwrap_or(0);

        // Text that no longer extends what was shown is written out again
        let fresh = if shown <= text.len() && text.is_char_boundary(shown) {
            &text[shown..]
        } else {
            text
        };

        if let Err(e) = writer.write_all(fresh.as_bytes()).and_then(|_| writer.flush()) {
            warn!("Failed to write output for display {}: {}", id, e);
        }

        lengths.insert(id, text.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sbwatch_runner::{DisplayIdAllocator, LiveBuffer, OutputSink};
    use std::sync::Arc;

    #[test]
    fn test_writes_only_new_text() {
        let display = TerminalDisplay::new(Vec::new());
        let id = DisplayIdAllocator::new().allocate();

        display.upsert(id, "Submitting job1.sbatch\n");
        display.upsert(id, "Submitting job1.sbatch\nSubmitted batch job 42\n");
        display.upsert(id, "Submitting job1.sbatch\nSubmitted batch job 42\n");

        let out = String::from_utf8(display.into_inner()).unwrap();
        assert_eq!(out, "Submitting job1.sbatch\nSubmitted batch job 42\n");
    }

    #[test]
    fn test_rewrites_diverging_text() {
        let display = TerminalDisplay::new(Vec::new());
        let id = DisplayIdAllocator::new().allocate();

        display.upsert(id, "abc");
        display.upsert(id, "x");

        let out = String::from_utf8(display.into_inner()).unwrap();
        assert_eq!(out, "abcx");
    }

    #[test]
    fn test_tracks_each_display_separately() {
        let display = Arc::new(TerminalDisplay::new(Vec::new()));
        let ids = DisplayIdAllocator::new();
        let mut first = LiveBuffer::new(ids.allocate(), display.clone(), "a1\n");
        let mut second = LiveBuffer::new(ids.allocate(), display.clone(), "b1\n");

        first.append("a2\n");
        second.append("b2\n");
        drop(first);
        drop(second);

        let display = Arc::try_unwrap(display).ok().unwrap();
        let out = String::from_utf8(display.into_inner()).unwrap();
        assert_eq!(out, "a1\nb1\na2\nb2\n");
    }
}

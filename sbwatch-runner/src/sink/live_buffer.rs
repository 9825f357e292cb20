//! Live output buffer

use std::sync::Arc;

use super::display::{Display, DisplayId};

/// Append-only output capability used by the submitter and the watcher
pub trait OutputSink: Send {
    fn append(&mut self, text: &str);
}

/// Buffer bound to one display slot
///
/// Grows monotonically and renders its full content on every append.
pub struct LiveBuffer {
    id: DisplayId,
    text: String,
    display: Arc<dyn Display>,
}

impl LiveBuffer {
    /// Creates the buffer and renders `initial` right away
    pub fn new(id: DisplayId, display: Arc<dyn Display>, initial: &str) -> Self {
        let buffer = Self {
            id,
            text: initial.to_string(),
            display,
        };
        buffer.render();
        buffer
    }

    pub fn id(&self) -> DisplayId {
        self.id
    }

    /// Everything appended so far
    pub fn text(&self) -> &str {
        &self.text
    }

    fn render(&self) {
        self.display.upsert(self.id, &self.text);
    }
}

impl OutputSink for LiveBuffer {
    fn append(&mut self, text: &str) {
        self.text.push_str(text);
        self.render();
    }
}

impl std::fmt::Debug for LiveBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveBuffer")
            .field("id", &self.id)
            .field("len", &self.text.len())
            .finish()
    }
}

//! Live output layer
//!
//! A job's progress is shown through a sink: an append-only text buffer
//! that re-renders its whole content to a display surface on every append.
//! Submitter and watcher only see the `OutputSink` capability, so display
//! backends can be swapped without touching them.

mod display;
mod live_buffer;

pub use display::{Display, DisplayId, DisplayIdAllocator, MemoryDisplay};
pub use live_buffer::{LiveBuffer, OutputSink};

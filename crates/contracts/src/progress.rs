//! Progress reporting interface
//!
//! Called by the engine after each record; `total` is the number of test samples.

/// Receives `(current, total)` notifications
pub trait ProgressSink {
    fn on_progress(&mut self, current: usize, total: usize);
}

/// Discards all notifications
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&mut self, _current: usize, _total: usize) {}
}

impl<F> ProgressSink for F
where
    F: FnMut(usize, usize),
{
    fn on_progress(&mut self, current: usize, total: usize) {
        self(current, total)
    }
}

//! Progress notification for long batch runs.

/// Observer notified by the pipeline as it works through a batch.
///
/// Owned by the caller and passed in by `&mut`, so only one batch can report
/// to a given observer at a time.
pub trait Progress {
    /// A new step (e.g. "Extracting") begins.
    fn step_start(&mut self, name: &str);

    /// `current` of `end` items in the current step are done.
    fn advance(&mut self, current: usize, end: usize);
}

/// Discards all notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn step_start(&mut self, _name: &str) {}

    fn advance(&mut self, _current: usize, _end: usize) {}
}

#[cfg(test)]
pub(crate) mod recording {
    use super::Progress;

    /// Records every notification as a string.
    #[derive(Debug, Default)]
    pub struct RecordingProgress {
        pub events: Vec<String>,
    }

    impl Progress for RecordingProgress {
        fn step_start(&mut self, name: &str) {
            self.events.push(format!("start {}", name));
        }

        fn advance(&mut self, current: usize, end: usize) {
            self.events.push(format!("{}/{}", current, end));
        }
    }
}

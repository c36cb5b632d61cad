use std::time::Instant;

/// Source of "now" for the stream loop.
///
/// Blink debounce and blink rate are wall-clock quantities; tests swap in a
/// manually advanced clock to replay exact frame timings.
pub trait Clock: Send {
    fn now(&self) -> Instant;
}

/// Monotonic process clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

use std::cell::Cell;
use std::time::Duration;

thread_local! {
    static COMPILE_TIME_NS: Cell<u64> = const { Cell::new(0) };
}

/// Timings and counters for the most recent compile and run of a machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub compile_time: Duration,
    pub run_time: Duration,
    /// Instructions executed by the last successful run.
    pub executed: usize,
    /// Completed runs since the machine was created.
    pub runs: usize,
}

pub(crate) fn add_compile_time(duration: Duration) {
    let nanos = duration.as_nanos().min(u128::from(u64::MAX)) as u64;
    COMPILE_TIME_NS.with(|cell| cell.set(cell.get().saturating_add(nanos)));
}

/// Returns the compile time accumulated on this thread and resets the counter.
pub fn take_compile_time() -> Duration {
    COMPILE_TIME_NS.with(|cell| Duration::from_nanos(cell.replace(0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_time_accumulates_until_taken() {
        take_compile_time();
        add_compile_time(Duration::from_micros(3));
        add_compile_time(Duration::from_micros(4));
        assert_eq!(take_compile_time(), Duration::from_micros(7));
        assert_eq!(take_compile_time(), Duration::ZERO);
    }
}

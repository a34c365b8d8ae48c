use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Debounce gate for the trigger endpoint. One timestamp of the last
/// admitted run, checked and set under a single lock acquisition so two
/// near-simultaneous triggers admit at most one run.
pub struct Throttle {
    min_interval: Duration,
    last_run: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_run: Mutex::new(None),
        }
    }

    /// Admit a run and record it, or turn the caller away if the previous
    /// admitted run is still inside the window. The timestamp sticks even
    /// if the admitted run later fails.
    pub fn try_acquire(&self) -> bool {
        let mut last = self.last_run.lock().unwrap();
        match *last {
            Some(t) if t.elapsed() < self.min_interval => false,
            _ => {
                *last = Some(Instant::now());
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_inside_window_is_rejected() {
        let throttle = Throttle::new(Duration::from_secs(60));
        assert!(throttle.try_acquire());
        assert!(!throttle.try_acquire());
    }

    #[test]
    fn reopens_after_the_window() {
        let throttle = Throttle::new(Duration::from_millis(30));
        assert!(throttle.try_acquire());
        assert!(!throttle.try_acquire());
        std::thread::sleep(Duration::from_millis(40));
        assert!(throttle.try_acquire());
    }
}

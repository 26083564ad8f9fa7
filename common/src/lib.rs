pub mod browse;
pub mod config;
mod error;
pub mod logfile;
pub mod poller;
pub mod session;

pub use config::Config;
pub use error::{Error, Result};

use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

/// Cancellation token shared between the poller and whoever wants it to stop,
/// e.g. a Ctrl+C handler running on another thread.
#[derive(Clone, Default)]
pub struct ShutdownSignal(Arc<(Mutex<bool>, Condvar)>);

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests shutdown and wakes every waiter.
    pub fn trigger(&self) {
        let (lock, condvar) = &*self.0;
        let mut triggered = lock.lock().unwrap_or_else(|e| e.into_inner());
        *triggered = true;
        condvar.notify_all();
    }

    pub fn is_triggered(&self) -> bool {
        let (lock, _) = &*self.0;
        *lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Sleeps for `timeout` unless shutdown is requested first.
    ///
    /// Returns `true` if shutdown was requested before or during the wait.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (lock, condvar) = &*self.0;
        // No deadline if the interval does not fit an `Instant`, wait for the trigger only.
        let deadline = Instant::now().checked_add(timeout);
        let mut triggered = lock.lock().unwrap_or_else(|e| e.into_inner());

        // Loop for spurious wakeups.
        while !*triggered {
            triggered = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        break;
                    }
                    match condvar.wait_timeout(triggered, deadline - now) {
                        Ok((guard, _)) => guard,
                        Err(e) => e.into_inner().0,
                    }
                }
                None => condvar.wait(triggered).unwrap_or_else(|e| e.into_inner()),
            };
        }
        *triggered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_times_out() {
        let signal = ShutdownSignal::new();
        let started = Instant::now();

        assert!(!signal.wait_timeout(Duration::from_millis(20)));
        assert!(started.elapsed() >= Duration::from_millis(20));
        assert!(!signal.is_triggered());
    }

    #[test]
    fn test_trigger_wakes_waiter() {
        let signal = ShutdownSignal::new();
        let trigger = signal.clone();

        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            trigger.trigger();
        });

        let started = Instant::now();
        assert!(signal.wait_timeout(Duration::from_secs(30)));
        assert!(started.elapsed() < Duration::from_secs(30));
        handle.join().unwrap();
    }

    #[test]
    fn test_already_triggered() {
        let signal = ShutdownSignal::new();
        signal.trigger();

        assert!(signal.is_triggered());
        assert!(signal.wait_timeout(Duration::from_secs(30)));
    }

    #[test]
    fn test_wait_with_unbounded_interval() {
        let signal = ShutdownSignal::new();
        signal.trigger();
        assert!(signal.wait_timeout(Duration::from_secs(u64::MAX)));

        let signal = ShutdownSignal::new();
        let trigger = signal.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            trigger.trigger();
        });

        assert!(signal.wait_timeout(Duration::MAX));
        handle.join().unwrap();
    }
}

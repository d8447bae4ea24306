//! Process keep-alive: a blocking wait on an explicit shutdown signal.

use std::sync::{Arc, Condvar, Mutex};

struct SignalState {
    down: Mutex<bool>,
    cond: Condvar,
}

/// Shutdown signal owned by the [`Host`](crate::Host).
///
/// [`Host::wait`](crate::Host::wait) parks the calling thread here until a
/// [`ShutdownHandle`] fires, instead of spinning to keep the process alive.
pub(crate) struct ShutdownSignal {
    state: Arc<SignalState>,
}

impl ShutdownSignal {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(SignalState {
                down: Mutex::new(false),
                cond: Condvar::new(),
            }),
        }
    }

    pub(crate) fn handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            state: self.state.clone(),
        }
    }

    /// Block until shutdown is signalled. Returns immediately if it already
    /// was.
    pub(crate) fn wait(&self) {
        let mut down = self.state.down.lock().unwrap();
        while !*down {
            down = self.state.cond.wait(down).unwrap();
        }
    }
}

/// Cloneable, thread-safe handle that releases every thread blocked in
/// [`Host::wait`](crate::Host::wait).
#[derive(Clone)]
pub struct ShutdownHandle {
    state: Arc<SignalState>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        *self.state.down.lock().unwrap() = true;
        self.state.cond.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn handle_releases_waiter() {
        let signal = ShutdownSignal::new();
        let handle = signal.handle();

        let waiter = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            handle.shutdown();
        });

        signal.wait();
        waiter.join().unwrap();
    }

    #[test]
    fn wait_after_shutdown_returns_immediately() {
        let signal = ShutdownSignal::new();
        signal.handle().shutdown();
        signal.wait();
    }

    #[test]
    fn all_waiters_are_released() {
        let signal = Arc::new(ShutdownSignal::new());
        let handle = signal.handle();

        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let signal = signal.clone();
                thread::spawn(move || signal.wait())
            })
            .collect();

        thread::sleep(Duration::from_millis(50));
        handle.shutdown();
        for waiter in waiters {
            waiter.join().unwrap();
        }
    }
}

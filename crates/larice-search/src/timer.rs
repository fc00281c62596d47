//! One-shot expiry timer backing the deadline clock.

use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Re-armable one-shot timer on a dedicated thread.
///
/// Arming overwrites any pending deadline; when the deadline passes, every
/// subscriber receives one notification. The notification is advisory;
/// polling the clock remains the authoritative expiry check.
pub(crate) struct ExpiryTimer {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

struct Shared {
    state: Mutex<TimerState>,
    cond: Condvar,
}

struct TimerState {
    fire_at: Option<Instant>,
    shutdown: bool,
    subscribers: Vec<mpsc::Sender<()>>,
}

impl ExpiryTimer {
    pub(crate) fn new() -> ExpiryTimer {
        let shared = Arc::new(Shared {
            state: Mutex::new(TimerState {
                fire_at: None,
                shutdown: false,
                subscribers: Vec::new(),
            }),
            cond: Condvar::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = std::thread::spawn(move || run_timer(&worker_shared));

        ExpiryTimer {
            shared,
            worker: Some(worker),
        }
    }

    /// Arm (or re-arm) the timer to fire after `delay`.
    pub(crate) fn arm(&self, delay: Duration) {
        let mut state = self.lock();
        state.fire_at = Some(Instant::now() + delay);
        self.shared.cond.notify_one();
    }

    /// Cancel any pending deadline.
    pub(crate) fn cancel(&self) {
        let mut state = self.lock();
        state.fire_at = None;
        self.shared.cond.notify_one();
    }

    /// Register a channel that receives one `()` per fired deadline.
    pub(crate) fn subscribe(&self) -> mpsc::Receiver<()> {
        let (tx, rx) = mpsc::channel();
        self.lock().subscribers.push(tx);
        rx
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TimerState> {
        self.shared.state.lock().expect("timer state poisoned")
    }
}

impl Drop for ExpiryTimer {
    fn drop(&mut self) {
        {
            let mut state = self.lock();
            state.shutdown = true;
            self.shared.cond.notify_one();
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn run_timer(shared: &Shared) {
    let mut state = shared.state.lock().expect("timer state poisoned");
    loop {
        if state.shutdown {
            return;
        }
        match state.fire_at {
            None => {
                state = shared.cond.wait(state).expect("timer state poisoned");
            }
            Some(at) => {
                let now = Instant::now();
                if now >= at {
                    state.fire_at = None;
                    state.subscribers.retain(|tx| tx.send(()).is_ok());
                } else {
                    let (guard, _) = shared
                        .cond
                        .wait_timeout(state, at - now)
                        .expect("timer state poisoned");
                    state = guard;
                }
            }
        }
    }
}

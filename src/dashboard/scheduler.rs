/// Fixed-interval auto-refresh timer.
///
/// A background thread waits on a stop channel with a timeout equal to the
/// interval; every timeout is a tick. Each tick runs on its own short-lived
/// thread, so a slow refresh never delays the next tick and ticks may
/// overlap. There is no backoff and no jitter.
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Shortest period the timer will tick at.
const MIN_INTERVAL: Duration = Duration::from_millis(10);

/// Handle to a running timer. Stops on [`stop`](Self::stop) or drop.
pub struct Scheduler {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Scheduler {
    /// Start calling `tick` every `interval`. The first call happens one
    /// interval after start. Intervals below 10ms are raised to 10ms.
    pub fn start<F>(interval: Duration, tick: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let interval = interval.max(MIN_INTERVAL);
        let (stop, stopped) = mpsc::channel::<()>();
        let tick = Arc::new(tick);

        let handle = thread::spawn(move || {
            loop {
                match stopped.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        let tick = Arc::clone(&tick);
                        thread::spawn(move || tick());
                    }
                    // Explicit stop or the handle was dropped.
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        });

        Self {
            stop: Some(stop),
            handle: Some(handle),
        }
    }

    /// Stop ticking and wait for the timer thread to exit. Ticks already
    /// running are not interrupted.
    pub fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

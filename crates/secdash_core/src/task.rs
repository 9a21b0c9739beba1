//! Recurring background tasks with owned cancellation.
//!
//! # Responsibility
//! - Run a callback on a fixed interval on a dedicated thread.
//! - Tie the timer lifetime to the handle that created it.
//!
//! # Invariants
//! - Dropping or cancelling the handle stops the timer and joins its thread.
//! - A tick runs to completion before cancellation is observed.

use log::{debug, warn};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Handle to a running interval timer.
pub struct RecurringTask {
    name: &'static str,
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl RecurringTask {
    /// Spawns a thread that calls `tick` every `interval` until cancelled.
    ///
    /// The first tick fires one full interval after spawning.
    pub fn spawn<F>(name: &'static str, interval: Duration, mut tick: F) -> std::io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name(format!("secdash-{name}"))
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => tick(),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;

        debug!(
            "event=task_start module=task status=ok task={name} interval_ms={}",
            interval.as_millis()
        );
        Ok(Self {
            name,
            stop: Some(stop_tx),
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Stops the timer and waits for an in-flight tick to finish.
    pub fn cancel(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                warn!(
                    "event=task_stop module=task status=error task={} error=tick_panicked",
                    self.name
                );
                return;
            }
            debug!("event=task_stop module=task status=ok task={}", self.name);
        }
    }
}

impl Drop for RecurringTask {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::RecurringTask;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn ticks_until_cancelled() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let task = RecurringTask::spawn("test", Duration::from_millis(5), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        thread::sleep(Duration::from_millis(100));
        task.cancel();
        let after_cancel = ticks.load(Ordering::SeqCst);
        assert!(after_cancel > 0);

        thread::sleep(Duration::from_millis(30));
        assert_eq!(ticks.load(Ordering::SeqCst), after_cancel);
    }

    #[test]
    fn drop_stops_task_before_first_tick() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let task = RecurringTask::spawn("test", Duration::from_secs(60), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        drop(task);
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
    }
}

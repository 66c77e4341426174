//! Host tick source.
//!
//! A background thread calls a closure once per period until cancelled.
//! The session engine holds the handle and cancels it on teardown so no
//! tick can arrive after a session is disposed.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Something that delivers ticks and can be told to stop
pub trait TickHandle {
    fn cancel(&mut self);
}

pub struct Ticker {
    stop: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Spawn a ticker. `on_tick` returning false stops it from the inside.
    pub fn spawn<F>(period: Duration, mut on_tick: F) -> std::io::Result<Self>
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let worker = thread::Builder::new()
            .name("setwise-ticker".into())
            .spawn(move || loop {
                match stop_rx.recv_timeout(period) {
                    Err(RecvTimeoutError::Timeout) => {
                        if !on_tick() {
                            break;
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;

        Ok(Self {
            stop: Some(stop_tx),
            worker: Some(worker),
        })
    }

    pub fn is_active(&self) -> bool {
        self.worker.is_some()
    }
}

impl TickHandle for Ticker {
    fn cancel(&mut self) {
        // Dropping the sender wakes the worker immediately
        self.stop.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("Ticker thread panicked");
            }
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_ticks_until_cancelled() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);

        let mut ticker = Ticker::spawn(Duration::from_millis(5), move || {
            seen.fetch_add(1, Ordering::SeqCst);
            true
        })
        .unwrap();

        while count.load(Ordering::SeqCst) < 3 {
            thread::sleep(Duration::from_millis(5));
        }
        ticker.cancel();
        assert!(!ticker.is_active());

        let after_cancel = count.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(count.load(Ordering::SeqCst), after_cancel);
    }

    #[test]
    fn test_closure_can_stop_ticker() {
        let mut ticker = Ticker::spawn(Duration::from_millis(1), || false).unwrap();
        thread::sleep(Duration::from_millis(20));
        ticker.cancel();
        assert!(!ticker.is_active());
    }
}

//! Background log relay for live agent output.
//!
//! Agent work happens off the interactive thread; progress lines are
//! pushed through a channel and a worker forwards them to a sink (the
//! terminal in the chat surface). The relay drains everything queued
//! before shutting down, so no line is lost at the end of a turn.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub struct LogRelay {
    sender: Sender<String>,
    done: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl LogRelay {
    /// Start the relay worker; each queued line is passed to `sink`.
    pub fn spawn<F>(mut sink: F) -> Self
    where
        F: FnMut(String) + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel::<String>();
        let done = Arc::new(AtomicBool::new(false));
        let worker_done = done.clone();

        let worker = std::thread::spawn(move || loop {
            match receiver.recv_timeout(POLL_INTERVAL) {
                Ok(line) => sink(line),
                Err(RecvTimeoutError::Timeout) => {
                    if worker_done.load(Ordering::SeqCst) {
                        // Completion seen: drain whatever is left and stop
                        while let Ok(line) = receiver.try_recv() {
                            sink(line);
                        }
                        break;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        });

        Self {
            sender,
            done,
            worker: Some(worker),
        }
    }

    /// A handle producers can push lines through.
    pub fn sender(&self) -> Sender<String> {
        self.sender.clone()
    }

    /// Queue one line.
    pub fn log(&self, line: impl Into<String>) {
        // A closed channel only means the worker already exited
        let _ = self.sender.send(line.into());
    }

    /// Signal completion, drain remaining lines, and stop the worker.
    pub fn finish(mut self) {
        self.done.store(true, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for LogRelay {
    fn drop(&mut self) {
        self.done.store(true, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

//! Progress display for long waits
//!
//! Two flavours: a blocking [`countdown`] used while waiting for machines to
//! settle, and a [`ProgressTicker`] guard that animates a bar on a helper
//! thread while the caller blocks on an external process.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

const TICK: Duration = Duration::from_secs(1);

fn seconds_bar(total_secs: u64, hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total_secs);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}s/{len}s | {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

/// Block for `duration`, advancing a bar once per second
pub fn countdown(duration: Duration, message: &str, hidden: bool) {
    let secs = duration.as_secs();
    info!("{} for {} seconds...", message, secs);

    let pb = seconds_bar(secs, hidden);
    pb.set_message(message.to_string());
    for _ in 0..secs {
        thread::sleep(TICK);
        pb.inc(1);
    }
    let rest = duration - Duration::from_secs(secs);
    if !rest.is_zero() {
        thread::sleep(rest);
    }
    pb.finish_and_clear();
}

/// Background progress bar bound to a scope
///
/// The ticker thread stops and is joined when the guard is finished or
/// dropped, including on error paths.
pub struct ProgressTicker {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<u64>>,
}

impl ProgressTicker {
    /// Start ticking for up to `expected` seconds
    pub fn start(expected: Duration, message: &str, hidden: bool) -> Self {
        Self::with_tick(expected, message, hidden, TICK)
    }

    fn with_tick(expected: Duration, message: &str, hidden: bool, tick: Duration) -> Self {
        info!("{} for {} seconds...", message, expected.as_secs());

        let (tx, rx) = mpsc::channel::<()>();
        let pb = seconds_bar(expected.as_secs(), hidden);
        pb.set_message(message.to_string());

        let handle = thread::spawn(move || {
            let mut ticks = 0u64;
            loop {
                match rx.recv_timeout(tick) {
                    Err(RecvTimeoutError::Timeout) => {
                        ticks += 1;
                        // Keep spinning past the expected length; only the
                        // position is capped.
                        if pb.length().map_or(true, |len| pb.position() < len) {
                            pb.inc(1);
                        } else {
                            pb.tick();
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            pb.finish_and_clear();
            ticks
        });

        Self {
            stop: Some(tx),
            handle: Some(handle),
        }
    }

    /// Stop the ticker and wait for its thread. Returns elapsed ticks.
    pub fn finish(mut self) -> u64 {
        self.shutdown()
    }

    fn shutdown(&mut self) -> u64 {
        if let Some(tx) = self.stop.take() {
            let _ = tx.send(());
        }
        self.handle
            .take()
            .and_then(|h| h.join().ok())
            .unwrap_or(0)
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

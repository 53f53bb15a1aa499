//! Implements ProgressPort with indicatif: a spinner for the QR login wait
//! and a bar across the send loop.

use crate::domain::{RunSummary, SendOutcome, SendResult};
use crate::ports::ProgressPort;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

/// Console progress. All methods are best-effort and non-blocking.
#[derive(Default)]
pub struct ConsoleProgress {
    spinner: Mutex<Option<ProgressBar>>,
    bar: Mutex<Option<ProgressBar>>,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressPort for ConsoleProgress {
    fn login_wait(&self, waiting: bool) {
        let mut slot = self.spinner.lock().unwrap_or_else(|e| e.into_inner());
        if waiting {
            let pb = ProgressBar::new_spinner();
            pb.set_message("waiting for QR scan in the browser window…");
            pb.enable_steady_tick(Duration::from_millis(120));
            *slot = Some(pb);
        } else if let Some(pb) = slot.take() {
            pb.finish_and_clear();
        }
    }

    fn batch_started(&self, total: usize) {
        let pb = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::with_template("[{pos}/{len}] {bar:28} {msg}") {
            pb.set_style(style);
        }
        *self.bar.lock().unwrap_or_else(|e| e.into_inner()) = Some(pb);
    }

    fn send_started(&self, _index: usize, _total: usize, number: &str) {
        if let Some(pb) = self
            .bar
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
        {
            pb.set_message(number.to_string());
        }
    }

    fn send_finished(&self, result: &SendResult) {
        // Results recorded before the batch opens (invalid input) have no
        // bar yet; they are visible in the artifacts and the log.
        if let Some(pb) = self
            .bar
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
        {
            match result.outcome {
                SendOutcome::Sent => {
                    pb.println(format!("sent    {}", result.recipient.reported()))
                }
                SendOutcome::Failed(reason) => pb.println(format!(
                    "failed  {} ({reason})",
                    result.recipient.reported()
                )),
            }
            pb.inc(1);
        }
    }

    fn batch_finished(&self, summary: &RunSummary) {
        if let Some(pb) = self
            .bar
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            pb.finish_and_clear();
        }
        println!(
            "total {}  sent {}  failed {}",
            summary.total(),
            summary.sent(),
            summary.failed()
        );
    }
}

/// Silent implementation for tests and embedding.
pub struct NullProgress;

impl ProgressPort for NullProgress {
    fn login_wait(&self, _waiting: bool) {}
    fn batch_started(&self, _total: usize) {}
    fn send_started(&self, _index: usize, _total: usize, _number: &str) {}
    fn send_finished(&self, _result: &SendResult) {}
    fn batch_finished(&self, _summary: &RunSummary) {}
}

//! Cooperative resume signals.

use tokio::sync::Notify;

/// A single-slot wake condition.
///
/// A resume while no consumer is waiting is stored; repeated resumes
/// coalesce into that one stored wakeup. A wakeup is therefore never
/// missed and never duplicated, which is what distinguishes this from a
/// one-shot event.
///
/// Each signal is observed by exactly one consumer task: the session's
/// writer pump for the write-resume signal, the ack/response tracker
/// for the check-resume signal.
#[derive(Default)]
pub struct ResumeSignal {
    notify: Notify,
}

impl ResumeSignal {
    /// Create an unraised signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal. Coalesces with a still-pending wakeup.
    pub fn resume(&self) {
        self.notify.notify_one();
    }

    /// Wait until the signal is raised, consuming the stored wakeup.
    pub async fn resumed(&self) {
        self.notify.notified().await;
    }
}

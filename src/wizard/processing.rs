//! The "processing your profile" screen shown after the wizard completes.
//!
//! It finishes on its own after a fixed delay, or earlier when the user
//! stops it. Dropping the screen cancels the pending timer.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProcessingPhase {
    Running,
    Finished,
    Stopped,
}

impl fmt::Display for ProcessingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessingPhase::Running => write!(f, "RUNNING"),
            ProcessingPhase::Finished => write!(f, "FINISHED"),
            ProcessingPhase::Stopped => write!(f, "STOPPED"),
        }
    }
}

pub struct ProcessingScreen {
    phase: watch::Sender<ProcessingPhase>,
    timer: Option<JoinHandle<()>>,
}

impl ProcessingScreen {
    /// Shows the screen and arms the timer.
    pub fn start(delay: Duration) -> Self {
        let (tx, _) = watch::channel(ProcessingPhase::Running);
        let timer_tx = tx.clone();
        info!(delay_secs = delay.as_secs(), "processing screen shown");
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            timer_tx.send_if_modified(|phase| {
                if *phase == ProcessingPhase::Running {
                    *phase = ProcessingPhase::Finished;
                    return true;
                }
                false
            });
            debug!("processing delay elapsed");
        });
        Self {
            phase: tx,
            timer: Some(timer),
        }
    }

    pub fn phase(&self) -> ProcessingPhase {
        *self.phase.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ProcessingPhase> {
        self.phase.subscribe()
    }

    /// User-initiated stop. Returns false if the screen had already finished.
    pub fn stop(&mut self) -> bool {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        let stopped = self.phase.send_if_modified(|phase| {
            if *phase == ProcessingPhase::Running {
                *phase = ProcessingPhase::Stopped;
                return true;
            }
            false
        });
        if stopped {
            info!("processing screen stopped by user");
        }
        stopped
    }

    /// Waits until the screen is no longer running.
    pub async fn wait(&self) -> ProcessingPhase {
        let mut rx = self.phase.subscribe();
        match rx.wait_for(|phase| *phase != ProcessingPhase::Running).await {
            Ok(phase) => *phase,
            Err(_) => self.phase(),
        }
    }
}

impl Drop for ProcessingScreen {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

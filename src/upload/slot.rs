use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use crate::api::{CandidateFile, DocumentCategory, UploadReceipt};

/// The five phases of an upload slot.
///
/// A slot flows: IDLE → (DRAGGING →) UPLOADING → SUCCESS | ERROR,
/// and returns to IDLE through delete or retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SlotPhase {
    Idle,
    Dragging,
    Uploading,
    Error,
    Success,
}

impl fmt::Display for SlotPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotPhase::Idle => write!(f, "IDLE"),
            SlotPhase::Dragging => write!(f, "DRAGGING"),
            SlotPhase::Uploading => write!(f, "UPLOADING"),
            SlotPhase::Error => write!(f, "ERROR"),
            SlotPhase::Success => write!(f, "SUCCESS"),
        }
    }
}

/// Local description of a file once a transfer has been attempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: String,
    pub display_name: String,
    pub size_label: String,
}

impl FileRecord {
    pub fn for_candidate(file: &CandidateFile) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            display_name: file.name.clone(),
            size_label: file.size_label(),
        }
    }

    /// Record for a file uploaded earlier, known only by its receipt.
    pub fn for_receipt(remote: &UploadReceipt) -> Self {
        let display_name = remote
            .url
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or(&remote.public_id);
        Self {
            id: Uuid::new_v4().to_string(),
            display_name: display_name.to_string(),
            size_label: String::new(),
        }
    }
}

/// Slot state. The remote receipt only exists inside `Success`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SlotState {
    Idle,
    Dragging,
    Uploading {
        file: FileRecord,
        progress: u8,
    },
    Error {
        file: Option<FileRecord>,
        message: String,
    },
    Success {
        file: FileRecord,
        remote: UploadReceipt,
    },
}

impl SlotState {
    pub fn phase(&self) -> SlotPhase {
        match self {
            SlotState::Idle => SlotPhase::Idle,
            SlotState::Dragging => SlotPhase::Dragging,
            SlotState::Uploading { .. } => SlotPhase::Uploading,
            SlotState::Error { .. } => SlotPhase::Error,
            SlotState::Success { .. } => SlotPhase::Success,
        }
    }
}

/// Identifies one transfer attempt. Events carrying a stale ticket are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferTicket {
    epoch: u64,
}

/// State container for one uploadable document.
#[derive(Debug, Clone, Serialize)]
pub struct UploadSlot {
    category: DocumentCategory,
    state: SlotState,
    #[serde(skip)]
    epoch: u64,
    history: Vec<SlotPhase>,
}

impl UploadSlot {
    pub fn new(category: DocumentCategory) -> Self {
        Self {
            category,
            state: SlotState::Idle,
            epoch: 0,
            history: Vec::new(),
        }
    }

    pub fn category(&self) -> DocumentCategory {
        self.category
    }

    pub fn state(&self) -> &SlotState {
        &self.state
    }

    pub fn phase(&self) -> SlotPhase {
        self.state.phase()
    }

    /// Phases left behind, oldest first.
    pub fn history(&self) -> &[SlotPhase] {
        &self.history
    }

    pub fn file(&self) -> Option<&FileRecord> {
        match &self.state {
            SlotState::Uploading { file, .. } | SlotState::Success { file, .. } => Some(file),
            SlotState::Error { file, .. } => file.as_ref(),
            SlotState::Idle | SlotState::Dragging => None,
        }
    }

    pub fn remote(&self) -> Option<&UploadReceipt> {
        match &self.state {
            SlotState::Success { remote, .. } => Some(remote),
            _ => None,
        }
    }

    /// Transfer percentage; zero outside `Uploading`.
    pub fn progress(&self) -> u8 {
        match &self.state {
            SlotState::Uploading { progress, .. } => *progress,
            _ => 0,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            SlotState::Error { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Whether a new file may be accepted right now.
    pub fn accepts_files(&self) -> bool {
        matches!(self.state, SlotState::Idle | SlotState::Dragging)
    }

    pub fn drag_enter(&mut self) -> bool {
        if self.state != SlotState::Idle {
            return false;
        }
        self.set(SlotState::Dragging);
        true
    }

    pub fn drag_leave(&mut self) -> bool {
        if self.state != SlotState::Dragging {
            return false;
        }
        self.set(SlotState::Idle);
        true
    }

    /// Validation failed before any transfer started.
    pub fn reject(&mut self, file: Option<FileRecord>, message: impl Into<String>) -> bool {
        if !self.accepts_files() {
            return false;
        }
        self.set(SlotState::Error {
            file,
            message: message.into(),
        });
        true
    }

    /// Starts a transfer. Returns `None` if the slot is not accepting files.
    pub fn begin(&mut self, file: FileRecord) -> Option<TransferTicket> {
        if !self.accepts_files() {
            return None;
        }
        self.epoch += 1;
        self.set(SlotState::Uploading { file, progress: 0 });
        Some(TransferTicket { epoch: self.epoch })
    }

    /// Applies a progress report. Percentages never move backwards.
    pub fn report_progress(&mut self, ticket: TransferTicket, pct: u8) -> bool {
        if ticket.epoch != self.epoch {
            return false;
        }
        match &mut self.state {
            SlotState::Uploading { progress, .. } if pct.min(100) > *progress => {
                *progress = pct.min(100);
                true
            }
            _ => false,
        }
    }

    pub fn succeed(&mut self, ticket: TransferTicket, remote: UploadReceipt) -> bool {
        let Some(file) = self.uploading_file(ticket) else {
            return false;
        };
        self.set(SlotState::Success { file, remote });
        true
    }

    pub fn fail(&mut self, ticket: TransferTicket, message: impl Into<String>) -> bool {
        let Some(file) = self.uploading_file(ticket) else {
            return false;
        };
        self.set(SlotState::Error {
            file: Some(file),
            message: message.into(),
        });
        true
    }

    /// Clears an error so a new file can be offered.
    pub fn retry(&mut self) -> bool {
        if self.phase() != SlotPhase::Error {
            return false;
        }
        self.set(SlotState::Idle);
        true
    }

    /// Puts an idle slot straight into `Success` for a file uploaded earlier.
    pub fn restore(&mut self, remote: UploadReceipt) -> bool {
        if self.state != SlotState::Idle {
            return false;
        }
        self.epoch += 1;
        self.set(SlotState::Success {
            file: FileRecord::for_receipt(&remote),
            remote,
        });
        true
    }

    /// Returns a successful slot to `Idle`, handing back the receipt to delete remotely.
    pub fn clear(&mut self) -> Option<UploadReceipt> {
        let SlotState::Success { remote, .. } = &self.state else {
            return None;
        };
        let remote = remote.clone();
        self.epoch += 1;
        self.set(SlotState::Idle);
        Some(remote)
    }

    /// Forces the slot back to `Idle` and invalidates any outstanding ticket.
    pub fn reset(&mut self) {
        self.epoch += 1;
        if self.state != SlotState::Idle {
            self.set(SlotState::Idle);
        }
    }

    fn uploading_file(&self, ticket: TransferTicket) -> Option<FileRecord> {
        match &self.state {
            SlotState::Uploading { file, .. } if ticket.epoch == self.epoch => Some(file.clone()),
            _ => None,
        }
    }

    fn set(&mut self, next: SlotState) {
        self.history.push(self.state.phase());
        self.state = next;
    }
}

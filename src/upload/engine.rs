use std::sync::{Arc, Weak};

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::extraction::{ExtractionHandle, ExtractionSource};
use super::slot::{FileRecord, SlotPhase, UploadSlot};
use crate::api::{
    CandidateFile, Credential, DocumentCategory, MIB, ProgressFn, UploadReceipt, UploadService,
};
use crate::error::IntakeError;

/// Drives one [`UploadSlot`] through validation, transfer and deletion.
///
/// The slot lives in a watch channel so progress is observable while a
/// transfer is in flight. Transfer callbacks hold only a weak reference,
/// so results arriving after the engine is dropped are discarded.
pub struct UploadEngine<U> {
    slot: Arc<watch::Sender<UploadSlot>>,
    service: Arc<U>,
    credential: Credential,
    max_bytes: u64,
    extraction_source: Option<Arc<dyn ExtractionSource>>,
    extraction: Option<ExtractionHandle>,
}

impl<U: UploadService> UploadEngine<U> {
    pub fn new(
        category: DocumentCategory,
        service: Arc<U>,
        credential: Credential,
        max_bytes: u64,
    ) -> Self {
        let (tx, _) = watch::channel(UploadSlot::new(category));
        Self {
            slot: Arc::new(tx),
            service,
            credential,
            max_bytes,
            extraction_source: None,
            extraction: None,
        }
    }

    /// Runs `source` after every successful transfer.
    pub fn with_extraction(mut self, source: Arc<dyn ExtractionSource>) -> Self {
        self.extraction_source = Some(source);
        self
    }

    pub fn category(&self) -> DocumentCategory {
        self.slot.borrow().category()
    }

    /// A copy of the current slot state.
    pub fn snapshot(&self) -> UploadSlot {
        self.slot.borrow().clone()
    }

    pub fn phase(&self) -> SlotPhase {
        self.slot.borrow().phase()
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadSlot> {
        self.slot.subscribe()
    }

    pub fn extraction(&self) -> Option<&ExtractionHandle> {
        self.extraction.as_ref()
    }

    pub fn extraction_mut(&mut self) -> Option<&mut ExtractionHandle> {
        self.extraction.as_mut()
    }

    pub fn drag_enter(&self) -> bool {
        self.slot.send_if_modified(|s| s.drag_enter())
    }

    pub fn drag_leave(&self) -> bool {
        self.slot.send_if_modified(|s| s.drag_leave())
    }

    /// Clears an error so another file can be submitted.
    pub fn retry(&self) -> bool {
        self.slot.send_if_modified(|s| s.retry())
    }

    /// Shows a file uploaded on an earlier visit. Only an idle slot accepts it.
    pub fn restore(&self, remote: UploadReceipt) -> bool {
        self.slot.send_if_modified(|s| s.restore(remote))
    }

    /// Validates and transfers `file`, returning the resulting phase.
    ///
    /// Every failure ends up in the slot's `errorMessage`; nothing is
    /// returned as an error. A slot that is not idle ignores the file.
    pub async fn submit(&mut self, file: CandidateFile) -> SlotPhase {
        let category = self.category();
        if !self.slot.borrow().accepts_files() {
            warn!(%category, phase = %self.phase(), "slot busy, file ignored");
            return self.phase();
        }

        let record = FileRecord::for_candidate(&file);

        if file.size() > self.max_bytes {
            let err = IntakeError::Validation(size_limit_message(self.max_bytes));
            warn!(%category, file = %file.name, bytes = file.size(), "file exceeds size limit");
            self.slot.send_modify(|s| {
                s.reject(Some(record), err.user_message());
            });
            return self.phase();
        }

        let token = match self.credential.bearer() {
            Ok(token) => token.to_string(),
            Err(err) => {
                warn!(%category, "upload attempted without credential");
                self.slot.send_modify(|s| {
                    s.reject(Some(record), err.user_message());
                });
                return self.phase();
            }
        };

        let mut ticket = None;
        self.slot.send_modify(|s| ticket = s.begin(record));
        let Some(ticket) = ticket else {
            return self.phase();
        };
        info!(%category, file = %file.name, size = %file.size_label(), "upload started");

        let weak: Weak<watch::Sender<UploadSlot>> = Arc::downgrade(&self.slot);
        let progress: ProgressFn = Arc::new(move |pct| {
            if let Some(slot) = weak.upgrade() {
                slot.send_if_modified(|s| s.report_progress(ticket, pct));
            }
        });

        match self.service.upload(category, &file, &token, progress).await {
            Ok(receipt) => {
                let applied = self
                    .slot
                    .send_if_modified(|s| s.succeed(ticket, receipt.clone()));
                if applied {
                    info!(%category, public_id = %receipt.public_id, "upload acknowledged");
                    self.start_extraction(&receipt);
                }
            }
            Err(api_err) => {
                let err = IntakeError::from_api(api_err, &format!("upload {}", category.label()));
                warn!(%category, kind = %err.kind(), error = %err, "upload failed");
                self.slot
                    .send_if_modified(|s| s.fail(ticket, err.user_message()));
            }
        }

        self.phase()
    }

    /// Deletes an uploaded file. The slot returns to `Idle` whatever the
    /// remote outcome; the return value reports whether the server confirmed.
    pub async fn delete(&mut self) -> bool {
        let category = self.category();
        let mut cleared = None;
        self.slot.send_if_modified(|s| {
            cleared = s.clear();
            cleared.is_some()
        });
        let Some(remote) = cleared else {
            debug!(%category, "nothing to delete");
            return false;
        };

        if let Some(mut job) = self.extraction.take() {
            job.cancel();
        }

        let token = match self.credential.bearer() {
            Ok(token) => token,
            Err(err) => {
                warn!(%category, public_id = %remote.public_id, error = %err, "remote delete skipped");
                return false;
            }
        };

        match self.service.delete(category, &remote.public_id, token).await {
            Ok(()) => {
                info!(%category, public_id = %remote.public_id, "document deleted");
                true
            }
            Err(err) => {
                warn!(%category, public_id = %remote.public_id, error = %err, "remote delete failed");
                false
            }
        }
    }

    fn start_extraction(&mut self, receipt: &UploadReceipt) {
        let Some(source) = &self.extraction_source else {
            return;
        };
        if let Some(current) = &self.extraction
            && current.job_id() == receipt.public_id
            && !current.is_cancelled()
        {
            debug!(job_id = %receipt.public_id, "extraction already running");
            return;
        }
        if let Some(mut previous) = self.extraction.take() {
            previous.cancel();
        }
        self.extraction = Some(source.start(receipt));
    }
}

fn size_limit_message(max_bytes: u64) -> String {
    format!("File size exceeds {}MB limit", max_bytes.div_ceil(MIB))
}

/// Remote references of the documents uploaded during the final stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentsSummary {
    pub resume: Option<UploadReceipt>,
    pub transcript: Option<UploadReceipt>,
    #[serde(default)]
    pub others: Vec<UploadReceipt>,
}

impl DocumentsSummary {
    pub fn is_empty(&self) -> bool {
        self.resume.is_none() && self.transcript.is_none() && self.others.is_empty()
    }
}

/// The slots mounted by the documents stage: one resume, one transcript,
/// and any number of other documents.
pub struct DocumentSet<U> {
    pub resume: UploadEngine<U>,
    pub transcript: UploadEngine<U>,
    others: Vec<UploadEngine<U>>,
    service: Arc<U>,
    credential: Credential,
    max_bytes: u64,
}

impl<U: UploadService> DocumentSet<U> {
    pub fn new(
        service: Arc<U>,
        credential: Credential,
        max_bytes: u64,
        extraction: Arc<dyn ExtractionSource>,
    ) -> Self {
        let engine = |category| {
            UploadEngine::new(category, service.clone(), credential.clone(), max_bytes)
        };
        Self {
            resume: engine(DocumentCategory::Resume).with_extraction(extraction),
            transcript: engine(DocumentCategory::Transcript),
            others: Vec::new(),
            service: service.clone(),
            credential: credential.clone(),
            max_bytes,
        }
    }

    /// Brings back the documents recorded when the stage was last left.
    pub fn restore(&mut self, summary: &DocumentsSummary) {
        if let Some(remote) = &summary.resume {
            self.resume.restore(remote.clone());
        }
        if let Some(remote) = &summary.transcript {
            self.transcript.restore(remote.clone());
        }
        let start = self.push_other_slots(summary.others.len());
        for (engine, remote) in self.others[start..].iter().zip(&summary.others) {
            engine.restore(remote.clone());
        }
    }

    pub fn others(&self) -> &[UploadEngine<U>] {
        &self.others
    }

    pub fn others_mut(&mut self) -> &mut [UploadEngine<U>] {
        &mut self.others
    }

    /// Adds "other" documents, uploading them concurrently. Returns the
    /// index and resulting phase of each new slot.
    pub async fn add_others(&mut self, files: Vec<CandidateFile>) -> Vec<(usize, SlotPhase)> {
        let start = self.push_other_slots(files.len());
        let phases = submit_each(&mut self.others[start..], files).await;
        phases
            .into_iter()
            .enumerate()
            .map(|(i, phase)| (start + i, phase))
            .collect()
    }

    /// Removes one "other" slot, deleting its file remotely if it was uploaded.
    pub async fn remove_other(&mut self, index: usize) -> bool {
        if index >= self.others.len() {
            return false;
        }
        let mut engine = self.others.remove(index);
        if engine.phase() == SlotPhase::Success {
            engine.delete().await;
        }
        true
    }

    /// Uploads everything offered at once; transfers run concurrently.
    pub async fn upload_batch(
        &mut self,
        resume: Option<CandidateFile>,
        transcript: Option<CandidateFile>,
        others: Vec<CandidateFile>,
    ) {
        let start = self.push_other_slots(others.len());
        let Self {
            resume: resume_engine,
            transcript: transcript_engine,
            others: other_engines,
            ..
        } = self;

        let resume_fut = async {
            if let Some(file) = resume {
                resume_engine.submit(file).await;
            }
        };
        let transcript_fut = async {
            if let Some(file) = transcript {
                transcript_engine.submit(file).await;
            }
        };
        let others_fut = submit_each(&mut other_engines[start..], others);
        tokio::join!(resume_fut, transcript_fut, others_fut);
    }

    fn push_other_slots(&mut self, count: usize) -> usize {
        let start = self.others.len();
        for _ in 0..count {
            self.others.push(UploadEngine::new(
                DocumentCategory::Other,
                self.service.clone(),
                self.credential.clone(),
                self.max_bytes,
            ));
        }
        start
    }

    pub fn summary(&self) -> DocumentsSummary {
        DocumentsSummary {
            resume: self.resume.snapshot().remote().cloned(),
            transcript: self.transcript.snapshot().remote().cloned(),
            others: self
                .others
                .iter()
                .filter_map(|engine| engine.snapshot().remote().cloned())
                .collect(),
        }
    }
}

async fn submit_each<U: UploadService>(
    engines: &mut [UploadEngine<U>],
    files: Vec<CandidateFile>,
) -> Vec<SlotPhase> {
    join_all(
        engines
            .iter_mut()
            .zip(files)
            .map(|(engine, file)| engine.submit(file)),
    )
    .await
}

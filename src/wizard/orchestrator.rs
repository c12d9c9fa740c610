use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::controller::StageController;
use super::processing::ProcessingScreen;
use super::session::WizardSession;
use super::stage::{StageId, StagePayload};
use crate::api::{Credential, ProfileService, UploadService};
use crate::config::IntakeConfig;
use crate::error::IntakeError;
use crate::upload::{DocumentSet, ExtractionSource, SimulatedExtraction};

/// What the wizard currently presents. Exactly one stage is mounted at a time.
pub enum Mounted<U> {
    /// A form stage and its not-yet-saved field values.
    Form {
        stage: StageId,
        draft: StagePayload,
        banner: Option<String>,
    },
    /// The final stage's upload slots.
    Documents { set: DocumentSet<U> },
    Complete,
    Closed,
}

impl<U> Mounted<U> {
    pub fn stage(&self) -> Option<StageId> {
        match self {
            Mounted::Form { stage, .. } => Some(*stage),
            Mounted::Documents { .. } => Some(StageId::Documents),
            Mounted::Complete | Mounted::Closed => None,
        }
    }
}

/// The result of a navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardTransition {
    Advanced { from: StageId, to: StageId },
    /// The stage did not advance; `error` is the inline banner text.
    Stayed { stage: StageId, error: String },
    Retreated { from: StageId, to: StageId },
    Completed,
    Closed,
    /// The request does not apply in the current state.
    Unchanged,
}

/// Owns the stage pointer and the mounted stage.
///
/// The pointer moves forward only after a stage controller reported success
/// or the user skipped a skippable stage.
pub struct Wizard<P, U> {
    session: WizardSession,
    profile: Arc<P>,
    uploads: Arc<U>,
    credential: Credential,
    max_upload_bytes: u64,
    extraction: Arc<dyn ExtractionSource>,
    processing_delay: Duration,
    mounted: Mounted<U>,
}

impl<P: ProfileService, U: UploadService> Wizard<P, U> {
    pub fn open(
        profile: Arc<P>,
        uploads: Arc<U>,
        credential: Credential,
        config: &IntakeConfig,
    ) -> Self {
        let session = WizardSession::new();
        info!(session = %session.id, authenticated = credential.is_present(), "wizard opened");
        Self {
            session,
            profile,
            uploads,
            credential,
            max_upload_bytes: config.max_upload_bytes,
            extraction: Arc::new(SimulatedExtraction::new(
                config.extraction_duration(),
                config.extraction_poll_interval(),
            )),
            processing_delay: config.processing_delay(),
            mounted: Mounted::Form {
                stage: StageId::Basic,
                draft: StagePayload::empty(StageId::Basic),
                banner: None,
            },
        }
    }

    /// Replaces the extraction source used by the documents stage.
    pub fn with_extraction(mut self, source: Arc<dyn ExtractionSource>) -> Self {
        self.extraction = source;
        self
    }

    pub fn session(&self) -> &WizardSession {
        &self.session
    }

    pub fn mounted(&self) -> &Mounted<U> {
        &self.mounted
    }

    pub fn current_stage(&self) -> Option<StageId> {
        self.mounted.stage()
    }

    pub fn current_stage_index(&self) -> usize {
        self.session.current_stage_index()
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.mounted, Mounted::Complete)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.mounted, Mounted::Closed)
    }

    pub fn draft(&self) -> Option<&StagePayload> {
        match &self.mounted {
            Mounted::Form { draft, .. } => Some(draft),
            _ => None,
        }
    }

    pub fn draft_mut(&mut self) -> Option<&mut StagePayload> {
        match &mut self.mounted {
            Mounted::Form { draft, .. } => Some(draft),
            _ => None,
        }
    }

    /// Replaces the mounted form's values. The payload must belong to the mounted stage.
    pub fn set_draft(&mut self, payload: StagePayload) -> Result<(), IntakeError> {
        match &mut self.mounted {
            Mounted::Form { stage, draft, .. } if *stage == payload.stage() => {
                *draft = payload;
                Ok(())
            }
            _ => Err(IntakeError::Validation(format!(
                "{} stage is not open",
                payload.stage().noun()
            ))),
        }
    }

    pub fn banner(&self) -> Option<&str> {
        match &self.mounted {
            Mounted::Form { banner, .. } => banner.as_deref(),
            _ => None,
        }
    }

    pub fn advisories(&self) -> Vec<String> {
        self.draft().map(StagePayload::advisories).unwrap_or_default()
    }

    pub fn documents(&self) -> Option<&DocumentSet<U>> {
        match &self.mounted {
            Mounted::Documents { set, .. } => Some(set),
            _ => None,
        }
    }

    pub fn documents_mut(&mut self) -> Option<&mut DocumentSet<U>> {
        match &mut self.mounted {
            Mounted::Documents { set, .. } => Some(set),
            _ => None,
        }
    }

    /// Whether Next is enabled: required fields filled and a credential present.
    #[cfg(test)]
    pub(crate) fn can_advance(&self) -> bool {
        match &self.mounted {
            Mounted::Form { draft, .. } => {
                draft.validate().is_ok() && self.credential.is_present()
            }
            Mounted::Documents { .. } => true,
            Mounted::Complete | Mounted::Closed => false,
        }
    }

    /// Submits the mounted stage and advances on success.
    pub async fn next(&mut self) -> WizardTransition {
        let (stage, draft) = match &self.mounted {
            Mounted::Form { stage, draft, .. } => (*stage, draft.clone()),
            Mounted::Documents { .. } => {
                self.record_documents();
                return self.complete().await;
            }
            Mounted::Complete | Mounted::Closed => return WizardTransition::Unchanged,
        };

        let controller =
            StageController::new(stage, self.profile.clone(), self.credential.clone());
        match controller.submit(draft).await {
            Ok(saved) => {
                self.session.record(saved);
                self.advance_from(stage).await
            }
            Err(err) => {
                let message = err.user_message();
                if let Mounted::Form { banner, .. } = &mut self.mounted {
                    *banner = Some(message.clone());
                }
                WizardTransition::Stayed {
                    stage,
                    error: message,
                }
            }
        }
    }

    /// Skips the mounted stage if it is skippable. A skipped background stage
    /// still sends whatever was entered, without the validation gate.
    pub async fn skip(&mut self) -> WizardTransition {
        let Some(stage) = self.current_stage() else {
            return WizardTransition::Unchanged;
        };
        if !stage.is_skippable() {
            debug!(stage = %stage.noun(), "skip ignored on required stage");
            return WizardTransition::Unchanged;
        }

        match &self.mounted {
            Mounted::Form { draft, .. } => {
                StageController::new(stage, self.profile.clone(), self.credential.clone())
                    .persist_best_effort(draft)
                    .await;
            }
            Mounted::Documents { .. } => self.record_documents(),
            Mounted::Complete | Mounted::Closed => return WizardTransition::Unchanged,
        }

        info!(stage = %stage.noun(), "stage skipped");
        self.session.mark_skipped(stage);
        self.advance_from(stage).await
    }

    /// Moves back one stage. Never blocked and never calls the server; the
    /// stage re-entered shows its last-submitted values.
    pub fn retreat(&mut self) -> WizardTransition {
        let Some(from) = self.current_stage() else {
            return WizardTransition::Unchanged;
        };
        let Some(to) = from.previous() else {
            return WizardTransition::Unchanged;
        };

        self.record_documents();
        self.session.move_to(to.index());
        self.mount(to);
        debug!(from = %from.noun(), to = %to.noun(), "stage retreated");
        WizardTransition::Retreated { from, to }
    }

    /// Abandons the session from any stage. Nothing further is persisted.
    pub fn close(&mut self) -> WizardTransition {
        if self.is_closed() {
            return WizardTransition::Unchanged;
        }
        info!(session = %self.session.id, stage = ?self.current_stage(), "wizard closed");
        self.mounted = Mounted::Closed;
        WizardTransition::Closed
    }

    /// The post-completion processing screen.
    pub fn start_processing(&self) -> Option<ProcessingScreen> {
        self.is_complete()
            .then(|| ProcessingScreen::start(self.processing_delay))
    }

    async fn advance_from(&mut self, from: StageId) -> WizardTransition {
        let Some(to) = from.next() else {
            return self.complete().await;
        };
        self.session.move_to(to.index());
        self.mount(to);
        info!(from = %from.noun(), to = %to.noun(), "stage advanced");
        WizardTransition::Advanced { from, to }
    }

    /// Replaces the recorded documents with what the mounted slots hold now.
    fn record_documents(&mut self) {
        let Mounted::Documents { set } = &self.mounted else {
            return;
        };
        let summary = set.summary();
        if summary.is_empty() {
            self.session.forget(StageId::Documents);
        } else {
            self.session.record(StagePayload::Documents(summary));
        }
    }

    fn mount(&mut self, stage: StageId) {
        self.mounted = match stage {
            StageId::Documents => {
                let mut set = DocumentSet::new(
                    self.uploads.clone(),
                    self.credential.clone(),
                    self.max_upload_bytes,
                    self.extraction.clone(),
                );
                if let Some(StagePayload::Documents(summary)) =
                    self.session.collected(StageId::Documents)
                {
                    set.restore(summary);
                }
                Mounted::Documents { set }
            }
            _ => Mounted::Form {
                stage,
                draft: self
                    .session
                    .collected(stage)
                    .cloned()
                    .unwrap_or_else(|| StagePayload::empty(stage)),
                banner: None,
            },
        };
    }

    async fn complete(&mut self) -> WizardTransition {
        self.session.complete();
        self.mounted = Mounted::Complete;
        info!(
            session = %self.session.id,
            completeness = self.session.completeness(),
            "wizard complete"
        );

        match self.credential.bearer() {
            Ok(token) => {
                if let Err(err) = self.profile.complete_onboarding(token).await {
                    warn!(error = %err, "could not mark onboarding complete");
                }
            }
            Err(err) => warn!(error = %err, "onboarding completion not sent"),
        }
        WizardTransition::Completed
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::StreamExt;

    use super::*;
    use crate::api::{
        ApiError, CandidateFile, DocumentCategory, ProfileSection, ProgressFn, UploadReceipt,
    };
    use crate::error::AUTH_REQUIRED_MESSAGE;
    use crate::upload::SlotPhase;
    use crate::wizard::controller::mock::MockProfile;
    use crate::wizard::processing::ProcessingPhase;
    use crate::wizard::stage::{ActivitiesInfo, BackgroundInfo, BasicInfo, fixtures};

    #[derive(Default)]
    struct MockUploads {
        uploads: AtomicUsize,
        deletes: Mutex<Vec<String>>,
    }

    impl UploadService for MockUploads {
        async fn upload(
            &self,
            category: DocumentCategory,
            file: &CandidateFile,
            _token: &str,
            progress: ProgressFn,
        ) -> Result<UploadReceipt, ApiError> {
            self.uploads.fetch_add(1, Ordering::SeqCst);
            progress(100);
            Ok(UploadReceipt {
                url: format!("https://cdn.example/{}", file.name),
                public_id: format!("{}/{}", category.doc_type(), file.name),
            })
        }

        async fn delete(
            &self,
            _category: DocumentCategory,
            public_id: &str,
            _token: &str,
        ) -> Result<(), ApiError> {
            self.deletes.lock().unwrap().push(public_id.to_string());
            Ok(())
        }
    }

    fn config() -> IntakeConfig {
        IntakeConfig {
            extraction_duration_ms: 300,
            extraction_poll_ms: 100,
            processing_delay_secs: 5,
            ..Default::default()
        }
    }

    fn wizard(
        profile: Arc<MockProfile>,
        token: Option<&str>,
    ) -> (Wizard<MockProfile, MockUploads>, Arc<MockUploads>) {
        let uploads = Arc::new(MockUploads::default());
        let credential = token.map(Credential::new).unwrap_or_default();
        let wizard = Wizard::open(profile, uploads.clone(), credential, &config());
        (wizard, uploads)
    }

    async fn fill_and_advance(
        wizard: &mut Wizard<MockProfile, MockUploads>,
        payload: StagePayload,
    ) {
        wizard.set_draft(payload).unwrap();
        assert!(matches!(wizard.next().await, WizardTransition::Advanced { .. }));
    }

    async fn walk_to_documents(wizard: &mut Wizard<MockProfile, MockUploads>) {
        fill_and_advance(wizard, StagePayload::Basic(fixtures::basic())).await;
        fill_and_advance(wizard, StagePayload::Academic(fixtures::academic())).await;
        fill_and_advance(wizard, StagePayload::Activities(fixtures::activities())).await;
        assert_eq!(
            wizard.skip().await,
            WizardTransition::Advanced {
                from: StageId::Background,
                to: StageId::Documents
            }
        );
    }

    fn resume() -> CandidateFile {
        CandidateFile::new("resume.pdf", vec![1u8; 2048])
    }

    #[tokio::test]
    async fn opens_on_first_stage() {
        let (wizard, _) = wizard(Arc::new(MockProfile::default()), Some("jwt"));
        assert_eq!(wizard.current_stage(), Some(StageId::Basic));
        assert_eq!(wizard.current_stage_index(), 0);
        assert!(!wizard.can_advance());
        assert_eq!(wizard.draft(), Some(&StagePayload::empty(StageId::Basic)));
    }

    #[tokio::test]
    async fn missing_credential_keeps_stage_one() {
        let profile = Arc::new(MockProfile::default());
        let (mut wizard, _) = wizard(profile.clone(), None);
        wizard
            .set_draft(StagePayload::Basic(fixtures::basic()))
            .unwrap();
        assert!(!wizard.can_advance());

        let t = wizard.next().await;

        assert_eq!(
            t,
            WizardTransition::Stayed {
                stage: StageId::Basic,
                error: AUTH_REQUIRED_MESSAGE.to_string()
            }
        );
        assert_eq!(wizard.current_stage_index(), 0);
        assert_eq!(wizard.banner(), Some(AUTH_REQUIRED_MESSAGE));
        assert_eq!(profile.update_count(), 0);
        // Typed values survive the failure.
        assert_eq!(wizard.draft(), Some(&StagePayload::Basic(fixtures::basic())));
    }

    #[tokio::test]
    async fn validation_failure_does_not_advance() {
        let profile = Arc::new(MockProfile::default());
        let (mut wizard, _) = wizard(profile.clone(), Some("jwt"));
        let mut partial = fixtures::basic();
        partial.state.clear();
        wizard.set_draft(StagePayload::Basic(partial)).unwrap();

        assert!(matches!(
            wizard.next().await,
            WizardTransition::Stayed { stage: StageId::Basic, .. }
        ));
        assert_eq!(wizard.current_stage_index(), 0);
        assert!(wizard.banner().unwrap().contains("state/province"));
        assert_eq!(profile.update_count(), 0);
    }

    #[tokio::test]
    async fn server_failure_stays_then_succeeds_after_recovery() {
        let profile = Arc::new(MockProfile::failing(|| ApiError::Rejected {
            status: 500,
            message: String::new(),
        }));
        let (mut wizard, _) = wizard(profile.clone(), Some("jwt"));
        wizard
            .set_draft(StagePayload::Basic(fixtures::basic()))
            .unwrap();

        let t = wizard.next().await;
        assert_eq!(
            t,
            WizardTransition::Stayed {
                stage: StageId::Basic,
                error: "Failed to save basic information. Please try again.".into()
            }
        );
        assert_eq!(wizard.current_stage_index(), 0);
        assert!(wizard.session().collected(StageId::Basic).is_none());

        profile.heal();
        assert_eq!(
            wizard.next().await,
            WizardTransition::Advanced {
                from: StageId::Basic,
                to: StageId::Academic
            }
        );
        assert_eq!(wizard.banner(), None);
    }

    #[tokio::test]
    async fn required_stages_cannot_be_skipped() {
        let profile = Arc::new(MockProfile::default());
        let (mut wizard, _) = wizard(profile.clone(), Some("jwt"));
        assert_eq!(wizard.skip().await, WizardTransition::Unchanged);
        assert_eq!(wizard.current_stage_index(), 0);
        assert_eq!(profile.update_count(), 0);
    }

    #[tokio::test]
    async fn background_skip_advances_without_required_fields() {
        let profile = Arc::new(MockProfile::default());
        let (mut wizard, _) = wizard(profile.clone(), Some("jwt"));
        fill_and_advance(&mut wizard, StagePayload::Basic(fixtures::basic())).await;
        fill_and_advance(&mut wizard, StagePayload::Academic(fixtures::academic())).await;
        fill_and_advance(&mut wizard, StagePayload::Activities(ActivitiesInfo::default())).await;
        assert_eq!(wizard.current_stage(), Some(StageId::Background));

        let t = wizard.skip().await;

        assert_eq!(
            t,
            WizardTransition::Advanced {
                from: StageId::Background,
                to: StageId::Documents
            }
        );
        assert_eq!(wizard.current_stage_index(), 4);
        assert!(wizard.documents().is_some());
        assert!(wizard.session().was_skipped(StageId::Background));
        let updates = profile.updates.lock().unwrap();
        assert_eq!(updates.last().unwrap().0, ProfileSection::Background);
    }

    #[tokio::test]
    async fn skip_persistence_failure_still_advances() {
        let profile = Arc::new(MockProfile::default());
        let (mut wizard, _) = wizard(profile.clone(), Some("jwt"));
        fill_and_advance(&mut wizard, StagePayload::Basic(fixtures::basic())).await;
        fill_and_advance(&mut wizard, StagePayload::Academic(fixtures::academic())).await;
        fill_and_advance(&mut wizard, StagePayload::Activities(fixtures::activities())).await;

        let expired: fn() -> ApiError = || ApiError::Unauthorized;
        *profile.failure.lock().unwrap() = Some(expired);
        assert!(matches!(wizard.skip().await, WizardTransition::Advanced { .. }));
        assert_eq!(wizard.current_stage(), Some(StageId::Documents));
    }

    #[tokio::test]
    async fn retreat_restores_last_submitted_data() {
        let profile = Arc::new(MockProfile::default());
        let (mut wizard, _) = wizard(profile.clone(), Some("jwt"));
        fill_and_advance(&mut wizard, StagePayload::Basic(fixtures::basic())).await;

        // Unsaved edits on stage 2 are ephemeral.
        wizard
            .set_draft(StagePayload::Academic(fixtures::academic()))
            .unwrap();
        let calls = profile.update_count();

        assert_eq!(
            wizard.retreat(),
            WizardTransition::Retreated {
                from: StageId::Academic,
                to: StageId::Basic
            }
        );
        assert_eq!(profile.update_count(), calls);
        assert_eq!(wizard.current_stage_index(), 0);
        assert_eq!(wizard.draft(), Some(&StagePayload::Basic(fixtures::basic())));

        fill_and_advance(&mut wizard, StagePayload::Basic(fixtures::basic())).await;
        assert_eq!(wizard.draft(), Some(&StagePayload::empty(StageId::Academic)));
    }

    #[tokio::test]
    async fn retreat_on_first_stage_is_a_no_op() {
        let (mut wizard, _) = wizard(Arc::new(MockProfile::default()), Some("jwt"));
        assert_eq!(wizard.retreat(), WizardTransition::Unchanged);
        assert_eq!(wizard.current_stage(), Some(StageId::Basic));
    }

    #[tokio::test]
    async fn draft_for_other_stage_is_refused() {
        let (mut wizard, _) = wizard(Arc::new(MockProfile::default()), Some("jwt"));
        assert!(
            wizard
                .set_draft(StagePayload::Background(BackgroundInfo::default()))
                .is_err()
        );
        if let Some(StagePayload::Basic(info)) = wizard.draft_mut() {
            info.first_name = "Ada".into();
        }
        assert!(matches!(
            wizard.draft(),
            Some(StagePayload::Basic(BasicInfo { first_name, .. })) if first_name == "Ada"
        ));
    }

    #[tokio::test]
    async fn advisories_follow_the_draft() {
        let profile = Arc::new(MockProfile::default());
        let (mut wizard, _) = wizard(profile, Some("jwt"));
        assert!(wizard.advisories().is_empty());
        fill_and_advance(&mut wizard, StagePayload::Basic(fixtures::basic())).await;
        fill_and_advance(&mut wizard, StagePayload::Academic(fixtures::academic())).await;
        assert_eq!(wizard.advisories().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn full_walkthrough_completes_and_marks_onboarding() {
        let profile = Arc::new(MockProfile::default());
        let (mut wizard, uploads) = wizard(profile.clone(), Some("jwt"));
        walk_to_documents(&mut wizard).await;

        let docs = wizard.documents_mut().unwrap();
        docs.upload_batch(
            Some(resume()),
            Some(CandidateFile::new("transcript.pdf", vec![2u8; 1024])),
            Vec::new(),
        )
        .await;
        assert_eq!(docs.resume.phase(), SlotPhase::Success);
        assert!(docs.resume.extraction().is_some());

        assert_eq!(wizard.next().await, WizardTransition::Completed);
        assert!(wizard.is_complete());
        assert_eq!(wizard.current_stage(), None);
        assert_eq!(*profile.completions.lock().unwrap(), 1);
        assert_eq!(uploads.uploads.load(Ordering::SeqCst), 2);
        assert_eq!(wizard.session().completeness(), 85);
        assert!(wizard.session().is_complete());

        // Pointer cannot move past completion.
        assert_eq!(wizard.next().await, WizardTransition::Unchanged);
        assert_eq!(wizard.retreat(), WizardTransition::Unchanged);

        let screen = wizard.start_processing().unwrap();
        assert_eq!(screen.wait().await, ProcessingPhase::Finished);
    }

    #[tokio::test]
    async fn documents_can_be_skipped_with_no_files() {
        let profile = Arc::new(MockProfile::default());
        let (mut wizard, uploads) = wizard(profile.clone(), Some("jwt"));
        walk_to_documents(&mut wizard).await;

        assert_eq!(wizard.skip().await, WizardTransition::Completed);
        assert!(wizard.session().collected(StageId::Documents).is_none());
        assert!(wizard.session().was_skipped(StageId::Documents));
        assert_eq!(uploads.uploads.load(Ordering::SeqCst), 0);
        assert_eq!(*profile.completions.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn completion_survives_failed_marker_call() {
        let profile = Arc::new(MockProfile {
            complete_fails: true,
            ..Default::default()
        });
        let (mut wizard, _) = wizard(profile.clone(), Some("jwt"));
        walk_to_documents(&mut wizard).await;

        assert_eq!(wizard.next().await, WizardTransition::Completed);
        assert!(wizard.is_complete());
    }

    #[tokio::test(start_paused = true)]
    async fn leaving_documents_cancels_extraction() {
        let profile = Arc::new(MockProfile::default());
        let (mut wizard, _) = wizard(profile, Some("jwt"));
        walk_to_documents(&mut wizard).await;

        let docs = wizard.documents_mut().unwrap();
        assert_eq!(docs.resume.submit(resume()).await, SlotPhase::Success);
        let updates = docs.resume.extraction().unwrap().updates();

        assert!(matches!(wizard.retreat(), WizardTransition::Retreated { .. }));
        assert_eq!(wizard.current_stage(), Some(StageId::Background));

        let seen: Vec<_> = updates.collect().await;
        assert!(seen.last().unwrap().in_progress);
        // The uploaded resume is still counted for the session.
        let collected = wizard.session().collected(StageId::Documents).unwrap();
        assert!(matches!(collected, StagePayload::Documents(s) if s.resume.is_some()));
    }

    #[tokio::test(start_paused = true)]
    async fn documents_survive_retreat_and_reentry() {
        let profile = Arc::new(MockProfile::default());
        let (mut wizard, uploads) = wizard(profile, Some("jwt"));
        walk_to_documents(&mut wizard).await;
        let docs = wizard.documents_mut().unwrap();
        assert_eq!(docs.resume.submit(resume()).await, SlotPhase::Success);

        wizard.retreat();
        assert!(matches!(wizard.skip().await, WizardTransition::Advanced { .. }));

        let docs = wizard.documents_mut().unwrap();
        assert_eq!(docs.resume.phase(), SlotPhase::Success);
        assert_eq!(
            docs.resume.snapshot().remote().unwrap().public_id,
            "resume/resume.pdf"
        );
        assert!(docs.resume.extraction().is_none());

        assert_eq!(wizard.next().await, WizardTransition::Completed);
        let collected = wizard.session().collected(StageId::Documents);
        assert!(matches!(collected, Some(StagePayload::Documents(s)) if s.resume.is_some()));
        assert_eq!(wizard.session().completeness(), 85);
        assert_eq!(uploads.uploads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn deleting_restored_document_clears_record_on_leave() {
        let profile = Arc::new(MockProfile::default());
        let (mut wizard, uploads) = wizard(profile, Some("jwt"));
        walk_to_documents(&mut wizard).await;
        let docs = wizard.documents_mut().unwrap();
        docs.transcript
            .submit(CandidateFile::new("transcript.pdf", vec![2u8; 1024]))
            .await;
        wizard.retreat();
        wizard.skip().await;

        assert!(wizard.documents_mut().unwrap().transcript.delete().await);
        wizard.retreat();

        assert!(wizard.session().collected(StageId::Documents).is_none());
        assert_eq!(
            uploads.deletes.lock().unwrap().as_slice(),
            &["transcript/transcript.pdf".to_string()]
        );
    }

    #[tokio::test]
    async fn close_from_any_stage_persists_nothing() {
        let profile = Arc::new(MockProfile::default());
        let (mut wizard, _) = wizard(profile.clone(), Some("jwt"));
        fill_and_advance(&mut wizard, StagePayload::Basic(fixtures::basic())).await;
        let calls = profile.update_count();

        assert_eq!(wizard.close(), WizardTransition::Closed);
        assert!(wizard.is_closed());
        assert_eq!(wizard.close(), WizardTransition::Unchanged);
        assert_eq!(wizard.next().await, WizardTransition::Unchanged);
        assert_eq!(wizard.skip().await, WizardTransition::Unchanged);
        assert!(wizard.start_processing().is_none());
        assert_eq!(profile.update_count(), calls);
        assert_eq!(*profile.completions.lock().unwrap(), 0);
    }
}

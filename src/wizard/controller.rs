use std::sync::Arc;

use tracing::{debug, info, warn};

use super::stage::{StageId, StagePayload};
use crate::api::{Credential, ProfileService};
use crate::error::IntakeError;

/// Validates and persists one stage's form data.
///
/// A successful [`submit`](Self::submit) hands the payload back unchanged;
/// that is the only signal the wizard accepts for advancing.
pub struct StageController<P> {
    stage: StageId,
    service: Arc<P>,
    credential: Credential,
}

impl<P: ProfileService> StageController<P> {
    pub fn new(stage: StageId, service: Arc<P>, credential: Credential) -> Self {
        Self {
            stage,
            service,
            credential,
        }
    }

    pub fn stage(&self) -> StageId {
        self.stage
    }

    /// Validation gate, credential check, then a single update call.
    /// The stage with no profile section (documents) succeeds locally.
    pub async fn submit(&self, payload: StagePayload) -> Result<StagePayload, IntakeError> {
        if payload.stage() != self.stage {
            return Err(IntakeError::Validation(format!(
                "{} data submitted to {} stage",
                payload.stage().noun(),
                self.stage.noun()
            )));
        }
        payload.validate()?;

        let token = self.credential.bearer().inspect_err(|_| {
            warn!(stage = %self.stage.noun(), "submit attempted without credential");
        })?;

        let Some(section) = self.stage.section() else {
            return Ok(payload);
        };

        let body = payload.to_body()?;
        debug!(stage = %self.stage.noun(), %section, "saving stage");
        match self.service.update_section(section, &body, token).await {
            Ok(()) => {
                info!(stage = %self.stage.noun(), "stage saved");
                Ok(payload)
            }
            Err(api_err) => {
                let err = IntakeError::from_api(
                    api_err,
                    &format!("save {} information", self.stage.noun()),
                );
                warn!(stage = %self.stage.noun(), kind = %err.kind(), error = %err, "stage save failed");
                Err(err)
            }
        }
    }

    /// Skip path: sends whatever was entered without the validation gate.
    /// Failures are logged and swallowed.
    pub async fn persist_best_effort(&self, payload: &StagePayload) {
        let Some(section) = self.stage.section() else {
            return;
        };
        let Ok(token) = self.credential.bearer() else {
            debug!(stage = %self.stage.noun(), "no credential, skip persistence dropped");
            return;
        };
        let body = match payload.to_body() {
            Ok(body) => body,
            Err(err) => {
                warn!(stage = %self.stage.noun(), error = %err, "could not encode skipped stage");
                return;
            }
        };
        if let Err(err) = self.service.update_section(section, &body, token).await {
            warn!(stage = %self.stage.noun(), error = %err, "best-effort save failed");
        }
    }
}

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::stage::{StageId, StagePayload};

/// Everything collected during one pass through the wizard.
///
/// Payloads are stored only after their stage reported success, so a stage
/// re-entered after `retreat` shows its last-submitted data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardSession {
    pub id: String,
    pub opened_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    current_stage_index: usize,
    collected: BTreeMap<StageId, StagePayload>,
    skipped: Vec<StageId>,
    history: Vec<StageId>,
}

impl Default for WizardSession {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            opened_at: Utc::now(),
            completed_at: None,
            current_stage_index: 0,
            collected: BTreeMap::new(),
            skipped: Vec::new(),
            history: Vec::new(),
        }
    }

    pub fn current_stage_index(&self) -> usize {
        self.current_stage_index
    }

    pub fn current_stage(&self) -> Option<StageId> {
        StageId::from_index(self.current_stage_index)
    }

    /// Stages visited, in order, including revisits.
    pub fn history(&self) -> &[StageId] {
        &self.history
    }

    pub fn collected(&self, stage: StageId) -> Option<&StagePayload> {
        self.collected.get(&stage)
    }

    pub fn was_skipped(&self, stage: StageId) -> bool {
        self.skipped.contains(&stage)
    }

    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    pub(crate) fn record(&mut self, payload: StagePayload) {
        let stage = payload.stage();
        self.skipped.retain(|s| *s != stage);
        self.collected.insert(stage, payload);
    }

    pub(crate) fn forget(&mut self, stage: StageId) {
        self.collected.remove(&stage);
    }

    pub(crate) fn mark_skipped(&mut self, stage: StageId) {
        if !self.skipped.contains(&stage) {
            self.skipped.push(stage);
        }
    }

    pub(crate) fn move_to(&mut self, index: usize) {
        if let Some(stage) = self.current_stage() {
            self.history.push(stage);
        }
        self.current_stage_index = index;
    }

    pub(crate) fn complete(&mut self) {
        if let Some(stage) = self.current_stage() {
            self.history.push(stage);
        }
        self.completed_at = Some(Utc::now());
    }

    /// Rough profile completeness in percent, weighted the way the
    /// profile service scores it.
    pub fn completeness(&self) -> u8 {
        let score: u32 = self
            .collected
            .values()
            .map(|payload| match payload {
                StagePayload::Basic(info) => {
                    if info.first_name.trim().is_empty() || info.last_name.trim().is_empty() {
                        0
                    } else {
                        20
                    }
                }
                StagePayload::Academic(info) => {
                    if info.school_name.trim().is_empty() || info.graduation_year().is_none() {
                        0
                    } else {
                        25
                    }
                }
                StagePayload::Activities(info) => {
                    if info.interests.is_empty() && info.activities.is_empty() {
                        0
                    } else {
                        20
                    }
                }
                StagePayload::Background(info) => {
                    if info.gender.trim().is_empty() && info.ethnicities.is_empty() {
                        0
                    } else {
                        15
                    }
                }
                StagePayload::Documents(summary) => {
                    if summary.resume.is_some() || summary.transcript.is_some() {
                        20
                    } else {
                        0
                    }
                }
            })
            .sum();
        score.min(100) as u8
    }
}

//! Pre-filled wizard answers read from a TOML file, used by `lumos-intake run`.
//!
//! ```toml
//! [basic]
//! firstName = "Ada"
//! dateOfBirth = { month = "March", day = "14", year = "2007" }
//!
//! [background]
//! skip = true
//!
//! [documents]
//! resume = "resume.pdf"
//! others = ["award.pdf"]
//! ```
//!
//! Document paths are resolved against the answers file's directory.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::stage::{AcademicInfo, ActivitiesInfo, BackgroundInfo, BasicInfo, StageId, StagePayload};
use crate::api::CandidateFile;
use crate::error::IntakeError;

#[derive(Debug, Clone, Deserialize)]
pub struct AnswerSheet {
    pub basic: BasicInfo,
    pub academic: AcademicInfo,
    #[serde(default)]
    pub activities: ActivitiesInfo,
    #[serde(default)]
    pub background: BackgroundAnswers,
    #[serde(default)]
    pub documents: DocumentAnswers,
    #[serde(skip)]
    base_dir: PathBuf,
}

/// Background answers. A missing table counts as skipped.
#[derive(Debug, Clone, Deserialize)]
pub struct BackgroundAnswers {
    #[serde(default)]
    pub skip: bool,
    #[serde(flatten)]
    pub info: BackgroundInfo,
}

impl Default for BackgroundAnswers {
    fn default() -> Self {
        Self {
            skip: true,
            info: BackgroundInfo::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentAnswers {
    #[serde(default)]
    pub skip: bool,
    pub resume: Option<PathBuf>,
    pub transcript: Option<PathBuf>,
    #[serde(default)]
    pub others: Vec<PathBuf>,
}

/// Files read from disk for the documents stage.
#[derive(Debug, Default)]
pub struct DocumentFiles {
    pub resume: Option<CandidateFile>,
    pub transcript: Option<CandidateFile>,
    pub others: Vec<CandidateFile>,
}

impl DocumentFiles {
    pub fn is_empty(&self) -> bool {
        self.resume.is_none() && self.transcript.is_none() && self.others.is_empty()
    }
}

impl AnswerSheet {
    pub fn load(path: &Path) -> Result<Self, IntakeError> {
        let content = std::fs::read_to_string(path)?;
        let mut sheet: AnswerSheet = toml::from_str(&content)?;
        sheet.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(sheet)
    }

    /// The answers for `stage`, or `None` when the sheet skips it.
    pub fn payload_for(&self, stage: StageId) -> Option<StagePayload> {
        match stage {
            StageId::Basic => Some(StagePayload::Basic(self.basic.clone())),
            StageId::Academic => Some(StagePayload::Academic(self.academic.clone())),
            StageId::Activities => Some(StagePayload::Activities(self.activities.clone())),
            StageId::Background => (!self.background.skip)
                .then(|| StagePayload::Background(self.background.info.clone())),
            StageId::Documents => None,
        }
    }

    pub fn skips(&self, stage: StageId) -> bool {
        match stage {
            StageId::Background => self.background.skip,
            StageId::Documents => self.documents.skip,
            _ => false,
        }
    }

    /// Reads every listed document from disk.
    pub async fn read_documents(&self) -> Result<DocumentFiles, IntakeError> {
        let resolve = |p: &PathBuf| self.base_dir.join(p);
        let mut files = DocumentFiles::default();
        if let Some(path) = &self.documents.resume {
            files.resume = Some(CandidateFile::from_path(&resolve(path)).await?);
        }
        if let Some(path) = &self.documents.transcript {
            files.transcript = Some(CandidateFile::from_path(&resolve(path)).await?);
        }
        for path in &self.documents.others {
            files.others.push(CandidateFile::from_path(&resolve(path)).await?);
        }
        Ok(files)
    }
}

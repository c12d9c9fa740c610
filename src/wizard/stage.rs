//! Stage identifiers and the form payload each stage collects.
//!
//! Payloads serialize in the camelCase shape the profile service expects,
//! so a validated payload is sent as-is.

use std::fmt;
use std::str::FromStr;

use chrono::{Month, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::api::ProfileSection;
use crate::error::IntakeError;
use crate::upload::DocumentsSummary;

/// The five wizard stages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageId {
    Basic,
    Academic,
    Activities,
    Background,
    Documents,
}

impl StageId {
    pub const ALL: [StageId; 5] = [
        StageId::Basic,
        StageId::Academic,
        StageId::Activities,
        StageId::Background,
        StageId::Documents,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    pub fn previous(self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    pub fn title(self) -> &'static str {
        match self {
            StageId::Basic => "Basic Information",
            StageId::Academic => "Academic Information",
            StageId::Activities => "Activities & Interests",
            StageId::Background => "Background",
            StageId::Documents => "Upload Documents",
        }
    }

    /// Word used in "Failed to save ... information".
    pub fn noun(self) -> &'static str {
        match self {
            StageId::Basic => "basic",
            StageId::Academic => "academic",
            StageId::Activities => "activities",
            StageId::Background => "background",
            StageId::Documents => "documents",
        }
    }

    /// Profile section persisted by this stage. Documents persist through uploads.
    pub fn section(self) -> Option<ProfileSection> {
        match self {
            StageId::Basic => Some(ProfileSection::Basic),
            StageId::Academic => Some(ProfileSection::Academic),
            StageId::Activities => Some(ProfileSection::Activities),
            StageId::Background => Some(ProfileSection::Background),
            StageId::Documents => None,
        }
    }

    pub fn is_skippable(self) -> bool {
        matches!(self, StageId::Background | StageId::Documents)
    }

    /// Share of the wizard completed once this stage is shown, e.g. 40 for stage 2.
    pub fn progress_percent(self) -> u8 {
        ((self.index() + 1) * 100 / Self::COUNT) as u8
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Step {} of {}: {}",
            self.index() + 1,
            Self::COUNT,
            self.title()
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DateOfBirth {
    pub month: String,
    pub day: String,
    pub year: String,
}

impl DateOfBirth {
    pub fn is_filled(&self) -> bool {
        [&self.month, &self.day, &self.year]
            .iter()
            .all(|part| !part.trim().is_empty())
    }

    /// The calendar date, accepting the month as a number or an English name.
    pub fn to_date(&self) -> Option<NaiveDate> {
        let month_text = self.month.trim();
        let month = month_text
            .parse::<u32>()
            .ok()
            .or_else(|| Month::from_str(month_text).ok().map(|m| m.number_from_month()))?;
        let day = self.day.trim().parse::<u32>().ok()?;
        let year = self.year.trim().parse::<i32>().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    }
}

/// Stage 1: identity and location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BasicInfo {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: DateOfBirth,
    pub country: String,
    pub state: String,
    pub city: String,
    pub phone: String,
}

impl BasicInfo {
    pub fn validate(&self) -> Result<(), IntakeError> {
        let mut missing = Vec::new();
        require(&mut missing, &self.first_name, "first name");
        require(&mut missing, &self.last_name, "last name");
        if !self.date_of_birth.is_filled() {
            missing.push("date of birth");
        }
        require(&mut missing, &self.country, "country");
        require(&mut missing, &self.state, "state/province");
        require(&mut missing, &self.city, "city");
        missing_fields(missing)?;

        let dob = self.date_of_birth.to_date().ok_or_else(|| {
            IntakeError::Validation("Date of birth is not a valid date".into())
        })?;
        if dob > Utc::now().date_naive() {
            return Err(IntakeError::Validation(
                "Date of birth cannot be in the future".into(),
            ));
        }
        Ok(())
    }
}

/// Stage 2: academic profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AcademicInfo {
    pub education_level: String,
    pub school_name: String,
    pub grade_year: String,
    pub graduation_year: String,
    pub gpa: String,
    pub gpa_scale: String,
    pub major: String,
    pub minor: String,
    pub sat: String,
    pub ielts: String,
    pub class_rank: String,
    pub class_size: String,
}

impl Default for AcademicInfo {
    fn default() -> Self {
        Self {
            education_level: String::new(),
            school_name: String::new(),
            grade_year: String::new(),
            graduation_year: String::new(),
            gpa: String::new(),
            gpa_scale: "4.0".to_string(),
            major: String::new(),
            minor: String::new(),
            sat: String::new(),
            ielts: String::new(),
            class_rank: String::new(),
            class_size: String::new(),
        }
    }
}

impl AcademicInfo {
    pub fn validate(&self) -> Result<(), IntakeError> {
        let mut missing = Vec::new();
        require(&mut missing, &self.education_level, "education level");
        require(&mut missing, &self.school_name, "school name");
        require(&mut missing, &self.grade_year, "grade/year");
        require(&mut missing, &self.graduation_year, "graduation year");
        require(&mut missing, &self.major, "major");
        missing_fields(missing)?;

        let year = self.graduation_year.trim().parse::<i32>().ok();
        if !year.is_some_and(|y| (1900..=2100).contains(&y)) {
            return Err(IntakeError::Validation(
                "Graduation year must be a four-digit year".into(),
            ));
        }

        if !self.gpa.trim().is_empty() {
            let gpa = self.gpa.trim().parse::<f64>().map_err(|_| {
                IntakeError::Validation("GPA must be a number".into())
            })?;
            if let Ok(scale) = self.gpa_scale.trim().parse::<f64>()
                && !(0.0..=scale).contains(&gpa)
            {
                return Err(IntakeError::Validation(format!(
                    "GPA must be between 0 and {}",
                    self.gpa_scale.trim()
                )));
            }
        }
        Ok(())
    }

    pub fn graduation_year(&self) -> Option<i32> {
        self.graduation_year.trim().parse().ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Activity {
    pub name: String,
    pub role: String,
    pub years: String,
    pub hours_per_week: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Award {
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobEntry {
    pub title: String,
    pub organization: String,
    pub duration: String,
    pub description: String,
}

/// Stage 3: interests, activities, awards and jobs. Nothing is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivitiesInfo {
    pub interests: Vec<String>,
    pub activities: Vec<Activity>,
    pub awards: Vec<Award>,
    pub jobs: Vec<JobEntry>,
}

/// Interests below this count produce an advisory.
pub const RECOMMENDED_INTERESTS: usize = 3;

impl ActivitiesInfo {
    /// Selects or deselects an interest.
    pub fn toggle_interest(&mut self, interest: &str) {
        if let Some(pos) = self.interests.iter().position(|i| i == interest) {
            self.interests.remove(pos);
        } else {
            self.interests.push(interest.to_string());
        }
    }

    pub fn advisories(&self) -> Vec<String> {
        let mut notes = Vec::new();
        if self.interests.len() < RECOMMENDED_INTERESTS {
            notes.push(format!(
                "Select at least {RECOMMENDED_INTERESTS} interests for better matches"
            ));
        }
        notes
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MilitaryFlag {
    Veteran,
    Active,
    ParentVeteran,
    ParentActive,
    None,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MilitaryStatus {
    pub veteran: bool,
    pub active: bool,
    pub parent_veteran: bool,
    pub parent_active: bool,
    pub none: bool,
}

impl MilitaryStatus {
    /// Sets one flag. Choosing `None` clears every other flag.
    pub fn set(&mut self, flag: MilitaryFlag, value: bool) {
        match flag {
            MilitaryFlag::Veteran => self.veteran = value,
            MilitaryFlag::Active => self.active = value,
            MilitaryFlag::ParentVeteran => self.parent_veteran = value,
            MilitaryFlag::ParentActive => self.parent_active = value,
            MilitaryFlag::None => {
                self.none = value;
                if value {
                    *self = MilitaryStatus {
                        none: true,
                        ..Default::default()
                    };
                }
            }
        }
    }
}

/// Stage 4: demographic background. Entirely optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BackgroundInfo {
    pub gender: String,
    pub ethnicities: Vec<String>,
    pub ethnicity_other: String,
    pub first_gen: String,
    pub citizenship: String,
    pub citizenship_other: String,
    pub income_range: String,
    pub military: MilitaryStatus,
    pub disability: String,
    pub disability_details: String,
}

impl BackgroundInfo {
    pub fn toggle_ethnicity(&mut self, value: &str) {
        if let Some(pos) = self.ethnicities.iter().position(|e| e == value) {
            self.ethnicities.remove(pos);
        } else {
            self.ethnicities.push(value.to_string());
        }
    }
}

/// The validated data of one stage, tagged by stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", content = "data", rename_all = "lowercase")]
pub enum StagePayload {
    Basic(BasicInfo),
    Academic(AcademicInfo),
    Activities(ActivitiesInfo),
    Background(BackgroundInfo),
    Documents(DocumentsSummary),
}

impl StagePayload {
    /// Blank form for `stage`.
    pub fn empty(stage: StageId) -> Self {
        match stage {
            StageId::Basic => StagePayload::Basic(BasicInfo::default()),
            StageId::Academic => StagePayload::Academic(AcademicInfo::default()),
            StageId::Activities => StagePayload::Activities(ActivitiesInfo::default()),
            StageId::Background => StagePayload::Background(BackgroundInfo::default()),
            StageId::Documents => StagePayload::Documents(DocumentsSummary::default()),
        }
    }

    pub fn stage(&self) -> StageId {
        match self {
            StagePayload::Basic(_) => StageId::Basic,
            StagePayload::Academic(_) => StageId::Academic,
            StagePayload::Activities(_) => StageId::Activities,
            StagePayload::Background(_) => StageId::Background,
            StagePayload::Documents(_) => StageId::Documents,
        }
    }

    /// Hard requirements that gate Next.
    pub fn validate(&self) -> Result<(), IntakeError> {
        match self {
            StagePayload::Basic(info) => info.validate(),
            StagePayload::Academic(info) => info.validate(),
            StagePayload::Activities(_)
            | StagePayload::Background(_)
            | StagePayload::Documents(_) => Ok(()),
        }
    }

    /// Non-blocking suggestions shown alongside the form.
    pub fn advisories(&self) -> Vec<String> {
        match self {
            StagePayload::Activities(info) => info.advisories(),
            _ => Vec::new(),
        }
    }

    /// The JSON body for the stage's profile endpoint.
    pub fn to_body(&self) -> Result<serde_json::Value, IntakeError> {
        let value = match self {
            StagePayload::Basic(info) => serde_json::to_value(info)?,
            StagePayload::Academic(info) => serde_json::to_value(info)?,
            StagePayload::Activities(info) => serde_json::to_value(info)?,
            StagePayload::Background(info) => serde_json::to_value(info)?,
            StagePayload::Documents(summary) => serde_json::to_value(summary)?,
        };
        Ok(value)
    }
}

fn require(missing: &mut Vec<&'static str>, value: &str, label: &'static str) {
    if value.trim().is_empty() {
        missing.push(label);
    }
}

fn missing_fields(missing: Vec<&'static str>) -> Result<(), IntakeError> {
    if missing.is_empty() {
        return Ok(());
    }
    Err(IntakeError::Validation(format!(
        "Please fill in the required fields: {}",
        missing.join(", ")
    )))
}

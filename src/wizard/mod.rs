pub mod answers;
pub mod controller;
pub mod orchestrator;
pub mod processing;
pub mod session;
pub mod stage;

pub use answers::{AnswerSheet, DocumentFiles};
pub use controller::StageController;
pub use orchestrator::{Mounted, Wizard, WizardTransition};
pub use processing::{ProcessingPhase, ProcessingScreen};
pub use session::WizardSession;
pub use stage::{
    AcademicInfo, ActivitiesInfo, Activity, Award, BackgroundInfo, BasicInfo, DateOfBirth,
    JobEntry, MilitaryFlag, MilitaryStatus, StageId, StagePayload,
};

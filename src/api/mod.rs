pub mod client;
pub mod credential;
pub mod error;
pub mod types;

pub use client::{IntakeClient, ProfileService, ProgressFn, UploadService};
pub use credential::Credential;
pub use error::ApiError;
pub use types::{CandidateFile, DocumentCategory, MIB, ProfileSection, UploadReceipt};

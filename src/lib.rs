//! Profile intake wizard and document upload pipeline.
//!
//! [`wizard::Wizard`] walks a candidate through five stages, persisting each
//! through a [`api::ProfileService`]; the last stage mounts a
//! [`upload::DocumentSet`] of upload slots backed by an [`api::UploadService`].

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod ui;
pub mod upload;
pub mod wizard;

pub use error::{FailureKind, IntakeError};

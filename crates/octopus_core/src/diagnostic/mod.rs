//! Business diagnostic: scoring engine, profile table and result archive.

pub mod archive;
pub mod model;
pub mod profile;
pub mod scoring;

pub use archive::{
    ArchiveReceipt, DiagnosticArchive, DiagnosticRecord, LeadListing, LeadSource, LeadSummary,
    RemoteArchive,
};
pub use model::{
    BusinessType, DiagnosticResult, DiagnosticStatus, DiagnosticSubmission, FinancialInputs,
    LeadContact, ScoreValueError, SurveyDimension, SurveyScore, SurveyScores,
};
pub use scoring::{evaluate, evaluate_submission};

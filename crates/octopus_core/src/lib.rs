//! Core logic for the Octopus business diagnostic app.
//! Local-first sync, the scoring engine and result persistence live here;
//! FFI and CLI crates are thin adapters over this crate.

pub mod cache;
pub mod config;
pub mod db;
pub mod diagnostic;
pub mod logging;
pub mod model;
pub mod remote;
pub mod service;
pub mod sync;

pub use cache::{CacheError, CacheResult, CacheStore, MemoryCacheStore, SqliteCacheStore};
pub use config::{ConfigError, CoreConfig};
pub use diagnostic::{
    evaluate, evaluate_submission, BusinessType, DiagnosticArchive, DiagnosticResult,
    DiagnosticStatus, DiagnosticSubmission, FinancialInputs, LeadContact, SurveyScore,
    SurveyScores,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::calendar_event::{
    CalendarEvent, EventId, EventType, EventValidationError, NewCalendarEvent,
};
pub use model::entity::Entity;
pub use remote::{
    HttpRemoteStore, InMemoryRemoteStore, RemoteBackend, RemoteConfig, RemoteError,
    RemoteResult, RemoteStore,
};
pub use service::calendar_service::CalendarService;
pub use sync::{ReadSource, SyncRead, Synchronizer, WriteOutcome};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}

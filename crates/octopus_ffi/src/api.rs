//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Keep error semantics simple: every call returns an envelope.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Storage and network failures degrade to local data; only invalid input
//!   yields `ok = false`.

use chrono::{DateTime, Utc};
use log::warn;
use octopus_core::db::open_db;
use octopus_core::diagnostic::{ArchiveReceipt, RemoteArchive};
use octopus_core::{
    core_version as core_version_inner, evaluate_submission, init_logging as init_logging_inner,
    ping as ping_inner, BusinessType, CalendarEvent, CalendarService, ConfigError, CoreConfig,
    DiagnosticArchive, DiagnosticResult, DiagnosticSubmission, EventType, FinancialInputs,
    LeadContact, MemoryCacheStore, NewCalendarEvent, RemoteBackend, RemoteStore, SqliteCacheStore,
    SurveyScores,
};
use std::path::Path;
use std::sync::OnceLock;
use uuid::Uuid;

static CORE_CONFIG: OnceLock<Result<CoreConfig, ConfigError>> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts with different level or directory return error.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Contact fields collected alongside a diagnostic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadInput {
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub business_name: String,
    pub city: String,
    /// `restaurant|bar|cafe|bakery|dark_kitchen|hotel|other`.
    pub business_type: String,
}

/// Diagnostic envelope returned to the UI.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagnosticResponse {
    /// False only when the input was rejected.
    pub ok: bool,
    pub message: String,
    /// `GREEN|YELLOW|RED`; empty when `ok` is false.
    pub status: String,
    pub profile_name: String,
    pub profile_description: String,
    pub cogs_percentage: f64,
    pub labor_percentage: f64,
    pub fixed_percentage: f64,
    pub margin_percentage: f64,
    pub score_financial: f64,
    pub score_7p: f64,
    pub score_global: f64,
    pub strengths: Vec<String>,
    pub priorities: Vec<String>,
    /// Id of the stored record; `None` when nothing was stored.
    pub record_id: Option<String>,
    pub saved_locally: bool,
    pub saved_remotely: bool,
}

impl DiagnosticResponse {
    fn rejected(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            ..Self::default()
        }
    }

    fn from_result(result: DiagnosticResult, message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
            status: result.status.as_str().to_string(),
            profile_name: result.profile_name,
            profile_description: result.profile_description,
            cogs_percentage: result.cogs_percentage,
            labor_percentage: result.labor_percentage,
            fixed_percentage: result.fixed_percentage,
            margin_percentage: result.margin_percentage,
            score_financial: result.score_financial,
            score_7p: result.score_7p,
            score_global: result.score_global,
            strengths: result.strengths,
            priorities: result.priorities,
            record_id: None,
            saved_locally: false,
            saved_remotely: false,
        }
    }
}

/// Scores a diagnostic and archives it locally and remotely.
///
/// `survey` holds the seven answers (1..=5) in order: order, technology,
/// observation, pragmatism, creativity, universality, subtlety.
///
/// # FFI contract
/// - Sync call; performs local DB work and at most two bounded remote calls.
/// - Never panics.
/// - Storage failures still return the computed result with `ok = true`.
#[flutter_rust_bridge::frb(sync)]
pub fn diagnostic_run(
    monthly_revenue: f64,
    cogs: f64,
    labor_cost: f64,
    rent: f64,
    utilities_and_fixed: f64,
    survey: Vec<u8>,
    lead: Option<LeadInput>,
) -> DiagnosticResponse {
    let answers = match <[u8; 7]>::try_from(survey.as_slice()) {
        Ok(answers) => answers,
        Err(_) => {
            return DiagnosticResponse::rejected(format!(
                "diagnostic_run failed: expected 7 survey answers, got {}",
                survey.len()
            ))
        }
    };
    let survey = match SurveyScores::from_values(answers) {
        Ok(survey) => survey,
        Err(err) => return DiagnosticResponse::rejected(format!("diagnostic_run failed: {err}")),
    };

    let submission = DiagnosticSubmission {
        financials: FinancialInputs {
            monthly_revenue,
            cogs,
            labor_cost,
            rent,
            utilities_and_fixed,
        },
        survey,
        lead: lead.map(to_lead_contact),
    };
    let result = evaluate_submission(&submission);

    let config = match resolve_config() {
        Ok(config) => config,
        Err(err) => {
            return DiagnosticResponse::from_result(
                result,
                format!("Diagnostic computed but not saved: {err}"),
            )
        }
    };
    let archived = archive_diagnostic(result.clone(), &config.db_path, config.remote_backend());

    let receipt = archived.receipt;
    let saved_locally = archived.cache_error.is_none() && receipt.local.is_ok();
    let saved_remotely = receipt.remote.is_stored();
    let message = match (&archived.cache_error, &receipt.remote) {
        (Some(_), RemoteArchive::NotStored { .. }) => {
            "Diagnostic computed but not saved: cache and remote store unavailable."
        }
        (Some(_), _) => "Diagnostic saved remotely; this device's cache is unavailable.",
        (None, RemoteArchive::Stored) => "Diagnostic saved.",
        (None, RemoteArchive::StoredReduced { .. }) => "Diagnostic saved (reduced remote record).",
        (None, RemoteArchive::NotStored { .. }) => "Diagnostic saved on this device only.",
    };
    let mut response = DiagnosticResponse::from_result(result, message);
    if saved_locally || saved_remotely {
        response.record_id = Some(receipt.record.id.to_string());
    }
    response.saved_locally = saved_locally;
    response.saved_remotely = saved_remotely;
    response
}

struct ArchivedDiagnostic {
    receipt: ArchiveReceipt,
    /// Set when the cache DB could not be opened.
    cache_error: Option<String>,
}

/// Archives `result`, still attempting the remote insert when the cache DB
/// cannot be opened.
fn archive_diagnostic<R: RemoteStore>(
    result: DiagnosticResult,
    db_path: &Path,
    remote: R,
) -> ArchivedDiagnostic {
    match open_db(db_path) {
        Ok(conn) => ArchivedDiagnostic {
            receipt: DiagnosticArchive::new(SqliteCacheStore::new(&conn), remote).finalize(result),
            cache_error: None,
        },
        Err(err) => {
            warn!("event=ffi_diagnostic module=ffi status=degraded error_code=cache_unavailable error={err}");
            ArchivedDiagnostic {
                receipt: DiagnosticArchive::new(MemoryCacheStore::new(), remote).finalize(result),
                cache_error: Some(format!("cache DB open failed: {err}")),
            }
        }
    }
}

/// Calendar event projection for the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEventItem {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub start_epoch_ms: i64,
    pub end_epoch_ms: Option<i64>,
    /// `holiday|commercial|internal`.
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarListResponse {
    pub items: Vec<CalendarEventItem>,
    /// True when the remote store was unreachable and items come from the cache.
    pub from_cache: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarActionResponse {
    pub ok: bool,
    pub event_id: Option<String>,
    /// True when the remote store confirmed the change.
    pub synced: bool,
    pub message: String,
}

impl CalendarActionResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            event_id: None,
            synced: false,
            message: message.into(),
        }
    }
}

/// Lists calendar events, syncing with the remote store when reachable.
///
/// # FFI contract
/// - Sync call, DB-backed execution with one bounded remote call.
/// - Never panics; storage failures yield an empty list with a message.
#[flutter_rust_bridge::frb(sync)]
pub fn calendar_list() -> CalendarListResponse {
    match with_calendar_service(|service| service.list_events()) {
        Ok(read) => {
            let from_cache = read.is_fallback();
            let items = read.items.iter().map(to_event_item).collect::<Vec<_>>();
            let message = if from_cache {
                format!("Offline: showing {} cached event(s).", items.len())
            } else {
                format!("Loaded {} event(s).", items.len())
            };
            CalendarListResponse {
                items,
                from_cache,
                message,
            }
        }
        Err(err) => CalendarListResponse {
            items: Vec::new(),
            from_cache: true,
            message: format!("calendar_list failed: {err}"),
        },
    }
}

/// Creates a calendar event: saved locally first, then sent to the remote store.
///
/// `kind` accepts `holiday|commercial|internal`; `end_epoch_ms = None` makes a
/// point event.
#[flutter_rust_bridge::frb(sync)]
pub fn calendar_create(
    title: String,
    description: Option<String>,
    start_epoch_ms: i64,
    end_epoch_ms: Option<i64>,
    kind: String,
) -> CalendarActionResponse {
    let Some(kind) = EventType::parse(&kind) else {
        return CalendarActionResponse::failure(format!(
            "calendar_create failed: unsupported kind `{kind}`"
        ));
    };
    let Some(start_date) = from_epoch_ms(start_epoch_ms) else {
        return CalendarActionResponse::failure("calendar_create failed: start out of range");
    };
    let end_date = match end_epoch_ms.map(from_epoch_ms) {
        None => None,
        Some(Some(end)) => Some(end),
        Some(None) => {
            return CalendarActionResponse::failure("calendar_create failed: end out of range")
        }
    };

    let draft = NewCalendarEvent {
        title,
        description,
        start_date,
        end_date,
        kind,
        author_id: None,
    };
    match with_calendar_service(|service| service.create_event(draft)) {
        Ok(Ok(outcome)) => CalendarActionResponse {
            ok: true,
            event_id: Some(outcome.value.id.to_string()),
            synced: outcome.is_confirmed(),
            message: if outcome.is_confirmed() {
                "Event created.".to_string()
            } else {
                "Event saved on this device; it will appear for others once synced.".to_string()
            },
        },
        Ok(Err(err)) => CalendarActionResponse::failure(format!("calendar_create failed: {err}")),
        Err(err) => CalendarActionResponse::failure(format!("calendar_create failed: {err}")),
    }
}

/// Deletes a calendar event locally and, best-effort, remotely.
#[flutter_rust_bridge::frb(sync)]
pub fn calendar_delete(event_id: String) -> CalendarActionResponse {
    let Ok(id) = Uuid::parse_str(event_id.trim()) else {
        return CalendarActionResponse::failure(format!(
            "calendar_delete failed: invalid event id `{event_id}`"
        ));
    };
    match with_calendar_service(|service| service.delete_event(id)) {
        Ok(outcome) => CalendarActionResponse {
            ok: true,
            event_id: Some(id.to_string()),
            synced: outcome.is_confirmed(),
            message: match (outcome.value, outcome.is_confirmed()) {
                (true, true) => "Event deleted.",
                (true, false) => "Event deleted on this device only.",
                (false, _) => "Event was not cached on this device.",
            }
            .to_string(),
        },
        Err(err) => CalendarActionResponse::failure(format!("calendar_delete failed: {err}")),
    }
}

/// Re-sends every cached event to the remote store in one upsert.
#[flutter_rust_bridge::frb(sync)]
pub fn calendar_push_local() -> CalendarActionResponse {
    match with_calendar_service(|service| service.push_local_events()) {
        Ok(Ok(count)) => CalendarActionResponse {
            ok: true,
            event_id: None,
            synced: true,
            message: format!("Pushed {count} event(s)."),
        },
        Ok(Err(err)) => CalendarActionResponse {
            ok: true,
            event_id: None,
            synced: false,
            message: format!("Push skipped: {err}"),
        },
        Err(err) => CalendarActionResponse::failure(format!("calendar_push_local failed: {err}")),
    }
}

fn resolve_config() -> Result<&'static CoreConfig, String> {
    CORE_CONFIG
        .get_or_init(CoreConfig::from_env)
        .as_ref()
        .map_err(|err| {
            warn!("event=ffi_config module=ffi status=error error={err}");
            format!("invalid configuration: {err}")
        })
}

fn with_storage<T>(
    f: impl FnOnce(SqliteCacheStore<'_>, RemoteBackend) -> T,
) -> Result<T, String> {
    let config = resolve_config()?;
    let conn = open_db(&config.db_path).map_err(|err| format!("cache DB open failed: {err}"))?;
    Ok(f(SqliteCacheStore::new(&conn), config.remote_backend()))
}

fn with_calendar_service<T>(
    f: impl FnOnce(&CalendarService<SqliteCacheStore<'_>, RemoteBackend>) -> T,
) -> Result<T, String> {
    with_storage(|cache, remote| f(&CalendarService::new(cache, remote)))
}

fn to_lead_contact(input: LeadInput) -> LeadContact {
    LeadContact {
        contact_name: input.contact_name.trim().to_string(),
        contact_email: input.contact_email.trim().to_string(),
        contact_phone: input.contact_phone.trim().to_string(),
        business_name: input.business_name.trim().to_string(),
        city: input.city.trim().to_string(),
        business_type: BusinessType::parse(&input.business_type),
    }
}

fn to_event_item(event: &CalendarEvent) -> CalendarEventItem {
    CalendarEventItem {
        id: event.id.to_string(),
        title: event.title.clone(),
        description: event.description.clone(),
        start_epoch_ms: event.start_date.timestamp_millis(),
        end_epoch_ms: event.end_date.map(|end| end.timestamp_millis()),
        kind: event.kind.as_str().to_string(),
    }
}

fn from_epoch_ms(value: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(value)
}

#[cfg(test)]
mod tests {
    use super::{
        archive_diagnostic, calendar_create, calendar_delete, calendar_list, core_version,
        diagnostic_run, init_logging, ping, LeadInput,
    };
    use octopus_core::diagnostic::RemoteArchive;
    use octopus_core::{
        evaluate_submission, DiagnosticSubmission, FinancialInputs, InMemoryRemoteStore,
        SurveyScores,
    };
    use std::fs;

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn diagnostic_run_rejects_incomplete_survey() {
        let response = diagnostic_run(1_000.0, 300.0, 200.0, 100.0, 50.0, vec![3, 3, 3], None);
        assert!(!response.ok);
        assert!(response.message.contains("7 survey answers"));

        let response =
            diagnostic_run(1_000.0, 300.0, 200.0, 100.0, 50.0, vec![3, 3, 3, 3, 3, 3, 9], None);
        assert!(!response.ok);
    }

    #[test]
    fn diagnostic_run_scores_and_saves_locally() {
        let response = diagnostic_run(
            100_000.0,
            30_000.0,
            20_000.0,
            10_000.0,
            5_000.0,
            vec![4, 4, 4, 4, 4, 4, 4],
            Some(LeadInput {
                contact_name: " Ana ".to_string(),
                business_type: "cafe".to_string(),
                ..LeadInput::default()
            }),
        );
        assert!(response.ok, "{}", response.message);
        assert_eq!(response.status, "GREEN");
        assert!(response.record_id.is_some());
        assert!(response.saved_locally);
    }

    #[test]
    fn calendar_create_list_and_delete_roundtrip() {
        let created = calendar_create(
            "Ffi roundtrip".to_string(),
            None,
            1_790_000_000_000,
            Some(1_790_003_600_000),
            "internal".to_string(),
        );
        assert!(created.ok, "{}", created.message);
        let event_id = created.event_id.clone().unwrap();

        let listed = calendar_list();
        assert!(listed.items.iter().any(|item| item.id == event_id));

        let deleted = calendar_delete(event_id.clone());
        assert!(deleted.ok, "{}", deleted.message);
        assert!(!calendar_list().items.iter().any(|item| item.id == event_id));
    }

    #[test]
    fn calendar_create_rejects_bad_input() {
        let unknown_kind = calendar_create(
            "Party".to_string(),
            None,
            1_790_000_000_000,
            None,
            "birthday".to_string(),
        );
        assert!(!unknown_kind.ok);

        let reversed = calendar_create(
            "Reversed".to_string(),
            None,
            2_000,
            Some(1_000),
            "holiday".to_string(),
        );
        assert!(!reversed.ok);
        assert!(reversed.message.contains("end_date"));

        assert!(!calendar_delete("not-a-uuid".to_string()).ok);
    }

    #[test]
    fn unopenable_cache_still_sends_diagnostic_to_remote() {
        let blocker =
            std::env::temp_dir().join(format!("octopus_ffi_blocker_{}", uuid::Uuid::new_v4()));
        fs::write(&blocker, b"not a directory").unwrap();
        let db_path = blocker.join("cache.sqlite3");

        let result = evaluate_submission(&DiagnosticSubmission {
            financials: FinancialInputs {
                monthly_revenue: 50_000.0,
                cogs: 20_000.0,
                labor_cost: 15_000.0,
                rent: 5_000.0,
                utilities_and_fixed: 2_000.0,
            },
            survey: SurveyScores::from_values([3, 3, 3, 3, 3, 3, 3]).unwrap(),
            lead: None,
        });
        let remote = InMemoryRemoteStore::new();
        let archived = archive_diagnostic(result, &db_path, &remote);

        assert!(archived.cache_error.is_some());
        assert_eq!(archived.receipt.remote, RemoteArchive::Stored);
        assert_eq!(remote.rows("diagnostics").len(), 1);
        fs::remove_file(&blocker).unwrap();
    }
}

//! Result persistence for finalized diagnostics.
//!
//! # Responsibility
//! - Keep the latest result and a bounded history in the local cache.
//! - Push each result to the remote `diagnostics` collection, falling back
//!   once to a reduced payload when the remote schema lags behind.
//! - Read back lead summaries, remote first with local history as fallback.
//!
//! # Invariants
//! - The cache write happens before any remote attempt and regardless of its
//!   outcome.
//! - At most two remote inserts per finalize: full, then reduced on schema
//!   mismatch only.
//! - History is newest first and never exceeds `MAX_HISTORY` entries.

use super::model::{DiagnosticResult, DiagnosticStatus, LeadContact};
use crate::cache::{
    load_list, load_record, save_list, save_record, try_load_list, CacheResult, CacheStore,
};
use crate::remote::{RemoteError, RemoteResult, RemoteStore};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use uuid::Uuid;

pub const DIAGNOSTICS_COLLECTION: &str = "diagnostics";
pub const LAST_RESULT_KEY: &str = "diagnostic_last";
pub const HISTORY_KEY: &str = "diagnostic_history";
pub const MAX_HISTORY: usize = 20;

/// `source` marker of rows written with the full schema.
pub const SOURCE_FULL: &str = "web_quick_diagnostic";
/// `source` marker of rows written with the reduced fallback schema.
pub const SOURCE_FALLBACK: &str = "web_quick_diagnostic_fallback";

const ANONYMOUS: &str = "Anonymous";

/// A stored diagnostic: the engine output plus identity and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticRecord {
    pub id: Uuid,
    pub recorded_at: DateTime<Utc>,
    #[serde(flatten)]
    pub result: DiagnosticResult,
}

impl DiagnosticRecord {
    pub fn new(result: DiagnosticResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            recorded_at: Utc::now(),
            result,
        }
    }
}

/// How far the remote write of one record got.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteArchive {
    /// Full-schema row accepted.
    Stored,
    /// Full row refused for its shape; the reduced row was accepted.
    StoredReduced { full_error: RemoteError },
    /// Nothing was stored remotely. `reduced_error` is set when the fallback
    /// was attempted.
    NotStored {
        full_error: RemoteError,
        reduced_error: Option<RemoteError>,
    },
}

impl RemoteArchive {
    pub fn is_stored(&self) -> bool {
        !matches!(self, Self::NotStored { .. })
    }
}

#[derive(Debug)]
pub struct ArchiveReceipt {
    pub record: DiagnosticRecord,
    pub local: CacheResult<()>,
    pub remote: RemoteArchive,
}

/// Contact and headline figures of one stored diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadSummary {
    pub id: Option<String>,
    pub recorded_at: Option<DateTime<Utc>>,
    pub profile_name: String,
    pub profile_description: String,
    pub status: Option<DiagnosticStatus>,
    pub score_global: f64,
    pub cogs_percentage: f64,
    pub labor_percentage: f64,
    pub margin_percentage: f64,
    pub business_name: String,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: String,
}

impl LeadSummary {
    pub fn from_record(record: &DiagnosticRecord) -> Self {
        let result = &record.result;
        let lead = result.lead.clone().unwrap_or_default();
        Self {
            id: Some(record.id.to_string()),
            recorded_at: Some(record.recorded_at),
            profile_name: result.profile_name.clone(),
            profile_description: result.profile_description.clone(),
            status: Some(result.status),
            score_global: result.score_global,
            cogs_percentage: result.cogs_percentage,
            labor_percentage: result.labor_percentage,
            margin_percentage: result.margin_percentage,
            business_name: or_anonymous(lead.business_name),
            contact_name: or_anonymous(lead.contact_name),
            contact_email: lead.contact_email,
            contact_phone: lead.contact_phone,
        }
    }

    /// Reads a remote row. Column values win; the embedded `full_data` blob
    /// (object or serialized string) fills whatever the columns lack.
    pub fn from_row(row: &Value) -> Self {
        let blob = embedded_blob(row);
        let blob_lead = blob.get("lead").cloned().unwrap_or(Value::Null);

        let text = |column: &str, blob_key: &str, lead_key: Option<&str>| {
            non_empty_str(row.get(column))
                .or_else(|| non_empty_str(blob.get(blob_key)))
                .or_else(|| lead_key.and_then(|key| non_empty_str(blob_lead.get(key))))
        };
        let number = |column: &str, blob_key: &str| {
            row.get(column)
                .and_then(Value::as_f64)
                .or_else(|| blob.get(blob_key).and_then(Value::as_f64))
                .unwrap_or(0.0)
        };

        let id = text("id", "id", None);
        let recorded_at = text("created_at", "recordedAt", None)
            .and_then(|value| DateTime::parse_from_rfc3339(&value).ok())
            .map(|value| value.with_timezone(&Utc));

        Self {
            id,
            recorded_at,
            profile_name: text("profile_name", "profileName", None).unwrap_or_default(),
            profile_description: text("profile_description", "profileDescription", None)
                .unwrap_or_default(),
            status: text("status", "status", None)
                .and_then(|value| DiagnosticStatus::parse(&value)),
            score_global: number("score_global", "scoreGlobal"),
            cogs_percentage: number("cogs_percentage", "cogsPercentage"),
            labor_percentage: number("labor_percentage", "laborPercentage"),
            margin_percentage: number("margin_percentage", "marginPercentage"),
            business_name: text("business_name", "", Some("businessName"))
                .unwrap_or_else(|| ANONYMOUS.to_string()),
            contact_name: text("contact_name", "", Some("contactName"))
                .unwrap_or_else(|| ANONYMOUS.to_string()),
            contact_email: text("contact_email", "", Some("contactEmail")).unwrap_or_default(),
            contact_phone: text("contact_phone", "", Some("contactPhone")).unwrap_or_default(),
        }
    }
}

/// Where a [`DiagnosticArchive::leads`] listing came from.
#[derive(Debug, Clone, PartialEq)]
pub enum LeadSource {
    Remote,
    LocalHistory(RemoteError),
}

#[derive(Debug)]
pub struct LeadListing {
    pub leads: Vec<LeadSummary>,
    pub source: LeadSource,
}

/// Stores finalized diagnostics locally and remotely.
pub struct DiagnosticArchive<C, R> {
    cache: C,
    remote: R,
}

impl<C: CacheStore, R: RemoteStore> DiagnosticArchive<C, R> {
    pub fn new(cache: C, remote: R) -> Self {
        Self { cache, remote }
    }

    /// Persists `result` to the cache, then makes the remote attempt(s).
    pub fn finalize(&self, result: DiagnosticResult) -> ArchiveReceipt {
        let record = DiagnosticRecord::new(result);
        let local = self.save_locally(&record);
        let remote = self.store_remotely(&record);

        match &remote {
            RemoteArchive::Stored => info!(
                "event=diagnostic_archive module=diagnostic status=ok id={} source={SOURCE_FULL} cache_saved={}",
                record.id,
                local.is_ok()
            ),
            RemoteArchive::StoredReduced { full_error } => warn!(
                "event=diagnostic_archive module=diagnostic status=degraded id={} source={SOURCE_FALLBACK} cache_saved={} error_code={}",
                record.id,
                local.is_ok(),
                full_error.code()
            ),
            RemoteArchive::NotStored {
                full_error,
                reduced_error,
            } => warn!(
                "event=diagnostic_archive module=diagnostic status=local_only id={} cache_saved={} error_code={} fallback_error_code={}",
                record.id,
                local.is_ok(),
                full_error.code(),
                reduced_error.as_ref().map_or("none", RemoteError::code)
            ),
        }

        ArchiveReceipt {
            record,
            local,
            remote,
        }
    }

    pub fn last_result(&self) -> Option<DiagnosticRecord> {
        load_record(&self.cache, LAST_RESULT_KEY)
    }

    /// Local history, newest first.
    pub fn history(&self) -> Vec<DiagnosticRecord> {
        load_list(&self.cache, HISTORY_KEY)
    }

    /// Forgets the latest result; history is kept.
    pub fn clear_last(&self) -> CacheResult<()> {
        self.cache.remove(LAST_RESULT_KEY)
    }

    /// Lead summaries from the remote collection, or from local history when
    /// the remote read fails.
    pub fn leads(&self) -> LeadListing {
        match self.remote.fetch_all(DIAGNOSTICS_COLLECTION) {
            Ok(rows) => {
                let mut leads = rows.iter().map(LeadSummary::from_row).collect::<Vec<_>>();
                leads.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
                info!(
                    "event=diagnostic_leads module=diagnostic status=ok source=remote count={}",
                    leads.len()
                );
                LeadListing {
                    leads,
                    source: LeadSource::Remote,
                }
            }
            Err(err) => {
                let leads = self
                    .history()
                    .iter()
                    .map(LeadSummary::from_record)
                    .collect::<Vec<_>>();
                warn!(
                    "event=diagnostic_leads module=diagnostic status=fallback source=local count={} error_code={}",
                    leads.len(),
                    err.code()
                );
                LeadListing {
                    leads,
                    source: LeadSource::LocalHistory(err),
                }
            }
        }
    }

    /// Upserts every history record with the full schema. Returns the number
    /// of rows sent.
    pub fn push_history(&self) -> RemoteResult<usize> {
        let history = self.history();
        if history.is_empty() {
            return Ok(0);
        }
        let rows = history.iter().map(full_payload).collect::<Vec<_>>();
        match self.remote.upsert(DIAGNOSTICS_COLLECTION, &rows) {
            Ok(()) => {
                info!(
                    "event=diagnostic_push module=diagnostic status=ok row_count={}",
                    rows.len()
                );
                Ok(rows.len())
            }
            Err(err) => {
                warn!(
                    "event=diagnostic_push module=diagnostic status=error row_count={} error_code={}",
                    rows.len(),
                    err.code()
                );
                Err(err)
            }
        }
    }

    fn save_locally(&self, record: &DiagnosticRecord) -> CacheResult<()> {
        let last = save_record(&self.cache, LAST_RESULT_KEY, record);

        // History is left alone when it cannot be read.
        let saved_history = try_load_list::<DiagnosticRecord, _>(&self.cache, HISTORY_KEY)
            .and_then(|mut history| {
                history.retain(|existing| existing.id != record.id);
                history.insert(0, record.clone());
                history.truncate(MAX_HISTORY);
                save_list(&self.cache, HISTORY_KEY, &history)
            });

        last.and(saved_history)
    }

    fn store_remotely(&self, record: &DiagnosticRecord) -> RemoteArchive {
        let full_error = match self
            .remote
            .insert(DIAGNOSTICS_COLLECTION, &full_payload(record))
        {
            Ok(()) => return RemoteArchive::Stored,
            Err(err) => err,
        };
        if !full_error.is_schema_mismatch() {
            return RemoteArchive::NotStored {
                full_error,
                reduced_error: None,
            };
        }

        let reduced = reduced_payload(record)
            .and_then(|row| self.remote.insert(DIAGNOSTICS_COLLECTION, &row));
        match reduced {
            Ok(()) => RemoteArchive::StoredReduced { full_error },
            Err(err) => RemoteArchive::NotStored {
                full_error,
                reduced_error: Some(err),
            },
        }
    }
}

/// Row for the full `diagnostics` schema.
pub fn full_payload(record: &DiagnosticRecord) -> Value {
    let result = &record.result;
    let lead = contact_or_default(result.lead.as_ref());
    json!({
        "id": record.id.to_string(),
        "created_at": record.recorded_at.to_rfc3339(),
        "cogs_percentage": result.cogs_percentage,
        "labor_percentage": result.labor_percentage,
        "fixed_percentage": result.fixed_percentage,
        "margin_percentage": result.margin_percentage,
        "score_financial": result.score_financial,
        "score_7p": result.score_7p,
        "score_global": result.score_global,
        "status": result.status.as_str(),
        "profile_name": result.profile_name,
        "profile_description": result.profile_description,
        "strengths": result.strengths,
        "priorities": result.priorities,
        "contact_name": lead.contact_name,
        "contact_email": lead.contact_email,
        "contact_phone": lead.contact_phone,
        "business_name": lead.business_name,
        "city": lead.city,
        "business_type": lead.business_type.as_str(),
        "monthly_revenue": result.monthly_revenue,
        "source": SOURCE_FULL,
    })
}

/// Row for the reduced fallback schema; the whole record travels as a
/// serialized `full_data` string.
pub fn reduced_payload(record: &DiagnosticRecord) -> RemoteResult<Value> {
    let full_data =
        serde_json::to_string(record).map_err(|err| RemoteError::Encode(err.to_string()))?;
    let lead = contact_or_default(record.result.lead.as_ref());

    let mut row = Map::new();
    row.insert("contact_name".to_string(), Value::String(lead.contact_name));
    row.insert("contact_email".to_string(), Value::String(lead.contact_email));
    row.insert("business_name".to_string(), Value::String(lead.business_name));
    row.insert("full_data".to_string(), Value::String(full_data));
    row.insert("source".to_string(), Value::String(SOURCE_FALLBACK.to_string()));
    Ok(Value::Object(row))
}

fn contact_or_default(lead: Option<&LeadContact>) -> LeadContact {
    let lead = lead.cloned().unwrap_or_default();
    LeadContact {
        contact_name: or_anonymous(lead.contact_name),
        business_name: or_anonymous(lead.business_name),
        ..lead
    }
}

fn or_anonymous(value: String) -> String {
    if value.trim().is_empty() {
        ANONYMOUS.to_string()
    } else {
        value
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn embedded_blob(row: &Value) -> Value {
    match row.get("full_data") {
        Some(Value::String(text)) => serde_json::from_str(text).unwrap_or(Value::Null),
        Some(Value::Object(object)) => Value::Object(object.clone()),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::{full_payload, reduced_payload, DiagnosticRecord, LeadSummary, SOURCE_FALLBACK};
    use crate::diagnostic::model::{
        DiagnosticStatus, FinancialInputs, LeadContact, SurveyScore, SurveyScores,
    };
    use crate::diagnostic::scoring::evaluate;
    use serde_json::{json, Value};

    fn record() -> DiagnosticRecord {
        let mut result = evaluate(
            &FinancialInputs {
                monthly_revenue: 100_000.0,
                cogs: 30_000.0,
                labor_cost: 20_000.0,
                rent: 10_000.0,
                utilities_and_fixed: 5_000.0,
            },
            &SurveyScores::uniform(SurveyScore::new(4).unwrap()),
        );
        result.lead = Some(LeadContact {
            contact_name: "Ana".to_string(),
            contact_email: "ana@example.com".to_string(),
            business_name: "La Esquina".to_string(),
            ..LeadContact::default()
        });
        DiagnosticRecord::new(result)
    }

    #[test]
    fn full_payload_carries_id_and_result_columns() {
        let record = record();
        let row = full_payload(&record);
        assert_eq!(row["id"], record.id.to_string());
        assert_eq!(row["status"], "GREEN");
        assert_eq!(row["contact_name"], "Ana");
        assert!(row.get("full_data").is_none());
    }

    #[test]
    fn reduced_payload_embeds_record_as_string() {
        let record = record();
        let row = reduced_payload(&record).unwrap();
        let object = row.as_object().unwrap();
        let mut keys = object.keys().cloned().collect::<Vec<_>>();
        keys.sort();
        assert_eq!(
            keys,
            vec!["business_name", "contact_email", "contact_name", "full_data", "source"]
        );
        assert_eq!(row["source"], SOURCE_FALLBACK);

        let blob = row["full_data"].as_str().unwrap();
        let decoded: DiagnosticRecord = serde_json::from_str(blob).unwrap();
        assert_eq!(decoded.id, record.id);
        assert_eq!(decoded.result.status, record.result.status);
        assert_eq!(decoded.result.lead, record.result.lead);
        assert_eq!(decoded.result.priorities, record.result.priorities);
    }

    #[test]
    fn summary_from_reduced_row_reads_blob() {
        let record = record();
        let summary = LeadSummary::from_row(&reduced_payload(&record).unwrap());
        assert_eq!(summary.id, Some(record.id.to_string()));
        assert_eq!(summary.status, Some(DiagnosticStatus::Green));
        assert_eq!(summary.profile_name, record.result.profile_name);
        assert_eq!(summary.contact_name, "Ana");
        assert!((summary.cogs_percentage - 30.0).abs() < 1e-9);
    }

    #[test]
    fn summary_columns_win_over_blob_and_defaults_apply() {
        let row = json!({
            "id": "row-1",
            "status": "red",
            "score_global": 42.0,
            "full_data": {"status": "GREEN", "scoreGlobal": 90.0, "profileName": "From blob"}
        });
        let summary = LeadSummary::from_row(&row);
        assert_eq!(summary.status, Some(DiagnosticStatus::Red));
        assert_eq!(summary.score_global, 42.0);
        assert_eq!(summary.profile_name, "From blob");
        assert_eq!(summary.contact_name, "Anonymous");
        assert_eq!(summary.contact_email, "");

        let bare = LeadSummary::from_row(&Value::Null);
        assert_eq!(bare.id, None);
        assert_eq!(bare.score_global, 0.0);
    }
}

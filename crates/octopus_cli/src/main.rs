//! Command-line front end for `octopus_core`.
//!
//! # Responsibility
//! - Run diagnostics and calendar flows against the same cache database and
//!   remote backend the app uses.
//! - Print human-readable output, or JSON with `--json`.

use anyhow::{bail, Context};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use octopus_core::db::open_db;
use octopus_core::diagnostic::{LeadSource, RemoteArchive};
use octopus_core::{
    evaluate_submission, BusinessType, CalendarService, CoreConfig, DiagnosticArchive,
    DiagnosticResult, DiagnosticSubmission, EventType, FinancialInputs, LeadContact,
    MemoryCacheStore, NewCalendarEvent, RemoteBackend, SqliteCacheStore, SurveyScores,
};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "octopus")]
#[command(version, about = "Business diagnostic and shared calendar, local-first")]
struct Cli {
    /// Cache database file
    #[arg(long, env = "OCTOPUS_DB_PATH", global = true)]
    db: Option<PathBuf>,

    /// Skip the remote store even when one is configured
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print core linkage info
    Ping,
    /// Score a business and archive the result
    Diagnose(DiagnoseArgs),
    /// Shared calendar events
    #[command(subcommand)]
    Events(EventsCommand),
    /// Stored diagnostics
    #[command(subcommand)]
    Leads(LeadsCommand),
}

#[derive(Args)]
struct DiagnoseArgs {
    /// Monthly revenue
    #[arg(long)]
    revenue: f64,
    /// Cost of goods sold
    #[arg(long)]
    cogs: f64,
    /// Labor cost
    #[arg(long)]
    labor: f64,
    #[arg(long, default_value_t = 0.0)]
    rent: f64,
    /// Utilities and other fixed costs
    #[arg(long, default_value_t = 0.0)]
    utilities: f64,
    /// Seven answers 1-5: order,technology,observation,pragmatism,creativity,universality,subtlety
    #[arg(long, value_delimiter = ',', required = true)]
    survey: Vec<u8>,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    business: Option<String>,
    #[arg(long)]
    business_type: Option<String>,
    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum EventsCommand {
    /// Sync and list events
    List {
        #[arg(long)]
        json: bool,
    },
    /// Create an event
    Add {
        #[arg(long)]
        title: String,
        /// RFC 3339 timestamp or YYYY-MM-DD
        #[arg(long, value_parser = parse_datetime)]
        start: DateTime<Utc>,
        #[arg(long, value_parser = parse_datetime)]
        end: Option<DateTime<Utc>>,
        /// holiday | commercial | internal
        #[arg(long, default_value = "internal", value_parser = parse_kind)]
        kind: EventType,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete an event by id
    Delete { id: Uuid },
    /// Re-send every cached event to the remote store
    Push,
}

#[derive(Subcommand)]
enum LeadsCommand {
    /// List stored diagnostics, remote first
    List {
        #[arg(long)]
        json: bool,
    },
    /// Re-send the local diagnostic history to the remote store
    Push,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = CoreConfig::from_env()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(log_dir) = &config.log_dir {
        octopus_core::init_logging(config.log_level, &log_dir.to_string_lossy())
            .map_err(anyhow::Error::msg)
            .context("logging setup failed")?;
    }
    let remote = if cli.offline {
        RemoteBackend::Offline
    } else {
        config.remote_backend()
    };

    match cli.command {
        Command::Ping => {
            println!("octopus_core ping={}", octopus_core::ping());
            println!("octopus_core version={}", octopus_core::core_version());
            println!(
                "remote={}",
                if remote.is_offline() { "offline" } else { "configured" }
            );
            Ok(())
        }
        Command::Diagnose(args) => diagnose(&config, remote, args),
        Command::Events(command) => events(&config, remote, command),
        Command::Leads(command) => leads(&config, remote, command),
    }
}

fn diagnose(config: &CoreConfig, remote: RemoteBackend, args: DiagnoseArgs) -> anyhow::Result<()> {
    let answers: [u8; 7] = match args.survey.as_slice().try_into() {
        Ok(answers) => answers,
        Err(_) => bail!("--survey needs 7 answers, got {}", args.survey.len()),
    };
    let lead = if args.name.is_some() || args.email.is_some() || args.business.is_some() {
        Some(LeadContact {
            contact_name: args.name.unwrap_or_default(),
            contact_email: args.email.unwrap_or_default(),
            business_name: args.business.unwrap_or_default(),
            business_type: args
                .business_type
                .as_deref()
                .map(BusinessType::parse)
                .unwrap_or_default(),
            ..LeadContact::default()
        })
    } else {
        None
    };
    let submission = DiagnosticSubmission {
        financials: FinancialInputs {
            monthly_revenue: args.revenue,
            cogs: args.cogs,
            labor_cost: args.labor,
            rent: args.rent,
            utilities_and_fixed: args.utilities,
        },
        survey: SurveyScores::from_values(answers)?,
        lead,
    };
    let result = evaluate_submission(&submission);

    // The remote insert is attempted even without a usable cache file.
    let receipt = match open_db(&config.db_path) {
        Ok(conn) => DiagnosticArchive::new(SqliteCacheStore::new(&conn), remote).finalize(result),
        Err(err) => {
            eprintln!("warning: cache database unavailable: {err}");
            DiagnosticArchive::new(MemoryCacheStore::new(), remote).finalize(result)
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&receipt.record)?);
        return Ok(());
    }
    print_result(&receipt.record.result);
    let remote_note = match &receipt.remote {
        RemoteArchive::Stored => "stored remotely".to_string(),
        RemoteArchive::StoredReduced { full_error } => {
            format!("stored remotely in reduced form ({})", full_error.code())
        }
        RemoteArchive::NotStored { full_error, .. } => {
            format!("kept on this device only ({})", full_error.code())
        }
    };
    println!();
    println!("record {} {remote_note}", receipt.record.id);
    if let Err(err) = &receipt.local {
        eprintln!("warning: local cache write failed: {err}");
    }
    Ok(())
}

fn print_result(result: &DiagnosticResult) {
    println!("status      {}", result.status.as_str());
    println!("profile     {}", result.profile_name);
    println!("            {}", result.profile_description);
    println!(
        "costs       cogs {:.1}%  labor {:.1}%  fixed {:.1}%  margin {:.1}%",
        result.cogs_percentage,
        result.labor_percentage,
        result.fixed_percentage,
        result.margin_percentage
    );
    println!(
        "scores      financial {:.1}  7P {:.1}  global {:.1}",
        result.score_financial, result.score_7p, result.score_global
    );
    if !result.strengths.is_empty() {
        println!("strengths");
        for strength in &result.strengths {
            println!("  + {strength}");
        }
    }
    if !result.priorities.is_empty() {
        println!("priorities");
        for (index, priority) in result.priorities.iter().enumerate() {
            println!("  {}. {priority}", index + 1);
        }
    }
}

fn events(config: &CoreConfig, remote: RemoteBackend, command: EventsCommand) -> anyhow::Result<()> {
    let conn = open_db(&config.db_path).context("cache database unavailable")?;
    let service = CalendarService::new(SqliteCacheStore::new(&conn), remote);

    match command {
        EventsCommand::List { json } => {
            let read = service.list_events();
            if json {
                println!("{}", serde_json::to_string_pretty(&read.items)?);
                return Ok(());
            }
            if read.is_fallback() {
                println!("(offline: cached events)");
            }
            for event in &read.items {
                let end = event
                    .end_date
                    .map(|end| format!(" -> {}", end.to_rfc3339()))
                    .unwrap_or_default();
                println!(
                    "{}  {}{}  [{}]  {}",
                    event.id,
                    event.start_date.to_rfc3339(),
                    end,
                    event.kind.as_str(),
                    event.title
                );
            }
        }
        EventsCommand::Add {
            title,
            start,
            end,
            kind,
            description,
        } => {
            let outcome = service.create_event(NewCalendarEvent {
                title,
                description,
                start_date: start,
                end_date: end,
                kind,
                author_id: None,
            })?;
            let state = if outcome.is_confirmed() {
                "synced"
            } else {
                "saved locally"
            };
            println!("{} {state}", outcome.value.id);
        }
        EventsCommand::Delete { id } => {
            let outcome = service.delete_event(id);
            match (outcome.value, outcome.remote) {
                (false, _) => println!("{id} was not cached"),
                (true, Ok(())) => println!("{id} deleted"),
                (true, Err(err)) => println!("{id} deleted locally ({})", err.code()),
            }
        }
        EventsCommand::Push => {
            let count = service.push_local_events()?;
            println!("pushed {count} event(s)");
        }
    }
    Ok(())
}

fn leads(config: &CoreConfig, remote: RemoteBackend, command: LeadsCommand) -> anyhow::Result<()> {
    let conn = open_db(&config.db_path).context("cache database unavailable")?;
    let archive = DiagnosticArchive::new(SqliteCacheStore::new(&conn), remote);

    match command {
        LeadsCommand::List { json } => {
            let listing = archive.leads();
            if json {
                println!("{}", serde_json::to_string_pretty(&listing.leads)?);
                return Ok(());
            }
            if let LeadSource::LocalHistory(err) = &listing.source {
                println!("(remote unavailable: {}; showing local history)", err.code());
            }
            for lead in &listing.leads {
                println!(
                    "{}  {:<6}  {:>5.1}  {}  <{}>  {}",
                    lead.recorded_at
                        .map(|at| at.format("%Y-%m-%d").to_string())
                        .unwrap_or_else(|| "----------".to_string()),
                    lead.status.map_or("?", |status| status.as_str()),
                    lead.score_global,
                    lead.business_name,
                    lead.contact_email,
                    lead.profile_name
                );
            }
        }
        LeadsCommand::Push => {
            let count = archive.push_history()?;
            println!("pushed {count} diagnostic(s)");
        }
    }
    Ok(())
}

fn parse_datetime(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("`{value}` is neither RFC 3339 nor YYYY-MM-DD"))
}

fn parse_kind(value: &str) -> Result<EventType, String> {
    EventType::parse(value)
        .ok_or_else(|| format!("`{value}` must be one of holiday, commercial, internal"))
}

#[cfg(test)]
mod tests {
    use super::{parse_datetime, parse_kind, Cli};
    use clap::CommandFactory;
    use octopus_core::EventType;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn datetime_accepts_rfc3339_and_plain_dates() {
        let full = parse_datetime("2026-12-24T09:30:00+01:00").unwrap();
        assert_eq!(full.to_rfc3339(), "2026-12-24T08:30:00+00:00");
        let date = parse_datetime("2026-12-24").unwrap();
        assert_eq!(date.to_rfc3339(), "2026-12-24T00:00:00+00:00");
        assert!(parse_datetime("24/12/2026").is_err());
    }

    #[test]
    fn kind_parsing_rejects_unknown_labels() {
        assert_eq!(parse_kind("Holiday").unwrap(), EventType::Holiday);
        assert!(parse_kind("birthday").is_err());
    }
}

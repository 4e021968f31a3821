//! Practice Ledger
//!
//! Monthly receipts, therapist payouts and recurring schedules for a
//! therapy practice, driven from CSV appointment files and a TOML roster.

mod config;
mod constants;
mod ledger;
mod reports;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use practice_billing::reconcile::{match_client, match_therapist};
use practice_billing::{
    generate_report, generate_schedule, ClientId, DateRange, NameMatch, PartyFilter, ReportRequest,
    ScheduleRequest, SortDirection, SortField, SortState, TherapistId, YearMonth,
};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use config::{FileConfig, Roster};

/// Load config file or exit with helpful message
fn load_config_file(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        anyhow::bail!(
            "Config file '{}' not found.\n\n\
            To get started:\n\
            1. Copy config.toml.example to config.toml\n\
            2. Copy roster.toml.example to roster.toml and list your clients, therapists and services\n\n\
            See config.toml.example for the required format.",
            path.display()
        );
    }

    FileConfig::load(path)
}

#[derive(Parser, Debug)]
#[command(name = "practice-ledger")]
#[command(about = "Billing and scheduling for a therapy practice")]
struct Args {
    /// Config file
    #[arg(short, long, default_value = constants::CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Output directory for generated reports
    #[arg(short, long, default_value = "./output", global = true)]
    output_dir: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build receipts and totals for one month
    Report {
        /// Appointments CSV
        #[arg(short, long)]
        appointments: PathBuf,

        /// Month to bill (YYYY-MM)
        #[arg(short, long)]
        month: String,

        /// Therapist name, or "all"
        #[arg(long, default_value = constants::ALL_FILTER)]
        therapist: String,

        /// Client name, or "all"
        #[arg(long, default_value = constants::ALL_FILTER)]
        client: String,

        /// Order receipt lines by column (date, duration, therapy-type, therapist, price, tax, total, therapist-cost)
        #[arg(long)]
        sort: Option<String>,

        /// Sort descending
        #[arg(long, requires = "sort")]
        desc: bool,

        /// Print the report as JSON instead of writing files
        #[arg(long)]
        json: bool,
    },

    /// Generate draft appointments from weekly slots
    Schedule {
        /// First day (YYYY-MM-DD)
        #[arg(long)]
        from: String,

        /// Last day, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: String,

        /// Slots file
        #[arg(long, default_value = "slots.toml")]
        slots: PathBuf,

        /// Output CSV (defaults to the output directory)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Match an imported name-only schedule against the roster
    Reconcile {
        /// Import CSV with client and therapist names
        file: PathBuf,

        /// Accept close (non-exact) name matches instead of listing them for review
        #[arg(long)]
        accept_fuzzy: bool,

        /// Output CSV (defaults to the output directory)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// List services in display order
    Services,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let file_config = load_config_file(&args.config)?;
    let roster = Roster::load(&file_config.files.roster)?;

    match args.command {
        Command::Report { appointments, month, therapist, client, sort, desc, json } => {
            let month: YearMonth = month.parse()?;
            let therapist = therapist_filter(&therapist, &roster)?;
            let client = client_filter(&client, &roster)?;
            let sort = sort_state(sort.as_deref(), desc);
            run_report(&args.output_dir, &file_config, &roster, &appointments, month, therapist, client, sort, json)
        }
        Command::Schedule { from, to, slots, out } => {
            let range = DateRange::new(parse_date(&from)?, parse_date(&to)?)?;
            let out = out.unwrap_or_else(|| args.output_dir.join(constants::DRAFTS_FILENAME));
            run_schedule(&file_config, &roster, range, &slots, &out)
        }
        Command::Reconcile { file, accept_fuzzy, out } => {
            let out = out.unwrap_or_else(|| args.output_dir.join(constants::RECONCILED_FILENAME));
            run_reconcile(&roster, &file, accept_fuzzy, &out)
        }
        Command::Services => {
            list_services(&roster);
            Ok(())
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_report(
    output_dir: &Path,
    file_config: &FileConfig,
    roster: &Roster,
    appointments_path: &Path,
    month: YearMonth,
    therapist: PartyFilter<TherapistId>,
    client: PartyFilter<ClientId>,
    sort: SortState,
    json: bool,
) -> Result<()> {
    let appointments = ledger::load_appointments(appointments_path)?;
    tracing::info!(count = appointments.len(), path = %appointments_path.display(), "Loaded appointments");

    let request = ReportRequest { appointments: &appointments, clients: &roster.clients, month, therapist, client };
    let mut report = generate_report(&request, &file_config.billing);
    for receipt in &mut report.receipts {
        sort.apply(&mut receipt.lines);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;
    println!("\nGenerating reports...");
    reports::generate_all_reports(output_dir, &report)?;
    reports::print_summary(&report);

    Ok(())
}

fn run_schedule(
    file_config: &FileConfig,
    roster: &Roster,
    range: DateRange,
    slots_path: &Path,
    out: &Path,
) -> Result<()> {
    let slots = ledger::load_slots(slots_path)?;
    let request = ScheduleRequest { range, slots: &slots };
    let schedule = generate_schedule(
        &request,
        &roster.clients,
        &roster.therapists,
        &roster.rate_table(),
        &file_config.billing,
    )?;

    ensure_parent_dir(out)?;
    ledger::export_appointments(&schedule.drafts, out)?;

    println!(
        "Generated {} draft appointment(s) from {} to {}",
        schedule.drafts.len(),
        range.start,
        range.end
    );
    println!("  Generated: {}", out.display());

    if !schedule.skipped.is_empty() {
        println!("\nSkipped slots:");
        for skipped in &schedule.skipped {
            println!(
                "  #{:<3} {} / {}: {}",
                skipped.slot_index + 1,
                skipped.therapist_id,
                skipped.client_id,
                skipped.reason
            );
        }
    }

    Ok(())
}

fn run_reconcile(roster: &Roster, file: &Path, accept_fuzzy: bool, out: &Path) -> Result<()> {
    let rows = ledger::load_import_rows(file)?;
    let reconciled = ledger::reconcile_rows(&rows, &roster.clients, &roster.therapists, accept_fuzzy);

    ensure_parent_dir(out)?;
    ledger::export_appointments(&reconciled.appointments, out)?;

    println!("Matched {} of {} row(s)", reconciled.appointments.len(), rows.len());
    println!("  Generated: {}", out.display());

    if !reconciled.unresolved.is_empty() {
        println!("\nNeeds attention:");
        for unresolved in &reconciled.unresolved {
            println!("  row {:<4} {}", unresolved.row, unresolved.reason);
        }
    }

    Ok(())
}

fn list_services(roster: &Roster) {
    let services = roster.services_sorted();
    if services.is_empty() {
        println!("No services configured.");
        return;
    }

    println!("{:<5} {:<30} {:>12} {:>8}", "Order", "Service", "Price/hour", "Active");
    println!("{}", "-".repeat(58));
    for service in services {
        println!(
            "{:<5} {:<30} {:>12.2} {:>8}",
            service.order,
            service.name,
            service.base_price,
            if service.active { "yes" } else { "no" }
        );
    }
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, practice_billing::constants::DATE_FORMAT)
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", value))
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

fn sort_state(sort: Option<&str>, desc: bool) -> SortState {
    let Some(name) = sort else {
        return SortState::default();
    };
    let field = SortField::parse(name);
    if field.is_none() {
        tracing::warn!(column = name, "Unknown sort column, keeping date order");
    }
    let direction = if desc { SortDirection::Desc } else { SortDirection::Asc };
    SortState { field, direction }
}

fn therapist_filter(name: &str, roster: &Roster) -> Result<PartyFilter<TherapistId>> {
    if is_all(name) {
        return Ok(PartyFilter::All);
    }
    let roster_name = |id: &TherapistId| {
        roster.therapists.iter().find(|t| &t.id == id).map(|t| t.name.clone())
    };
    resolve_name("therapist", name, match_therapist(name, &roster.therapists), roster_name).map(PartyFilter::Only)
}

fn client_filter(name: &str, roster: &Roster) -> Result<PartyFilter<ClientId>> {
    if is_all(name) {
        return Ok(PartyFilter::All);
    }
    let roster_name = |id: &ClientId| roster.clients.iter().find(|c| &c.id == id).map(|c| c.name.clone());
    resolve_name("client", name, match_client(name, &roster.clients), roster_name).map(PartyFilter::Only)
}

fn is_all(name: &str) -> bool {
    name.trim().eq_ignore_ascii_case(constants::ALL_FILTER)
}

/// Turn a name on the command line into an id
///
/// Only exact matches (ignoring case, accents and spacing) are accepted. A
/// close match is reported back as a suggestion.
fn resolve_name<Id: Display>(
    role: &str,
    name: &str,
    result: NameMatch<Id>,
    roster_name: impl Fn(&Id) -> Option<String>,
) -> Result<Id> {
    match result {
        NameMatch::Exact(id) => Ok(id),
        NameMatch::Fuzzy { id, .. } => {
            let suggestion = roster_name(&id).unwrap_or_else(|| id.to_string());
            anyhow::bail!("No {} named '{}' in the roster. Did you mean '{}'?", role, name, suggestion)
        }
        NameMatch::Ambiguous(ids) => {
            let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
            anyhow::bail!("{} '{}' matches several entries: {}", role, name, ids.join(", "))
        }
        NameMatch::NoMatch => anyhow::bail!("No {} named '{}' in the roster", role, name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use practice_billing::{Client, Therapist};

    #[test]
    fn test_sort_state_from_flags() {
        assert_eq!(sort_state(None, false), SortState::default());
        assert_eq!(
            sort_state(Some("therapist-cost"), true),
            SortState { field: Some(SortField::TherapistCost), direction: SortDirection::Desc }
        );
        assert_eq!(sort_state(Some("color"), false).field, None);
    }

    fn roster() -> Roster {
        Roster {
            clients: vec![
                Client {
                    id: "maria".into(),
                    name: "María López".to_string(),
                    code: "C-001".to_string(),
                    custom_rates: Default::default(),
                },
                Client {
                    id: "juan".into(),
                    name: "Juan Pérez".to_string(),
                    code: "C-002".to_string(),
                    custom_rates: Default::default(),
                },
            ],
            therapists: vec![Therapist {
                id: "ana".into(),
                name: "Ana García".to_string(),
                costs_by_client: Default::default(),
                costs_by_service: Default::default(),
            }],
            services: Vec::new(),
        }
    }

    #[test]
    fn test_resolve_name() {
        let no_name = |_: &&str| -> Option<String> { None };
        assert_eq!(resolve_name("client", "x", NameMatch::Exact("c1"), no_name).unwrap(), "c1");
        assert!(resolve_name::<&str>("client", "x", NameMatch::NoMatch, no_name).is_err());
        assert!(resolve_name("client", "x", NameMatch::Ambiguous(vec!["c1", "c2"]), no_name).is_err());
        assert!(resolve_name("client", "x", NameMatch::Fuzzy { id: "c1", score: 90 }, no_name).is_err());
    }

    #[test]
    fn test_filters_accept_exact_names_only() {
        let roster = roster();
        assert_eq!(client_filter("maria lopez", &roster).unwrap(), PartyFilter::Only(ClientId::from("maria")));
        assert_eq!(therapist_filter("ANA GARCIA", &roster).unwrap(), PartyFilter::Only(TherapistId::from("ana")));

        let err = client_filter("Mario", &roster).unwrap_err().to_string();
        assert!(err.contains("No client named 'Mario'"), "{}", err);

        let err = client_filter("Maria", &roster).unwrap_err().to_string();
        assert!(err.contains("Did you mean 'María López'?"), "{}", err);

        assert!(therapist_filter("Ana", &roster).is_err());
    }

    #[test]
    fn test_all_filter_is_case_insensitive() {
        let roster = Roster::default();
        assert_eq!(therapist_filter("ALL", &roster).unwrap(), PartyFilter::All);
        assert!(client_filter("Juan", &roster).is_err());
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "practice-ledger",
            "report",
            "--appointments",
            "appointments.csv",
            "--month",
            "2024-01",
            "--sort",
            "price",
            "--desc",
        ])
        .unwrap();
        match args.command {
            Command::Report { month, therapist, sort, desc, .. } => {
                assert_eq!(month, "2024-01");
                assert_eq!(therapist, "all");
                assert_eq!(sort.as_deref(), Some("price"));
                assert!(desc);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}

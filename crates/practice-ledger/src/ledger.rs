//! Appointment files: CSV in and out, imported name-only rows, weekly slots

use anyhow::{Context, Result};
use chrono::NaiveDate;
use practice_billing::reconcile::{match_client, match_therapist};
use practice_billing::{Appointment, AppointmentId, AppointmentStatus, Client, NameMatch, Therapist, WeeklySlot};
use serde::Deserialize;
use std::path::Path;

/// Load appointments from a CSV file
pub fn load_appointments(path: &Path) -> Result<Vec<Appointment>> {
    let mut rdr =
        csv::Reader::from_path(path).with_context(|| format!("Failed to open appointments file: {}", path.display()))?;
    let mut appointments = Vec::new();
    for (line, result) in rdr.deserialize().enumerate() {
        let appointment: Appointment =
            result.with_context(|| format!("Invalid appointment on row {} of {}", line + 1, path.display()))?;
        appointments.push(appointment);
    }
    Ok(appointments)
}

/// Write appointments to a CSV file
pub fn export_appointments(appointments: &[Appointment], path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for appointment in appointments {
        wtr.serialize(appointment)?;
    }
    wtr.flush()?;
    Ok(())
}

// =============================================================================
// Imported schedules (names only)
// =============================================================================

/// A row from an externally prepared schedule, before names are matched
#[derive(Debug, Clone, Deserialize)]
pub struct ImportRow {
    #[serde(default)]
    pub id: Option<String>,
    pub date: NaiveDate,
    pub client: String,
    pub therapist: String,
    pub start_time: String,
    pub end_time: String,
    pub status: AppointmentStatus,
    pub therapy_type: String,
    #[serde(default)]
    pub client_rate: Option<f64>,
    #[serde(default)]
    pub client_total: Option<f64>,
    #[serde(default)]
    pub therapist_rate: Option<f64>,
    #[serde(default)]
    pub therapist_total: Option<f64>,
}

/// A row that could not be tied to the roster
#[derive(Debug, Clone, PartialEq)]
pub struct UnresolvedRow {
    /// 1-based data row
    pub row: usize,
    pub reason: String,
}

/// Imported rows split into usable appointments and rows needing attention
#[derive(Debug, Default)]
pub struct Reconciled {
    pub appointments: Vec<Appointment>,
    pub unresolved: Vec<UnresolvedRow>,
}

pub fn load_import_rows(path: &Path) -> Result<Vec<ImportRow>> {
    let mut rdr =
        csv::Reader::from_path(path).with_context(|| format!("Failed to open import file: {}", path.display()))?;
    let mut rows = Vec::new();
    for (line, result) in rdr.deserialize().enumerate() {
        let row: ImportRow = result.with_context(|| format!("Invalid row {} in {}", line + 1, path.display()))?;
        rows.push(row);
    }
    Ok(rows)
}

/// Match imported names to roster ids
///
/// Exact matches are accepted. Close (fuzzy) matches are accepted only with
/// `accept_fuzzy`; otherwise they are listed for review like ambiguous and
/// unmatched names, and the row is left out.
pub fn reconcile_rows(
    rows: &[ImportRow],
    clients: &[Client],
    therapists: &[Therapist],
    accept_fuzzy: bool,
) -> Reconciled {
    let mut reconciled = Reconciled::default();

    for (index, row) in rows.iter().enumerate() {
        let row_number = index + 1;

        let client_match = match_client(&row.client, clients);
        let therapist_match = match_therapist(&row.therapist, therapists);

        let client_id = usable_id(&client_match, accept_fuzzy);
        let therapist_id = usable_id(&therapist_match, accept_fuzzy);

        let (client_id, therapist_id) = match (client_id, therapist_id) {
            (Some(c), Some(t)) => (c.clone(), t.clone()),
            (client_id, therapist_id) => {
                let mut problems = Vec::new();
                if client_id.is_none() {
                    problems.push(describe("client", &row.client, &client_match, |id| {
                        clients.iter().find(|c| &c.id == id).map(|c| c.name.clone())
                    }));
                }
                if therapist_id.is_none() {
                    problems.push(describe("therapist", &row.therapist, &therapist_match, |id| {
                        therapists.iter().find(|t| &t.id == id).map(|t| t.name.clone())
                    }));
                }
                let reason = problems.join("; ");
                tracing::warn!(row = row_number, %reason, "Skipping imported row");
                reconciled.unresolved.push(UnresolvedRow { row: row_number, reason });
                continue;
            }
        };

        if let NameMatch::Fuzzy { score, .. } = &client_match {
            tracing::warn!(
                row = row_number,
                name = %row.client,
                id = %client_id,
                score,
                "Accepted close client match"
            );
        }
        if let NameMatch::Fuzzy { score, .. } = &therapist_match {
            tracing::warn!(
                row = row_number,
                name = %row.therapist,
                id = %therapist_id,
                score,
                "Accepted close therapist match"
            );
        }

        // Roster names replace whatever spelling the import used
        let client_name = clients
            .iter()
            .find(|c| c.id == client_id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| row.client.clone());
        let therapist_name = therapists
            .iter()
            .find(|t| t.id == therapist_id)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| row.therapist.clone());

        reconciled.appointments.push(Appointment {
            id: row.id.clone().map(AppointmentId::from),
            date: row.date,
            client_id,
            client_name,
            therapist_id,
            therapist_name,
            start_time: row.start_time.clone(),
            end_time: row.end_time.clone(),
            status: row.status.clone(),
            therapy_type: row.therapy_type.clone(),
            client_rate: row.client_rate,
            client_total: row.client_total,
            therapist_rate: row.therapist_rate,
            therapist_total: row.therapist_total,
        });
    }

    reconciled
}

/// The matched id, if this kind of match may be used
fn usable_id<Id>(result: &NameMatch<Id>, accept_fuzzy: bool) -> Option<&Id> {
    match result {
        NameMatch::Exact(id) => Some(id),
        NameMatch::Fuzzy { id, .. } if accept_fuzzy => Some(id),
        _ => None,
    }
}

fn describe<Id: std::fmt::Display>(
    role: &str,
    name: &str,
    result: &NameMatch<Id>,
    roster_name: impl Fn(&Id) -> Option<String>,
) -> String {
    match result {
        NameMatch::Ambiguous(ids) => {
            let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
            format!("{} '{}' is ambiguous ({})", role, name, ids.join(", "))
        }
        NameMatch::Fuzzy { id, .. } => {
            let suggestion = roster_name(id).unwrap_or_else(|| id.to_string());
            format!("{} '{}' is only a close match for '{}'", role, name, suggestion)
        }
        _ => format!("{} '{}' not found", role, name),
    }
}

// =============================================================================
// Weekly slots (slots.toml)
// =============================================================================

#[derive(Debug, Deserialize)]
struct SlotsFile {
    #[serde(default)]
    slots: Vec<WeeklySlot>,
}

pub fn load_slots(path: &Path) -> Result<Vec<WeeklySlot>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read slots file: {}", path.display()))?;
    let file: SlotsFile =
        toml::from_str(&content).with_context(|| format!("Failed to parse slots file: {}", path.display()))?;
    Ok(file.slots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use practice_billing::{ClientId, TherapistId};

    const APPOINTMENTS_CSV: &str = concat!(
        "id,date,client_id,client_name,therapist_id,therapist_name,start_time,end_time,",
        "status,therapy_type,client_rate,client_total,therapist_rate,therapist_total\n",
        "\
a1,2024-01-15,juan,Juan Pérez,ana,Ana García,09:00,11:00,completed,standard session,450,,200,400
,2024-01-16,juan,Juan Pérez,ana,Ana García,09:00,10:00,pending,standard session,,,,
a3,2024-01-17,juan,Juan Pérez,ana,Ana García,09:00,10:00,rescheduled,standard session,,,,
"
    );

    fn roster() -> (Vec<Client>, Vec<Therapist>) {
        let clients = vec![
            Client {
                id: "juan".into(),
                name: "Juan Pérez".to_string(),
                code: "C-001".to_string(),
                custom_rates: Default::default(),
            },
            Client {
                id: "ana-c".into(),
                name: "Ana Torres".to_string(),
                code: "C-002".to_string(),
                custom_rates: Default::default(),
            },
            Client {
                id: "ana-d".into(),
                name: "ana torres".to_string(),
                code: "C-003".to_string(),
                custom_rates: Default::default(),
            },
        ];
        let therapists = vec![Therapist {
            id: "ana".into(),
            name: "Ana García".to_string(),
            costs_by_client: Default::default(),
            costs_by_service: Default::default(),
        }];
        (clients, therapists)
    }

    fn import_row(client: &str, therapist: &str) -> ImportRow {
        ImportRow {
            id: None,
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            client: client.to_string(),
            therapist: therapist.to_string(),
            start_time: "09:00".to_string(),
            end_time: "10:00".to_string(),
            status: AppointmentStatus::Completed,
            therapy_type: "standard session".to_string(),
            client_rate: Some(450.0),
            client_total: None,
            therapist_rate: None,
            therapist_total: None,
        }
    }

    #[test]
    fn test_load_appointments_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("appointments.csv");
        std::fs::write(&path, APPOINTMENTS_CSV).unwrap();

        let appointments = load_appointments(&path).unwrap();
        assert_eq!(appointments.len(), 3);
        assert_eq!(appointments[0].id, Some("a1".into()));
        assert_eq!(appointments[0].client_rate, Some(450.0));
        assert_eq!(appointments[0].client_total, None);
        assert_eq!(appointments[0].therapist_total, Some(400.0));
        assert_eq!(appointments[1].id, None);
        assert_eq!(appointments[1].status, AppointmentStatus::Pending);
        assert_eq!(appointments[2].status, AppointmentStatus::Other("rescheduled".to_string()));
    }

    #[test]
    fn test_export_then_load_keeps_drafts() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("in.csv");
        let copy = dir.path().join("out.csv");
        std::fs::write(&source, APPOINTMENTS_CSV).unwrap();

        let appointments = load_appointments(&source).unwrap();
        export_appointments(&appointments, &copy).unwrap();
        assert_eq!(load_appointments(&copy).unwrap(), appointments);
        assert!(std::fs::read_to_string(&copy).unwrap().contains(",rescheduled,"));
    }

    #[test]
    fn test_reconcile_rows() {
        let (clients, therapists) = roster();
        let rows = vec![
            import_row("JUAN PEREZ", "ana garcia"),
            import_row("Ana Torres", "Ana García"),
            import_row("Roberto", "Ana García"),
        ];

        let reconciled = reconcile_rows(&rows, &clients, &therapists, false);

        assert_eq!(reconciled.appointments.len(), 1);
        let appt = &reconciled.appointments[0];
        assert_eq!(appt.client_id, ClientId::from("juan"));
        assert_eq!(appt.client_name, "Juan Pérez");
        assert_eq!(appt.therapist_id, TherapistId::from("ana"));

        assert_eq!(reconciled.unresolved.len(), 2);
        assert_eq!(reconciled.unresolved[0].row, 2);
        assert!(reconciled.unresolved[0].reason.contains("ambiguous"));
        assert_eq!(reconciled.unresolved[1].row, 3);
        assert!(reconciled.unresolved[1].reason.contains("not found"));
    }

    #[test]
    fn test_close_names_need_opt_in() {
        let (clients, therapists) = roster();
        let rows = vec![import_row("Juan", "Ana García"), import_row("Juana", "Ana García")];

        let strict = reconcile_rows(&rows, &clients, &therapists, false);
        assert!(strict.appointments.is_empty());
        assert_eq!(strict.unresolved.len(), 2);
        assert!(strict.unresolved[0].reason.contains("close match for 'Juan Pérez'"));
        assert!(strict.unresolved[1].reason.contains("not found"));

        let lenient = reconcile_rows(&rows, &clients, &therapists, true);
        assert_eq!(lenient.appointments.len(), 1);
        assert_eq!(lenient.appointments[0].client_id, ClientId::from("juan"));
        assert_eq!(lenient.appointments[0].client_name, "Juan Pérez");
        assert_eq!(lenient.unresolved.len(), 1);
        assert_eq!(lenient.unresolved[0].row, 2);
    }

    #[test]
    fn test_load_slots() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slots.toml");
        std::fs::write(
            &path,
            r#"
            [[slots]]
            therapist_id = "ana"
            client_id = "juan"
            weekdays = [3, 5]
            start_time = "16:00"
            end_time = "17:00"

            [[slots]]
            therapist_id = "ana"
            client_id = "maria"
            weekdays = [1]
            start_time = "10:00"
            end_time = "11:30"
            therapy_type = "couples"
            "#,
        )
        .unwrap();

        let slots = load_slots(&path).unwrap();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].weekdays, vec![3, 5]);
        assert_eq!(slots[0].therapy_type, None);
        assert_eq!(slots[1].therapy_type.as_deref(), Some("couples"));
    }
}

//! Selection of billable appointments for a month

use serde::Serialize;

use crate::model::{Appointment, ClientId, TherapistId, YearMonth};

/// Restrict a report to one therapist or client, or take everyone
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PartyFilter<Id> {
    All,
    Only(Id),
}

impl<Id: PartialEq> PartyFilter<Id> {
    pub fn matches(&self, id: &Id) -> bool {
        match self {
            PartyFilter::All => true,
            PartyFilter::Only(wanted) => wanted == id,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, PartyFilter::All)
    }
}

impl<Id> Default for PartyFilter<Id> {
    fn default() -> Self {
        PartyFilter::All
    }
}

/// Completed appointments in `month` for the selected therapist and client
///
/// Input order is preserved.
pub fn filter_month<'a>(
    appointments: &'a [Appointment],
    month: YearMonth,
    therapist: &PartyFilter<TherapistId>,
    client: &PartyFilter<ClientId>,
) -> Vec<&'a Appointment> {
    appointments
        .iter()
        .filter(|a| a.is_completed())
        .filter(|a| month.contains(a.date))
        .filter(|a| therapist.matches(&a.therapist_id))
        .filter(|a| client.matches(&a.client_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AppointmentStatus;
    use chrono::NaiveDate;

    fn appt(id: &str, date: &str, therapist: &str, client: &str, status: AppointmentStatus) -> Appointment {
        Appointment {
            id: Some(id.into()),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            client_id: client.into(),
            client_name: client.to_uppercase(),
            therapist_id: therapist.into(),
            therapist_name: therapist.to_uppercase(),
            start_time: "09:00".to_string(),
            end_time: "11:00".to_string(),
            status,
            therapy_type: "standard".to_string(),
            client_rate: Some(450.0),
            client_total: None,
            therapist_rate: None,
            therapist_total: None,
        }
    }

    fn sample() -> Vec<Appointment> {
        use AppointmentStatus::*;
        vec![
            appt("a1", "2024-01-15", "ana", "juan", Completed),
            appt("a2", "2024-01-15", "ana", "juan", Pending),
            appt("a3", "2024-01-31", "luis", "maria", Completed),
            appt("a4", "2024-02-01", "ana", "juan", Completed),
            appt("a5", "2023-12-31", "ana", "maria", Completed),
            appt("a6", "2024-01-01", "ana", "maria", Completed),
            appt("a7", "2024-01-20", "luis", "juan", Cancelled),
        ]
    }

    fn ids(filtered: &[&Appointment]) -> Vec<String> {
        filtered.iter().map(|a| a.id.as_ref().unwrap().to_string()).collect()
    }

    #[test]
    fn test_completed_in_month_only() {
        let appts = sample();
        let jan = "2024-01".parse().unwrap();
        let filtered = filter_month(&appts, jan, &PartyFilter::All, &PartyFilter::All);
        assert_eq!(ids(&filtered), vec!["a1", "a3", "a6"]);
    }

    #[test]
    fn test_pending_excluded_even_when_date_matches() {
        let appts = vec![appt("p", "2024-01-15", "ana", "juan", AppointmentStatus::Pending)];
        let filtered = filter_month(&appts, "2024-01".parse().unwrap(), &PartyFilter::All, &PartyFilter::All);
        assert!(filtered.is_empty());
    }

    #[test]
    fn test_therapist_and_client_filters() {
        let appts = sample();
        let jan = "2024-01".parse().unwrap();

        let by_ana = filter_month(&appts, jan, &PartyFilter::Only("ana".into()), &PartyFilter::All);
        assert_eq!(ids(&by_ana), vec!["a1", "a6"]);

        let by_maria = filter_month(&appts, jan, &PartyFilter::All, &PartyFilter::Only("maria".into()));
        assert_eq!(ids(&by_maria), vec!["a3", "a6"]);

        let both = filter_month(&appts, jan, &PartyFilter::Only("luis".into()), &PartyFilter::Only("juan".into()));
        assert!(both.is_empty());
    }

    #[test]
    fn test_filter_is_idempotent() {
        let appts = sample();
        let jan = "2024-01".parse().unwrap();
        let therapist = PartyFilter::Only(TherapistId::from("ana"));

        let once: Vec<Appointment> = filter_month(&appts, jan, &therapist, &PartyFilter::All)
            .into_iter()
            .cloned()
            .collect();
        let twice = filter_month(&once, jan, &therapist, &PartyFilter::All);
        assert_eq!(ids(&twice), once.iter().map(|a| a.id.as_ref().unwrap().to_string()).collect::<Vec<_>>());
    }
}

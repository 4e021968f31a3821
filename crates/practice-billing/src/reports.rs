//! Monthly report generation
//!
//! Filter -> group -> build -> summarize. Pure: the same inputs always give
//! the same report, and nothing is cached between runs.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::BillingConfig;
use crate::filter::{filter_month, PartyFilter};
use crate::model::{Appointment, Client, ClientId, TherapistId, YearMonth};
use crate::receipts::{build_receipts, Receipt, RejectedAppointment};
use crate::time_math::{margin_percent, round2};

/// Bundled report inputs to keep the entry point small
#[derive(Debug, Clone)]
pub struct ReportRequest<'a> {
    pub appointments: &'a [Appointment],
    pub clients: &'a [Client],
    pub month: YearMonth,
    pub therapist: PartyFilter<TherapistId>,
    pub client: PartyFilter<ClientId>,
}

/// Hours worked and payout owed to one therapist in the month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TherapistPayout {
    pub therapist_id: TherapistId,
    pub therapist_name: String,
    pub total_hours: f64,
    pub total_appointments: usize,
    pub total_cost: f64,
}

/// Everything billed in one month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyReport {
    pub month: YearMonth,
    pub month_label: String,
    pub receipts: Vec<Receipt>,
    pub therapist_filter: PartyFilter<TherapistId>,
    pub client_filter: PartyFilter<ClientId>,
    /// Appointments that passed the filter, including rejected ones
    pub total_appointments_all: usize,
    pub total_hours_all: f64,
    pub total_revenue_all: f64,
    pub total_therapist_cost_all: f64,
    pub total_profit_all: f64,
    pub margin_percent_all: f64,
    pub therapist_payouts: Vec<TherapistPayout>,
    pub rejected: Vec<RejectedAppointment>,
}

/// Build the report for one month
pub fn generate_report(request: &ReportRequest, config: &BillingConfig) -> MonthlyReport {
    let filtered = filter_month(request.appointments, request.month, &request.therapist, &request.client);
    tracing::debug!(
        month = %request.month,
        total = request.appointments.len(),
        billable = filtered.len(),
        "Filtered appointments"
    );

    let batch = build_receipts(&filtered, request.clients, request.month, config);

    let total_hours_all = round2(batch.receipts.iter().map(|r| r.total_hours).sum());
    let total_revenue_all = round2(batch.receipts.iter().map(|r| r.grand_total).sum());
    let total_therapist_cost_all = round2(batch.receipts.iter().map(|r| r.therapist_cost_total).sum());

    MonthlyReport {
        month: request.month,
        month_label: config.month_label(request.month),
        therapist_payouts: therapist_payouts(&batch.receipts),
        receipts: batch.receipts,
        therapist_filter: request.therapist.clone(),
        client_filter: request.client.clone(),
        total_appointments_all: filtered.len(),
        total_hours_all,
        total_revenue_all,
        total_therapist_cost_all,
        total_profit_all: round2(total_revenue_all - total_therapist_cost_all),
        margin_percent_all: round2(margin_percent(total_revenue_all, total_therapist_cost_all)),
        rejected: batch.rejected,
    }
}

/// Hours and payouts per therapist across all receipts, ordered by therapist id
pub fn therapist_payouts(receipts: &[Receipt]) -> Vec<TherapistPayout> {
    let mut payouts: BTreeMap<TherapistId, TherapistPayout> = BTreeMap::new();

    for line in receipts.iter().flat_map(|r| &r.lines) {
        let entry = payouts
            .entry(line.therapist_id.clone())
            .or_insert_with(|| TherapistPayout {
                therapist_id: line.therapist_id.clone(),
                therapist_name: line.therapist_name.clone(),
                total_hours: 0.0,
                total_appointments: 0,
                total_cost: 0.0,
            });
        entry.total_hours += line.duration_hours;
        entry.total_appointments += 1;
        entry.total_cost += line.therapist_cost;
    }

    payouts
        .into_values()
        .map(|mut p| {
            p.total_hours = round2(p.total_hours);
            p.total_cost = round2(p.total_cost);
            p
        })
        .collect()
}

//! Monthly receipts: one per client, built from filtered appointments
//!
//! Every monetary figure is rounded to cents at the moment it is computed,
//! and receipt totals are sums of the already rounded line values.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::BillingConfig;
use crate::constants;
use crate::model::{Appointment, AppointmentId, Client, ClientId, TherapistId, YearMonth};
use crate::time_math::{self, finite_or_zero, round2};

/// One billed appointment as it appears on a receipt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceiptLine {
    pub appointment_id: Option<AppointmentId>,
    pub date: NaiveDate,
    pub therapist_id: TherapistId,
    pub therapist_name: String,
    pub therapy_type: String,
    pub start_time: String,
    pub end_time: String,
    pub duration_hours: f64,
    /// Amount charged before tax
    pub price: f64,
    pub tax: f64,
    /// Price plus tax
    pub total: f64,
    pub therapist_cost: f64,
}

/// Billing statement for one client over one month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Receipt {
    pub client_id: ClientId,
    pub client_name: String,
    pub client_code: String,
    /// Billing month
    pub month: YearMonth,
    /// Lines in date order
    pub lines: Vec<ReceiptLine>,
    pub total_hours: f64,
    pub total_appointments: usize,
    pub subtotal: f64,
    pub tax: f64,
    pub grand_total: f64,
    pub therapist_cost_total: f64,
    pub profit: f64,
    pub margin_percent: f64,
}

/// An appointment the builder refused to bill
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedAppointment {
    pub appointment_id: Option<AppointmentId>,
    pub date: NaiveDate,
    pub client_id: ClientId,
    pub therapist_id: TherapistId,
    pub reason: String,
}

/// Receipts plus the appointments left out of them
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReceiptBatch {
    /// Ordered by client id
    pub receipts: Vec<Receipt>,
    pub rejected: Vec<RejectedAppointment>,
}

/// Running totals for one client while lines are collected
struct ClientBucket {
    client_id: ClientId,
    client_name: String,
    client_code: String,
    month: YearMonth,
    lines: Vec<ReceiptLine>,
}

impl ClientBucket {
    fn new(appointment: &Appointment, clients: &[Client], month: YearMonth) -> Self {
        let client = clients.iter().find(|c| c.id == appointment.client_id);
        Self {
            client_id: appointment.client_id.clone(),
            client_name: client
                .map(|c| c.name.clone())
                .unwrap_or_else(|| appointment.client_name.clone()),
            client_code: client
                .map(|c| c.code.clone())
                .unwrap_or_else(|| constants::UNKNOWN_CLIENT_CODE.to_string()),
            month,
            lines: Vec::new(),
        }
    }

    fn finish(mut self) -> Receipt {
        // Stable: same-day lines keep their input order
        self.lines.sort_by_key(|l| l.date);

        let total_hours = round2(self.lines.iter().map(|l| l.duration_hours).sum());
        let subtotal = round2(self.lines.iter().map(|l| l.price).sum());
        let tax = round2(self.lines.iter().map(|l| l.tax).sum());
        let grand_total = round2(self.lines.iter().map(|l| l.total).sum());
        let therapist_cost_total = round2(self.lines.iter().map(|l| l.therapist_cost).sum());

        Receipt {
            client_id: self.client_id,
            client_name: self.client_name,
            client_code: self.client_code,
            month: self.month,
            total_appointments: self.lines.len(),
            lines: self.lines,
            total_hours,
            subtotal,
            tax,
            grand_total,
            therapist_cost_total,
            profit: round2(grand_total - therapist_cost_total),
            margin_percent: round2(time_math::margin_percent(grand_total, therapist_cost_total)),
        }
    }
}

/// Price one appointment
///
/// Charge is the precomputed client total when present, else rate x hours,
/// else 0. Therapist cost is the precomputed payout or 0.
pub fn receipt_line(appointment: &Appointment, config: &BillingConfig) -> ReceiptLine {
    let hours = time_math::billable_hours(&appointment.start_time, &appointment.end_time);

    let chargeable = match (appointment.client_total, appointment.client_rate) {
        (Some(total), _) => total,
        (None, Some(rate)) => rate * hours,
        (None, None) => 0.0,
    };
    let price = round2(finite_or_zero(chargeable));
    let tax = round2(time_math::tax(price, config.tax_rate));
    let total = round2(price + tax);
    let therapist_cost = round2(finite_or_zero(appointment.therapist_total.unwrap_or(0.0)));

    ReceiptLine {
        appointment_id: appointment.id.clone(),
        date: appointment.date,
        therapist_id: appointment.therapist_id.clone(),
        therapist_name: appointment.therapist_name.clone(),
        therapy_type: appointment.therapy_type.clone(),
        start_time: appointment.start_time.clone(),
        end_time: appointment.end_time.clone(),
        duration_hours: hours,
        price,
        tax,
        total,
        therapist_cost,
    }
}

/// Group filtered appointments into one receipt per client for `month`
pub fn build_receipts(
    filtered: &[&Appointment],
    clients: &[Client],
    month: YearMonth,
    config: &BillingConfig,
) -> ReceiptBatch {
    let mut buckets: BTreeMap<ClientId, ClientBucket> = BTreeMap::new();
    let mut rejected = Vec::new();

    for appointment in filtered {
        if appointment.duration_hours().is_some_and(|h| h < 0.0) {
            tracing::warn!(
                appointment = ?appointment.id,
                date = %appointment.date,
                start = %appointment.start_time,
                end = %appointment.end_time,
                "Skipping appointment that ends before it starts"
            );
            rejected.push(RejectedAppointment {
                appointment_id: appointment.id.clone(),
                date: appointment.date,
                client_id: appointment.client_id.clone(),
                therapist_id: appointment.therapist_id.clone(),
                reason: format!("ends at {} before it starts at {}", appointment.end_time, appointment.start_time),
            });
            continue;
        }

        buckets
            .entry(appointment.client_id.clone())
            .or_insert_with(|| ClientBucket::new(appointment, clients, month))
            .lines
            .push(receipt_line(appointment, config));
    }

    ReceiptBatch {
        receipts: buckets.into_values().map(ClientBucket::finish).collect(),
        rejected,
    }
}

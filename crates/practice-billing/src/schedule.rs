//! Recurring schedule expansion
//!
//! Weekly slots (therapist + client + weekdays + times) are expanded over a
//! date range into draft appointments with resolved prices. Drafts are not
//! persisted here.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::BillingConfig;
use crate::costs::{CostResolver, RateTable, ResolvedCosts};
use crate::error::{BillingError, Result};
use crate::model::{self, Appointment, AppointmentStatus, Client, ClientId, Therapist, TherapistId};
use crate::time_math;

/// Inclusive range of calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        let range = Self { start, end };
        range.validate()?;
        Ok(range)
    }

    fn validate(&self) -> Result<()> {
        if self.end < self.start {
            return Err(BillingError::InvalidDateRange { start: self.start, end: self.end });
        }
        Ok(())
    }

    /// Every day from start to end, both included
    pub fn days(self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

/// A weekly recurring booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySlot {
    pub therapist_id: TherapistId,
    pub client_id: ClientId,
    /// Days of the week, 0 = Sunday .. 6 = Saturday
    pub weekdays: Vec<u8>,
    pub start_time: String,
    pub end_time: String,
    /// Therapy type; the configured default when absent
    #[serde(default)]
    pub therapy_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ScheduleRequest<'a> {
    pub range: DateRange,
    pub slots: &'a [WeeklySlot],
}

/// Why a slot produced no appointments
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SkipReason {
    UnknownClient,
    UnknownTherapist,
    InvalidTime(String),
    EndsBeforeStart,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnknownClient => write!(f, "client not found"),
            SkipReason::UnknownTherapist => write!(f, "therapist not found"),
            SkipReason::InvalidTime(t) => write!(f, "invalid time '{}'", t),
            SkipReason::EndsBeforeStart => write!(f, "ends before it starts"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedSlot {
    /// Position of the slot in the request
    pub slot_index: usize,
    pub therapist_id: TherapistId,
    pub client_id: ClientId,
    pub reason: SkipReason,
}

/// Drafts generated for a range, plus the slots that were left out
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeneratedSchedule {
    pub drafts: Vec<Appointment>,
    pub skipped: Vec<SkippedSlot>,
}

/// A slot whose parties and times checked out, with prices already resolved
struct ReadySlot<'a> {
    slot: &'a WeeklySlot,
    client: &'a Client,
    therapist: &'a Therapist,
    therapy_type: String,
    costs: ResolvedCosts,
}

/// Expand weekly slots over every day of the range
///
/// Slots referring to an unknown client or therapist, or with unusable
/// times, are skipped whole and reported in `skipped`.
pub fn generate_schedule(
    request: &ScheduleRequest,
    clients: &[Client],
    therapists: &[Therapist],
    rates: &RateTable,
    config: &BillingConfig,
) -> Result<GeneratedSchedule> {
    request.range.validate()?;

    let resolver = CostResolver::new(rates, config);
    let mut skipped = Vec::new();
    let mut ready = Vec::new();

    for (index, slot) in request.slots.iter().enumerate() {
        match prepare_slot(slot, clients, therapists, &resolver, config) {
            Ok(prepared) => ready.push(prepared),
            Err(reason) => {
                tracing::warn!(
                    slot = index,
                    therapist = %slot.therapist_id,
                    client = %slot.client_id,
                    %reason,
                    "Skipping recurring slot"
                );
                skipped.push(SkippedSlot {
                    slot_index: index,
                    therapist_id: slot.therapist_id.clone(),
                    client_id: slot.client_id.clone(),
                    reason,
                });
            }
        }
    }

    let mut drafts = Vec::new();
    for day in request.range.days() {
        let weekday = day.weekday().num_days_from_sunday();
        for entry in &ready {
            if entry.slot.weekdays.iter().any(|d| u32::from(*d) == weekday) {
                drafts.push(draft(entry, day));
            }
        }
    }

    tracing::debug!(
        start = %request.range.start,
        end = %request.range.end,
        drafts = drafts.len(),
        skipped = skipped.len(),
        "Expanded recurring schedule"
    );

    Ok(GeneratedSchedule { drafts, skipped })
}

fn prepare_slot<'a>(
    slot: &'a WeeklySlot,
    clients: &'a [Client],
    therapists: &'a [Therapist],
    resolver: &CostResolver,
    config: &BillingConfig,
) -> std::result::Result<ReadySlot<'a>, SkipReason> {
    let client = model::find_client(clients, &slot.client_id).ok_or(SkipReason::UnknownClient)?;
    let therapist = model::find_therapist(therapists, &slot.therapist_id).ok_or(SkipReason::UnknownTherapist)?;

    let start = time_math::parse_clock_time(&slot.start_time)
        .map_err(|_| SkipReason::InvalidTime(slot.start_time.clone()))?;
    let end =
        time_math::parse_clock_time(&slot.end_time).map_err(|_| SkipReason::InvalidTime(slot.end_time.clone()))?;
    if end < start {
        return Err(SkipReason::EndsBeforeStart);
    }

    for day in slot.weekdays.iter().filter(|d| **d > 6) {
        tracing::warn!(
            therapist = %slot.therapist_id,
            client = %slot.client_id,
            weekday = day,
            "Ignoring weekday outside 0-6"
        );
    }

    let therapy_type = slot
        .therapy_type
        .clone()
        .unwrap_or_else(|| config.default_therapy_type.clone());
    let hours = (end - start).num_minutes() as f64 / 60.0;
    let costs = resolver.resolve(client, therapist, &therapy_type, hours);

    Ok(ReadySlot { slot, client, therapist, therapy_type, costs })
}

fn draft(entry: &ReadySlot, date: NaiveDate) -> Appointment {
    Appointment {
        id: None,
        date,
        client_id: entry.client.id.clone(),
        client_name: entry.client.name.clone(),
        therapist_id: entry.therapist.id.clone(),
        therapist_name: entry.therapist.name.clone(),
        start_time: entry.slot.start_time.clone(),
        end_time: entry.slot.end_time.clone(),
        status: AppointmentStatus::Pending,
        therapy_type: entry.therapy_type.clone(),
        client_rate: Some(entry.costs.client_rate),
        client_total: Some(entry.costs.client_total),
        therapist_rate: Some(entry.costs.therapist_rate),
        therapist_total: Some(entry.costs.therapist_total),
    }
}

//! Practice records: appointments, clients, therapists and services
//!
//! Records link to each other by stable ids. Display names travel alongside
//! for presentation, but nothing in the engine matches on them.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::BillingError;
use crate::time_math;

// =============================================================================
// Identifiers
// =============================================================================

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Document id of a stored appointment
    AppointmentId
);
string_id!(
    /// Document id of a client
    ClientId
);
string_id!(
    /// Document id of a therapist
    TherapistId
);

// =============================================================================
// Calendar month
// =============================================================================

/// A calendar month such as `2024-01`
///
/// Compared against appointment dates by integer components only, so no
/// timezone can move a date into a neighbouring month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, BillingError> {
        if !(1..=12).contains(&month) {
            return Err(BillingError::InvalidYearMonth(format!("{:04}-{:02}", year, month)));
        }
        Ok(Self { year, month })
    }

    /// Check whether a date falls inside this month
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl FromStr for YearMonth {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BillingError::InvalidYearMonth(s.to_string());

        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.is_empty() || month.len() > 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;

        Self::new(year, month).map_err(|_| invalid())
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Appointments
// =============================================================================

/// Appointment lifecycle state
///
/// Only `Completed` appointments are billed. Any other state is kept verbatim
/// in `Other` so files round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AppointmentStatus {
    Pending,
    Completed,
    Cancelled,
    Other(String),
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Other(status) => status,
        }
    }
}

impl From<&str> for AppointmentStatus {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => AppointmentStatus::Pending,
            "completed" => AppointmentStatus::Completed,
            "cancelled" => AppointmentStatus::Cancelled,
            _ => AppointmentStatus::Other(s.trim().to_string()),
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AppointmentStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AppointmentStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(AppointmentStatus::from(s.as_str()))
    }
}

/// A therapy session between one client and one therapist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    /// Stored id (None for drafts not yet saved)
    #[serde(default)]
    pub id: Option<AppointmentId>,
    pub date: NaiveDate,
    pub client_id: ClientId,
    pub client_name: String,
    pub therapist_id: TherapistId,
    pub therapist_name: String,
    /// Start time, HH:MM (24h)
    pub start_time: String,
    /// End time, HH:MM (24h), same day as start
    pub end_time: String,
    pub status: AppointmentStatus,
    pub therapy_type: String,
    /// Hourly price charged to the client
    #[serde(default)]
    pub client_rate: Option<f64>,
    /// Precomputed client charge, wins over rate x duration
    #[serde(default)]
    pub client_total: Option<f64>,
    /// Hourly therapist payout
    #[serde(default)]
    pub therapist_rate: Option<f64>,
    /// Precomputed therapist payout
    #[serde(default)]
    pub therapist_total: Option<f64>,
}

impl Appointment {
    pub fn is_completed(&self) -> bool {
        self.status == AppointmentStatus::Completed
    }

    /// Session length in hours, or None when a time is unreadable
    pub fn duration_hours(&self) -> Option<f64> {
        time_math::duration_hours(&self.start_time, &self.end_time)
    }
}

// =============================================================================
// Roster
// =============================================================================

/// A client of the practice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    /// Receipt code
    pub code: String,
    /// Per-service hourly prices for this client (service name -> rate)
    #[serde(default)]
    pub custom_rates: HashMap<String, Option<f64>>,
}

/// A therapist working for the practice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Therapist {
    pub id: TherapistId,
    pub name: String,
    /// Hourly payout for specific clients
    #[serde(default)]
    pub costs_by_client: HashMap<ClientId, f64>,
    /// Hourly payout for specific services
    #[serde(default)]
    pub costs_by_service: HashMap<String, f64>,
}

/// A service the practice offers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    /// Hourly list price
    pub base_price: f64,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Display position
    #[serde(default)]
    pub order: u32,
}

fn default_active() -> bool {
    true
}

/// Services sorted for display (by `order`, ties keep input order)
pub fn services_in_display_order(services: &[Service]) -> Vec<&Service> {
    let mut sorted: Vec<_> = services.iter().collect();
    sorted.sort_by_key(|s| s.order);
    sorted
}

/// Find a client by id
pub fn find_client<'a>(clients: &'a [Client], id: &ClientId) -> Option<&'a Client> {
    clients.iter().find(|c| &c.id == id)
}

/// Find a therapist by id
pub fn find_therapist<'a>(therapists: &'a [Therapist], id: &TherapistId) -> Option<&'a Therapist> {
    therapists.iter().find(|t| &t.id == id)
}

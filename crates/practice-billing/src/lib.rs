//! Billing engine for a therapy practice
//!
//! Turns plain collections of appointments, clients and therapists into
//! monthly receipts with tax and margin figures, and expands weekly slots
//! into draft appointments. Nothing here touches storage or rendering.

pub mod config;
pub mod constants;
pub mod costs;
pub mod error;
pub mod filter;
pub mod model;
pub mod receipts;
pub mod reconcile;
pub mod reports;
pub mod schedule;
pub mod sorting;
pub mod time_math;

pub use config::BillingConfig;
pub use costs::{CostResolver, CostSource, RateSource, RateTable, ResolvedCosts};
pub use error::BillingError;
pub use filter::{filter_month, PartyFilter};
pub use model::{
    Appointment, AppointmentId, AppointmentStatus, Client, ClientId, Service, Therapist, TherapistId, YearMonth,
};
pub use receipts::{build_receipts, Receipt, ReceiptBatch, ReceiptLine, RejectedAppointment};
pub use reconcile::{reconcile_name, NameMatch};
pub use reports::{generate_report, MonthlyReport, ReportRequest, TherapistPayout};
pub use schedule::{generate_schedule, DateRange, GeneratedSchedule, ScheduleRequest, SkippedSlot, WeeklySlot};
pub use sorting::{next_direction, sort_lines, SortDirection, SortField, SortState};

//! Error types for the billing engine

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum BillingError {
    #[error("invalid month '{0}', expected YYYY-MM")]
    InvalidYearMonth(String),

    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("invalid time '{0}', expected HH:MM")]
    InvalidClockTime(String),

    #[error("date range ends ({end}) before it starts ({start})")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
}

pub type Result<T> = std::result::Result<T, BillingError>;

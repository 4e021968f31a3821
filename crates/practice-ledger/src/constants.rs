//! File names and CLI conventions

/// Default config file path
pub const CONFIG_FILE: &str = "config.toml";

/// Filter value selecting every therapist or client
pub const ALL_FILTER: &str = "all";

// =============================================================================
// Output files
// =============================================================================

/// One row per receipt
pub const RECEIPTS_FILENAME: &str = "receipts.csv";

/// One row per billed appointment
pub const RECEIPT_LINES_FILENAME: &str = "receipt_lines.csv";

/// Generated recurring appointments
pub const DRAFTS_FILENAME: &str = "draft_appointments.csv";

/// Appointments matched from an imported schedule
pub const RECONCILED_FILENAME: &str = "reconciled_appointments.csv";

/// Plain-text report for a month (format with YYYY-MM)
pub fn text_report_filename(month: &str) -> String {
    format!("report_{}.txt", month)
}

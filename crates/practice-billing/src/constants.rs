//! Default business constants
//!
//! These are the values a practice starts with. The engine never reads them
//! directly: they seed `BillingConfig`, which can be overridden from config.toml.

// =============================================================================
// Pricing
// =============================================================================

/// VAT applied on top of every billed appointment (16%)
pub const DEFAULT_TAX_RATE: f64 = 0.16;

/// Hourly price charged when neither the client nor the rate table has one
pub const FALLBACK_CLIENT_RATE: f64 = 450.0;

/// Hourly therapist payout when no client or service override exists
pub const FALLBACK_THERAPIST_COST: f64 = 200.0;

/// Therapy type used by generated appointments when a slot names none
pub const DEFAULT_THERAPY_TYPE: &str = "standard session";

// =============================================================================
// Presentation
// =============================================================================

/// Receipt code used when the client is missing from the roster
pub const UNKNOWN_CLIENT_CODE: &str = "N/A";

/// Month names used for report labels (January first)
pub const DEFAULT_MONTH_NAMES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

// =============================================================================
// Formats
// =============================================================================

/// Calendar date format used on every record
pub const DATE_FORMAT: &str = "%Y-%m-%d";

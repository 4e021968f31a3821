//! Sorting of receipt lines for presentation

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::receipts::ReceiptLine;
use crate::reconcile::normalize_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// Column a receipt line can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Date,
    Duration,
    TherapyType,
    Therapist,
    Price,
    Tax,
    Total,
    TherapistCost,
}

impl SortField {
    /// Look up a column by name; unknown names give None
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().replace(['_', '-'], "").as_str() {
            "date" => Some(SortField::Date),
            "duration" => Some(SortField::Duration),
            "therapytype" => Some(SortField::TherapyType),
            "therapist" => Some(SortField::Therapist),
            "price" => Some(SortField::Price),
            "tax" => Some(SortField::Tax),
            "total" => Some(SortField::Total),
            "therapistcost" => Some(SortField::TherapistCost),
            _ => None,
        }
    }

    fn compare(self, a: &ReceiptLine, b: &ReceiptLine) -> Ordering {
        match self {
            SortField::Date => a.date.cmp(&b.date),
            SortField::Duration => a.duration_hours.total_cmp(&b.duration_hours),
            SortField::TherapyType => compare_text(&a.therapy_type, &b.therapy_type),
            SortField::Therapist => compare_text(&a.therapist_name, &b.therapist_name),
            SortField::Price => a.price.total_cmp(&b.price),
            SortField::Tax => a.tax.total_cmp(&b.tax),
            SortField::Total => a.total.total_cmp(&b.total),
            SortField::TherapistCost => a.therapist_cost.total_cmp(&b.therapist_cost),
        }
    }
}

/// Case and accent insensitive, so "Ángel" sorts with the A's; the raw text
/// breaks ties
fn compare_text(a: &str, b: &str) -> Ordering {
    normalize_name(a).cmp(&normalize_name(b)).then_with(|| a.cmp(b))
}

/// Stable sort of lines; `None` (an unknown column) leaves them as they are
pub fn sort_lines(lines: &mut [ReceiptLine], field: Option<SortField>, direction: SortDirection) {
    let Some(field) = field else {
        return;
    };
    lines.sort_by(|a, b| match direction {
        SortDirection::Asc => field.compare(a, b),
        SortDirection::Desc => field.compare(b, a),
    });
}

/// Direction after a click on `clicked`
///
/// Clicking the current column flips the direction, any other column starts
/// ascending.
pub fn next_direction(
    current_field: Option<SortField>,
    current_direction: SortDirection,
    clicked: SortField,
) -> SortDirection {
    if current_field == Some(clicked) {
        current_direction.flipped()
    } else {
        SortDirection::Asc
    }
}

/// Column and direction currently applied to a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortState {
    pub field: Option<SortField>,
    pub direction: SortDirection,
}

impl SortState {
    pub fn click(&mut self, clicked: SortField) {
        self.direction = next_direction(self.field, self.direction, clicked);
        self.field = Some(clicked);
    }

    pub fn apply(&self, lines: &mut [ReceiptLine]) {
        sort_lines(lines, self.field, self.direction);
    }
}

//! Date extraction.
//!
//! Dates are kept as the literal matched text; no calendar validation or
//! reformatting happens here.

use super::FieldExtractor;
use super::patterns::DATE_RULE;

/// Date field extractor.
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = String;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    /// Every date-shaped token, grouped by pattern (numeric D/M/Y, then
    /// "D Month Y", then Y/M/D) and in text order within a pattern.
    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        DATE_RULE
            .all_matches(text)
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

/// Dates assigned to invoice fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoiceDates {
    /// First collected date.
    pub invoice_date: Option<String>,
    /// Second collected date.
    pub due_date: Option<String>,
}

/// Assign dates positionally: the first collected date is the invoice date
/// and the second is the due date. Labels such as "Due" are not consulted.
pub fn extract_dates(text: &str) -> InvoiceDates {
    let mut dates = DateExtractor::new().extract_all(text).into_iter();
    InvoiceDates {
        invoice_date: dates.next(),
        due_date: dates.next(),
    }
}

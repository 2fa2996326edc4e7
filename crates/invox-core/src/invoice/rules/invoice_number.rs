//! Invoice number extraction.

use super::FieldExtractor;
use super::patterns::INVOICE_NUMBER_RULE;

/// Invoice number extractor.
///
/// Matching is case-insensitive: the text is upper-cased first, so the
/// returned value is upper-case too.
pub struct InvoiceNumberExtractor;

impl InvoiceNumberExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for InvoiceNumberExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for InvoiceNumberExtractor {
    type Output = String;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        let upper = text.to_uppercase();
        INVOICE_NUMBER_RULE
            .first_match(&upper)
            .map(|value| value.trim().to_string())
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let upper = text.to_uppercase();
        INVOICE_NUMBER_RULE
            .all_matches(&upper)
            .into_iter()
            .map(|value| value.trim().to_string())
            .collect()
    }
}

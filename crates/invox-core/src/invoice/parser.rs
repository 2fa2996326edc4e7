//! Rule-based invoice field parser.

use tracing::debug;

use crate::models::invoice::{FieldName, FieldSet, RecognizedText};

use super::rules::{
    extract_amounts, extract_bill_to, extract_dates, extract_vendor, CurrencyExtractor,
    FieldExtractor, InvoiceNumberExtractor,
};

/// Trait for invoice parsing.
pub trait InvoiceParser: Send + Sync {
    /// Derive the field set from recognized text.
    ///
    /// Never fails: fields that cannot be matched are left empty.
    fn parse(&self, text: &RecognizedText) -> FieldSet;
}

/// Parser built from the fixed pattern rules.
///
/// Each field is extracted independently, so one field failing to match
/// never affects another.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedParser;

impl RuleBasedParser {
    pub fn new() -> Self {
        Self
    }
}

impl InvoiceParser for RuleBasedParser {
    fn parse(&self, text: &RecognizedText) -> FieldSet {
        let raw = text.as_str();

        let dates = extract_dates(raw);
        let vendor = extract_vendor(text.lines());
        let amounts = extract_amounts(raw);

        let fields = FieldSet {
            invoice_number: InvoiceNumberExtractor::new().extract(raw).unwrap_or_default(),
            invoice_date: dates.invoice_date.unwrap_or_default(),
            due_date: dates.due_date.unwrap_or_default(),
            vendor_name: vendor.name,
            vendor_address: vendor.address,
            bill_to: extract_bill_to(text.lines()),
            total_amount: amounts.total.unwrap_or_default(),
            subtotal: amounts.subtotal.unwrap_or_default(),
            tax_amount: amounts.tax.unwrap_or_default(),
            currency: CurrencyExtractor::new().extract(raw).unwrap_or_default(),
        };

        debug!(
            "Extracted {} of {} fields from {} characters",
            fields.filled_count(),
            FieldName::ALL.len(),
            raw.len()
        );

        fields
    }
}

/// Extract invoice fields from plain text with the default rules.
pub fn extract_fields(text: &str) -> FieldSet {
    RuleBasedParser::new().parse(&RecognizedText::new(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "\
Acme Supplies Ltd
12 High Street
Leeds LS1 4AB
INVOICE # INV-1042
Invoice Date: 03/05/2024
Due Date: 02/06/2024
Bill To:
Globex Corporation
221B Baker Street

Description        Qty   Price
Widgets             10   12.00
Subtotal: £120.00
Tax 20%: £24.00
Total: £144.00
";

    #[test]
    fn test_parse_full_invoice() {
        let fields = extract_fields(SAMPLE);

        assert_eq!(fields.invoice_number, "INV-1042");
        assert_eq!(fields.invoice_date, "03/05/2024");
        assert_eq!(fields.due_date, "02/06/2024");
        assert_eq!(fields.vendor_name, "Acme Supplies Ltd");
        assert_eq!(fields.vendor_address, "12 High Street Leeds LS1 4AB");
        assert_eq!(fields.bill_to, "Globex Corporation 221B Baker Street");
        assert_eq!(fields.currency, "GBP");
        assert_eq!(fields.subtotal, "120.00");
        assert_eq!(fields.tax_amount, "24.00");
        // TOTAL inside "SUBTOTAL" is the first TOTAL match
        assert_eq!(fields.total_amount, "120.00");
    }

    #[test]
    fn test_empty_text_yields_all_empty_fields() {
        let fields = extract_fields("");
        assert_eq!(fields, FieldSet::default());
        assert_eq!(fields.filled_count(), 0);
    }

    #[test]
    fn test_each_field_is_independent() {
        let fields = extract_fields("Amount Due: $50");
        assert_eq!(fields.total_amount, "50");
        assert_eq!(fields.currency, "USD");
        assert_eq!(fields.invoice_number, "");
        assert_eq!(fields.invoice_date, "");
        // The only line is a vendor candidate
        assert_eq!(fields.vendor_name, "Amount Due: $50");
    }

    #[test]
    fn test_invoice_number_is_upper_cased() {
        let fields = extract_fields("invoice no: ab-12");
        assert_eq!(fields.invoice_number, "AB-12");
    }

    #[test]
    fn test_parser_is_deterministic() {
        let text = RecognizedText::new(SAMPLE);
        let parser = RuleBasedParser::new();
        assert_eq!(parser.parse(&text), parser.parse(&text));
    }
}

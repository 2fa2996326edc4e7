//! Rule-based field extractors for English-language invoices.

pub mod amounts;
pub mod currency;
pub mod dates;
pub mod invoice_number;
pub mod parties;
pub mod patterns;

pub use amounts::{extract_amounts, normalize_amount, AmountExtractor, InvoiceAmounts};
pub use currency::{currency_code, CurrencyExtractor};
pub use dates::{extract_dates, DateExtractor, InvoiceDates};
pub use invoice_number::InvoiceNumberExtractor;
pub use parties::{extract_bill_to, extract_vendor, VendorInfo};
pub use patterns::*;

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

//! Invoice data models: recognized text, the fixed field set and the
//! per-file extraction result.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ocr::EngineKind;

/// Text produced by an OCR backend, kept both whole and split into lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RecognizedText {
    text: String,
    lines: Vec<String>,
}

impl RecognizedText {
    /// Create from the full text; lines are split on `\n` and kept untrimmed.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let lines = text.split('\n').map(str::to_string).collect();
        Self { text, lines }
    }

    /// Recognized text with no content.
    pub fn empty() -> Self {
        Self::new(String::new())
    }

    /// Full concatenated text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Lines in recognition order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

impl From<String> for RecognizedText {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl From<&str> for RecognizedText {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<RecognizedText> for String {
    fn from(text: RecognizedText) -> Self {
        text.text
    }
}

impl fmt::Display for RecognizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Closed set of field names produced by the field extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    InvoiceNumber,
    InvoiceDate,
    DueDate,
    VendorName,
    VendorAddress,
    BillTo,
    TotalAmount,
    Subtotal,
    TaxAmount,
    Currency,
}

impl FieldName {
    /// All fields in canonical order.
    pub const ALL: [FieldName; 10] = [
        FieldName::InvoiceNumber,
        FieldName::InvoiceDate,
        FieldName::DueDate,
        FieldName::VendorName,
        FieldName::VendorAddress,
        FieldName::BillTo,
        FieldName::TotalAmount,
        FieldName::Subtotal,
        FieldName::TaxAmount,
        FieldName::Currency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::InvoiceNumber => "invoice_number",
            FieldName::InvoiceDate => "invoice_date",
            FieldName::DueDate => "due_date",
            FieldName::VendorName => "vendor_name",
            FieldName::VendorAddress => "vendor_address",
            FieldName::BillTo => "bill_to",
            FieldName::TotalAmount => "total_amount",
            FieldName::Subtotal => "subtotal",
            FieldName::TaxAmount => "tax_amount",
            FieldName::Currency => "currency",
        }
    }

    /// Whether the field holds a normalized monetary amount.
    pub fn is_amount(&self) -> bool {
        matches!(
            self,
            FieldName::TotalAmount | FieldName::Subtotal | FieldName::TaxAmount
        )
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldName::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| format!("unknown field: '{s}'"))
    }
}

/// Extracted invoice fields.
///
/// Every field is always present; a field the extractor could not match is
/// the empty string. Values are unverified OCR output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSet {
    pub invoice_number: String,
    pub invoice_date: String,
    pub due_date: String,
    pub vendor_name: String,
    pub vendor_address: String,
    pub bill_to: String,
    pub total_amount: String,
    pub subtotal: String,
    pub tax_amount: String,
    pub currency: String,
}

impl FieldSet {
    /// Value of a field by name.
    pub fn get(&self, name: FieldName) -> &str {
        match name {
            FieldName::InvoiceNumber => &self.invoice_number,
            FieldName::InvoiceDate => &self.invoice_date,
            FieldName::DueDate => &self.due_date,
            FieldName::VendorName => &self.vendor_name,
            FieldName::VendorAddress => &self.vendor_address,
            FieldName::BillTo => &self.bill_to,
            FieldName::TotalAmount => &self.total_amount,
            FieldName::Subtotal => &self.subtotal,
            FieldName::TaxAmount => &self.tax_amount,
            FieldName::Currency => &self.currency,
        }
    }

    /// Fields in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (FieldName, &str)> + '_ {
        FieldName::ALL.iter().map(move |&name| (name, self.get(name)))
    }

    /// Number of non-empty fields.
    pub fn filled_count(&self) -> usize {
        self.iter().filter(|(_, value)| !value.is_empty()).count()
    }

    /// Parse an amount field into a decimal.
    ///
    /// Returns `None` for non-amount fields and for empty values.
    pub fn amount(&self, name: FieldName) -> Option<Decimal> {
        if !name.is_amount() {
            return None;
        }
        Decimal::from_str(self.get(name)).ok()
    }
}

/// Outcome of extracting one invoice file.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    /// File the caller submitted.
    pub source_file: PathBuf,
    /// Text returned by the OCR backend.
    pub raw_text: RecognizedText,
    /// Fields derived from `raw_text`.
    pub fields: FieldSet,
    /// Engine used for recognition.
    pub engine: EngineKind,
    /// Number of page images that went through recognition.
    pub pages_processed: usize,
}

impl ExtractionResult {
    /// Base name of the source file.
    pub fn file_name(&self) -> String {
        file_name_of(&self.source_file)
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

//! Processed-invoices ledger and its CSV / JSON exports.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Local};
use rust_decimal::Decimal;
use serde::Serialize;

use invox_core::models::invoice::{ExtractionResult, FieldName, FieldSet};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Currency key used in totals when none was extracted.
pub const UNKNOWN_CURRENCY: &str = "(none)";

/// One processed invoice.
pub struct LedgerEntry {
    pub result: ExtractionResult,
    pub extracted_at: DateTime<Local>,
}

impl LedgerEntry {
    /// JSON export record.
    pub fn record(&self) -> JsonRecord<'_> {
        JsonRecord {
            file_name: self.result.file_name(),
            extraction_timestamp: self.extracted_at.format(TIMESTAMP_FORMAT).to_string(),
            fields: &self.result.fields,
            full_text: self.result.raw_text.as_str(),
        }
    }
}

#[derive(Serialize)]
pub struct JsonRecord<'a> {
    file_name: String,
    extraction_timestamp: String,
    fields: &'a FieldSet,
    full_text: &'a str,
}

#[derive(Serialize)]
struct PreviewRecord<'a> {
    file_name: String,
    fields: &'a FieldSet,
}

/// Column order of the CSV export.
#[derive(Serialize)]
struct CsvRow<'a> {
    file_name: String,
    invoice_number: &'a str,
    invoice_date: &'a str,
    due_date: &'a str,
    vendor_name: &'a str,
    vendor_address: &'a str,
    bill_to: &'a str,
    currency: &'a str,
    subtotal: &'a str,
    tax_amount: &'a str,
    total_amount: &'a str,
}

impl<'a> CsvRow<'a> {
    fn new(result: &'a ExtractionResult) -> Self {
        let f = &result.fields;
        Self {
            file_name: result.file_name(),
            invoice_number: &f.invoice_number,
            invoice_date: &f.invoice_date,
            due_date: &f.due_date,
            vendor_name: &f.vendor_name,
            vendor_address: &f.vendor_address,
            bill_to: &f.bill_to,
            currency: &f.currency,
            subtotal: &f.subtotal,
            tax_amount: &f.tax_amount,
            total_amount: &f.total_amount,
        }
    }
}

const CSV_HEADER: [&str; 11] = [
    "file_name",
    "invoice_number",
    "invoice_date",
    "due_date",
    "vendor_name",
    "vendor_address",
    "bill_to",
    "currency",
    "subtotal",
    "tax_amount",
    "total_amount",
];

/// Insertion-ordered list of processed results.
///
/// Processing the same file twice yields two entries.
#[derive(Default)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a result stamped with the current local time.
    pub fn push(&mut self, result: ExtractionResult) {
        self.push_at(result, Local::now());
    }

    pub fn push_at(&mut self, result: ExtractionResult, extracted_at: DateTime<Local>) {
        self.entries.push(LedgerEntry {
            result,
            extracted_at,
        });
    }

    pub fn last(&self) -> Option<&LedgerEntry> {
        self.entries.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the CSV export. The header is written even for an empty ledger.
    pub fn write_csv<W: Write>(&self, writer: W) -> anyhow::Result<()> {
        let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
        wtr.write_record(CSV_HEADER)?;
        for entry in &self.entries {
            wtr.serialize(CsvRow::new(&entry.result))?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn to_csv(&self) -> anyhow::Result<String> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        Ok(String::from_utf8(buf)?)
    }

    /// Pretty-printed JSON array of every entry.
    pub fn to_json(&self) -> anyhow::Result<String> {
        let records: Vec<JsonRecord<'_>> = self.entries.iter().map(LedgerEntry::record).collect();
        Ok(serde_json::to_string_pretty(&records)?)
    }

    /// JSON preview of the most recent entry.
    pub fn preview(&self) -> anyhow::Result<Option<String>> {
        let Some(entry) = self.last() else {
            return Ok(None);
        };
        let preview = PreviewRecord {
            file_name: entry.result.file_name(),
            fields: &entry.result.fields,
        };
        Ok(Some(serde_json::to_string_pretty(&preview)?))
    }

    pub fn export_csv(&self, path: &Path) -> anyhow::Result<()> {
        let file = fs::File::create(path)?;
        self.write_csv(file)
    }

    pub fn export_json(&self, path: &Path) -> anyhow::Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Sum of parseable totals, keyed by currency code.
    pub fn totals_by_currency(&self) -> BTreeMap<String, Decimal> {
        let mut totals = BTreeMap::new();
        for entry in &self.entries {
            let fields = &entry.result.fields;
            let Some(amount) = fields.amount(FieldName::TotalAmount) else {
                continue;
            };
            let currency = if fields.currency.is_empty() {
                UNKNOWN_CURRENCY.to_string()
            } else {
                fields.currency.clone()
            };
            *totals.entry(currency).or_insert(Decimal::ZERO) += amount;
        }
        totals
    }
}

/// Export file name such as `invoices_20240115_093000.csv`.
pub fn default_export_name(extension: &str, now: DateTime<Local>) -> String {
    format!("invoices_{}.{}", now.format("%Y%m%d_%H%M%S"), extension)
}

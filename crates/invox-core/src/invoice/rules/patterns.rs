//! Ordered pattern tables for invoice field extraction.
//!
//! Pattern order inside each rule matters: several patterns can match
//! overlapping text, and the rule's evaluation strategy decides which wins.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

/// A named, ordered list of candidate patterns for one field category.
#[derive(Debug)]
pub struct PatternRule {
    name: &'static str,
    patterns: Vec<Regex>,
}

impl PatternRule {
    /// Build a rule from pattern sources, in priority order.
    ///
    /// Panics on an invalid pattern; rules are static tables.
    pub fn new(name: &'static str, sources: &[&str]) -> Self {
        let patterns = sources
            .iter()
            .map(|source| Regex::new(source).unwrap())
            .collect();
        Self { name, patterns }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn patterns(&self) -> &[Regex] {
        &self.patterns
    }

    /// First-match-wins: the first pattern that matches anywhere in `text`
    /// decides the result; later patterns are never tried.
    pub fn first_match<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.patterns
            .iter()
            .find_map(|pattern| pattern.captures(text).map(|caps| value_of(&caps)))
    }

    /// Like [`first_match`](Self::first_match), but a pattern only wins when
    /// `accept` turns its first match into a value. A rejected match falls
    /// through to the next pattern.
    pub fn first_accepted<T>(&self, text: &str, accept: impl Fn(&str) -> Option<T>) -> Option<T> {
        self.patterns.iter().find_map(|pattern| {
            pattern
                .captures(text)
                .and_then(|caps| accept(value_of(&caps)))
        })
    }

    /// Collect-all: every match of every pattern, pattern order first, then
    /// match order within a pattern.
    pub fn all_matches<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.patterns
            .iter()
            .flat_map(|pattern| pattern.captures_iter(text).map(|caps| value_of(&caps)))
            .collect()
    }
}

/// Capture group 1, or the whole match for group-less patterns.
fn value_of<'t>(caps: &Captures<'t>) -> &'t str {
    caps.get(1)
        .or_else(|| caps.get(0))
        .map(|m| m.as_str())
        .unwrap_or_default()
}

lazy_static! {
    // Invoice number, matched against upper-cased text
    pub static ref INVOICE_NUMBER_RULE: PatternRule = PatternRule::new(
        "invoice_number",
        &[
            r"INVOICE\s*(?:NO|NUMBER|#)?\s*:?\s*([A-Z0-9\-]+)",
            r"INV\s*(?:NO|#)?\s*:?\s*([A-Z0-9\-]+)",
            r"INVOICE\s+([A-Z0-9\-]+)",
            r"#\s*([A-Z0-9\-]+)",
        ],
    );

    // Dates, matched against original-case text
    pub static ref DATE_RULE: PatternRule = PatternRule::new(
        "date",
        &[
            r"(\d{1,2}[/\-\.]\d{1,2}[/\-\.]\d{2,4})",
            r"(\d{1,2}\s+[A-Za-z]{3,9}\s+\d{2,4})",
            r"(\d{2,4}[/\-\.]\d{1,2}[/\-\.]\d{1,2})",
        ],
    );

    // Amounts, matched against upper-cased text
    pub static ref TOTAL_RULE: PatternRule = PatternRule::new(
        "total_amount",
        &[
            r"TOTAL\s*(?:GBP|USD|EUR|\$|£|€)?:?\s*([£$€]?\s*[\d,]+\.?\d*)",
            r"AMOUNT\s+DUE\s*(?:GBP|USD|EUR|\$|£|€)?:?\s*([£$€]?\s*[\d,]+\.?\d*)",
        ],
    );

    pub static ref SUBTOTAL_RULE: PatternRule = PatternRule::new(
        "subtotal",
        &[r"SUBTOTAL\s*:?\s*([£$€]?\s*[\d,]+\.?\d*)"],
    );

    pub static ref TAX_RULE: PatternRule = PatternRule::new(
        "tax_amount",
        &[r"TAX\s*(?:\d+%)?:?\s*([£$€]?\s*[\d,]+\.?\d*)"],
    );

    // Currency marker, matched against upper-cased text
    pub static ref CURRENCY_RULE: PatternRule = PatternRule::new(
        "currency",
        &[r"[£$€]|GBP|USD|EUR"],
    );
}

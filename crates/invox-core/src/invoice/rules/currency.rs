//! Currency detection.

use super::FieldExtractor;
use super::patterns::CURRENCY_RULE;

/// Currency extractor; the first symbol or ISO code in the text wins.
pub struct CurrencyExtractor;

impl CurrencyExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CurrencyExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for CurrencyExtractor {
    type Output = String;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        let upper = text.to_uppercase();
        CURRENCY_RULE.first_match(&upper).map(currency_code)
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let upper = text.to_uppercase();
        CURRENCY_RULE
            .all_matches(&upper)
            .into_iter()
            .map(currency_code)
            .collect()
    }
}

/// Map a currency symbol to its ISO code; codes pass through unchanged.
pub fn currency_code(marker: &str) -> String {
    match marker {
        "£" => "GBP",
        "$" => "USD",
        "€" => "EUR",
        other => other,
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn extract(text: &str) -> Option<String> {
        CurrencyExtractor::new().extract(text)
    }

    #[test]
    fn test_symbols_map_to_codes() {
        assert_eq!(extract("Total £10"), Some("GBP".to_string()));
        assert_eq!(extract("Total $10"), Some("USD".to_string()));
        assert_eq!(extract("Total €10"), Some("EUR".to_string()));
    }

    #[test]
    fn test_first_occurrence_wins() {
        assert_eq!(extract("Paid in usd, converted from €20"), Some("USD".to_string()));
        assert_eq!(
            CurrencyExtractor::new().extract_all("€5 then GBP"),
            vec!["EUR".to_string(), "GBP".to_string()]
        );
    }

    #[test]
    fn test_no_currency() {
        assert_eq!(extract("Total 10.00"), None);
    }
}

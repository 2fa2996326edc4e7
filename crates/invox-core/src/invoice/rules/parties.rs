//! Line-oriented extraction of the vendor block and the bill-to block.

/// Only this many leading lines are considered for the vendor block.
const VENDOR_SCAN_LINES: usize = 10;
/// Vendor name plus up to two address lines.
const VENDOR_MAX_LINES: usize = 3;
/// Lines collected after a "BILL TO" header.
const BILL_TO_MAX_LINES: usize = 5;

/// Lines containing any of these (case-insensitive) are never vendor lines.
const VENDOR_EXCLUDED: [&str; 3] = ["INVOICE", "BILL TO", "DATE"];

/// Vendor name and address taken from the top of the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VendorInfo {
    pub name: String,
    pub address: String,
}

/// Take the first qualifying lines among the leading lines of the page.
///
/// A line qualifies when it is non-blank and mentions none of the excluded
/// keywords. The first qualifying line is the vendor name; the remaining
/// ones, space-joined, form the address.
pub fn extract_vendor<S: AsRef<str>>(lines: &[S]) -> VendorInfo {
    let mut block = lines
        .iter()
        .take(VENDOR_SCAN_LINES)
        .map(|line| line.as_ref().trim())
        .filter(|line| !line.is_empty())
        .filter(|line| {
            let upper = line.to_uppercase();
            !VENDOR_EXCLUDED.iter().any(|keyword| upper.contains(keyword))
        })
        .take(VENDOR_MAX_LINES);

    let name = block.next().unwrap_or_default().to_string();
    let address = block.collect::<Vec<_>>().join(" ");

    VendorInfo { name, address }
}

/// Collect the block that follows the first "BILL TO" line.
///
/// Up to five following lines are trimmed and space-joined; a blank line
/// ends the block early. Text on the header line itself is not included.
pub fn extract_bill_to<S: AsRef<str>>(lines: &[S]) -> String {
    let Some(header) = lines
        .iter()
        .position(|line| line.as_ref().to_uppercase().contains("BILL TO"))
    else {
        return String::new();
    };

    lines[header + 1..]
        .iter()
        .take(BILL_TO_MAX_LINES)
        .map(|line| line.as_ref().trim())
        .take_while(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_vendor_skips_keyword_lines() {
        let lines = [
            "INVOICE",
            "  Acme Supplies Ltd  ",
            "",
            "12 High Street",
            "Leeds LS1 4AB",
            "Springfield",
        ];
        let vendor = extract_vendor(&lines);
        assert_eq!(vendor.name, "Acme Supplies Ltd");
        assert_eq!(vendor.address, "12 High Street Leeds LS1 4AB");
    }

    #[test]
    fn test_vendor_keyword_match_is_case_insensitive() {
        let lines = ["Invoice Date: 01/01/2024", "Bill to someone", "Globex"];
        let vendor = extract_vendor(&lines);
        assert_eq!(vendor.name, "Globex");
        assert_eq!(vendor.address, "");
    }

    #[test]
    fn test_vendor_only_scans_leading_lines() {
        let mut lines = vec!["INVOICE"; 10];
        lines.push("Too Late Ltd");
        assert_eq!(extract_vendor(&lines), VendorInfo::default());
    }

    #[test]
    fn test_bill_to_stops_at_blank_line() {
        let lines = [
            "Acme",
            "Bill To:",
            " Jane Doe ",
            "1 Elm Road",
            "",
            "Notes",
        ];
        assert_eq!(extract_bill_to(&lines), "Jane Doe 1 Elm Road");
    }

    #[test]
    fn test_bill_to_takes_at_most_five_lines() {
        let lines = ["BILL TO", "a", "b", "c", "d", "e", "f"];
        assert_eq!(extract_bill_to(&lines), "a b c d e");
    }

    #[test]
    fn test_bill_to_missing_or_last_line() {
        assert_eq!(extract_bill_to(&["Acme", "Total 10"]), "");
        assert_eq!(extract_bill_to(&["Acme", "bill to"]), "");
    }
}

//! Regex patterns for recognized cover sheet and complaint text.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Street line: skip a leading name fragment, keep from the building number
    // to the end of that line.
    pub static ref STREET_FROM_NUMBER: Regex = Regex::new(
        r"[A-Za-z\s]*([0-9].*)"
    ).unwrap();

    // Demand amounts. OCR reads the decimal point as a comma, a period, or
    // nothing, so the separators are optional and stripped later.
    pub static ref PRAYER_AMOUNT: Regex = Regex::new(
        r"(?i:PRAYER)\s*(?i:AMOUNT)\s*[:;,.-]?\s*[$Ss]\s*([0-9]{0,2}[,.]?[0-9]{0,3}[.,]?[0-9]{2})"
    ).unwrap();

    pub static ref DEMAND_AMOUNT: Regex = Regex::new(
        r"(?i:DEMAND)\s*[:;,.-]?\s+[$Ss]\s*([0-9]{0,2}[,.]?[0-9]{0,3}[.,]?[0-9]{2})"
    ).unwrap();

    pub static ref DAMAGES_OF: Regex = Regex::new(
        r"(?i:damages)\s*(?i:of)\s*[:;,.-]?\s*[$Ss]\s*([0-9]{0,2}[,.]?[0-9]{0,3}[.,]?[0-9]{2})"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_street_pattern_skips_names() {
        let caps = STREET_FROM_NUMBER.captures("JANE DOE 42 Elm St\nsecond line").unwrap();
        assert_eq!(&caps[1], "42 Elm St");
    }

    #[test]
    fn test_demand_requires_space_before_currency() {
        assert!(DEMAND_AMOUNT.is_match("DEMAND: $1,000.00"));
        assert!(!DEMAND_AMOUNT.is_match("DEMAND:$1,000.00"));
        assert!(PRAYER_AMOUNT.is_match("prayer amount S 1000.00"));
        assert!(DAMAGES_OF.is_match("for a. damages of: $7,500.00"));
    }
}

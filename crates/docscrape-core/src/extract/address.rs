//! Address parsing from the four recognized cover sheet cells.

use tracing::debug;

use super::labels::{self, value_after};
use super::patterns::STREET_FROM_NUMBER;
use crate::error::ParseError;
use crate::models::case::{ExtractedAddress, FieldKind};

const ZIP_DASHES: [char; 3] = ['-', '_', '\u{2013}'];

/// Normalize raw OCR text of the street, city, state and zip cells.
pub fn parse_address(
    street_raw: &str,
    city_raw: &str,
    state_raw: &str,
    zip_raw: &str,
) -> Result<ExtractedAddress, ParseError> {
    let address = ExtractedAddress {
        street_address: parse_street(street_raw)?,
        city: value_after(labels::CITY, FieldKind::City, city_raw)?.to_string(),
        state: value_after(labels::STATE, FieldKind::State, state_raw)?.to_string(),
        zip_code: parse_zip(zip_raw)?,
    };
    debug!("Parsed address: {}", address.compose());
    Ok(address)
}

/// Street line from the building number on. Leading name fragments are dropped.
pub fn parse_street(raw: &str) -> Result<String, ParseError> {
    let value = value_after(labels::ADDRESS, FieldKind::StreetAddress, raw)?;
    STREET_FROM_NUMBER
        .captures(value)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .ok_or_else(|| ParseError::StreetNumber {
            raw: value.to_string(),
        })
}

/// `DDDDD` or `DDDDD-DDDD`. The +4 suffix is dropped unless it is four digits.
pub fn parse_zip(raw: &str) -> Result<String, ParseError> {
    let after_zip = labels::ZIP.after(FieldKind::Zip, raw)?;
    let value = value_after(labels::CODE, FieldKind::Zip, after_zip)?;

    let prefix = value
        .get(..5)
        .filter(|p| p.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(|| ParseError::ZipDigits {
            found: value.chars().take(5).collect(),
        })?;

    let rest = value[5..].trim();
    let rest = rest.strip_prefix(ZIP_DASHES).unwrap_or(rest).trim_start();
    match rest.get(..4).filter(|s| s.bytes().all(|b| b.is_ascii_digit())) {
        Some(suffix) => Ok(format!("{}-{}", prefix, suffix)),
        None => {
            if !rest.is_empty() {
                debug!("Dropping unreadable zip suffix {:?}", rest);
            }
            Ok(prefix.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_full_address() {
        let address = parse_address(
            "STREET ADDRESS: JOHN SMITH 123 Main St, Apt 4\n",
            "CITY: San Francisco",
            "STATE. CA",
            "ZIP CODE: 94103-1234",
        )
        .unwrap();

        assert_eq!(
            address,
            ExtractedAddress {
                street_address: "123 Main St, Apt 4".to_string(),
                city: "San Francisco".to_string(),
                state: "CA".to_string(),
                zip_code: "94103-1234".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_is_idempotent_on_normalized_fields() {
        let first = parse_address(
            "ADDRESS; 77 Ocean Ave",
            "CHY Oakland",
            "STATE: CA",
            "ZIPCODE: 94014 - 2233",
        )
        .unwrap();

        let again = parse_address(
            &format!("ADDRESS: {}", first.street_address),
            &format!("CITY: {}", first.city),
            &format!("STATE: {}", first.state),
            &format!("ZIP CODE: {}", first.zip_code),
        )
        .unwrap();

        assert_eq!(first.zip_code, "94014-2233");
        assert_eq!(first.city, "Oakland");
        assert_eq!(again, first);
    }

    #[test]
    fn test_zip_variants() {
        assert_eq!(parse_zip("ZIP CODE: 94103-1234").unwrap(), "94103-1234");
        assert_eq!(parse_zip("ZIP CODE 94103").unwrap(), "94103");
        assert_eq!(parse_zip("ZIP CODE: 94103 12").unwrap(), "94103");
        assert_eq!(parse_zip("zip code: 94103_9876").unwrap(), "94103-9876");
        assert!(matches!(
            parse_zip("ZIP CODE: 9410X"),
            Err(ParseError::ZipDigits { found }) if found == "9410X"
        ));
    }

    #[test]
    fn test_zip_requires_code_label() {
        assert!(matches!(
            parse_zip("ZIP 94103"),
            Err(ParseError::FieldParse {
                field: FieldKind::Zip,
                ..
            })
        ));
    }

    #[test]
    fn test_street_without_number_fails() {
        assert!(matches!(
            parse_street("ADDRESS: General Delivery"),
            Err(ParseError::StreetNumber { .. })
        ));
        assert!(matches!(
            parse_street("NAME: 12 Main"),
            Err(ParseError::FieldParse { .. })
        ));
    }
}

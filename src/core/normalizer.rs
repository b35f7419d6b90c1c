use crate::domain::model::{Cell, MissingNumeric};
use crate::utils::error::{EtlError, Result};

/// Parses a Brazilian-formatted number ("1.234,56") into `f64`.
///
/// Every `.` is dropped as a thousands separator and `,` becomes the decimal
/// point. Anything left that is not a finite decimal is a `FormatError`.
pub fn normalize_number(raw: &str) -> Result<f64> {
    let trimmed = raw.trim();
    let canonical: String = trimmed
        .chars()
        .filter(|c| *c != '.')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    // f64::from_str also accepts "inf"/"NaN", which are not cell values
    let looks_numeric = !canonical.is_empty()
        && canonical
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'));

    match canonical.parse::<f64>() {
        Ok(value) if looks_numeric && value.is_finite() => Ok(value),
        _ => Err(EtlError::FormatError {
            value: raw.to_string(),
        }),
    }
}

/// Normalizes a cell, substituting the policy value on failure.
pub fn normalize_cell(raw: &str, policy: MissingNumeric) -> (Cell, Option<EtlError>) {
    match normalize_number(raw) {
        Ok(value) => (Cell::Number(value), None),
        Err(e) => (policy.fill(), Some(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brazilian_format() {
        assert_eq!(normalize_number("1.234,56").unwrap(), 1234.56);
        assert_eq!(normalize_number("0,5").unwrap(), 0.5);
        assert_eq!(normalize_number("10").unwrap(), 10.0);
        assert_eq!(normalize_number("1.000.000").unwrap(), 1_000_000.0);
        assert_eq!(normalize_number(" 12,0 ").unwrap(), 12.0);
        assert_eq!(normalize_number("-3,25").unwrap(), -3.25);
    }

    #[test]
    fn test_non_numeric_is_format_error() {
        for bad in ["abc", "", "   ", "1,2,3", "inf", "NaN", "12 m³"] {
            let err = normalize_number(bad).unwrap_err();
            assert!(
                matches!(err, EtlError::FormatError { ref value } if value == bad),
                "{bad:?} should fail"
            );
        }
    }

    #[test]
    fn test_normalize_cell_policy() {
        assert_eq!(
            normalize_cell("1,5", MissingNumeric::Null).0,
            Cell::Number(1.5)
        );

        let (cell, err) = normalize_cell("abc", MissingNumeric::Null);
        assert_eq!(cell, Cell::Missing);
        assert!(err.is_some());

        let (cell, err) = normalize_cell("abc", MissingNumeric::Zero);
        assert_eq!(cell, Cell::Number(0.0));
        assert!(err.is_some());
    }
}

//! Numeric extraction from host-formatted parameter strings.
//!
//! Hosts render values like `"6.8 dB"`, `"-12.0 dB"`, `"440 Hz"` or `"Off"`.
//! Extraction first tries a full-string parse, then falls back to the first
//! run of ASCII digits (with at most one decimal point).

/// A number located inside a formatted string.
#[derive(Debug, Clone, Copy, PartialEq)]
struct NumericToken {
    value: f64,
    /// Byte offset just past the last character of the token.
    end: usize,
}

/// Extract a numeric value from a formatted string.
///
/// Returns `None` for empty strings, strings without digits and
/// non-finite values (`"inf"`, `"NaN"`).
pub fn extract_numeric_value(formatted: &str) -> Option<f64> {
    find_numeric_token(formatted).map(|t| t.value)
}

/// Extract the unit suffix that follows the number, e.g. `"6.8 dB"` -> `"dB"`.
///
/// Only suffixes starting with a letter, `%` or `°` count as units.
pub fn extract_unit(formatted: &str) -> Option<String> {
    let token = find_numeric_token(formatted)?;
    let suffix = formatted[token.end..].trim();
    let first = suffix.chars().next()?;
    if first.is_alphabetic() || first == '%' || first == '°' {
        Some(suffix.to_string())
    } else {
        None
    }
}

fn find_numeric_token(formatted: &str) -> Option<NumericToken> {
    let trimmed = formatted.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = trimmed.parse::<f64>() {
        return value.is_finite().then_some(NumericToken {
            value,
            end: formatted.len(),
        });
    }

    let mut digits = String::new();
    let mut start: Option<usize> = None;
    let mut end = 0;
    let mut seen_decimal_point = false;

    for (idx, ch) in formatted.char_indices() {
        if ch.is_ascii_digit() {
            if start.is_none() {
                start = Some(idx);
            }
            digits.push(ch);
            end = idx + ch.len_utf8();
        } else if ch == '.' && start.is_some() && !seen_decimal_point {
            digits.push(ch);
            seen_decimal_point = true;
            end = idx + ch.len_utf8();
        } else if start.is_some() {
            break;
        }
    }

    let start = start?;
    if digits.ends_with('.') {
        digits.pop();
        end -= 1;
    }

    let mut value: f64 = digits.parse().ok()?;
    if is_preceded_by_minus(formatted, start) {
        value = -value;
    }
    Some(NumericToken { value, end })
}

fn is_preceded_by_minus(formatted: &str, digit_start: usize) -> bool {
    matches!(formatted[..digit_start].chars().last(), Some('-') | Some('\u{2212}'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_parse() {
        assert_eq!(extract_numeric_value("0.75"), Some(0.75));
        assert_eq!(extract_numeric_value("-3"), Some(-3.0));
        assert_eq!(extract_numeric_value("1e3"), Some(1000.0));
    }

    #[test]
    fn test_number_with_unit() {
        assert_eq!(extract_numeric_value("6.8 dB"), Some(6.8));
        assert_eq!(extract_numeric_value("440Hz"), Some(440.0));
        assert_eq!(extract_numeric_value("Ratio 4.0:1"), Some(4.0));
    }

    #[test]
    fn test_leading_minus_is_kept() {
        assert_eq!(extract_numeric_value("-12.5 dB"), Some(-12.5));
        assert_eq!(extract_numeric_value("\u{2212}6 dB"), Some(-6.0));
        // A hyphen separated from the digits is not a sign
        assert_eq!(extract_numeric_value("Pre - 3 ms"), Some(3.0));
    }

    #[test]
    fn test_first_digit_run_only() {
        assert_eq!(extract_numeric_value("1.2.3"), Some(1.2));
        assert_eq!(extract_numeric_value("12 / 16"), Some(12.0));
        assert_eq!(extract_numeric_value("5. steps"), Some(5.0));
    }

    #[test]
    fn test_non_numeric() {
        assert_eq!(extract_numeric_value(""), None);
        assert_eq!(extract_numeric_value("Off"), None);
        assert_eq!(extract_numeric_value("-inf dB"), None);
        assert_eq!(extract_numeric_value("inf"), None);
        assert_eq!(extract_numeric_value("NaN"), None);
    }

    #[test]
    fn test_extract_unit() {
        assert_eq!(extract_unit("6.8 dB"), Some("dB".to_string()));
        assert_eq!(extract_unit("1.26 kHz"), Some("kHz".to_string()));
        assert_eq!(extract_unit("50%"), Some("%".to_string()));
        assert_eq!(extract_unit("0.5"), None);
        assert_eq!(extract_unit("Off"), None);
        assert_eq!(extract_unit("4.0:1"), None);
    }
}

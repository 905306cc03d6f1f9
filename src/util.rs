// Parsing and display helpers.
//
// The source dataset is Brazilian: numbers use `,` as the decimal separator
// and dates are written day first. Everything locale-specific lives here so
// the rest of the crate can work on typed values.
use chrono::{NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};

/// Parse a raw `valor_contrato` value.
///
/// - Trims whitespace; an empty value is `0`.
/// - When a comma is present it is the decimal separator and every `.` is a
///   thousands separator (`"1.234,56"` is `1234.56`).
/// - Without a comma the text is parsed as-is (`"1000"`, `"12.5"`).
///
/// Returns `None` for non-numeric or non-finite content.
pub fn parse_decimal_comma(s: Option<&str>) -> Option<f64> {
    let s = s.unwrap_or("").trim();
    let normalized = if s.contains(',') {
        s.replace('.', "").replace(',', ".")
    } else {
        s.to_string()
    };
    if normalized.is_empty() {
        return Some(0.0);
    }
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d"];

const DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parse a day-first date. Audit timestamps carry a time of day, which is
/// dropped. Anything unrecognised is `None`.
pub fn parse_date_dayfirst(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Trimmed text, `""` when absent.
pub fn clean_text(s: Option<String>) -> String {
    s.map(|v| v.trim().to_string()).unwrap_or_default()
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // pt-BR layout: `.` groups thousands and `,` separates decimals,
    // e.g. `1.234.567,89`.
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let mut res = match int_part.parse::<u128>() {
        Ok(v) => v.to_formatted_string(&Locale::pt),
        Err(_) => group_thousands(int_part, Locale::pt.separator()),
    };
    if decimals > 0 {
        res.push_str(Locale::pt.decimal());
        match frac_part {
            Some(frac) => res.push_str(frac),
            None => res.push_str(&"0".repeat(decimals)),
        }
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

/// Digit grouping for integer parts too wide for `u128`. Anything that is
/// not a plain digit run (`inf`, `NaN`) is returned unchanged.
fn group_thousands(digits: &str, separator: &str) -> String {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return digits.to_string();
    }
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 * separator.len());
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(ch);
    }
    out
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::pt)
}

/// `R$ 1.234,56`. The symbol is whatever currency the analysis ran on.
pub fn format_currency(symbol: &str, n: f64) -> String {
    format!("{} {}", symbol, format_number(n, 2))
}

pub fn format_pct(n: f64) -> String {
    format!("{}%", format_number(n, 2))
}

pub fn format_date(d: Option<NaiveDate>) -> String {
    d.map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_comma_values() {
        assert_eq!(parse_decimal_comma(Some("1.234,56")), Some(1234.56));
        assert_eq!(parse_decimal_comma(Some("")), Some(0.0));
        assert_eq!(parse_decimal_comma(Some("1000")), Some(1000.0));
        assert_eq!(parse_decimal_comma(Some(" 12,5 ")), Some(12.5));
        assert_eq!(parse_decimal_comma(None), Some(0.0));
    }

    #[test]
    fn decimal_comma_rejects_text() {
        assert_eq!(parse_decimal_comma(Some("abc")), None);
        assert_eq!(parse_decimal_comma(Some("12,5 mil")), None);
        assert_eq!(parse_decimal_comma(Some("NaN")), None);
        assert_eq!(parse_decimal_comma(Some("inf")), None);
    }

    #[test]
    fn dates_are_day_first() {
        let d = NaiveDate::from_ymd_opt(2023, 4, 5).unwrap();
        assert_eq!(parse_date_dayfirst(Some("05/04/2023")), Some(d));
        assert_eq!(parse_date_dayfirst(Some("05-04-2023")), Some(d));
        assert_eq!(parse_date_dayfirst(Some("2023-04-05")), Some(d));
        assert_eq!(parse_date_dayfirst(Some("05/04/2023 13:45:10")), Some(d));
    }

    #[test]
    fn bad_dates_are_absent() {
        assert_eq!(parse_date_dayfirst(None), None);
        assert_eq!(parse_date_dayfirst(Some("")), None);
        assert_eq!(parse_date_dayfirst(Some("31/02/2023")), None);
        assert_eq!(parse_date_dayfirst(Some("amanhã")), None);
    }

    #[test]
    fn pt_br_formatting() {
        assert_eq!(format_number(1234567.891, 2), "1.234.567,89");
        assert_eq!(format_number(-0.5, 1), "-0,5");
        assert_eq!(format_number(0.0, 2), "0,00");
        assert_eq!(format_currency("R$", 250.0), "R$ 250,00");
        assert_eq!(format_pct(60.0), "60,00%");
        assert_eq!(format_int(12345usize), "12.345");
        assert_eq!(
            format_date(NaiveDate::from_ymd_opt(2024, 1, 31)),
            "31/01/2024"
        );
        assert_eq!(format_date(None), "-");
    }

    #[test]
    fn large_values_keep_their_digits() {
        assert_eq!(format_number(2e19, 2), "20.000.000.000.000.000.000,00");
        assert_eq!(format_currency("R$", 2e19), "R$ 20.000.000.000.000.000.000,00");
        let huge = format_number(1e40, 0);
        assert!(huge.starts_with("10.000.000.000"));
        assert_eq!(huge.len(), 41 + 13);
    }
}

use profit_core::InputError;
use profit_core::calculations::common::round_half_up;
use rust_decimal::Decimal;

/// Normalizes input for decimal parsing: trims whitespace, a leading `$`,
/// and commas used as thousands separators.
fn normalize_decimal_input(s: &str) -> String {
    s.trim().trim_start_matches('$').replace(',', "")
}

/// Parses a required field.
///
/// Handles comma as thousands separator (e.g. `"1,234.56"`) and a leading
/// `$`.
///
/// # Errors
///
/// * [`InputError::Missing`] for empty or whitespace-only input.
/// * [`InputError::Parse`] when the input is not a number.
pub fn parse_required_decimal(
    field: &str,
    s: &str,
) -> Result<Decimal, InputError> {
    parse_optional_decimal(field, s)?.ok_or_else(|| InputError::Missing {
        field: field.to_string(),
    })
}

/// Parses a field that defaults to zero when left empty.
pub fn parse_decimal(
    field: &str,
    s: &str,
) -> Result<Decimal, InputError> {
    Ok(parse_optional_decimal(field, s)?.unwrap_or(Decimal::ZERO))
}

/// Parses an optional field. Returns `None` for empty or whitespace-only
/// input.
pub fn parse_optional_decimal(
    field: &str,
    s: &str,
) -> Result<Option<Decimal>, InputError> {
    let normalized = normalize_decimal_input(s);
    if normalized.is_empty() {
        return Ok(None);
    }
    normalized.parse().map(Some).map_err(|e| {
        tracing::warn!(field, input = %s, "invalid decimal: {}", e);
        InputError::Parse {
            field: field.to_string(),
            input: s.to_string(),
        }
    })
}

/// Inserts thousands separators into a number already rounded to two places.
fn group_thousands(value: Decimal) -> String {
    let text = format!("{:.2}", round_half_up(value).abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{grouped}.{frac_part}")
}

/// Formats an amount as `$1,234.56`; negatives as `-$1,234.56`.
pub fn format_currency(value: Decimal) -> String {
    let sign = if round_half_up(value) < Decimal::ZERO { "-" } else { "" };
    format!("{sign}${}", group_thousands(value))
}

/// Formats a plain quantity with separators, e.g. `4,000.00`.
pub fn format_quantity(value: Decimal) -> String {
    let sign = if round_half_up(value) < Decimal::ZERO { "-" } else { "" };
    format!("{sign}{}", group_thousands(value))
}

/// Formats a percentage with two decimals, e.g. `40.00%`.
pub fn format_percent(value: Decimal) -> String {
    format!("{:.2}%", round_half_up(value))
}

/// Formats an optional amount for display, using "—" when `None`.
pub fn opt_currency_display(d: Option<Decimal>) -> String {
    d.map(format_currency).unwrap_or_else(|| "—".to_string())
}

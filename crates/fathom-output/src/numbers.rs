//! Number formatting shared by the renderers.

/// Two-decimal amount with thousands separators.
pub(crate) fn amount(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let formatted = format!("{:.2}", value.abs());
    let (integer, fraction) = formatted.split_once('.').unwrap_or((&formatted, "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let negative = value < 0.0 && formatted.chars().any(|c| c.is_ascii_digit() && c != '0');
    format!("{}{grouped}.{fraction}", if negative { "-" } else { "" })
}

/// [`amount`], or `n/a` when absent.
pub(crate) fn optional_amount(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), amount)
}

/// A rate as a percentage with two decimals.
pub(crate) fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}%", v * 100.0))
}

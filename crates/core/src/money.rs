use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;

/// Parses a backend decimal string. Tolerates surrounding whitespace, thousands
/// separators and a leading currency sign. Returns `None` for anything that is
/// still not a number.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | '_' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
}

pub fn amount_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => parse_amount(s),
        Value::Number(n) => parse_amount(&n.to_string()),
        _ => None,
    }
}

/// Like [`amount_from_value`] but substitutes zero, logging the bad input.
pub fn amount_or_zero(field: &str, value: &Value) -> Decimal {
    if value.is_null() {
        return Decimal::ZERO;
    }
    amount_from_value(value).unwrap_or_else(|| {
        tracing::warn!(field, raw = %value, "malformed monetary value; using 0");
        Decimal::ZERO
    })
}

/// serde `deserialize_with` target for required monetary fields. Never fails:
/// malformed or missing values become zero. Pair with `#[serde(default)]`.
pub fn lenient<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .map(|v| amount_or_zero("amount", &v))
        .unwrap_or(Decimal::ZERO))
}

/// serde `deserialize_with` target for optional monetary fields. Malformed
/// values are dropped to `None`.
pub fn lenient_opt<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(v) => {
            let parsed = amount_from_value(&v);
            if parsed.is_none() {
                tracing::warn!(raw = %v, "malformed optional monetary value; ignoring");
            }
            parsed
        }
    })
}

/// Whole-unit dollar label, e.g. `$12,345` or `-$1,200`.
pub fn format_currency(amount: Decimal) -> String {
    let digits = amount.abs().round_dp(0).trunc().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if amount.is_sign_negative() && !grouped.chars().all(|c| c == '0') {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

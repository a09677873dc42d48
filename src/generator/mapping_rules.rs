//! Field transformations between the legacy and target payment wire shapes.
//!
//! The field mapper template is rendered from [`REQUEST_RULES`] and
//! [`RESPONSE_RULES`], and every helper it emits has a Rust twin here so the
//! conversion behaviour is pinned down by tests rather than by generated code.

use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde_json::{Map, Value};

/// Legacy status vocabulary paired with the target one.
pub const STATUS_TABLE: &[(&str, &str)] = &[
    ("APPROVED", "APPROVAL"),
    ("DECLINED", "DECLINE"),
    ("PENDING", "PENDING"),
    ("CANCELLED", "VOID"),
    ("REFUNDED", "REFUND"),
];

/// Result for a target status missing from [`STATUS_TABLE`].
pub const UNMAPPED_RESULT: &str = "ERROR";
/// Status for a legacy result missing from [`STATUS_TABLE`].
pub const UNMAPPED_STATUS: &str = "FAILED";

/// Conversion applied to one field while copying it across.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    Copy,
    FormatAmount,
    ExtractExpiryMonth,
    ExtractExpiryYear,
    MaskCardNumber,
    MapStatusToResult,
    FormatTimestamp,
}

impl Transform {
    /// Java expression reading `path` from the map named `var`.
    pub fn java_expression(self, var: &str, path: &str) -> String {
        let read = format!("getPath({var}, \"{path}\")");
        match self {
            Transform::Copy => read,
            Transform::FormatAmount => format!("formatAmount(asLong({read}))"),
            Transform::ExtractExpiryMonth => format!("extractExpiryMonth(asString({read}))"),
            Transform::ExtractExpiryYear => format!("extractExpiryYear(asString({read}))"),
            Transform::MaskCardNumber => format!("maskCardNumber(asString({read}))"),
            Transform::MapStatusToResult => format!("mapStatusToResult(asString({read}))"),
            Transform::FormatTimestamp => format!("formatTimestamp(asTimestamp({read}))"),
        }
    }

    fn apply(self, value: &Value) -> Option<Value> {
        let text = || match value {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        };
        match self {
            Transform::Copy => (!value.is_null()).then(|| value.clone()),
            Transform::FormatAmount => format_amount(value.as_i64()).map(Value::String),
            Transform::ExtractExpiryMonth => {
                extract_expiry_month(text().as_deref()).map(Value::String)
            }
            Transform::ExtractExpiryYear => extract_expiry_year(text().as_deref()).map(Value::String),
            Transform::MaskCardNumber => mask_card_number(text().as_deref()).map(Value::String),
            Transform::MapStatusToResult => text()
                .map(|s| Value::String(map_status_to_result(&s).to_string())),
            Transform::FormatTimestamp => text()
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .and_then(|t| format_timestamp(Some(t)))
                .map(Value::String),
        }
    }
}

/// One field copied from `source` to `target`, both dotted paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub source: &'static str,
    pub target: &'static str,
    pub transform: Transform,
}

const fn rule(source: &'static str, target: &'static str, transform: Transform) -> FieldRule {
    FieldRule {
        source,
        target,
        transform,
    }
}

/// Legacy request fields to target request fields.
pub const REQUEST_RULES: &[FieldRule] = &[
    rule("amount", "total.amount", Transform::FormatAmount),
    rule("currency", "total.currencyCode", Transform::Copy),
    rule("cardExpiry", "card.expirationMonth", Transform::ExtractExpiryMonth),
    rule("cardExpiry", "card.expirationYear", Transform::ExtractExpiryYear),
    rule("cardNumber", "card.number", Transform::MaskCardNumber),
];

/// Target response fields back to the legacy response.
pub const RESPONSE_RULES: &[FieldRule] = &[
    rule("status", "result", Transform::MapStatusToResult),
    rule("authorizationCode", "approvalCode", Transform::Copy),
    rule("transactionId", "txnId", Transform::Copy),
    rule("createdAt", "timestamp", Transform::FormatTimestamp),
];

/// Minor units to a plain decimal string: `12345` → `"123.45"`, `100` → `"1"`.
pub fn format_amount(minor_units: Option<i64>) -> Option<String> {
    let value = minor_units?;
    let sign = if value < 0 { "-" } else { "" };
    let abs = value.unsigned_abs();
    let (whole, cents) = (abs / 100, abs % 100);
    Some(match cents {
        0 => format!("{sign}{whole}"),
        c if c % 10 == 0 => format!("{sign}{whole}.{}", c / 10),
        c => format!("{sign}{whole}.{c:02}"),
    })
}

/// Decimal string to minor units, truncating sub-cent digits.
///
/// Returns `None` for text that is not a plain decimal number.
pub fn parse_amount(amount: Option<&str>) -> Option<i64> {
    let text = amount?.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }
    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let cents: i64 = format!("{:0<2}", &fraction[..fraction.len().min(2)]).parse().ok()?;
    let total = whole.checked_mul(100)?.checked_add(cents)?;
    Some(if negative { -total } else { total })
}

/// `"1227"` → `"12"`.
pub fn extract_expiry_month(expiry: Option<&str>) -> Option<String> {
    expiry?.get(0..2).map(str::to_string)
}

/// `"1227"` → `"2027"`.
pub fn extract_expiry_year(expiry: Option<&str>) -> Option<String> {
    expiry?.get(2..4).map(|yy| format!("20{yy}"))
}

/// Inverse of the two extractors: `("7", "2027")` → `"0727"`.
pub fn join_expiry(month: Option<&str>, year: Option<&str>) -> Option<String> {
    let month = month?.trim();
    let year = year?.trim();
    if month.is_empty() || month.len() > 2 || year.len() < 2 {
        return None;
    }
    let yy = year.get(year.len() - 2..)?;
    Some(format!("{month:0>2}{yy}"))
}

/// Card numbers never cross the boundary; upstream tokenization is assumed.
pub fn mask_card_number(_card_number: Option<&str>) -> Option<String> {
    None
}

pub fn last_four_digits(card_number: Option<&str>) -> Option<String> {
    let number = card_number?;
    let start = number.len().checked_sub(4)?;
    number.get(start..).map(str::to_string)
}

/// ISO-8601 with offset, `Z` for UTC.
pub fn format_timestamp(timestamp: Option<DateTime<FixedOffset>>) -> Option<String> {
    timestamp.map(|t| t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

pub fn map_status_to_result(status: &str) -> &'static str {
    STATUS_TABLE
        .iter()
        .find(|(legacy, _)| *legacy == status)
        .map_or(UNMAPPED_RESULT, |&(_, result)| result)
}

pub fn map_result_to_status(result: &str) -> &'static str {
    STATUS_TABLE
        .iter()
        .find(|(_, target)| *target == result)
        .map_or(UNMAPPED_STATUS, |&(status, _)| status)
}

fn get_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(root, |node, key| node.get(key))
}

fn put_path(node: &mut Map<String, Value>, keys: &[&str], value: Value) {
    match keys {
        [] => {}
        [last] => {
            node.insert((*last).to_string(), value);
        }
        [first, rest @ ..] => {
            let entry = node
                .entry((*first).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(child) = entry {
                put_path(child, rest, value);
            }
        }
    }
}

/// Apply `rules` to a JSON payload, skipping fields that are absent or map to null.
pub fn apply_rules(rules: &[FieldRule], source: &Value) -> Value {
    let mut target = Map::new();
    for rule in rules {
        if let Some(value) = get_path(source, rule.source).and_then(|v| rule.transform.apply(v)) {
            let keys: Vec<&str> = rule.target.split('.').collect();
            put_path(&mut target, &keys, value);
        }
    }
    Value::Object(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_amount_round_trip() {
        assert_eq!(format_amount(Some(12345)).as_deref(), Some("123.45"));
        assert_eq!(parse_amount(format_amount(Some(12345)).as_deref()), Some(12345));
        assert_eq!(format_amount(None), None);
        assert_eq!(parse_amount(None), None);
    }

    #[test]
    fn test_amount_formatting_strips_zeros() {
        assert_eq!(format_amount(Some(100)).as_deref(), Some("1"));
        assert_eq!(format_amount(Some(12340)).as_deref(), Some("123.4"));
        assert_eq!(format_amount(Some(5)).as_deref(), Some("0.05"));
        assert_eq!(format_amount(Some(-250)).as_deref(), Some("-2.5"));
    }

    #[test]
    fn test_parse_amount_edges() {
        assert_eq!(parse_amount(Some("10")), Some(1000));
        assert_eq!(parse_amount(Some("0.5")), Some(50));
        assert_eq!(parse_amount(Some("1.239")), Some(123));
        assert_eq!(parse_amount(Some("-2.5")), Some(-250));
        assert_eq!(parse_amount(Some("abc")), None);
        assert_eq!(parse_amount(Some(".")), None);
    }

    #[test]
    fn test_expiry_split_and_join() {
        assert_eq!(extract_expiry_month(Some("1227")).as_deref(), Some("12"));
        assert_eq!(extract_expiry_year(Some("1227")).as_deref(), Some("2027"));
        assert_eq!(extract_expiry_year(Some("12")), None);
        assert_eq!(extract_expiry_month(Some("1")), None);
        assert_eq!(join_expiry(Some("7"), Some("2027")).as_deref(), Some("0727"));
        assert_eq!(join_expiry(Some("12"), None), None);
    }

    #[test]
    fn test_card_number_never_leaks() {
        assert_eq!(mask_card_number(Some("4111111111111111")), None);
        assert_eq!(last_four_digits(Some("4111111111111111")).as_deref(), Some("1111"));
        assert_eq!(last_four_digits(Some("411")), None);
    }

    #[test]
    fn test_status_tables_have_own_defaults() {
        assert_eq!(map_status_to_result("REFUNDED"), "REFUND");
        assert_eq!(map_status_to_result("UNKNOWN"), "ERROR");
        assert_eq!(map_result_to_status("VOID"), "CANCELLED");
        assert_eq!(map_result_to_status("UNKNOWN"), "FAILED");
        assert_ne!(map_result_to_status(map_status_to_result("UNKNOWN")), "UNKNOWN");
    }

    #[test]
    fn test_timestamp_format() {
        let t = DateTime::parse_from_rfc3339("2024-03-01T10:15:30+00:00").ok();
        assert_eq!(format_timestamp(t).as_deref(), Some("2024-03-01T10:15:30Z"));
    }

    #[test]
    fn test_apply_request_rules() {
        let legacy = json!({
            "amount": 12345,
            "currency": "USD",
            "cardExpiry": "0927",
            "cardNumber": "4111111111111111"
        });
        assert_eq!(
            apply_rules(REQUEST_RULES, &legacy),
            json!({
                "total": {"amount": "123.45", "currencyCode": "USD"},
                "card": {"expirationMonth": "09", "expirationYear": "2027"}
            })
        );
    }

    #[test]
    fn test_apply_response_rules() {
        let target = json!({
            "status": "DECLINED",
            "transactionId": "t-1",
            "createdAt": "2024-03-01T10:15:30+02:00"
        });
        assert_eq!(
            apply_rules(RESPONSE_RULES, &target),
            json!({
                "result": "DECLINE",
                "txnId": "t-1",
                "timestamp": "2024-03-01T10:15:30+02:00"
            })
        );
    }

    #[test]
    fn test_java_expression() {
        assert_eq!(
            Transform::FormatAmount.java_expression("legacy", "amount"),
            "formatAmount(asLong(getPath(legacy, \"amount\")))"
        );
        assert_eq!(
            Transform::Copy.java_expression("target", "txnId"),
            "getPath(target, \"txnId\")"
        );
    }
}

//! Conversions from raw JSON values to canonical attribute values
//!
//! Each conversion returns `None` for an absent or unusable value. Callers
//! that need to distinguish "absent" from "wrong type" check [`is_absent`]
//! first.

use serde_json::Value;

/// `null`, missing, or a blank string
pub fn is_absent(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// Render a scalar as trimmed text. Arrays and objects are not text.
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Integer-like year: an integer, an integral float, or a string of either
pub fn as_year(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i32::try_from(i).ok()
            } else {
                n.as_f64().and_then(integral_to_i32)
            }
        }
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i32>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().and_then(integral_to_i32))
        }
        _ => None,
    }
}

/// Numeric-like amount; strings may carry `$`, thousands separators or spaces
pub fn as_amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .chars()
                .filter(|c| !matches!(c, '$' | ',' | ' '))
                .collect();
            cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
        }
        _ => None,
    }
}

fn integral_to_i32(v: f64) -> Option<i32> {
    if v.is_finite() && v.fract() == 0.0 && v >= i32::MIN as f64 && v <= i32::MAX as f64 {
        Some(v as i32)
    } else {
        None
    }
}

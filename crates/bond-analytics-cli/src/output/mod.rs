pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Result fields holding the row-shaped part of an output, in priority order.
pub(crate) const ROW_FIELDS: [&str; 4] = ["results", "points", "cash_flows", "forward_rates"];

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// The `result` object of an output envelope, or the value itself.
pub(crate) fn result_of(value: &Value) -> &Value {
    value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value)
}

/// Scalar fields of `map`, with nested objects expanded to `parent.child`.
/// Arrays are left out.
pub(crate) fn flatten_scalars(map: &Map<String, Value>) -> Vec<(String, Value)> {
    let mut out = Vec::new();
    for (key, val) in map {
        match val {
            Value::Array(_) => {}
            Value::Object(inner) => {
                for (child, v) in flatten_scalars(inner) {
                    out.push((format!("{key}.{child}"), v));
                }
            }
            _ => out.push((key.clone(), val.clone())),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_scalars_expands_nested_objects() {
        let value = json!({
            "price": 95.0,
            "risk_metrics": { "convexity": 22.6 },
            "cash_flows": [1, 2],
        });
        let flat = flatten_scalars(value.as_object().unwrap());
        let keys: Vec<&str> = flat.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["price", "risk_metrics.convexity"]);
    }

    #[test]
    fn test_result_of_unwraps_envelope() {
        let value = json!({ "result": { "price": 1.0 }, "warnings": [] });
        assert_eq!(result_of(&value), &json!({ "price": 1.0 }));
        let bare = json!([1, 2]);
        assert_eq!(result_of(&bare), &bare);
    }
}

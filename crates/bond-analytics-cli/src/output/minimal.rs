use serde_json::Value;

use super::result_of;

/// Print just the key answer from the output.
///
/// A single bond prints its price and yield; curve and profile points print
/// one line per point; batch rows print one line per row.
pub fn print_minimal(value: &Value) {
    for line in minimal_lines(result_of(value)) {
        println!("{}", line);
    }
}

fn minimal_lines(result: &Value) -> Vec<String> {
    let Value::Object(map) = result else {
        return vec![format_minimal(result)];
    };

    if let Some(Value::Array(rows)) = map.get("results") {
        return rows
            .iter()
            .map(|r| {
                let answer = ["error", "calculated_ytm", "calculated_price", "note"]
                    .iter()
                    .find_map(|k| r.get(*k).filter(|v| !v.is_null()))
                    .map(format_minimal)
                    .unwrap_or_else(|| "null".to_string());
                format!("{}\t{}", field(r, "row_number"), answer)
            })
            .collect();
    }

    if let Some(Value::Array(points)) = map.get("points") {
        return points
            .iter()
            .map(|p| match p.get("maturity") {
                Some(m) => format!("{}\t{}", format_minimal(m), field(p, "zero_rate")),
                None => format!("{}\t{}", field(p, "ytm"), field(p, "price")),
            })
            .collect();
    }

    if map.contains_key("price") {
        return vec![format!("{}\t{}", field(result, "price"), field(result, "ytm"))];
    }

    map.iter()
        .next()
        .map(|(key, val)| vec![format!("{}: {}", key, format_minimal(val))])
        .unwrap_or_default()
}

fn field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .map(format_minimal)
        .unwrap_or_else(|| "null".to_string())
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_bond_prints_price_and_yield() {
        let result = json!({ "price": 95.0, "ytm": 0.06, "classification": "discount" });
        assert_eq!(minimal_lines(&result), vec!["95.0\t0.06"]);
    }

    #[test]
    fn test_curve_points() {
        let result = json!({ "points": [
            { "maturity": 0.5, "zero_rate": 0.0202 },
            { "maturity": 1.5, "zero_rate": null },
        ]});
        assert_eq!(minimal_lines(&result), vec!["0.5\t0.0202", "1.5\tnull"]);
    }

    #[test]
    fn test_batch_rows_prefer_error() {
        let result = json!({ "results": [
            { "row_number": 1, "calculated_ytm": 0.05, "calculated_price": null, "error": null },
            { "row_number": 2, "calculated_ytm": null, "error": "missing input" },
        ]});
        assert_eq!(minimal_lines(&result), vec!["1\t0.05", "2\tmissing input"]);
    }
}

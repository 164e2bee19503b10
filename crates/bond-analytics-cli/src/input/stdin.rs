use serde_json::Value;
use std::io::{self, Read};
use tracing::debug;

/// Piped stdin as trimmed text. `None` when stdin is a terminal or the pipe
/// carried nothing but whitespace.
pub fn read_stdin_text() -> Result<Option<String>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    debug!(bytes = trimmed.len(), "read piped input from stdin");
    Ok(Some(trimmed.to_string()))
}

/// Piped JSON for the single-request commands.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    match read_stdin_text()? {
        Some(text) => parse_json(&text).map(Some),
        None => Ok(None),
    }
}

/// A JSON document starts with an object or an array; anything else piped to
/// `batch` is treated as CSV.
pub fn looks_like_json(text: &str) -> bool {
    matches!(text.trim_start().chars().next(), Some('{') | Some('['))
}

pub fn parse_json(text: &str) -> Result<Value, Box<dyn std::error::Error>> {
    let value = serde_json::from_str(text)
        .map_err(|e| format!("Failed to parse JSON from stdin: {}", e))?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_looks_like_json() {
        assert!(looks_like_json("{\"rows\": []}"));
        assert!(looks_like_json("  [ ]"));
        assert!(!looks_like_json("Settlement Date,Maturity Date\n2023-01-01,2028-01-01"));
    }

    #[test]
    fn test_parse_json_error_names_stdin() {
        let err = parse_json("{ not json").unwrap_err();
        assert!(err.to_string().contains("stdin"));
    }
}

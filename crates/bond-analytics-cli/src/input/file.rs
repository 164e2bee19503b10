use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Read a JSON file and deserialise into a typed struct.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    let value: T = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?;
    Ok(value)
}

/// Read a JSON file as a generic serde_json::Value.
pub fn read_json_value(path: &str) -> Result<Value, Box<dyn std::error::Error>> {
    read_json(path)
}

/// Read a headed CSV file. Returns the header names and one record per row;
/// empty cells deserialise to `None` for optional fields.
pub fn read_csv<T: DeserializeOwned>(
    path: &str,
) -> Result<(Vec<String>, Vec<T>), Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let file = fs::File::open(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    parse_csv(file, &format!("'{}'", canonical.display()))
}

/// Parse headed CSV from any reader; `source` names it in error messages.
pub fn parse_csv<T: DeserializeOwned, R: io::Read>(
    input: R,
    source: &str,
) -> Result<(Vec<String>, Vec<T>), Box<dyn std::error::Error>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| format!("Failed to read headers of {}: {}", source, e))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut records = Vec::new();
    for (i, record) in reader.deserialize().enumerate() {
        let record: T =
            record.map_err(|e| format!("Failed to parse row {} of {}: {}", i + 1, source, e))?;
        records.push(record);
    }

    Ok((headers, records))
}

/// Resolve and validate the path.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}

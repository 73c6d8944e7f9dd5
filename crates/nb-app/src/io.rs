use std::path::Path;

use anyhow::{Context, Result, bail};
use nb_core::{CoreError, Map, Value};

/// Read a JSON or TOML document, chosen by extension.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed, or has another
/// extension.
pub fn read_document(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(CoreError::FileNotFound {
            path: path.display().to_string(),
        }
        .into());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let value = match extension.as_str() {
        "json" => Value::from(
            serde_json::from_str::<serde_json::Value>(&content)
                .with_context(|| format!("Invalid JSON in {}", path.display()))?,
        ),
        "toml" => Value::from(
            toml::from_str::<toml::Value>(&content)
                .with_context(|| format!("Invalid TOML in {}", path.display()))?,
        ),
        other => {
            return Err(CoreError::UnsupportedFormat {
                format: other.to_string(),
            }
            .into());
        }
    };
    log::debug!("read {} ({})", path.display(), value.type_name());
    Ok(value)
}

/// Read a document whose root must be a map.
///
/// # Errors
/// See [`read_document`]; also fails for a non-map root.
pub fn read_map(path: &Path) -> Result<Map> {
    match read_document(path)? {
        Value::Map(map) => Ok(map),
        other => bail!("{}: expected a table at the root, found {}", path.display(), other.type_name()),
    }
}

/// Parse a JSON literal given on the command line.
///
/// # Errors
/// Returns an error on invalid JSON.
pub fn parse_json_literal(text: &str) -> Result<Value> {
    let json: serde_json::Value =
        serde_json::from_str(text).with_context(|| format!("Invalid JSON literal: {text}"))?;
    Ok(Value::from(json))
}

/// Pretty JSON rendering.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn to_json(value: &Value) -> Result<String> {
    serde_json::to_string_pretty(&serde_json::Value::from(value)).context("JSON serialization failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn file_with(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn reads_json_and_toml() {
        let json = file_with(".json", r#"{"a": {"b": [1, 2]}}"#);
        let toml = file_with(".toml", "[a]\nb = [1, 2]\n");
        assert_eq!(read_document(json.path()).unwrap(), read_document(toml.path()).unwrap());
    }

    #[test]
    fn rejects_unknown_extension_and_non_map_root() {
        let yaml = file_with(".yaml", "a: 1");
        assert!(read_document(yaml.path()).is_err());
        let list = file_with(".json", "[1, 2]");
        assert!(read_map(list.path()).is_err());
    }

    #[test]
    fn json_output_keeps_key_order() {
        let value = parse_json_literal(r#"{"z": 1, "a": 2}"#).unwrap();
        let text = to_json(&value).unwrap();
        assert!(text.find("\"z\"").unwrap() < text.find("\"a\"").unwrap());
    }
}

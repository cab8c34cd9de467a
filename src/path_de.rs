use serde::de::DeserializeOwned;

/// Deserialize JSON, reporting the path of the offending field on failure.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, String> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| {
        let path = err.path().to_string();
        format!("at JSON path {path} → {}", err.into_inner())
    })
}

/// Like [`from_str_with_path`] for a single NDJSON line; the line number
/// is 1-based.
pub fn from_line_with_path<T: DeserializeOwned>(line: &str, line_no: usize) -> Result<T, String> {
    from_str_with_path(line).map_err(|msg| format!("line {line_no}: {msg}"))
}

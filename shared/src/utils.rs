/// Trim an optional free-text field, mapping `None` to an empty string.
pub fn trimmed_or_empty(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_string()
}

/// True when `value` holds nothing but whitespace.
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

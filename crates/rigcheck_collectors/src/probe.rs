//! Shared plumbing for collectors that shell out to Windows tools.
//!
//! Off Windows every probe returns `None` and the callers degrade on their
//! own terms. Output decoding is lossy on purpose; localized tool output is
//! not guaranteed to be valid UTF-8.

#[cfg(windows)]
use std::process::Command;

use chrono::{DateTime, NaiveDate};
use serde_json::Value;

/// Run a command and return trimmed stdout, or `None` when the command is
/// missing or fails. Empty output on success is a valid result; a query can
/// legitimately match nothing.
#[cfg(windows)]
pub(crate) fn command(name: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(name).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[cfg(not(windows))]
pub(crate) fn command(_name: &str, _args: &[&str]) -> Option<String> {
    None
}

/// Run a PowerShell one-liner. Used for the CIM queries.
pub(crate) fn powershell(script: &str) -> Option<String> {
    command(
        "powershell",
        &["-NoProfile", "-NonInteractive", "-Command", script],
    )
}

/// Query a single registry value via `reg query`.
pub(crate) fn reg_query(key: &str, value: &str) -> Option<String> {
    command("reg", &["query", key, "/v", value])
}

/// `ConvertTo-Json` emits a bare object for one instance and an array for
/// several. Flatten both shapes into a record list.
pub(crate) fn json_records(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => vec![value],
        _ => Vec::new(),
    }
}

/// Pull a string field out of a JSON record, trimmed, empty when absent.
pub(crate) fn text_field(record: &Value, key: &str) -> String {
    record
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim()
        .to_string()
}

/// Extract the data column from `reg query` output. The value line looks
/// like `    Version    REG_SZ    14.38.33130` and REG_SZ data may itself
/// contain spaces.
pub(crate) fn parse_reg_value(output: &str) -> Option<String> {
    for line in output.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if let Some(pos) = tokens.iter().position(|t| t.starts_with("REG_")) {
            if pos + 1 < tokens.len() {
                return Some(tokens[pos + 1..].join(" "));
            }
        }
    }
    None
}

/// Like [`parse_reg_value`] for REG_DWORD data, which `reg` prints as hex.
pub(crate) fn parse_reg_dword(output: &str) -> Option<u64> {
    let value = parse_reg_value(output)?;
    match value.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}

/// CIM dates arrive as `/Date(<epoch ms>)/` through ConvertTo-Json on
/// Windows PowerShell and as ISO 8601 on PowerShell 7.
pub(crate) fn parse_cim_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Some(ms) = raw.strip_prefix("/Date(").and_then(|r| r.strip_suffix(")/")) {
        let ms: i64 = ms.parse().ok()?;
        return DateTime::from_timestamp_millis(ms).map(|dt| dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_records_flattens_both_shapes() {
        let single = json!({"Name": "one"});
        assert_eq!(json_records(&single).len(), 1);

        let many = json!([{"Name": "one"}, {"Name": "two"}]);
        assert_eq!(json_records(&many).len(), 2);

        assert!(json_records(&json!("scalar")).is_empty());
        assert!(json_records(&json!(null)).is_empty());
    }

    #[test]
    fn test_text_field_trims_and_defaults() {
        let record = json!({"Name": "  GeForce RTX 4070  ", "Empty": null, "Num": 7});
        assert_eq!(text_field(&record, "Name"), "GeForce RTX 4070");
        assert_eq!(text_field(&record, "Empty"), "");
        assert_eq!(text_field(&record, "Num"), "");
        assert_eq!(text_field(&record, "Missing"), "");
    }

    #[test]
    fn test_parse_reg_value_keeps_spaces_in_data() {
        let output = "\r\nHKEY_LOCAL_MACHINE\\SOFTWARE\\Microsoft\\Windows NT\\CurrentVersion\r\n    ProductName    REG_SZ    Windows 10 Pro\r\n";
        assert_eq!(parse_reg_value(output).as_deref(), Some("Windows 10 Pro"));
    }

    #[test]
    fn test_parse_reg_value_missing() {
        assert_eq!(parse_reg_value("ERROR: The system was unable to find it"), None);
        assert_eq!(parse_reg_value(""), None);
        // Type token with no data column.
        assert_eq!(parse_reg_value("    Empty    REG_SZ"), None);
    }

    #[test]
    fn test_parse_reg_dword_hex_and_decimal() {
        let output = "    AutoGameModeEnabled    REG_DWORD    0x1";
        assert_eq!(parse_reg_dword(output), Some(1));

        let output = "    HwSchMode    REG_DWORD    0x2";
        assert_eq!(parse_reg_dword(output), Some(2));

        let output = "    Release    REG_DWORD    533320";
        assert_eq!(parse_reg_dword(output), Some(533320));

        assert_eq!(parse_reg_dword("    Broken    REG_DWORD    0xzz"), None);
    }

    #[test]
    fn test_parse_cim_date_formats() {
        let day = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
        assert_eq!(parse_cim_date("/Date(1705363200000)/"), Some(day(2024, 1, 16)));
        assert_eq!(
            parse_cim_date("2024-02-10T12:30:00+02:00"),
            Some(day(2024, 2, 10))
        );
        assert_eq!(parse_cim_date("2023-11-05 anything"), Some(day(2023, 11, 5)));
        assert_eq!(parse_cim_date("/Date(oops)/"), None);
        assert_eq!(parse_cim_date(""), None);
    }
}

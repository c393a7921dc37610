//! Shared utilities for CLI commands.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveTime;
use psr_core::Booking;

/// Parse a start time written as `HH:MM`.
pub fn parse_hhmm(s: &str) -> Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
}

/// Split a console line into words. Double quotes group words containing spaces.
///
/// `name="Andi Pratama" table=5` yields `name=Andi Pratama` and `table=5`.
pub fn tokenize(line: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }

    if in_quotes {
        return Err("unterminated quote".to_string());
    }
    if has_token {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Read a JSON array of bookings.
pub fn load_bookings(path: &Path) -> Result<Vec<Booking>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse bookings in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hhmm() {
        assert_eq!(
            parse_hhmm("09:30").unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap()
        );
        assert!(parse_hhmm("9.30").is_err());
        assert!(parse_hhmm("25:00").is_err());
    }

    #[test]
    fn test_tokenize_plain_words() {
        assert_eq!(tokenize("  start  3 ").unwrap(), ["start", "3"]);
        assert!(tokenize("").unwrap().is_empty());
    }

    #[test]
    fn test_tokenize_quoted_values() {
        assert_eq!(
            tokenize(r#"book add name="Andi Pratama" table=5"#).unwrap(),
            ["book", "add", "name=Andi Pratama", "table=5"]
        );
        assert_eq!(tokenize(r#"name="""#).unwrap(), ["name="]);
    }

    #[test]
    fn test_tokenize_unterminated_quote() {
        assert!(tokenize(r#"name="Andi"#).is_err());
    }

    #[test]
    fn test_load_bookings_reports_bad_json() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("bookings.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = load_bookings(&path).unwrap_err();
        assert!(err.to_string().starts_with("failed to parse bookings in"));
    }
}

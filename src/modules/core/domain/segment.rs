//! Customer segment definitions

use serde::{Deserialize, Serialize};

use crate::error::{CrmError, Result};

/// A named SQL filter identifying a subset of customers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Short human-readable label
    pub name: String,
    /// SQL statement selecting the segment's customers
    pub sql: String,
}

impl Segment {
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
        }
    }

    /// Parse a language model reply into a segment
    ///
    /// The reply may be bare JSON or JSON wrapped in a fenced code block.
    pub fn from_model_output(output: &str) -> Result<Self> {
        let body = strip_code_fence(output);
        serde_json::from_str(body).map_err(|_| {
            CrmError::InvalidFormat(format!("Invalid segment response format: {}", body))
        })
    }
}

/// Remove a surrounding Markdown code fence and its language tag, if any
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let body = match rest.find("```") {
        Some(end) => &rest[..end],
        None => rest,
    };

    // A tag alone on the first line, else a `json`/`sql` tag glued to the content
    let body = match body.find('\n') {
        Some(newline) if is_language_tag(&body[..newline]) => &body[newline + 1..],
        _ => ["json", "sql"]
            .iter()
            .find_map(|tag| body.strip_prefix(*tag))
            .unwrap_or(body),
    };

    body.trim()
}

fn is_language_tag(line: &str) -> bool {
    line.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    const BARE: &str = r#"{"name": "Pelanggan Korporat", "sql": "SELECT custid FROM customer"}"#;

    #[test]
    fn test_parse_bare_json() {
        let segment = Segment::from_model_output(BARE).unwrap();
        assert_eq!(
            segment,
            Segment::new("Pelanggan Korporat", "SELECT custid FROM customer")
        );
    }

    #[test]
    fn test_parse_fenced_json_matches_bare() {
        let fenced = format!("```json\n{}\n```", BARE);
        assert_eq!(
            Segment::from_model_output(&fenced).unwrap(),
            Segment::from_model_output(BARE).unwrap()
        );

        let untagged = format!("  ```\n{}\n```  ", BARE);
        assert_eq!(
            Segment::from_model_output(&untagged).unwrap(),
            Segment::from_model_output(BARE).unwrap()
        );

        let inline = format!("```json{}```", BARE);
        assert_eq!(
            Segment::from_model_output(&inline).unwrap(),
            Segment::from_model_output(BARE).unwrap()
        );
    }

    #[test]
    fn test_parse_tag_on_same_line_as_json() {
        let fenced = format!("```json {}\n```", BARE);
        assert_eq!(
            Segment::from_model_output(&fenced).unwrap(),
            Segment::from_model_output(BARE).unwrap()
        );
    }

    #[test]
    fn test_parse_non_json_is_format_error() {
        let err = Segment::from_model_output("Maaf, saya tidak bisa membantu.").unwrap_err();
        assert!(matches!(err, CrmError::InvalidFormat(_)));
        assert!(err
            .to_string()
            .starts_with("Invalid segment response format: Maaf"));
    }

    #[test]
    fn test_parse_missing_field_is_format_error() {
        let err = Segment::from_model_output(r#"{"name": "only name"}"#).unwrap_err();
        assert!(matches!(err, CrmError::InvalidFormat(_)));
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("SELECT 1"), "SELECT 1");
        assert_eq!(strip_code_fence("```sql\nSELECT 1\n```"), "SELECT 1");
        assert_eq!(strip_code_fence("```\nSELECT 1"), "SELECT 1");
        assert_eq!(strip_code_fence("```sqlSELECT 1```"), "SELECT 1");
        assert_eq!(strip_code_fence("```sql SELECT 1\n```"), "SELECT 1");
        assert_eq!(strip_code_fence("```jsonc\n{}\n```"), "{}");
    }
}

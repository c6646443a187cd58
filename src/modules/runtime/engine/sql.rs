//! Helpers around the SQL step of the engine

use crm_query_core::strip_code_fence;
use serde_json::Value;

use crate::connectors::QueryRows;

const SQL_QUERY_MARKER: &str = "SQLQuery:";
const SQL_RESULT_MARKER: &str = "SQLResult:";

/// Pull the SQL statement out of a model reply
///
/// The reply may echo the prompt format (`SQLQuery: ... SQLResult: ...`) or
/// be bare SQL, optionally inside a code fence. A trailing `;` is dropped.
pub fn extract_sql(reply: &str) -> Option<String> {
    let mut text = reply;
    if let Some(start) = text.find(SQL_QUERY_MARKER) {
        text = &text[start + SQL_QUERY_MARKER.len()..];
    }
    if let Some(end) = text.find(SQL_RESULT_MARKER) {
        text = &text[..end];
    }

    let sql = strip_code_fence(text).trim_end_matches(';').trim();
    if sql.is_empty() {
        None
    } else {
        Some(sql.to_string())
    }
}

/// Render rows as a markdown table, showing at most `max_rows` of them
pub fn render_markdown_table(result: &QueryRows, max_rows: usize) -> String {
    if result.is_empty() {
        return "(no rows)".to_string();
    }

    let header: Vec<String> = result.columns.iter().map(|c| escape_cell(c)).collect();
    let mut lines = vec![
        format!("| {} |", header.join(" | ")),
        format!("|{}|", vec![" --- "; header.len()].join("|")),
    ];

    for row in result.rows.iter().take(max_rows) {
        let cells: Vec<String> = result
            .columns
            .iter()
            .map(|column| escape_cell(&cell_text(row.get(column).unwrap_or(&Value::Null))))
            .collect();
        lines.push(format!("| {} |", cells.join(" | ")));
    }

    if result.len() > max_rows {
        lines.push(format!("... ({} more rows)", result.len() - max_rows));
    }
    lines.join("\n")
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crm_query_types::Row;
    use serde_json::json;

    fn rows(n: usize) -> QueryRows {
        QueryRows {
            columns: vec!["custid".to_string(), "custname".to_string()],
            rows: (0..n)
                .map(|i| {
                    Row::from_iter([
                        ("custid".to_string(), json!(i)),
                        ("custname".to_string(), json!(format!("Cust|{}", i))),
                    ])
                })
                .collect(),
        }
    }

    #[test]
    fn test_extract_sql_from_prompt_format() {
        let reply = " SELECT COUNT(*) FROM `customer`\nSQLResult: | 12 |\nAnswer: Ada 12.";
        assert_eq!(extract_sql(reply).unwrap(), "SELECT COUNT(*) FROM `customer`");

        let echoed = "Question: berapa?\nSQLQuery: SELECT 1\nSQLResult:";
        assert_eq!(extract_sql(echoed).unwrap(), "SELECT 1");
    }

    #[test]
    fn test_extract_sql_from_fence() {
        let reply = "```sql\nSELECT custname FROM customer LIMIT 10;\n```";
        assert_eq!(
            extract_sql(reply).unwrap(),
            "SELECT custname FROM customer LIMIT 10"
        );
    }

    #[test]
    fn test_extract_sql_empty() {
        assert_eq!(extract_sql("   "), None);
        assert_eq!(extract_sql("SQLQuery: \nSQLResult: nothing"), None);
    }

    #[test]
    fn test_render_markdown_table() {
        let table = render_markdown_table(&rows(2), 50);
        assert_eq!(
            table,
            "| custid | custname |\n| --- | --- |\n| 0 | Cust\\|0 |\n| 1 | Cust\\|1 |"
        );
    }

    #[test]
    fn test_render_truncates() {
        let table = render_markdown_table(&rows(5), 3);
        assert_eq!(table.lines().count(), 2 + 3 + 1);
        assert!(table.ends_with("... (2 more rows)"));
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_markdown_table(&QueryRows::default(), 50), "(no rows)");
    }
}

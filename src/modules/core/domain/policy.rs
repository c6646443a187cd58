//! Trust policy for caller-supplied segment SQL
//!
//! Segment SQL normally comes straight from the generation step, but the
//! execute endpoint accepts arbitrary text. The policy decides how much of it
//! to trust. The checks are lexical: comments and string literals are blanked
//! out, then keywords are matched and every table list after `FROM` or `JOIN`
//! is walked. Nested parentheses inside function calls that take a `FROM`
//! (`EXTRACT(YEAR FROM DATE(x))`) are not unwrapped, so such queries are
//! rejected under `allowed_tables`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

use crate::error::{CrmError, Result};

/// Comments and quoted literals, blanked before any matching
static NOISE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)--[^\n]*|#[^\n]*|/\*.*?\*/|'(?:[^'\\]|\\.|'')*'|"(?:[^"\\]|\\.)*""#)
        .unwrap()
});

/// Backtick-quoted identifiers, blanked before keyword matching
static QUOTED_IDENTIFIER_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"`[^`]*`").unwrap());

/// Statements that must begin a read-only query
static READ_START_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[\s(]*(select|with)\b").unwrap());

/// Keywords that write data, change schema, or leave the database
static WRITE_KEYWORD_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(update|delete|merge|drop|alter|create|truncate|rename|grant|revoke|call|load|load_file|handler|into)\b",
    )
    .unwrap()
});

/// `INSERT` and `REPLACE`, which are also string functions when followed by `(`
static STATEMENT_OR_FUNCTION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(insert|replace)\b(\s*\()?").unwrap());

/// Function calls whose argument list contains a `FROM` that is not a table
static FROM_FUNCTION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(extract|trim|substring|position)\s*\([^()]*\)").unwrap());

static FROM_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bfrom\b").unwrap());

static JOIN_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bjoin\b").unwrap());

/// Table name at the start of a table reference, optionally schema-qualified and backtick-quoted
static TABLE_NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:`[^`]+`|[A-Za-z_][A-Za-z0-9_$]*)(?:\s*\.\s*(?:`[^`]+`|[A-Za-z_][A-Za-z0-9_$]*))?",
    )
    .unwrap()
});

/// Keywords that end a table list
static LIST_END_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(where|group|order|having|limit|join|inner|cross|left|right|natural|straight_join|on|using|union|window|for|lock|into|procedure)\b",
    )
    .unwrap()
});

/// Common table expression names introduced by `WITH name AS (`
static CTE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:\bwith(?:\s+recursive)?|,)\s*`?([A-Za-z_][A-Za-z0-9_]*)`?\s+as\s*\(")
        .unwrap()
});

/// How much caller-supplied segment SQL is trusted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SegmentSqlPolicy {
    /// Run the SQL verbatim
    #[default]
    Unrestricted,
    /// A single `SELECT`/`WITH` statement with no data-modifying keywords
    ReadOnly,
    /// `ReadOnly`, and every `FROM`/`JOIN` target must be an allowed table
    AllowedTables,
}

impl fmt::Display for SegmentSqlPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentSqlPolicy::Unrestricted => write!(f, "unrestricted"),
            SegmentSqlPolicy::ReadOnly => write!(f, "read_only"),
            SegmentSqlPolicy::AllowedTables => write!(f, "allowed_tables"),
        }
    }
}

impl FromStr for SegmentSqlPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "unrestricted" | "none" => Ok(SegmentSqlPolicy::Unrestricted),
            "read_only" | "readonly" => Ok(SegmentSqlPolicy::ReadOnly),
            "allowed_tables" => Ok(SegmentSqlPolicy::AllowedTables),
            _ => Err(format!("Unknown segment SQL policy: {}", s)),
        }
    }
}

impl SegmentSqlPolicy {
    /// Check `sql` against this policy
    ///
    /// `allowed_tables` holds bare names, which match unqualified references,
    /// and `schema.table` names, which match qualified ones.
    pub fn check(&self, sql: &str, allowed_tables: &[String]) -> Result<()> {
        match self {
            SegmentSqlPolicy::Unrestricted => Ok(()),
            SegmentSqlPolicy::ReadOnly => check_read_only(&blank_noise(sql)),
            SegmentSqlPolicy::AllowedTables => {
                let cleaned = blank_noise(sql);
                check_read_only(&cleaned)?;
                check_tables(&cleaned, allowed_tables)
            }
        }
    }
}

fn blank_noise(sql: &str) -> String {
    NOISE_PATTERN.replace_all(sql, " ").into_owned()
}

fn check_read_only(sql: &str) -> Result<()> {
    let statement = sql.trim().trim_end_matches(';').trim_end();

    if statement.is_empty() {
        return Err(CrmError::PolicyViolation("empty statement".to_string()));
    }
    if statement.contains(';') {
        return Err(CrmError::PolicyViolation(
            "only a single statement is allowed".to_string(),
        ));
    }
    if !READ_START_PATTERN.is_match(statement) {
        return Err(CrmError::PolicyViolation(
            "statement must start with SELECT or WITH".to_string(),
        ));
    }

    let words = QUOTED_IDENTIFIER_PATTERN.replace_all(statement, " ");
    if let Some(keyword) = WRITE_KEYWORD_PATTERN.find(&words) {
        return Err(keyword_violation(keyword.as_str()));
    }
    for cap in STATEMENT_OR_FUNCTION_PATTERN.captures_iter(&words) {
        if cap.get(2).is_none() {
            return Err(keyword_violation(&cap[1]));
        }
    }
    Ok(())
}

fn keyword_violation(keyword: &str) -> CrmError {
    CrmError::PolicyViolation(format!(
        "keyword '{}' is not allowed",
        keyword.to_uppercase()
    ))
}

fn check_tables(sql: &str, allowed_tables: &[String]) -> Result<()> {
    let cte_names: Vec<String> = CTE_PATTERN
        .captures_iter(sql)
        .map(|cap| cap[1].to_lowercase())
        .collect();

    let scanned = FROM_FUNCTION_PATTERN.replace_all(sql, " ").into_owned();
    let lists = FROM_PATTERN
        .find_iter(&scanned)
        .chain(JOIN_PATTERN.find_iter(&scanned));
    for keyword in lists {
        check_table_list(&scanned[keyword.end()..], allowed_tables, &cte_names)?;
    }
    Ok(())
}

/// Check every table reference in the list at the start of `sql`
///
/// Derived tables are skipped; the `FROM` inside them is checked on its own.
/// Parenthesised reference lists are walked recursively.
fn check_table_list(sql: &str, allowed_tables: &[String], cte_names: &[String]) -> Result<()> {
    for item in split_table_list(sql) {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }

        if item.starts_with('(') {
            let inner = parenthesised(item);
            if !READ_START_PATTERN.is_match(inner) {
                check_table_list(inner, allowed_tables, cte_names)?;
            }
            continue;
        }

        let name = TABLE_NAME_PATTERN.find(item).ok_or_else(|| {
            CrmError::PolicyViolation(format!("unrecognised table reference '{}'", item))
        })?;
        check_table_name(name.as_str(), allowed_tables, cte_names)?;
    }
    Ok(())
}

/// Split a table list at top-level commas, stopping at the clause that ends it
fn split_table_list(sql: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut quoted = false;
    let mut start = 0;
    let mut end = sql.len();
    let mut previous = ' ';

    for (i, c) in sql.char_indices() {
        if quoted {
            quoted = c != '`';
            previous = c;
            continue;
        }
        match c {
            '`' => quoted = true,
            '(' => depth += 1,
            ')' if depth == 0 => {
                end = i;
                break;
            }
            ')' => depth -= 1,
            ';' if depth == 0 => {
                end = i;
                break;
            }
            ',' if depth == 0 => {
                items.push(&sql[start..i]);
                start = i + 1;
            }
            c if depth == 0
                && c.is_ascii_alphabetic()
                && !(previous.is_ascii_alphanumeric() || previous == '_' || previous == '$')
                && LIST_END_PATTERN.is_match(&sql[i..]) =>
            {
                end = i;
                break;
            }
            _ => {}
        }
        previous = c;
    }

    items.push(&sql[start..end]);
    items
}

/// Contents of the parenthesised group `item` starts with
fn parenthesised(item: &str) -> &str {
    let mut depth = 0usize;
    for (i, c) in item.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return &item[1..i];
                }
            }
            _ => {}
        }
    }
    &item[1..]
}

fn check_table_name(reference: &str, allowed_tables: &[String], cte_names: &[String]) -> Result<()> {
    let table = reference
        .replace('`', "")
        .split('.')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(".")
        .to_lowercase();

    let allowed = allowed_tables.iter().any(|t| t.eq_ignore_ascii_case(&table))
        || (!table.contains('.') && (table == "dual" || cte_names.contains(&table)));
    if allowed {
        Ok(())
    } else {
        Err(CrmError::PolicyViolation(format!(
            "table '{}' is not in the allowed table list",
            table
        )))
    }
}

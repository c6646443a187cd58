//! Placeholder substitution for prompt templates

use crm_query_core::CrmError;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

/// Regex pattern for placeholders: {{ name }}
static PLACEHOLDER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").unwrap());

/// A static prompt with `{{ name }}` placeholders
///
/// Single braces are plain text, so JSON examples can be written as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    name: &'static str,
    text: &'static str,
}

impl PromptTemplate {
    pub const fn new(name: &'static str, text: &'static str) -> Self {
        Self { name, text }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn text(&self) -> &'static str {
        self.text
    }

    /// Placeholder names in order of first appearance
    pub fn placeholders(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Vec::new();
        for cap in PLACEHOLDER_PATTERN.captures_iter(self.text) {
            if let Some(name) = cap.get(1).map(|m| m.as_str()) {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Fill every placeholder
    ///
    /// Substitution is a single pass, so values that themselves look like
    /// placeholders are inserted verbatim.
    pub fn format(&self, vars: &[(&str, &str)]) -> Result<String, CrmError> {
        let values: HashMap<&str, &str> = vars.iter().copied().collect();

        if let Some(missing) = self
            .placeholders()
            .into_iter()
            .find(|name| !values.contains_key(name))
        {
            return Err(CrmError::Template(format!(
                "Prompt '{}' is missing a value for '{}'",
                self.name, missing
            )));
        }

        let rendered = PLACEHOLDER_PATTERN.replace_all(self.text, |cap: &Captures| {
            values.get(&cap[1]).copied().unwrap_or_default().to_string()
        });
        Ok(rendered.into_owned())
    }
}

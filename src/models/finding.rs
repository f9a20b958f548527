//! Validation finding data structure.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::OracleConfig;

/// One oracle-reported outcome for a single checked URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFinding {
    /// The checked URL
    pub url: String,

    /// Page the URL was found on (empty when checked directly)
    pub parent: String,

    /// HTTP/transport result code or message
    pub result: String,

    /// Auxiliary diagnostic strings, in configured column order
    pub diagnostics: Vec<String>,

    /// Raw valid/invalid flag as reported
    pub valid: String,
}

impl ValidationFinding {
    /// Build a finding from a normalized oracle row.
    pub fn from_row(row: &[String], layout: &OracleConfig) -> Result<Self> {
        let field = |name: &str| -> Result<String> {
            let index = layout.column_index(name).ok_or_else(|| {
                AppError::config(format!("oracle column '{name}' is not in oracle.columns"))
            })?;
            Ok(row.get(index).cloned().unwrap_or_default())
        };

        Ok(Self {
            url: field(&layout.url_column)?,
            parent: field(&layout.parent_column)?,
            result: field(&layout.result_column)?,
            diagnostics: layout
                .diagnostic_columns
                .iter()
                .map(|c| field(c))
                .collect::<Result<_>>()?,
            valid: field(&layout.valid_column)?,
        })
    }

    /// Whether the oracle flagged this URL as broken.
    pub fn is_broken(&self) -> bool {
        !matches!(
            self.valid.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "valid"
        )
    }

    /// Report header names for finding fields, in emission order.
    pub fn header(layout: &OracleConfig) -> Vec<String> {
        let mut header = vec![
            layout.url_column.clone(),
            layout.parent_column.clone(),
            layout.result_column.clone(),
        ];
        header.extend(layout.diagnostic_columns.iter().cloned());
        header.push(layout.valid_column.clone());
        header
    }

    /// Finding values matching [`Self::header`].
    pub fn values(&self) -> Vec<String> {
        let mut values = vec![self.url.clone(), self.parent.clone(), self.result.clone()];
        values.extend(self.diagnostics.iter().cloned());
        values.push(self.valid.clone());
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_from_row_uses_configured_positions() {
        let layout = OracleConfig {
            columns: row(&["valid", "result", "parentname", "urlname", "warningstring", "infostring"]),
            ..OracleConfig::default()
        };
        let finding =
            ValidationFinding::from_row(&row(&["False", "404 Not Found", "", "http://x.test/a", "w", "i"]), &layout)
                .unwrap();
        assert_eq!(finding.url, "http://x.test/a");
        assert_eq!(finding.result, "404 Not Found");
        assert_eq!(finding.diagnostics, row(&["w", "i"]));
        assert!(finding.is_broken());
    }

    #[test]
    fn test_unknown_column_is_config_error() {
        let layout = OracleConfig {
            columns: row(&["urlname"]),
            ..OracleConfig::default()
        };
        let err = ValidationFinding::from_row(&row(&["x"]), &layout).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}

//! History export formats

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use crate::error::{MerminError, Result};

/// File formats the history can be saved in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// One `(s1, s2, 'c1', 'c2')` line per run
    PlainText,
    /// A single array of `[s1, s2, "c1", "c2"]` rows
    Json,
}

impl ExportFormat {
    /// Pick the format a save path asks for: `.json` is JSON, anything else text
    pub fn from_extension(path: impl AsRef<Path>) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ExportFormat::Json,
            _ => ExportFormat::PlainText,
        }
    }

    /// HTTP content type
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::PlainText => "text/plain; charset=utf-8",
            ExportFormat::Json => "application/json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = MerminError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" | "plain" | "plaintext" => Ok(ExportFormat::PlainText),
            "json" => Ok(ExportFormat::Json),
            _ => Err(MerminError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ExportFormat::PlainText => "text",
            ExportFormat::Json => "json",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags() {
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("TXT".parse::<ExportFormat>().unwrap(), ExportFormat::PlainText);
        assert!(matches!(
            "xml".parse::<ExportFormat>(),
            Err(MerminError::UnsupportedFormat(tag)) if tag == "xml"
        ));
    }

    #[test]
    fn test_from_extension() {
        assert_eq!(ExportFormat::from_extension("runs.json"), ExportFormat::Json);
        assert_eq!(ExportFormat::from_extension("runs.JSON"), ExportFormat::Json);
        assert_eq!(ExportFormat::from_extension("runs.txt"), ExportFormat::PlainText);
        assert_eq!(ExportFormat::from_extension("runs"), ExportFormat::PlainText);
    }
}

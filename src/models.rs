// Core data model shared by the classifier, the transport and the workflow
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification tier of a detected issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn name(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single finding synthesized from the analysis text.
///
/// `message` doubles as the identity of the issue: two issues with the same
/// message are the same issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    pub message: String,
    pub line: Option<u32>,
    pub suggestion: String,
}

impl Issue {
    pub fn new(severity: Severity, message: impl Into<String>, suggestion: &str) -> Self {
        Self {
            severity,
            message: message.into(),
            line: None,
            suggestion: suggestion.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Outcome of one analyze call, classified
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub issues: Vec<Issue>,
    pub summary: String,
    pub analysis: String,
}

impl AnalysisResult {
    pub fn new(issues: Vec<Issue>, analysis: String) -> Self {
        Self {
            issues,
            summary: analysis.clone(),
            analysis,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(Issue::is_error)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }
}

/// Body of both `/analyze` and `/fix`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeRequest {
    pub code: String,
    pub language: String,
}

impl CodeRequest {
    pub fn new(code: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            language: language.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyzeResponse {
    #[serde(default)]
    pub analysis: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixResponse {
    pub fixed_code: String,
}

/// Fixed code as returned by the service plus its display form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedCode {
    pub raw: String,
    pub cleaned: String,
}

impl FixedCode {
    pub fn from_raw(raw: String) -> Self {
        let cleaned = strip_code_fence(&raw);
        Self { raw, cleaned }
    }
}

/// Remove a surrounding markdown code fence (```lang ... ```), if any
pub fn strip_code_fence(code: &str) -> String {
    let mut cleaned = code.trim();

    if let Some(rest) = cleaned.strip_prefix("```") {
        let lang_len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        cleaned = &rest[lang_len..];
        cleaned = cleaned.strip_prefix('\n').unwrap_or(cleaned);
    }

    if let Some(rest) = cleaned.strip_suffix("```") {
        cleaned = rest.strip_suffix('\n').unwrap_or(rest);
    }

    cleaned.trim().to_string()
}

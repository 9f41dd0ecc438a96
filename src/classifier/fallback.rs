// Ambiguity fallback - one low-confidence warning for short, problem-flavoured prose
use crate::models::{Issue, Severity};
use lazy_static::lazy_static;
use regex::Regex;

/// Analyses at or above this many characters never trigger the fallback
pub const FALLBACK_MAX_CHARS: usize = 500;

pub const FALLBACK_MESSAGE: &str = "Potential issues detected - review the analysis for details";
pub const FALLBACK_SUGGESTION: &str = "Check the detailed analysis section below";

const PROBLEM_KEYWORDS: &[&str] = &[
    "error",
    "bug",
    "issue",
    "problem",
    "incorrect",
    "invalid",
    "wrong",
];

// Word boundaries are ASCII-only, so accented letters count as separators
lazy_static! {
    static ref KEYWORD_PATTERNS: Vec<Regex> = PROBLEM_KEYWORDS
        .iter()
        .map(|keyword| Regex::new(&format!(r"(?i)(?-u:\b){}(?-u:\b)", keyword)).unwrap())
        .collect();
}

pub fn has_problem_keyword(analysis: &str) -> bool {
    KEYWORD_PATTERNS
        .iter()
        .any(|pattern| pattern.is_match(analysis))
}

/// Zero or one issue for text the pattern matcher could not classify
pub fn fallback(analysis: &str, positive_indicator: bool) -> Vec<Issue> {
    let short = analysis.chars().count() < FALLBACK_MAX_CHARS;

    if has_problem_keyword(analysis) && short && !positive_indicator {
        vec![Issue::new(
            Severity::Warning,
            FALLBACK_MESSAGE,
            FALLBACK_SUGGESTION,
        )]
    } else {
        Vec::new()
    }
}

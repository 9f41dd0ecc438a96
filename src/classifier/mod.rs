//! Heuristic classification of free-form review prose into typed issues.
//!
//! The pipeline is a fixed four-branch decision:
//!
//! 1. `Invalid`: the code fails the signature precheck, yielding one synthetic issue.
//! 2. `Matched`: one or more critical patterns fired; their issues are returned as-is.
//! 3. `PositiveAmbiguous`: nothing matched but the text asserts there are no problems.
//! 4. `FallbackAmbiguous`: the keyword fallback decides (zero or one warning).
//!
//! Classification is total: every input produces a list, possibly empty.

pub mod fallback;
pub mod indicators;
pub mod patterns;
pub mod precheck;

use crate::models::{Issue, Severity};
use patterns::PatternMatcher;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use indicators::has_positive_indicator;
pub use precheck::precheck;

pub const INVALID_INPUT_MESSAGE: &str =
    "Input does not appear to be valid code in the selected language";
pub const INVALID_INPUT_SUGGESTION: &str = "Please enter actual code for analysis";

/// Which branch of the decision produced the issue list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Branch {
    Invalid,
    Matched,
    PositiveAmbiguous,
    FallbackAmbiguous,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub branch: Branch,
    pub issues: Vec<Issue>,
}

pub fn invalid_input_issue() -> Issue {
    Issue::new(
        Severity::Error,
        INVALID_INPUT_MESSAGE,
        INVALID_INPUT_SUGGESTION,
    )
}

/// Classify using the built-in rule table
pub fn classify(code: &str, language: &str, analysis: &str) -> Vec<Issue> {
    classify_with(&PatternMatcher::new(), code, language, analysis).issues
}

pub fn classify_with(
    matcher: &PatternMatcher<'_>,
    code: &str,
    language: &str,
    analysis: &str,
) -> Classification {
    if !precheck(code, language) {
        debug!("Precheck rejected input for language {:?}", language);
        return Classification {
            branch: Branch::Invalid,
            issues: vec![invalid_input_issue()],
        };
    }

    let matched = matcher.find_issues(analysis);
    if !matched.is_empty() {
        debug!("{} critical pattern(s) matched", matched.len());
        return Classification {
            branch: Branch::Matched,
            issues: matched,
        };
    }

    let positive = has_positive_indicator(analysis);
    if positive {
        debug!("Positive indicator found, no issues");
        return Classification {
            branch: Branch::PositiveAmbiguous,
            issues: Vec::new(),
        };
    }

    let issues = fallback::fallback(analysis, positive);
    debug!("Fallback produced {} issue(s)", issues.len());
    Classification {
        branch: Branch::FallbackAmbiguous,
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_python_yields_no_issues() {
        let issues = classify(
            "def f(): pass",
            "python",
            "No critical issues found. Code is valid.",
        );
        assert!(issues.is_empty());
    }

    #[test]
    fn test_syntax_and_deprecated() {
        let issues = classify(
            "print('hi')",
            "python",
            "There is a syntax error on line 3. Also this code is deprecated.",
        );

        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].severity, Severity::Error);
        assert_eq!(issues[0].message, "There is a syntax error on line 3");
        assert_eq!(issues[1].severity, Severity::Warning);
        assert_eq!(
            issues[1].message,
            "Deprecated Code: Using deprecated features or methods"
        );
    }

    #[test]
    fn test_blank_code_short_circuits() {
        for code in ["", "   ", "\n\t"] {
            let result = classify_with(
                &PatternMatcher::new(),
                code,
                "python",
                "There is a syntax error and a memory leak.",
            );
            assert_eq!(result.branch, Branch::Invalid);
            assert_eq!(result.issues, vec![invalid_input_issue()]);
            assert_eq!(
                result.issues[0].suggestion,
                "Please enter actual code for analysis"
            );
        }
    }

    #[test]
    fn test_match_suppresses_positive_indicator() {
        let result = classify_with(
            &PatternMatcher::new(),
            "def f(): pass",
            "python",
            "The code looks good, but it uses a deprecated call.",
        );
        assert_eq!(result.branch, Branch::Matched);
        assert_eq!(result.issues.len(), 1);
    }

    #[test]
    fn test_positive_indicator_suppresses_fallback() {
        let result = classify_with(
            &PatternMatcher::new(),
            "def f(): pass",
            "python",
            "No bugs found. The only problem is style.",
        );
        assert_eq!(result.branch, Branch::PositiveAmbiguous);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_fallback_threshold() {
        let base = "Hmm, there might be a bug somewhere";
        let short = format!("{:<499}", base);
        let long = format!("{:<501}", base);
        assert_eq!(short.chars().count(), 499);
        assert_eq!(long.chars().count(), 501);

        let issues = classify("def f(): pass", "python", &short);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);

        assert!(classify("def f(): pass", "python", &long).is_empty());
    }

    #[test]
    fn test_unknown_language_reaches_matcher() {
        let issues = classify("anything at all", "haskell", "Found a runtime error.");
        assert_eq!(
            issues[0].message,
            "Runtime Error: The code may crash during execution"
        );
    }

    #[test]
    fn test_classification_is_deterministic() {
        let text = "Syntax error here! Also a potential bug, a deadlock, and deprecated APIs.";
        let first = classify("const x = 1;", "javascript", text);
        let second = classify("const x = 1;", "javascript", text);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}

// Critical pattern matcher - ordered rule table turning review prose into issues
use crate::models::{Issue, Severity};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

pub const MATCH_SUGGESTION: &str = "See detailed analysis below for more information";

lazy_static! {
    static ref SENTENCE_BREAK: Regex = Regex::new(r"[.!?]+").unwrap();
    static ref CATALOGUE: Vec<PatternRule> = default_rules();
}

/// How a rule turns a hit into an issue message
#[derive(Debug, Clone)]
pub enum Extraction {
    /// Canned description, independent of the matched text
    Fixed(&'static str),
    /// First sentence of the analysis that also matches the rule, else `fallback`
    Sentence { fallback: &'static str },
}

#[derive(Debug, Clone)]
pub struct PatternRule {
    pub name: &'static str,
    pub pattern: Regex,
    pub severity: Severity,
    pub extraction: Extraction,
}

impl PatternRule {
    pub fn fixed(name: &'static str, pattern: &str, severity: Severity, message: &'static str) -> Self {
        Self {
            name,
            pattern: compile(pattern),
            severity,
            extraction: Extraction::Fixed(message),
        }
    }

    pub fn sentence(
        name: &'static str,
        pattern: &str,
        severity: Severity,
        fallback: &'static str,
    ) -> Self {
        Self {
            name,
            pattern: compile(pattern),
            severity,
            extraction: Extraction::Sentence { fallback },
        }
    }

    /// Message for this rule if it fires on `analysis`
    pub fn evaluate(&self, analysis: &str) -> Option<String> {
        if !self.pattern.is_match(analysis) {
            return None;
        }

        let message = match &self.extraction {
            Extraction::Fixed(message) => message.to_string(),
            Extraction::Sentence { fallback } => SENTENCE_BREAK
                .split(analysis)
                .find(|sentence| self.pattern.is_match(sentence))
                .map(|sentence| sentence.trim().to_string())
                .unwrap_or_else(|| fallback.to_string()),
        };

        Some(message)
    }
}

fn compile(pattern: &str) -> Regex {
    Regex::new(&format!("(?i){}", pattern)).unwrap()
}

fn default_rules() -> Vec<PatternRule> {
    use Severity::{Error, Warning};

    vec![
        PatternRule::fixed(
            "language_mismatch",
            r"language\s+mismatch",
            Error,
            "Language Mismatch: The submitted code language does not match the selected language",
        ),
        PatternRule::fixed(
            "wrong_language",
            r"(is\s+not|not\s+valid)\s+(python|java|javascript|c\+\+|ruby|go|rust|php|swift|kotlin|typescript)\s+code",
            Error,
            "Wrong Language: The code appears to be in a different language than selected",
        ),
        PatternRule::sentence(
            "syntax_error",
            r"syntax\s+error",
            Error,
            "Syntax Error detected in the code",
        ),
        PatternRule::fixed(
            "parsing_error",
            r"parsing\s+error",
            Error,
            "Parsing Error: Unable to parse the code structure",
        ),
        PatternRule::fixed(
            "compilation_error",
            r"compilation\s+error",
            Error,
            "Compilation Error: The code will not compile",
        ),
        PatternRule::fixed(
            "runtime_error",
            r"runtime\s+error",
            Error,
            "Runtime Error: The code may crash during execution",
        ),
        PatternRule::fixed(
            "logic_error",
            r"logic\s+error",
            Error,
            "Logic Error: The code logic appears to be incorrect",
        ),
        PatternRule::fixed(
            "infinite_loop",
            r"infinite\s+loop",
            Error,
            "Infinite Loop: Code contains a loop that may never terminate",
        ),
        PatternRule::fixed(
            "null_reference",
            r"null\s+pointer|nullptr|nullpointerexception",
            Error,
            "Null Reference: Potential null pointer/reference access detected",
        ),
        PatternRule::fixed(
            "memory_leak",
            r"memory\s+leak",
            Error,
            "Memory Leak: Code may not properly release memory",
        ),
        PatternRule::fixed(
            "buffer_overflow",
            r"buffer\s+overflow",
            Error,
            "Buffer Overflow: Potential buffer overflow vulnerability",
        ),
        PatternRule::fixed(
            "race_condition",
            r"race\s+condition",
            Error,
            "Race Condition: Potential concurrency issue detected",
        ),
        PatternRule::fixed(
            "deadlock",
            r"deadlock",
            Error,
            "Deadlock: Potential deadlock situation in concurrent code",
        ),
        PatternRule::fixed(
            "security_vulnerability",
            r"security\s+(vulnerability|issue|risk)",
            Error,
            "Security Vulnerability: Code contains potential security risks",
        ),
        PatternRule::fixed(
            "sql_injection",
            r"sql\s+injection",
            Error,
            "SQL Injection: Code is vulnerable to SQL injection attacks",
        ),
        PatternRule::fixed(
            "cross_site_scripting",
            r"xss|cross[\s-]site\s+scripting",
            Error,
            "XSS Vulnerability: Code is vulnerable to cross-site scripting",
        ),
        PatternRule::fixed(
            "type_error",
            r"type\s+error|type\s+mismatch",
            Error,
            "Type Error: Incompatible types detected",
        ),
        PatternRule::fixed(
            "undefined_reference",
            r"undefined\s+(variable|function|method)",
            Error,
            "Undefined Reference: Using undefined variable or function",
        ),
        PatternRule::fixed(
            "missing_import",
            r"missing\s+(import|include|require)",
            Error,
            "Missing Import: Required module or library not imported",
        ),
        PatternRule::fixed(
            "deprecated",
            r"deprecated",
            Warning,
            "Deprecated Code: Using deprecated features or methods",
        ),
        PatternRule::fixed(
            "unused_code",
            r"unused\s+(variable|function|import)",
            Warning,
            "Unused Code: Declared but never used",
        ),
        PatternRule::fixed(
            "potential_bug",
            r"potential\s+bug",
            Warning,
            "Potential Bug: Code may cause unexpected behavior",
        ),
        PatternRule::fixed(
            "performance_issue",
            r"performance\s+issue",
            Warning,
            "Performance Issue: Code may be inefficient",
        ),
    ]
}

/// Built-in rule table, in evaluation order
pub fn catalogue() -> &'static [PatternRule] {
    &CATALOGUE
}

/// Runs every rule against the analysis text, keeping first-detection order
/// and dropping issues whose message is already present.
pub struct PatternMatcher<'a> {
    rules: &'a [PatternRule],
}

impl PatternMatcher<'static> {
    pub fn new() -> Self {
        Self { rules: catalogue() }
    }
}

impl Default for PatternMatcher<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> PatternMatcher<'a> {
    pub fn with_rules(rules: &'a [PatternRule]) -> Self {
        Self { rules }
    }

    pub fn find_issues(&self, analysis: &str) -> Vec<Issue> {
        let mut issues: Vec<Issue> = Vec::new();

        for rule in self.rules {
            let Some(message) = rule.evaluate(analysis) else {
                continue;
            };

            if issues.iter().any(|issue| issue.message == message) {
                debug!("Rule {} repeated message, skipped", rule.name);
                continue;
            }

            debug!("Rule {} matched ({})", rule.name, rule.severity);
            issues.push(Issue::new(rule.severity, message, MATCH_SUGGESTION));
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(issues: &[Issue]) -> Vec<&str> {
        issues.iter().map(|i| i.message.as_str()).collect()
    }

    #[test]
    fn test_catalogue_order_and_size() {
        let names: Vec<_> = catalogue().iter().map(|r| r.name).collect();
        assert_eq!(names.len(), 23);
        assert_eq!(names[0], "language_mismatch");
        assert_eq!(names[2], "syntax_error");
        assert_eq!(names[19], "deprecated");
        assert_eq!(names[22], "performance_issue");
    }

    #[test]
    fn test_syntax_error_uses_sentence() {
        let text = "There is a syntax error on line 3. Also this code is deprecated.";
        let issues = PatternMatcher::new().find_issues(text);

        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].severity, Severity::Error);
        assert_eq!(issues[0].message, "There is a syntax error on line 3");
        assert_eq!(issues[1].severity, Severity::Warning);
        assert_eq!(
            issues[1].message,
            "Deprecated Code: Using deprecated features or methods"
        );
        assert!(issues.iter().all(|i| i.suggestion == MATCH_SUGGESTION));
        assert!(issues.iter().all(|i| i.line.is_none()));
    }

    #[test]
    fn test_sentence_split_on_any_terminator() {
        let text = "Careful!   A Syntax   Error appears here? yes";
        let issues = PatternMatcher::new().find_issues(text);
        assert_eq!(messages(&issues), vec!["A Syntax   Error appears here"]);
    }

    #[test]
    fn test_sentence_fallback_when_no_single_sentence_matches() {
        // The hit spans a sentence break, so no sentence matches on its own
        let rules = vec![PatternRule::sentence(
            "split",
            r"end\.\s+start",
            Severity::Error,
            "Split detected",
        )];
        let issues = PatternMatcher::with_rules(&rules).find_issues("the end. start again");
        assert_eq!(messages(&issues), vec!["Split detected"]);
    }

    #[test]
    fn test_multiple_rules_fire_in_catalogue_order() {
        let text = "Possible SQL injection and a memory leak. There is also a race condition.";
        let issues = PatternMatcher::new().find_issues(text);
        assert_eq!(
            messages(&issues),
            vec![
                "Memory Leak: Code may not properly release memory",
                "Race Condition: Potential concurrency issue detected",
                "SQL Injection: Code is vulnerable to SQL injection attacks",
            ]
        );
    }

    #[test]
    fn test_alternative_spellings() {
        let cases = [
            ("throws a NullPointerException", "Null Reference"),
            ("prone to XSS", "XSS Vulnerability"),
            ("cross-site scripting risk", "XSS Vulnerability"),
            ("a type mismatch on return", "Type Error"),
            ("this is not valid Rust code", "Wrong Language"),
            ("missing require for fs", "Missing Import"),
        ];

        for (text, prefix) in cases {
            let issues = PatternMatcher::new().find_issues(text);
            assert_eq!(issues.len(), 1, "text: {}", text);
            assert!(issues[0].message.starts_with(prefix), "text: {}", text);
        }
    }

    #[test]
    fn test_colliding_messages_are_deduplicated() {
        let rules = vec![
            PatternRule::fixed("a", r"alpha", Severity::Error, "Same message"),
            PatternRule::fixed("b", r"beta", Severity::Warning, "Same message"),
            PatternRule::fixed("c", r"gamma", Severity::Info, "Other message"),
        ];
        let issues = PatternMatcher::with_rules(&rules).find_issues("alpha beta gamma");

        assert_eq!(messages(&issues), vec!["Same message", "Other message"]);
        assert_eq!(issues[0].severity, Severity::Error);
    }

    #[test]
    fn test_dedup_is_case_sensitive() {
        let rules = vec![
            PatternRule::fixed("a", r"alpha", Severity::Error, "Same message"),
            PatternRule::fixed("b", r"beta", Severity::Error, "same message"),
        ];
        let issues = PatternMatcher::with_rules(&rules).find_issues("alpha beta");
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn test_near_duplicates_are_kept() {
        let rules = vec![
            PatternRule::fixed("fixed", r"syntax\s+error", Severity::Error, "Syntax Error"),
            PatternRule::sentence("sentence", r"syntax\s+error", Severity::Error, "unused"),
        ];
        let issues =
            PatternMatcher::with_rules(&rules).find_issues("A syntax error is present.");
        assert_eq!(
            messages(&issues),
            vec!["Syntax Error", "A syntax error is present"]
        );
    }

    #[test]
    fn test_no_matches_on_clean_text() {
        let issues = PatternMatcher::new().find_issues("No critical issues found.");
        assert!(issues.is_empty());
    }
}

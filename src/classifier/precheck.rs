// Signature precheck - cheap guess at whether input looks like code in the declared language
use lazy_static::lazy_static;
use regex::Regex;

/// Languages offered for selection, with display labels
pub const LANGUAGES: &[(&str, &str)] = &[
    ("python", "Python"),
    ("java", "Java"),
    ("javascript", "JavaScript"),
];

// Identifier characters are ASCII-only
lazy_static! {
    static ref SIGNATURES: Vec<(&'static str, Regex)> = vec![
        (
            "java",
            Regex::new(r"(?i)class\s+(?-u:\w)+|public\s+static\s+void|System\.out\.print|import\s+(?-u:\w)+")
                .unwrap(),
        ),
        (
            "python",
            Regex::new(r"(?i)def\s+(?-u:\w)+|import\s+(?-u:\w)+|print\(").unwrap(),
        ),
        (
            "javascript",
            Regex::new(r"(?i)function\s+(?-u:\w)+|const\s+(?-u:\w)+|let\s+(?-u:\w)+|console\.log").unwrap(),
        ),
    ];
}

/// Signature pattern configured for `language`, matched case-insensitively
pub fn signature_for(language: &str) -> Option<&'static Regex> {
    let language = language.trim().to_lowercase();
    SIGNATURES
        .iter()
        .find(|(name, _)| *name == language)
        .map(|(_, pattern)| pattern)
}

/// Whether `code` plausibly belongs to `language`.
///
/// Blank input never passes. Languages without a signature always pass.
pub fn precheck(code: &str, language: &str) -> bool {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return false;
    }

    match signature_for(language) {
        Some(pattern) => pattern.is_match(trimmed),
        None => true,
    }
}

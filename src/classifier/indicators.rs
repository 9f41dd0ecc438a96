// Positive indicators - phrases asserting the reviewed code has no problems
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref POSITIVE_INDICATORS: Vec<Regex> = vec![
        Regex::new(r"(?i)no\s+(critical\s+)?issues?\s+found").unwrap(),
        Regex::new(r"(?i)code\s+is\s+(syntactically\s+)?correct").unwrap(),
        Regex::new(r"(?i)will\s+run\s+without\s+errors").unwrap(),
        Regex::new(r"(?i)looks\s+good").unwrap(),
        Regex::new(r"(?i)perfectly\s+(fine|valid)").unwrap(),
        Regex::new(r"(?i)no\s+problems?\s+detected").unwrap(),
        Regex::new(r"(?i)code\s+is\s+valid").unwrap(),
        Regex::new(r"(?i)no\s+bugs?\s+found").unwrap(),
    ];
}

pub fn has_positive_indicator(analysis: &str) -> bool {
    POSITIVE_INDICATORS
        .iter()
        .any(|pattern| pattern.is_match(analysis))
}

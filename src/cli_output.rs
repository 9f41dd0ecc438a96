// Agent-friendly CLI output for review results
use crate::models::{Issue, Severity};
use crate::workflow::{Notice, Phase, Submission};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io::{self, IsTerminal};
use std::time::Duration;

/// Environment variable forcing JSON output
pub const JSON_ENV: &str = "CODEREVIEW_JSON";

const EMPTY_SUMMARY: &str = "Code analysis complete.";
const NO_ISSUES: &str = "No major issues found in your code.";

/// Output mode for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with colors
    Human,
    /// Machine-readable JSON output
    Json,
    /// Plain text without colors (for pipes/logs)
    Plain,
}

impl OutputMode {
    /// Auto-detect output mode; `--json` wins over everything else
    pub fn auto(json_flag: bool) -> Self {
        if json_flag || std::env::var(JSON_ENV).is_ok() {
            Self::Json
        } else if !io::stdout().is_terminal() {
            Self::Plain
        } else {
            Self::Human
        }
    }
}

pub struct OutputWriter {
    mode: OutputMode,
}

impl OutputWriter {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    fn section_text(&self, title: &str) -> String {
        match self.mode {
            OutputMode::Human => format!(
                "\n{}\n{}\n",
                title.cyan().bold(),
                "═".repeat(title.chars().count()).cyan()
            ),
            OutputMode::Plain => format!("\n{}\n{}\n", title, "=".repeat(title.chars().count())),
            OutputMode::Json => String::new(),
        }
    }

    fn success_text(&self, message: &str) -> String {
        match self.mode {
            OutputMode::Human => format!("  {} {}\n", "✓".green(), message),
            OutputMode::Plain => format!("  [OK] {}\n", message),
            OutputMode::Json => String::new(),
        }
    }

    /// Error lines are produced in every mode; callers send them to stderr
    fn error_text(&self, message: &str) -> String {
        match self.mode {
            OutputMode::Human => format!("  {} {}\n", "✗".red(), message),
            OutputMode::Plain | OutputMode::Json => format!("  [ERROR] {}\n", message),
        }
    }

    fn warning_text(&self, message: &str) -> String {
        match self.mode {
            OutputMode::Human => format!("  {} {}\n", "⚠".yellow(), message),
            OutputMode::Plain => format!("  [WARN] {}\n", message),
            OutputMode::Json => String::new(),
        }
    }

    fn info_text(&self, message: &str) -> String {
        match self.mode {
            OutputMode::Json => String::new(),
            _ => format!("  {}\n", message),
        }
    }

    /// Indented block, one output line per input line
    fn block_text(&self, text: &str) -> String {
        if matches!(self.mode, OutputMode::Json) {
            return String::new();
        }
        text.lines().map(|line| format!("  {}\n", line)).collect()
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        print!("{}", self.section_text(title));
    }

    pub fn success(&self, message: &str) {
        print!("{}", self.success_text(message));
    }

    pub fn info(&self, message: &str) {
        print!("{}", self.info_text(message));
    }

    /// Print a key-value table
    pub fn table(&self, rows: &[(&str, String)]) {
        let max_key_len = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        match self.mode {
            OutputMode::Human => {
                for (key, value) in rows {
                    println!("  {:width$} │ {}", key.yellow(), value, width = max_key_len);
                }
            }
            OutputMode::Plain => {
                for (key, value) in rows {
                    println!("  {:width$} : {}", key, value, width = max_key_len);
                }
            }
            OutputMode::Json => {}
        }
    }

    /// Pretty JSON on stdout; no-op outside JSON mode
    pub fn emit_json<T: Serialize>(&self, value: &T) {
        if matches!(self.mode, OutputMode::Json) {
            if let Ok(json) = serde_json::to_string_pretty(value) {
                println!("{}", json);
            }
        }
    }

    /// Spinner shown while a remote call is in flight (human mode only)
    pub fn spinner(&self, message: &str) -> Option<ProgressBar> {
        if !matches!(self.mode, OutputMode::Human) {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("  {spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    }

    fn issue_text(&self, issue: &Issue) -> String {
        let line = issue
            .line
            .map(|l| format!(" (line {})", l))
            .unwrap_or_default();

        match self.mode {
            OutputMode::Human => {
                let label = match issue.severity {
                    Severity::Error => format!("[{}]", issue.severity).red().bold(),
                    Severity::Warning => format!("[{}]", issue.severity).yellow().bold(),
                    Severity::Info => format!("[{}]", issue.severity).cyan().bold(),
                };
                format!(
                    "  {} {}{}\n      {}\n",
                    label,
                    issue.message,
                    line,
                    issue.suggestion.dimmed()
                )
            }
            OutputMode::Plain => format!(
                "  [{}] {}{}\n      {}\n",
                issue.severity, issue.message, line, issue.suggestion
            ),
            OutputMode::Json => String::new(),
        }
    }

    fn issues_text(&self, issues: &[Issue]) -> String {
        if issues.is_empty() {
            return self.success_text(NO_ISSUES);
        }

        let mut out = self.section_text(&format!("Issues Found ({})", issues.len()));
        for issue in issues {
            out.push_str(&self.issue_text(issue));
        }
        out
    }

    pub fn issues(&self, issues: &[Issue]) {
        print!("{}", self.issues_text(issues));
    }

    fn notice_text(&self, notice: &Notice) -> String {
        let text = format!("{}: {}", notice.title, notice.description);
        if notice.destructive {
            self.warning_text(&text)
        } else {
            self.success_text(&text)
        }
    }

    /// Text for a finished submission. A failed analysis renders only the
    /// error and a server hint, meant for stderr.
    pub fn render_submission(&self, submission: &Submission, api_url: &str) -> String {
        if matches!(self.mode, OutputMode::Json) {
            return serde_json::to_string_pretty(submission).unwrap_or_default() + "\n";
        }

        if submission.phase == Phase::AnalysisFailed {
            let message = submission.error.as_deref().unwrap_or("Failed to analyze code");
            return self.error_text(message)
                + &self.error_text(&format!(
                    "Make sure the review server is running at {}",
                    api_url
                ));
        }

        let mut out = String::new();
        if let Some(result) = &submission.result {
            out.push_str(&self.issues_text(&result.issues));
            if !result.issues.is_empty() {
                out.push_str(&self.info_text(&format!(
                    "{} error(s), {} warning(s), {} info",
                    result.count(Severity::Error),
                    result.count(Severity::Warning),
                    result.count(Severity::Info)
                )));
            }

            out.push_str(&self.section_text("Analysis"));
            let summary = if result.summary.trim().is_empty() {
                EMPTY_SUMMARY
            } else {
                result.summary.as_str()
            };
            out.push_str(&self.block_text(summary));
        }

        if let Some(fixed) = &submission.fixed_code {
            out.push_str(&self.section_text(&format!("Fixed Code ({})", submission.language)));
            out.push_str(&self.block_text(&fixed.cleaned));
        }

        out.push('\n');
        for notice in &submission.notices {
            out.push_str(&self.notice_text(notice));
        }
        out
    }

    /// Render a finished submission
    pub fn submission(&self, submission: &Submission, api_url: &str) {
        let text = self.render_submission(submission, api_url);
        if submission.phase == Phase::AnalysisFailed && !matches!(self.mode, OutputMode::Json) {
            eprint!("{}", text);
        } else {
            print!("{}", text);
        }
    }
}

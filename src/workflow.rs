// Submission workflow - analyze, then auto-fix when the analysis found errors
//
// Each submission is an immutable `Submission` record; transitions return a new
// record and the workflow swaps it in only if the submission is still current.
use crate::api_client::ReviewService;
use crate::classifier::{self, patterns::PatternMatcher, Branch};
use crate::models::{AnalysisResult, CodeRequest, FixedCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Analyzing,
    Analyzed,
    AnalysisFailed,
    Fixing,
    Fixed,
    FixFailed,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Analyzing => "analyzing",
            Phase::Analyzed => "analyzed",
            Phase::AnalysisFailed => "analysis_failed",
            Phase::Fixing => "fixing",
            Phase::Fixed => "fixed",
            Phase::FixFailed => "fix_failed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("Cannot {event} while {from}")]
    InvalidTransition { from: Phase, event: &'static str },
    #[error("Submission {generation} was superseded by submission {current}")]
    Superseded { generation: u64, current: u64 },
}

/// User-facing message emitted at the end of a workflow step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub destructive: bool,
}

impl Notice {
    fn new(title: &str, description: impl Into<String>, destructive: bool) -> Self {
        Self {
            title: title.to_string(),
            description: description.into(),
            destructive,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub generation: u64,
    pub phase: Phase,
    pub code: String,
    pub language: String,
    pub result: Option<AnalysisResult>,
    pub branch: Option<Branch>,
    pub fixed_code: Option<FixedCode>,
    pub error: Option<String>,
    pub fix_error: Option<String>,
    pub notices: Vec<Notice>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Submission {
    pub fn idle(generation: u64) -> Self {
        Self {
            generation,
            phase: Phase::Idle,
            code: String::new(),
            language: String::new(),
            result: None,
            branch: None,
            fixed_code: None,
            error: None,
            fix_error: None,
            notices: Vec::new(),
            started_at: None,
            finished_at: None,
        }
    }

    /// Fresh record in `analyzing`; nothing carries over from earlier submissions
    pub fn begin(generation: u64, code: String, language: String) -> Self {
        Self {
            phase: Phase::Analyzing,
            code,
            language,
            started_at: Some(Utc::now()),
            ..Self::idle(generation)
        }
    }

    pub fn request(&self) -> CodeRequest {
        CodeRequest::new(self.code.clone(), self.language.clone())
    }

    /// Whether the analysis produced at least one error-severity issue.
    ///
    /// Blank input has nothing to fix and is never sent.
    pub fn needs_fix(&self) -> bool {
        self.phase == Phase::Analyzed
            && !self.code.trim().is_empty()
            && self.result.as_ref().is_some_and(AnalysisResult::has_errors)
    }

    fn expect_phase(&self, phase: Phase, event: &'static str) -> Result<(), WorkflowError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(WorkflowError::InvalidTransition {
                from: self.phase,
                event,
            })
        }
    }

    fn finish(mut self, phase: Phase, notice: Notice) -> Self {
        self.phase = phase;
        self.notices.push(notice);
        self.finished_at = Some(Utc::now());
        self
    }

    pub fn analysis_succeeded(&self, analysis: String) -> Result<Self, WorkflowError> {
        self.expect_phase(Phase::Analyzing, "complete analysis")?;

        let classification =
            classifier::classify_with(&PatternMatcher::new(), &self.code, &self.language, &analysis);
        let issues = classification.issues;
        let description = match issues.len() {
            0 => "No major issues found in your code.".to_string(),
            1 => "Found 1 issue in your code.".to_string(),
            n => format!("Found {} issues in your code.", n),
        };

        let mut next = self.clone();
        next.result = Some(AnalysisResult::new(issues, analysis));
        next.branch = Some(classification.branch);
        Ok(next.finish(
            Phase::Analyzed,
            Notice::new("Analysis Complete", description, false),
        ))
    }

    pub fn analysis_failed(&self, message: String) -> Result<Self, WorkflowError> {
        self.expect_phase(Phase::Analyzing, "fail analysis")?;

        let mut next = self.clone();
        next.error = Some(message.clone());
        Ok(next.finish(
            Phase::AnalysisFailed,
            Notice::new("Analysis Failed", message, true),
        ))
    }

    pub fn start_fix(&self) -> Result<Self, WorkflowError> {
        if !self.needs_fix() {
            return Err(WorkflowError::InvalidTransition {
                from: self.phase,
                event: "start fix",
            });
        }

        let mut next = self.clone();
        next.phase = Phase::Fixing;
        next.finished_at = None;
        Ok(next)
    }

    pub fn fix_succeeded(&self, fixed_code: String) -> Result<Self, WorkflowError> {
        self.expect_phase(Phase::Fixing, "complete fix")?;

        let mut next = self.clone();
        next.fixed_code = Some(FixedCode::from_raw(fixed_code));
        Ok(next.finish(
            Phase::Fixed,
            Notice::new(
                "Code Fixed",
                "AI has generated a corrected version of your code.",
                false,
            ),
        ))
    }

    /// The analysis result stays available; only the fix is marked failed
    pub fn fix_failed(&self, message: String) -> Result<Self, WorkflowError> {
        self.expect_phase(Phase::Fixing, "fail fix")?;

        let mut next = self.clone();
        next.fix_error = Some(message);
        Ok(next.finish(
            Phase::FixFailed,
            Notice::new(
                "Fix Failed",
                "Could not auto-fix the code, but analysis is available.",
                true,
            ),
        ))
    }
}

/// Callback invoked with every record the workflow accepts
pub type TransitionObserver = Box<dyn Fn(&Submission) + Send + Sync>;

/// Drives one submission at a time against a review service.
///
/// Starting a submission bumps the generation; responses belonging to an
/// older generation are dropped with `WorkflowError::Superseded`.
pub struct Workflow<S> {
    service: S,
    auto_fix: bool,
    observer: Option<TransitionObserver>,
    state: Mutex<Submission>,
}

impl<S: ReviewService> Workflow<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            auto_fix: true,
            observer: None,
            state: Mutex::new(Submission::idle(0)),
        }
    }

    pub fn with_auto_fix(mut self, enabled: bool) -> Self {
        self.auto_fix = enabled;
        self
    }

    /// Called after each accepted transition, outside the state lock
    pub fn on_transition<F>(mut self, observer: F) -> Self
    where
        F: Fn(&Submission) + Send + Sync + 'static,
    {
        self.observer = Some(Box::new(observer));
        self
    }

    fn lock(&self) -> MutexGuard<'_, Submission> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[allow(dead_code)]
    pub fn snapshot(&self) -> Submission {
        self.lock().clone()
    }

    /// Back to `idle`; anything still in flight becomes stale
    #[allow(dead_code)]
    pub fn reset(&self) -> Submission {
        let mut state = self.lock();
        *state = Submission::idle(state.generation + 1);
        state.clone()
    }

    pub fn begin(&self, code: String, language: String) -> Submission {
        let mut state = self.lock();
        let generation = state.generation + 1;
        *state = Submission::begin(generation, code, language);
        info!(
            "Submission {}: analyzing {} ({} chars)",
            generation,
            state.language,
            state.code.chars().count()
        );
        state.clone()
    }

    fn apply<F>(&self, generation: u64, transition: F) -> Result<Submission, WorkflowError>
    where
        F: FnOnce(&Submission) -> Result<Submission, WorkflowError>,
    {
        let mut state = self.lock();
        if state.generation != generation {
            warn!(
                "Dropping response for submission {} (current is {})",
                generation, state.generation
            );
            return Err(WorkflowError::Superseded {
                generation,
                current: state.generation,
            });
        }

        let next = transition(&*state)?;
        info!("Submission {}: {} -> {}", generation, state.phase, next.phase);
        if next.notices.len() > state.notices.len() {
            if let Some(notice) = next.notices.last() {
                info!("{}: {}", notice.title, notice.description);
            }
        }
        *state = next.clone();
        drop(state);

        if let Some(observer) = &self.observer {
            observer(&next);
        }
        Ok(next)
    }

    /// Run a full submission cycle and return its terminal record.
    ///
    /// Transport failures are recorded in the returned submission, not
    /// returned as errors.
    pub async fn submit(
        &self,
        code: impl Into<String>,
        language: impl Into<String>,
    ) -> Result<Submission, WorkflowError> {
        let started = self.begin(code.into(), language.into());
        let generation = started.generation;
        let request = started.request();

        let analyzed = match self.service.analyze(&request).await {
            Ok(response) => {
                self.apply(generation, |s| s.analysis_succeeded(response.analysis))?
            }
            Err(e) => return self.apply(generation, |s| s.analysis_failed(e.to_string())),
        };

        if !analyzed.needs_fix() {
            return Ok(analyzed);
        }
        if !self.auto_fix {
            info!("Submission {}: auto-fix disabled", generation);
            return Ok(analyzed);
        }

        self.apply(generation, Submission::start_fix)?;

        match self.service.fix(&request).await {
            Ok(response) => self.apply(generation, |s| s.fix_succeeded(response.fixed_code)),
            Err(e) => self.apply(generation, |s| s.fix_failed(e.to_string())),
        }
    }
}

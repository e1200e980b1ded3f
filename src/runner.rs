//! Differential runner: classify, render, execute and check every case in order.
//!
//! The runner owns the running digest and the case counter. A resume token
//! skips already-verified cases: their outcomes are still folded into the
//! digest (nothing is compiled), and the digest prefix is compared against the
//! token before real execution resumes.
use crate::checker;
use crate::digest::OutcomeDigest;
use crate::domain::TestDomain;
use crate::oracle;
use crate::outcome::Outcome;
use crate::sandbox::{CapturedOutput, Sandbox};
use crate::script::{self, DriverOverrides, RenderedScript};
use crate::specification::Specification;
use crate::summary;
use anyhow::{anyhow, Context, Result};
use std::fmt;
use std::str::FromStr;

/// `N` or `N:hexprefix`: skip the first `N` cases, optionally checking the
/// digest of their outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeToken {
    pub index: usize,
    pub hash_prefix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed resume token {raw:?} (expected N or N:hexprefix)")]
pub struct ResumeTokenError {
    pub raw: String,
}

impl FromStr for ResumeToken {
    type Err = ResumeTokenError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let malformed = || ResumeTokenError {
            raw: raw.to_string(),
        };
        let (index_text, prefix) = match raw.split_once(':') {
            Some((index_text, prefix)) => (index_text, Some(prefix)),
            None => (raw, None),
        };
        if index_text.is_empty() || !index_text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let index = index_text.parse::<usize>().map_err(|_| malformed())?;
        let hash_prefix = match prefix {
            Some(prefix)
                if !prefix.is_empty()
                    && prefix.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) =>
            {
                Some(prefix.to_string())
            }
            Some(_) => return Err(malformed()),
            None => None,
        };
        Ok(Self { index, hash_prefix })
    }
}

impl fmt::Display for ResumeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.hash_prefix {
            Some(prefix) => write!(f, "{}:{prefix}", self.index),
            None => write!(f, "{}", self.index),
        }
    }
}

/// Runs a rendered script and captures what it did.
pub trait CaseExecutor {
    fn execute(&self, rendered: &RenderedScript) -> Result<CapturedOutput>;
}

impl CaseExecutor for Sandbox {
    fn execute(&self, rendered: &RenderedScript) -> Result<CapturedOutput> {
        self.run(&rendered.script())
    }
}

/// Everything observed for one executed case.
#[derive(Debug, Clone)]
pub struct CaseRun {
    pub outcome: Outcome,
    pub rendered: RenderedScript,
    pub captured: CapturedOutput,
    pub failures: Vec<String>,
}

impl CaseRun {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Full pipeline for a single case: classify, render, execute, check.
pub fn execute_case<E: CaseExecutor + ?Sized>(
    spec: &Specification,
    executor: &E,
    drivers: &DriverOverrides,
) -> Result<CaseRun> {
    let outcome = oracle::classify(spec)?;
    execute_classified(spec, outcome, executor, drivers)
}

fn execute_classified<E: CaseExecutor + ?Sized>(
    spec: &Specification,
    outcome: Outcome,
    executor: &E,
    drivers: &DriverOverrides,
) -> Result<CaseRun> {
    let rendered = script::render(spec, drivers);
    let captured = executor
        .execute(&rendered)
        .with_context(|| format!("execute case {spec}"))?;
    let failures = checker::verify(&outcome, &captured);
    Ok(CaseRun {
        outcome,
        rendered,
        captured,
        failures,
    })
}

/// A prediction that did not hold, with everything needed to reproduce it.
#[derive(Debug, Clone)]
pub struct CaseFailure {
    pub index: usize,
    pub spec: Specification,
    pub run: CaseRun,
    /// Re-runs the failing case.
    pub resume_at: ResumeToken,
    /// Continues with the next case.
    pub skip_past: ResumeToken,
}

impl fmt::Display for CaseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&summary::failure_report(self))
    }
}

impl std::error::Error for CaseFailure {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub case_count: usize,
    pub skipped: usize,
    pub executed: usize,
    pub digest: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunnerState {
    Skipping { remaining: usize },
    Verifying,
    Running,
}

pub struct Runner<'a, E: CaseExecutor + ?Sized> {
    executor: &'a E,
    drivers: &'a DriverOverrides,
}

impl<'a, E: CaseExecutor + ?Sized> Runner<'a, E> {
    pub fn new(executor: &'a E, drivers: &'a DriverOverrides) -> Self {
        Self { executor, drivers }
    }

    /// Walk the domain, stopping at the first failing case.
    pub fn run(&self, domain: &TestDomain, resume: Option<&ResumeToken>) -> Result<RunReport> {
        let case_count = domain.case_count();
        let skip = resume.map_or(0, |token| token.index);
        if skip > case_count {
            return Err(anyhow!(
                "resume index {skip} is past the end of the domain ({case_count} cases)"
            ));
        }
        let expected_prefix = resume.and_then(|token| token.hash_prefix.as_deref());

        let mut state = if resume.is_some() {
            RunnerState::Skipping { remaining: skip }
        } else {
            RunnerState::Running
        };
        let mut digest = OutcomeDigest::new();
        let mut executed = 0usize;

        for (index, spec) in domain.iter().enumerate() {
            state = advance(state, expected_prefix, &digest)?;
            let outcome = oracle::classify(&spec).with_context(|| format!("classify case {index}"))?;

            if let RunnerState::Skipping { remaining } = state {
                digest.fold(&outcome)?;
                state = RunnerState::Skipping {
                    remaining: remaining - 1,
                };
                continue;
            }

            println!("{}", summary::progress_line(index, &spec, &outcome));
            let resume_at = ResumeToken {
                index,
                hash_prefix: Some(digest.token_prefix()),
            };
            let run = execute_classified(&spec, outcome, self.executor, self.drivers)?;
            digest.fold(&run.outcome)?;
            executed += 1;

            if !run.passed() {
                tracing::debug!(index, failures = run.failures.len(), "case failed");
                let skip_past = ResumeToken {
                    index: index + 1,
                    hash_prefix: Some(digest.token_prefix()),
                };
                return Err(CaseFailure {
                    index,
                    spec,
                    run,
                    resume_at,
                    skip_past,
                }
                .into());
            }
        }
        // Skipping the whole domain still checks the token.
        advance(state, expected_prefix, &digest)?;

        Ok(RunReport {
            case_count,
            skipped: skip,
            executed,
            digest: digest.hex(),
        })
    }
}

fn advance(
    state: RunnerState,
    expected_prefix: Option<&str>,
    digest: &OutcomeDigest,
) -> Result<RunnerState> {
    let state = match state {
        RunnerState::Skipping { remaining: 0 } => {
            tracing::info!(skipped = digest.folded(), "skip complete");
            RunnerState::Verifying
        }
        other => other,
    };
    if state != RunnerState::Verifying {
        return Ok(state);
    }
    if let Some(expected) = expected_prefix {
        let actual = digest.hex();
        if !actual.starts_with(expected) {
            return Err(anyhow!(
                "resume token {}:{expected} does not match this oracle: digest after {} cases is {}",
                digest.folded(),
                digest.folded(),
                &actual[..expected.len().min(actual.len())]
            ));
        }
        tracing::info!(prefix = expected, "resume digest verified");
    }
    Ok(RunnerState::Running)
}

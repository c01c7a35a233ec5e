//! Report Driver
//!
//! Runs every catalog case through the lowering adapter and the match engine
//! in catalog order, writing a `FAIL` line per failing case to a caller
//! supplied sink. A failing case never stops the run; only fatal errors
//! (engine could not run, sink write failed) do.
//!
//! A driver is single-use: `NotStarted → Running → Completed`.

use serde::Serialize;
use std::fmt;
use std::io::Write;

use crate::catalog::{BuiltinCase, Catalog};
use crate::config::DEFAULT_TARGET_PREFIX;
use crate::error::{VerifyError, VerifyResult};
use crate::lowering::{FeatureSet, LoweringAdapter, LoweringTrace};
use crate::matcher;

/// Lifecycle of a [`Driver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    NotStarted,
    Running,
    Completed,
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DriverState::NotStarted => "not started",
            DriverState::Running => "running",
            DriverState::Completed => "completed",
        })
    }
}

/// Outcome of verifying one case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseResult {
    pub case: BuiltinCase,
    pub passed: bool,
    pub actual_trace: LoweringTrace,
    /// First trace entry containing the expected pattern
    pub matched: Option<String>,
    /// Whether some trace entry carries the target prefix
    pub prefixed: bool,
}

impl CaseResult {
    /// Report line for a failed case.
    pub fn failure_line(&self, prefix: &str) -> String {
        let head = format!(
            "FAIL {} {} {}",
            self.case.name, self.case.operand_kind, self.case.element_type
        );
        if self.matched.is_none() {
            format!(
                "{}: expected \"{}\" not found in [{}]",
                head, self.case.expected_op_name, self.actual_trace
            )
        } else {
            format!(
                "{}: no \"{}\" operation in [{}]",
                head, prefix, self.actual_trace
            )
        }
    }
}

/// Aggregate counts over a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub failing_names: Vec<String>,
}

impl Summary {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// `PASSED <p>/<total>`
impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PASSED {}/{}", self.passed, self.total)
    }
}

/// Count results and collect failing builtin names in run order.
pub fn summarize(results: &[CaseResult]) -> Summary {
    let mut summary = Summary {
        total: results.len(),
        ..Summary::default()
    };
    for result in results {
        if result.passed {
            summary.passed += 1;
        } else {
            summary.failed += 1;
            summary.failing_names.push(result.case.name.clone());
        }
    }
    summary
}

/// Runs a catalog once against one adapter and feature set.
pub struct Driver<'c> {
    catalog: &'c Catalog,
    adapter: LoweringAdapter,
    features: FeatureSet,
    prefix: String,
    verbose: bool,
    state: DriverState,
}

impl<'c> Driver<'c> {
    pub fn new(catalog: &'c Catalog, adapter: LoweringAdapter, features: FeatureSet) -> Self {
        Self {
            catalog,
            adapter,
            features,
            prefix: DEFAULT_TARGET_PREFIX.to_string(),
            verbose: false,
            state: DriverState::NotStarted,
        }
    }

    /// Prefix a trace entry must carry for the case to pass.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Also write a `PASS` line per passing case.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Verify every case in catalog order. Callable once.
    pub fn run<W: Write>(&mut self, sink: &mut W) -> VerifyResult<Vec<CaseResult>> {
        if self.state != DriverState::NotStarted {
            return Err(VerifyError::InvalidState(self.state));
        }
        self.state = DriverState::Running;
        log::info!(
            "verifying {} cases with engine '{}', features {:?}",
            self.catalog.len(),
            self.adapter.engine_name(),
            self.features
        );

        let outcome = self.run_cases(sink);
        self.state = DriverState::Completed;

        if let Ok(results) = &outcome {
            let summary = summarize(results);
            log::info!("{} ({} failed)", summary, summary.failed);
        }
        outcome
    }

    fn run_cases<W: Write>(&self, sink: &mut W) -> VerifyResult<Vec<CaseResult>> {
        let mut results = Vec::with_capacity(self.catalog.len());

        for case in self.catalog {
            let trace = self.adapter.lower(case, &self.features)?;
            let result = self.check(case, trace);

            if !result.passed {
                writeln!(sink, "{}", result.failure_line(&self.prefix))?;
            } else if self.verbose {
                writeln!(
                    sink,
                    "PASS {} {} {}: {}",
                    case.name,
                    case.operand_kind,
                    case.element_type,
                    result.matched.as_deref().unwrap_or_default()
                )?;
            }
            results.push(result);
        }

        Ok(results)
    }

    fn check(&self, case: &BuiltinCase, trace: LoweringTrace) -> CaseResult {
        let matched = matcher::first_match(&trace, &case.expected_op_name).map(str::to_string);
        let prefixed = matcher::has_prefix(&trace, &self.prefix);
        if matched.is_some() && !prefixed {
            log::warn!(
                "{} {} {}: pattern matched but no '{}' operation in trace",
                case.name,
                case.operand_kind,
                case.element_type,
                self.prefix
            );
        }

        CaseResult {
            case: case.clone(),
            passed: matched.is_some() && prefixed,
            actual_trace: trace,
            matched,
            prefixed,
        }
    }
}

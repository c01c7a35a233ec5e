//! Lowering Adapter
//!
//! Bridges the verifier to the code generator under test. The generator is
//! an injected [`LoweringEngine`]; the adapter gates each call on the case's
//! required target feature and wraps the engine's output in a
//! [`LoweringTrace`].
//!
//! Two engines ship with the crate:
//!
//! - [`ReferenceLowering`]: a table model of x86 FMA4 builtin lowering
//! - [`CommandLowering`]: runs an external compiler and scrapes the
//!   intrinsic calls from its output

pub mod command;
pub mod reference;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

use crate::catalog::{BuiltinCase, ElementType, OperandKind};

pub use command::CommandLowering;
pub use reference::ReferenceLowering;

/// Enabled target features. Ordered so that rendering is deterministic.
pub type FeatureSet = BTreeSet<String>;

/// Parse a comma-separated feature list. Empty items are dropped and a
/// leading `+` (as in `-target-feature +fma4`) is stripped.
pub fn parse_features(list: &str) -> FeatureSet {
    list.split(',')
        .map(|f| f.trim().trim_start_matches('+'))
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

/// Errors raised when an engine cannot produce a trace at all.
#[derive(Debug, Error)]
pub enum LoweringError {
    #[error("failed to spawn '{program}'")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with {status}: {stderr}")]
    ExitStatus {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("engine '{0}' is not configured: {1}")]
    NotConfigured(String, String),
}

/// Ordered operation names produced by lowering one builtin invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoweringTrace {
    ops: Vec<String>,
}

impl LoweringTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: impl Into<String>) {
        self.ops.push(op.into());
    }

    pub fn entries(&self) -> &[String] {
        &self.ops
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.ops.iter()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl From<Vec<String>> for LoweringTrace {
    fn from(ops: Vec<String>) -> Self {
        Self { ops }
    }
}

/// Renders as the entries joined by `", "`.
impl fmt::Display for LoweringTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.ops.join(", "))
    }
}

/// The code generator under test.
///
/// Implementations are assumed deterministic: the same inputs always yield
/// the same operation names, so callers never retry.
pub trait LoweringEngine {
    /// Short engine name for logs.
    fn name(&self) -> &str;

    /// Lower one builtin invocation to the names of the operations it
    /// produces. An empty result means the builtin did not lower.
    fn lower(
        &self,
        builtin: &str,
        kind: OperandKind,
        elem: ElementType,
        features: &FeatureSet,
    ) -> Result<Vec<String>, LoweringError>;
}

/// Adapts a plain function or closure into a [`LoweringEngine`].
pub struct FnLowering<F> {
    name: String,
    func: F,
}

impl<F> FnLowering<F>
where
    F: Fn(&str, OperandKind, ElementType, &FeatureSet) -> Vec<String>,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> LoweringEngine for FnLowering<F>
where
    F: Fn(&str, OperandKind, ElementType, &FeatureSet) -> Vec<String>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn lower(
        &self,
        builtin: &str,
        kind: OperandKind,
        elem: ElementType,
        features: &FeatureSet,
    ) -> Result<Vec<String>, LoweringError> {
        Ok((self.func)(builtin, kind, elem, features))
    }
}

/// Feature-gated front end to a [`LoweringEngine`]. Holds no state across
/// calls.
pub struct LoweringAdapter {
    engine: Box<dyn LoweringEngine>,
}

impl LoweringAdapter {
    pub fn new(engine: Box<dyn LoweringEngine>) -> Self {
        Self { engine }
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Lower `case` under `features`.
    ///
    /// When the case's required feature is not enabled the builtin is
    /// unavailable: the engine is not consulted and the trace is empty.
    pub fn lower(
        &self,
        case: &BuiltinCase,
        features: &FeatureSet,
    ) -> Result<LoweringTrace, LoweringError> {
        if !features.contains(&case.required_feature) {
            log::debug!(
                "{} {} {}: feature '{}' not enabled, skipping lowering",
                case.name,
                case.operand_kind,
                case.element_type,
                case.required_feature
            );
            return Ok(LoweringTrace::new());
        }

        let ops = self.engine.lower(
            &case.name,
            case.operand_kind,
            case.element_type,
            features,
        )?;
        log::debug!(
            "{} {} {} lowered by {} to {:?}",
            case.name,
            case.operand_kind,
            case.element_type,
            self.engine.name(),
            ops
        );
        Ok(LoweringTrace::from(ops))
    }
}

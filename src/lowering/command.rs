//! External Command Lowering
//!
//! Runs a real compiler once per builtin and scrapes the intrinsic calls it
//! emits. Argument templates may contain the placeholders `{name}`,
//! `{kind}`, `{elem}` and `{features}`; features are substituted as a
//! comma-separated list.
//!
//! ```toml
//! [engine]
//! kind = "command"
//! program = "./lower-builtin.sh"
//! args = ["{name}", "{kind}", "{elem}", "+{features}"]
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use std::process::Command;

use super::{FeatureSet, LoweringEngine, LoweringError};
use crate::catalog::{ElementType, OperandKind};

static INTRINSIC_SYMBOL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@(llvm\.[A-Za-z0-9_.]+)").expect("intrinsic symbol regex"));

/// Lowering engine backed by an external program.
#[derive(Debug, Clone)]
pub struct CommandLowering {
    program: String,
    args: Vec<String>,
}

impl CommandLowering {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Expand placeholders in the argument templates.
    pub fn render_args(
        &self,
        builtin: &str,
        kind: OperandKind,
        elem: ElementType,
        features: &FeatureSet,
    ) -> Vec<String> {
        let joined = features
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",");
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{name}", builtin)
                    .replace("{kind}", kind.as_str())
                    .replace("{elem}", elem.as_str())
                    .replace("{features}", &joined)
            })
            .collect()
    }
}

/// Every `@llvm.*` symbol in `output`, in order of appearance, without the
/// leading `@`.
pub fn extract_intrinsics(output: &str) -> Vec<String> {
    INTRINSIC_SYMBOL
        .captures_iter(output)
        .map(|c| c[1].trim_end_matches('.').to_string())
        .collect()
}

impl LoweringEngine for CommandLowering {
    fn name(&self) -> &str {
        &self.program
    }

    fn lower(
        &self,
        builtin: &str,
        kind: OperandKind,
        elem: ElementType,
        features: &FeatureSet,
    ) -> Result<Vec<String>, LoweringError> {
        let args = self.render_args(builtin, kind, elem, features);
        log::debug!("running {} {:?}", self.program, args);

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|source| LoweringError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(LoweringError::ExitStatus {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(extract_intrinsics(&String::from_utf8_lossy(&output.stdout)))
    }
}

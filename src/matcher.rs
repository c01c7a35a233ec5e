//! Match Engine
//!
//! Substring matching of a lowering trace against an expected operation
//! name, in the manner of a `CHECK:` directive: any entry containing the
//! pattern is a hit and ordering within the trace is irrelevant.

use crate::lowering::LoweringTrace;

/// Whether any entry of `trace` contains `expected`.
///
/// An empty trace never matches a non-empty pattern.
pub fn matches(trace: &LoweringTrace, expected: &str) -> bool {
    first_match(trace, expected).is_some()
}

/// The first entry of `trace` containing `expected`. Later matches are
/// ignored.
pub fn first_match<'t>(trace: &'t LoweringTrace, expected: &str) -> Option<&'t str> {
    trace
        .iter()
        .find(|op| op.contains(expected))
        .map(String::as_str)
}

/// Whether any entry of `trace` starts with the target prefix.
pub fn has_prefix(trace: &LoweringTrace, prefix: &str) -> bool {
    trace.iter().any(|op| op.starts_with(prefix))
}

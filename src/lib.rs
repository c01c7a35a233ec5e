//! Lowercheck - Builtin Lowering Verifier
//!
//! Checks that a code generator lowers vector builtins to the low-level
//! operations they are supposed to become. Each builtin in a catalog is
//! lowered under a target-feature set and the resulting trace must contain
//! the expected operation name, the way a `CHECK:` line in a compiler
//! regression test would demand.
//!
//! # Example
//!
//! ```rust
//! use lowercheck::{parse_features, summarize, Catalog, Driver, LoweringAdapter, ReferenceLowering};
//!
//! let catalog = Catalog::embedded().unwrap();
//! let adapter = LoweringAdapter::new(Box::new(ReferenceLowering::new()));
//! let mut driver = Driver::new(&catalog, adapter, parse_features("fma4"));
//!
//! let mut report = Vec::new();
//! let results = driver.run(&mut report).unwrap();
//! assert!(summarize(&results).is_success());
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │    Catalog      │  builtin → expected operation pattern
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐      ┌──────────────────┐
//! │ LoweringAdapter │ ───▶ │  LoweringEngine  │  code generator under test
//! └────────┬────────┘      └──────────────────┘
//!          │ trace
//!          ▼
//! ┌─────────────────┐
//! │    matcher      │  substring + target prefix
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │     Driver      │  FAIL lines, PASSED p/total
//! └─────────────────┘
//! ```

#![warn(clippy::all)]

pub mod catalog;
pub mod config;
pub mod driver;
pub mod error;
pub mod lowering;
pub mod matcher;

// Re-export commonly used types
pub use catalog::{BuiltinCase, Catalog, CatalogError, CatalogSource, ElementType, OperandKind};
pub use config::{ConfigError, EngineKind, LowercheckConfig, ReportFormat};
pub use driver::{summarize, CaseResult, Driver, DriverState, Summary};
pub use error::{VerifyError, VerifyResult, EXIT_CONFIG, EXIT_FAILED, EXIT_PASSED};
pub use lowering::{
    parse_features, CommandLowering, FeatureSet, FnLowering, LoweringAdapter, LoweringEngine,
    LoweringError, LoweringTrace, ReferenceLowering,
};
pub use matcher::{first_match, has_prefix, matches};

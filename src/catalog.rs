//! Operation Catalog
//!
//! The table of builtins to verify, each mapped to the operation-name pattern
//! its lowering must contain. A catalog is built once at startup, either from
//! the embedded FMA4 table or from a line-oriented file, and is read-only
//! afterwards.
//!
//! # File format
//!
//! ```text
//! # name,operandKind,elementType,expectedPattern[,requiredFeature]
//! macc_ps,Packed128,Float32,fma4.vfmadd.ps
//! macc_pd,Packed256,Float64,fma4.vfmadd.pd.256,fma4
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Catalog loading errors. All of them are configuration errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: expected 4 or 5 comma-separated fields, got {got}")]
    FieldCount { line: usize, got: usize },

    #[error("line {line}: unknown operand kind '{value}'")]
    UnknownOperandKind { line: usize, value: String },

    #[error("line {line}: unknown element type '{value}'")]
    UnknownElementType { line: usize, value: String },

    #[error("line {line}: empty builtin name")]
    EmptyName { line: usize },

    #[error("line {line}: builtin '{name}' has an empty expected pattern")]
    EmptyPattern { line: usize, name: String },

    #[error("line {line}: builtin '{name}' has an empty required feature")]
    EmptyFeature { line: usize, name: String },

    #[error("line {line}: duplicate case {name} {kind} {elem}")]
    Duplicate {
        line: usize,
        name: String,
        kind: OperandKind,
        elem: ElementType,
    },
}

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Register width and packing of a builtin's operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperandKind {
    /// 128-bit vector, every lane computed
    Packed128,
    /// 128-bit vector, only the low lane computed
    Scalar128,
    /// 256-bit vector, every lane computed
    Packed256,
}

impl OperandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperandKind::Packed128 => "Packed128",
            OperandKind::Scalar128 => "Scalar128",
            OperandKind::Packed256 => "Packed256",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "packed128" => Some(OperandKind::Packed128),
            "scalar128" => Some(OperandKind::Scalar128),
            "packed256" => Some(OperandKind::Packed256),
            _ => None,
        }
    }

    pub fn is_packed(&self) -> bool {
        !matches!(self, OperandKind::Scalar128)
    }

    pub fn width_bits(&self) -> u16 {
        match self {
            OperandKind::Packed128 | OperandKind::Scalar128 => 128,
            OperandKind::Packed256 => 256,
        }
    }
}

impl fmt::Display for OperandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lane element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    Float32,
    Float64,
}

impl ElementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Float32 => "Float32",
            ElementType::Float64 => "Float64",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "float32" | "f32" => Some(ElementType::Float32),
            "float64" | "f64" => Some(ElementType::Float64),
            _ => None,
        }
    }

    /// Instruction suffix for this element type under the given packing
    /// (`ps`, `pd`, `ss`, `sd`).
    pub fn suffix(&self, kind: OperandKind) -> &'static str {
        match (kind.is_packed(), self) {
            (true, ElementType::Float32) => "ps",
            (true, ElementType::Float64) => "pd",
            (false, ElementType::Float32) => "ss",
            (false, ElementType::Float64) => "sd",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One builtin to verify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltinCase {
    /// Builtin name (e.g., "macc_ps")
    pub name: String,
    pub operand_kind: OperandKind,
    pub element_type: ElementType,
    /// Substring the lowering trace must contain
    pub expected_op_name: String,
    /// Target feature that must be enabled for the builtin to lower at all
    pub required_feature: String,
}

impl BuiltinCase {
    pub fn new(
        name: impl Into<String>,
        operand_kind: OperandKind,
        element_type: ElementType,
        expected_op_name: impl Into<String>,
        required_feature: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            operand_kind,
            element_type,
            expected_op_name: expected_op_name.into(),
            required_feature: required_feature.into(),
        }
    }

    /// Identity of the case within a catalog.
    pub fn key(&self) -> (&str, OperandKind, ElementType) {
        (&self.name, self.operand_kind, self.element_type)
    }
}

/// Where a catalog is loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    Embedded,
    File(PathBuf),
}

impl CatalogSource {
    /// Interpret a `--catalog` argument: the literal `embedded` or a path.
    pub fn from_arg(arg: &str) -> Self {
        if arg.eq_ignore_ascii_case("embedded") {
            CatalogSource::Embedded
        } else {
            CatalogSource::File(PathBuf::from(arg))
        }
    }
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogSource::Embedded => f.write_str("embedded"),
            CatalogSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

use ElementType::{Float32, Float64};
use OperandKind::{Packed128, Packed256, Scalar128};

/// FMA4 builtins and the LLVM intrinsic each must lower to.
const FMA4_BUILTINS: &[(&str, OperandKind, ElementType, &str)] = &[
    // 128-bit
    ("macc_ps", Packed128, Float32, "fma4.vfmadd.ps"),
    ("macc_pd", Packed128, Float64, "fma4.vfmadd.pd"),
    ("macc_ss", Scalar128, Float32, "fma4.vfmadd.ss"),
    ("macc_sd", Scalar128, Float64, "fma4.vfmadd.sd"),
    ("msub_ps", Packed128, Float32, "fma4.vfmsub.ps"),
    ("msub_pd", Packed128, Float64, "fma4.vfmsub.pd"),
    ("msub_ss", Scalar128, Float32, "fma4.vfmsub.ss"),
    ("msub_sd", Scalar128, Float64, "fma4.vfmsub.sd"),
    ("nmacc_ps", Packed128, Float32, "fma4.vfnmadd.ps"),
    ("nmacc_pd", Packed128, Float64, "fma4.vfnmadd.pd"),
    ("nmacc_ss", Scalar128, Float32, "fma4.vfnmadd.ss"),
    ("nmacc_sd", Scalar128, Float64, "fma4.vfnmadd.sd"),
    ("nmsub_ps", Packed128, Float32, "fma4.vfnmsub.ps"),
    ("nmsub_pd", Packed128, Float64, "fma4.vfnmsub.pd"),
    ("nmsub_ss", Scalar128, Float32, "fma4.vfnmsub.ss"),
    ("nmsub_sd", Scalar128, Float64, "fma4.vfnmsub.sd"),
    ("maddsub_ps", Packed128, Float32, "fma4.vfmaddsub.ps"),
    ("maddsub_pd", Packed128, Float64, "fma4.vfmaddsub.pd"),
    ("msubadd_ps", Packed128, Float32, "fma4.vfmsubadd.ps"),
    ("msubadd_pd", Packed128, Float64, "fma4.vfmsubadd.pd"),
    // 256-bit
    ("macc_ps", Packed256, Float32, "fma4.vfmadd.ps.256"),
    ("macc_pd", Packed256, Float64, "fma4.vfmadd.pd.256"),
    ("msub_ps", Packed256, Float32, "fma4.vfmsub.ps.256"),
    ("msub_pd", Packed256, Float64, "fma4.vfmsub.pd.256"),
    ("nmacc_ps", Packed256, Float32, "fma4.vfnmadd.ps.256"),
    ("nmacc_pd", Packed256, Float64, "fma4.vfnmadd.pd.256"),
    ("nmsub_ps", Packed256, Float32, "fma4.vfnmsub.ps.256"),
    ("nmsub_pd", Packed256, Float64, "fma4.vfnmsub.pd.256"),
    ("maddsub_ps", Packed256, Float32, "fma4.vfmaddsub.ps.256"),
    ("maddsub_pd", Packed256, Float64, "fma4.vfmaddsub.pd.256"),
    ("msubadd_ps", Packed256, Float32, "fma4.vfmsubadd.ps.256"),
    ("msubadd_pd", Packed256, Float64, "fma4.vfmsubadd.pd.256"),
];

/// Feature every embedded builtin requires.
pub const FMA4_FEATURE: &str = "fma4";

/// An ordered, validated set of builtin cases.
#[derive(Debug, Clone)]
pub struct Catalog {
    cases: Vec<BuiltinCase>,
}

impl Catalog {
    /// Load from the given source.
    pub fn load(source: &CatalogSource, default_feature: &str) -> CatalogResult<Self> {
        match source {
            CatalogSource::Embedded => Self::embedded(),
            CatalogSource::File(path) => Self::load_file(path, default_feature),
        }
    }

    /// The built-in FMA4 table.
    pub fn embedded() -> CatalogResult<Self> {
        let cases = FMA4_BUILTINS
            .iter()
            .map(|&(name, kind, elem, pattern)| {
                BuiltinCase::new(name, kind, elem, pattern, FMA4_FEATURE)
            })
            .collect();
        Self::from_cases(cases)
    }

    /// Read a catalog file.
    pub fn load_file(path: &Path, default_feature: &str) -> CatalogResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text, default_feature)
    }

    /// Parse the line-oriented catalog format. Line numbers in errors are
    /// 1-based and count blank and comment lines.
    pub fn parse(text: &str, default_feature: &str) -> CatalogResult<Self> {
        let mut cases = Vec::new();
        let mut lines = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = trimmed.split(',').map(str::trim).collect();
            if fields.len() != 4 && fields.len() != 5 {
                return Err(CatalogError::FieldCount {
                    line,
                    got: fields.len(),
                });
            }

            let kind = OperandKind::from_name(fields[1]).ok_or_else(|| {
                CatalogError::UnknownOperandKind {
                    line,
                    value: fields[1].to_string(),
                }
            })?;
            let elem = ElementType::from_name(fields[2]).ok_or_else(|| {
                CatalogError::UnknownElementType {
                    line,
                    value: fields[2].to_string(),
                }
            })?;
            let feature = fields.get(4).copied().unwrap_or(default_feature);

            cases.push(BuiltinCase::new(fields[0], kind, elem, fields[3], feature));
            lines.push(line);
        }

        Self::validate(cases, &lines)
    }

    /// Build a catalog from already-constructed cases. Errors report the
    /// 1-based position of the offending case.
    pub fn from_cases(cases: Vec<BuiltinCase>) -> CatalogResult<Self> {
        let lines: Vec<usize> = (1..=cases.len()).collect();
        Self::validate(cases, &lines)
    }

    fn validate(cases: Vec<BuiltinCase>, lines: &[usize]) -> CatalogResult<Self> {
        {
            let mut seen = HashSet::with_capacity(cases.len());
            for (case, &line) in cases.iter().zip(lines) {
                if case.name.is_empty() {
                    return Err(CatalogError::EmptyName { line });
                }
                if case.expected_op_name.is_empty() {
                    return Err(CatalogError::EmptyPattern {
                        line,
                        name: case.name.clone(),
                    });
                }
                if case.required_feature.is_empty() {
                    return Err(CatalogError::EmptyFeature {
                        line,
                        name: case.name.clone(),
                    });
                }
                if !seen.insert(case.key()) {
                    return Err(CatalogError::Duplicate {
                        line,
                        name: case.name.clone(),
                        kind: case.operand_kind,
                        elem: case.element_type,
                    });
                }
            }
        }

        Ok(Self { cases })
    }

    pub fn cases(&self) -> &[BuiltinCase] {
        &self.cases
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BuiltinCase> {
        self.cases.iter()
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Render back to the file format, one case per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for case in &self.cases {
            out.push_str(&format!(
                "{},{},{},{},{}\n",
                case.name,
                case.operand_kind,
                case.element_type,
                case.expected_op_name,
                case.required_feature
            ));
        }
        out
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a BuiltinCase;
    type IntoIter = std::slice::Iter<'a, BuiltinCase>;

    fn into_iter(self) -> Self::IntoIter {
        self.cases.iter()
    }
}

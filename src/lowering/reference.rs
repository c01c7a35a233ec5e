//! Reference FMA4 Lowering
//!
//! Table model of how an x86 backend lowers the AMD FMA4 builtins:
//! `macc_ps` on 128-bit operands becomes a call to
//! `llvm.x86.fma4.vfmadd.ps`, the 256-bit form appends `.256`, and
//! nothing lowers unless the `fma4` feature is enabled.

use super::{FeatureSet, LoweringEngine, LoweringError};
use crate::catalog::{ElementType, OperandKind, FMA4_FEATURE};

/// Namespace of every intrinsic this engine emits.
pub const FMA4_INTRINSIC_PREFIX: &str = "llvm.x86.fma4.";

/// Builtin operation → FMA4 instruction mnemonic, and whether a scalar form
/// exists.
const FMA4_OPS: &[(&str, &str, bool)] = &[
    ("macc", "vfmadd", true),
    ("msub", "vfmsub", true),
    ("nmacc", "vfnmadd", true),
    ("nmsub", "vfnmsub", true),
    ("maddsub", "vfmaddsub", false),
    ("msubadd", "vfmsubadd", false),
];

/// Table-driven FMA4 lowering.
#[derive(Debug, Clone, Default)]
pub struct ReferenceLowering;

impl ReferenceLowering {
    pub fn new() -> Self {
        Self
    }

    /// Intrinsic name for a builtin, or `None` if no such form exists.
    ///
    /// The builtin's own type suffix (`_ps`, `_sd`, ...) is ignored; operand
    /// kind and element type decide the emitted suffix.
    pub fn intrinsic_for(builtin: &str, kind: OperandKind, elem: ElementType) -> Option<String> {
        let op = builtin.rsplit_once('_').map_or(builtin, |(op, _)| op);
        let &(_, mnemonic, has_scalar) = FMA4_OPS.iter().find(|(name, _, _)| *name == op)?;

        if !kind.is_packed() && !has_scalar {
            return None;
        }

        let mut name = format!(
            "{}{}.{}",
            FMA4_INTRINSIC_PREFIX,
            mnemonic,
            elem.suffix(kind)
        );
        if kind.width_bits() == 256 {
            name.push_str(".256");
        }
        Some(name)
    }
}

impl LoweringEngine for ReferenceLowering {
    fn name(&self) -> &str {
        "reference"
    }

    fn lower(
        &self,
        builtin: &str,
        kind: OperandKind,
        elem: ElementType,
        features: &FeatureSet,
    ) -> Result<Vec<String>, LoweringError> {
        if !features.contains(FMA4_FEATURE) {
            return Ok(Vec::new());
        }
        Ok(Self::intrinsic_for(builtin, kind, elem)
            .into_iter()
            .collect())
    }
}

//! Layered-material support.
//!
//! Materials are authored as expression trees that combine base BxDFs
//! with blend/modify operators. The operator taxonomy is live (device
//! kernels already test node tags against it); the compiler that
//! flattens the trees into a GPU-evaluable node list is declared but
//! not implemented, and the compile driver does not invoke it.

use crate::error::{Error, Result};

/// Operator tags are reserved above this base so a raw node tag can be
/// classified as "operator" vs "BxDF" with a range test on the device.
pub const OP_TYPE_BASE: u32 = 10_000;

/// Blend or modification operator applied to one or more BxDF
/// expressions.
///
/// Closed set; new operators get the next discriminant in the reserved
/// range. The discriminants are part of the device contract and must
/// never be reordered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum BlendOp {
    Mix = 10_001,
    BumpMap = 10_002,
    NormalMap = 10_003,
}

impl BlendOp {
    /// All operators, in tag order.
    pub const ALL: [BlendOp; 3] = [BlendOp::Mix, BlendOp::BumpMap, BlendOp::NormalMap];

    /// Classify a raw node tag, if it is a known operator.
    pub fn from_raw(value: u32) -> Option<Self> {
        match value {
            10_001 => Some(BlendOp::Mix),
            10_002 => Some(BlendOp::BumpMap),
            10_003 => Some(BlendOp::NormalMap),
            _ => None,
        }
    }

    /// Raw tag written into flattened material nodes.
    pub fn raw(self) -> u32 {
        self as u32
    }
}

/// Check whether a raw node tag falls in the operator range.
pub fn is_op_type(value: u32) -> bool {
    BlendOp::from_raw(value).is_some()
}

/// Convert authored material expression trees into a flattened,
/// GPU-evaluable node list.
///
/// Not implemented yet. Always fails so a caller wiring it into a
/// pipeline cannot silently ship un-compiled materials; the driver in
/// [`crate::compiler`] omits the call instead.
pub fn compile_layered_materials() -> Result<()> {
    Err(Error::Unsupported("layered material compiler"))
}

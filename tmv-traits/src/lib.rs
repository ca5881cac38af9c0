//! Shared traits for the tmv kernel crates.
//!
//! This crate defines the scalar model every kernel is generic over: which
//! element types exist, what type a product has, which type combinations a
//! kernel may mix, and the conjugation markers applied when an operand is
//! read.

pub mod element_op;
pub mod prod;
pub mod scalar;

pub use element_op::{ComposableElementOp, Conj, ElementOp, ElementOpApply, Identity};
pub use prod::{Lift, MulInto, OkTypes, ProdType};
pub use scalar::{ok_types, BaseType, RealScalar, Scalar, ScalarBase, ScalarKind};

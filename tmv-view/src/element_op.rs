//! Conjugation flags applied lazily when a view is read.
//!
//! Re-exported from [`tmv_traits`]. See that crate for full documentation.

pub use tmv_traits::element_op::{ComposableElementOp, Conj, ElementOp, ElementOpApply, Identity};

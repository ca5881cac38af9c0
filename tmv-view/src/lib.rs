//! Non-owning strided views for the tmv kernels.
//!
//! # Core Types
//!
//! - [`StridedView`] / [`StridedViewMut`]: const-rank views over borrowed data,
//!   `(pointer, size, strides)` with a type-level conjugation flag on the
//!   read-only side
//! - [`SmallMatRef`] / [`SmallMatMut`]: fixed-size contiguous matrices whose
//!   dimensions and storage order are compile-time parameters
//! - [`Matrix`]: owned dense matrix in a chosen storage order
//! - [`MatrixLayout`]: a matrix described by offset and strides inside a
//!   shared buffer, used where source and destination may overlap
//!
//! # Example
//!
//! ```rust
//! use tmv_view::{MatrixView, StorageOrder};
//!
//! let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
//! let a = MatrixView::new(&data, [2, 3], [3, 1], 0).unwrap();
//! assert_eq!(a.get([1, 2]), 6.0);
//! assert_eq!(a.storage_order(), StorageOrder::RowMajor);
//!
//! let at = a.t();
//! assert_eq!(at.size(), &[3, 2]);
//! assert_eq!(at.storage_order(), StorageOrder::ColMajor);
//! ```

mod element_op;
pub mod layout;
pub mod matrix;
pub mod small;
pub mod storage;
pub mod view;

pub use element_op::{ComposableElementOp, Conj, ElementOp, ElementOpApply, Identity};
pub use layout::{AliasKind, MatrixLayout};
pub use matrix::Matrix;
pub use small::{SmallMatMut, SmallMatRef};
pub use storage::{ColMajor, Order, RowMajor, StorageOrder};
pub use view::{
    MatrixView, MatrixViewMut, StridedView, StridedViewMut, VectorView, VectorViewMut,
};

/// Errors reported by view construction and by the view-based kernel entry points.
#[derive(Debug, thiserror::Error)]
pub enum TmvError {
    /// Operand shapes are incompatible for the operation.
    #[error("shape mismatch: {0:?} vs {1:?}")]
    ShapeMismatch(Vec<usize>, Vec<usize>),

    /// Integer overflow, or an offset outside the backing buffer.
    #[error("offset overflow while computing pointer")]
    OffsetOverflow,

    /// A sub-view or element index lies outside the view.
    #[error("index {index:?} out of bounds for size {size:?}")]
    OutOfBounds { index: Vec<usize>, size: Vec<usize> },

    /// Zero stride on a writable dimension of length > 1.
    #[error("invalid stride 0 for dim {dim}")]
    ZeroStride { dim: usize },

    /// A buffer layout that cannot be used for the requested operation.
    #[error("invalid layout: {0}")]
    InvalidLayout(&'static str),
}

/// Result type for view construction and kernel entry points.
pub type Result<T> = std::result::Result<T, TmvError>;

//! Dense matrix/vector arithmetic kernels with compile-time dispatch.
//!
//! Every operation picks its loop nest from the operands' storage orders,
//! the element-type combination, the scale factor (`1`, `-1` or arbitrary)
//! and whether the destination is assigned or accumulated into.
//!
//! # Core Types
//!
//! - [`Scalar`], [`ProdType`], [`OkTypes`]: the element-type model. A kernel
//!   instantiation whose types would silently drop an imaginary part does not
//!   compile.
//! - [`MatrixView`] / [`MatrixViewMut`] / [`VectorView`] / [`VectorViewMut`]:
//!   borrowed strided operands, with conjugation carried in the view type
//! - [`SmallMatRef`] / [`SmallMatMut`]: fixed-size operands for the [`small`]
//!   kernels
//! - [`Matrix`]: owned dense matrix
//!
//! # Operations
//!
//! ## Fixed-size ([`small`])
//!
//! - `mult_mv`, `add_mult_mv`, `mult_vm`, `add_mult_vm`
//! - `add_mm`, `mult_mm`, `add_mult_mm`
//! - `rank1_update`, `add_rank1_update`
//! - `mult_xm`, `add_mult_xm` (algorithm from [`small::small_mult_xm_algo`])
//!
//! ## Runtime-size
//!
//! - [`mult_mv`], [`add_mult_mv`], [`mult_vm`], [`add_mult_vm`]
//! - [`rank1_update`], [`add_rank1_update`]
//! - [`mult_mm`], [`add_mult_mm`], [`mult_mm_with_config`], [`mult_mm_conj`]
//! - [`mult_xm`], [`add_mult_xm`], [`mult_xm_conj`], [`mult_xm_in_buffer`]
//! - [`mult_xv`], [`add_vv`], [`mult_vv`]
//!
//! # Example
//!
//! ```rust
//! use tmv::{mult_mv, Matrix, StorageOrder, VectorView, VectorViewMut};
//!
//! let a = Matrix::from_row_major_slice(2, 2, StorageOrder::ColMajor, &[1.0f64, 2.0, 3.0, 4.0]).unwrap();
//! let x = [1.0f64, 1.0];
//! let mut y = [0.0f64; 2];
//! mult_mv(1.0f64, &a.view(), &VectorView::from_slice(&x), &mut VectorViewMut::from_slice(&mut y)).unwrap();
//! assert_eq!(y, [3.0, 7.0]);
//! ```
//!
//! # Features
//!
//! - `parallel` (default): large runtime multiplies run their output tiles on rayon
//! - `xdebug`: every runtime multiply is checked against a naive reference

// ============================================================================
// Scalar model
// ============================================================================
pub use tmv_traits::{
    ok_types, BaseType, ComposableElementOp, Conj, ElementOp, ElementOpApply, Identity, Lift,
    MulInto, OkTypes, ProdType, RealScalar, Scalar, ScalarBase, ScalarKind,
};

// ============================================================================
// Views and storage
// ============================================================================
pub use tmv_view::{
    AliasKind, ColMajor, Matrix, MatrixLayout, MatrixView, MatrixViewMut, Order, Result,
    RowMajor, SmallMatMut, SmallMatRef, StorageOrder, StridedView, StridedViewMut, TmvError,
    VectorView, VectorViewMut,
};

// ============================================================================
// Kernels
// ============================================================================
pub use tmv_kernel::{
    add_mult_mm, add_mult_mv, add_mult_vm, add_mult_xm, add_rank1_update, add_vv, dispatch_scale,
    make_task_list, mult_mm, mult_mm_conj, mult_mm_with_config, mult_mv, mult_vm, mult_vv,
    mult_xm, mult_xm_conj, mult_xm_in_buffer, mult_xv, num_blocks, plan_mult_xm, plan_traversal,
    rank1_update, select_mult_mm_algo, Accumulate, AddMode, Alpha, Assign, MultMMAlgo,
    MultMMConfig, MultXMAlgo, NegUnit, Scaling, Unit,
};
pub use tmv_kernel::{reference, small};

// ============================================================================
// Constants
// ============================================================================
pub use tmv_kernel::{
    MICRO_MAX, MIN_PARALLEL_LEN, MMRCC_BLOCKSIZE_K, MMRCC_BLOCKSIZE_MN, SMALL_UNROLL_BYTES,
    TMV_BLOCKSIZE,
};

//! Matrix and vector arithmetic kernels with storage-order dispatch.
//!
//! # Fixed-size kernels
//!
//! [`small`] works on [`SmallMatRef`](tmv_view::SmallMatRef) /
//! [`SmallMatMut`](tmv_view::SmallMatMut), whose dimensions and storage
//! order are type parameters. Each operation monomorphizes to the loop nest
//! that matches the operands' orders.
//!
//! # Runtime-size kernels
//!
//! - [`mult_mv`], [`mult_vm`], [`rank1_update`] and their `add_` forms
//! - [`mult_xm`], [`add_mult_xm`], [`mult_xm_conj`], [`mult_xm_in_buffer`]:
//!   scaled matrix copy, planned by [`plan_mult_xm`]
//! - [`mult_mm`], [`add_mult_mm`], [`mult_mm_with_config`], [`mult_mm_conj`]:
//!   tiled recursive matrix multiply
//! - [`mult_xv`], [`add_vv`], [`mult_vv`]: vector primitives
//!
//! Every kernel reads its operands through the view's conjugation flag and
//! accepts only element-type combinations allowed by
//! [`OkTypes`](tmv_traits::OkTypes). A scale factor of `1` or `-1` selects a
//! kernel with the multiply compiled out.
//!
//! # Features
//!
//! - `parallel` (default): output tiles of large products run on rayon.
//! - `xdebug`: every runtime multiply is recomputed with
//!   [`reference::naive_mult_mm`] and checked.

pub mod config;
mod mult_mm;
mod mult_mv;
mod mult_xm;
mod raw;
mod rcc;
pub mod reference;
pub mod scaling;
pub mod small;
mod tiling;
mod vector;

// ============================================================================
// Configuration
// ============================================================================
pub use config::{
    MultMMConfig, MICRO_MAX, MIN_PARALLEL_LEN, MMRCC_BLOCKSIZE_K, MMRCC_BLOCKSIZE_MN,
    SMALL_UNROLL_BYTES, TMV_BLOCKSIZE,
};

// ============================================================================
// Scaling and add mode
// ============================================================================
pub use scaling::{Accumulate, AddMode, Alpha, Assign, NegUnit, Scaling, Unit};

// ============================================================================
// Vector operations
// ============================================================================
pub use vector::{add_vv, mult_vv, mult_xv};

// ============================================================================
// Matrix-vector operations
// ============================================================================
pub use mult_mv::{add_mult_mv, add_mult_vm, add_rank1_update, mult_mv, mult_vm, rank1_update};

// ============================================================================
// Scaled copy
// ============================================================================
pub use mult_xm::{
    add_mult_xm, mult_xm, mult_xm_conj, mult_xm_in_buffer, plan_mult_xm, plan_traversal,
    MultXMAlgo,
};

// ============================================================================
// Matrix multiply
// ============================================================================
pub use mult_mm::{
    add_mult_mm, mult_mm, mult_mm_conj, mult_mm_with_config, select_mult_mm_algo, MultMMAlgo,
};
pub use tiling::{make_task_list, num_blocks};

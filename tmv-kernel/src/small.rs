//! Fixed-size kernels.
//!
//! Dimensions and storage orders are type parameters, so the loop bounds are
//! constants and every `match` on an order is resolved during
//! monomorphization. Vectors are plain arrays.
//!
//! ```
//! use tmv_kernel::small;
//! use tmv_view::{ColMajor, RowMajor, SmallMatRef};
//!
//! let row = [1i64, 2, 3, 4];
//! let col = [1i64, 3, 2, 4];
//! let a = SmallMatRef::<i64, 2, 2, RowMajor>::new(&row).unwrap();
//! let b = SmallMatRef::<i64, 2, 2, ColMajor>::new(&col).unwrap();
//!
//! let mut y = [0i64; 2];
//! small::mult_mv(1i64, a, &[1i64, 1], &mut y);
//! assert_eq!(y, [3, 7]);
//! small::mult_mv(1i64, b, &[1i64, 1], &mut y);
//! assert_eq!(y, [3, 7]);
//! ```

use num_traits::Zero;
use tmv_traits::{ElementOp, Lift, MulInto, OkTypes, Scalar};
use tmv_view::{Order, SmallMatMut, SmallMatRef, StorageOrder};

use crate::config::SMALL_UNROLL_BYTES;
use crate::dispatch_scale;
use crate::mult_xm::MultXMAlgo;
use crate::scaling::{store, Accumulate, AddMode, Assign, Scaling};

// ============================================================================
// Matrix * vector
// ============================================================================

/// `y (=|+=) sc * op(A) * x` for an `M x N` matrix.
///
/// Column-major `A` accumulates scaled columns into `y` (`N` scale
/// multiplies); row-major `A` takes one dot product per row (`M` scale
/// multiplies).
#[inline]
pub fn mult_mv_scaled<Md, Sc, Ta, Tx, Ty, Oa, Ca, const M: usize, const N: usize>(
    _md: Md,
    sc: Sc,
    a: SmallMatRef<'_, Ta, M, N, Oa, Ca>,
    x: &[Tx; N],
    y: &mut [Ty; M],
) where
    Md: AddMode,
    Sc: Scaling<Ty>,
    Ta: OkTypes<Tx, Ty>,
    Tx: Scalar,
    Ty: Scalar,
    Oa: Order,
    Ca: ElementOp<Ta>,
{
    match Oa::ORDER {
        StorageOrder::RowMajor => {
            for (i, yi) in y.iter_mut().enumerate() {
                let mut sum = <Ta as OkTypes<Tx, Ty>>::Prod::zero();
                for (j, &xj) in x.iter().enumerate() {
                    sum = sum + <Ta as OkTypes<Tx, Ty>>::mul_prod(a.get(i, j), xj);
                }
                store::<Md, Ty>(yi, sc.apply(<Ta as OkTypes<Tx, Ty>>::lift_prod(sum)));
            }
        }
        _ => {
            if !Md::ADD {
                y.fill(Ty::zero());
            }
            for (j, &xj) in x.iter().enumerate() {
                let s = sc.apply(<Ta as OkTypes<Tx, Ty>>::lift_rhs(xj));
                for (i, yi) in y.iter_mut().enumerate() {
                    *yi = *yi + <Ta as OkTypes<Tx, Ty>>::lhs_times(a.get(i, j), s);
                }
            }
        }
    }
}

/// `y = alpha * op(A) * x`.
pub fn mult_mv<S, Ta, Tx, Ty, Oa, Ca, const M: usize, const N: usize>(
    alpha: S,
    a: SmallMatRef<'_, Ta, M, N, Oa, Ca>,
    x: &[Tx; N],
    y: &mut [Ty; M],
) where
    S: Scalar + MulInto<Ty>,
    Ta: OkTypes<Tx, Ty>,
    Tx: Scalar,
    Ty: Scalar,
    Oa: Order,
    Ca: ElementOp<Ta>,
{
    dispatch_scale!(alpha, |sc| mult_mv_scaled(Assign, sc, a, x, y))
}

/// `y += alpha * op(A) * x`.
pub fn add_mult_mv<S, Ta, Tx, Ty, Oa, Ca, const M: usize, const N: usize>(
    alpha: S,
    a: SmallMatRef<'_, Ta, M, N, Oa, Ca>,
    x: &[Tx; N],
    y: &mut [Ty; M],
) where
    S: Scalar + MulInto<Ty>,
    Ta: OkTypes<Tx, Ty>,
    Tx: Scalar,
    Ty: Scalar,
    Oa: Order,
    Ca: ElementOp<Ta>,
{
    dispatch_scale!(alpha, |sc| mult_mv_scaled(Accumulate, sc, a, x, y))
}

/// `y (=|+=) sc * x^T * op(A)`: the matrix-vector kernel on the transpose.
#[inline]
pub fn mult_vm_scaled<Md, Sc, Ta, Tx, Ty, Oa, Ca, const M: usize, const N: usize>(
    md: Md,
    sc: Sc,
    x: &[Tx; M],
    a: SmallMatRef<'_, Ta, M, N, Oa, Ca>,
    y: &mut [Ty; N],
) where
    Md: AddMode,
    Sc: Scaling<Ty>,
    Ta: OkTypes<Tx, Ty>,
    Tx: Scalar,
    Ty: Scalar,
    Oa: Order,
    Ca: ElementOp<Ta>,
{
    mult_mv_scaled(md, sc, a.transpose(), x, y)
}

/// `y = alpha * x^T * op(A)`.
pub fn mult_vm<S, Ta, Tx, Ty, Oa, Ca, const M: usize, const N: usize>(
    alpha: S,
    x: &[Tx; M],
    a: SmallMatRef<'_, Ta, M, N, Oa, Ca>,
    y: &mut [Ty; N],
) where
    S: Scalar + MulInto<Ty>,
    Ta: OkTypes<Tx, Ty>,
    Tx: Scalar,
    Ty: Scalar,
    Oa: Order,
    Ca: ElementOp<Ta>,
{
    dispatch_scale!(alpha, |sc| mult_vm_scaled(Assign, sc, x, a, y))
}

/// `y += alpha * x^T * op(A)`.
pub fn add_mult_vm<S, Ta, Tx, Ty, Oa, Ca, const M: usize, const N: usize>(
    alpha: S,
    x: &[Tx; M],
    a: SmallMatRef<'_, Ta, M, N, Oa, Ca>,
    y: &mut [Ty; N],
) where
    S: Scalar + MulInto<Ty>,
    Ta: OkTypes<Tx, Ty>,
    Tx: Scalar,
    Ty: Scalar,
    Oa: Order,
    Ca: ElementOp<Ta>,
{
    dispatch_scale!(alpha, |sc| mult_vm_scaled(Accumulate, sc, x, a, y))
}

// ============================================================================
// Matrix + matrix
// ============================================================================

/// `C = sa * op(A) + sb * op(B)`, traversed in `C`'s storage order.
#[inline]
pub fn add_mm_scaled<Sa, Sb, Ta, Tb, Tc, Oa, Ob, Oc, Ca, Cb, const M: usize, const N: usize>(
    sa: Sa,
    a: SmallMatRef<'_, Ta, M, N, Oa, Ca>,
    sb: Sb,
    b: SmallMatRef<'_, Tb, M, N, Ob, Cb>,
    c: &mut SmallMatMut<'_, Tc, M, N, Oc>,
) where
    Sa: Scaling<Tc>,
    Sb: Scaling<Tc>,
    Ta: OkTypes<Tb, Tc>,
    Tb: Scalar,
    Tc: Scalar,
    Oa: Order,
    Ob: Order,
    Oc: Order,
    Ca: ElementOp<Ta>,
    Cb: ElementOp<Tb>,
{
    let mut elem = |i: usize, j: usize| {
        let v = sa.apply(<Ta as OkTypes<Tb, Tc>>::lift_lhs(a.get(i, j)))
            + sb.apply(<Ta as OkTypes<Tb, Tc>>::lift_rhs(b.get(i, j)));
        c.set(i, j, v);
    };
    match Oc::ORDER {
        StorageOrder::RowMajor => {
            for i in 0..M {
                for j in 0..N {
                    elem(i, j);
                }
            }
        }
        _ => {
            for j in 0..N {
                for i in 0..M {
                    elem(i, j);
                }
            }
        }
    }
}

/// `C = alpha * op(A) + beta * op(B)`.
pub fn add_mm<S1, S2, Ta, Tb, Tc, Oa, Ob, Oc, Ca, Cb, const M: usize, const N: usize>(
    alpha: S1,
    a: SmallMatRef<'_, Ta, M, N, Oa, Ca>,
    beta: S2,
    b: SmallMatRef<'_, Tb, M, N, Ob, Cb>,
    c: &mut SmallMatMut<'_, Tc, M, N, Oc>,
) where
    S1: Scalar + MulInto<Tc>,
    S2: Scalar + MulInto<Tc>,
    Ta: OkTypes<Tb, Tc>,
    Tb: Scalar,
    Tc: Scalar,
    Oa: Order,
    Ob: Order,
    Oc: Order,
    Ca: ElementOp<Ta>,
    Cb: ElementOp<Tb>,
{
    dispatch_scale!(alpha, |sa| dispatch_scale!(beta, |sb| add_mm_scaled(sa, a, sb, b, c)))
}

// ============================================================================
// Matrix * matrix
// ============================================================================

/// `C (=|+=) sc * op(A) * op(B)` with `A: M x K`, `B: K x N`.
///
/// Two of the three storage orders agreeing is enough to pick a path:
/// column-major `A` and `C` accumulate scaled columns of `A`, row-major `B`
/// and `C` accumulate scaled rows of `B`, and anything else falls back to one
/// inner product per element of `C`.
#[inline]
pub fn mult_mm_scaled<
    Md,
    Sc,
    Ta,
    Tb,
    Tc,
    Oa,
    Ob,
    Oc,
    Ca,
    Cb,
    const M: usize,
    const N: usize,
    const K: usize,
>(
    _md: Md,
    sc: Sc,
    a: SmallMatRef<'_, Ta, M, K, Oa, Ca>,
    b: SmallMatRef<'_, Tb, K, N, Ob, Cb>,
    c: &mut SmallMatMut<'_, Tc, M, N, Oc>,
) where
    Md: AddMode,
    Sc: Scaling<Tc>,
    Ta: OkTypes<Tb, Tc>,
    Tb: Scalar,
    Tc: Scalar,
    Oa: Order,
    Ob: Order,
    Oc: Order,
    Ca: ElementOp<Ta>,
    Cb: ElementOp<Tb>,
{
    let col_path = Oa::ORDER == StorageOrder::ColMajor && Oc::ORDER == StorageOrder::ColMajor;
    let row_path = Ob::ORDER == StorageOrder::RowMajor && Oc::ORDER == StorageOrder::RowMajor;

    if col_path || row_path {
        if !Md::ADD {
            c.as_mut_slice().fill(Tc::zero());
        }
        if col_path {
            for j in 0..N {
                for k in 0..K {
                    let s = sc.apply(<Ta as OkTypes<Tb, Tc>>::lift_rhs(b.get(k, j)));
                    for i in 0..M {
                        let cij = c.at_mut(i, j);
                        *cij = *cij + <Ta as OkTypes<Tb, Tc>>::lhs_times(a.get(i, k), s);
                    }
                }
            }
        } else {
            for i in 0..M {
                for k in 0..K {
                    let s = sc.apply(<Ta as OkTypes<Tb, Tc>>::lift_lhs(a.get(i, k)));
                    for j in 0..N {
                        let cij = c.at_mut(i, j);
                        *cij = *cij + <Ta as OkTypes<Tb, Tc>>::rhs_times(b.get(k, j), s);
                    }
                }
            }
        }
        return;
    }

    let mut inner = |i: usize, j: usize| {
        let mut sum = <Ta as OkTypes<Tb, Tc>>::Prod::zero();
        for k in 0..K {
            sum = sum + <Ta as OkTypes<Tb, Tc>>::mul_prod(a.get(i, k), b.get(k, j));
        }
        store::<Md, Tc>(c.at_mut(i, j), sc.apply(<Ta as OkTypes<Tb, Tc>>::lift_prod(sum)));
    };
    match Oc::ORDER {
        StorageOrder::RowMajor => {
            for i in 0..M {
                for j in 0..N {
                    inner(i, j);
                }
            }
        }
        _ => {
            for j in 0..N {
                for i in 0..M {
                    inner(i, j);
                }
            }
        }
    }
}

/// `C = alpha * op(A) * op(B)`.
pub fn mult_mm<S, Ta, Tb, Tc, Oa, Ob, Oc, Ca, Cb, const M: usize, const N: usize, const K: usize>(
    alpha: S,
    a: SmallMatRef<'_, Ta, M, K, Oa, Ca>,
    b: SmallMatRef<'_, Tb, K, N, Ob, Cb>,
    c: &mut SmallMatMut<'_, Tc, M, N, Oc>,
) where
    S: Scalar + MulInto<Tc>,
    Ta: OkTypes<Tb, Tc>,
    Tb: Scalar,
    Tc: Scalar,
    Oa: Order,
    Ob: Order,
    Oc: Order,
    Ca: ElementOp<Ta>,
    Cb: ElementOp<Tb>,
{
    dispatch_scale!(alpha, |sc| mult_mm_scaled(Assign, sc, a, b, c))
}

/// `C += alpha * op(A) * op(B)`.
pub fn add_mult_mm<
    S,
    Ta,
    Tb,
    Tc,
    Oa,
    Ob,
    Oc,
    Ca,
    Cb,
    const M: usize,
    const N: usize,
    const K: usize,
>(
    alpha: S,
    a: SmallMatRef<'_, Ta, M, K, Oa, Ca>,
    b: SmallMatRef<'_, Tb, K, N, Ob, Cb>,
    c: &mut SmallMatMut<'_, Tc, M, N, Oc>,
) where
    S: Scalar + MulInto<Tc>,
    Ta: OkTypes<Tb, Tc>,
    Tb: Scalar,
    Tc: Scalar,
    Oa: Order,
    Ob: Order,
    Oc: Order,
    Ca: ElementOp<Ta>,
    Cb: ElementOp<Tb>,
{
    dispatch_scale!(alpha, |sc| mult_mm_scaled(Accumulate, sc, a, b, c))
}

// ============================================================================
// Rank-1 update
// ============================================================================

/// `A (=|+=) sc * x * y^T`.
///
/// Column-major `A` is written column by column (`x` scaled by `y[j]`),
/// row-major `A` row by row (`y` scaled by `x[i]`).
#[inline]
pub fn rank1_update_scaled<Md, Sc, Tx, Ty, Ta, Oa, const M: usize, const N: usize>(
    _md: Md,
    sc: Sc,
    x: &[Tx; M],
    y: &[Ty; N],
    a: &mut SmallMatMut<'_, Ta, M, N, Oa>,
) where
    Md: AddMode,
    Sc: Scaling<Ta>,
    Tx: OkTypes<Ty, Ta>,
    Ty: Scalar,
    Ta: Scalar,
    Oa: Order,
{
    if M == 0 || N == 0 {
        return;
    }
    match Oa::ORDER {
        StorageOrder::RowMajor => {
            for (&xi, row) in x.iter().zip(a.as_mut_slice().chunks_exact_mut(N)) {
                let s = sc.apply(<Tx as OkTypes<Ty, Ta>>::lift_lhs(xi));
                for (aij, &yj) in row.iter_mut().zip(y.iter()) {
                    store::<Md, Ta>(aij, <Tx as OkTypes<Ty, Ta>>::rhs_times(yj, s));
                }
            }
        }
        _ => {
            for (&yj, col) in y.iter().zip(a.as_mut_slice().chunks_exact_mut(M)) {
                let s = sc.apply(<Tx as OkTypes<Ty, Ta>>::lift_rhs(yj));
                for (aij, &xi) in col.iter_mut().zip(x.iter()) {
                    store::<Md, Ta>(aij, <Tx as OkTypes<Ty, Ta>>::lhs_times(xi, s));
                }
            }
        }
    }
}

/// `A = alpha * x * y^T`.
pub fn rank1_update<S, Tx, Ty, Ta, Oa, const M: usize, const N: usize>(
    alpha: S,
    x: &[Tx; M],
    y: &[Ty; N],
    a: &mut SmallMatMut<'_, Ta, M, N, Oa>,
) where
    S: Scalar + MulInto<Ta>,
    Tx: OkTypes<Ty, Ta>,
    Ty: Scalar,
    Ta: Scalar,
    Oa: Order,
{
    dispatch_scale!(alpha, |sc| rank1_update_scaled(Assign, sc, x, y, a))
}

/// `A += alpha * x * y^T`.
pub fn add_rank1_update<S, Tx, Ty, Ta, Oa, const M: usize, const N: usize>(
    alpha: S,
    x: &[Tx; M],
    y: &[Ty; N],
    a: &mut SmallMatMut<'_, Ta, M, N, Oa>,
) where
    S: Scalar + MulInto<Ta>,
    Tx: OkTypes<Ty, Ta>,
    Ty: Scalar,
    Ta: Scalar,
    Oa: Order,
{
    dispatch_scale!(alpha, |sc| rank1_update_scaled(Accumulate, sc, x, y, a))
}

// ============================================================================
// Scaled copy
// ============================================================================

/// Traversal the fixed-size scaled copy uses for an `M x N` destination of
/// `elem_size`-byte elements.
///
/// Matching orders make both buffers one contiguous run (`Linear`). Otherwise
/// the destination order picks rows or columns, fully unrolled when the
/// destination fits in [`SMALL_UNROLL_BYTES`].
pub const fn small_mult_xm_algo(
    m: usize,
    n: usize,
    elem_size: usize,
    src: StorageOrder,
    dst: StorageOrder,
) -> MultXMAlgo {
    let by_rows = matches!(dst, StorageOrder::RowMajor);
    if src as u8 == dst as u8 {
        MultXMAlgo::Linear
    } else if m * n * elem_size <= SMALL_UNROLL_BYTES {
        if by_rows {
            MultXMAlgo::UnrollRows
        } else {
            MultXMAlgo::UnrollCols
        }
    } else if by_rows {
        MultXMAlgo::ByRows
    } else {
        MultXMAlgo::ByCols
    }
}

/// `B (=|+=) sc * op(A)`.
#[inline]
pub fn mult_xm_scaled<Md, Sc, Ta, Tb, Oa, Ob, Ca, const M: usize, const N: usize>(
    _md: Md,
    sc: Sc,
    a: SmallMatRef<'_, Ta, M, N, Oa, Ca>,
    b: &mut SmallMatMut<'_, Tb, M, N, Ob>,
) where
    Md: AddMode,
    Sc: Scaling<Tb>,
    Ta: Copy,
    Tb: Scalar + Lift<Ta>,
    Oa: Order,
    Ob: Order,
    Ca: ElementOp<Ta>,
{
    let algo = small_mult_xm_algo(M, N, std::mem::size_of::<Tb>(), Oa::ORDER, Ob::ORDER);
    if algo == MultXMAlgo::Linear {
        for (bv, &av) in b.as_mut_slice().iter_mut().zip(a.as_slice().iter()) {
            store::<Md, Tb>(bv, sc.apply(Tb::lift(Ca::apply(av))));
        }
        return;
    }
    let mut elem = |i: usize, j: usize| {
        store::<Md, Tb>(b.at_mut(i, j), sc.apply(Tb::lift(a.get(i, j))));
    };
    match algo {
        // one flat loop with a constant trip count
        MultXMAlgo::UnrollRows => {
            for idx in 0..M * N {
                elem(idx / N, idx % N);
            }
        }
        MultXMAlgo::UnrollCols => {
            for idx in 0..M * N {
                elem(idx % M, idx / M);
            }
        }
        MultXMAlgo::ByRows => {
            for i in 0..M {
                for j in 0..N {
                    elem(i, j);
                }
            }
        }
        _ => {
            for j in 0..N {
                for i in 0..M {
                    elem(i, j);
                }
            }
        }
    }
}

/// `B = alpha * op(A)`.
pub fn mult_xm<S, Ta, Tb, Oa, Ob, Ca, const M: usize, const N: usize>(
    alpha: S,
    a: SmallMatRef<'_, Ta, M, N, Oa, Ca>,
    b: &mut SmallMatMut<'_, Tb, M, N, Ob>,
) where
    S: Scalar + MulInto<Tb>,
    Ta: Copy,
    Tb: Scalar + Lift<Ta>,
    Oa: Order,
    Ob: Order,
    Ca: ElementOp<Ta>,
{
    dispatch_scale!(alpha, |sc| mult_xm_scaled(Assign, sc, a, b))
}

/// `B += alpha * op(A)`.
pub fn add_mult_xm<S, Ta, Tb, Oa, Ob, Ca, const M: usize, const N: usize>(
    alpha: S,
    a: SmallMatRef<'_, Ta, M, N, Oa, Ca>,
    b: &mut SmallMatMut<'_, Tb, M, N, Ob>,
) where
    S: Scalar + MulInto<Tb>,
    Ta: Copy,
    Tb: Scalar + Lift<Ta>,
    Oa: Order,
    Ob: Order,
    Ca: ElementOp<Ta>,
{
    dispatch_scale!(alpha, |sc| mult_xm_scaled(Accumulate, sc, a, b))
}

//! Runtime-size matrix-vector products and rank-1 updates on views.
//!
//! The traversal follows the matrix's storage order the same way the
//! fixed-size kernels do: a column-major matrix is consumed column by column
//! (axpy), a row-major one row by row (dot). Matrices with no unit stride go
//! along the smaller stride.

use tmv_traits::{ElementOp, MulInto, OkTypes, Scalar};
use tmv_view::{
    MatrixView, MatrixViewMut, Result, StorageOrder, TmvError, VectorView, VectorViewMut,
};

use crate::dispatch_scale;
use crate::raw::{RawMat, RawMatMut, RawVec, RawVecMut};
use crate::scaling::{store_raw, Accumulate, AddMode, Assign, Scaling};
use crate::vector::{axpy_lhs, axpy_rhs, dot};

/// Whether a matrix is better walked row by row.
fn rows_outer(order: StorageOrder, stepi: isize, stepj: isize) -> bool {
    match order {
        StorageOrder::RowMajor => true,
        StorageOrder::ColMajor => false,
        StorageOrder::NoMajor => stepj.unsigned_abs() < stepi.unsigned_abs(),
    }
}

/// # Safety
/// `a` is `m x n`, `x` has `n` and `y` has `m` valid elements, and `y` does
/// not overlap `a` or `x`.
#[allow(clippy::too_many_arguments)]
unsafe fn mv_kernel<Md, Sc, Ta, Tx, Ty, Ca, Cx>(
    _md: Md,
    sc: Sc,
    by_rows: bool,
    m: usize,
    n: usize,
    a: RawMat<Ta, Ca>,
    x: RawVec<Tx, Cx>,
    y: RawVecMut<Ty>,
) where
    Md: AddMode,
    Sc: Scaling<Ty>,
    Ta: OkTypes<Tx, Ty>,
    Tx: Scalar,
    Ty: Scalar,
    Ca: ElementOp<Ta>,
    Cx: ElementOp<Tx>,
{
    if by_rows {
        for i in 0..m {
            let sum = dot::<Ta, Tx, Ty, Ca, Cx>(n, a.row(i), x);
            store_raw::<Md, Ty>(y.at(i), sc.apply(<Ta as OkTypes<Tx, Ty>>::lift_prod(sum)));
        }
    } else {
        if !Md::ADD {
            for i in 0..m {
                *y.at(i) = Ty::zero();
            }
        }
        for j in 0..n {
            let s = sc.apply(<Ta as OkTypes<Tx, Ty>>::lift_rhs(x.read(j)));
            axpy_lhs::<_, Ta, Tx, Ty, Ca>(Accumulate, m, s, a.col(j), y);
        }
    }
}

fn mult_mv_impl<Md, S, Ta, Tx, Ty, Ca, Cx>(
    md: Md,
    alpha: S,
    a: &MatrixView<'_, Ta, Ca>,
    x: &VectorView<'_, Tx, Cx>,
    y: &mut VectorViewMut<'_, Ty>,
) -> Result<()>
where
    Md: AddMode,
    S: Scalar + MulInto<Ty>,
    Ta: OkTypes<Tx, Ty>,
    Tx: Scalar,
    Ty: Scalar,
    Ca: ElementOp<Ta>,
    Cx: ElementOp<Tx>,
{
    let (m, n) = (a.nrows(), a.ncols());
    if y.len() != m || x.len() != n {
        return Err(TmvError::ShapeMismatch(vec![m, n], vec![y.len(), x.len()]));
    }
    if m == 0 {
        return Ok(());
    }
    if n == 0 {
        if !Md::ADD {
            y.fill(Ty::zero());
        }
        return Ok(());
    }
    let by_rows = rows_outer(a.storage_order(), a.stepi(), a.stepj());
    log::trace!("mult_mv {}x{} by_rows={} add={}", m, n, by_rows, Md::ADD);

    let ar = RawMat::from_view(a);
    let xr = RawVec::from_view(x);
    let yr = RawVecMut::from_view(y);
    // SAFETY: dimensions checked above; `y` is an exclusive view.
    dispatch_scale!(alpha, |sc| unsafe {
        mv_kernel(md, sc, by_rows, m, n, ar, xr, yr)
    });
    Ok(())
}

/// `y = alpha * op(A) * op(x)`.
pub fn mult_mv<S, Ta, Tx, Ty, Ca, Cx>(
    alpha: S,
    a: &MatrixView<'_, Ta, Ca>,
    x: &VectorView<'_, Tx, Cx>,
    y: &mut VectorViewMut<'_, Ty>,
) -> Result<()>
where
    S: Scalar + MulInto<Ty>,
    Ta: OkTypes<Tx, Ty>,
    Tx: Scalar,
    Ty: Scalar,
    Ca: ElementOp<Ta>,
    Cx: ElementOp<Tx>,
{
    mult_mv_impl(Assign, alpha, a, x, y)
}

/// `y += alpha * op(A) * op(x)`.
pub fn add_mult_mv<S, Ta, Tx, Ty, Ca, Cx>(
    alpha: S,
    a: &MatrixView<'_, Ta, Ca>,
    x: &VectorView<'_, Tx, Cx>,
    y: &mut VectorViewMut<'_, Ty>,
) -> Result<()>
where
    S: Scalar + MulInto<Ty>,
    Ta: OkTypes<Tx, Ty>,
    Tx: Scalar,
    Ty: Scalar,
    Ca: ElementOp<Ta>,
    Cx: ElementOp<Tx>,
{
    mult_mv_impl(Accumulate, alpha, a, x, y)
}

/// `y = alpha * op(x)^T * op(A)`.
pub fn mult_vm<S, Ta, Tx, Ty, Ca, Cx>(
    alpha: S,
    x: &VectorView<'_, Tx, Cx>,
    a: &MatrixView<'_, Ta, Ca>,
    y: &mut VectorViewMut<'_, Ty>,
) -> Result<()>
where
    S: Scalar + MulInto<Ty>,
    Ta: OkTypes<Tx, Ty>,
    Tx: Scalar,
    Ty: Scalar,
    Ca: ElementOp<Ta>,
    Cx: ElementOp<Tx>,
{
    mult_mv_impl(Assign, alpha, &a.t(), x, y)
}

/// `y += alpha * op(x)^T * op(A)`.
pub fn add_mult_vm<S, Ta, Tx, Ty, Ca, Cx>(
    alpha: S,
    x: &VectorView<'_, Tx, Cx>,
    a: &MatrixView<'_, Ta, Ca>,
    y: &mut VectorViewMut<'_, Ty>,
) -> Result<()>
where
    S: Scalar + MulInto<Ty>,
    Ta: OkTypes<Tx, Ty>,
    Tx: Scalar,
    Ty: Scalar,
    Ca: ElementOp<Ta>,
    Cx: ElementOp<Tx>,
{
    mult_mv_impl(Accumulate, alpha, &a.t(), x, y)
}

// ============================================================================
// Rank-1 update
// ============================================================================

/// # Safety
/// `a` is `m x n`, `x` has `m` and `y` has `n` valid elements, and `a` does
/// not overlap `x` or `y`.
#[allow(clippy::too_many_arguments)]
unsafe fn rank1_kernel<Md, Sc, Tx, Ty, Ta, Cx, Cy>(
    md: Md,
    sc: Sc,
    by_rows: bool,
    m: usize,
    n: usize,
    x: RawVec<Tx, Cx>,
    y: RawVec<Ty, Cy>,
    a: RawMatMut<Ta>,
) where
    Md: AddMode,
    Sc: Scaling<Ta>,
    Tx: OkTypes<Ty, Ta>,
    Ty: Scalar,
    Ta: Scalar,
    Cx: ElementOp<Tx>,
    Cy: ElementOp<Ty>,
{
    if by_rows {
        for i in 0..m {
            let s = sc.apply(<Tx as OkTypes<Ty, Ta>>::lift_lhs(x.read(i)));
            axpy_rhs::<_, Tx, Ty, Ta, Cy>(md, n, s, y, a.row(i));
        }
    } else {
        for j in 0..n {
            let s = sc.apply(<Tx as OkTypes<Ty, Ta>>::lift_rhs(y.read(j)));
            axpy_lhs::<_, Tx, Ty, Ta, Cx>(md, m, s, x, a.col(j));
        }
    }
}

fn rank1_impl<Md, S, Tx, Ty, Ta, Cx, Cy>(
    md: Md,
    alpha: S,
    x: &VectorView<'_, Tx, Cx>,
    y: &VectorView<'_, Ty, Cy>,
    a: &mut MatrixViewMut<'_, Ta>,
) -> Result<()>
where
    Md: AddMode,
    S: Scalar + MulInto<Ta>,
    Tx: OkTypes<Ty, Ta>,
    Ty: Scalar,
    Ta: Scalar,
    Cx: ElementOp<Tx>,
    Cy: ElementOp<Ty>,
{
    let (m, n) = (a.nrows(), a.ncols());
    if x.len() != m || y.len() != n {
        return Err(TmvError::ShapeMismatch(vec![m, n], vec![x.len(), y.len()]));
    }
    if m == 0 || n == 0 {
        return Ok(());
    }
    let by_rows = rows_outer(a.storage_order(), a.stepi(), a.stepj());
    log::trace!("rank1_update {}x{} by_rows={} add={}", m, n, by_rows, Md::ADD);

    let xr = RawVec::from_view(x);
    let yr = RawVec::from_view(y);
    let ar = RawMatMut::from_view(a);
    // SAFETY: dimensions checked above; `a` is an exclusive view.
    dispatch_scale!(alpha, |sc| unsafe {
        rank1_kernel(md, sc, by_rows, m, n, xr, yr, ar)
    });
    Ok(())
}

/// `A = alpha * op(x) * op(y)^T`.
pub fn rank1_update<S, Tx, Ty, Ta, Cx, Cy>(
    alpha: S,
    x: &VectorView<'_, Tx, Cx>,
    y: &VectorView<'_, Ty, Cy>,
    a: &mut MatrixViewMut<'_, Ta>,
) -> Result<()>
where
    S: Scalar + MulInto<Ta>,
    Tx: OkTypes<Ty, Ta>,
    Ty: Scalar,
    Ta: Scalar,
    Cx: ElementOp<Tx>,
    Cy: ElementOp<Ty>,
{
    rank1_impl(Assign, alpha, x, y, a)
}

/// `A += alpha * op(x) * op(y)^T`.
pub fn add_rank1_update<S, Tx, Ty, Ta, Cx, Cy>(
    alpha: S,
    x: &VectorView<'_, Tx, Cx>,
    y: &VectorView<'_, Ty, Cy>,
    a: &mut MatrixViewMut<'_, Ta>,
) -> Result<()>
where
    S: Scalar + MulInto<Ta>,
    Tx: OkTypes<Ty, Ta>,
    Ty: Scalar,
    Ta: Scalar,
    Cx: ElementOp<Tx>,
    Cy: ElementOp<Ty>,
{
    rank1_impl(Accumulate, alpha, x, y, a)
}

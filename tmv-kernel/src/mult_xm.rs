//! Scaled copy / accumulate `B (=|+=) alpha * op(A)` on runtime-size views.
//!
//! The traversal is planned once per call by [`plan_mult_xm`]:
//!
//! - [`MultXMAlgo::Copy`]: `alpha == 1` and no accumulation, so the alpha
//!   multiply is compiled out.
//! - [`MultXMAlgo::Linear`]: both operands are the same contiguous block, the
//!   whole matrix is one 1-D loop.
//! - [`MultXMAlgo::ByRows`] / [`MultXMAlgo::ByCols`]: one 1-D loop per row or
//!   column, whichever matches the majority storage order.
//!
//! [`mult_xm_conj`] adapts a conjugated destination and [`mult_xm_in_buffer`]
//! handles a source and destination that live in the same buffer.

use tmv_traits::{Conj, ElementOp, Identity, Lift, MulInto, Scalar};
use tmv_view::{AliasKind, MatrixLayout, MatrixView, MatrixViewMut, Result, StorageOrder};

use crate::dispatch_scale;
use crate::raw::{ensure_same_shape, RawMat, RawMatMut, RawVec, RawVecMut};
use crate::scaling::{is_unit, Accumulate, AddMode, Assign, Scaling};
use crate::vector::{scale_vv, update_in_place};

/// Algorithm chosen for a scaled matrix copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MultXMAlgo {
    /// Plain copy (`alpha == 1`, assign).
    Copy,
    /// Both operands flattened to one 1-D run.
    Linear,
    /// One 1-D loop per row.
    ByRows,
    /// One 1-D loop per column.
    ByCols,
    /// Fixed-size, row order, single fully unrolled loop.
    UnrollRows,
    /// Fixed-size, column order, single fully unrolled loop.
    UnrollCols,
    /// Destination conjugated: conjugate `alpha` and the source instead.
    ConjAdapter,
    /// Operands share a buffer; overlap checked before running.
    AliasChecked,
}

/// Traversal for an `m x n` copy between two strided layouts.
///
/// Returns `Linear`, `ByRows` or `ByCols`.
pub fn plan_traversal(size: [usize; 2], src: [isize; 2], dst: [isize; 2]) -> MultXMAlgo {
    let [m, n] = size;
    let unit_flat = src == dst
        && ((src[0] == 1 && (n <= 1 || src[1] == m as isize))
            || (src[1] == 1 && (m <= 1 || src[0] == n as isize)));
    if m * n <= 1 || unit_flat {
        return MultXMAlgo::Linear;
    }
    // destination order weighs double
    let vote = |order: StorageOrder, weight: i32| match order {
        StorageOrder::RowMajor => weight,
        StorageOrder::ColMajor => -weight,
        StorageOrder::NoMajor => 0,
    };
    let score = vote(StorageOrder::from_strides(m, n, src[0], src[1]), 1)
        + vote(StorageOrder::from_strides(m, n, dst[0], dst[1]), 2);
    if score > 0 || (score == 0 && n >= m) {
        MultXMAlgo::ByRows
    } else {
        MultXMAlgo::ByCols
    }
}

/// Plan `B (=|+=) alpha * A` for the given sizes and strides.
pub fn plan_mult_xm(
    alpha_is_unit: bool,
    add: bool,
    size: [usize; 2],
    src: [isize; 2],
    dst: [isize; 2],
) -> MultXMAlgo {
    if alpha_is_unit && !add {
        MultXMAlgo::Copy
    } else {
        plan_traversal(size, src, dst)
    }
}

/// Run one of the traversals returned by [`plan_traversal`].
///
/// # Safety
/// `a` and `b` must describe `m x n` matrices of valid elements that do not
/// overlap.
pub(crate) unsafe fn run_traversal<Md, Sc, Ta, Tb, Ca>(
    md: Md,
    sc: Sc,
    algo: MultXMAlgo,
    m: usize,
    n: usize,
    a: RawMat<Ta, Ca>,
    b: RawMatMut<Tb>,
) where
    Md: AddMode,
    Sc: Scaling<Tb>,
    Ta: Copy,
    Tb: Scalar + Lift<Ta>,
    Ca: ElementOp<Ta>,
{
    match algo {
        MultXMAlgo::Linear => {
            scale_vv(md, sc, m * n, RawVec::<Ta, Ca>::new(a.ptr, 1), RawVecMut::new(b.ptr, 1));
        }
        MultXMAlgo::ByRows => {
            for i in 0..m {
                scale_vv(md, sc, n, a.row(i), b.row(i));
            }
        }
        _ => {
            for j in 0..n {
                scale_vv(md, sc, m, a.col(j), b.col(j));
            }
        }
    }
}

fn mult_xm_impl<Md, S, Ta, Tb, Ca>(
    md: Md,
    alpha: S,
    a: &MatrixView<'_, Ta, Ca>,
    b: &mut MatrixViewMut<'_, Tb>,
) -> Result<MultXMAlgo>
where
    Md: AddMode,
    S: Scalar + MulInto<Tb>,
    Ta: Copy,
    Tb: Scalar + Lift<Ta>,
    Ca: ElementOp<Ta>,
{
    ensure_same_shape(a.size(), b.size())?;
    let [m, n] = *b.size();
    let algo = plan_mult_xm(is_unit(&alpha), Md::ADD, [m, n], *a.strides(), *b.strides());
    log::trace!("mult_xm {}x{} add={}: {:?}", m, n, Md::ADD, algo);
    if m == 0 || n == 0 {
        return Ok(algo);
    }
    let traversal = match algo {
        MultXMAlgo::Copy => plan_traversal([m, n], *a.strides(), *b.strides()),
        other => other,
    };
    let src = RawMat::from_view(a);
    let dst = RawMatMut::from_view(b);
    // SAFETY: shapes checked above; `b` is an exclusive view, so it cannot
    // overlap `a`.
    dispatch_scale!(alpha, |sc| unsafe {
        run_traversal(md, sc, traversal, m, n, src, dst)
    });
    Ok(algo)
}

/// `B = alpha * op(A)`. Returns the algorithm that ran.
pub fn mult_xm<S, Ta, Tb, Ca>(
    alpha: S,
    a: &MatrixView<'_, Ta, Ca>,
    b: &mut MatrixViewMut<'_, Tb>,
) -> Result<MultXMAlgo>
where
    S: Scalar + MulInto<Tb>,
    Ta: Copy,
    Tb: Scalar + Lift<Ta>,
    Ca: ElementOp<Ta>,
{
    mult_xm_impl(Assign, alpha, a, b)
}

/// `B += alpha * op(A)`. Returns the algorithm that ran.
pub fn add_mult_xm<S, Ta, Tb, Ca>(
    alpha: S,
    a: &MatrixView<'_, Ta, Ca>,
    b: &mut MatrixViewMut<'_, Tb>,
) -> Result<MultXMAlgo>
where
    S: Scalar + MulInto<Tb>,
    Ta: Copy,
    Tb: Scalar + Lift<Ta>,
    Ca: ElementOp<Ta>,
{
    mult_xm_impl(Accumulate, alpha, a, b)
}

/// `B (=|+=) alpha * A` with runtime conjugation flags on both operands.
///
/// A conjugated destination is rewritten as
/// `B (=|+=) conj(alpha) * conj(A)`, reported as
/// [`MultXMAlgo::ConjAdapter`].
pub fn mult_xm_conj<T: Scalar>(
    alpha: T,
    a: &MatrixView<'_, T>,
    conj_a: bool,
    b: &mut MatrixViewMut<'_, T>,
    conj_b: bool,
    add: bool,
) -> Result<MultXMAlgo> {
    let (alpha, conj_a) = if conj_b {
        (alpha.conj(), !conj_a)
    } else {
        (alpha, conj_a)
    };
    let algo = match (conj_a, add) {
        (false, false) => mult_xm(alpha, a, b)?,
        (false, true) => add_mult_xm(alpha, a, b)?,
        (true, false) => mult_xm(alpha, &a.conj(), b)?,
        (true, true) => add_mult_xm(alpha, &a.conj(), b)?,
    };
    if conj_b {
        log::trace!("mult_xm: conjugated destination, re-dispatched as {:?}", algo);
        Ok(MultXMAlgo::ConjAdapter)
    } else {
        Ok(algo)
    }
}

/// Runs the traversal with compile-time conjugation and add mode picked from
/// runtime flags.
///
/// # Safety
/// Same contract as [`run_traversal`].
#[allow(clippy::too_many_arguments)]
unsafe fn run_flagged<T: Scalar>(
    alpha: T,
    conj: bool,
    add: bool,
    algo: MultXMAlgo,
    m: usize,
    n: usize,
    src: (*const T, isize, isize),
    dst: RawMatMut<T>,
) {
    let (p, rs, cs) = src;
    match (conj, add) {
        (false, false) => dispatch_scale!(alpha, |sc| run_traversal(
            Assign,
            sc,
            algo,
            m,
            n,
            RawMat::<T, Identity>::new(p, rs, cs),
            dst
        )),
        (false, true) => dispatch_scale!(alpha, |sc| run_traversal(
            Accumulate,
            sc,
            algo,
            m,
            n,
            RawMat::<T, Identity>::new(p, rs, cs),
            dst
        )),
        (true, false) => dispatch_scale!(alpha, |sc| run_traversal(
            Assign,
            sc,
            algo,
            m,
            n,
            RawMat::<T, Conj>::new(p, rs, cs),
            dst
        )),
        (true, true) => dispatch_scale!(alpha, |sc| run_traversal(
            Accumulate,
            sc,
            algo,
            m,
            n,
            RawMat::<T, Conj>::new(p, rs, cs),
            dst
        )),
    }
}

/// In-place `B (=|+=) sc * op(B)`, row by row.
///
/// # Safety
/// `b` must describe an `m x n` matrix of valid elements.
unsafe fn run_in_place<Md, Sc, T, C>(md: Md, sc: Sc, m: usize, n: usize, b: RawMatMut<T>)
where
    Md: AddMode,
    Sc: Scaling<T>,
    T: Scalar,
    C: ElementOp<T>,
{
    for i in 0..m {
        update_in_place::<Md, Sc, T, C>(md, sc, n, b.row(i));
    }
}

/// `dst (=|+=) alpha * op(src)` where both matrices live in `data`.
///
/// The overlap of the two layouts decides how the copy runs:
///
/// - [`AliasKind::Disjoint`]: directly.
/// - [`AliasKind::Exact`]: element-wise in place (a no-op for a plain copy).
/// - [`AliasKind::Overlapping`]: through a temporary copy of the source.
///
/// Returns the overlap that was found.
pub fn mult_xm_in_buffer<T: Scalar>(
    alpha: T,
    data: &mut [T],
    src: MatrixLayout,
    conj_src: bool,
    dst: MatrixLayout,
    add: bool,
) -> Result<AliasKind> {
    src.validate(data.len())?;
    dst.validate(data.len())?;
    ensure_same_shape(&src.size(), &dst.size())?;
    let kind = src.alias_kind(&dst);
    let [m, n] = dst.size();
    log::trace!(
        "mult_xm_in_buffer {}x{}: {:?} ({:?})",
        m,
        n,
        kind,
        MultXMAlgo::AliasChecked
    );
    if m == 0 || n == 0 {
        return Ok(kind);
    }

    let base = data.as_mut_ptr();
    let dst_raw = RawMatMut::new(base.wrapping_add(dst.offset), dst.stepi, dst.stepj);

    match kind {
        AliasKind::Exact => {
            if is_unit(&alpha) && !add && !conj_src {
                return Ok(kind);
            }
            // SAFETY: `dst` was validated against `data`; each element is read
            // and written through the same pointer.
            unsafe {
                match (conj_src, add) {
                    (false, false) => dispatch_scale!(alpha, |sc| {
                        run_in_place::<_, _, T, Identity>(Assign, sc, m, n, dst_raw)
                    }),
                    (false, true) => dispatch_scale!(alpha, |sc| {
                        run_in_place::<_, _, T, Identity>(Accumulate, sc, m, n, dst_raw)
                    }),
                    (true, false) => dispatch_scale!(alpha, |sc| {
                        run_in_place::<_, _, T, Conj>(Assign, sc, m, n, dst_raw)
                    }),
                    (true, true) => dispatch_scale!(alpha, |sc| {
                        run_in_place::<_, _, T, Conj>(Accumulate, sc, m, n, dst_raw)
                    }),
                }
            }
        }
        AliasKind::Overlapping => {
            log::debug!(
                "mult_xm_in_buffer: {}x{} source overlaps destination, copying to a temporary",
                m,
                n
            );
            let view = src.view(data)?;
            let mut tmp = Vec::with_capacity(m * n);
            for j in 0..n {
                for i in 0..m {
                    tmp.push(view.get([i, j]));
                }
            }
            let algo = plan_traversal([m, n], [1, m as isize], dst.strides());
            let dst_raw = RawMatMut::new(
                data.as_mut_ptr().wrapping_add(dst.offset),
                dst.stepi,
                dst.stepj,
            );
            // SAFETY: `tmp` is a separate allocation holding the source.
            unsafe {
                run_flagged(
                    alpha,
                    conj_src,
                    add,
                    algo,
                    m,
                    n,
                    (tmp.as_ptr(), 1, m as isize),
                    dst_raw,
                )
            };
        }
        AliasKind::Disjoint => {
            let algo = plan_traversal([m, n], src.strides(), dst.strides());
            let src_ptr = base.wrapping_add(src.offset) as *const T;
            // SAFETY: both layouts were validated against `data` and share
            // no element.
            unsafe {
                run_flagged(
                    alpha,
                    conj_src,
                    add,
                    algo,
                    m,
                    n,
                    (src_ptr, src.stepi, src.stepj),
                    dst_raw,
                )
            };
        }
    }
    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;
    use tmv_view::{Matrix, TmvError};

    #[test]
    fn test_plan() {
        use MultXMAlgo::*;
        assert_eq!(plan_mult_xm(true, false, [3, 4], [4, 1], [1, 3]), Copy);
        assert_eq!(plan_mult_xm(true, true, [3, 4], [4, 1], [4, 1]), Linear);
        assert_eq!(plan_mult_xm(false, false, [3, 4], [1, 3], [1, 3]), Linear);
        // destination order wins a disagreement
        assert_eq!(plan_traversal([3, 4], [1, 3], [4, 1]), ByRows);
        assert_eq!(plan_traversal([3, 4], [4, 1], [1, 3]), ByCols);
        // padded rows cannot be flattened
        assert_eq!(plan_traversal([3, 4], [8, 1], [8, 1]), ByRows);
        // no order on either side: larger dimension inside
        assert_eq!(plan_traversal([3, 4], [10, 20], [30, 5]), ByRows);
        assert_eq!(plan_traversal([5, 4], [10, 20], [30, 5]), ByCols);
        assert_eq!(plan_traversal([1, 1], [7, 9], [2, 3]), Linear);
    }

    fn sample(m: usize, n: usize, order: StorageOrder) -> Matrix<i64> {
        Matrix::from_fn(m, n, order, |i, j| (i * 7 + j * 3) as i64 - 5)
    }

    #[test]
    fn test_mult_xm_all_paths() {
        for (oa, ob) in [
            (StorageOrder::RowMajor, StorageOrder::RowMajor),
            (StorageOrder::RowMajor, StorageOrder::ColMajor),
            (StorageOrder::ColMajor, StorageOrder::RowMajor),
            (StorageOrder::ColMajor, StorageOrder::ColMajor),
        ] {
            let a = sample(3, 5, oa);
            let mut b = Matrix::from_fn(3, 5, ob, |_, _| 100i64);
            mult_xm(1i64, &a.view(), &mut b.view_mut()).unwrap();
            add_mult_xm(-3i64, &a.view(), &mut b.view_mut()).unwrap();
            for i in 0..3 {
                for j in 0..5 {
                    assert_eq!(b.get(i, j), -2 * a.get(i, j));
                }
            }
        }
    }

    #[test]
    fn test_mult_xm_shape_mismatch() {
        let a = sample(2, 3, StorageOrder::RowMajor);
        let mut b = Matrix::<i64>::zeros(3, 2, StorageOrder::RowMajor);
        assert!(matches!(
            mult_xm(1i64, &a.view(), &mut b.view_mut()),
            Err(TmvError::ShapeMismatch(_, _))
        ));
    }

    #[test]
    fn test_mult_xm_conj_adapter() {
        let a = Matrix::from_fn(2, 2, StorageOrder::RowMajor, |i, j| {
            Complex64::new(i as f64, j as f64 + 1.0)
        });
        let mut b = Matrix::<Complex64>::zeros(2, 2, StorageOrder::ColMajor);
        let alpha = Complex64::new(0.0, 1.0);
        let algo = mult_xm_conj(alpha, &a.view(), false, &mut b.view_mut(), true, false).unwrap();
        assert_eq!(algo, MultXMAlgo::ConjAdapter);
        // conj(B) = alpha * A  <=>  B = conj(alpha * A)
        for i in 0..2 {
            for j in 0..2 {
                assert_eq!(b.get(i, j), (alpha * a.get(i, j)).conj());
            }
        }
        let algo = mult_xm_conj(alpha, &a.view(), true, &mut b.view_mut(), false, true).unwrap();
        assert_ne!(algo, MultXMAlgo::ConjAdapter);
        for i in 0..2 {
            for j in 0..2 {
                let expect = (alpha * a.get(i, j)).conj() + alpha * a.get(i, j).conj();
                assert_eq!(b.get(i, j), expect);
            }
        }
    }

    #[test]
    fn test_in_buffer_exact_and_disjoint() {
        let mut data: Vec<i64> = (0..8).collect();
        let l = MatrixLayout::row_major(0, 2, 2);
        let kind = mult_xm_in_buffer(1, &mut data, l, false, l, false).unwrap();
        assert_eq!(kind, AliasKind::Exact);
        assert_eq!(&data[..4], &[0, 1, 2, 3]);
        mult_xm_in_buffer(2, &mut data, l, false, l, true).unwrap();
        assert_eq!(&data[..4], &[0, 3, 6, 9]);

        let dst = MatrixLayout::col_major(4, 2, 2);
        let kind = mult_xm_in_buffer(1, &mut data, l, false, dst, false).unwrap();
        assert_eq!(kind, AliasKind::Disjoint);
        assert_eq!(&data[4..], &[0, 6, 3, 9]);
    }

    #[test]
    fn test_in_buffer_overlap_uses_temporary() {
        // in-place transpose of a 3x3 block
        let mut data: Vec<i64> = (1..=9).collect();
        let src = MatrixLayout::row_major(0, 3, 3);
        let kind = mult_xm_in_buffer(1, &mut data, src, false, src.t(), false).unwrap();
        assert_eq!(kind, AliasKind::Overlapping);
        // the row-major reading of the buffer is now the transpose
        assert_eq!(data, vec![1, 4, 7, 2, 5, 8, 3, 6, 9]);

        // shifted overlap: rows move down by one
        let mut data: Vec<i64> = (0..6).collect();
        let src = MatrixLayout::row_major(0, 2, 2);
        let dst = MatrixLayout::row_major(2, 2, 2);
        let kind = mult_xm_in_buffer(10, &mut data, src, false, dst, false).unwrap();
        assert_eq!(kind, AliasKind::Overlapping);
        assert_eq!(data, vec![0, 1, 0, 10, 20, 30]);
    }

    #[test]
    fn test_in_buffer_rejects_bad_layouts() {
        let mut data = vec![0i64; 4];
        let ok = MatrixLayout::row_major(0, 2, 2);
        let bad = MatrixLayout::row_major(1, 2, 2);
        assert!(mult_xm_in_buffer(1, &mut data, bad, false, ok, false).is_err());
        assert!(mult_xm_in_buffer(1, &mut data, ok, false, bad, false).is_err());
        let wrong_shape = MatrixLayout::row_major(0, 1, 4);
        assert!(matches!(
            mult_xm_in_buffer(1, &mut data, ok, false, wrong_shape, false),
            Err(TmvError::ShapeMismatch(_, _))
        ));

        // rows and columns of the destination share elements
        let mut big = vec![0i64; 16];
        let folded = MatrixLayout::new(8, 4, 4, 1, 1);
        let src = MatrixLayout::row_major(0, 4, 4).t();
        assert!(matches!(
            mult_xm_in_buffer(1, &mut big, src, false, folded, false),
            Err(TmvError::InvalidLayout(_))
        ));
        assert!(big.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_linear_copy_reads_through_conj() {
        let a = Matrix::from_fn(3, 2, StorageOrder::ColMajor, |i, j| {
            Complex64::new(i as f64, j as f64 + 1.0)
        });
        let mut b = Matrix::<Complex64>::zeros(3, 2, StorageOrder::ColMajor);
        let alpha = Complex64::new(0.0, 2.0);
        let algo = mult_xm(alpha, &a.view().conj(), &mut b.view_mut()).unwrap();
        assert_eq!(algo, MultXMAlgo::Linear);
        for j in 0..2 {
            for i in 0..3 {
                assert_eq!(b.get(i, j), alpha * a.get(i, j).conj());
            }
        }
    }

    #[test]
    fn test_in_buffer_conj_in_place() {
        let mut data = vec![Complex64::new(1.0, 2.0), Complex64::new(3.0, -4.0)];
        let l = MatrixLayout::row_major(0, 1, 2);
        mult_xm_in_buffer(Complex64::new(1.0, 0.0), &mut data, l, true, l, false).unwrap();
        assert_eq!(data, vec![Complex64::new(1.0, -2.0), Complex64::new(3.0, 4.0)]);
    }
}

//! Straightforward triple-loop versions of the runtime kernels.
//!
//! These read every operand element through `get` and write every output
//! element through `set`, with no blocking, no storage-order dispatch and no
//! unsafe code. The tests compare the optimized kernels against them, and the
//! `xdebug` feature cross-checks every blocked multiply.

use num_traits::Zero;
use tmv_traits::{ElementOp, Lift, MulInto, OkTypes, Scalar};
use tmv_view::{MatrixView, MatrixViewMut, Result, TmvError, VectorView, VectorViewMut};

use crate::raw::ensure_same_shape;

#[inline]
fn put<T: Scalar>(add: bool, old: T, v: T) -> T {
    if add {
        old + v
    } else {
        v
    }
}

/// `C (=|+=) alpha * op(A) * op(B)`.
pub fn naive_mult_mm<S, Ta, Tb, Tc, Ca, Cb>(
    alpha: S,
    a: &MatrixView<'_, Ta, Ca>,
    b: &MatrixView<'_, Tb, Cb>,
    add: bool,
    c: &mut MatrixViewMut<'_, Tc>,
) -> Result<()>
where
    S: Scalar + MulInto<Tc>,
    Ta: OkTypes<Tb, Tc>,
    Tb: Scalar,
    Tc: Scalar,
    Ca: ElementOp<Ta>,
    Cb: ElementOp<Tb>,
{
    let (m, n, k) = (c.nrows(), c.ncols(), a.ncols());
    ensure_same_shape(&[a.nrows(), b.ncols(), b.nrows()], &[m, n, k])?;
    for i in 0..m {
        for j in 0..n {
            let mut sum = <Ta as OkTypes<Tb, Tc>>::Prod::zero();
            for p in 0..k {
                sum = sum + <Ta as OkTypes<Tb, Tc>>::mul_prod(a.get([i, p]), b.get([p, j]));
            }
            let v = alpha.mul_into(<Ta as OkTypes<Tb, Tc>>::lift_prod(sum));
            c.set([i, j], put(add, c.get([i, j]), v));
        }
    }
    Ok(())
}

/// `y (=|+=) alpha * op(A) * op(x)`.
pub fn naive_mult_mv<S, Ta, Tx, Ty, Ca, Cx>(
    alpha: S,
    a: &MatrixView<'_, Ta, Ca>,
    x: &VectorView<'_, Tx, Cx>,
    add: bool,
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
    let (m, n) = (a.nrows(), a.ncols());
    ensure_same_shape(&[y.len(), x.len()], &[m, n])?;
    for i in 0..m {
        let mut sum = <Ta as OkTypes<Tx, Ty>>::Prod::zero();
        for j in 0..n {
            sum = sum + <Ta as OkTypes<Tx, Ty>>::mul_prod(a.get([i, j]), x.get([j]));
        }
        let v = alpha.mul_into(<Ta as OkTypes<Tx, Ty>>::lift_prod(sum));
        y.set([i], put(add, y.get([i]), v));
    }
    Ok(())
}

/// `A (=|+=) alpha * op(x) * op(y)^T`.
pub fn naive_rank1_update<S, Tx, Ty, Ta, Cx, Cy>(
    alpha: S,
    x: &VectorView<'_, Tx, Cx>,
    y: &VectorView<'_, Ty, Cy>,
    add: bool,
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
    let (m, n) = (a.nrows(), a.ncols());
    if x.len() != m || y.len() != n {
        return Err(TmvError::ShapeMismatch(vec![m, n], vec![x.len(), y.len()]));
    }
    for i in 0..m {
        for j in 0..n {
            let p = <Tx as OkTypes<Ty, Ta>>::mul_prod(x.get([i]), y.get([j]));
            let v = alpha.mul_into(<Tx as OkTypes<Ty, Ta>>::lift_prod(p));
            a.set([i, j], put(add, a.get([i, j]), v));
        }
    }
    Ok(())
}

/// `B (=|+=) alpha * op(A)`.
pub fn naive_mult_xm<S, Ta, Tb, Ca>(
    alpha: S,
    a: &MatrixView<'_, Ta, Ca>,
    add: bool,
    b: &mut MatrixViewMut<'_, Tb>,
) -> Result<()>
where
    S: Scalar + MulInto<Tb>,
    Ta: Copy,
    Tb: Scalar + Lift<Ta>,
    Ca: ElementOp<Ta>,
{
    ensure_same_shape(a.size(), b.size())?;
    for i in 0..b.nrows() {
        for j in 0..b.ncols() {
            let v = alpha.mul_into(Tb::lift(a.get([i, j])));
            b.set([i, j], put(add, b.get([i, j]), v));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;
    use tmv_view::{Matrix, StorageOrder};

    #[test]
    fn test_naive_mult_mm() {
        let a = Matrix::from_row_major_slice(2, 2, StorageOrder::RowMajor, &[1i64, 2, 3, 4]).unwrap();
        let b = Matrix::from_row_major_slice(2, 2, StorageOrder::ColMajor, &[5i64, 6, 7, 8]).unwrap();
        let mut c = Matrix::from_row_major_slice(2, 2, StorageOrder::RowMajor, &[1i64, 1, 1, 1]).unwrap();
        naive_mult_mm(1i64, &a.view(), &b.view(), false, &mut c.view_mut()).unwrap();
        assert_eq!(c.to_row_major_vec(), vec![19, 22, 43, 50]);
        naive_mult_mm(2i64, &a.view(), &b.view(), true, &mut c.view_mut()).unwrap();
        assert_eq!(c.to_row_major_vec(), vec![57, 66, 129, 150]);
    }

    #[test]
    fn test_naive_shape_errors() {
        let a = Matrix::<f64>::zeros(2, 3, StorageOrder::RowMajor);
        let b = Matrix::<f64>::zeros(2, 3, StorageOrder::RowMajor);
        let mut c = Matrix::<f64>::zeros(2, 3, StorageOrder::RowMajor);
        assert!(matches!(
            naive_mult_mm(1.0f64, &a.view(), &b.view(), false, &mut c.view_mut()),
            Err(TmvError::ShapeMismatch(..))
        ));
    }

    #[test]
    fn test_naive_rank1_conj() {
        let x = [Complex64::new(0.0, 1.0)];
        let y = [Complex64::new(2.0, 0.0), Complex64::new(0.0, 1.0)];
        let mut a = Matrix::<Complex64>::zeros(1, 2, StorageOrder::ColMajor);
        naive_rank1_update(
            1.0f64,
            &VectorView::from_slice(&x).conj(),
            &VectorView::from_slice(&y),
            false,
            &mut a.view_mut(),
        )
        .unwrap();
        assert_eq!(a.get(0, 0), Complex64::new(0.0, -2.0));
        assert_eq!(a.get(0, 1), Complex64::new(1.0, 0.0));
    }

    #[test]
    fn test_naive_mult_xm_lifts() {
        let a = Matrix::from_row_major_slice(1, 2, StorageOrder::RowMajor, &[1.0f64, 2.0]).unwrap();
        let mut b = Matrix::<Complex64>::zeros(1, 2, StorageOrder::RowMajor);
        naive_mult_xm(Complex64::new(0.0, 1.0), &a.view(), false, &mut b.view_mut()).unwrap();
        assert_eq!(b.get(0, 1), Complex64::new(0.0, 2.0));
    }
}

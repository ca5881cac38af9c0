//! 1-D kernels: scaled copy/accumulate, axpy and dot product.
//!
//! Every higher kernel reduces to these loops. Each has a unit-stride fast
//! path over slices and a strided fallback over raw pointers.

use num_traits::Zero;
use tmv_traits::{ElementOp, Lift, MulInto, OkTypes, ProdType, Scalar};
use tmv_view::{Result, VectorView, VectorViewMut};

use crate::dispatch_scale;
use crate::raw::{ensure_same_shape, RawVec, RawVecMut};
use crate::scaling::{store, store_raw, Accumulate, AddMode, Assign, Scaling};

/// `y (=|+=) sc * op(x)` (the AddVV / MultXV loop).
///
/// # Safety
/// `x` and `y` must address `n` valid elements each and must not overlap.
#[inline(always)]
pub(crate) unsafe fn scale_vv<Md, Sc, Tx, Ty, Cx>(
    _md: Md,
    sc: Sc,
    n: usize,
    x: RawVec<Tx, Cx>,
    y: RawVecMut<Ty>,
) where
    Md: AddMode,
    Sc: Scaling<Ty>,
    Tx: Copy,
    Ty: Scalar + Lift<Tx>,
    Cx: ElementOp<Tx>,
{
    if x.stride == 1 && y.stride == 1 {
        let xs = std::slice::from_raw_parts(x.ptr, n);
        let ys = std::slice::from_raw_parts_mut(y.ptr, n);
        for (yi, &xi) in ys.iter_mut().zip(xs.iter()) {
            store::<Md, Ty>(yi, sc.apply(Ty::lift(Cx::apply(xi))));
        }
    } else {
        for i in 0..n {
            store_raw::<Md, Ty>(y.at(i), sc.apply(Ty::lift(x.read(i))));
        }
    }
}

/// `y (=|+=) sc * op(y)` where source and destination are the same elements.
///
/// # Safety
/// `y` must address `n` valid elements.
#[inline(always)]
pub(crate) unsafe fn update_in_place<Md, Sc, T, C>(_md: Md, sc: Sc, n: usize, y: RawVecMut<T>)
where
    Md: AddMode,
    Sc: Scaling<T>,
    T: Scalar,
    C: ElementOp<T>,
{
    for i in 0..n {
        let p = y.at(i);
        store_raw::<Md, T>(p, sc.apply(C::apply(*p)));
    }
}

/// `y (=|+=) op(a) * s` with `a` on the left of the product.
///
/// # Safety
/// `a` and `y` must address `n` valid elements each and must not overlap.
#[inline(always)]
pub(crate) unsafe fn axpy_lhs<Md, A, X, Y, Ca>(
    _md: Md,
    n: usize,
    s: Y,
    a: RawVec<A, Ca>,
    y: RawVecMut<Y>,
) where
    Md: AddMode,
    A: OkTypes<X, Y>,
    Y: Scalar,
    Ca: ElementOp<A>,
{
    if a.stride == 1 && y.stride == 1 {
        let as_ = std::slice::from_raw_parts(a.ptr, n);
        let ys = std::slice::from_raw_parts_mut(y.ptr, n);
        for (yi, &ai) in ys.iter_mut().zip(as_.iter()) {
            store::<Md, Y>(yi, <A as OkTypes<X, Y>>::lhs_times(Ca::apply(ai), s));
        }
    } else {
        for i in 0..n {
            store_raw::<Md, Y>(y.at(i), <A as OkTypes<X, Y>>::lhs_times(a.read(i), s));
        }
    }
}

/// `y (=|+=) op(x) * s` with `x` on the right of the product.
///
/// # Safety
/// `x` and `y` must address `n` valid elements each and must not overlap.
#[inline(always)]
pub(crate) unsafe fn axpy_rhs<Md, A, X, Y, Cx>(
    _md: Md,
    n: usize,
    s: Y,
    x: RawVec<X, Cx>,
    y: RawVecMut<Y>,
) where
    Md: AddMode,
    A: OkTypes<X, Y>,
    X: Copy,
    Y: Scalar,
    Cx: ElementOp<X>,
{
    if x.stride == 1 && y.stride == 1 {
        let xs = std::slice::from_raw_parts(x.ptr, n);
        let ys = std::slice::from_raw_parts_mut(y.ptr, n);
        for (yi, &xi) in ys.iter_mut().zip(xs.iter()) {
            store::<Md, Y>(yi, <A as OkTypes<X, Y>>::rhs_times(Cx::apply(xi), s));
        }
    } else {
        for i in 0..n {
            store_raw::<Md, Y>(y.at(i), <A as OkTypes<X, Y>>::rhs_times(x.read(i), s));
        }
    }
}

/// `sum_i op(a[i]) * op(x[i])`, accumulated in the exact product type.
///
/// # Safety
/// `a` and `x` must address `n` valid elements each.
#[inline(always)]
pub(crate) unsafe fn dot<A, X, Y, Ca, Cx>(
    n: usize,
    a: RawVec<A, Ca>,
    x: RawVec<X, Cx>,
) -> <A as OkTypes<X, Y>>::Prod
where
    A: OkTypes<X, Y>,
    X: Copy,
    Ca: ElementOp<A>,
    Cx: ElementOp<X>,
{
    let mut sum = <A as OkTypes<X, Y>>::Prod::zero();
    if a.stride == 1 && x.stride == 1 {
        let as_ = std::slice::from_raw_parts(a.ptr, n);
        let xs = std::slice::from_raw_parts(x.ptr, n);
        for (&ai, &xi) in as_.iter().zip(xs.iter()) {
            sum = sum + <A as OkTypes<X, Y>>::mul_prod(Ca::apply(ai), Cx::apply(xi));
        }
    } else {
        for i in 0..n {
            sum = sum + <A as OkTypes<X, Y>>::mul_prod(a.read(i), x.read(i));
        }
    }
    sum
}

// ============================================================================
// View entry points
// ============================================================================

fn xv_impl<Md, S, Tx, Ty, Cx>(
    md: Md,
    alpha: S,
    x: &VectorView<'_, Tx, Cx>,
    y: &mut VectorViewMut<'_, Ty>,
) -> Result<()>
where
    Md: AddMode,
    S: Scalar + MulInto<Ty>,
    Tx: Copy,
    Ty: Scalar + Lift<Tx>,
    Cx: ElementOp<Tx>,
{
    ensure_same_shape(x.size(), y.size())?;
    let n = y.len();
    let xr = RawVec::from_view(x);
    let yr = RawVecMut::from_view(y);
    // SAFETY: equal lengths; `y` is exclusive so it cannot overlap `x`.
    dispatch_scale!(alpha, |sc| unsafe { scale_vv(md, sc, n, xr, yr) });
    Ok(())
}

/// `y = alpha * op(x)`.
pub fn mult_xv<S, Tx, Ty, Cx>(
    alpha: S,
    x: &VectorView<'_, Tx, Cx>,
    y: &mut VectorViewMut<'_, Ty>,
) -> Result<()>
where
    S: Scalar + MulInto<Ty>,
    Tx: Copy,
    Ty: Scalar + Lift<Tx>,
    Cx: ElementOp<Tx>,
{
    xv_impl(Assign, alpha, x, y)
}

/// `y += alpha * op(x)`.
pub fn add_vv<S, Tx, Ty, Cx>(
    alpha: S,
    x: &VectorView<'_, Tx, Cx>,
    y: &mut VectorViewMut<'_, Ty>,
) -> Result<()>
where
    S: Scalar + MulInto<Ty>,
    Tx: Copy,
    Ty: Scalar + Lift<Tx>,
    Cx: ElementOp<Tx>,
{
    xv_impl(Accumulate, alpha, x, y)
}

/// `op(a) . op(x)` in the product type of the two element types.
pub fn mult_vv<Ta, Tx, Ca, Cx>(
    a: &VectorView<'_, Ta, Ca>,
    x: &VectorView<'_, Tx, Cx>,
) -> Result<<Ta as ProdType<Tx>>::Output>
where
    Ta: Scalar + ProdType<Tx>,
    Tx: Scalar,
    Ca: ElementOp<Ta>,
    Cx: ElementOp<Tx>,
{
    ensure_same_shape(a.size(), x.size())?;
    let ar = RawVec::from_view(a);
    let xr = RawVec::from_view(x);
    let mut sum = <Ta as ProdType<Tx>>::Output::zero();
    for i in 0..a.len() {
        // SAFETY: `i` is inside both views.
        sum = sum + unsafe { ar.read(i).prod(xr.read(i)) };
    }
    Ok(sum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scaling::{Accumulate, Alpha, Assign, NegUnit, Unit};
    use num_complex::Complex64;
    use tmv_traits::{Conj, Identity};

    fn rv<T: Copy>(s: &[T], stride: isize) -> RawVec<T, Identity> {
        RawVec::new(s.as_ptr(), stride)
    }

    #[test]
    fn test_add_vv_contiguous_and_strided() {
        let x = [1.0, 2.0, 3.0];
        let mut y = [10.0, 10.0, 10.0];
        unsafe { scale_vv(Accumulate, Alpha(2.0), 3, rv(&x, 1), RawVecMut::new(y.as_mut_ptr(), 1)) };
        assert_eq!(y, [12.0, 14.0, 16.0]);

        let xs = [1.0, 0.0, 2.0, 0.0, 3.0];
        let mut ys = [0.0; 6];
        unsafe { scale_vv(Assign, NegUnit, 3, rv(&xs, 2), RawVecMut::new(ys.as_mut_ptr(), 3)) };
        assert_eq!(ys, [-1.0, 0.0, 0.0, -2.0, 0.0, 0.0]);
    }

    #[test]
    fn test_add_vv_real_into_complex_conj() {
        let x = [Complex64::new(1.0, 1.0), Complex64::new(0.0, 2.0)];
        let mut y = [Complex64::new(0.0, 0.0); 2];
        let xc: RawVec<Complex64, Conj> = RawVec::new(x.as_ptr(), 1);
        unsafe { scale_vv(Assign, Unit, 2, xc, RawVecMut::new(y.as_mut_ptr(), 1)) };
        assert_eq!(y, [Complex64::new(1.0, -1.0), Complex64::new(0.0, -2.0)]);

        let r = [3.0f64, 4.0];
        unsafe { scale_vv(Accumulate, Unit, 2, rv(&r, 1), RawVecMut::new(y.as_mut_ptr(), 1)) };
        assert_eq!(y, [Complex64::new(4.0, -1.0), Complex64::new(4.0, -2.0)]);
    }

    #[test]
    fn test_update_in_place() {
        let mut y = [1i64, 2, 3];
        unsafe {
            update_in_place::<_, _, i64, Identity>(
                Accumulate,
                Alpha(2i64),
                3,
                RawVecMut::new(y.as_mut_ptr(), 1),
            )
        };
        assert_eq!(y, [3, 6, 9]);
    }

    #[test]
    fn test_axpy_both_sides() {
        let a = [1i64, 2, 3];
        let mut y = [1i64, 1, 1];
        unsafe {
            axpy_lhs::<_, i64, i64, i64, Identity>(
                Accumulate,
                3,
                5,
                rv(&a, 1),
                RawVecMut::new(y.as_mut_ptr(), 1),
            )
        };
        assert_eq!(y, [6, 11, 16]);
        unsafe {
            axpy_rhs::<_, i64, i64, i64, Identity>(
                Assign,
                2,
                -1,
                rv(&a, 2),
                RawVecMut::new(y.as_mut_ptr(), 2),
            )
        };
        assert_eq!(y, [-1, 11, -3]);
    }

    #[test]
    fn test_dot_product_type() {
        let a = [1.0f64, 2.0];
        let x = [Complex64::new(0.0, 1.0), Complex64::new(1.0, 0.0)];
        let d = unsafe {
            dot::<f64, Complex64, Complex64, Identity, Identity>(2, rv(&a, 1), rv(&x, 1))
        };
        assert_eq!(d, Complex64::new(2.0, 1.0));

        let xc: RawVec<Complex64, Conj> = RawVec::new(x.as_ptr(), 1);
        let d = unsafe { dot::<f64, Complex64, Complex64, Identity, Conj>(2, rv(&a, 1), xc) };
        assert_eq!(d, Complex64::new(2.0, -1.0));

        let s = [1i64, 9, 2, 9, 3];
        let d = unsafe { dot::<i64, i64, i64, Identity, Identity>(3, rv(&s, 2), rv(&s, 2)) };
        assert_eq!(d, 14);
    }

    #[test]
    fn test_view_entry_points() {
        let data = [1.0f64, 2.0, 3.0, 4.0];
        let x = VectorView::new(&data, [2], [2], 0).unwrap();
        let mut out = [Complex64::new(1.0, 1.0); 2];
        let mut y = VectorViewMut::from_slice(&mut out);
        mult_xv(Complex64::new(0.0, 2.0), &x, &mut y).unwrap();
        add_vv(1.0f64, &x, &mut y).unwrap();
        assert_eq!(out, [Complex64::new(1.0, 2.0), Complex64::new(3.0, 6.0)]);

        let z = [Complex64::new(0.0, 1.0), Complex64::new(2.0, 0.0)];
        let zv = VectorView::from_slice(&z);
        assert_eq!(mult_vv(&x, &zv).unwrap(), Complex64::new(6.0, 1.0));
        assert_eq!(mult_vv(&x, &zv.conj()).unwrap(), Complex64::new(6.0, -1.0));

        let short = VectorView::from_slice(&data[..1]);
        assert!(mult_vv(&x, &short).is_err());
    }
}

//! Product-type resolution and the scalar legality predicate.
//!
//! `ProdType` names the result of multiplying two scalars. `Lift` says a
//! value can be widened into another type with no loss. `OkTypes` ties them
//! together: `A: OkTypes<X, Y>` holds exactly when a kernel may read `A` and
//! `X`, multiply them, and write the result into `Y`.
//!
//! There is no fallback for an illegal combination. A kernel instantiated
//! with a real destination and a complex multiplicand does not compile:
//!
//! ```compile_fail
//! use num_complex::Complex64;
//! use tmv_traits::OkTypes;
//!
//! fn kernel<A: OkTypes<X, Y>, X, Y>() {}
//! // real * complex cannot be stored in a real destination
//! kernel::<f64, Complex64, f64>();
//! ```
//!
//! Mixed precision is rejected the same way:
//!
//! ```compile_fail
//! use tmv_traits::OkTypes;
//!
//! fn kernel<A: OkTypes<X, Y>, X, Y>() {}
//! kernel::<f32, f64, f64>();
//! ```
//!
//! Legal combinations resolve to the expected product type:
//!
//! ```
//! use num_complex::Complex64;
//! use tmv_traits::OkTypes;
//!
//! let p = <f64 as OkTypes<Complex64, Complex64>>::mul_prod(2.0, Complex64::new(1.0, 1.0));
//! assert_eq!(p, Complex64::new(2.0, 2.0));
//! ```

use num_complex::Complex;

use crate::scalar::Scalar;

/// Result type of `Self * Rhs`.
pub trait ProdType<Rhs>: Sized {
    type Output: Scalar;

    fn prod(self, rhs: Rhs) -> Self::Output;
}

impl<T: Scalar> ProdType<T> for T {
    type Output = T;

    #[inline(always)]
    fn prod(self, rhs: T) -> T {
        self * rhs
    }
}

macro_rules! impl_mixed_prod {
    ($($t:ty),*) => {
        $(
            impl ProdType<Complex<$t>> for $t {
                type Output = Complex<$t>;

                #[inline(always)]
                fn prod(self, rhs: Complex<$t>) -> Complex<$t> {
                    Complex::new(self * rhs.re, self * rhs.im)
                }
            }

            impl ProdType<$t> for Complex<$t> {
                type Output = Complex<$t>;

                #[inline(always)]
                fn prod(self, rhs: $t) -> Complex<$t> {
                    Complex::new(self.re * rhs, self.im * rhs)
                }
            }

            impl Lift<$t> for Complex<$t> {
                #[inline(always)]
                fn lift(src: $t) -> Self {
                    Complex::new(src, num_traits::Zero::zero())
                }
            }
        )*
    };
}

/// Lossless widening from `Src` into `Self`.
pub trait Lift<Src>: Sized {
    fn lift(src: Src) -> Self;
}

impl<T: Scalar> Lift<T> for T {
    #[inline(always)]
    fn lift(src: T) -> T {
        src
    }
}

impl_mixed_prod!(f32, f64, i32, i64);

/// `Self * Y` is again a `Y`.
pub trait MulInto<Y>: Copy {
    fn mul_into(self, y: Y) -> Y;
}

impl<S, Y> MulInto<Y> for S
where
    S: ProdType<Y, Output = Y> + Copy,
{
    #[inline(always)]
    fn mul_into(self, y: Y) -> Y {
        <S as ProdType<Y>>::prod(self, y)
    }
}

/// Legality predicate for a kernel reading `Self` and `X` and writing `Y`.
///
/// Holds when `Y` can represent `Self`, `X` and `Self * X`. The helper
/// functions are the only arithmetic the kernels perform across types.
pub trait OkTypes<X, Y>: Scalar {
    /// Exact type of `Self * X`, used for dot-product accumulators.
    type Prod: Scalar;

    fn mul_prod(self, x: X) -> Self::Prod;
    fn lift_prod(p: Self::Prod) -> Y;
    fn lift_lhs(self) -> Y;
    fn lift_rhs(x: X) -> Y;
    /// `self * y`, staying in `Y`.
    fn lhs_times(self, y: Y) -> Y;
    /// `x * y`, staying in `Y`.
    fn rhs_times(x: X, y: Y) -> Y;
}

impl<A, X, Y> OkTypes<X, Y> for A
where
    A: Scalar + ProdType<X> + MulInto<Y>,
    X: Scalar + MulInto<Y>,
    Y: Scalar + Lift<A> + Lift<X> + Lift<<A as ProdType<X>>::Output>,
{
    type Prod = <A as ProdType<X>>::Output;

    #[inline(always)]
    fn mul_prod(self, x: X) -> Self::Prod {
        <A as ProdType<X>>::prod(self, x)
    }

    #[inline(always)]
    fn lift_prod(p: Self::Prod) -> Y {
        <Y as Lift<Self::Prod>>::lift(p)
    }

    #[inline(always)]
    fn lift_lhs(self) -> Y {
        <Y as Lift<A>>::lift(self)
    }

    #[inline(always)]
    fn lift_rhs(x: X) -> Y {
        <Y as Lift<X>>::lift(x)
    }

    #[inline(always)]
    fn lhs_times(self, y: Y) -> Y {
        <A as MulInto<Y>>::mul_into(self, y)
    }

    #[inline(always)]
    fn rhs_times(x: X, y: Y) -> Y {
        <X as MulInto<Y>>::mul_into(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    fn assert_ok<A: OkTypes<X, Y>, X, Y>() {}

    fn prod_kind<A: OkTypes<X, Y>, X, Y>() -> crate::ScalarKind {
        <<A as OkTypes<X, Y>>::Prod as Scalar>::KIND
    }

    #[test]
    fn test_legal_combinations_compile() {
        assert_ok::<f64, f64, f64>();
        assert_ok::<f64, f64, Complex64>();
        assert_ok::<f64, Complex64, Complex64>();
        assert_ok::<Complex64, f64, Complex64>();
        assert_ok::<Complex64, Complex64, Complex64>();
        assert_ok::<i64, i64, i64>();
        assert_ok::<f32, f32, f32>();
    }

    #[test]
    fn test_prod_type_resolution() {
        use crate::{BaseType, ScalarKind};
        assert_eq!(prod_kind::<f64, f64, f64>(), ScalarKind::Real(BaseType::F64));
        // the accumulator stays real even when the destination is complex
        assert_eq!(
            prod_kind::<f64, f64, Complex64>(),
            ScalarKind::Real(BaseType::F64)
        );
        assert_eq!(
            prod_kind::<f64, Complex64, Complex64>(),
            ScalarKind::Complex(BaseType::F64)
        );
    }

    #[test]
    fn test_helpers() {
        let z = Complex64::new(1.0, 2.0);
        assert_eq!(2.0f64.prod(z), Complex64::new(2.0, 4.0));
        assert_eq!(z.prod(3.0f64), Complex64::new(3.0, 6.0));
        assert_eq!(<Complex64 as Lift<f64>>::lift(5.0), Complex64::new(5.0, 0.0));
        assert_eq!(2.0f64.mul_into(z), Complex64::new(2.0, 4.0));
        assert_eq!(
            <f64 as OkTypes<f64, Complex64>>::lift_prod(6.0),
            Complex64::new(6.0, 0.0)
        );
        assert_eq!(<i64 as OkTypes<i64, i64>>::rhs_times(3, 4), 12);
        assert_eq!(<i64 as OkTypes<i64, i64>>::lhs_times(5, 4), 20);
    }
}

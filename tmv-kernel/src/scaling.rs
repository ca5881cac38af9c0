//! Compile-time call-shape markers: scale factor and add/assign.
//!
//! A kernel is generic over a [`Scaling`] and an [`AddMode`]. `Unit` and
//! `NegUnit` compile the alpha multiply out entirely; `Alpha` carries an
//! arbitrary value. [`dispatch_scale!`](crate::dispatch_scale) turns a runtime
//! alpha into the matching instantiation.

use tmv_traits::{MulInto, Scalar};

/// Scale factor applied to a kernel's result.
pub trait Scaling<Y>: Copy + Send + Sync {
    fn apply(self, y: Y) -> Y;
}

/// `alpha == 1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Unit;

/// `alpha == -1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NegUnit;

/// Arbitrary `alpha`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Alpha<S>(pub S);

impl<Y: Scalar> Scaling<Y> for Unit {
    #[inline(always)]
    fn apply(self, y: Y) -> Y {
        y
    }
}

impl<Y: Scalar> Scaling<Y> for NegUnit {
    #[inline(always)]
    fn apply(self, y: Y) -> Y {
        -y
    }
}

impl<S, Y> Scaling<Y> for Alpha<S>
where
    S: Scalar + MulInto<Y>,
    Y: Scalar,
{
    #[inline(always)]
    fn apply(self, y: Y) -> Y {
        self.0.mul_into(y)
    }
}

/// Whether the destination is overwritten or accumulated into.
pub trait AddMode: Copy + Default + Send + Sync + 'static {
    const ADD: bool;
}

/// `dst = op`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Assign;

/// `dst += op`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Accumulate;

impl AddMode for Assign {
    const ADD: bool = false;
}

impl AddMode for Accumulate {
    const ADD: bool = true;
}

/// Write `v` into `dst` according to `Md`.
#[inline(always)]
pub(crate) fn store<Md: AddMode, T: Scalar>(dst: &mut T, v: T) {
    if Md::ADD {
        *dst = *dst + v;
    } else {
        *dst = v;
    }
}

/// Raw-pointer form of [`store`].
///
/// # Safety
/// `dst` must be valid for reads and writes.
#[inline(always)]
pub(crate) unsafe fn store_raw<Md: AddMode, T: Scalar>(dst: *mut T, v: T) {
    if Md::ADD {
        *dst = *dst + v;
    } else {
        *dst = v;
    }
}

#[doc(hidden)]
#[inline(always)]
pub fn is_unit<S: Scalar>(alpha: &S) -> bool {
    *alpha == S::one()
}

#[doc(hidden)]
#[inline(always)]
pub fn is_neg_unit<S: Scalar>(alpha: &S) -> bool {
    *alpha == -S::one()
}

/// Bind `$sc` to `Unit`, `NegUnit` or `Alpha(alpha)` by value and evaluate
/// `$body` once for the chosen instantiation.
///
/// ```
/// use tmv_kernel::{dispatch_scale, Scaling};
///
/// fn scale(alpha: f64, y: f64) -> f64 {
///     dispatch_scale!(alpha, |sc| Scaling::<f64>::apply(sc, y))
/// }
/// assert_eq!(scale(1.0, 3.0), 3.0);
/// assert_eq!(scale(-1.0, 3.0), -3.0);
/// assert_eq!(scale(2.0, 3.0), 6.0);
/// ```
#[macro_export]
macro_rules! dispatch_scale {
    ($alpha:expr, |$sc:ident| $body:expr) => {{
        let alpha = $alpha;
        if $crate::scaling::is_unit(&alpha) {
            let $sc = $crate::scaling::Unit;
            $body
        } else if $crate::scaling::is_neg_unit(&alpha) {
            let $sc = $crate::scaling::NegUnit;
            $body
        } else {
            let $sc = $crate::scaling::Alpha(alpha);
            $body
        }
    }};
}

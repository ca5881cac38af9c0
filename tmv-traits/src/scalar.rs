//! Scalar types understood by the kernels.
//!
//! Every element type is either a real base type or the complex type built
//! on it. [`ScalarKind`] is the runtime description of that split; the
//! [`Scalar`] trait carries the same information at compile time.

use num_complex::Complex;
use num_traits::{One, ToPrimitive, Zero};
use std::fmt::Debug;
use std::ops::{Add, Mul, Neg, Sub};

use crate::element_op::ElementOpApply;

/// Arithmetic bounds shared by every element type the kernels accept.
pub trait ScalarBase:
    Copy
    + Send
    + Sync
    + Debug
    + PartialEq
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
    + Zero
    + One
    + ElementOpApply
    + 'static
{
}

impl<T> ScalarBase for T where
    T: Copy
        + Send
        + Sync
        + Debug
        + PartialEq
        + Add<Output = T>
        + Sub<Output = T>
        + Mul<Output = T>
        + Neg<Output = T>
        + Zero
        + One
        + ElementOpApply
        + 'static
{
}

/// Underlying real numeric type of a scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    F32,
    F64,
    I32,
    I64,
}

impl BaseType {
    /// Size in bytes of one real value of this type.
    pub const fn size_of(self) -> usize {
        match self {
            BaseType::F32 | BaseType::I32 => 4,
            BaseType::F64 | BaseType::I64 => 8,
        }
    }
}

/// Real or complex scalar over a [`BaseType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Real(BaseType),
    Complex(BaseType),
}

impl ScalarKind {
    pub const fn base(self) -> BaseType {
        match self {
            ScalarKind::Real(b) | ScalarKind::Complex(b) => b,
        }
    }

    pub const fn is_complex(self) -> bool {
        matches!(self, ScalarKind::Complex(_))
    }

    /// Size in bytes of one value of this kind.
    pub const fn size_of(self) -> usize {
        match self {
            ScalarKind::Real(b) => b.size_of(),
            ScalarKind::Complex(b) => 2 * b.size_of(),
        }
    }

    /// Result kind of `self * rhs`, or `None` when the base types differ.
    ///
    /// ```
    /// use tmv_traits::{BaseType, ScalarKind};
    /// let r = ScalarKind::Real(BaseType::F64);
    /// let c = ScalarKind::Complex(BaseType::F64);
    /// assert_eq!(r.prod(c), Some(c));
    /// assert_eq!(r.prod(ScalarKind::Real(BaseType::F32)), None);
    /// ```
    pub fn prod(self, rhs: ScalarKind) -> Option<ScalarKind> {
        if self.base() != rhs.base() {
            return None;
        }
        if self.is_complex() || rhs.is_complex() {
            Some(ScalarKind::Complex(self.base()))
        } else {
            Some(ScalarKind::Real(self.base()))
        }
    }

    /// Whether a value of kind `input` can be stored in `self` without loss.
    pub fn can_hold(self, input: ScalarKind) -> bool {
        self.base() == input.base() && (self.is_complex() || !input.is_complex())
    }
}

/// Runtime form of the legality rule enforced by [`OkTypes`](crate::OkTypes).
///
/// Every multiplicand (including the scale factor) and their product must be
/// representable in `output`. A real destination fed by a complex factor is
/// rejected, as is any mix of base types.
pub fn ok_types(inputs: &[ScalarKind], output: ScalarKind) -> bool {
    let mut prod = match inputs.first() {
        Some(&k) => k,
        None => return true,
    };
    for &k in &inputs[1..] {
        match prod.prod(k) {
            Some(p) => prod = p,
            None => return false,
        }
    }
    inputs.iter().all(|&k| output.can_hold(k)) && output.can_hold(prod)
}

/// A scalar usable in every kernel.
pub trait Scalar: ScalarBase {
    /// The real type underlying this scalar.
    type Real: RealScalar;
    /// Runtime description of this type.
    const KIND: ScalarKind;

    fn from_real(re: Self::Real) -> Self;
    fn real(self) -> Self::Real;
    fn imag(self) -> Self::Real;

    /// `|re| + |im|` as `f64`, for tolerance checks.
    #[inline]
    fn norm1(self) -> f64 {
        self.real().to_f64_lossy().abs() + self.imag().to_f64_lossy().abs()
    }
}

/// Real base scalar.
pub trait RealScalar: Scalar<Real = Self> + PartialOrd + ToPrimitive {
    #[inline]
    fn to_f64_lossy(self) -> f64 {
        self.to_f64().unwrap_or(f64::NAN)
    }
}

macro_rules! impl_scalar {
    ($($t:ty => $base:ident),*) => {
        $(
            impl Scalar for $t {
                type Real = $t;
                const KIND: ScalarKind = ScalarKind::Real(BaseType::$base);

                #[inline(always)]
                fn from_real(re: $t) -> Self {
                    re
                }
                #[inline(always)]
                fn real(self) -> $t {
                    self
                }
                #[inline(always)]
                fn imag(self) -> $t {
                    <$t>::zero()
                }
            }

            impl RealScalar for $t {}

            impl Scalar for Complex<$t> {
                type Real = $t;
                const KIND: ScalarKind = ScalarKind::Complex(BaseType::$base);

                #[inline(always)]
                fn from_real(re: $t) -> Self {
                    Complex::new(re, <$t>::zero())
                }
                #[inline(always)]
                fn real(self) -> $t {
                    self.re
                }
                #[inline(always)]
                fn imag(self) -> $t {
                    self.im
                }
            }
        )*
    };
}

impl_scalar!(f32 => F32, f64 => F64, i32 => I32, i64 => I64);

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::{Complex32, Complex64};

    const R64: ScalarKind = ScalarKind::Real(BaseType::F64);
    const C64: ScalarKind = ScalarKind::Complex(BaseType::F64);
    const R32: ScalarKind = ScalarKind::Real(BaseType::F32);

    #[test]
    fn test_kind_constants() {
        assert_eq!(<f64 as Scalar>::KIND, R64);
        assert_eq!(<Complex64 as Scalar>::KIND, C64);
        assert_eq!(<Complex32 as Scalar>::KIND.size_of(), 8);
        assert_eq!(<i64 as Scalar>::KIND, ScalarKind::Real(BaseType::I64));
    }

    #[test]
    fn test_prod_kind() {
        assert_eq!(R64.prod(R64), Some(R64));
        assert_eq!(R64.prod(C64), Some(C64));
        assert_eq!(C64.prod(R64), Some(C64));
        assert_eq!(C64.prod(C64), Some(C64));
        assert_eq!(R32.prod(R64), None);
    }

    #[test]
    fn test_ok_types_table() {
        assert!(ok_types(&[R64, R64, R64], R64));
        assert!(ok_types(&[R64, R64, C64], C64));
        assert!(ok_types(&[C64, C64, C64], C64));
        assert!(ok_types(&[R64, C64, R64], C64));
        // real * real * complex into real drops the imaginary part
        assert!(!ok_types(&[R64, R64, C64], R64));
        assert!(!ok_types(&[C64, R64, R64], R64));
        // mixed precision is never combined
        assert!(!ok_types(&[R32, R64], R64));
        assert!(!ok_types(&[R64, R64], R32));
        assert!(ok_types(&[], R64));
    }

    #[test]
    fn test_real_imag() {
        let z = Complex64::new(3.0, -4.0);
        assert_eq!(z.real(), 3.0);
        assert_eq!(z.imag(), -4.0);
        assert_eq!(z.norm1(), 7.0);
        assert_eq!(Complex64::from_real(2.0), Complex64::new(2.0, 0.0));
        assert_eq!(5i64.imag(), 0);
        assert_eq!((-5i64).norm1(), 5.0);
    }
}

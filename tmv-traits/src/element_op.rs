//! Conjugation flags carried at the type level.
//!
//! A matrix or vector operand is either read as stored (`Identity`) or
//! read conjugated (`Conj`). The flag is a zero-sized marker type so every
//! kernel is monomorphized for the exact combination it sees, and a real
//! element type simply ignores `Conj`.
//!
//! The two markers form a group of order two under composition:
//! ```text
//!   compose | Id   | Conj
//! ----------|------|------
//!   Id      | Id   | Conj
//!   Conj    | Conj | Id
//! ```

use num_complex::Complex;
use num_traits::Num;

/// Element types with a complex conjugate. Reals are their own conjugate.
pub trait ElementOpApply: Copy {
    #[inline(always)]
    fn conj(self) -> Self {
        self
    }
}

macro_rules! self_conjugate {
    ($($t:ty),*) => {
        $(impl ElementOpApply for $t {})*
    };
}

self_conjugate!(f32, f64, i8, i16, i32, i64, isize);

impl<T: Num + Copy + std::ops::Neg<Output = T>> ElementOpApply for Complex<T> {
    #[inline(always)]
    fn conj(self) -> Self {
        Complex::new(self.re, -self.im)
    }
}

/// Read the operand as stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Identity;

/// Read the operand conjugated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Conj;

/// Read-time transform of an operand element.
pub trait ElementOp<T>: Copy + Default + Send + Sync + 'static {
    /// Set for [`Identity`]; kernels may then read storage directly.
    const IS_IDENTITY: bool = false;
    /// Set for [`Conj`].
    const IS_CONJ: bool = false;

    fn apply(value: T) -> T;
}

impl<T: Copy> ElementOp<T> for Identity {
    const IS_IDENTITY: bool = true;

    #[inline(always)]
    fn apply(value: T) -> T {
        value
    }
}

impl<T: ElementOpApply> ElementOp<T> for Conj {
    const IS_CONJ: bool = true;

    #[inline(always)]
    fn apply(value: T) -> T {
        ElementOpApply::conj(value)
    }
}

/// Flags that can be toggled by `.conj()` on a view.
pub trait ComposableElementOp<T: ElementOpApply>: ElementOp<T> {
    /// The flag after one more conjugation.
    type ComposeConj: ComposableElementOp<T>;
}

impl<T: ElementOpApply> ComposableElementOp<T> for Identity {
    type ComposeConj = Conj;
}

impl<T: ElementOpApply> ComposableElementOp<T> for Conj {
    type ComposeConj = Identity;
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::{Complex32, Complex64};

    fn read<Op: ElementOp<T>, T>(v: T) -> T {
        Op::apply(v)
    }

    #[test]
    fn test_read_as_stored_and_conjugated() {
        let z = Complex64::new(-1.5, 2.0);
        assert_eq!(read::<Identity, _>(z), z);
        assert_eq!(read::<Conj, _>(z), Complex64::new(-1.5, -2.0));
        assert_eq!(read::<Conj, _>(Complex32::new(0.0, 1.0)), Complex32::new(0.0, -1.0));
    }

    #[test]
    fn test_real_types_ignore_conj() {
        assert_eq!(read::<Conj, f64>(-0.25), -0.25);
        assert_eq!(read::<Conj, i32>(11), 11);
        assert!(!<Conj as ElementOp<f64>>::IS_IDENTITY);
        assert!(<Conj as ElementOp<f64>>::IS_CONJ);
        assert!(<Identity as ElementOp<i64>>::IS_IDENTITY);
    }

    #[test]
    fn test_double_conj_is_identity() {
        type Twice<Op> = <<Op as ComposableElementOp<Complex64>>::ComposeConj as ComposableElementOp<
            Complex64,
        >>::ComposeConj;
        let z = Complex64::new(3.0, -4.0);
        assert_eq!(read::<Twice<Identity>, _>(z), z);
        assert_eq!(read::<Twice<Conj>, _>(z), z.conj());
        assert_eq!(
            std::any::TypeId::of::<Twice<Conj>>(),
            std::any::TypeId::of::<Conj>()
        );
    }
}

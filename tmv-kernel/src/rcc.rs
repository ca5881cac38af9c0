//! Recursive block multiply for one output tile.
//!
//! [`rcc_block`] halves `K` while it exceeds the block threshold, then
//! halves the longer of `M` / `N` until both are at most [`MICRO_MAX`], and
//! finishes with a register-blocked micro-kernel. [`crc_block`] is the
//! outer-product form used when `A` is column-major and `B` row-major.

use num_traits::Zero;
use tmv_traits::{ElementOp, OkTypes, Scalar};

use crate::config::MICRO_MAX;
use crate::raw::{RawMat, RawMatMut};
use crate::scaling::{store_raw, Accumulate, AddMode};
use crate::vector::axpy_lhs;

/// Split point for a dimension `d > MICRO_MAX`: about half, rounded up to a
/// multiple of `MICRO_MAX` so the leaves stay full-width.
#[inline]
pub(crate) fn split_point(d: usize) -> usize {
    (d / 2).div_ceil(MICRO_MAX) * MICRO_MAX
}

/// `C (=|+=) op(A) * op(B)` for `A: m x k`, `B: k x n`, using dot-product
/// micro-kernels.
///
/// # Safety
/// All three descriptors must address matrices of the given sizes, and `c`
/// must not overlap `a` or `b`.
#[allow(clippy::too_many_arguments)]
pub(crate) unsafe fn rcc_block<Md, Ta, Tb, Tc, Ca, Cb>(
    md: Md,
    m: usize,
    n: usize,
    k: usize,
    block_k: usize,
    a: RawMat<Ta, Ca>,
    b: RawMat<Tb, Cb>,
    c: RawMatMut<Tc>,
) where
    Md: AddMode,
    Ta: OkTypes<Tb, Tc>,
    Tb: Scalar,
    Tc: Scalar,
    Ca: ElementOp<Ta>,
    Cb: ElementOp<Tb>,
{
    debug_assert!(m > 0 && n > 0 && block_k > 0);
    if k > block_k {
        let k1 = k / 2;
        rcc_block(md, m, n, k1, block_k, a, b, c);
        rcc_block(Accumulate, m, n, k - k1, block_k, a.shift(0, k1), b.shift(k1, 0), c);
    } else if m > MICRO_MAX && (m >= n || n <= MICRO_MAX) {
        let m1 = split_point(m);
        rcc_block(md, m1, n, k, block_k, a, b, c);
        rcc_block(md, m - m1, n, k, block_k, a.shift(m1, 0), b, c.shift(m1, 0));
    } else if n > MICRO_MAX {
        let n1 = split_point(n);
        rcc_block(md, m, n1, k, block_k, a, b, c);
        rcc_block(md, m, n - n1, k, block_k, a, b.shift(0, n1), c.shift(0, n1));
    } else {
        micro_dispatch(md, m, n, k, a, b, c);
    }
}

/// `MR x NR` block of `C` from `MR` rows of `A` and `NR` columns of `B`,
/// with one independent accumulator per output element.
///
/// # Safety
/// See [`rcc_block`].
#[inline(always)]
unsafe fn micro_kernel<Md, Ta, Tb, Tc, Ca, Cb, const MR: usize, const NR: usize>(
    k: usize,
    a: RawMat<Ta, Ca>,
    b: RawMat<Tb, Cb>,
    c: RawMatMut<Tc>,
) where
    Md: AddMode,
    Ta: OkTypes<Tb, Tc>,
    Tb: Scalar,
    Tc: Scalar,
    Ca: ElementOp<Ta>,
    Cb: ElementOp<Tb>,
{
    let mut acc = [[<Ta as OkTypes<Tb, Tc>>::Prod::zero(); NR]; MR];
    for p in 0..k {
        let mut bp = [Tb::zero(); NR];
        for (j, bj) in bp.iter_mut().enumerate() {
            *bj = b.read(p, j);
        }
        for (i, row) in acc.iter_mut().enumerate() {
            let aip = a.read(i, p);
            for (cij, &bj) in row.iter_mut().zip(bp.iter()) {
                *cij = *cij + <Ta as OkTypes<Tb, Tc>>::mul_prod(aip, bj);
            }
        }
    }
    for (i, row) in acc.iter().enumerate() {
        for (j, &v) in row.iter().enumerate() {
            store_raw::<Md, Tc>(c.at(i, j), <Ta as OkTypes<Tb, Tc>>::lift_prod(v));
        }
    }
}

/// Plain dot-product loop for leaf shapes outside `1..=MICRO_MAX`.
///
/// # Safety
/// See [`rcc_block`].
unsafe fn leaf_block<Md, Ta, Tb, Tc, Ca, Cb>(
    m: usize,
    n: usize,
    k: usize,
    a: RawMat<Ta, Ca>,
    b: RawMat<Tb, Cb>,
    c: RawMatMut<Tc>,
) where
    Md: AddMode,
    Ta: OkTypes<Tb, Tc>,
    Tb: Scalar,
    Tc: Scalar,
    Ca: ElementOp<Ta>,
    Cb: ElementOp<Tb>,
{
    for j in 0..n {
        for i in 0..m {
            let mut sum = <Ta as OkTypes<Tb, Tc>>::Prod::zero();
            for p in 0..k {
                sum = sum + <Ta as OkTypes<Tb, Tc>>::mul_prod(a.read(i, p), b.read(p, j));
            }
            store_raw::<Md, Tc>(c.at(i, j), <Ta as OkTypes<Tb, Tc>>::lift_prod(sum));
        }
    }
}

/// Pick the micro-kernel instantiation for an `m x n` leaf.
///
/// # Safety
/// See [`rcc_block`].
unsafe fn micro_dispatch<Md, Ta, Tb, Tc, Ca, Cb>(
    _md: Md,
    m: usize,
    n: usize,
    k: usize,
    a: RawMat<Ta, Ca>,
    b: RawMat<Tb, Cb>,
    c: RawMatMut<Tc>,
) where
    Md: AddMode,
    Ta: OkTypes<Tb, Tc>,
    Tb: Scalar,
    Tc: Scalar,
    Ca: ElementOp<Ta>,
    Cb: ElementOp<Tb>,
{
    macro_rules! shapes {
        ($(($mr:literal, $nr:literal)),* $(,)?) => {
            match (m, n) {
                $(($mr, $nr) => micro_kernel::<Md, Ta, Tb, Tc, Ca, Cb, $mr, $nr>(k, a, b, c),)*
                _ => leaf_block::<Md, Ta, Tb, Tc, Ca, Cb>(m, n, k, a, b, c),
            }
        };
    }
    shapes!(
        (1, 1), (1, 2), (1, 3), (1, 4),
        (2, 1), (2, 2), (2, 3), (2, 4),
        (3, 1), (3, 2), (3, 3), (3, 4),
        (4, 1), (4, 2), (4, 3), (4, 4),
    );
}

/// `C += op(A) * op(B)` as a sum of outer products, one column of `A` at a
/// time.
///
/// # Safety
/// See [`rcc_block`].
#[allow(clippy::too_many_arguments)]
pub(crate) unsafe fn crc_block<Ta, Tb, Tc, Ca, Cb>(
    m: usize,
    n: usize,
    k: usize,
    block_k: usize,
    a: RawMat<Ta, Ca>,
    b: RawMat<Tb, Cb>,
    c: RawMatMut<Tc>,
) where
    Ta: OkTypes<Tb, Tc>,
    Tb: Scalar,
    Tc: Scalar,
    Ca: ElementOp<Ta>,
    Cb: ElementOp<Tb>,
{
    if k > block_k {
        let k1 = k / 2;
        crc_block(m, n, k1, block_k, a, b, c);
        crc_block(m, n, k - k1, block_k, a.shift(0, k1), b.shift(k1, 0), c);
        return;
    }
    for p in 0..k {
        let ap = a.col(p);
        for j in 0..n {
            let s = <Ta as OkTypes<Tb, Tc>>::lift_rhs(b.read(p, j));
            axpy_lhs::<_, Ta, Tb, Tc, Ca>(Accumulate, m, s, ap, c.col(j));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scaling::Assign;
    use tmv_traits::{Conj, Identity};
    use num_complex::Complex64;

    fn naive(m: usize, n: usize, k: usize, a: &[i64], b: &[i64]) -> Vec<i64> {
        // a row-major m x k, b row-major k x n, result column-major
        let mut c = vec![0; m * n];
        for i in 0..m {
            for j in 0..n {
                for p in 0..k {
                    c[i + j * m] += a[i * k + p] * b[p * n + j];
                }
            }
        }
        c
    }

    fn inputs(m: usize, n: usize, k: usize) -> (Vec<i64>, Vec<i64>) {
        let a = (0..m * k).map(|v| (v as i64 * 7 + 3) % 11 - 5).collect();
        let b = (0..k * n).map(|v| (v as i64 * 5 + 1) % 13 - 6).collect();
        (a, b)
    }

    #[test]
    fn test_split_point() {
        assert_eq!(split_point(5), 4);
        assert_eq!(split_point(8), 4);
        assert_eq!(split_point(9), 4);
        assert_eq!(split_point(12), 8);
        assert_eq!(split_point(17), 8);
        assert_eq!(split_point(20), 12);
        for d in MICRO_MAX + 1..64 {
            let s = split_point(d);
            assert!(s > 0 && s < d && s % MICRO_MAX == 0, "d={d} s={s}");
        }
    }

    #[test]
    fn test_rcc_every_leaf_shape() {
        for m in 1..=9 {
            for n in 1..=9 {
                let k = 6;
                let (a, b) = inputs(m, n, k);
                let mut c = vec![99i64; m * n];
                unsafe {
                    rcc_block(
                        Assign,
                        m,
                        n,
                        k,
                        4,
                        RawMat::<i64, Identity>::new(a.as_ptr(), k as isize, 1),
                        RawMat::<i64, Identity>::new(b.as_ptr(), n as isize, 1),
                        RawMatMut::new(c.as_mut_ptr(), 1, m as isize),
                    )
                };
                assert_eq!(c, naive(m, n, k, &a, &b), "m={m} n={n}");
            }
        }
    }

    #[test]
    fn test_crc_accumulates() {
        let (m, n, k) = (5, 3, 9);
        let (a, b) = inputs(m, n, k);
        let mut c = vec![1i64; m * n];
        unsafe {
            crc_block(
                m,
                n,
                k,
                2,
                RawMat::<i64, Identity>::new(a.as_ptr(), k as isize, 1),
                RawMat::<i64, Identity>::new(b.as_ptr(), n as isize, 1),
                RawMatMut::new(c.as_mut_ptr(), 1, m as isize),
            )
        };
        let expect: Vec<i64> = naive(m, n, k, &a, &b).into_iter().map(|v| v + 1).collect();
        assert_eq!(c, expect);
    }

    #[test]
    fn test_micro_kernel_conj() {
        let a = [Complex64::new(1.0, 2.0), Complex64::new(0.0, -1.0)];
        let b = [Complex64::new(3.0, 0.0), Complex64::new(1.0, 1.0)];
        let mut c = [Complex64::new(0.0, 0.0)];
        unsafe {
            micro_kernel::<Assign, Complex64, Complex64, Complex64, Conj, Identity, 1, 1>(
                2,
                RawMat::new(a.as_ptr(), 2, 1),
                RawMat::new(b.as_ptr(), 1, 1),
                RawMatMut::new(c.as_mut_ptr(), 1, 1),
            )
        };
        // (1-2i)*3 + (i)(1+i) = 3-6i + i - 1
        assert_eq!(c[0], Complex64::new(2.0, -5.0));
    }
}

//! Runtime-size `C (=|+=) alpha * op(A) * op(B)`.
//!
//! `C` is cut into square tiles ([`tiling`](crate::tiling)). Each tile is
//! computed into a private column-major buffer by the recursive block
//! multiply, then written back with `alpha` applied and the requested add
//! mode. Tiles are independent, so with the `parallel` feature large products
//! run them on the rayon pool.

use tmv_traits::{ElementOp, Identity, MulInto, OkTypes, Scalar};
use tmv_view::{MatrixView, MatrixViewMut, Result, StorageOrder, TmvError};

use crate::config::MultMMConfig;
use crate::dispatch_scale;
use crate::mult_xm::{plan_traversal, run_traversal};
use crate::raw::{RawMat, RawMatMut};
use crate::rcc::{crc_block, rcc_block};
use crate::scaling::{Accumulate, AddMode, Assign, Scaling};
use crate::tiling::{num_blocks, tiles_in_task_order, Tile};

/// Inner algorithm used for every tile of a runtime multiply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MultMMAlgo {
    /// Rows of `A` times columns of `B` (dot-product micro-kernels).
    Rcc,
    /// Columns of `A` times rows of `B` (outer products).
    Crc,
}

/// Pick the tile algorithm from the storage orders of `A` and `B`.
///
/// The tile buffer is always column-major, so the order of `C` does not
/// take part.
pub fn select_mult_mm_algo(a_order: StorageOrder, b_order: StorageOrder) -> MultMMAlgo {
    match (a_order, b_order) {
        (StorageOrder::ColMajor, StorageOrder::RowMajor) => MultMMAlgo::Crc,
        _ => MultMMAlgo::Rcc,
    }
}

/// Operands shared by every tile of one call.
struct Plan<Ta, Tb, Ca, Cb> {
    algo: MultMMAlgo,
    k: usize,
    block_k: usize,
    a: RawMat<Ta, Ca>,
    b: RawMat<Tb, Cb>,
}

impl<Ta, Tb, Ca, Cb> Clone for Plan<Ta, Tb, Ca, Cb> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Ta, Tb, Ca, Cb> Copy for Plan<Ta, Tb, Ca, Cb> {}

/// Compute one tile into `buf`, then write `tile (=|+=) sc * buf`.
fn run_tile<Md, Sc, Ta, Tb, Tc, Ca, Cb>(
    md: Md,
    sc: Sc,
    plan: Plan<Ta, Tb, Ca, Cb>,
    buf: &mut Vec<Tc>,
    tile: Tile<'_, Tc>,
) where
    Md: AddMode,
    Sc: Scaling<Tc>,
    Ta: OkTypes<Tb, Tc>,
    Tb: Scalar,
    Tc: Scalar,
    Ca: ElementOp<Ta>,
    Cb: ElementOp<Tb>,
{
    let Tile { i0, j0, mut view } = tile;
    let (mb, nb) = (view.nrows(), view.ncols());
    debug_assert!(mb > 0 && nb > 0);
    buf.clear();
    buf.resize(mb * nb, Tc::zero());
    let tmp = RawMatMut::new(buf.as_mut_ptr(), 1, mb as isize);
    let a = plan.a.shift(i0, 0);
    let b = plan.b.shift(0, j0);

    // SAFETY: the plan addresses the full `m x k` and `k x n` operands, so the
    // shifted descriptors cover `mb x k` and `k x nb`. `buf` holds `mb * nb`
    // elements and belongs to this tile alone.
    unsafe {
        match plan.algo {
            MultMMAlgo::Rcc => rcc_block(Assign, mb, nb, plan.k, plan.block_k, a, b, tmp),
            MultMMAlgo::Crc => crc_block(mb, nb, plan.k, plan.block_k, a, b, tmp),
        }
    }

    let dst = RawMatMut::from_view(&mut view);
    let traversal = plan_traversal([mb, nb], [1, mb as isize], [dst.rs, dst.cs]);
    // SAFETY: `view` is an exclusive `mb x nb` view, `buf` a separate
    // allocation of the same shape.
    unsafe { run_traversal(md, sc, traversal, mb, nb, tmp.as_const::<Identity>(), dst) };
}

fn run_tiles<Md, Sc, Ta, Tb, Tc, Ca, Cb>(
    md: Md,
    sc: Sc,
    plan: Plan<Ta, Tb, Ca, Cb>,
    tiles: Vec<Tile<'_, Tc>>,
    parallel: bool,
) where
    Md: AddMode,
    Sc: Scaling<Tc>,
    Ta: OkTypes<Tb, Tc>,
    Tb: Scalar,
    Tc: Scalar,
    Ca: ElementOp<Ta>,
    Cb: ElementOp<Tb>,
{
    #[cfg(feature = "parallel")]
    if parallel {
        use rayon::prelude::*;
        tiles
            .into_par_iter()
            .for_each_init(Vec::new, |buf, tile| run_tile(md, sc, plan, buf, tile));
        return;
    }
    #[cfg(not(feature = "parallel"))]
    let _ = parallel;

    let mut buf = Vec::new();
    for tile in tiles {
        run_tile(md, sc, plan, &mut buf, tile);
    }
}

fn mult_mm_impl<Md, S, Ta, Tb, Tc, Ca, Cb>(
    md: Md,
    alpha: S,
    a: &MatrixView<'_, Ta, Ca>,
    b: &MatrixView<'_, Tb, Cb>,
    c: &mut MatrixViewMut<'_, Tc>,
    config: MultMMConfig,
) -> Result<MultMMAlgo>
where
    Md: AddMode,
    S: Scalar + MulInto<Tc>,
    Ta: OkTypes<Tb, Tc>,
    Tb: Scalar,
    Tc: Scalar,
    Ca: ElementOp<Ta>,
    Cb: ElementOp<Tb>,
{
    let (m, n, k) = (c.nrows(), c.ncols(), a.ncols());
    if a.nrows() != m || b.ncols() != n || b.nrows() != k {
        return Err(TmvError::ShapeMismatch(
            vec![a.nrows(), a.ncols(), b.nrows(), b.ncols()],
            vec![m, k, k, n],
        ));
    }
    let algo = select_mult_mm_algo(a.storage_order(), b.storage_order());
    if m == 0 || n == 0 {
        return Ok(algo);
    }
    if k == 0 {
        if !Md::ADD {
            c.fill(Tc::zero());
        }
        return Ok(algo);
    }

    let config = config.normalized();
    let ntiles = num_blocks(m, config.block_mn) * num_blocks(n, config.block_mn);
    let parallel = config.parallel
        && cfg!(feature = "parallel")
        && ntiles > 1
        && m.saturating_mul(n).saturating_mul(k) >= config.min_parallel_len;
    log::trace!(
        "mult_mm {}x{}x{} add={}: {:?}, {} tiles, parallel={}",
        m,
        n,
        k,
        Md::ADD,
        algo,
        ntiles,
        parallel
    );

    #[cfg(feature = "xdebug")]
    let before = tmv_view::Matrix::from_fn(m, n, StorageOrder::ColMajor, |i, j| c.get([i, j]));

    let plan = Plan {
        algo,
        k,
        block_k: config.block_k,
        a: RawMat::from_view(a),
        b: RawMat::from_view(b),
    };
    let tiles = tiles_in_task_order(c.reborrow(), config.block_mn);
    dispatch_scale!(alpha, |sc| run_tiles(md, sc, plan, tiles, parallel));

    #[cfg(feature = "xdebug")]
    xdebug_check(alpha, a, b, Md::ADD, before, c);

    Ok(algo)
}

/// Recompute the product with [`naive_mult_mm`](crate::reference::naive_mult_mm)
/// and panic if the blocked result disagrees.
#[cfg(feature = "xdebug")]
fn xdebug_check<S, Ta, Tb, Tc, Ca, Cb>(
    alpha: S,
    a: &MatrixView<'_, Ta, Ca>,
    b: &MatrixView<'_, Tb, Cb>,
    add: bool,
    mut expected: tmv_view::Matrix<Tc>,
    c: &MatrixViewMut<'_, Tc>,
) where
    S: Scalar + MulInto<Tc>,
    Ta: OkTypes<Tb, Tc>,
    Tb: Scalar,
    Tc: Scalar,
    Ca: ElementOp<Ta>,
    Cb: ElementOp<Tb>,
{
    if let Err(e) = crate::reference::naive_mult_mm(alpha, a, b, add, &mut expected.view_mut()) {
        panic!("xdebug: reference multiply failed: {e}");
    }
    for j in 0..c.ncols() {
        for i in 0..c.nrows() {
            let got = c.get([i, j]);
            let want = expected.get(i, j);
            let tol = 1e-4 * (1.0 + want.norm1());
            if (got - want).norm1() > tol {
                log::error!("xdebug: mult_mm mismatch at ({}, {})", i, j);
                panic!("xdebug: mult_mm ({i}, {j}) = {got:?}, reference = {want:?}");
            }
        }
    }
}

/// `C = alpha * op(A) * op(B)`. Returns the tile algorithm that ran.
///
/// ```
/// use tmv_kernel::mult_mm;
/// use tmv_view::{Matrix, StorageOrder};
///
/// let a = Matrix::from_row_major_slice(2, 2, StorageOrder::RowMajor, &[1.0f64, 2.0, 3.0, 4.0]).unwrap();
/// let b = Matrix::from_row_major_slice(2, 2, StorageOrder::ColMajor, &[5.0f64, 6.0, 7.0, 8.0]).unwrap();
/// let mut c = Matrix::<f64>::zeros(2, 2, StorageOrder::RowMajor);
/// mult_mm(1.0f64, &a.view(), &b.view(), &mut c.view_mut()).unwrap();
/// assert_eq!(c.to_row_major_vec(), vec![19.0, 22.0, 43.0, 50.0]);
/// ```
pub fn mult_mm<S, Ta, Tb, Tc, Ca, Cb>(
    alpha: S,
    a: &MatrixView<'_, Ta, Ca>,
    b: &MatrixView<'_, Tb, Cb>,
    c: &mut MatrixViewMut<'_, Tc>,
) -> Result<MultMMAlgo>
where
    S: Scalar + MulInto<Tc>,
    Ta: OkTypes<Tb, Tc>,
    Tb: Scalar,
    Tc: Scalar,
    Ca: ElementOp<Ta>,
    Cb: ElementOp<Tb>,
{
    mult_mm_impl(Assign, alpha, a, b, c, MultMMConfig::default())
}

/// `C += alpha * op(A) * op(B)`. Returns the tile algorithm that ran.
pub fn add_mult_mm<S, Ta, Tb, Tc, Ca, Cb>(
    alpha: S,
    a: &MatrixView<'_, Ta, Ca>,
    b: &MatrixView<'_, Tb, Cb>,
    c: &mut MatrixViewMut<'_, Tc>,
) -> Result<MultMMAlgo>
where
    S: Scalar + MulInto<Tc>,
    Ta: OkTypes<Tb, Tc>,
    Tb: Scalar,
    Tc: Scalar,
    Ca: ElementOp<Ta>,
    Cb: ElementOp<Tb>,
{
    mult_mm_impl(Accumulate, alpha, a, b, c, MultMMConfig::default())
}

/// [`mult_mm`] / [`add_mult_mm`] with explicit block sizes and threading.
pub fn mult_mm_with_config<S, Ta, Tb, Tc, Ca, Cb>(
    alpha: S,
    a: &MatrixView<'_, Ta, Ca>,
    b: &MatrixView<'_, Tb, Cb>,
    add: bool,
    c: &mut MatrixViewMut<'_, Tc>,
    config: MultMMConfig,
) -> Result<MultMMAlgo>
where
    S: Scalar + MulInto<Tc>,
    Ta: OkTypes<Tb, Tc>,
    Tb: Scalar,
    Tc: Scalar,
    Ca: ElementOp<Ta>,
    Cb: ElementOp<Tb>,
{
    if add {
        mult_mm_impl(Accumulate, alpha, a, b, c, config)
    } else {
        mult_mm_impl(Assign, alpha, a, b, c, config)
    }
}

/// `C (=|+=) alpha * op(A) * op(B)` with conjugation chosen at runtime.
///
/// Each flag selects the conjugating instantiation of the kernel, so the
/// operands are never copied.
pub fn mult_mm_conj<T: Scalar>(
    alpha: T,
    a: &MatrixView<'_, T>,
    conj_a: bool,
    b: &MatrixView<'_, T>,
    conj_b: bool,
    add: bool,
    c: &mut MatrixViewMut<'_, T>,
) -> Result<MultMMAlgo> {
    let config = MultMMConfig::default();
    match (conj_a, conj_b) {
        (false, false) => mult_mm_with_config(alpha, a, b, add, c, config),
        (true, false) => mult_mm_with_config(alpha, &a.conj(), b, add, c, config),
        (false, true) => mult_mm_with_config(alpha, a, &b.conj(), add, c, config),
        (true, true) => mult_mm_with_config(alpha, &a.conj(), &b.conj(), add, c, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::naive_mult_mm;
    use approx::assert_relative_eq;
    use num_complex::Complex64;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use tmv_view::Matrix;

    fn random_i64(rng: &mut StdRng, m: usize, n: usize, order: StorageOrder) -> Matrix<i64> {
        Matrix::from_fn(m, n, order, |_, _| rng.gen_range(-9..=9))
    }

    #[test]
    fn test_algo_selection() {
        use StorageOrder::*;
        assert_eq!(select_mult_mm_algo(ColMajor, RowMajor), MultMMAlgo::Crc);
        assert_eq!(select_mult_mm_algo(RowMajor, ColMajor), MultMMAlgo::Rcc);
        assert_eq!(select_mult_mm_algo(RowMajor, RowMajor), MultMMAlgo::Rcc);
        assert_eq!(select_mult_mm_algo(ColMajor, ColMajor), MultMMAlgo::Rcc);
        assert_eq!(select_mult_mm_algo(NoMajor, RowMajor), MultMMAlgo::Rcc);
    }

    #[test]
    fn test_matches_reference_all_orders() {
        use StorageOrder::*;
        let mut rng = StdRng::seed_from_u64(7);
        let (m, n, k) = (37, 29, 45);
        for oa in [RowMajor, ColMajor] {
            for ob in [RowMajor, ColMajor] {
                for oc in [RowMajor, ColMajor] {
                    let a = random_i64(&mut rng, m, k, oa);
                    let b = random_i64(&mut rng, k, n, ob);
                    let c0 = random_i64(&mut rng, m, n, oc);

                    let mut got = c0.clone();
                    let mut want = c0.clone();
                    let config = MultMMConfig::sequential().with_blocks(8, 5);
                    let algo =
                        mult_mm_with_config(3i64, &a.view(), &b.view(), true, &mut got.view_mut(), config)
                            .unwrap();
                    naive_mult_mm(3i64, &a.view(), &b.view(), true, &mut want.view_mut()).unwrap();
                    assert_eq!(algo, select_mult_mm_algo(oa, ob));
                    assert_eq!(got.to_row_major_vec(), want.to_row_major_vec(), "{oa:?} {ob:?} {oc:?}");
                }
            }
        }
    }

    #[test]
    fn test_block_sizes_do_not_change_result() {
        let mut rng = StdRng::seed_from_u64(11);
        let a = random_i64(&mut rng, 23, 40, StorageOrder::RowMajor);
        let b = random_i64(&mut rng, 40, 17, StorageOrder::ColMajor);
        let mut first = Matrix::<i64>::zeros(23, 17, StorageOrder::ColMajor);
        mult_mm(-1i64, &a.view(), &b.view(), &mut first.view_mut()).unwrap();
        for (bk, bmn) in [(1, 1), (3, 7), (16, 4), (1000, 1000)] {
            let mut c = Matrix::<i64>::zeros(23, 17, StorageOrder::ColMajor);
            let config = MultMMConfig::sequential().with_blocks(bk, bmn);
            mult_mm_with_config(-1i64, &a.view(), &b.view(), false, &mut c.view_mut(), config).unwrap();
            assert_eq!(c.to_row_major_vec(), first.to_row_major_vec(), "blocks ({bk}, {bmn})");
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut rng = StdRng::seed_from_u64(3);
        let a = random_i64(&mut rng, 70, 50, StorageOrder::ColMajor);
        let b = random_i64(&mut rng, 50, 66, StorageOrder::RowMajor);
        let mut seq = Matrix::<i64>::zeros(70, 66, StorageOrder::RowMajor);
        let mut par = Matrix::<i64>::zeros(70, 66, StorageOrder::RowMajor);
        mult_mm_with_config(2i64, &a.view(), &b.view(), false, &mut seq.view_mut(), MultMMConfig::sequential())
            .unwrap();
        let config = MultMMConfig {
            parallel: true,
            min_parallel_len: 0,
            ..MultMMConfig::default()
        };
        mult_mm_with_config(2i64, &a.view(), &b.view(), false, &mut par.view_mut(), config).unwrap();
        assert_eq!(seq.to_row_major_vec(), par.to_row_major_vec());
    }

    #[test]
    fn test_degenerate_sizes() {
        let a = Matrix::<f64>::zeros(3, 0, StorageOrder::RowMajor);
        let b = Matrix::<f64>::zeros(0, 2, StorageOrder::RowMajor);
        let mut c = Matrix::from_row_major_slice(3, 2, StorageOrder::RowMajor, &[1.0f64; 6]).unwrap();
        add_mult_mm(2.0f64, &a.view(), &b.view(), &mut c.view_mut()).unwrap();
        assert_eq!(c.to_row_major_vec(), vec![1.0; 6]);
        mult_mm(2.0f64, &a.view(), &b.view(), &mut c.view_mut()).unwrap();
        assert_eq!(c.to_row_major_vec(), vec![0.0; 6]);

        let a = Matrix::<f64>::zeros(0, 4, StorageOrder::RowMajor);
        let b = Matrix::<f64>::zeros(4, 2, StorageOrder::RowMajor);
        let mut c = Matrix::<f64>::zeros(0, 2, StorageOrder::RowMajor);
        mult_mm(1.0f64, &a.view(), &b.view(), &mut c.view_mut()).unwrap();
    }

    #[test]
    fn test_shape_mismatch() {
        let a = Matrix::<f64>::zeros(3, 4, StorageOrder::RowMajor);
        let b = Matrix::<f64>::zeros(5, 2, StorageOrder::RowMajor);
        let mut c = Matrix::<f64>::zeros(3, 2, StorageOrder::RowMajor);
        let err = mult_mm(1.0f64, &a.view(), &b.view(), &mut c.view_mut()).unwrap_err();
        assert!(matches!(err, TmvError::ShapeMismatch(..)));
    }

    #[test]
    fn test_mixed_real_complex() {
        let mut rng = StdRng::seed_from_u64(5);
        let a = Matrix::from_fn(9, 6, StorageOrder::RowMajor, |_, _| rng.gen_range(-1.0..1.0));
        let b = Matrix::from_fn(6, 7, StorageOrder::ColMajor, |_, _| {
            Complex64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0))
        });
        let alpha = Complex64::new(0.5, -2.0);
        let mut got = Matrix::<Complex64>::zeros(9, 7, StorageOrder::ColMajor);
        let mut want = Matrix::<Complex64>::zeros(9, 7, StorageOrder::ColMajor);
        mult_mm::<_, f64, Complex64, Complex64, _, _>(alpha, &a.view(), &b.view(), &mut got.view_mut())
            .unwrap();
        naive_mult_mm::<_, f64, Complex64, Complex64, _, _>(alpha, &a.view(), &b.view(), false, &mut want.view_mut())
            .unwrap();
        for (g, w) in got.data().iter().zip(want.data()) {
            assert_relative_eq!(*g, *w, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_conj_flags() {
        let a = Matrix::from_row_major_slice(
            1,
            2,
            StorageOrder::RowMajor,
            &[Complex64::new(1.0, 1.0), Complex64::new(0.0, 2.0)],
        )
        .unwrap();
        let b = Matrix::from_row_major_slice(
            2,
            1,
            StorageOrder::ColMajor,
            &[Complex64::new(2.0, 0.0), Complex64::new(1.0, -1.0)],
        )
        .unwrap();
        let one = Complex64::new(1.0, 0.0);
        let mut c = Matrix::<Complex64>::zeros(1, 1, StorageOrder::ColMajor);
        for (ca, cb) in [(false, false), (true, false), (false, true), (true, true)] {
            mult_mm_conj(one, &a.view(), ca, &b.view(), cb, false, &mut c.view_mut()).unwrap();
            let mut sum = Complex64::new(0.0, 0.0);
            for p in 0..2 {
                let x = if ca { a.get(0, p).conj() } else { a.get(0, p) };
                let y = if cb { b.get(p, 0).conj() } else { b.get(p, 0) };
                sum += x * y;
            }
            assert_eq!(c.get(0, 0), sum, "conj ({ca}, {cb})");
        }
    }
}

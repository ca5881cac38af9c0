//! Storage order, at runtime and at the type level.

/// Which index of a 2-D buffer varies fastest in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StorageOrder {
    /// Consecutive elements of a row are adjacent (`stepj == 1`).
    RowMajor,
    /// Consecutive elements of a column are adjacent (`stepi == 1`).
    ColMajor,
    /// Neither stride is 1.
    #[default]
    NoMajor,
}

impl StorageOrder {
    /// Classify a 2-D layout from its dimensions and strides.
    ///
    /// `stepi` is the distance between consecutive rows, `stepj` between
    /// consecutive columns. When both strides are 1 (single row or column)
    /// column-major wins.
    pub fn from_strides(nrows: usize, ncols: usize, stepi: isize, stepj: isize) -> Self {
        if stepi == 1 && (ncols <= 1 || stepj.unsigned_abs() >= nrows) {
            StorageOrder::ColMajor
        } else if stepj == 1 && (nrows <= 1 || stepi.unsigned_abs() >= ncols) {
            StorageOrder::RowMajor
        } else {
            StorageOrder::NoMajor
        }
    }

    /// Storage order of the transposed matrix.
    pub const fn transposed(self) -> Self {
        match self {
            StorageOrder::RowMajor => StorageOrder::ColMajor,
            StorageOrder::ColMajor => StorageOrder::RowMajor,
            StorageOrder::NoMajor => StorageOrder::NoMajor,
        }
    }

    /// Dense `[stepi, stepj]` for an `nrows x ncols` matrix. `NoMajor` is
    /// laid out column-major.
    pub const fn dense_strides(self, nrows: usize, ncols: usize) -> [isize; 2] {
        match self {
            StorageOrder::RowMajor => [ncols as isize, 1],
            StorageOrder::ColMajor | StorageOrder::NoMajor => [1, nrows as isize],
        }
    }

    /// Element offset of `(i, j)` with leading dimension `ld`.
    ///
    /// `i * ld + j` for row-major, `i + j * ld` otherwise.
    #[inline(always)]
    pub const fn offset(self, i: usize, j: usize, ld: usize) -> usize {
        match self {
            StorageOrder::RowMajor => i * ld + j,
            StorageOrder::ColMajor | StorageOrder::NoMajor => i + j * ld,
        }
    }
}

/// Compile-time storage order of a fixed-size matrix.
///
/// Kernels branch on `S::ORDER`; the branch is resolved during
/// monomorphization, so the hot loop never tests the order.
pub trait Order: Copy + Default + Send + Sync + std::fmt::Debug + 'static {
    const ORDER: StorageOrder;
    /// Order of the transposed matrix over the same buffer.
    type Transposed: Order;

    /// Offset of `(i, j)` in a dense `M x N` matrix.
    fn index<const M: usize, const N: usize>(i: usize, j: usize) -> usize;
}

/// Row-major marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowMajor;

/// Column-major marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColMajor;

impl Order for RowMajor {
    const ORDER: StorageOrder = StorageOrder::RowMajor;
    type Transposed = ColMajor;

    #[inline(always)]
    fn index<const M: usize, const N: usize>(i: usize, j: usize) -> usize {
        i * N + j
    }
}

impl Order for ColMajor {
    const ORDER: StorageOrder = StorageOrder::ColMajor;
    type Transposed = RowMajor;

    #[inline(always)]
    fn index<const M: usize, const N: usize>(i: usize, j: usize) -> usize {
        i + j * M
    }
}

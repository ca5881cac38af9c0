//! Blocking thresholds and per-call configuration.

/// Cache-blocking threshold shared by the blocked kernels.
pub const TMV_BLOCKSIZE: usize = 64;

/// Contraction length above which the recursive multiply halves `K`.
pub const MMRCC_BLOCKSIZE_K: usize = 2 * TMV_BLOCKSIZE;

/// Edge length of the output tiles of the runtime multiply.
pub const MMRCC_BLOCKSIZE_MN: usize = TMV_BLOCKSIZE / 2;

/// Fixed-size operands up to this many bytes are traversed with fully
/// unrolled loops.
pub const SMALL_UNROLL_BYTES: usize = 128;

/// Largest edge of a register-blocked micro-kernel.
pub const MICRO_MAX: usize = 4;

/// Minimum `m * n * k` before tiles are handed to the thread pool.
pub const MIN_PARALLEL_LEN: usize = 1 << 15;

/// Tuning knobs for [`mult_mm_with_config`](crate::mult_mm_with_config).
///
/// Every setting changes only performance, never the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultMMConfig {
    /// Recursion halves `K` while it exceeds this (minimum 1).
    pub block_k: usize,
    /// Output tile edge (minimum 1).
    pub block_mn: usize,
    /// Allow tiles to run on the rayon pool (`parallel` feature only).
    pub parallel: bool,
    /// Minimum `m * n * k` for parallel execution.
    pub min_parallel_len: usize,
}

impl Default for MultMMConfig {
    fn default() -> Self {
        Self {
            block_k: MMRCC_BLOCKSIZE_K,
            block_mn: MMRCC_BLOCKSIZE_MN,
            parallel: cfg!(feature = "parallel"),
            min_parallel_len: MIN_PARALLEL_LEN,
        }
    }
}

impl MultMMConfig {
    /// Single-threaded configuration with default block sizes.
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    pub fn with_blocks(mut self, block_k: usize, block_mn: usize) -> Self {
        self.block_k = block_k;
        self.block_mn = block_mn;
        self
    }

    pub(crate) fn normalized(self) -> Self {
        Self {
            block_k: self.block_k.max(1),
            block_mn: self.block_mn.max(1),
            ..self
        }
    }
}

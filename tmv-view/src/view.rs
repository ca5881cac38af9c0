//! Const-rank strided view types.
//!
//! - [`StridedView`]: read-only view with a lazy conjugation flag `Op`
//! - [`StridedViewMut`]: writable view, always read and written as stored
//!
//! A view is a `(pointer, size, strides)` triple borrowed from a buffer.
//! Rank is a const parameter, so size and strides live inline and a view
//! is `Copy` on the read-only side.

use std::marker::PhantomData;

use crate::element_op::{ComposableElementOp, ElementOp, ElementOpApply, Identity};
use crate::storage::StorageOrder;
use crate::{Result, TmvError};

// ============================================================================
// Validation helpers
// ============================================================================

/// Validate that all accessed offsets stay within `[0, len)`.
fn validate_bounds<const N: usize>(
    len: usize,
    size: &[usize; N],
    strides: &[isize; N],
    offset: usize,
) -> Result<()> {
    if offset > len {
        return Err(TmvError::OffsetOverflow);
    }
    if size.iter().any(|&d| d == 0) {
        return Ok(());
    }
    let offset = isize::try_from(offset).map_err(|_| TmvError::OffsetOverflow)?;
    let mut min_offset = offset;
    let mut max_offset = offset;
    for (&dim, &stride) in size.iter().zip(strides.iter()) {
        if dim > 1 {
            let end = stride
                .checked_mul(dim as isize - 1)
                .ok_or(TmvError::OffsetOverflow)?;
            if end >= 0 {
                max_offset = max_offset
                    .checked_add(end)
                    .ok_or(TmvError::OffsetOverflow)?;
            } else {
                min_offset = min_offset
                    .checked_add(end)
                    .ok_or(TmvError::OffsetOverflow)?;
            }
        }
    }
    if min_offset < 0 || max_offset as usize >= len {
        return Err(TmvError::OffsetOverflow);
    }
    Ok(())
}

/// Check that distinct indices address distinct elements.
///
/// Axes of length > 1 are taken in order of increasing `|stride|`; each
/// stride must exceed the largest offset reachable through the shorter
/// strides before it.
pub(crate) fn check_writable_strides<const N: usize>(
    size: &[usize; N],
    strides: &[isize; N],
) -> Result<()> {
    let mut axes = [(0usize, 0usize); N];
    let mut count = 0;
    for (dim, (&d, &s)) in size.iter().zip(strides.iter()).enumerate() {
        if d > 1 {
            if s == 0 {
                return Err(TmvError::ZeroStride { dim });
            }
            axes[count] = (s.unsigned_abs(), d);
            count += 1;
        }
    }
    let axes = &mut axes[..count];
    axes.sort_unstable();
    let mut reach = 0usize;
    for &(s, d) in axes.iter() {
        if s <= reach {
            return Err(TmvError::InvalidLayout("overlapping strides in a writable view"));
        }
        reach = s
            .checked_mul(d - 1)
            .and_then(|e| reach.checked_add(e))
            .ok_or(TmvError::OffsetOverflow)?;
    }
    Ok(())
}

#[inline(always)]
fn linear_offset<const N: usize>(index: &[usize; N], strides: &[isize; N]) -> isize {
    let mut off = 0isize;
    for k in 0..N {
        off += index[k] as isize * strides[k];
    }
    off
}

fn check_index<const N: usize>(index: &[usize; N], size: &[usize; N]) {
    for k in 0..N {
        assert!(
            index[k] < size[k],
            "index {:?} out of bounds for size {:?}",
            index,
            size
        );
    }
}

/// Byte address range `[lo, hi)` touched by a view, `None` when empty.
fn byte_span<T, const N: usize>(
    ptr: *const T,
    size: &[usize; N],
    strides: &[isize; N],
) -> Option<(usize, usize)> {
    if size.iter().any(|&d| d == 0) {
        return None;
    }
    let mut lo = 0isize;
    let mut hi = 0isize;
    for (&d, &s) in size.iter().zip(strides.iter()) {
        let end = s * (d as isize - 1);
        if end >= 0 {
            hi += end;
        } else {
            lo += end;
        }
    }
    let elem = std::mem::size_of::<T>().max(1) as isize;
    let base = ptr as usize as isize;
    Some(((base + lo * elem) as usize, (base + (hi + 1) * elem) as usize))
}

fn spans_overlap(a: Option<(usize, usize)>, b: Option<(usize, usize)>) -> bool {
    match (a, b) {
        (Some((alo, ahi)), Some((blo, bhi))) => alo < bhi && blo < ahi,
        _ => false,
    }
}

fn can_linearize_2d(size: &[usize; 2], strides: &[isize; 2]) -> bool {
    let [m, n] = *size;
    let [si, sj] = *strides;
    if m * n <= 1 {
        return true;
    }
    (si == 1 && (n == 1 || sj == m as isize)) || (sj == 1 && (m == 1 || si == n as isize))
}

fn sub_range_check(
    size: &[usize; 2],
    i0: usize,
    i1: usize,
    j0: usize,
    j1: usize,
) -> Result<()> {
    if i0 > i1 || j0 > j1 || i1 > size[0] || j1 > size[1] {
        return Err(TmvError::OutOfBounds {
            index: vec![i0, i1, j0, j1],
            size: size.to_vec(),
        });
    }
    Ok(())
}

// ============================================================================
// StridedView
// ============================================================================

/// Read-only strided view of rank `N`.
///
/// # Type Parameters
/// - `'a`: Lifetime of the underlying data
/// - `T`: Element type
/// - `N`: Rank (1 for vectors, 2 for matrices)
/// - `Op`: Conjugation applied on every read (default: `Identity`)
pub struct StridedView<'a, T, const N: usize, Op = Identity> {
    ptr: *const T,
    size: [usize; N],
    strides: [isize; N],
    _marker: PhantomData<(&'a [T], Op)>,
}

/// Read-only matrix view.
pub type MatrixView<'a, T, Op = Identity> = StridedView<'a, T, 2, Op>;
/// Read-only vector view.
pub type VectorView<'a, T, Op = Identity> = StridedView<'a, T, 1, Op>;

unsafe impl<T: Sync, const N: usize, Op: Send> Send for StridedView<'_, T, N, Op> {}
unsafe impl<T: Sync, const N: usize, Op: Sync> Sync for StridedView<'_, T, N, Op> {}

impl<T, const N: usize, Op> Clone for StridedView<'_, T, N, Op> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, const N: usize, Op> Copy for StridedView<'_, T, N, Op> {}

impl<T, const N: usize, Op> std::fmt::Debug for StridedView<'_, T, N, Op> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StridedView")
            .field("size", &self.size)
            .field("strides", &self.strides)
            .field("op", &std::any::type_name::<Op>())
            .finish()
    }
}

impl<'a, T, const N: usize> StridedView<'a, T, N, Identity> {
    /// Create a view of `data` starting at `offset`, checking that every
    /// addressed element lies inside `data`. Negative strides are allowed.
    pub fn new(data: &'a [T], size: [usize; N], strides: [isize; N], offset: usize) -> Result<Self> {
        validate_bounds(data.len(), &size, &strides, offset)?;
        Ok(Self {
            ptr: data.as_ptr().wrapping_add(offset),
            size,
            strides,
            _marker: PhantomData,
        })
    }

    /// Create a view from a raw pointer.
    ///
    /// # Safety
    /// Every element addressed by `size` and `strides` from `ptr` must be
    /// valid for reads for `'a`, and must not be written through any other
    /// pointer while the view is alive.
    pub unsafe fn from_raw_parts(ptr: *const T, size: [usize; N], strides: [isize; N]) -> Self {
        Self {
            ptr,
            size,
            strides,
            _marker: PhantomData,
        }
    }
}

impl<'a, T, const N: usize, Op> StridedView<'a, T, N, Op> {
    #[inline]
    pub fn size(&self) -> &[usize; N] {
        &self.size
    }

    #[inline]
    pub fn strides(&self) -> &[isize; N] {
        &self.strides
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.size.iter().product()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size.iter().any(|&d| d == 0)
    }

    /// Raw pointer to element `[0; N]`.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr
    }

    /// Byte addresses `[lo, hi)` spanned by the view, `None` when empty.
    pub fn memory_range(&self) -> Option<(usize, usize)> {
        byte_span(self.ptr, &self.size, &self.strides)
    }

    /// Whether the memory spans of two views intersect.
    ///
    /// This is conservative: interleaved views that never touch the same
    /// element still report `true`.
    pub fn same_storage<U, const M: usize, Op2>(&self, other: &StridedView<'_, U, M, Op2>) -> bool {
        spans_overlap(self.memory_range(), other.memory_range())
    }

    /// Whether two views address exactly the same elements in the same order.
    pub fn exact_same_storage<Op2>(&self, other: &StridedView<'_, T, N, Op2>) -> bool {
        self.ptr == other.ptr && self.size == other.size && self.strides == other.strides
    }

    /// The same view read as stored, dropping any conjugation flag.
    #[inline]
    pub fn as_stored(self) -> StridedView<'a, T, N, Identity> {
        self.with_op()
    }

    #[inline]
    pub(crate) fn with_op<Op2>(self) -> StridedView<'a, T, N, Op2> {
        StridedView {
            ptr: self.ptr,
            size: self.size,
            strides: self.strides,
            _marker: PhantomData,
        }
    }
}

impl<'a, T: ElementOpApply, const N: usize, Op: ComposableElementOp<T>> StridedView<'a, T, N, Op> {
    /// Complex conjugate (flips `Op` without touching the data).
    pub fn conj(self) -> StridedView<'a, T, N, Op::ComposeConj> {
        StridedView {
            ptr: self.ptr,
            size: self.size,
            strides: self.strides,
            _marker: PhantomData,
        }
    }
}

impl<T: Copy, const N: usize, Op: ElementOp<T>> StridedView<'_, T, N, Op> {
    /// Get an element with `Op` applied.
    #[inline]
    pub fn get(&self, index: [usize; N]) -> T {
        check_index(&index, &self.size);
        unsafe { self.get_unchecked(index) }
    }

    /// Get an element without bounds checking.
    ///
    /// # Safety
    /// `index` must be within `size`.
    #[inline(always)]
    pub unsafe fn get_unchecked(&self, index: [usize; N]) -> T {
        Op::apply(*self.ptr.offset(linear_offset(&index, &self.strides)))
    }
}

impl<'a, T, Op> StridedView<'a, T, 2, Op> {
    #[inline]
    pub fn nrows(&self) -> usize {
        self.size[0]
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.size[1]
    }

    /// Distance between consecutive rows.
    #[inline]
    pub fn stepi(&self) -> isize {
        self.strides[0]
    }

    /// Distance between consecutive columns.
    #[inline]
    pub fn stepj(&self) -> isize {
        self.strides[1]
    }

    /// Transpose (swap dims and strides, zero-copy).
    pub fn t(self) -> Self {
        Self {
            ptr: self.ptr,
            size: [self.size[1], self.size[0]],
            strides: [self.strides[1], self.strides[0]],
            _marker: PhantomData,
        }
    }

    /// Row `i` as a vector view.
    pub fn row(&self, i: usize) -> StridedView<'a, T, 1, Op> {
        assert!(i < self.size[0], "row {} out of bounds for {:?}", i, self.size);
        StridedView {
            ptr: self.ptr.wrapping_offset(i as isize * self.strides[0]),
            size: [self.size[1]],
            strides: [self.strides[1]],
            _marker: PhantomData,
        }
    }

    /// Column `j` as a vector view.
    pub fn col(&self, j: usize) -> StridedView<'a, T, 1, Op> {
        assert!(j < self.size[1], "col {} out of bounds for {:?}", j, self.size);
        StridedView {
            ptr: self.ptr.wrapping_offset(j as isize * self.strides[1]),
            size: [self.size[0]],
            strides: [self.strides[0]],
            _marker: PhantomData,
        }
    }

    /// Rows `i0..i1`, columns `j0..j1`.
    pub fn sub_matrix(self, i0: usize, i1: usize, j0: usize, j1: usize) -> Result<Self> {
        sub_range_check(&self.size, i0, i1, j0, j1)?;
        Ok(Self {
            ptr: self
                .ptr
                .wrapping_offset(i0 as isize * self.strides[0] + j0 as isize * self.strides[1]),
            size: [i1 - i0, j1 - j0],
            strides: self.strides,
            _marker: PhantomData,
        })
    }

    pub fn storage_order(&self) -> StorageOrder {
        StorageOrder::from_strides(self.size[0], self.size[1], self.strides[0], self.strides[1])
    }

    /// Whether the elements form one contiguous run with unit stride.
    pub fn can_linearize(&self) -> bool {
        can_linearize_2d(&self.size, &self.strides)
    }
}

impl<'a, T> StridedView<'a, T, 1, Identity> {
    /// Contiguous vector over a slice.
    pub fn from_slice(data: &'a [T]) -> Self {
        Self {
            ptr: data.as_ptr(),
            size: [data.len()],
            strides: [1],
            _marker: PhantomData,
        }
    }
}

// ============================================================================
// StridedViewMut
// ============================================================================

/// Writable strided view of rank `N`.
///
/// Splitting consumes the view and returns disjoint halves, so two live
/// mutable views never address the same element.
pub struct StridedViewMut<'a, T, const N: usize> {
    ptr: *mut T,
    size: [usize; N],
    strides: [isize; N],
    _marker: PhantomData<&'a mut [T]>,
}

/// Writable matrix view.
pub type MatrixViewMut<'a, T> = StridedViewMut<'a, T, 2>;
/// Writable vector view.
pub type VectorViewMut<'a, T> = StridedViewMut<'a, T, 1>;

unsafe impl<T: Send, const N: usize> Send for StridedViewMut<'_, T, N> {}
unsafe impl<T: Sync, const N: usize> Sync for StridedViewMut<'_, T, N> {}

impl<T, const N: usize> std::fmt::Debug for StridedViewMut<'_, T, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StridedViewMut")
            .field("size", &self.size)
            .field("strides", &self.strides)
            .finish()
    }
}

impl<'a, T, const N: usize> StridedViewMut<'a, T, N> {
    /// Create a writable view of `data` starting at `offset`.
    ///
    /// Besides the bounds check, the strides must map distinct indices to
    /// distinct elements: no zero stride on a dimension longer than 1, and
    /// no pair like `[1, 1]` on a `4 x 4` view.
    pub fn new(
        data: &'a mut [T],
        size: [usize; N],
        strides: [isize; N],
        offset: usize,
    ) -> Result<Self> {
        validate_bounds(data.len(), &size, &strides, offset)?;
        check_writable_strides(&size, &strides)?;
        Ok(Self {
            ptr: data.as_mut_ptr().wrapping_add(offset),
            size,
            strides,
            _marker: PhantomData,
        })
    }

    /// Create a writable view from a raw pointer.
    ///
    /// # Safety
    /// Every element addressed by `size` and `strides` from `ptr` must be
    /// valid for reads and writes for `'a`, distinct indices must address
    /// distinct elements, and no other pointer may access them while the
    /// view is alive.
    pub unsafe fn from_raw_parts(ptr: *mut T, size: [usize; N], strides: [isize; N]) -> Self {
        Self {
            ptr,
            size,
            strides,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn size(&self) -> &[usize; N] {
        &self.size
    }

    #[inline]
    pub fn strides(&self) -> &[isize; N] {
        &self.strides
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.size.iter().product()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size.iter().any(|&d| d == 0)
    }

    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr
    }

    pub fn memory_range(&self) -> Option<(usize, usize)> {
        byte_span(self.ptr as *const T, &self.size, &self.strides)
    }

    /// Reborrow as a read-only view.
    pub fn as_view(&self) -> StridedView<'_, T, N, Identity> {
        StridedView {
            ptr: self.ptr as *const T,
            size: self.size,
            strides: self.strides,
            _marker: PhantomData,
        }
    }

    /// Reborrow mutably for a shorter lifetime.
    pub fn reborrow(&mut self) -> StridedViewMut<'_, T, N> {
        StridedViewMut {
            ptr: self.ptr,
            size: self.size,
            strides: self.strides,
            _marker: PhantomData,
        }
    }
}

impl<T: Copy, const N: usize> StridedViewMut<'_, T, N> {
    #[inline]
    pub fn get(&self, index: [usize; N]) -> T {
        check_index(&index, &self.size);
        unsafe { *self.ptr.offset(linear_offset(&index, &self.strides)) }
    }

    #[inline]
    pub fn set(&mut self, index: [usize; N], value: T) {
        check_index(&index, &self.size);
        unsafe {
            *self.ptr.offset(linear_offset(&index, &self.strides)) = value;
        }
    }

    /// Set every element to `value`.
    pub fn fill(&mut self, value: T) {
        if self.is_empty() {
            return;
        }
        let mut index = [0usize; N];
        loop {
            unsafe {
                *self.ptr.offset(linear_offset(&index, &self.strides)) = value;
            }
            // odometer over the index space, last axis fastest
            let mut k = N;
            loop {
                if k == 0 {
                    return;
                }
                k -= 1;
                index[k] += 1;
                if index[k] < self.size[k] {
                    break;
                }
                index[k] = 0;
            }
        }
    }
}

impl<'a, T> StridedViewMut<'a, T, 2> {
    #[inline]
    pub fn nrows(&self) -> usize {
        self.size[0]
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.size[1]
    }

    #[inline]
    pub fn stepi(&self) -> isize {
        self.strides[0]
    }

    #[inline]
    pub fn stepj(&self) -> isize {
        self.strides[1]
    }

    pub fn t(self) -> Self {
        Self {
            ptr: self.ptr,
            size: [self.size[1], self.size[0]],
            strides: [self.strides[1], self.strides[0]],
            _marker: PhantomData,
        }
    }

    /// Split into rows `..i` and rows `i..`.
    pub fn split_at_row(self, i: usize) -> (Self, Self) {
        assert!(i <= self.size[0], "split row {} out of bounds for {:?}", i, self.size);
        let top = Self {
            ptr: self.ptr,
            size: [i, self.size[1]],
            strides: self.strides,
            _marker: PhantomData,
        };
        let bottom = Self {
            ptr: self.ptr.wrapping_offset(i as isize * self.strides[0]),
            size: [self.size[0] - i, self.size[1]],
            strides: self.strides,
            _marker: PhantomData,
        };
        (top, bottom)
    }

    /// Split into columns `..j` and columns `j..`.
    pub fn split_at_col(self, j: usize) -> (Self, Self) {
        assert!(j <= self.size[1], "split col {} out of bounds for {:?}", j, self.size);
        let left = Self {
            ptr: self.ptr,
            size: [self.size[0], j],
            strides: self.strides,
            _marker: PhantomData,
        };
        let right = Self {
            ptr: self.ptr.wrapping_offset(j as isize * self.strides[1]),
            size: [self.size[0], self.size[1] - j],
            strides: self.strides,
            _marker: PhantomData,
        };
        (left, right)
    }

    /// Rows `i0..i1`, columns `j0..j1`.
    pub fn sub_matrix(self, i0: usize, i1: usize, j0: usize, j1: usize) -> Result<Self> {
        sub_range_check(&self.size, i0, i1, j0, j1)?;
        Ok(Self {
            ptr: self
                .ptr
                .wrapping_offset(i0 as isize * self.strides[0] + j0 as isize * self.strides[1]),
            size: [i1 - i0, j1 - j0],
            strides: self.strides,
            _marker: PhantomData,
        })
    }

    pub fn row_mut(&mut self, i: usize) -> StridedViewMut<'_, T, 1> {
        assert!(i < self.size[0], "row {} out of bounds for {:?}", i, self.size);
        StridedViewMut {
            ptr: self.ptr.wrapping_offset(i as isize * self.strides[0]),
            size: [self.size[1]],
            strides: [self.strides[1]],
            _marker: PhantomData,
        }
    }

    pub fn col_mut(&mut self, j: usize) -> StridedViewMut<'_, T, 1> {
        assert!(j < self.size[1], "col {} out of bounds for {:?}", j, self.size);
        StridedViewMut {
            ptr: self.ptr.wrapping_offset(j as isize * self.strides[1]),
            size: [self.size[0]],
            strides: [self.strides[0]],
            _marker: PhantomData,
        }
    }

    pub fn storage_order(&self) -> StorageOrder {
        StorageOrder::from_strides(self.size[0], self.size[1], self.strides[0], self.strides[1])
    }

    pub fn can_linearize(&self) -> bool {
        can_linearize_2d(&self.size, &self.strides)
    }
}

impl<'a, T> StridedViewMut<'a, T, 1> {
    pub fn from_slice(data: &'a mut [T]) -> Self {
        Self {
            size: [data.len()],
            ptr: data.as_mut_ptr(),
            strides: [1],
            _marker: PhantomData,
        }
    }
}

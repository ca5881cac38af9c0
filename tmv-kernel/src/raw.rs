//! `(pointer, stepi, stepj)` triples handed to the hot loops.
//!
//! The view types check bounds and aliasing once at the entry point; below
//! that the kernels work on these raw descriptors.

use std::marker::PhantomData;

use tmv_traits::ElementOp;
use tmv_view::{MatrixView, MatrixViewMut, Result, TmvError, VectorView, VectorViewMut};

/// Fail with `ShapeMismatch` unless both dimension lists agree.
pub(crate) fn ensure_same_shape(a: &[usize], b: &[usize]) -> Result<()> {
    if a != b {
        return Err(TmvError::ShapeMismatch(a.to_vec(), b.to_vec()));
    }
    Ok(())
}

/// Read-only matrix descriptor, read through `Op`.
///
/// `Send` + `Sync` so tiles running on the thread pool can share the
/// operands.
///
/// # Safety
/// Whoever builds one guarantees every addressed element stays valid and
/// unwritten for as long as the descriptor is used.
pub(crate) struct RawMat<T, Op> {
    pub(crate) ptr: *const T,
    pub(crate) rs: isize,
    pub(crate) cs: isize,
    _op: PhantomData<Op>,
}

impl<T, Op> Clone for RawMat<T, Op> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, Op> Copy for RawMat<T, Op> {}

unsafe impl<T: Sync, Op> Send for RawMat<T, Op> {}
unsafe impl<T: Sync, Op> Sync for RawMat<T, Op> {}

impl<T: Copy, Op: ElementOp<T>> RawMat<T, Op> {
    #[inline(always)]
    pub(crate) fn new(ptr: *const T, rs: isize, cs: isize) -> Self {
        Self {
            ptr,
            rs,
            cs,
            _op: PhantomData,
        }
    }

    pub(crate) fn from_view(v: &MatrixView<'_, T, Op>) -> Self {
        Self {
            ptr: v.as_ptr(),
            rs: v.stepi(),
            cs: v.stepj(),
            _op: PhantomData,
        }
    }

    /// Element `(i, j)` with `Op` applied.
    ///
    /// # Safety
    /// `(i, j)` must lie inside the described matrix.
    #[inline(always)]
    pub(crate) unsafe fn read(&self, i: usize, j: usize) -> T {
        Op::apply(*self.ptr.offset(i as isize * self.rs + j as isize * self.cs))
    }

    /// Descriptor of the sub-matrix starting at `(i, j)`.
    #[inline(always)]
    pub(crate) fn shift(&self, i: usize, j: usize) -> Self {
        Self {
            ptr: self
                .ptr
                .wrapping_offset(i as isize * self.rs + j as isize * self.cs),
            ..*self
        }
    }

    /// Row `i` as a 1-D descriptor.
    #[inline(always)]
    pub(crate) fn row(&self, i: usize) -> RawVec<T, Op> {
        RawVec::new(self.ptr.wrapping_offset(i as isize * self.rs), self.cs)
    }

    /// Column `j` as a 1-D descriptor.
    #[inline(always)]
    pub(crate) fn col(&self, j: usize) -> RawVec<T, Op> {
        RawVec::new(self.ptr.wrapping_offset(j as isize * self.cs), self.rs)
    }
}

/// Writable matrix descriptor.
pub(crate) struct RawMatMut<T> {
    pub(crate) ptr: *mut T,
    pub(crate) rs: isize,
    pub(crate) cs: isize,
}

impl<T> Clone for RawMatMut<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for RawMatMut<T> {}

unsafe impl<T: Send> Send for RawMatMut<T> {}
unsafe impl<T: Sync> Sync for RawMatMut<T> {}

impl<T: Copy> RawMatMut<T> {
    pub(crate) fn new(ptr: *mut T, rs: isize, cs: isize) -> Self {
        Self { ptr, rs, cs }
    }

    pub(crate) fn from_view(v: &mut MatrixViewMut<'_, T>) -> Self {
        Self {
            rs: v.stepi(),
            cs: v.stepj(),
            ptr: v.as_mut_ptr(),
        }
    }

    /// Pointer to element `(i, j)`.
    #[inline(always)]
    pub(crate) fn at(&self, i: usize, j: usize) -> *mut T {
        self.ptr
            .wrapping_offset(i as isize * self.rs + j as isize * self.cs)
    }

    #[inline(always)]
    pub(crate) fn shift(&self, i: usize, j: usize) -> Self {
        Self {
            ptr: self.at(i, j),
            ..*self
        }
    }

    #[inline(always)]
    pub(crate) fn row(&self, i: usize) -> RawVecMut<T> {
        RawVecMut::new(self.at(i, 0), self.cs)
    }

    #[inline(always)]
    pub(crate) fn col(&self, j: usize) -> RawVecMut<T> {
        RawVecMut::new(self.at(0, j), self.rs)
    }

    /// The same storage read back as stored.
    #[inline(always)]
    pub(crate) fn as_const<Op>(&self) -> RawMat<T, Op> {
        RawMat {
            ptr: self.ptr as *const T,
            rs: self.rs,
            cs: self.cs,
            _op: PhantomData,
        }
    }
}

/// Read-only 1-D descriptor.
pub(crate) struct RawVec<T, Op> {
    pub(crate) ptr: *const T,
    pub(crate) stride: isize,
    _op: PhantomData<Op>,
}

impl<T, Op> Clone for RawVec<T, Op> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, Op> Copy for RawVec<T, Op> {}

impl<T: Copy, Op: ElementOp<T>> RawVec<T, Op> {
    #[inline(always)]
    pub(crate) fn new(ptr: *const T, stride: isize) -> Self {
        Self {
            ptr,
            stride,
            _op: PhantomData,
        }
    }

    pub(crate) fn from_view(v: &VectorView<'_, T, Op>) -> Self {
        Self::new(v.as_ptr(), v.strides()[0])
    }

    /// # Safety
    /// `i` must lie inside the described vector.
    #[inline(always)]
    pub(crate) unsafe fn read(&self, i: usize) -> T {
        Op::apply(*self.ptr.offset(i as isize * self.stride))
    }
}

/// Writable 1-D descriptor.
pub(crate) struct RawVecMut<T> {
    pub(crate) ptr: *mut T,
    pub(crate) stride: isize,
}

impl<T> Clone for RawVecMut<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for RawVecMut<T> {}

impl<T: Copy> RawVecMut<T> {
    #[inline(always)]
    pub(crate) fn new(ptr: *mut T, stride: isize) -> Self {
        Self { ptr, stride }
    }

    pub(crate) fn from_view(v: &mut VectorViewMut<'_, T>) -> Self {
        Self::new(v.as_mut_ptr(), v.strides()[0])
    }

    #[inline(always)]
    pub(crate) fn at(&self, i: usize) -> *mut T {
        self.ptr.wrapping_offset(i as isize * self.stride)
    }
}

//! Fixed-size matrix views.
//!
//! Dimensions `M x N` and storage order `S` are type parameters, so the
//! kernels built on these views see constant loop bounds and a constant
//! indexing formula.

use std::marker::PhantomData;

use crate::element_op::{ComposableElementOp, ElementOp, ElementOpApply, Identity};
use crate::storage::Order;
use crate::view::{MatrixView, MatrixViewMut, StridedView};
use crate::{Result, TmvError};

fn check_len<const M: usize, const N: usize>(len: usize) -> Result<()> {
    if len != M * N {
        return Err(TmvError::ShapeMismatch(vec![len], vec![M, N]));
    }
    Ok(())
}

fn dense_strides<S: Order, const M: usize, const N: usize>() -> [isize; 2] {
    S::ORDER.dense_strides(M, N)
}

/// Read-only `M x N` matrix stored densely in order `S`, read through `C`.
pub struct SmallMatRef<'a, T, const M: usize, const N: usize, S, C = Identity> {
    data: &'a [T],
    _marker: PhantomData<(S, C)>,
}

impl<T, const M: usize, const N: usize, S, C> Clone for SmallMatRef<'_, T, M, N, S, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, const M: usize, const N: usize, S, C> Copy for SmallMatRef<'_, T, M, N, S, C> {}

impl<'a, T, const M: usize, const N: usize, S: Order> SmallMatRef<'a, T, M, N, S, Identity> {
    /// Wrap a slice of exactly `M * N` elements.
    pub fn new(data: &'a [T]) -> Result<Self> {
        check_len::<M, N>(data.len())?;
        Ok(Self {
            data,
            _marker: PhantomData,
        })
    }
}

impl<'a, T, const M: usize, const N: usize, S: Order, C> SmallMatRef<'a, T, M, N, S, C> {
    #[inline(always)]
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    /// Zero-copy transpose: an `N x M` matrix in the opposite order.
    #[inline]
    pub fn transpose(self) -> SmallMatRef<'a, T, N, M, S::Transposed, C> {
        SmallMatRef {
            data: self.data,
            _marker: PhantomData,
        }
    }

    /// The same matrix as a runtime-size view.
    pub fn as_view(&self) -> MatrixView<'a, T, C> {
        let strides = dense_strides::<S, M, N>();
        // SAFETY: `data` holds M * N elements and the dense strides address
        // exactly those.
        let view: StridedView<'a, T, 2, Identity> =
            unsafe { StridedView::from_raw_parts(self.data.as_ptr(), [M, N], strides) };
        view.with_op::<C>()
    }
}

impl<T: Copy, const M: usize, const N: usize, S: Order, C: ElementOp<T>>
    SmallMatRef<'_, T, M, N, S, C>
{
    /// Element `(i, j)` with `C` applied.
    #[inline(always)]
    pub fn get(&self, i: usize, j: usize) -> T {
        C::apply(self.data[S::index::<M, N>(i, j)])
    }
}

impl<'a, T: ElementOpApply, const M: usize, const N: usize, S: Order, C: ComposableElementOp<T>>
    SmallMatRef<'a, T, M, N, S, C>
{
    pub fn conj(self) -> SmallMatRef<'a, T, M, N, S, C::ComposeConj> {
        SmallMatRef {
            data: self.data,
            _marker: PhantomData,
        }
    }
}

/// Writable `M x N` matrix stored densely in order `S`.
pub struct SmallMatMut<'a, T, const M: usize, const N: usize, S> {
    data: &'a mut [T],
    _marker: PhantomData<S>,
}

impl<'a, T, const M: usize, const N: usize, S: Order> SmallMatMut<'a, T, M, N, S> {
    /// Wrap a slice of exactly `M * N` elements.
    pub fn new(data: &'a mut [T]) -> Result<Self> {
        check_len::<M, N>(data.len())?;
        Ok(Self {
            data,
            _marker: PhantomData,
        })
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[T] {
        self.data
    }

    #[inline(always)]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.data
    }

    pub fn transpose(self) -> SmallMatMut<'a, T, N, M, S::Transposed> {
        SmallMatMut {
            data: self.data,
            _marker: PhantomData,
        }
    }

    /// Reborrow as a read-only fixed-size view.
    pub fn as_small_ref(&self) -> SmallMatRef<'_, T, M, N, S> {
        SmallMatRef {
            data: self.data,
            _marker: PhantomData,
        }
    }

    /// The same matrix as a runtime-size writable view.
    pub fn as_view_mut(&mut self) -> MatrixViewMut<'_, T> {
        let strides = dense_strides::<S, M, N>();
        // SAFETY: `data` holds M * N elements, the dense strides address each
        // exactly once, and the borrow of `self` keeps them exclusive.
        unsafe { MatrixViewMut::from_raw_parts(self.data.as_mut_ptr(), [M, N], strides) }
    }
}

impl<T: Copy, const M: usize, const N: usize, S: Order> SmallMatMut<'_, T, M, N, S> {
    #[inline(always)]
    pub fn get(&self, i: usize, j: usize) -> T {
        self.data[S::index::<M, N>(i, j)]
    }

    #[inline(always)]
    pub fn set(&mut self, i: usize, j: usize, value: T) {
        self.data[S::index::<M, N>(i, j)] = value;
    }

    /// Mutable reference to element `(i, j)`.
    #[inline(always)]
    pub fn at_mut(&mut self, i: usize, j: usize) -> &mut T {
        &mut self.data[S::index::<M, N>(i, j)]
    }
}

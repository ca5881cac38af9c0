//! Owned dense matrix.

use num_traits::Zero;

use crate::storage::StorageOrder;
use crate::view::{MatrixView, MatrixViewMut};
use crate::{Result, TmvError};

/// Owned dense `nrows x ncols` matrix in row- or column-major order.
///
/// `StorageOrder::NoMajor` is stored column-major.
#[derive(Clone, PartialEq)]
pub struct Matrix<T> {
    data: Vec<T>,
    nrows: usize,
    ncols: usize,
    order: StorageOrder,
}

impl<T: std::fmt::Debug> std::fmt::Debug for Matrix<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matrix")
            .field("nrows", &self.nrows)
            .field("ncols", &self.ncols)
            .field("order", &self.order)
            .field("data", &self.data)
            .finish()
    }
}

fn normalize(order: StorageOrder) -> StorageOrder {
    match order {
        StorageOrder::RowMajor => StorageOrder::RowMajor,
        StorageOrder::ColMajor | StorageOrder::NoMajor => StorageOrder::ColMajor,
    }
}

impl<T: Copy + Zero> Matrix<T> {
    pub fn zeros(nrows: usize, ncols: usize, order: StorageOrder) -> Self {
        Self {
            data: vec![T::zero(); nrows * ncols],
            nrows,
            ncols,
            order: normalize(order),
        }
    }
}

impl<T: Copy> Matrix<T> {
    /// Build a matrix whose element `(i, j)` is `f(i, j)`.
    ///
    /// `f` is called in storage order.
    pub fn from_fn(
        nrows: usize,
        ncols: usize,
        order: StorageOrder,
        mut f: impl FnMut(usize, usize) -> T,
    ) -> Self {
        let order = normalize(order);
        let mut data = Vec::with_capacity(nrows * ncols);
        match order {
            StorageOrder::RowMajor => {
                for i in 0..nrows {
                    for j in 0..ncols {
                        data.push(f(i, j));
                    }
                }
            }
            _ => {
                for j in 0..ncols {
                    for i in 0..nrows {
                        data.push(f(i, j));
                    }
                }
            }
        }
        Self {
            data,
            nrows,
            ncols,
            order,
        }
    }

    /// Build from values listed row by row, stored in `order`.
    pub fn from_row_major_slice(
        nrows: usize,
        ncols: usize,
        order: StorageOrder,
        values: &[T],
    ) -> Result<Self> {
        if values.len() != nrows * ncols {
            return Err(TmvError::ShapeMismatch(vec![values.len()], vec![nrows, ncols]));
        }
        Ok(Self::from_fn(nrows, ncols, order, |i, j| values[i * ncols + j]))
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> T {
        assert!(i < self.nrows && j < self.ncols, "index ({}, {}) out of bounds", i, j);
        self.data[self.order.offset(i, j, self.ld())]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: T) {
        assert!(i < self.nrows && j < self.ncols, "index ({}, {}) out of bounds", i, j);
        let k = self.order.offset(i, j, self.ld());
        self.data[k] = value;
    }

    /// Copy into a matrix with a different storage order.
    pub fn to_order(&self, order: StorageOrder) -> Self {
        Self::from_fn(self.nrows, self.ncols, order, |i, j| self.get(i, j))
    }

    /// Elements listed row by row, whatever the storage order.
    pub fn to_row_major_vec(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.data.len());
        for i in 0..self.nrows {
            for j in 0..self.ncols {
                out.push(self.get(i, j));
            }
        }
        out
    }
}

impl<T> Matrix<T> {
    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    pub fn order(&self) -> StorageOrder {
        self.order
    }

    #[inline]
    fn ld(&self) -> usize {
        match self.order {
            StorageOrder::RowMajor => self.ncols,
            _ => self.nrows,
        }
    }

    /// `[stepi, stepj]` of the dense layout.
    #[inline]
    pub fn strides(&self) -> [isize; 2] {
        self.order.dense_strides(self.nrows, self.ncols)
    }

    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn view(&self) -> MatrixView<'_, T> {
        let strides = self.strides();
        // SAFETY: the dense strides address exactly the nrows * ncols
        // elements owned by `data`.
        unsafe { MatrixView::from_raw_parts(self.data.as_ptr(), [self.nrows, self.ncols], strides) }
    }

    pub fn view_mut(&mut self) -> MatrixViewMut<'_, T> {
        let strides = self.strides();
        let size = [self.nrows, self.ncols];
        // SAFETY: as in `view`, and `&mut self` makes the borrow exclusive.
        unsafe { MatrixViewMut::from_raw_parts(self.data.as_mut_ptr(), size, strides) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_row_major_slice_orders() {
        let vals = [1, 2, 3, 4, 5, 6];
        let r = Matrix::from_row_major_slice(2, 3, StorageOrder::RowMajor, &vals).unwrap();
        let c = Matrix::from_row_major_slice(2, 3, StorageOrder::ColMajor, &vals).unwrap();
        assert_eq!(r.data(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(c.data(), &[1, 4, 2, 5, 3, 6]);
        assert_eq!(r.get(1, 2), 6);
        assert_eq!(c.get(1, 2), 6);
        assert_eq!(c.to_row_major_vec(), vals.to_vec());
        assert!(Matrix::from_row_major_slice(2, 2, StorageOrder::RowMajor, &vals).is_err());
    }

    #[test]
    fn test_views_match_elements() {
        let m = Matrix::from_fn(3, 2, StorageOrder::ColMajor, |i, j| (10 * i + j) as f64);
        let v = m.view();
        assert_eq!(v.storage_order(), StorageOrder::ColMajor);
        for i in 0..3 {
            for j in 0..2 {
                assert_eq!(v.get([i, j]), m.get(i, j));
            }
        }
        let r = m.to_order(StorageOrder::RowMajor);
        assert_eq!(r.view().strides(), &[2, 1]);
        assert_eq!(r.to_row_major_vec(), m.to_row_major_vec());
    }

    #[test]
    fn test_view_mut_and_set() {
        let mut m = Matrix::<i64>::zeros(2, 2, StorageOrder::NoMajor);
        assert_eq!(m.order(), StorageOrder::ColMajor);
        m.view_mut().set([0, 1], 4);
        m.set(1, 0, 2);
        assert_eq!(m.data(), &[0, 2, 4, 0]);
    }
}

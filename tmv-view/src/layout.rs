//! Matrices addressed inside a shared buffer.
//!
//! The borrow checker keeps a `StridedViewMut` disjoint from every other
//! live view. Operations that must accept a source and destination living
//! in the same buffer describe both operands with a [`MatrixLayout`] and
//! classify their overlap with [`MatrixLayout::alias_kind`].

use crate::storage::StorageOrder;
use crate::view::{check_writable_strides, MatrixView, MatrixViewMut};
use crate::{Result, TmvError};

/// How a source and a destination inside one buffer relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasKind {
    /// No element is shared.
    Disjoint,
    /// Same elements in the same positions; element-wise updates are safe.
    Exact,
    /// Partially or differently overlapping; the source must be copied first.
    Overlapping,
}

/// `nrows x ncols` matrix at `offset` with strides `stepi` / `stepj`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixLayout {
    pub offset: usize,
    pub nrows: usize,
    pub ncols: usize,
    pub stepi: isize,
    pub stepj: isize,
}

impl MatrixLayout {
    pub fn new(offset: usize, nrows: usize, ncols: usize, stepi: isize, stepj: isize) -> Self {
        Self {
            offset,
            nrows,
            ncols,
            stepi,
            stepj,
        }
    }

    /// Dense row-major matrix at `offset`.
    pub fn row_major(offset: usize, nrows: usize, ncols: usize) -> Self {
        Self::new(offset, nrows, ncols, ncols as isize, 1)
    }

    /// Dense column-major matrix at `offset`.
    pub fn col_major(offset: usize, nrows: usize, ncols: usize) -> Self {
        Self::new(offset, nrows, ncols, 1, nrows as isize)
    }

    #[inline]
    pub fn size(&self) -> [usize; 2] {
        [self.nrows, self.ncols]
    }

    #[inline]
    pub fn strides(&self) -> [isize; 2] {
        [self.stepi, self.stepj]
    }

    pub fn is_empty(&self) -> bool {
        self.nrows == 0 || self.ncols == 0
    }

    pub fn storage_order(&self) -> StorageOrder {
        StorageOrder::from_strides(self.nrows, self.ncols, self.stepi, self.stepj)
    }

    /// Transposed layout over the same elements.
    pub fn t(&self) -> Self {
        Self::new(self.offset, self.ncols, self.nrows, self.stepj, self.stepi)
    }

    /// Element indices `[lo, hi)` spanned in the buffer, `None` when empty
    /// or when the span does not fit in `isize`.
    pub fn element_range(&self) -> Option<(isize, isize)> {
        self.checked_range().ok().flatten()
    }

    fn checked_range(&self) -> Result<Option<(isize, isize)>> {
        if self.is_empty() {
            return Ok(None);
        }
        let extent = |step: isize, len: usize| {
            isize::try_from(len - 1)
                .ok()
                .and_then(|l| step.checked_mul(l))
                .ok_or(TmvError::OffsetOverflow)
        };
        let off = isize::try_from(self.offset).map_err(|_| TmvError::OffsetOverflow)?;
        let ei = extent(self.stepi, self.nrows)?;
        let ej = extent(self.stepj, self.ncols)?;
        let lo = off
            .checked_add(ei.min(0))
            .and_then(|v| v.checked_add(ej.min(0)))
            .ok_or(TmvError::OffsetOverflow)?;
        let hi = off
            .checked_add(ei.max(0))
            .and_then(|v| v.checked_add(ej.max(0)))
            .and_then(|v| v.checked_add(1))
            .ok_or(TmvError::OffsetOverflow)?;
        Ok(Some((lo, hi)))
    }

    /// Check that the layout fits in a buffer of `len` elements and is
    /// usable as a destination.
    pub fn validate(&self, len: usize) -> Result<()> {
        match self.checked_range()? {
            Some((lo, hi)) => {
                if lo < 0 || hi as usize > len {
                    return Err(TmvError::OffsetOverflow);
                }
                check_writable_strides(&self.size(), &self.strides())
            }
            None if self.offset > len => Err(TmvError::OffsetOverflow),
            None => Ok(()),
        }
    }

    /// Whether the spans of two layouts intersect (conservative; a span
    /// that overflows counts as intersecting).
    pub fn overlaps(&self, other: &MatrixLayout) -> bool {
        match (self.checked_range(), other.checked_range()) {
            (Ok(Some((alo, ahi))), Ok(Some((blo, bhi)))) => alo < bhi && blo < ahi,
            (Ok(None), _) | (_, Ok(None)) => false,
            _ => true,
        }
    }

    /// Classify how `self` (source) and `dst` share storage.
    pub fn alias_kind(&self, dst: &MatrixLayout) -> AliasKind {
        if !self.overlaps(dst) {
            AliasKind::Disjoint
        } else if self == dst {
            AliasKind::Exact
        } else {
            AliasKind::Overlapping
        }
    }

    pub fn view<'a, T>(&self, data: &'a [T]) -> Result<MatrixView<'a, T>> {
        MatrixView::new(data, self.size(), self.strides(), self.offset)
    }

    pub fn view_mut<'a, T>(&self, data: &'a mut [T]) -> Result<MatrixViewMut<'a, T>> {
        MatrixViewMut::new(data, self.size(), self.strides(), self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_range() {
        let a = MatrixLayout::row_major(2, 2, 3);
        assert_eq!(a.element_range(), Some((2, 8)));
        let rev = MatrixLayout::new(5, 2, 3, -3, 1);
        assert_eq!(rev.element_range(), Some((2, 8)));
        assert_eq!(MatrixLayout::row_major(0, 0, 3).element_range(), None);
    }

    #[test]
    fn test_alias_kind() {
        let a = MatrixLayout::row_major(0, 2, 2);
        assert_eq!(a.alias_kind(&a), AliasKind::Exact);
        assert_eq!(
            a.alias_kind(&MatrixLayout::row_major(4, 2, 2)),
            AliasKind::Disjoint
        );
        assert_eq!(
            a.alias_kind(&MatrixLayout::row_major(1, 2, 2)),
            AliasKind::Overlapping
        );
        // in-place transpose touches the same elements in another order
        assert_eq!(a.alias_kind(&a.t()), AliasKind::Overlapping);
    }

    #[test]
    fn test_validate() {
        assert!(MatrixLayout::col_major(0, 3, 3).validate(9).is_ok());
        assert!(MatrixLayout::col_major(1, 3, 3).validate(9).is_err());
        assert!(MatrixLayout::new(0, 2, 2, 0, 1).validate(4).is_err());
        assert!(MatrixLayout::new(0, 2, 2, -1, 2).validate(4).is_err());
        // rows and columns hit the same elements
        assert!(matches!(
            MatrixLayout::new(0, 4, 4, 1, 1).validate(16),
            Err(TmvError::InvalidLayout(_))
        ));
        assert!(MatrixLayout::new(0, 3, 4, 2, 8).validate(64).is_ok());
    }

    #[test]
    fn test_validate_overflow_is_an_error() {
        assert!(matches!(
            MatrixLayout::new(0, 3, 1, isize::MAX, 1).validate(4),
            Err(TmvError::OffsetOverflow)
        ));
        assert!(matches!(
            MatrixLayout::new(usize::MAX, 2, 2, 1, 2).validate(4),
            Err(TmvError::OffsetOverflow)
        ));
        let huge = MatrixLayout::new(0, 3, 1, isize::MAX, 1);
        assert_eq!(huge.element_range(), None);
        assert!(huge.overlaps(&MatrixLayout::row_major(0, 1, 1)));
    }

    #[test]
    fn test_views() {
        let data: Vec<i32> = (0..6).collect();
        let l = MatrixLayout::col_major(0, 2, 3);
        let v = l.view(&data).unwrap();
        assert_eq!(v.get([1, 2]), 5);
        assert_eq!(l.storage_order(), StorageOrder::ColMajor);
    }
}

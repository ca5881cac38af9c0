//! Output tiling for the runtime multiply.
//!
//! `C` is cut into `block_mn x block_mn` tiles (the last row and column of
//! tiles take the remainder). The tiles are produced by consuming splits of
//! the output view, so every tile is an exclusive view of its own elements
//! and tiles can be handed to different threads.

use tmv_view::MatrixViewMut;

/// One output tile of `C`.
pub(crate) struct Tile<'a, T> {
    /// Row of the tile's top-left element in `C`.
    pub(crate) i0: usize,
    /// Column of the tile's top-left element in `C`.
    pub(crate) j0: usize,
    pub(crate) view: MatrixViewMut<'a, T>,
}

/// Number of tiles along a dimension of length `len`.
#[inline]
pub fn num_blocks(len: usize, block: usize) -> usize {
    len.div_ceil(block.max(1))
}

/// Execution order for an `nbi x nbj` grid of tiles.
///
/// The grid is halved recursively along its longer side, so consecutive
/// tiles share either their rows of `A` or their columns of `B`.
/// Every `(ib, jb)` appears exactly once.
pub fn make_task_list(nbi: usize, nbj: usize) -> Vec<(usize, usize)> {
    fn split(i0: usize, i1: usize, j0: usize, j1: usize, out: &mut Vec<(usize, usize)>) {
        let (di, dj) = (i1 - i0, j1 - j0);
        if di == 0 || dj == 0 {
            return;
        }
        if di == 1 && dj == 1 {
            out.push((i0, j0));
        } else if di >= dj {
            let mid = i0 + di / 2;
            split(i0, mid, j0, j1, out);
            split(mid, i1, j0, j1, out);
        } else {
            let mid = j0 + dj / 2;
            split(i0, i1, j0, mid, out);
            split(i0, i1, mid, j1, out);
        }
    }

    let mut out = Vec::with_capacity(nbi * nbj);
    split(0, nbi, 0, nbj, &mut out);
    out
}

/// Cut `c` into tiles and return them in [`make_task_list`] order.
pub(crate) fn tiles_in_task_order<T>(c: MatrixViewMut<'_, T>, block: usize) -> Vec<Tile<'_, T>> {
    let block = block.max(1);
    let nbi = num_blocks(c.nrows(), block);
    let nbj = num_blocks(c.ncols(), block);

    let mut grid: Vec<Vec<Option<Tile<'_, T>>>> = Vec::with_capacity(nbi);
    let mut rest = c;
    let mut i0 = 0;
    for _ in 0..nbi {
        let rows = block.min(rest.nrows());
        let (strip, below) = rest.split_at_row(rows);
        rest = below;

        let mut row = Vec::with_capacity(nbj);
        let mut right = strip;
        let mut j0 = 0;
        for _ in 0..nbj {
            let cols = block.min(right.ncols());
            let (view, tail) = right.split_at_col(cols);
            right = tail;
            row.push(Some(Tile { i0, j0, view }));
            j0 += cols;
        }
        grid.push(row);
        i0 += rows;
    }

    make_task_list(nbi, nbj)
        .into_iter()
        .filter_map(|(ib, jb)| grid[ib][jb].take())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_task_list_covers_grid_once() {
        for (nbi, nbj) in [(1, 1), (1, 5), (3, 2), (4, 4), (7, 3)] {
            let tasks = make_task_list(nbi, nbj);
            assert_eq!(tasks.len(), nbi * nbj);
            let set: HashSet<_> = tasks.iter().copied().collect();
            assert_eq!(set.len(), nbi * nbj);
            assert!(tasks.iter().all(|&(i, j)| i < nbi && j < nbj));
        }
        assert!(make_task_list(0, 3).is_empty());
    }

    #[test]
    fn test_task_list_order() {
        assert_eq!(make_task_list(2, 2), vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
        assert_eq!(make_task_list(1, 3), vec![(0, 0), (0, 1), (0, 2)]);
    }

    #[test]
    fn test_tiles_partition_output() {
        let mut data = vec![0u32; 7 * 5];
        let c = MatrixViewMut::new(&mut data, [7, 5], [1, 7], 0).unwrap();
        let tiles = tiles_in_task_order(c, 3);
        assert_eq!(tiles.len(), 3 * 2);
        for mut tile in tiles {
            assert!(tile.view.nrows() <= 3 && tile.view.ncols() <= 3);
            assert_eq!(tile.i0 % 3, 0);
            assert_eq!(tile.j0 % 3, 0);
            for i in 0..tile.view.nrows() {
                for j in 0..tile.view.ncols() {
                    let v = tile.view.get([i, j]);
                    tile.view.set([i, j], v + 1);
                }
            }
        }
        assert!(data.iter().all(|&v| v == 1));
    }

    #[test]
    fn test_num_blocks() {
        assert_eq!(num_blocks(0, 32), 0);
        assert_eq!(num_blocks(32, 32), 1);
        assert_eq!(num_blocks(33, 32), 2);
        assert_eq!(num_blocks(5, 0), 5);
    }
}

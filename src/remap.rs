use crate::error::{try_vec, KnnError, Result};
use crate::matrix::{IndexMatrix, Matrix};

/// Bijection between a tree's internal point order and the caller's original order.
///
/// `old_from_new[i]` is the original index of the point stored at internal position `i`;
/// `new_from_old` is its inverse.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Permutation {
    old_from_new: Vec<usize>,
    new_from_old: Vec<usize>,
}

impl Permutation {
    pub fn identity(len: usize) -> Self {
        Self {
            old_from_new: (0..len).collect(),
            new_from_old: (0..len).collect(),
        }
    }

    /// Builds the inverse mapping, failing if `old_from_new` is not a bijection over `[0, len)`.
    pub fn from_old_from_new(old_from_new: Vec<usize>) -> Result<Self> {
        let len = old_from_new.len();
        let mut new_from_old = try_vec("permutation", len)?;
        new_from_old.resize(len, usize::MAX);
        for (new, &old) in old_from_new.iter().enumerate() {
            if old >= len || new_from_old[old] != usize::MAX {
                return Err(KnnError::InvalidPermutation { index: old, len });
            }
            new_from_old[old] = new;
        }
        Ok(Self { old_from_new, new_from_old })
    }

    pub fn len(&self) -> usize {
        self.old_from_new.len()
    }

    pub fn is_empty(&self) -> bool {
        self.old_from_new.is_empty()
    }

    pub fn old_from_new(&self) -> &[usize] {
        &self.old_from_new
    }

    pub fn new_from_old(&self) -> &[usize] {
        &self.new_from_old
    }

    /// Original index of internal position `new`.
    #[inline]
    pub fn to_old(&self, new: usize) -> usize {
        self.old_from_new[new]
    }

    /// Internal position of original index `old`.
    #[inline]
    pub fn to_new(&self, old: usize) -> usize {
        self.new_from_old[old]
    }
}

/// Restores original ordering of search results.
///
/// Column `j` of the internal matrices belongs to the query point at internal position `j`;
/// it is written to column `queries.to_old(j)`, and every neighbor index is translated through
/// `references`. Every output column is written exactly once because `queries` is a bijection.
pub fn remap(
    neighbors: &IndexMatrix,
    distances: &Matrix<f64>,
    queries: &Permutation,
    references: &Permutation,
) -> Result<(IndexMatrix, Matrix<f64>)> {
    debug_assert_eq!(neighbors.cols(), queries.len());
    debug_assert_eq!(distances.cols(), queries.len());

    let k = neighbors.rows();
    let mut neighbors_out = IndexMatrix::zeros(k, neighbors.cols())?;
    let mut distances_out = Matrix::zeros(k, distances.cols())?;

    for j in 0..neighbors.cols() {
        let col = queries.to_old(j);
        distances_out.column_mut(col).copy_from_slice(distances.column(j));
        for (out, &n) in neighbors_out.column_mut(col).iter_mut().zip(neighbors.column(j)) {
            *out = references.to_old(n);
        }
    }

    Ok((neighbors_out, distances_out))
}

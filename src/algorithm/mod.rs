use crate::candidates::{Candidate, CandidateSet};
use crate::error::{try_vec, Result};
use crate::kdtree::KdTree;
use crate::matrix::{distance_sq, IndexMatrix, Matrix, PointMatrix};
use crate::remap::Permutation;

pub mod dual_tree;
pub mod naive;
pub mod single_tree;

/// Counters describing how much work a search did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Exact point-to-point distance evaluations.
    pub base_cases: u64,
    /// Subtrees (single-tree) or node pairs (dual-tree) skipped by the distance bound.
    pub prunes: u64,
    /// Nodes (single-tree) or node pairs (dual-tree) entered.
    pub visits: u64,
}

/// A point set seen in some internal order.
#[derive(Clone, Copy, Debug)]
pub struct PointView<'a> {
    points: &'a PointMatrix,
    permutation: &'a Permutation,
}

impl<'a> PointView<'a> {
    pub fn new(points: &'a PointMatrix, permutation: &'a Permutation) -> Self {
        debug_assert_eq!(points.len(), permutation.len());
        Self { points, permutation }
    }

    pub fn of_tree(tree: &'a KdTree<'_>) -> Self {
        Self { points: tree.points(), permutation: tree.permutation() }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn point(&self, new: usize) -> &'a [f64] {
        self.points.point(self.permutation.to_old(new))
    }

    #[inline]
    pub fn original(&self, new: usize) -> usize {
        self.permutation.to_old(new)
    }

    pub fn permutation(&self) -> &'a Permutation {
        self.permutation
    }
}

/// How a query point relates to the reference point with the same original index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelfPairing {
    /// Query and reference sets are different; indices are unrelated.
    Disjoint,
    /// Same set; a point is never its own neighbor.
    Exclude,
    /// Same set; a point ranks first among its zero-distance neighbors.
    Include,
}

/// Per-call search state: one candidate set per query point (in the strategy's internal
/// query order) plus work counters.
#[derive(Debug)]
pub struct SearchState {
    candidates: Vec<CandidateSet>,
    pairing: SelfPairing,
    pub stats: SearchStats,
}

impl SearchState {
    pub fn new(num_queries: usize, k: usize, pairing: SelfPairing) -> Result<Self> {
        let mut candidates = try_vec("candidate sets", num_queries)?;
        for _ in 0..num_queries {
            candidates.push(CandidateSet::try_new(k)?);
        }
        Ok(Self { candidates, pairing, stats: SearchStats::default() })
    }

    pub fn candidates(&self, query: usize) -> &CandidateSet {
        &self.candidates[query]
    }

    #[inline]
    pub fn worst_distance_sq(&self, query: usize) -> f64 {
        self.candidates[query].worst_distance_sq()
    }

    /// Evaluates one (query, reference) pair and offers it to the query's candidate set.
    #[inline]
    pub fn base_case(&mut self, query: PointView<'_>, q: usize, reference: PointView<'_>, r: usize) {
        let original = reference.original(r);
        let is_self = match self.pairing {
            SelfPairing::Disjoint => false,
            SelfPairing::Exclude if query.original(q) == original => return,
            SelfPairing::Exclude => false,
            SelfPairing::Include => query.original(q) == original,
        };
        self.stats.base_cases += 1;
        let distance_sq = distance_sq(query.point(q), reference.point(r));
        self.candidates[q].insert(Candidate { index: r, original, distance_sq, is_self });
    }

    /// Converts the candidate sets into `k x num_queries` neighbor and distance matrices in
    /// internal order. Distances are Euclidean.
    pub fn into_matrices(self) -> Result<(IndexMatrix, Matrix<f64>)> {
        let k = self.candidates.first().map_or(0, CandidateSet::k);
        let mut neighbors = IndexMatrix::zeros(k, self.candidates.len())?;
        let mut distances = Matrix::zeros(k, self.candidates.len())?;
        for (j, set) in self.candidates.iter().enumerate() {
            debug_assert!(set.is_full(), "query {} resolved only {} of {} neighbors", j, set.len(), k);
            for (i, c) in set.as_slice().iter().enumerate() {
                neighbors.set(i, j, c.index);
                distances.set(i, j, c.distance_sq.sqrt());
            }
        }
        Ok((neighbors, distances))
    }
}

/// Trait defining a k-nearest-neighbor search strategy.
/// This allows swapping between naive, single-tree and dual-tree search.
pub trait SearchStrategy {
    /// Short name used in log messages.
    fn name(&self) -> &'static str;

    /// Query points in the order the candidate sets are indexed by.
    fn queries(&self) -> PointView<'_>;

    /// Reference points in the order candidate indices refer to.
    fn references(&self) -> PointView<'_>;

    /// Fills every candidate set of `state` with its exact k nearest neighbors.
    fn search(&self, state: &mut SearchState) -> Result<()>;
}

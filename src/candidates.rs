use crate::error::{try_vec, Result};
use std::cmp::Ordering;

/// A neighbor candidate: internal reference position, its original index and squared distance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    pub index: usize,
    pub original: usize,
    pub distance_sq: f64,
    /// The reference point is the query point itself.
    pub is_self: bool,
}

impl Candidate {
    /// Orders by distance, then the query itself ahead of others, then by original reference index.
    #[inline]
    fn cmp_rank(&self, other: &Self) -> Ordering {
        self.distance_sq
            .partial_cmp(&other.distance_sq)
            .unwrap_or(Ordering::Equal)
            .then(other.is_self.cmp(&self.is_self))
            .then(self.original.cmp(&other.original))
    }
}

/// The best `k` candidates found so far for one query point, kept sorted ascending.
///
/// Equal distances are ranked by original reference index so the outcome does not depend on
/// the order candidates are offered in.
#[derive(Clone, Debug)]
pub struct CandidateSet {
    k: usize,
    items: Vec<Candidate>,
}

impl CandidateSet {
    pub fn new(k: usize) -> Self {
        Self { k, items: Vec::with_capacity(k) }
    }

    /// Like [`CandidateSet::new`], reporting allocation failure instead of aborting.
    pub fn try_new(k: usize) -> Result<Self> {
        Ok(Self { k, items: try_vec("candidates", k)? })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() == self.k
    }

    /// Squared distance of the k-th best candidate, or infinity while fewer than k are known.
    #[inline]
    pub fn worst_distance_sq(&self) -> f64 {
        if self.is_full() {
            self.items[self.k - 1].distance_sq
        } else {
            f64::INFINITY
        }
    }

    /// Offers a candidate; returns true if it entered the set.
    pub fn insert(&mut self, candidate: Candidate) -> bool {
        if self.is_full() && candidate.cmp_rank(&self.items[self.k - 1]) != Ordering::Less {
            return false;
        }
        let pos = self
            .items
            .partition_point(|c| c.cmp_rank(&candidate) == Ordering::Less);
        if self.is_full() {
            self.items.pop();
        }
        self.items.insert(pos, candidate);
        true
    }

    /// Candidates sorted by ascending distance.
    pub fn as_slice(&self) -> &[Candidate] {
        &self.items
    }
}

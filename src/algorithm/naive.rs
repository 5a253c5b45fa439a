use super::{PointView, SearchState, SearchStrategy};
use crate::error::Result;
use crate::matrix::PointMatrix;
use crate::remap::Permutation;

/// Brute-force search: every query point against every reference point.
///
/// No tree, no pruning. Serves as the correctness oracle for the tree strategies.
#[derive(Debug)]
pub struct NaiveSearch<'a> {
    reference: &'a PointMatrix,
    query: &'a PointMatrix,
    reference_order: Permutation,
    query_order: Permutation,
}

impl<'a> NaiveSearch<'a> {
    pub fn new(reference: &'a PointMatrix, query: &'a PointMatrix) -> Self {
        Self {
            reference,
            query,
            reference_order: Permutation::identity(reference.len()),
            query_order: Permutation::identity(query.len()),
        }
    }
}

impl SearchStrategy for NaiveSearch<'_> {
    fn name(&self) -> &'static str {
        "naive"
    }

    fn queries(&self) -> PointView<'_> {
        PointView::new(self.query, &self.query_order)
    }

    fn references(&self) -> PointView<'_> {
        PointView::new(self.reference, &self.reference_order)
    }

    fn search(&self, state: &mut SearchState) -> Result<()> {
        let queries = self.queries();
        let references = self.references();
        for q in 0..queries.len() {
            for r in 0..references.len() {
                state.base_case(queries, q, references, r);
            }
        }
        Ok(())
    }
}

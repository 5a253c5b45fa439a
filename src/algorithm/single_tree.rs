use super::{PointView, SearchState, SearchStrategy};
use crate::error::Result;
use crate::kdtree::KdTree;
use crate::matrix::PointMatrix;
use crate::remap::Permutation;

/// Searches the reference tree once per query point.
///
/// Depth-first, nearer child first. A child is skipped when its box is further from the query
/// than the query's current k-th best distance.
#[derive(Debug)]
pub struct SingleTreeSearch<'t, 'a> {
    reference: &'t KdTree<'a>,
    query: &'a PointMatrix,
    query_order: Permutation,
}

impl<'t, 'a> SingleTreeSearch<'t, 'a> {
    pub fn new(reference: &'t KdTree<'a>, query: &'a PointMatrix) -> Self {
        Self {
            reference,
            query,
            query_order: Permutation::identity(query.len()),
        }
    }

    fn search_node(&self, id: usize, q: usize, state: &mut SearchState) {
        let tree = self.reference;
        let node = tree.node(id);
        state.stats.visits += 1;

        match node.children() {
            None => {
                let queries = self.queries();
                let references = self.references();
                for r in node.range() {
                    state.base_case(queries, q, references, r);
                }
            }
            Some((left, right)) => {
                let point = self.query.point(q);
                let d_left = tree.node(left).bounds().min_distance_sq_to_point(point);
                let d_right = tree.node(right).bounds().min_distance_sq_to_point(point);

                let order = if d_left <= d_right {
                    [(left, d_left), (right, d_right)]
                } else {
                    [(right, d_right), (left, d_left)]
                };

                for (child, d) in order {
                    // Strict: an equally distant box may still hold a lower-index tie.
                    if d > state.worst_distance_sq(q) {
                        state.stats.prunes += 1;
                        continue;
                    }
                    self.search_node(child, q, state);
                }
            }
        }
    }
}

impl SearchStrategy for SingleTreeSearch<'_, '_> {
    fn name(&self) -> &'static str {
        "single-tree"
    }

    fn queries(&self) -> PointView<'_> {
        PointView::new(self.query, &self.query_order)
    }

    fn references(&self) -> PointView<'_> {
        PointView::of_tree(self.reference)
    }

    fn search(&self, state: &mut SearchState) -> Result<()> {
        for q in 0..self.query.len() {
            self.search_node(self.reference.root(), q, state);
        }
        Ok(())
    }
}

use super::{PointView, SearchState, SearchStrategy};
use crate::error::{try_vec, Result};
use crate::kdtree::KdTree;

/// Recurses over query-tree and reference-tree node pairs simultaneously.
///
/// Each query node carries a bound: the largest k-th best distance among the query points
/// below it. A node pair whose boxes are further apart than the query node's bound cannot
/// improve any of those points and is pruned. Bounds live in a per-call [`Traversal`], so a
/// tree can serve any number of searches, including concurrent ones.
#[derive(Debug)]
pub struct DualTreeSearch<'t, 'a> {
    query: &'t KdTree<'a>,
    reference: &'t KdTree<'a>,
}

/// State owned by one dual-tree search call.
struct Traversal<'s> {
    state: &'s mut SearchState,
    /// Per query node, indexed by arena id; starts at infinity and only decreases.
    bound: Vec<f64>,
}

impl<'t, 'a> DualTreeSearch<'t, 'a> {
    /// Pass the same tree twice to search a point set against itself.
    pub fn new(query: &'t KdTree<'a>, reference: &'t KdTree<'a>) -> Self {
        Self { query, reference }
    }

    fn search_pair(&self, t: &mut Traversal<'_>, q_id: usize, r_id: usize) {
        let q_node = self.query.node(q_id);
        let r_node = self.reference.node(r_id);

        // Strict: an equally distant pair may still hold a lower-index tie.
        if q_node.bounds().min_distance_sq(r_node.bounds()) > t.bound[q_id] {
            t.state.stats.prunes += 1;
            return;
        }
        t.state.stats.visits += 1;

        match (q_node.children(), r_node.children()) {
            (None, None) => {
                let queries = self.queries();
                let references = self.references();
                for q in q_node.range() {
                    for r in r_node.range() {
                        t.state.base_case(queries, q, references, r);
                    }
                }

                let worst = q_node
                    .range()
                    .map(|q| t.state.worst_distance_sq(q))
                    .fold(0.0, f64::max);
                t.bound[q_id] = t.bound[q_id].min(worst);
            }
            (None, Some((r_left, r_right))) => {
                self.visit_in_order(t, &mut [(q_id, r_left), (q_id, r_right)]);
            }
            (Some((q_left, q_right)), None) => {
                self.visit_in_order(t, &mut [(q_left, r_id), (q_right, r_id)]);
                self.pull_bound(t, q_id, q_left, q_right);
            }
            (Some((q_left, q_right)), Some((r_left, r_right))) => {
                self.visit_in_order(
                    t,
                    &mut [
                        (q_left, r_left),
                        (q_left, r_right),
                        (q_right, r_left),
                        (q_right, r_right),
                    ],
                );
                self.pull_bound(t, q_id, q_left, q_right);
            }
        }
    }

    /// Recurses into `pairs` closest first, so early pairs tighten bounds for later ones.
    fn visit_in_order(&self, t: &mut Traversal<'_>, pairs: &mut [(usize, usize)]) {
        let min_dist = |&(q, r): &(usize, usize)| {
            self.query.node(q).bounds().min_distance_sq(self.reference.node(r).bounds())
        };
        pairs.sort_by(|a, b| min_dist(a).total_cmp(&min_dist(b)));
        for &(q, r) in pairs.iter() {
            self.search_pair(t, q, r);
        }
    }

    /// A query node's bound is the larger of its children's bounds.
    fn pull_bound(&self, t: &mut Traversal<'_>, q_id: usize, left: usize, right: usize) {
        let children = t.bound[left].max(t.bound[right]);
        t.bound[q_id] = t.bound[q_id].min(children);
    }
}

impl SearchStrategy for DualTreeSearch<'_, '_> {
    fn name(&self) -> &'static str {
        "dual-tree"
    }

    fn queries(&self) -> PointView<'_> {
        PointView::of_tree(self.query)
    }

    fn references(&self) -> PointView<'_> {
        PointView::of_tree(self.reference)
    }

    fn search(&self, state: &mut SearchState) -> Result<()> {
        let mut bound = try_vec("node bounds", self.query.node_count())?;
        bound.resize(self.query.node_count(), f64::INFINITY);

        let mut traversal = Traversal { state, bound };
        self.search_pair(&mut traversal, self.query.root(), self.reference.root());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::SelfPairing;
    use crate::algorithm::naive::NaiveSearch;
    use crate::matrix::PointMatrix;

    fn resolved(state: &SearchState, strategy: &dyn SearchStrategy) -> Vec<Vec<(usize, f64)>> {
        // Indexed by original query, holding (original reference, distance²).
        let queries = strategy.queries();
        let refs = strategy.references();
        let mut out = vec![Vec::new(); queries.len()];
        for q in 0..queries.len() {
            out[queries.original(q)] = state
                .candidates(q)
                .as_slice()
                .iter()
                .map(|c| (refs.original(c.index), c.distance_sq))
                .collect();
        }
        out
    }

    #[test]
    fn test_matches_naive_with_separate_query_tree() {
        let reference = PointMatrix::random(2, 600, 21).unwrap();
        let query = PointMatrix::random(2, 200, 22).unwrap();
        let r_tree = KdTree::build(&reference, 10).unwrap();
        let q_tree = KdTree::build(&query, 10).unwrap();

        let dual = DualTreeSearch::new(&q_tree, &r_tree);
        let naive = NaiveSearch::new(&reference, &query);

        let mut s1 = SearchState::new(200, 4, SelfPairing::Disjoint).unwrap();
        let mut s2 = SearchState::new(200, 4, SelfPairing::Disjoint).unwrap();
        dual.search(&mut s1).unwrap();
        naive.search(&mut s2).unwrap();

        assert_eq!(resolved(&s1, &dual), resolved(&s2, &naive));
        assert!(s1.stats.base_cases < s2.stats.base_cases / 2);
        assert!(s1.stats.prunes > 0);
    }

    #[test]
    fn test_matches_naive_on_shared_tree() {
        let points = PointMatrix::random(3, 300, 5).unwrap();
        let tree = KdTree::build(&points, 4).unwrap();

        let dual = DualTreeSearch::new(&tree, &tree);
        let naive = NaiveSearch::new(&points, &points);

        let mut s1 = SearchState::new(300, 3, SelfPairing::Exclude).unwrap();
        let mut s2 = SearchState::new(300, 3, SelfPairing::Exclude).unwrap();
        dual.search(&mut s1).unwrap();
        naive.search(&mut s2).unwrap();

        let r1 = resolved(&s1, &dual);
        assert_eq!(r1, resolved(&s2, &naive));
        for (q, neighbors) in r1.iter().enumerate() {
            assert!(neighbors.iter().all(|&(r, _)| r != q));
        }
    }

    #[test]
    fn test_repeated_searches_start_fresh() {
        let points = PointMatrix::random(2, 128, 8).unwrap();
        let tree = KdTree::build(&points, 8).unwrap();
        let dual = DualTreeSearch::new(&tree, &tree);

        let mut s1 = SearchState::new(128, 2, SelfPairing::Exclude).unwrap();
        let mut s2 = SearchState::new(128, 2, SelfPairing::Exclude).unwrap();
        dual.search(&mut s1).unwrap();
        dual.search(&mut s2).unwrap();
        assert_eq!(resolved(&s1, &dual), resolved(&s2, &dual));
        assert_eq!(s1.stats, s2.stats);
    }
}

use crate::algorithm::dual_tree::DualTreeSearch;
use crate::algorithm::naive::NaiveSearch;
use crate::algorithm::single_tree::SingleTreeSearch;
use crate::algorithm::{SearchState, SearchStats, SearchStrategy, SelfPairing};
use crate::error::{KnnError, Result};
use crate::kdtree::KdTree;
use crate::matrix::{IndexMatrix, Matrix, PointMatrix};
use crate::remap::remap;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Leaf size used when none is given.
pub const DEFAULT_LEAF_SIZE: usize = 20;

/// Which search strategy computes the neighbors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Every query against every reference point.
    Naive,
    /// One reference-tree traversal per query point.
    Single,
    /// Simultaneous traversal of query and reference trees.
    #[default]
    Dual,
}

/// Whether a point may be its own neighbor when the reference set doubles as the query set.
///
/// Points are matched by identity, not by distance: with `Exclude`, a duplicate of a point is
/// still reported as its neighbor at distance zero. With `Include`, a point comes first among
/// neighbors at distance zero, ahead of its duplicates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfMatch {
    #[default]
    Exclude,
    Include,
}

/// Parameters of a search.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Number of neighbors per query point; `0 < k < reference points`.
    pub k: usize,
    /// Maximum number of points in a tree leaf; at least 1.
    pub leaf_size: usize,
    pub mode: SearchMode,
    pub self_match: SelfMatch,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            k: 1,
            leaf_size: DEFAULT_LEAF_SIZE,
            mode: SearchMode::default(),
            self_match: SelfMatch::default(),
        }
    }
}

impl SearchConfig {
    pub fn new(k: usize) -> Self {
        Self { k, ..Self::default() }
    }

    /// Resolves command-line style flags: `naive` overrides `single_mode`, and neither means dual-tree.
    pub fn from_flags(k: usize, leaf_size: usize, naive: bool, single_mode: bool) -> Self {
        if naive && single_mode {
            warn!("single mode ignored because naive mode is present");
        }
        let mode = if naive {
            SearchMode::Naive
        } else if single_mode {
            SearchMode::Single
        } else {
            SearchMode::Dual
        };
        Self { k, leaf_size, mode, ..Self::default() }
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_leaf_size(mut self, leaf_size: usize) -> Self {
        self.leaf_size = leaf_size;
        self
    }

    pub fn with_mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_self_match(mut self, self_match: SelfMatch) -> Self {
        self.self_match = self_match;
        self
    }
}

/// Result of a search, in the caller's original point order.
#[derive(Clone, Debug)]
pub struct Neighbors {
    /// `k x num_queries`; column `j` lists reference indices for query `j`, nearest first.
    pub neighbors: IndexMatrix,
    /// Same shape as `neighbors`, holding the Euclidean distances.
    pub distances: Matrix<f64>,
    pub stats: SearchStats,
}

impl Neighbors {
    pub fn k(&self) -> usize {
        self.neighbors.rows()
    }

    pub fn num_queries(&self) -> usize {
        self.neighbors.cols()
    }

    /// Reference indices of the neighbors of query `j`, nearest first.
    pub fn neighbors_of(&self, j: usize) -> &[usize] {
        self.neighbors.column(j)
    }

    pub fn distances_of(&self, j: usize) -> &[f64] {
        self.distances.column(j)
    }
}

#[derive(Debug)]
enum Engine<'a> {
    Naive,
    Single { reference: KdTree<'a> },
    Dual { reference: KdTree<'a>, query: Option<KdTree<'a>> },
}

/// All-k-nearest-neighbor search over a reference set and an optional query set.
///
/// Trees are built once in [`AllKnn::new`]; each call to [`AllKnn::search`] uses fresh
/// per-call state, so the engine can be searched repeatedly, with different `k`.
#[derive(Debug)]
pub struct AllKnn<'a> {
    reference: &'a PointMatrix,
    query: Option<&'a PointMatrix>,
    config: SearchConfig,
    engine: Engine<'a>,
}

impl<'a> AllKnn<'a> {
    /// Validates the input and builds the trees `config.mode` needs.
    ///
    /// Without a query set the reference set is searched against itself and its tree is
    /// used on both sides.
    pub fn new(reference: &'a PointMatrix, query: Option<&'a PointMatrix>, config: SearchConfig) -> Result<Self> {
        validate(reference, query, &config)?;

        let engine = match config.mode {
            SearchMode::Naive => Engine::Naive,
            SearchMode::Single => {
                info!("Building reference tree...");
                let reference = KdTree::build(reference, config.leaf_size)?;
                debug!("reference tree: {} nodes, height {}", reference.node_count(), reference.height());
                Engine::Single { reference }
            }
            SearchMode::Dual => {
                info!("Building reference tree...");
                let reference = KdTree::build(reference, config.leaf_size)?;
                debug!("reference tree: {} nodes, height {}", reference.node_count(), reference.height());
                let query = match query {
                    Some(points) => {
                        info!("Building query tree...");
                        Some(KdTree::build(points, config.leaf_size)?)
                    }
                    None => None,
                };
                Engine::Dual { reference, query }
            }
        };
        info!("Trees built.");

        Ok(Self { reference, query, config, engine })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// The reference tree, if the mode uses one.
    pub fn reference_tree(&self) -> Option<&KdTree<'a>> {
        match &self.engine {
            Engine::Naive => None,
            Engine::Single { reference } | Engine::Dual { reference, .. } => Some(reference),
        }
    }

    /// The query tree; the reference tree when searching a set against itself in dual mode.
    pub fn query_tree(&self) -> Option<&KdTree<'a>> {
        match &self.engine {
            Engine::Dual { query: Some(query), .. } => Some(query),
            Engine::Dual { reference, query: None } => Some(reference),
            _ => None,
        }
    }

    /// Finds `config.k` neighbors for every query point.
    pub fn search(&self) -> Result<Neighbors> {
        self.search_k(self.config.k)
    }

    /// Finds `k` neighbors for every query point.
    pub fn search_k(&self, k: usize) -> Result<Neighbors> {
        validate_k(k, self.reference.len())?;

        let query = self.query.unwrap_or(self.reference);
        let pairing = match (self.query, self.config.self_match) {
            (Some(_), _) => SelfPairing::Disjoint,
            (None, SelfMatch::Exclude) => SelfPairing::Exclude,
            (None, SelfMatch::Include) => SelfPairing::Include,
        };

        match &self.engine {
            Engine::Naive => run(&NaiveSearch::new(self.reference, query), k, pairing),
            Engine::Single { reference } => run(&SingleTreeSearch::new(reference, query), k, pairing),
            Engine::Dual { reference, query } => {
                let query = query.as_ref().unwrap_or(reference);
                run(&DualTreeSearch::new(query, reference), k, pairing)
            }
        }
    }
}

/// Computes the `config.k` nearest neighbors of every query point among `reference`.
///
/// With `query = None` every reference point is queried against the others.
pub fn search(reference: &PointMatrix, query: Option<&PointMatrix>, config: &SearchConfig) -> Result<Neighbors> {
    AllKnn::new(reference, query, config.clone())?.search()
}

fn run(strategy: &dyn SearchStrategy, k: usize, pairing: SelfPairing) -> Result<Neighbors> {
    let queries = strategy.queries();
    let references = strategy.references();

    info!("Computing {} nearest neighbors ({})...", k, strategy.name());
    let mut state = SearchState::new(queries.len(), k, pairing)?;
    strategy.search(&mut state)?;
    let stats = state.stats;
    debug!(
        "{}: {} base cases, {} prunes, {} visits",
        strategy.name(),
        stats.base_cases,
        stats.prunes,
        stats.visits
    );
    info!("Neighbors computed.");

    info!("Re-mapping indices...");
    let (neighbors, distances) = state.into_matrices()?;
    let (neighbors, distances) = remap(&neighbors, &distances, queries.permutation(), references.permutation())?;

    Ok(Neighbors { neighbors, distances, stats })
}

fn validate(reference: &PointMatrix, query: Option<&PointMatrix>, config: &SearchConfig) -> Result<()> {
    if config.leaf_size == 0 {
        return Err(KnnError::InvalidLeafSize(config.leaf_size));
    }
    if reference.is_empty() {
        return Err(KnnError::EmptyPointSet("reference"));
    }
    validate_k(config.k, reference.len())?;
    reference.check_finite("reference")?;

    if let Some(query) = query {
        if query.is_empty() {
            return Err(KnnError::EmptyPointSet("query"));
        }
        if query.dims() != reference.dims() {
            return Err(KnnError::DimensionMismatch { expected: reference.dims(), actual: query.dims() });
        }
        query.check_finite("query")?;
    }
    Ok(())
}

fn validate_k(k: usize, reference_points: usize) -> Result<()> {
    if k == 0 || k >= reference_points {
        return Err(KnnError::InvalidK { k, reference_points });
    }
    Ok(())
}

use crate::error::KnnError;
use crate::matrix::PointMatrix;
use crate::search::{search, Neighbors, SearchConfig, SearchMode, SelfMatch};
use std::ops::Range;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(typescript_custom_section)]
const TS_SEARCH_MODES: &'static str = r#"
export type SearchMode = "naive" | "single" | "dual";
"#;

fn to_js(err: KnnError) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

fn parse_mode(mode: &str) -> Result<SearchMode, JsValue> {
    match mode {
        "naive" => Ok(SearchMode::Naive),
        "single" => Ok(SearchMode::Single),
        "dual" => Ok(SearchMode::Dual),
        other => Err(js_sys::Error::new(&format!("unknown search mode '{}'", other)).into()),
    }
}

/// Search result with flat column-major arrays: entry `j * k + i` is the `i`-th neighbor of query `j`.
#[wasm_bindgen]
pub struct NeighborsWASM {
    k: usize,
    num_queries: usize,
    neighbors: Vec<u32>,
    distances: Vec<f64>,
}

#[wasm_bindgen]
impl NeighborsWASM {
    #[wasm_bindgen(getter)]
    pub fn k(&self) -> usize {
        self.k
    }

    #[wasm_bindgen(getter)]
    pub fn num_queries(&self) -> usize {
        self.num_queries
    }

    #[wasm_bindgen(getter)]
    pub fn neighbors(&self) -> Vec<u32> {
        self.neighbors.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn distances(&self) -> Vec<f64> {
        self.distances.clone()
    }

    /// Neighbor indices of query `j`, nearest first.
    pub fn neighbors_of(&self, j: usize) -> Result<Vec<u32>, JsValue> {
        Ok(self.neighbors[self.column(j)?].to_vec())
    }

    pub fn distances_of(&self, j: usize) -> Result<Vec<f64>, JsValue> {
        Ok(self.distances[self.column(j)?].to_vec())
    }
}

impl NeighborsWASM {
    fn column_range(&self, j: usize) -> Option<Range<usize>> {
        (j < self.num_queries).then(|| j * self.k..(j + 1) * self.k)
    }

    fn column(&self, j: usize) -> Result<Range<usize>, JsValue> {
        self.column_range(j).ok_or_else(|| {
            js_sys::Error::new(&format!("query {} out of range for {} queries", j, self.num_queries)).into()
        })
    }
}

impl From<Neighbors> for NeighborsWASM {
    fn from(result: Neighbors) -> Self {
        Self {
            k: result.k(),
            num_queries: result.num_queries(),
            neighbors: result.neighbors.as_slice().iter().map(|&n| n as u32).collect(),
            distances: result.distances.into_vec(),
        }
    }
}

/// All-k-nearest-neighbor search over flat coordinate arrays (`dims` values per point).
#[wasm_bindgen]
pub struct AllKnnWASM {
    reference: PointMatrix,
    query: Option<PointMatrix>,
    config: SearchConfig,
}

#[wasm_bindgen]
impl AllKnnWASM {
    #[wasm_bindgen(constructor)]
    pub fn new(dims: usize, reference: &[f64]) -> Result<AllKnnWASM, JsValue> {
        Ok(AllKnnWASM {
            reference: flat_points(dims, reference)?,
            query: None,
            config: SearchConfig::default(),
        })
    }

    /// Uses a separate query set instead of searching the reference set against itself.
    pub fn set_query(&mut self, query: &[f64]) -> Result<(), JsValue> {
        self.query = Some(flat_points(self.reference.dims(), query)?);
        Ok(())
    }

    pub fn clear_query(&mut self) {
        self.query = None;
    }

    pub fn set_leaf_size(&mut self, leaf_size: usize) {
        self.config.leaf_size = leaf_size;
    }

    pub fn set_mode(&mut self, mode: &str) -> Result<(), JsValue> {
        self.config.mode = parse_mode(mode)?;
        Ok(())
    }

    pub fn set_include_self(&mut self, include: bool) {
        self.config.self_match = if include { SelfMatch::Include } else { SelfMatch::Exclude };
    }

    #[wasm_bindgen(getter)]
    pub fn count_references(&self) -> usize {
        self.reference.len()
    }

    pub fn search(&self, k: usize) -> Result<NeighborsWASM, JsValue> {
        let config = self.config.clone().with_k(k);
        search(&self.reference, self.query.as_ref(), &config)
            .map(NeighborsWASM::from)
            .map_err(to_js)
    }
}

fn flat_points(dims: usize, values: &[f64]) -> Result<PointMatrix, JsValue> {
    if dims == 0 || values.len() % dims != 0 {
        return Err(to_js(KnnError::MalformedMatrix { rows: dims, cols: values.len() / dims.max(1), len: values.len() }));
    }
    PointMatrix::from_vec(dims, values.len() / dims, values.to_vec()).map_err(to_js)
}

//! # allknn
//!
//! `allknn` is a Rust library for exact all-k-nearest-neighbor search, designed to be used in
//! Rust as well as compiled to WebAssembly (WASM). For every point of a query set it finds the
//! `k` closest points of a reference set under the Euclidean distance, returning both their
//! indices and distances.
//!
//! ## Features
//!
//! - **Space-partitioning tree**: a kd-tree with tight bounding boxes and midpoint splits on the widest dimension.
//! - **Three strategies**: naive brute force, single-tree and dual-tree search, all returning identical results.
//! - **Original order**: results are mapped back from the tree's internal order to the caller's point order.
//! - **WASM-ready**: a `wasm-bindgen` wrapper around the search call.
//!
//! ## Example
//!
//! ```
//! use allknn::{search, PointMatrix, SearchConfig, SearchMode};
//!
//! let points = PointMatrix::from_points(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [5.0, 5.0]]).unwrap();
//! let config = SearchConfig::new(1).with_mode(SearchMode::Dual);
//!
//! // No query set: every point is queried against the others.
//! let result = search(&points, None, &config).unwrap();
//! assert_eq!(result.neighbors_of(3), &[1]);
//! assert_eq!(result.distances_of(3), &[41.0f64.sqrt()]);
//! ```
//!
//! ## Main Interface
//!
//! The primary entry points are the [`search`] function and the reusable [`AllKnn`] engine.

pub mod algorithm;
mod bounds;
mod candidates;
mod error;
mod kdtree;
mod matrix;
mod remap;
mod search;
pub mod wasm;

pub use algorithm::SearchStats;
pub use algorithm::SearchStrategy;
pub use algorithm::SelfPairing;
pub use bounds::BoundingBox;
pub use candidates::Candidate;
pub use candidates::CandidateSet;
pub use error::KnnError;
pub use error::Result;
pub use kdtree::KdNode;
pub use kdtree::KdTree;
pub use matrix::distance_sq;
pub use matrix::IndexMatrix;
pub use matrix::Matrix;
pub use matrix::PointMatrix;
pub use remap::remap;
pub use remap::Permutation;
pub use search::search;
pub use search::AllKnn;
pub use search::Neighbors;
pub use search::SearchConfig;
pub use search::SearchMode;
pub use search::SelfMatch;
pub use search::DEFAULT_LEAF_SIZE;

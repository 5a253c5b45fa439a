use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while validating input, building trees or searching.
#[derive(Error, Debug)]
pub enum KnnError {
    #[error("invalid k: {k}; must be greater than 0 and less than the number of reference points ({reference_points})")]
    InvalidK { k: usize, reference_points: usize },

    #[error("invalid leaf size: {0}; must be at least 1")]
    InvalidLeafSize(usize),

    #[error("dimension mismatch: reference set has {expected} dimensions, query set has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("{0} set contains no points")]
    EmptyPointSet(&'static str),

    #[error("{set} point {point} has a non-finite coordinate in dimension {dim}")]
    NonFinite { set: &'static str, point: usize, dim: usize },

    #[error("malformed matrix: {rows} x {cols} does not match {len} values")]
    MalformedMatrix { rows: usize, cols: usize, len: usize },

    #[error("index {index} breaks the permutation over {len} points")]
    InvalidPermutation { index: usize, len: usize },

    #[error("could not allocate {requested} entries for {what}")]
    ResourceExhaustion { what: &'static str, requested: usize },

    #[error("data unavailable: {}", path.display())]
    DataUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error in {} at line {line}: {message}", path.display())]
    Parse { path: PathBuf, line: usize, message: String },
}

impl KnnError {
    /// True for errors caused by arguments the caller can fix before retrying.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            KnnError::InvalidK { .. }
                | KnnError::InvalidLeafSize(_)
                | KnnError::DimensionMismatch { .. }
                | KnnError::EmptyPointSet(_)
                | KnnError::NonFinite { .. }
                | KnnError::MalformedMatrix { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, KnnError>;

/// Allocates a vector with exactly `len` slots, reporting allocation failure as an error.
pub(crate) fn try_vec<T>(what: &'static str, len: usize) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| KnnError::ResourceExhaustion { what, requested: len })?;
    Ok(v)
}

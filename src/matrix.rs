use crate::error::{try_vec, KnnError, Result};
use rand::prelude::*;
use rand::rngs::StdRng;
use std::fmt::Display;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Dense column-major matrix.
///
/// Column `c` occupies `data[c * rows..(c + 1) * rows]`, so a column is a contiguous slice.
/// Point sets store one point per column; result matrices store one query per column.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

/// A set of `dims`-dimensional points, one per column.
pub type PointMatrix = Matrix<f64>;
/// Neighbor indices, `k` rows by one column per query point.
pub type IndexMatrix = Matrix<usize>;

impl<T: Copy + Default> Matrix<T> {
    /// Creates a `rows x cols` matrix filled with `T::default()`.
    pub fn zeros(rows: usize, cols: usize) -> Result<Self> {
        let len = rows.checked_mul(cols).ok_or(KnnError::ResourceExhaustion {
            what: "matrix",
            requested: usize::MAX,
        })?;
        let mut data = try_vec("matrix", len)?;
        data.resize(len, T::default());
        Ok(Self { rows, cols, data })
    }

    /// Wraps column-major `data`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Result<Self> {
        if rows.checked_mul(cols) != Some(data.len()) {
            return Err(KnnError::MalformedMatrix { rows, cols, len: data.len() });
        }
        Ok(Self { rows, cols, data })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> T {
        self.data[col * self.rows + row]
    }

    pub fn set(&mut self, row: usize, col: usize, value: T) {
        self.data[col * self.rows + row] = value;
    }

    pub fn column(&self, col: usize) -> &[T] {
        &self.data[col * self.rows..(col + 1) * self.rows]
    }

    pub fn column_mut(&mut self, col: usize) -> &mut [T] {
        &mut self.data[col * self.rows..(col + 1) * self.rows]
    }

    /// Iterates over the columns in order.
    pub fn columns(&self) -> impl Iterator<Item = &[T]> + '_ {
        (0..self.cols).map(move |c| self.column(c))
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl<T: Copy + Default + Display> Matrix<T> {
    /// Writes the matrix to a text file, one column per line, values separated by commas.
    ///
    /// This is the layout [`PointMatrix::import`] reads back.
    pub fn export<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let unavailable = |source| KnnError::DataUnavailable { path: path.to_path_buf(), source };

        let file = File::create(path).map_err(unavailable)?;
        let mut writer = BufWriter::new(file);
        for column in self.columns() {
            let line: Vec<String> = column.iter().map(|v| v.to_string()).collect();
            writeln!(writer, "{}", line.join(",")).map_err(unavailable)?;
        }
        writer.flush().map_err(unavailable)
    }
}

impl PointMatrix {
    /// Builds a point matrix from a list of points of equal dimensionality.
    pub fn from_points<P: AsRef<[f64]>>(points: &[P]) -> Result<Self> {
        let dims = points.first().map_or(0, |p| p.as_ref().len());
        let mut data = try_vec("points", dims * points.len())?;
        for p in points {
            let p = p.as_ref();
            if p.len() != dims {
                return Err(KnnError::DimensionMismatch { expected: dims, actual: p.len() });
            }
            data.extend_from_slice(p);
        }
        Self::from_vec(dims, points.len(), data)
    }

    /// Generates `count` points uniformly distributed in the unit hypercube.
    pub fn random(dims: usize, count: usize, seed: u64) -> Result<Self> {
        let mut points = Self::zeros(dims, count)?;
        let mut rng = StdRng::seed_from_u64(seed);
        points.data.iter_mut().for_each(|v| *v = rng.r#gen::<f64>());
        Ok(points)
    }

    /// Dimensionality of each point.
    pub fn dims(&self) -> usize {
        self.rows
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.cols == 0
    }

    /// Coordinates of point `index`.
    pub fn point(&self, index: usize) -> &[f64] {
        self.column(index)
    }

    /// Reads points from a text file: one point per line, coordinates separated by
    /// commas and/or whitespace. Blank lines and lines starting with `#` are skipped.
    pub fn import<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|source| KnnError::DataUnavailable { path: path.to_path_buf(), source })?;
        let reader = BufReader::new(file);

        let mut dims = None;
        let mut data = Vec::new();
        let mut count = 0;

        for (i, line) in reader.lines().enumerate() {
            let line = line
                .map_err(|source| KnnError::DataUnavailable { path: path.to_path_buf(), source })?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parse_error = |message: String| KnnError::Parse {
                path: path.to_path_buf(),
                line: i + 1,
                message,
            };

            let before = data.len();
            for token in line.split(|c: char| c == ',' || c.is_whitespace()).filter(|t| !t.is_empty()) {
                let value = token
                    .parse::<f64>()
                    .map_err(|e| parse_error(format!("'{}': {}", token, e)))?;
                data.push(value);
            }

            let width = data.len() - before;
            match dims {
                None => dims = Some(width),
                Some(d) if d != width => {
                    return Err(parse_error(format!("expected {} values, found {}", d, width)));
                }
                Some(_) => {}
            }
            count += 1;
        }

        Self::from_vec(dims.unwrap_or(0), count, data)
    }

    /// Fails if any coordinate is NaN or infinite.
    pub(crate) fn check_finite(&self, set: &'static str) -> Result<()> {
        for (point, column) in self.columns().enumerate() {
            if let Some(dim) = column.iter().position(|v| !v.is_finite()) {
                return Err(KnnError::NonFinite { set, point, dim });
            }
        }
        Ok(())
    }
}

/// Squared Euclidean distance between two points of equal dimensionality.
#[inline]
pub fn distance_sq(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

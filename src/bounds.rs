/// Axis-aligned bounding box in N-dimensional space.
///
/// An empty box has `min = +inf` and `max = -inf` in every dimension and grows as
/// points are added. All distance methods return exact Euclidean bounds: `min_*`
/// never over-estimates and `max_*` never under-estimates, which is what makes
/// tree pruning exact.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: Vec<f64>,
    pub max: Vec<f64>,
}

impl BoundingBox {
    pub fn new(min: Vec<f64>, max: Vec<f64>) -> Self {
        debug_assert_eq!(min.len(), max.len());
        Self { min, max }
    }

    /// An empty box that contains nothing.
    pub fn empty(dims: usize) -> Self {
        Self {
            min: vec![f64::INFINITY; dims],
            max: vec![f64::NEG_INFINITY; dims],
        }
    }

    pub fn dims(&self) -> usize {
        self.min.len()
    }

    /// Extends the box to include `point`.
    pub fn grow(&mut self, point: &[f64]) {
        for (d, &v) in point.iter().enumerate() {
            if v < self.min[d] { self.min[d] = v; }
            if v > self.max[d] { self.max[d] = v; }
        }
    }

    pub fn contains(&self, point: &[f64]) -> bool {
        point
            .iter()
            .enumerate()
            .all(|(d, &v)| v >= self.min[d] && v <= self.max[d])
    }

    pub fn contains_box(&self, other: &BoundingBox) -> bool {
        (0..self.dims()).all(|d| other.min[d] >= self.min[d] && other.max[d] <= self.max[d])
    }

    /// Extent along `dim`; negative for an empty box.
    pub fn width(&self, dim: usize) -> f64 {
        self.max[dim] - self.min[dim]
    }

    /// Dimension with the largest extent, the lowest index winning ties.
    pub fn widest_dim(&self) -> usize {
        let mut best = 0;
        for d in 1..self.dims() {
            if self.width(d) > self.width(best) {
                best = d;
            }
        }
        best
    }

    pub fn center(&self) -> Vec<f64> {
        self.min.iter().zip(&self.max).map(|(lo, hi)| 0.5 * (lo + hi)).collect()
    }

    /// Squared distance from `point` to the nearest point of the box; zero inside.
    pub fn min_distance_sq_to_point(&self, point: &[f64]) -> f64 {
        let mut d2 = 0.0;
        for (d, &v) in point.iter().enumerate() {
            let gap = (self.min[d] - v).max(0.0).max(v - self.max[d]);
            d2 += gap * gap;
        }
        d2
    }

    /// Squared distance from `point` to the furthest corner of the box.
    pub fn max_distance_sq_to_point(&self, point: &[f64]) -> f64 {
        let mut d2 = 0.0;
        for (d, &v) in point.iter().enumerate() {
            let far = (v - self.min[d]).abs().max((self.max[d] - v).abs());
            d2 += far * far;
        }
        d2
    }

    /// Squared distance between the closest pair of points of the two boxes; zero if they overlap.
    pub fn min_distance_sq(&self, other: &BoundingBox) -> f64 {
        let mut d2 = 0.0;
        for d in 0..self.dims() {
            let gap = (self.min[d] - other.max[d]).max(0.0).max(other.min[d] - self.max[d]);
            d2 += gap * gap;
        }
        d2
    }

    /// Squared distance between the furthest pair of points of the two boxes.
    pub fn max_distance_sq(&self, other: &BoundingBox) -> f64 {
        let mut d2 = 0.0;
        for d in 0..self.dims() {
            let far = (self.max[d] - other.min[d]).abs().max((other.max[d] - self.min[d]).abs());
            d2 += far * far;
        }
        d2
    }

    pub fn min_distance_to_point(&self, point: &[f64]) -> f64 {
        self.min_distance_sq_to_point(point).sqrt()
    }

    pub fn max_distance_to_point(&self, point: &[f64]) -> f64 {
        self.max_distance_sq_to_point(point).sqrt()
    }

    pub fn min_distance(&self, other: &BoundingBox) -> f64 {
        self.min_distance_sq(other).sqrt()
    }

    pub fn max_distance(&self, other: &BoundingBox) -> f64 {
        self.max_distance_sq(other).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> BoundingBox {
        BoundingBox::new(vec![0.0, 0.0], vec![1.0, 1.0])
    }

    #[test]
    fn test_grow_and_contains() {
        let mut b = BoundingBox::empty(2);
        assert!(!b.contains(&[0.0, 0.0]));
        b.grow(&[1.0, -1.0]);
        b.grow(&[-2.0, 3.0]);
        assert_eq!(b.min, vec![-2.0, -1.0]);
        assert_eq!(b.max, vec![1.0, 3.0]);
        assert!(b.contains(&[0.0, 0.0]));
        assert!(b.contains(&[1.0, 3.0]));
        assert!(!b.contains(&[1.1, 0.0]));
    }

    #[test]
    fn test_widest_dim_ties_pick_lowest() {
        let b = BoundingBox::new(vec![0.0, 0.0, 0.0], vec![2.0, 3.0, 3.0]);
        assert_eq!(b.widest_dim(), 1);
        assert_eq!(unit_square().widest_dim(), 0);
    }

    #[test]
    fn test_point_distances() {
        let b = unit_square();
        // Inside
        assert_eq!(b.min_distance_to_point(&[0.5, 0.5]), 0.0);
        // Beside a face
        assert_eq!(b.min_distance_to_point(&[3.0, 0.5]), 2.0);
        // Beyond a corner
        assert_eq!(b.min_distance_to_point(&[4.0, 5.0]), 5.0);
        assert_eq!(b.max_distance_sq_to_point(&[0.0, 0.0]), 2.0);
        assert_eq!(b.max_distance_to_point(&[4.0, 5.0]), 41.0f64.sqrt());
    }

    #[test]
    fn test_box_distances() {
        let a = unit_square();
        let b = BoundingBox::new(vec![4.0, 5.0], vec![6.0, 6.0]);
        assert_eq!(a.min_distance(&b), 5.0);
        assert_eq!(b.min_distance(&a), 5.0);
        assert_eq!(a.max_distance_sq(&b), 36.0 + 36.0);

        let overlapping = BoundingBox::new(vec![0.5, 0.5], vec![2.0, 2.0]);
        assert_eq!(a.min_distance_sq(&overlapping), 0.0);
    }

    #[test]
    fn test_min_distance_is_lower_bound() {
        let b = BoundingBox::new(vec![-1.0, 2.0, 0.0], vec![1.0, 3.0, 0.5]);
        let q = [2.0, -1.0, 4.0];
        let corners = [
            [-1.0, 2.0, 0.0], [1.0, 2.0, 0.0], [-1.0, 3.0, 0.0], [1.0, 3.0, 0.5],
            [0.0, 2.5, 0.25], [1.0, 2.0, 0.5],
        ];
        let lower = b.min_distance_sq_to_point(&q);
        let upper = b.max_distance_sq_to_point(&q);
        for c in &corners {
            let d2: f64 = c.iter().zip(&q).map(|(a, b)| (a - b) * (a - b)).sum();
            assert!(lower <= d2 && d2 <= upper);
        }
    }

    #[test]
    fn test_contains_box() {
        let outer = BoundingBox::new(vec![0.0, 0.0], vec![10.0, 10.0]);
        let inner = BoundingBox::new(vec![1.0, 2.0], vec![3.0, 10.0]);
        assert!(outer.contains_box(&inner));
        assert!(!inner.contains_box(&outer));
    }
}

use crate::bounds::BoundingBox;
use crate::error::{try_vec, KnnError, Result};
use crate::matrix::PointMatrix;
use crate::remap::Permutation;

/// Marks a node without children.
const LEAF: usize = usize::MAX;

/// A node of a [`KdTree`].
///
/// Owns the points at internal positions `begin..begin + count` and a box that tightly
/// encloses them. Internal nodes reference exactly two children in the tree's arena.
#[derive(Clone, Debug)]
pub struct KdNode {
    bounds: BoundingBox,
    begin: usize,
    count: usize,
    left: usize, // LEAF if leaf
    right: usize,
}

impl KdNode {
    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    pub fn begin(&self) -> usize {
        self.begin
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Internal positions of the points below this node.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.begin..self.begin + self.count
    }

    pub fn is_leaf(&self) -> bool {
        self.left == LEAF
    }

    /// Arena ids of the two children, `None` for a leaf.
    pub fn children(&self) -> Option<(usize, usize)> {
        if self.is_leaf() { None } else { Some((self.left, self.right)) }
    }
}

/// Binary space-partitioning tree over a borrowed point set.
///
/// Points are never moved; the tree reorders an index array so that every node covers a
/// contiguous range of it. Nodes live in a flat arena with the root at id 0.
#[derive(Clone, Debug)]
pub struct KdTree<'a> {
    points: &'a PointMatrix,
    nodes: Vec<KdNode>,
    permutation: Permutation,
    leaf_size: usize,
}

impl<'a> KdTree<'a> {
    /// Builds the tree, splitting any node holding more than `leaf_size` points.
    ///
    /// Each split cuts the widest dimension of the node's box at the midpoint of its extent;
    /// points strictly below the midpoint go left. A node whose points all land on one side
    /// (e.g. duplicates) stays a leaf regardless of its size.
    pub fn build(points: &'a PointMatrix, leaf_size: usize) -> Result<Self> {
        if leaf_size == 0 {
            return Err(KnnError::InvalidLeafSize(leaf_size));
        }
        if points.is_empty() {
            return Err(KnnError::EmptyPointSet("tree"));
        }
        points.check_finite("tree")?;

        let count = points.len();
        let mut indices = try_vec("permutation", count)?;
        indices.extend(0..count);

        let mut builder = Builder {
            points,
            indices,
            nodes: try_vec("tree nodes", 2 * count.div_ceil(leaf_size))?,
            leaf_size,
        };
        builder.split(0, count)?;

        let Builder { indices, nodes, .. } = builder;
        Ok(Self {
            points,
            nodes,
            permutation: Permutation::from_old_from_new(indices)?,
            leaf_size,
        })
    }

    pub fn root(&self) -> usize {
        0
    }

    pub fn node(&self, id: usize) -> &KdNode {
        &self.nodes[id]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Arena ids of all leaves, in left-to-right order.
    pub fn leaves(&self) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            match self.nodes[id].children() {
                Some((left, right)) => {
                    stack.push(right);
                    stack.push(left);
                }
                None => out.push(id),
            }
        }
        out
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub fn height(&self) -> usize {
        fn depth(tree: &KdTree<'_>, id: usize) -> usize {
            match tree.nodes[id].children() {
                Some((l, r)) => 1 + depth(tree, l).max(depth(tree, r)),
                None => 1,
            }
        }
        depth(self, self.root())
    }

    pub fn leaf_size(&self) -> usize {
        self.leaf_size
    }

    pub fn dims(&self) -> usize {
        self.points.dims()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &'a PointMatrix {
        self.points
    }

    pub fn permutation(&self) -> &Permutation {
        &self.permutation
    }

    pub fn old_from_new(&self) -> &[usize] {
        self.permutation.old_from_new()
    }

    pub fn new_from_old(&self) -> &[usize] {
        self.permutation.new_from_old()
    }

    /// Coordinates of the point at internal position `new`.
    #[inline]
    pub fn point(&self, new: usize) -> &'a [f64] {
        self.points.point(self.permutation.to_old(new))
    }
}

struct Builder<'a> {
    points: &'a PointMatrix,
    indices: Vec<usize>,
    nodes: Vec<KdNode>,
    leaf_size: usize,
}

impl Builder<'_> {
    fn split(&mut self, begin: usize, count: usize) -> Result<usize> {
        let mut bounds = BoundingBox::empty(self.points.dims());
        for &i in &self.indices[begin..begin + count] {
            bounds.grow(self.points.point(i));
        }

        let id = self.push(KdNode { bounds, begin, count, left: LEAF, right: LEAF })?;
        if count <= self.leaf_size || self.points.dims() == 0 {
            return Ok(id);
        }

        let bounds = &self.nodes[id].bounds;
        let axis = bounds.widest_dim();
        let split_val = 0.5 * (bounds.min[axis] + bounds.max[axis]);

        let left_count = self.partition(begin, count, axis, split_val);
        if left_count == 0 || left_count == count {
            return Ok(id);
        }

        let left = self.split(begin, left_count)?;
        let right = self.split(begin + left_count, count - left_count)?;
        self.nodes[id].left = left;
        self.nodes[id].right = right;
        Ok(id)
    }

    /// Moves points with `coord < split_val` to the front of the range; returns how many.
    fn partition(&mut self, begin: usize, count: usize, axis: usize, split_val: f64) -> usize {
        let mut left = begin;
        let mut right = begin + count;
        while left < right {
            if self.points.get(axis, self.indices[left]) < split_val {
                left += 1;
            } else {
                right -= 1;
                self.indices.swap(left, right);
            }
        }
        left - begin
    }

    fn push(&mut self, node: KdNode) -> Result<usize> {
        self.nodes.try_reserve(1).map_err(|_| KnnError::ResourceExhaustion {
            what: "tree nodes",
            requested: self.nodes.len() + 1,
        })?;
        self.nodes.push(node);
        Ok(self.nodes.len() - 1)
    }
}

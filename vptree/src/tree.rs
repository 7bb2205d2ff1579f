use tracing::debug;

use crate::metric::Metric;

pub(crate) type NodeId = u32;

/// Median split below a pivot.
///
/// `near` holds the elements whose distance to the pivot sorted before the
/// median element; it shares the pivot, so searching it reuses the
/// query-to-pivot distance. `far` is re-pivoted on the median element and
/// holds it plus everything sorted after it.
#[derive(Debug, Clone)]
pub(crate) struct Split {
    pub(crate) radius: f64,
    pub(crate) near: Option<NodeId>,
    pub(crate) far: NodeId,
}

#[derive(Debug, Clone)]
pub(crate) enum Node {
    /// Holds one element, optionally partitioning the rest of its subtree.
    Pivot { item: u32, split: Option<Split> },
    /// A further split of the ancestor pivot's near region.
    Inner { split: Split },
}

enum Task {
    Pivot {
        id: NodeId,
        item: u32,
        start: usize,
        end: usize,
    },
    Inner {
        id: NodeId,
        start: usize,
        end: usize,
    },
}

/// VpTree is a static vantage-point tree over elements of type `T`.
///
/// The tree owns its elements and the metric. Elements keep the order in
/// which the construction iterator produced them; query results refer to
/// them by that position (see [`Match::index`]).
///
/// Construction is O(n log n) for well-spread distances. Adversarial
/// distance distributions may produce deep trees; construction never
/// recurses, searches recurse once per tree level.
pub struct VpTree<T, D> {
    pub(crate) items: Vec<T>,
    pub(crate) nodes: Vec<Node>,
    pub(crate) metric: D,
}

/// Match is a single result from a tree query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    /// Position of the element in construction order.
    pub index: usize,

    /// Distance between the query and the element.
    pub distance: f64,
}

impl<T, D: Metric<T>> VpTree<T, D> {
    /// Builds a tree from `elements`, consuming the iterator once.
    ///
    /// The first element becomes the root pivot. Every level sorts the
    /// remaining elements by distance to its pivot and splits at the median.
    ///
    /// Panics if more than `u32::MAX` elements are supplied.
    pub fn build<I>(elements: I, metric: D) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let items: Vec<T> = elements.into_iter().collect();
        assert!(
            items.len() <= u32::MAX as usize,
            "vptree: at most u32::MAX elements are supported"
        );
        let mut tree = Self {
            items,
            nodes: Vec::new(),
            metric,
        };
        tree.construct();
        debug!(
            elements = tree.items.len(),
            nodes = tree.nodes.len(),
            depth = tree.depth(),
            "vptree built"
        );
        tree
    }

    fn construct(&mut self) {
        if self.items.is_empty() {
            return;
        }

        // work[i] = (distance to the current pivot, item position)
        let mut work: Vec<(f64, u32)> = (1..self.items.len() as u32).map(|i| (0.0, i)).collect();
        let mut stack = Vec::new();

        let root = self.alloc();
        stack.push(Task::Pivot {
            id: root,
            item: 0,
            start: 0,
            end: work.len(),
        });

        while let Some(task) = stack.pop() {
            match task {
                Task::Pivot {
                    id,
                    item,
                    start,
                    end,
                } => {
                    if start == end {
                        self.nodes[id as usize] = Node::Pivot { item, split: None };
                        continue;
                    }
                    let pivot = &self.items[item as usize];
                    for entry in &mut work[start..end] {
                        entry.0 = self.metric.distance(pivot, &self.items[entry.1 as usize]);
                    }
                    work[start..end].sort_by(|a, b| a.0.total_cmp(&b.0));
                    let split = self.split(&work, start, end, &mut stack);
                    self.nodes[id as usize] = Node::Pivot {
                        item,
                        split: Some(split),
                    };
                }
                Task::Inner { id, start, end } => {
                    let split = self.split(&work, start, end, &mut stack);
                    self.nodes[id as usize] = Node::Inner { split };
                }
            }
        }
    }

    /// Splits the sorted, non-empty range `work[start..end]` at its median and
    /// schedules both halves.
    fn split(
        &mut self,
        work: &[(f64, u32)],
        start: usize,
        end: usize,
        stack: &mut Vec<Task>,
    ) -> Split {
        let mid = start + (end - start + 1) / 2 - 1;
        let (radius, median) = work[mid];

        let near = if start < mid {
            let id = self.alloc();
            stack.push(Task::Inner {
                id,
                start,
                end: mid,
            });
            Some(id)
        } else {
            None
        };

        let far = self.alloc();
        stack.push(Task::Pivot {
            id: far,
            item: median,
            start: mid + 1,
            end,
        });

        Split { radius, near, far }
    }

    fn alloc(&mut self) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(Node::Pivot {
            item: 0,
            split: None,
        });
        id
    }
}

impl<T, D> VpTree<T, D> {
    /// Returns the number of indexed elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the tree indexes nothing.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the element at construction position `index`.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Returns all elements in construction order.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Consumes the tree and returns its elements in construction order.
    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// Returns the metric the tree was built with.
    pub fn metric(&self) -> &D {
        &self.metric
    }

    /// Returns the number of levels on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        let mut deepest = 0;
        let mut stack: Vec<(NodeId, usize)> = vec![(0, 1)];
        while let Some((id, level)) = stack.pop() {
            deepest = deepest.max(level);
            let split = match &self.nodes[id as usize] {
                Node::Pivot { split, .. } => split.as_ref(),
                Node::Inner { split } => Some(split),
            };
            if let Some(split) = split {
                if let Some(near) = split.near {
                    stack.push((near, level + 1));
                }
                stack.push((split.far, level + 1));
            }
        }
        deepest
    }
}

impl<T: std::fmt::Debug, D> std::fmt::Debug for VpTree<T, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VpTree")
            .field("len", &self.items.len())
            .field("nodes", &self.nodes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::Euclidean;

    fn line(n: usize) -> Vec<[f64; 1]> {
        (0..n).map(|i| [i as f64]).collect()
    }

    fn pivots(tree: &VpTree<[f64; 1], Euclidean>) -> Vec<u32> {
        let mut out: Vec<u32> = tree
            .nodes
            .iter()
            .filter_map(|n| match n {
                Node::Pivot { item, .. } => Some(*item),
                Node::Inner { .. } => None,
            })
            .collect();
        out.sort_unstable();
        out
    }

    #[test]
    fn build_empty() {
        let tree = VpTree::build(Vec::<[f64; 1]>::new(), Euclidean);
        assert!(tree.is_empty());
        assert_eq!(tree.depth(), 0);
        assert!(tree.nodes.is_empty());
    }

    #[test]
    fn build_single() {
        let tree = VpTree::build(line(1), Euclidean);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.depth(), 1);
        assert!(matches!(tree.nodes[0], Node::Pivot { item: 0, split: None }));
    }

    #[test]
    fn every_element_is_a_pivot_once() {
        for n in [2, 3, 7, 64, 257] {
            let tree = VpTree::build(line(n), Euclidean);
            let expected: Vec<u32> = (0..n as u32).collect();
            assert_eq!(pivots(&tree), expected, "n={n}");
        }
    }

    #[test]
    fn root_radius_is_median_distance() {
        // Distances from 0.0 to the rest are 1..=8; median index (8+1)/2-1 = 3.
        let tree = VpTree::build(line(9), Euclidean);
        match &tree.nodes[0] {
            Node::Pivot {
                item: 0,
                split: Some(split),
            } => assert_eq!(split.radius, 4.0),
            other => panic!("unexpected root {other:?}"),
        }
    }

    #[test]
    fn depth_is_logarithmic_on_a_line() {
        let n = 1024;
        let tree = VpTree::build(line(n), Euclidean);
        // Each level at least halves the remaining range.
        assert!(tree.depth() <= 2 * 11, "depth {}", tree.depth());
    }

    #[test]
    fn equal_distances_still_index_everything() {
        let points = vec![[0.0]; 100];
        let tree = VpTree::build(points, Euclidean);
        assert_eq!(tree.len(), 100);
        assert_eq!(pivots(&tree).len(), 100);
    }

    #[test]
    fn items_keep_construction_order() {
        let points = vec![[3.0], [1.0], [2.0]];
        let tree = VpTree::build(points.clone(), Euclidean);
        assert_eq!(tree.items(), points.as_slice());
        assert_eq!(tree.get(1), Some(&[1.0]));
        assert_eq!(tree.get(3), None);
        assert_eq!(tree.into_items(), points);
    }
}

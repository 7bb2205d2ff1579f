use crate::metric::Metric;
use crate::tree::{Match, Node, NodeId, Split, VpTree};

/// Called for every element closer than the current threshold. Returns the
/// threshold to continue with.
trait Visitor {
    fn visit(&mut self, threshold: f64, m: Match) -> f64;
}

/// Keeps the closest match and tightens the threshold to it.
#[derive(Default)]
struct Nearest {
    best: Option<Match>,
}

impl Visitor for Nearest {
    fn visit(&mut self, _threshold: f64, m: Match) -> f64 {
        self.best = Some(m);
        m.distance
    }
}

/// Collects every match; the threshold never moves.
#[derive(Default)]
struct Collect {
    found: Vec<Match>,
}

impl Visitor for Collect {
    fn visit(&mut self, threshold: f64, m: Match) -> f64 {
        self.found.push(m);
        threshold
    }
}

/// Stops at the first match by collapsing the threshold to zero, which
/// prunes every remaining branch.
#[derive(Default)]
struct Exists {
    found: bool,
}

impl Visitor for Exists {
    fn visit(&mut self, _threshold: f64, _m: Match) -> f64 {
        self.found = true;
        0.0
    }
}

impl<T, D: Metric<T>> VpTree<T, D> {
    /// Returns the closest element to `query`, or `None` for an empty tree.
    ///
    /// Ties resolve to whichever minimal element the search meets first.
    pub fn nearest(&self, query: &T) -> Option<Match> {
        self.nearest_within(query, f64::INFINITY)
    }

    /// Returns the closest element strictly closer than `threshold`, or
    /// `None` if nothing qualifies.
    pub fn nearest_within(&self, query: &T, threshold: f64) -> Option<Match> {
        let mut v = Nearest::default();
        self.search(query, threshold, &mut v);
        v.best
    }

    /// Returns every element strictly closer than `threshold`.
    ///
    /// Results come in tree traversal order, not sorted by distance.
    pub fn range(&self, query: &T, threshold: f64) -> Vec<Match> {
        let mut v = Collect::default();
        self.search(query, threshold, &mut v);
        v.found
    }

    /// Returns true if any element is strictly closer than `threshold`.
    pub fn exists_within(&self, query: &T, threshold: f64) -> bool {
        let mut v = Exists::default();
        self.search(query, threshold, &mut v);
        v.found
    }

    fn search<V: Visitor>(&self, query: &T, threshold: f64, v: &mut V) {
        if self.nodes.is_empty() {
            return;
        }
        self.search_pivot(0, query, threshold, v);
    }

    fn search_pivot<V: Visitor>(
        &self,
        id: NodeId,
        query: &T,
        mut threshold: f64,
        v: &mut V,
    ) -> f64 {
        let (item, split) = match &self.nodes[id as usize] {
            Node::Pivot { item, split } => (*item as usize, split.as_ref()),
            Node::Inner { .. } => unreachable!("vptree: far child is always a pivot"),
        };
        let d = self.metric.distance(query, &self.items[item]);
        if d < threshold {
            threshold = v.visit(
                threshold,
                Match {
                    index: item,
                    distance: d,
                },
            );
        }
        match split {
            Some(split) => self.search_split(split, query, d, threshold, v),
            None => threshold,
        }
    }

    fn search_near<V: Visitor>(
        &self,
        id: Option<NodeId>,
        query: &T,
        pivot_d: f64,
        threshold: f64,
        v: &mut V,
    ) -> f64 {
        let Some(id) = id else {
            return threshold;
        };
        match &self.nodes[id as usize] {
            Node::Inner { split } => self.search_split(split, query, pivot_d, threshold, v),
            Node::Pivot { .. } => unreachable!("vptree: near child is never a pivot"),
        }
    }

    /// Descends both sides of a split, visiting the side the query falls in
    /// first and the other only if the triangle inequality allows a closer
    /// element there.
    fn search_split<V: Visitor>(
        &self,
        split: &Split,
        query: &T,
        pivot_d: f64,
        mut threshold: f64,
        v: &mut V,
    ) -> f64 {
        if pivot_d < split.radius {
            threshold = self.search_near(split.near, query, pivot_d, threshold, v);
            if pivot_d + threshold >= split.radius {
                threshold = self.search_pivot(split.far, query, threshold, v);
            }
        } else {
            threshold = self.search_pivot(split.far, query, threshold, v);
            if pivot_d < threshold + split.radius {
                threshold = self.search_near(split.near, query, pivot_d, threshold, v);
            }
        }
        threshold
    }
}

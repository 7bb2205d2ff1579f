use std::collections::VecDeque;

use hotspot_vptree::{Match, Metric, VpTree};

#[derive(Debug, Clone, Copy, Default)]
struct ElementState {
    in_cluster: bool,
    density_checked: bool,
}

/// Breadth-first expansion state shared by neighbor merge and DBSCAN.
///
/// Elements are addressed by their position in the tree. An element is
/// claimed (`in_cluster`) the moment it is queued, so no element is expanded
/// twice. `min_pts == 0` disables the density gate.
#[derive(Debug)]
pub(crate) struct Frontier {
    state: Vec<ElementState>,
    queue: VecDeque<usize>,
    cursor: usize,
    bandwidth: f64,
    min_pts: usize,
}

impl Frontier {
    pub(crate) fn new(len: usize, bandwidth: f64, min_pts: usize) -> Self {
        Self {
            state: vec![ElementState::default(); len],
            queue: VecDeque::new(),
            cursor: 0,
            bandwidth,
            min_pts,
        }
    }

    /// Finds the next unclaimed element dense enough to start a cluster,
    /// claims it and queues its unclaimed neighbors.
    fn next_seed<T, D: Metric<T>>(&mut self, tree: &VpTree<T, D>) -> Option<usize> {
        debug_assert!(self.queue.is_empty());
        while self.cursor < self.state.len() {
            let i = self.cursor;
            self.cursor += 1;
            if self.state[i].in_cluster {
                continue;
            }
            let neighbors = tree.range(&tree.items()[i], self.bandwidth);
            if neighbors.len() < self.min_pts {
                self.state[i].density_checked = true;
                continue;
            }
            self.state[i].in_cluster = true;
            self.claim(neighbors);
            return Some(i);
        }
        None
    }

    /// Pops the next queued member. Core members get their own unclaimed
    /// neighbors queued; border members are only marked as checked.
    fn advance<T, D: Metric<T>>(&mut self, tree: &VpTree<T, D>) -> Option<usize> {
        let i = self.queue.pop_front()?;
        if !self.state[i].density_checked {
            let neighbors = tree.range(&tree.items()[i], self.bandwidth);
            if neighbors.len() >= self.min_pts {
                self.claim(neighbors);
            } else {
                self.state[i].density_checked = true;
            }
        }
        Some(i)
    }

    fn claim(&mut self, neighbors: Vec<Match>) {
        for m in neighbors {
            let st = &mut self.state[m.index];
            if !st.in_cluster {
                st.in_cluster = true;
                self.queue.push_back(m.index);
            }
        }
    }
}

/// Clusters is a lazy, single-pass sequence of clusters.
///
/// Membership is decided while clusters are drawn: pull them one by one with
/// [`Clusters::next_cluster`], or use the [`Iterator`] impl, which collects
/// each cluster into a `Vec`. Clusters appear in the input order of their
/// first member; members follow breadth-first order from it.
#[derive(Debug)]
pub struct Clusters<T, D> {
    tree: VpTree<T, D>,
    frontier: Frontier,
}

impl<T, D: Metric<T>> Clusters<T, D> {
    pub(crate) fn new(tree: VpTree<T, D>, bandwidth: f64, min_pts: usize) -> Self {
        let frontier = Frontier::new(tree.len(), bandwidth, min_pts);
        Self { tree, frontier }
    }

    /// Starts the next cluster, or returns `None` when every element has
    /// been assigned or rejected as noise.
    ///
    /// The returned [`Cluster`] borrows this sequence. Dropping it before it
    /// is exhausted finishes its expansion without yielding, so later
    /// clusters are unaffected.
    pub fn next_cluster(&mut self) -> Option<Cluster<'_, T, D>> {
        let seed = self.frontier.next_seed(&self.tree)?;
        Some(Cluster {
            tree: &self.tree,
            frontier: &mut self.frontier,
            first: seed,
            seed: Some(seed),
        })
    }

    /// Returns the index the clusters are drawn from.
    pub fn tree(&self) -> &VpTree<T, D> {
        &self.tree
    }

    /// Draws every remaining cluster and returns, per element in input
    /// order, its cluster number counted from the first cluster this call
    /// draws. `None` marks elements left out of every cluster (DBSCAN noise)
    /// or drawn before this call.
    pub fn into_labels(mut self) -> Vec<Option<usize>> {
        let mut labels = vec![None; self.tree.len()];
        let mut n = 0;
        while let Some(mut cluster) = self.next_cluster() {
            while let Some(i) = cluster.next_index() {
                labels[i] = Some(n);
            }
            n += 1;
        }
        labels
    }
}

impl<T: Clone, D: Metric<T>> Iterator for Clusters<T, D> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Vec<T>> {
        self.next_cluster().map(|c| c.cloned().collect())
    }
}

/// One cluster being drawn from [`Clusters`]; yields its members.
pub struct Cluster<'a, T, D: Metric<T>> {
    tree: &'a VpTree<T, D>,
    frontier: &'a mut Frontier,
    first: usize,
    seed: Option<usize>,
}

impl<'a, T, D: Metric<T>> Cluster<'a, T, D> {
    /// Returns the element that started this cluster.
    pub fn first(&self) -> &'a T {
        &self.tree.items()[self.first]
    }

    /// Returns the input position of [`Cluster::first`].
    pub fn first_index(&self) -> usize {
        self.first
    }

    /// Returns the input position of the next member.
    pub fn next_index(&mut self) -> Option<usize> {
        if let Some(seed) = self.seed.take() {
            return Some(seed);
        }
        self.frontier.advance(self.tree)
    }
}

impl<'a, T, D: Metric<T>> Iterator for Cluster<'a, T, D> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let tree = self.tree;
        self.next_index().map(|i| &tree.items()[i])
    }
}

impl<T, D: Metric<T>> Drop for Cluster<'_, T, D> {
    fn drop(&mut self) {
        while self.frontier.advance(self.tree).is_some() {}
    }
}

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use hotspot_vptree::{Metric, VpTree};
use tracing::{debug, trace};

use crate::error::ClusterError;
use crate::meanshift::{MeanShiftClusters, MeanShiftParams};
use crate::table::ClusterTable;
use crate::vector::VectorSpace;

/// A cluster assembled from one or more sources.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedCluster<K, S: Hash + Eq> {
    /// Distinct members, in first-seen order.
    pub elements: Vec<K>,

    /// Sources that contributed to the cluster.
    pub sources: HashSet<S>,
}

/// Elements from several weighted sources, summed by element identity.
#[derive(Debug, Clone)]
pub struct WeightedUnion<K, S> {
    slots: HashMap<K, usize>,
    keys: Vec<K>,
    weights: Vec<f64>,
    sources: Vec<HashSet<S>>,
}

impl<K, S> Default for WeightedUnion<K, S> {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
            keys: Vec::new(),
            weights: Vec::new(),
            sources: Vec::new(),
        }
    }
}

impl<K: Hash + Eq + Clone, S: Hash + Eq + Clone> WeightedUnion<K, S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one source. An element already present gets `weight(element)`
    /// added to its total and `source` added to its source set.
    pub fn add_source<I, W>(&mut self, elements: I, weight: W, source: S)
    where
        I: IntoIterator<Item = K>,
        W: Fn(&K) -> f64,
    {
        for el in elements {
            let w = weight(&el);
            match self.slots.get(&el) {
                Some(&slot) => {
                    self.weights[slot] += w;
                    self.sources[slot].insert(source.clone());
                }
                None => {
                    self.slots.insert(el.clone(), self.keys.len());
                    self.keys.push(el);
                    self.weights.push(w);
                    self.sources.push(HashSet::from([source.clone()]));
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Distinct elements in first-seen order.
    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    /// Summed weights, parallel to [`WeightedUnion::keys`].
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn weight(&self, key: &K) -> Option<f64> {
        self.slots.get(key).map(|&s| self.weights[s])
    }

    pub fn sources(&self, key: &K) -> Option<&HashSet<S>> {
        self.slots.get(key).map(|&s| &self.sources[s])
    }
}

/// Builds a [`WeightedUnion`] from `(elements, weight, source)` groups.
pub fn sum_weights<K, S, W, I, G>(groups: G) -> WeightedUnion<K, S>
where
    K: Hash + Eq + Clone,
    S: Hash + Eq + Clone,
    W: Fn(&K) -> f64,
    I: IntoIterator<Item = K>,
    G: IntoIterator<Item = (I, W, S)>,
{
    let mut union = WeightedUnion::new();
    for (elements, weight, source) in groups {
        union.add_source(elements, weight, source);
    }
    union
}

/// Weighted mean-shift over several sources at once.
///
/// The groups are first summed into a [`WeightedUnion`]. `locate` places
/// each element in the vector space mean-shift runs in. Every resulting
/// cluster carries the source set of the original element nearest to its
/// converged center.
pub fn multi_mean_shift<K, S, T, D, V, L, W, I, G>(
    groups: G,
    locate: L,
    metric: D,
    space: V,
    params: MeanShiftParams,
) -> Result<MultiMeanShift<K, S, T, D>, ClusterError>
where
    K: Hash + Eq + Clone,
    S: Hash + Eq + Clone,
    T: Clone,
    D: Metric<T> + Clone,
    V: VectorSpace<T>,
    L: Fn(&K) -> T,
    W: Fn(&K) -> f64,
    I: IntoIterator<Item = K>,
    G: IntoIterator<Item = (I, W, S)>,
{
    let union = sum_weights(groups);
    debug!(elements = union.len(), "multi-source mean-shift");
    let origin = VpTree::build(union.keys().iter().map(locate), metric);
    let clusters = MeanShiftClusters::converge(origin, union.weights(), &space, params)?;
    Ok(MultiMeanShift { union, clusters })
}

/// Lazy clusters of [`multi_mean_shift`].
pub struct MultiMeanShift<K, S, T, D> {
    union: WeightedUnion<K, S>,
    clusters: MeanShiftClusters<T, D>,
}

impl<K, S, T, D> MultiMeanShift<K, S, T, D> {
    /// Returns the summed input.
    pub fn union(&self) -> &WeightedUnion<K, S> {
        &self.union
    }
}

impl<K, S, T, D> Iterator for MultiMeanShift<K, S, T, D>
where
    K: Clone,
    S: Hash + Eq + Clone,
    D: Metric<T>,
{
    type Item = MergedCluster<K, S>;

    fn next(&mut self) -> Option<MergedCluster<K, S>> {
        let mut cluster = self.clusters.next_cluster()?;
        let nearest = cluster.nearest_original()?;
        let mut elements = Vec::new();
        while let Some(i) = cluster.next_index() {
            elements.push(self.union.keys[i].clone());
        }
        Some(MergedCluster {
            elements,
            sources: self.union.sources[nearest.index].clone(),
        })
    }
}

/// Merges clusters produced independently per source.
///
/// Cluster `i` is merged with every other cluster sharing at least
/// `ceil(|i| * th_rate)` of its elements. Merges are transitive but shares
/// are only counted between input clusters, never against merged ones.
/// Output clusters follow the order of their first input cluster.
pub fn merge_clusters<K, S>(clusters: &[(Vec<K>, S)], th_rate: f64) -> Vec<MergedCluster<K, S>>
where
    K: Hash + Eq + Clone,
    S: Hash + Eq + Clone,
{
    let mut owners: HashMap<&K, Vec<usize>> = HashMap::new();
    for (i, (elements, _)) in clusters.iter().enumerate() {
        for el in elements {
            let ids = owners.entry(el).or_default();
            if ids.last() != Some(&i) {
                ids.push(i);
            }
        }
    }

    let mut table = ClusterTable::from_elements(0..clusters.len());
    let mut merges = 0usize;
    for (i, (elements, _)) in clusters.iter().enumerate() {
        let mut shared: HashMap<usize, usize> = HashMap::new();
        for el in elements {
            for &j in &owners[el] {
                if j != i {
                    *shared.entry(j).or_default() += 1;
                }
            }
        }
        let threshold = (elements.len() as f64 * th_rate).ceil() as usize;
        let mut partners: Vec<(usize, usize)> = shared
            .into_iter()
            .filter(|&(_, n)| n >= threshold)
            .collect();
        partners.sort_unstable();
        for (j, n) in partners {
            if table.concat_cluster(&i, &j) {
                merges += 1;
                trace!(cluster = i, other = j, shared = n, "merged");
            }
        }
    }
    debug!(clusters = clusters.len(), merges, th_rate, "merge clusters");

    table
        .to_cluster_member_lists()
        .into_iter()
        .map(|members| {
            let mut seen = HashSet::new();
            let mut merged = MergedCluster {
                elements: Vec::new(),
                sources: HashSet::new(),
            };
            for i in members {
                let (elements, source) = &clusters[i];
                merged.sources.insert(source.clone());
                merged
                    .elements
                    .extend(elements.iter().filter(|el| seen.insert(*el)).cloned());
            }
            merged
        })
        .collect()
}

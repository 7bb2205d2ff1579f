use std::collections::HashMap;
use std::hash::Hash;

use crate::error::ClusterError;

/// ClusterTable is a union-find table mapping elements to a cluster
/// representative.
///
/// Every element links to a parent; a root links to itself. Lookups walk the
/// links without compressing them. Merging always points the second root at
/// the first, so callers must not rely on which element ends up as the
/// representative.
///
/// Cluster numbers handed out by [`ClusterTable::to_cluster_index_map`] and
/// [`ClusterTable::to_cluster_member_lists`] follow the order in which roots
/// were first added.
#[derive(Debug, Clone)]
pub struct ClusterTable<E> {
    slots: HashMap<E, usize>,
    elements: Vec<E>,
    parent: Vec<usize>,
}

impl<E> Default for ClusterTable<E> {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
            elements: Vec::new(),
            parent: Vec::new(),
        }
    }
}

impl<E: Hash + Eq + Clone> ClusterTable<E> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table holding each of `elements` as its own cluster.
    pub fn from_elements<I: IntoIterator<Item = E>>(elements: I) -> Self {
        let mut table = Self::new();
        table.extend_elements(elements);
        table
    }

    /// Adds `element` as a singleton cluster. Known elements are left as they
    /// are.
    pub fn add_element(&mut self, element: E) {
        if self.slots.contains_key(&element) {
            return;
        }
        let slot = self.elements.len();
        self.slots.insert(element.clone(), slot);
        self.elements.push(element);
        self.parent.push(slot);
    }

    /// Adds every element of `elements`; see [`ClusterTable::add_element`].
    pub fn extend_elements<I: IntoIterator<Item = E>>(&mut self, elements: I) {
        for e in elements {
            self.add_element(e);
        }
    }

    /// Merges the clusters containing `a` and `b`.
    ///
    /// Returns false, changing nothing, if either element is unknown or both
    /// already share a root.
    pub fn concat_cluster(&mut self, a: &E, b: &E) -> bool {
        let (Some(&sa), Some(&sb)) = (self.slots.get(a), self.slots.get(b)) else {
            return false;
        };
        let ra = self.root_slot(sa);
        let rb = self.root_slot(sb);
        if ra == rb {
            return false;
        }
        self.parent[rb] = ra;
        true
    }

    /// Returns the representative of the cluster containing `element`.
    pub fn get_cluster(&self, element: &E) -> Result<&E, ClusterError> {
        let slot = self.slots.get(element).ok_or(ClusterError::NotFound)?;
        Ok(&self.elements[self.root_slot(*slot)])
    }

    /// Returns true if `a` and `b` are known and share a root.
    pub fn same_cluster(&self, a: &E, b: &E) -> bool {
        match (self.slots.get(a), self.slots.get(b)) {
            (Some(&sa), Some(&sb)) => self.root_slot(sa) == self.root_slot(sb),
            _ => false,
        }
    }

    /// Returns the number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns true if the table holds no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Returns the elements in the order they were added.
    pub fn elements(&self) -> &[E] {
        &self.elements
    }

    /// Returns the number of distinct clusters.
    pub fn cluster_count(&self) -> usize {
        self.parent
            .iter()
            .enumerate()
            .filter(|(i, p)| i == *p)
            .count()
    }

    /// Maps every element to its cluster number.
    pub fn to_cluster_index_map(&self) -> HashMap<E, usize> {
        let numbers = self.root_numbers();
        self.elements
            .iter()
            .enumerate()
            .map(|(slot, e)| (e.clone(), numbers[&self.root_slot(slot)]))
            .collect()
    }

    /// Lists the members of each cluster, indexed by cluster number. Members
    /// appear in the order they were added.
    pub fn to_cluster_member_lists(&self) -> Vec<Vec<E>> {
        let numbers = self.root_numbers();
        let mut clusters: Vec<Vec<E>> = vec![Vec::new(); numbers.len()];
        for (slot, e) in self.elements.iter().enumerate() {
            clusters[numbers[&self.root_slot(slot)]].push(e.clone());
        }
        clusters
    }

    fn root_slot(&self, mut slot: usize) -> usize {
        loop {
            let next = self.parent[slot];
            if next == slot {
                return slot;
            }
            slot = next;
        }
    }

    /// Numbers the roots in slot order.
    fn root_numbers(&self) -> HashMap<usize, usize> {
        let mut numbers = HashMap::new();
        for (slot, &p) in self.parent.iter().enumerate() {
            if p == slot {
                let n = numbers.len();
                numbers.insert(slot, n);
            }
        }
        numbers
    }
}

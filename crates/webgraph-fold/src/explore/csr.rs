use serde::{Deserialize, Serialize};

/// Compressed sparse row adjacency: the neighbors of node `n` are
/// `targets[offsets[n]..offsets[n + 1]]`, sorted and without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Csr {
    offsets: Vec<usize>,
    targets: Vec<u32>,
}

impl Csr {
    /// Build from `(source, target)` pairs. All ids must be below `num_nodes`.
    pub fn from_pairs(num_nodes: usize, mut pairs: Vec<(u32, u32)>) -> Self {
        pairs.sort_unstable();
        pairs.dedup();

        let mut offsets = vec![0; num_nodes + 1];
        for &(source, _) in &pairs {
            offsets[source as usize + 1] += 1;
        }
        for i in 1..offsets.len() {
            offsets[i] += offsets[i - 1];
        }
        let targets = pairs.into_iter().map(|(_, target)| target).collect();

        Self { offsets, targets }
    }

    /// Same graph with all edges reversed.
    pub fn transpose(&self) -> Self {
        let pairs = self
            .edges()
            .map(|(source, target)| (target, source))
            .collect();
        Self::from_pairs(self.num_nodes(), pairs)
    }

    pub fn num_nodes(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    pub fn num_edges(&self) -> usize {
        self.targets.len()
    }

    /// Neighbors of a node, empty for unknown nodes.
    pub fn neighbors(&self, node: u32) -> &[u32] {
        let node = node as usize;
        if node >= self.num_nodes() {
            return &[];
        }
        &self.targets[self.offsets[node]..self.offsets[node + 1]]
    }

    pub fn degree(&self, node: u32) -> usize {
        self.neighbors(node).len()
    }

    pub fn edges(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (0..self.num_nodes() as u32).flat_map(move |source| {
            self.neighbors(source)
                .iter()
                .map(move |&target| (source, target))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pairs() {
        let csr = Csr::from_pairs(4, vec![(2, 0), (0, 3), (0, 1), (0, 1), (2, 1)]);
        assert_eq!(csr.num_nodes(), 4);
        assert_eq!(csr.num_edges(), 4);
        assert_eq!(csr.neighbors(0), &[1, 3]);
        assert_eq!(csr.neighbors(1), &[] as &[u32]);
        assert_eq!(csr.neighbors(2), &[0, 1]);
        assert_eq!(csr.neighbors(7), &[] as &[u32]);
        assert_eq!(csr.degree(0), 2);
    }

    #[test]
    fn test_transpose() {
        let csr = Csr::from_pairs(3, vec![(0, 1), (0, 2), (2, 1)]);
        let transposed = csr.transpose();
        assert_eq!(transposed.neighbors(1), &[0, 2]);
        assert_eq!(transposed.neighbors(2), &[0]);
        assert_eq!(transposed.transpose(), csr);
    }
}

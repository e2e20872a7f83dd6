//! Partitions a batch's faces into same-person groups.
//!
//! Groups are the connected components of the verified-pair graph: two
//! faces share a group iff a path of verified edges joins them, even when
//! the pair itself was never verified directly.

use std::collections::HashMap;

use crate::grouping::domain::match_edge::MatchEdge;

/// Face indices believed to show one physical person within a batch.
///
/// Members are sorted ascending; singleton groups are valid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaceGroup {
    members: Vec<usize>,
}

impl FaceGroup {
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Smallest face index in the group.
    pub fn representative(&self) -> usize {
        self.members[0]
    }
}

/// Union-find over face indices `0..face_count`.
pub struct GroupBuilder {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl GroupBuilder {
    pub fn new(face_count: usize) -> Self {
        Self {
            parent: (0..face_count).collect(),
            rank: vec![0; face_count],
        }
    }

    /// Convenience: partition `face_count` faces by `edges` in one call.
    pub fn build(face_count: usize, edges: &[MatchEdge]) -> Vec<FaceGroup> {
        let mut builder = Self::new(face_count);
        for edge in edges {
            builder.union(edge.i, edge.j);
        }
        builder.into_groups()
    }

    /// Root of `i`'s set, halving the path on the way up.
    pub fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    /// Merges the sets containing `a` and `b`. Returns `false` if they
    /// were already one set.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return false;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
        true
    }

    /// Collects the sets, each sorted, ordered by smallest member.
    ///
    /// The result depends only on which indices are connected, never on
    /// the order unions were applied in.
    pub fn into_groups(mut self) -> Vec<FaceGroup> {
        let mut by_root: HashMap<usize, Vec<usize>> = HashMap::new();
        for idx in 0..self.parent.len() {
            let root = self.find(idx);
            by_root.entry(root).or_default().push(idx);
        }

        let mut groups: Vec<FaceGroup> = by_root
            .into_values()
            .map(|mut members| {
                members.sort_unstable();
                FaceGroup { members }
            })
            .collect();
        groups.sort_by_key(|g| g.representative());
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(i: usize, j: usize) -> MatchEdge {
        MatchEdge::new(i, j).unwrap()
    }

    fn members(groups: &[FaceGroup]) -> Vec<Vec<usize>> {
        groups.iter().map(|g| g.members().to_vec()).collect()
    }

    #[test]
    fn test_no_faces_gives_no_groups() {
        assert!(GroupBuilder::build(0, &[]).is_empty());
    }

    #[test]
    fn test_no_edges_gives_singletons() {
        let groups = GroupBuilder::build(4, &[]);
        assert_eq!(members(&groups), vec![vec![0], vec![1], vec![2], vec![3]]);
    }

    #[test]
    fn test_all_pairs_verified_gives_one_group() {
        let n = 5;
        let edges: Vec<MatchEdge> = (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| edge(i, j)))
            .collect();
        let groups = GroupBuilder::build(n, &edges);
        assert_eq!(members(&groups), vec![vec![0, 1, 2, 3, 4]]);
    }

    #[test]
    fn test_transitive_closure_joins_unverified_pair() {
        // 0-2 and 2-4 verified, 0-4 never verified: still one person.
        let groups = GroupBuilder::build(5, &[edge(0, 2), edge(2, 4)]);
        assert_eq!(members(&groups), vec![vec![0, 2, 4], vec![1], vec![3]]);
    }

    #[test]
    fn test_partition_is_independent_of_edge_order() {
        let edges = vec![edge(0, 3), edge(5, 6), edge(3, 7), edge(1, 2), edge(6, 8), edge(2, 9)];
        let forward = GroupBuilder::build(10, &edges);

        let mut reversed = edges.clone();
        reversed.reverse();
        let backward = GroupBuilder::build(10, &reversed);

        let mut rotated = edges.clone();
        rotated.rotate_left(3);
        let shifted = GroupBuilder::build(10, &rotated);

        assert_eq!(forward, backward);
        assert_eq!(forward, shifted);
        assert_eq!(
            members(&forward),
            vec![vec![0, 3, 7], vec![1, 2, 9], vec![4], vec![5, 6, 8]]
        );
    }

    #[test]
    fn test_every_face_in_exactly_one_group() {
        let groups = GroupBuilder::build(8, &[edge(0, 1), edge(4, 6), edge(6, 7)]);
        let mut seen: Vec<usize> = groups.iter().flat_map(|g| g.members().to_vec()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn test_union_reports_whether_sets_merged() {
        let mut builder = GroupBuilder::new(3);
        assert!(builder.union(0, 1));
        assert!(!builder.union(1, 0));
        assert_eq!(builder.find(0), builder.find(1));
        assert_ne!(builder.find(0), builder.find(2));
    }

    #[test]
    fn test_representative_is_smallest_member() {
        let groups = GroupBuilder::build(4, &[edge(3, 1)]);
        assert_eq!(groups[1].representative(), 1);
        assert_eq!(groups[1].len(), 2);
    }
}

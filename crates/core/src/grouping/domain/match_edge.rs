/// A verified same-person pair of face indices, with `i < j`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MatchEdge {
    pub i: usize,
    pub j: usize,
}

impl MatchEdge {
    /// Builds an edge with its endpoints in index order.
    ///
    /// Returns `None` for a self-loop.
    pub fn new(a: usize, b: usize) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self { i: a, j: b }),
            std::cmp::Ordering::Greater => Some(Self { i: b, j: a }),
            std::cmp::Ordering::Equal => None,
        }
    }
}

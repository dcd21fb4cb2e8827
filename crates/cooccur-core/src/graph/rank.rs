use std::cmp::Ordering;

use super::types::Node;

/// Composite prominence score: `3 * degree + count`.
#[must_use]
pub const fn priority_score(degree: u64, count: u64) -> u64 {
    degree.saturating_mul(3).saturating_add(count)
}

fn by_priority(a: &Node, b: &Node) -> Ordering {
    priority_score(b.degree, b.count)
        .cmp(&priority_score(a.degree, a.count))
        .then_with(|| b.strength.cmp(&a.strength))
        .then_with(|| a.id.cmp(&b.id))
}

/// Sorts nodes by descending score (ties: strength descending, then id
/// ascending) and assigns 1-based `label_priority` in that order.
pub fn rank_nodes(nodes: &mut [Node]) {
    nodes.sort_by(by_priority);
    for (rank, node) in nodes.iter_mut().enumerate() {
        node.label_priority = rank + 1;
    }
}

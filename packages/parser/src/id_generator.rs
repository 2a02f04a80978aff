use std::sync::atomic::{AtomicU64, Ordering};

use crate::ast::NodeId;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Next node ID in creation order.
///
/// IDs are process-wide and never reused, so a node constructed later always
/// has a larger ID than any node that already exists.
pub fn next_node_id() -> NodeId {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids() {
        let id1 = next_node_id();
        let id2 = next_node_id();
        let id3 = next_node_id();

        // Other tests allocate concurrently, so only ordering is guaranteed
        assert!(id1 < id2);
        assert!(id2 < id3);
    }
}

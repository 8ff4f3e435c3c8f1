//! Out-of-band data carried by a `Program` next to its nodes
//!
//! Nothing stored here takes part in structural equality.

use gml_diagnostics::FixDetail;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::ast::NodeId;

/// Fix provenance keyed by node identity, plus per-tree guards
#[derive(Debug, Clone, Default)]
pub struct AppliedDiagnostics {
    by_node: FxHashMap<NodeId, Vec<FixDetail>>,
    manual_recorded: FxHashSet<String>,
    preserve_layout: FxHashSet<NodeId>,
}

impl AppliedDiagnostics {
    /// Attach a fix record to `node`
    pub fn attach(&mut self, node: NodeId, detail: FixDetail) {
        self.by_node.entry(node).or_default().push(detail);
    }

    /// Fix records attached to `node`
    pub fn for_node(&self, node: NodeId) -> &[FixDetail] {
        self.by_node.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Nodes that carry at least one record
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.by_node.keys().copied()
    }

    /// Move every record from `from` to `to`
    pub fn retarget(&mut self, from: NodeId, to: NodeId) {
        if from == to {
            return;
        }
        if let Some(details) = self.by_node.remove(&from) {
            self.by_node.entry(to).or_default().extend(details);
        }
    }

    /// Mark a manual-only id as recorded. Returns `false` if it already was.
    pub fn mark_manual(&mut self, id: &str) -> bool {
        self.manual_recorded.insert(id.to_string())
    }

    pub fn is_manual_recorded(&self, id: &str) -> bool {
        self.manual_recorded.contains(id)
    }

    /// Ask printers to keep the blank-line layout around `node` as it is
    pub fn preserve_layout(&mut self, node: NodeId) {
        self.preserve_layout.insert(node);
    }

    pub fn is_layout_preserved(&self, node: NodeId) -> bool {
        self.preserve_layout.contains(&node)
    }

    pub fn is_empty(&self) -> bool {
        self.by_node.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gml_diagnostics::FeatherDiagnostic;

    #[test]
    fn test_retarget_moves_records() {
        let diagnostic = FeatherDiagnostic::new("GM2000", "Blend mode");
        let mut applied = AppliedDiagnostics::default();
        applied.attach(NodeId(3), FixDetail::automatic(&diagnostic));
        applied.retarget(NodeId(3), NodeId(9));
        assert!(applied.for_node(NodeId(3)).is_empty());
        assert_eq!(applied.for_node(NodeId(9)).len(), 1);
    }

    #[test]
    fn test_manual_guard() {
        let mut applied = AppliedDiagnostics::default();
        assert!(applied.mark_manual("GM2017"));
        assert!(!applied.mark_manual("GM2017"));
        assert!(applied.is_manual_recorded("GM2017"));
    }
}

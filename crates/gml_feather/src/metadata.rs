//! Attaching fix records to the nodes they touched
//!
//! Records live in the program's `AppliedDiagnostics` side table. A fixer
//! may name a node it later removed or replaced, and a later fixer may remove
//! a node an earlier one recorded on; either way the records fall back to the
//! program root so nothing is lost.

use gml_diagnostics::{FixDetail, TextRange};
use gml_parser::{NodeId, Program};
use tracing::trace;

use crate::fixer::AppliedFix;
use crate::walk::live_node_ids;

/// Attach every fix to its node and return the flat record list, in order
pub fn attach_all(program: &mut Program, fixes: Vec<AppliedFix>) -> Vec<FixDetail> {
    if fixes.is_empty() {
        return Vec::new();
    }
    let live = live_node_ids(&mut program.body);
    let orphaned: Vec<NodeId> = program
        .applied
        .nodes()
        .filter(|node| *node != NodeId::ROOT && !live.contains(node))
        .collect();
    for node in orphaned {
        program.applied.retarget(node, NodeId::ROOT);
    }

    let mut details = Vec::with_capacity(fixes.len());

    for fix in fixes {
        let node = fix.node.filter(|id| live.contains(id)).unwrap_or(NodeId::ROOT);
        trace!(
            id = %fix.detail.id,
            target = fix.detail.target.as_deref().unwrap_or("-"),
            node = node.0,
            "applied fix"
        );
        program.applied.attach(node, fix.detail.clone());
        details.push(fix.detail);
    }
    details
}

/// Is a record for `id` at exactly `range` already attached somewhere?
///
/// Text-derived fixes report without editing the tree, so a second run over
/// the same tree would report them again without this check.
pub fn is_recorded(program: &Program, id: &str, range: TextRange) -> bool {
    program
        .applied
        .nodes()
        .any(|node| program.applied.for_node(node).iter().any(|d| d.id == id && d.range == Some(range)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::parse;
    use gml_diagnostics::FeatherDiagnostic;

    #[test]
    fn test_missing_nodes_fall_back_to_root() {
        let mut program = parse("a(); b();");
        let diagnostic = FeatherDiagnostic::new("GM1000", "Stray break");
        let kept = program.body[0].id;
        let fixes = vec![
            AppliedFix::new(FixDetail::automatic(&diagnostic), kept),
            AppliedFix::new(FixDetail::automatic(&diagnostic), NodeId(999)),
        ];
        let details = attach_all(&mut program, fixes);
        assert_eq!(details.len(), 2);
        assert_eq!(program.applied.for_node(kept).len(), 1);
        assert_eq!(program.applied.for_node(NodeId::ROOT).len(), 1);
    }

    #[test]
    fn test_earlier_records_follow_removed_nodes_to_root() {
        let mut program = parse("a(); b();");
        let diagnostic = FeatherDiagnostic::new("GM1029", "Malformed number");
        let doomed = program.body[0].id;
        attach_all(&mut program, vec![AppliedFix::new(FixDetail::automatic(&diagnostic), doomed)]);
        assert_eq!(program.applied.for_node(doomed).len(), 1);

        program.body.remove(0);
        let kept = program.body[0].id;
        attach_all(&mut program, vec![AppliedFix::new(FixDetail::automatic(&diagnostic), kept)]);
        assert!(program.applied.for_node(doomed).is_empty());
        assert_eq!(program.applied.for_node(NodeId::ROOT).len(), 1);
        assert_eq!(program.applied.for_node(kept).len(), 1);
    }

    #[test]
    fn test_is_recorded_matches_id_and_range() {
        let mut program = parse("a();");
        let diagnostic = FeatherDiagnostic::new("GM1033", "Duplicate semicolon");
        let range = TextRange::new(3, 4);
        let detail = FixDetail::automatic(&diagnostic).with_range(Some(range));
        attach_all(&mut program, vec![AppliedFix::at_root(detail)]);
        assert!(is_recorded(&program, "GM1033", range));
        assert!(!is_recorded(&program, "GM1033", TextRange::new(4, 5)));
        assert!(!is_recorded(&program, "GM1051", range));
    }
}

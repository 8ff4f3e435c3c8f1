//! Where to put a statement that has to run before control leaves a list

use gml_parser::Stmt;

use super::statements::{is_exit_like, is_structurally_empty};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// A later statement already does the job
    AlreadySatisfied,
    At(usize),
}

/// Insertion point for a statement that must follow `list[trigger]`.
///
/// Scans forward from the trigger. A statement accepted by `is_reset` means
/// nothing needs inserting; the first exit-like statement is where the new
/// statement goes (it must run first). Otherwise it goes right after the
/// last statement that is not empty.
pub fn find_reset_insertion(list: &[Stmt], trigger: usize, is_reset: impl Fn(&Stmt) -> bool) -> Insertion {
    let mut last = trigger;
    for (i, stmt) in list.iter().enumerate().skip(trigger + 1) {
        if is_reset(stmt) {
            return Insertion::AlreadySatisfied;
        }
        if is_exit_like(stmt) {
            return Insertion::At(i);
        }
        if !is_structurally_empty(stmt) {
            last = i;
        }
    }
    Insertion::At(last + 1)
}

/// End of the run of statements accepted by `in_run`, starting after `start`
pub fn end_of_run(list: &[Stmt], start: usize, in_run: impl Fn(&Stmt) -> bool) -> usize {
    let mut end = start + 1;
    while end < list.len() && (in_run(&list[end]) || is_structurally_empty(&list[end])) {
        end += 1;
    }
    // Trailing empties stay after the inserted statement
    while end > start + 1 && is_structurally_empty(&list[end - 1]) {
        end -= 1;
    }
    end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matchers::calls::stmt_call_name;
    use crate::test_utils::parse;

    #[test]
    fn test_appends_after_last_statement() {
        let list = parse("gpu_set_blendmode(bm_add); draw_self(); ;").body;
        let at = find_reset_insertion(&list, 0, |s| stmt_call_name(s) == Some("gpu_set_blendmode"));
        assert_eq!(at, Insertion::At(2));
    }

    #[test]
    fn test_stops_before_exit() {
        let list = parse("shader_set(sh); draw_self(); return; foo();").body;
        let at = find_reset_insertion(&list, 0, |s| stmt_call_name(s) == Some("shader_reset"));
        assert_eq!(at, Insertion::At(2));
    }

    #[test]
    fn test_existing_reset() {
        let list = parse("shader_set(sh); draw_self(); shader_reset();").body;
        let at = find_reset_insertion(&list, 0, |s| stmt_call_name(s) == Some("shader_reset"));
        assert_eq!(at, Insertion::AlreadySatisfied);
    }

    #[test]
    fn test_end_of_run() {
        let list = parse("vertex_format_begin(); vertex_format_add_position(); ; vertex_format_add_colour(); ; x = 1;").body;
        let end = end_of_run(&list, 0, |s| {
            crate::matchers::calls::stmt_call_name(s).is_some_and(|n| n.starts_with("vertex_format_add_"))
        });
        assert_eq!(end, 4);
    }
}

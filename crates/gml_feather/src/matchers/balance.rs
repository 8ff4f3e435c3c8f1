//! Begin/end pairing within one statement list
//!
//! Only direct expression statements of the list count; pairs split across
//! nesting levels are left alone.

use gml_parser::Stmt;
use smallvec::SmallVec;

use super::calls::stmt_call_name;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalanceReport {
    pub begins: usize,
    pub ends: usize,
    /// Ends seen at depth zero
    pub unmatched_ends: SmallVec<[usize; 4]>,
    /// Begins still open when the list ends
    pub unmatched_begins: SmallVec<[usize; 4]>,
}

impl BalanceReport {
    /// Indices to delete, ascending. A list with no begins or no ends is
    /// never touched: the missing half is another diagnostic's business.
    pub fn removals(&self) -> SmallVec<[usize; 8]> {
        if self.begins == 0 || self.ends == 0 {
            return SmallVec::new();
        }
        let mut all: SmallVec<[usize; 8]> = self
            .unmatched_ends
            .iter()
            .chain(self.unmatched_begins.iter())
            .copied()
            .collect();
        all.sort_unstable();
        all
    }
}

/// One forward scan with a depth counter (kept as a stack of open indices)
pub fn scan_balance(list: &[Stmt], begin: &str, end: &str) -> BalanceReport {
    let mut report = BalanceReport::default();
    let mut open: SmallVec<[usize; 4]> = SmallVec::new();

    for (i, stmt) in list.iter().enumerate() {
        match stmt_call_name(stmt) {
            Some(name) if name == begin => {
                report.begins += 1;
                open.push(i);
            }
            Some(name) if name == end => {
                report.ends += 1;
                if open.pop().is_none() {
                    report.unmatched_ends.push(i);
                }
            }
            _ => {}
        }
    }
    report.unmatched_begins = open;
    report
}

/// Is the begin at `list[from]` closed later in the same list?
pub fn has_matching_end(
    list: &[Stmt],
    from: usize,
    is_begin: impl Fn(&Stmt) -> bool,
    is_end: impl Fn(&Stmt) -> bool,
) -> bool {
    let mut depth = 0usize;
    for stmt in list.iter().skip(from + 1) {
        if is_begin(stmt) {
            depth += 1;
        } else if is_end(stmt) {
            if depth == 0 {
                return true;
            }
            depth -= 1;
        }
    }
    false
}

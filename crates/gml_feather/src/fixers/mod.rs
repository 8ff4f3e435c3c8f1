//! Built-in fixers

mod gm1000_1001_stray_jumps;
mod gm1002_globalvar;
mod gm1003_1016_1100_hints;
mod gm1004_1038_duplicates;
mod gm1005_missing_arguments;
mod gm1008_1030_reserved_names;
mod gm1017_1023_substitutions;
mod gm1029_1062_literals;
mod gm1032_1034_arguments;
mod gm1033_1051_semicolons;
mod gm1036_nested_indices;
mod gm1056_1059_parameters;
mod gm1058_constructors;
mod gm2000_resets;
mod gm2004_2007_2061_rewrites;
mod gm2009_2025_2042_balance;
mod gm2011_2035_terminators;
mod gm2043_2044_declarations;

use crate::fixer::ManualOnly;
use crate::registry::FixerRegistry;

pub use gm1000_1001_stray_jumps::StrayJump;
pub use gm1002_globalvar::GlobalVarDeclaration;
pub use gm1003_1016_1100_hints::{BooleanStatements, DereferenceAssignments, EnumStringValues};
pub use gm1004_1038_duplicates::{DuplicateEnumMembers, DuplicateMacros};
pub use gm1005_missing_arguments::MissingArguments;
pub use gm1008_1030_reserved_names::ReservedNames;
pub use gm1017_1023_substitutions::DeprecatedNames;
pub use gm1029_1062_literals::{DocCommentTypes, MalformedNumbers};
pub use gm1032_1034_arguments::{ArgumentGaps, ArgumentsWithParameters};
pub use gm1033_1051_semicolons::{duplicate_semicolons, DuplicateSemicolons, MacroSemicolons};
pub use gm1036_nested_indices::NestedIndices;
pub use gm1056_1059_parameters::{DuplicateParameters, RequiredAfterOptional};
pub use gm1058_constructors::MissingConstructor;
pub use gm2000_resets::{ResetRule, StateReset, RESET_RULES};
pub use gm2004_2007_2061_rewrites::{AssignmentThroughAll, UndefinedFallback, UnusedLoopIndex};
pub use gm2009_2025_2042_balance::{BalanceRule, UnbalancedPair, BALANCE_RULES};
pub use gm2011_2035_terminators::{MissingEnd, MissingVertexBegin, Run, TerminatorRule, TERMINATOR_RULES};
pub use gm2043_2044_declarations::{BlockScopedLocals, DuplicateLocals};

/// Diagnostics that are recorded for a human, never rewritten
pub const MANUAL_IDS: &[&str] = &[
    "GM1010", "GM1013", "GM1041", "GM1052", "GM1063", "GM2017", "GM2023", "GM2033", "GM2040", "GM2046",
];

/// Register every built-in fixer
pub fn register_builtins(registry: &mut FixerRegistry) {
    registry.register("GM1000", StrayJump::breaks);
    registry.register("GM1001", StrayJump::continues);
    registry.register("GM1002", GlobalVarDeclaration::factory);
    registry.register("GM1003", EnumStringValues::factory);
    registry.register("GM1004", DuplicateEnumMembers::factory);
    registry.register("GM1005", MissingArguments::factory);
    registry.register("GM1008", ReservedNames::readonly);
    registry.register("GM1016", BooleanStatements::factory);
    registry.register("GM1017", DeprecatedNames::factory);
    registry.register("GM1023", DeprecatedNames::factory);
    registry.register("GM1029", MalformedNumbers::factory);
    registry.register("GM1030", ReservedNames::reserved);
    registry.register("GM1032", ArgumentGaps::factory);
    registry.register("GM1033", DuplicateSemicolons::factory);
    registry.register("GM1034", ArgumentsWithParameters::factory);
    registry.register("GM1036", NestedIndices::factory);
    registry.register("GM1038", DuplicateMacros::factory);
    registry.register("GM1051", MacroSemicolons::factory);
    registry.register("GM1056", RequiredAfterOptional::factory);
    registry.register("GM1058", MissingConstructor::factory);
    registry.register("GM1059", DuplicateParameters::factory);
    registry.register("GM1062", DocCommentTypes::factory);
    registry.register("GM1100", DereferenceAssignments::factory);

    registry.register("GM2004", UnusedLoopIndex::factory);
    registry.register("GM2007", AssignmentThroughAll::factory);
    registry.register("GM2011", MissingVertexBegin::factory);
    registry.register("GM2043", BlockScopedLocals::factory);
    registry.register("GM2044", DuplicateLocals::factory);
    registry.register("GM2061", UndefinedFallback::factory);

    for rule in RESET_RULES {
        registry.register(rule.id, StateReset::factory);
    }
    for rule in BALANCE_RULES {
        registry.register(rule.id, UnbalancedPair::factory);
    }
    for rule in TERMINATOR_RULES {
        registry.register(rule.id, MissingEnd::factory);
    }
    for id in MANUAL_IDS {
        registry.register(id, ManualOnly::factory);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_catalog_entry_has_a_fixer() {
        let registry = FixerRegistry::with_builtins();
        for diagnostic in crate::builtin_catalog().iter() {
            assert!(registry.is_registered(&diagnostic.id), "{} has no fixer", diagnostic.id);
        }
    }

    #[test]
    fn test_every_builtin_fixer_builds() {
        let registry = FixerRegistry::with_builtins();
        for diagnostic in crate::builtin_catalog().iter() {
            let (fixer, registered) = registry.build(diagnostic);
            assert!(registered, "{} fell back to a no-op", diagnostic.id);
            assert_eq!(fixer.diagnostic().id, diagnostic.id);
        }
    }

    #[test]
    fn test_manual_ids_are_manual_only() {
        let registry = FixerRegistry::with_builtins();
        for id in MANUAL_IDS {
            let diagnostic = crate::test_utils::diagnostic(id);
            let (fixer, _) = registry.build(&diagnostic);
            assert!(fixer.is_manual_only(), "{} should be manual", id);
        }
    }
}

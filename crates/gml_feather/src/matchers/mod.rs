//! Stateless predicates and finders shared by the fixers

pub mod balance;
pub mod calls;
pub mod insertion;
pub mod scope;
pub mod statements;

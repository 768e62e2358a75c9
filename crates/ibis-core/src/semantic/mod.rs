//! Semantic analysis module
//!
//! Provides control flow graph construction, structural equivalence and
//! flow-sensitive query helpers.

pub mod cfg;
pub mod equivalence;
pub mod flow;
pub mod viewer;

pub use cfg::{BasicBlock, BlockId, CfgElement, ControlFlowGraph};
pub use equivalence::{
    are_equivalent, are_equivalent_idents, are_equivalent_stmt_lists, are_equivalent_stmts,
};
pub use flow::{exit_predecessors, is_redundant_jump, last_explicit_return, reachable_blocks};
pub use viewer::{CfgView, CfgViewEdge, CfgViewNode};

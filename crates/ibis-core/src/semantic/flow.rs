//! Flow-sensitive queries layered on the control flow graph.
//!
//! These helpers answer the questions lint rules ask most often: which
//! blocks flow into the exit, what a block's terminating `return` carries,
//! and whether a jump statement changes control flow at all.

use std::collections::HashSet;

use swc_ecma_ast::{Expr, Stmt};

use super::cfg::{BasicBlock, BlockId, CfgElement, ControlFlowGraph};

/// Ids of all blocks reachable from the start block.
pub fn reachable_blocks<'a>(cfg: &ControlFlowGraph<'a>) -> HashSet<BlockId<'a>> {
    let mut reachable = HashSet::new();
    let mut stack = vec![cfg.start()];
    while let Some(id) = stack.pop() {
        if !reachable.insert(id) {
            continue;
        }
        stack.extend(cfg.get(id).successors.iter().copied());
    }
    reachable
}

/// Direct predecessors of the exit block that are reachable from the start.
///
/// Dead code after an unconditional `return` keeps its edge into the exit
/// but must not count as a way the analyzed body terminates.
pub fn exit_predecessors<'a>(cfg: &ControlFlowGraph<'a>) -> Vec<BlockId<'a>> {
    let reachable = reachable_blocks(cfg);
    cfg.get(cfg.end())
        .predecessors
        .iter()
        .copied()
        .filter(|pred| reachable.contains(pred))
        .collect()
}

/// The argument of the block's terminating `return <expr>`, if any.
pub fn last_explicit_return<'a>(block: &BasicBlock<'a>) -> Option<&'a Expr> {
    match block.last_element()? {
        CfgElement::Stmt(Stmt::Return(ret)) => ret.arg.as_deref(),
        _ => None,
    }
}

/// True when the block ends in a jump that transfers control exactly where
/// fall-through would have gone anyway.
///
/// Value-carrying returns are never redundant (the value matters), and a
/// labeled `continue` is kept even when it targets the innermost loop.
pub fn is_redundant_jump<'a>(cfg: &ControlFlowGraph<'a>, id: BlockId<'a>) -> bool {
    let block = cfg.get(id);
    let Some(without_jump) = block.successor_without_jump else {
        return false;
    };
    let &[only_successor] = block.successors.as_slice() else {
        return false;
    };
    if only_successor != without_jump {
        return false;
    }
    match block.last_element() {
        Some(CfgElement::Stmt(Stmt::Break(_))) => true,
        Some(CfgElement::Stmt(Stmt::Continue(cont))) => cont.label.is_none(),
        Some(CfgElement::Stmt(Stmt::Return(ret))) => ret.arg.is_none(),
        _ => false,
    }
}

//! Control flow graph construction.
//!
//! Builds a graph of basic blocks for a statement sequence (typically a
//! function body). Blocks live in an arena and reference each other by id,
//! so loops form cycles without ownership cycles. The graph borrows the AST
//! and is discarded together with the analysis that built it.
//!
//! Construction walks the statement list right to left, threading the block
//! that control reaches *after* the statement being processed ("current
//! block") through the recursion. This builds forward edges such as loop
//! exits in a single pass, with no fix-up phase.

use std::collections::HashMap;

use id_arena::{Arena, Id};
use swc_common::{Span, Spanned};
use swc_ecma_ast::{
    BlockStmt, DoWhileStmt, Expr, ForHead, ForStmt, IfStmt, Pat, Stmt, SwitchStmt, TryStmt,
    VarDecl, VarDeclOrExpr, WhileStmt,
};

pub type BlockId<'a> = Id<BasicBlock<'a>>;

/// A syntax node recorded as an element of a basic block.
#[derive(Debug, Clone, Copy)]
pub enum CfgElement<'a> {
    Stmt(&'a Stmt),
    Expr(&'a Expr),
    VarDecl(&'a VarDecl),
    Pat(&'a Pat),
}

impl<'a> CfgElement<'a> {
    pub fn span(&self) -> Span {
        match self {
            CfgElement::Stmt(s) => s.span(),
            CfgElement::Expr(e) => e.span(),
            CfgElement::VarDecl(d) => d.span(),
            CfgElement::Pat(p) => p.span(),
        }
    }

    pub fn as_stmt(&self) -> Option<&'a Stmt> {
        match self {
            CfgElement::Stmt(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_expr(&self) -> Option<&'a Expr> {
        match self {
            CfgElement::Expr(e) => Some(e),
            _ => None,
        }
    }
}

/// A maximal straight-line run of elements with one entry and one exit.
#[derive(Debug)]
pub struct BasicBlock<'a> {
    pub id: BlockId<'a>,
    /// Elements in source order. A branching block holds its condition as
    /// the last element; a jump block holds the jump statement last.
    pub elements: Vec<CfgElement<'a>>,
    pub successors: Vec<BlockId<'a>>,
    pub predecessors: Vec<BlockId<'a>>,
    /// For a block ending in `break`, `continue` or a value-less `return`:
    /// the block that source-order fall-through would have reached had the
    /// jump been absent. Used to detect no-op jumps.
    pub successor_without_jump: Option<BlockId<'a>>,
}

impl<'a> BasicBlock<'a> {
    pub fn last_element(&self) -> Option<CfgElement<'a>> {
        self.elements.last().copied()
    }
}

#[derive(Debug)]
pub struct ControlFlowGraph<'a> {
    blocks: Arena<BasicBlock<'a>>,
    start: BlockId<'a>,
    end: BlockId<'a>,
}

impl<'a> ControlFlowGraph<'a> {
    /// Builds the graph for a statement sequence.
    ///
    /// Returns `None` when the sequence contains a construct the builder
    /// does not model. Callers must treat that as "skip this analysis for
    /// this body", never as an error; no partial graph is ever produced.
    pub fn from_statements(statements: &'a [Stmt]) -> Option<ControlFlowGraph<'a>> {
        let mut builder = CfgBuilder::new();
        match builder.build(statements) {
            Ok(graph) => Some(graph),
            Err(err) => {
                tracing::debug!("skipping control flow graph construction: {err}");
                None
            }
        }
    }

    pub fn from_block(block: &'a BlockStmt) -> Option<ControlFlowGraph<'a>> {
        Self::from_statements(&block.stmts)
    }

    pub fn start(&self) -> BlockId<'a> {
        self.start
    }

    pub fn end(&self) -> BlockId<'a> {
        self.end
    }

    pub fn get(&self, id: BlockId<'a>) -> &BasicBlock<'a> {
        &self.blocks[id]
    }

    pub fn blocks(&self) -> impl Iterator<Item = &BasicBlock<'a>> {
        self.blocks.iter().map(|(_, block)| block)
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn successors(&self, id: BlockId<'a>) -> impl Iterator<Item = &BasicBlock<'a>> {
        self.blocks[id]
            .successors
            .iter()
            .map(|&succ| &self.blocks[succ])
    }

    pub fn predecessors(&self, id: BlockId<'a>) -> impl Iterator<Item = &BasicBlock<'a>> {
        self.blocks[id]
            .predecessors
            .iter()
            .map(|&pred| &self.blocks[pred])
    }
}

#[derive(Debug, thiserror::Error)]
enum CfgError {
    #[error("unsupported statement kind for control flow")]
    UnsupportedStatement,
    #[error("no enclosing breakable construct for 'break'")]
    MissingBreakTarget,
    #[error("no enclosing loop for 'continue'")]
    MissingContinueTarget,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum BreakableKind {
    Loop,
    Switch,
    // A labeled non-loop statement; only `break <label>` may target it.
    LabeledBlock,
}

struct Breakable<'a> {
    break_target: BlockId<'a>,
    continue_target: Option<BlockId<'a>>,
    label: Option<String>,
    kind: BreakableKind,
}

struct CfgBuilder<'a> {
    blocks: Arena<BasicBlock<'a>>,
    end: BlockId<'a>,
    breakables: Vec<Breakable<'a>>,
    // Label of an enclosing labeled statement, consumed by the loop or
    // switch it wraps.
    pending_label: Option<String>,
}

impl<'a> CfgBuilder<'a> {
    fn new() -> Self {
        let mut blocks = Arena::new();
        let end = Self::alloc(&mut blocks);
        Self {
            blocks,
            end,
            breakables: Vec::new(),
            pending_label: None,
        }
    }

    fn build(&mut self, statements: &'a [Stmt]) -> Result<ControlFlowGraph<'a>, CfgError> {
        let fall_off_end = self.new_predecessor_of(self.end);
        let start = self.build_statements(fall_off_end, statements, None)?;
        Ok(self.finalize(start))
    }

    // ---- block management -------------------------------------------------

    fn alloc(blocks: &mut Arena<BasicBlock<'a>>) -> BlockId<'a> {
        blocks.alloc_with_id(|id| BasicBlock {
            id,
            elements: Vec::new(),
            successors: Vec::new(),
            predecessors: Vec::new(),
            successor_without_jump: None,
        })
    }

    fn new_block(&mut self) -> BlockId<'a> {
        Self::alloc(&mut self.blocks)
    }

    fn new_predecessor_of(&mut self, successor: BlockId<'a>) -> BlockId<'a> {
        let block = self.new_block();
        self.blocks[block].successors.push(successor);
        block
    }

    fn new_branching(&mut self, when_true: BlockId<'a>, when_false: BlockId<'a>) -> BlockId<'a> {
        let block = self.new_block();
        self.blocks[block].successors.push(when_true);
        self.blocks[block].successors.push(when_false);
        block
    }

    fn add_successor(&mut self, from: BlockId<'a>, to: BlockId<'a>) {
        self.blocks[from].successors.push(to);
    }

    // Elements are collected back to front during the reverse walk; the
    // finalize pass restores source order.
    fn push_element(&mut self, block: BlockId<'a>, element: CfgElement<'a>) {
        self.blocks[block].elements.push(element);
    }

    // ---- statement walk ---------------------------------------------------

    /// Processes `statements` right to left. `structural_tail` is the block
    /// that *source order* reaches after the last statement of the list,
    /// when that differs from the execution continuation (loop bodies); it
    /// only influences `successor_without_jump` bookkeeping.
    fn build_statements(
        &mut self,
        current: BlockId<'a>,
        statements: &'a [Stmt],
        structural_tail: Option<BlockId<'a>>,
    ) -> Result<BlockId<'a>, CfgError> {
        let mut current = current;
        let mut tail = structural_tail;
        for statement in statements.iter().rev() {
            current = self.build_statement(current, statement, tail)?;
            tail = None;
        }
        Ok(current)
    }

    fn build_statement(
        &mut self,
        current: BlockId<'a>,
        statement: &'a Stmt,
        structural_tail: Option<BlockId<'a>>,
    ) -> Result<BlockId<'a>, CfgError> {
        match statement {
            Stmt::Empty(_) => Ok(current),

            Stmt::Block(block) => self.build_statements(current, &block.stmts, structural_tail),

            Stmt::Expr(_) | Stmt::Decl(_) | Stmt::Debugger(_) => {
                self.push_element(current, CfgElement::Stmt(statement));
                Ok(current)
            }

            Stmt::If(if_stmt) => self.build_if(current, if_stmt),
            Stmt::While(while_stmt) => self.build_while(current, while_stmt),
            Stmt::DoWhile(do_while) => self.build_do_while(current, do_while),
            Stmt::For(for_stmt) => self.build_for(current, for_stmt),
            Stmt::ForIn(for_in) => self.build_for_each(
                current,
                for_each_parts(&for_in.left, &for_in.right, &for_in.body)?,
            ),
            Stmt::ForOf(for_of) => self.build_for_each(
                current,
                for_each_parts(&for_of.left, &for_of.right, &for_of.body)?,
            ),
            Stmt::Switch(switch_stmt) => self.build_switch(current, switch_stmt),
            Stmt::Try(try_stmt) => self.build_try(current, try_stmt),

            Stmt::Return(return_stmt) => {
                let block = self.new_predecessor_of(self.end);
                self.push_element(block, CfgElement::Stmt(statement));
                if return_stmt.arg.is_none() {
                    self.blocks[block].successor_without_jump =
                        Some(structural_tail.unwrap_or(current));
                }
                Ok(block)
            }

            Stmt::Throw(_) => {
                let block = self.new_predecessor_of(self.end);
                self.push_element(block, CfgElement::Stmt(statement));
                Ok(block)
            }

            Stmt::Break(break_stmt) => {
                let (target, kind) = {
                    let frame = match &break_stmt.label {
                        Some(label) => self
                            .breakables
                            .iter()
                            .rev()
                            .find(|b| b.label.as_deref() == Some(label.sym.as_str())),
                        // An unlabeled break targets the nearest loop or
                        // switch, skipping labeled blocks.
                        None => self
                            .breakables
                            .iter()
                            .rev()
                            .find(|b| b.kind != BreakableKind::LabeledBlock),
                    }
                    .ok_or(CfgError::MissingBreakTarget)?;
                    (frame.break_target, frame.kind)
                };
                let block = self.new_predecessor_of(target);
                self.push_element(block, CfgElement::Stmt(statement));
                // A break that exits a switch clause is never a fall-through
                // no-op candidate; only loop breaks record the alternative.
                if kind == BreakableKind::Loop {
                    self.blocks[block].successor_without_jump =
                        Some(structural_tail.unwrap_or(current));
                }
                Ok(block)
            }

            Stmt::Continue(continue_stmt) => {
                let target = {
                    let frame = match &continue_stmt.label {
                        Some(label) => self.breakables.iter().rev().find(|b| {
                            b.continue_target.is_some()
                                && b.label.as_deref() == Some(label.sym.as_str())
                        }),
                        None => self
                            .breakables
                            .iter()
                            .rev()
                            .find(|b| b.continue_target.is_some()),
                    }
                    .ok_or(CfgError::MissingContinueTarget)?;
                    frame.continue_target.ok_or(CfgError::MissingContinueTarget)?
                };
                let block = self.new_predecessor_of(target);
                self.push_element(block, CfgElement::Stmt(statement));
                // Without the continue, execution runs to the end of the
                // body and loops back; the cursor already points there.
                self.blocks[block].successor_without_jump = Some(current);
                Ok(block)
            }

            Stmt::Labeled(labeled) => {
                match &*labeled.body {
                    Stmt::While(_)
                    | Stmt::DoWhile(_)
                    | Stmt::For(_)
                    | Stmt::ForIn(_)
                    | Stmt::ForOf(_)
                    | Stmt::Switch(_) => {
                        // The wrapped construct claims the label for its own
                        // breakable frame.
                        self.pending_label = Some(labeled.label.sym.to_string());
                        let entry = self.build_statement(current, &labeled.body, structural_tail);
                        self.pending_label = None;
                        entry
                    }
                    _ => {
                        self.breakables.push(Breakable {
                            break_target: current,
                            continue_target: None,
                            label: Some(labeled.label.sym.to_string()),
                            kind: BreakableKind::LabeledBlock,
                        });
                        // A fresh predecessor keeps dead code after a
                        // labeled break out of the post-label block.
                        let body_start = self.new_predecessor_of(current);
                        let entry = self.build_statement(body_start, &labeled.body, None);
                        self.breakables.pop();
                        entry
                    }
                }
            }

            // Escape hatch: sloppy-mode `with` is not modeled; the whole
            // build is abandoned rather than guessing at its flow.
            Stmt::With(_) => Err(CfgError::UnsupportedStatement),
        }
    }

    // Branches never inherit the caller's structural tail: a jump ending a
    // branch is conditional, so its fall-through is the post-if cursor.
    fn build_if(
        &mut self,
        current: BlockId<'a>,
        if_stmt: &'a IfStmt,
    ) -> Result<BlockId<'a>, CfgError> {
        let when_false = match &if_stmt.alt {
            Some(alt) => {
                let entry = self.new_predecessor_of(current);
                self.build_statement(entry, alt, None)?
            }
            None => current,
        };
        let then_entry = self.new_predecessor_of(current);
        let when_true = self.build_statement(then_entry, &if_stmt.cons, None)?;

        let condition = self.new_branching(when_true, when_false);
        self.push_element(condition, CfgElement::Expr(&if_stmt.test));
        Ok(condition)
    }

    fn build_while(
        &mut self,
        current: BlockId<'a>,
        while_stmt: &'a WhileStmt,
    ) -> Result<BlockId<'a>, CfgError> {
        let loop_start = self.new_block();
        self.breakables.push(Breakable {
            break_target: current,
            continue_target: Some(loop_start),
            label: self.pending_label.take(),
            kind: BreakableKind::Loop,
        });

        let loop_bottom = self.new_block();
        let body_entry = self.build_statement(loop_bottom, &while_stmt.body, Some(current));
        self.breakables.pop();
        let body_entry = body_entry?;

        // `while (true)` never takes the exit edge.
        let condition = if is_true_literal(&while_stmt.test) {
            self.new_predecessor_of(body_entry)
        } else {
            self.new_branching(body_entry, current)
        };
        self.push_element(condition, CfgElement::Expr(&while_stmt.test));

        self.add_successor(loop_start, condition);
        self.add_successor(loop_bottom, loop_start);
        Ok(self.new_predecessor_of(loop_start))
    }

    fn build_do_while(
        &mut self,
        current: BlockId<'a>,
        do_while: &'a DoWhileStmt,
    ) -> Result<BlockId<'a>, CfgError> {
        let condition_start = self.new_block();
        self.breakables.push(Breakable {
            break_target: current,
            continue_target: Some(condition_start),
            label: self.pending_label.take(),
            kind: BreakableKind::Loop,
        });

        let body_bottom = self.new_block();
        let body_entry = self.build_statement(body_bottom, &do_while.body, Some(current));
        self.breakables.pop();
        let body_entry = body_entry?;

        let condition = if is_true_literal(&do_while.test) {
            self.new_predecessor_of(body_entry)
        } else {
            self.new_branching(body_entry, current)
        };
        self.push_element(condition, CfgElement::Expr(&do_while.test));

        self.add_successor(body_bottom, condition_start);
        self.add_successor(condition_start, condition);
        // Entered at the body: the condition runs after the first iteration.
        Ok(self.new_predecessor_of(body_entry))
    }

    fn build_for(
        &mut self,
        current: BlockId<'a>,
        for_stmt: &'a ForStmt,
    ) -> Result<BlockId<'a>, CfgError> {
        let loop_bottom = self.new_block();
        if let Some(update) = &for_stmt.update {
            self.push_element(loop_bottom, CfgElement::Expr(update));
        }

        let continue_target = self.new_block();
        self.breakables.push(Breakable {
            break_target: current,
            continue_target: Some(continue_target),
            label: self.pending_label.take(),
            kind: BreakableKind::Loop,
        });

        let body_bottom = self.new_predecessor_of(loop_bottom);
        let body_entry = self.build_statement(body_bottom, &for_stmt.body, Some(current));
        self.breakables.pop();
        let body_entry = body_entry?;

        let loop_root = match &for_stmt.test {
            Some(test) => {
                let condition = self.new_branching(body_entry, current);
                self.push_element(condition, CfgElement::Expr(test));
                condition
            }
            None => self.new_predecessor_of(body_entry),
        };
        self.add_successor(loop_bottom, loop_root);

        if for_stmt.update.is_some() {
            self.add_successor(continue_target, loop_bottom);
        } else if for_stmt.test.is_some() {
            self.add_successor(continue_target, loop_root);
        } else {
            self.add_successor(continue_target, body_entry);
        }

        let loop_start = match &for_stmt.init {
            Some(init) => {
                let block = self.new_predecessor_of(loop_root);
                let element = match init {
                    VarDeclOrExpr::VarDecl(decl) => CfgElement::VarDecl(decl),
                    VarDeclOrExpr::Expr(expr) => CfgElement::Expr(expr),
                };
                self.push_element(block, element);
                block
            }
            None => loop_root,
        };
        Ok(self.new_predecessor_of(loop_start))
    }

    fn build_for_each(
        &mut self,
        current: BlockId<'a>,
        parts: ForEachParts<'a>,
    ) -> Result<BlockId<'a>, CfgError> {
        let body_bottom = self.new_block();
        let continue_target = self.new_block();
        self.breakables.push(Breakable {
            break_target: current,
            continue_target: Some(continue_target),
            label: self.pending_label.take(),
            kind: BreakableKind::Loop,
        });

        let body_entry = self.build_statement(body_bottom, parts.body, Some(current));
        self.breakables.pop();
        let body_entry = body_entry?;

        // The iteration head both branches and binds the next element.
        let head = self.new_branching(body_entry, current);
        self.push_element(head, parts.binding);

        let loop_start = self.new_predecessor_of(head);
        self.push_element(loop_start, CfgElement::Expr(parts.iterated));

        self.add_successor(body_bottom, head);
        self.add_successor(continue_target, head);
        Ok(loop_start)
    }

    fn build_switch(
        &mut self,
        current: BlockId<'a>,
        switch_stmt: &'a SwitchStmt,
    ) -> Result<BlockId<'a>, CfgError> {
        self.breakables.push(Breakable {
            break_target: current,
            continue_target: None,
            label: self.pending_label.take(),
            kind: BreakableKind::Switch,
        });

        // Clause bodies chain in source order: a clause without a
        // terminating jump falls through into the next clause's entry.
        let mut clause_entries = Vec::with_capacity(switch_stmt.cases.len());
        let mut next_entry = current;
        let mut result = Ok(());
        for case in switch_stmt.cases.iter().rev() {
            let entry = self.new_predecessor_of(next_entry);
            match self.build_statements(entry, &case.cons, None) {
                Ok(entry) => {
                    clause_entries.push(entry);
                    next_entry = entry;
                }
                Err(err) => {
                    result = Err(err);
                    break;
                }
            }
        }
        self.breakables.pop();
        result?;

        let head = self.new_block();
        for &entry in clause_entries.iter().rev() {
            self.add_successor(head, entry);
        }
        // Without a default clause execution may skip every clause.
        let has_default = switch_stmt.cases.iter().any(|case| case.test.is_none());
        if !has_default {
            self.add_successor(head, current);
        }
        self.push_element(head, CfgElement::Expr(&switch_stmt.discriminant));
        Ok(head)
    }

    fn build_try(
        &mut self,
        current: BlockId<'a>,
        try_stmt: &'a TryStmt,
    ) -> Result<BlockId<'a>, CfgError> {
        // The finally clause runs before control leaves the construct for
        // every exit reason, so it is built first against the try
        // statement's own continuation.
        let after_try = match &try_stmt.finalizer {
            Some(finalizer) => {
                let bottom = self.new_predecessor_of(current);
                self.build_statements(bottom, &finalizer.stmts, None)?
            }
            None => current,
        };

        let catch_entry = match &try_stmt.handler {
            Some(handler) => {
                let bottom = self.new_predecessor_of(after_try);
                Some(self.build_statements(bottom, &handler.body.stmts, None)?)
            }
            None => None,
        };

        let try_bottom = self.new_predecessor_of(after_try);
        let try_entry = self.build_statements(try_bottom, &try_stmt.block.stmts, None)?;

        // Any statement in the try block may transfer control to the catch
        // handler. The edge is recorded once for the whole block; exception
        // points are not distinguished (deliberate over-approximation).
        if let Some(catch_entry) = catch_entry {
            self.add_successor(try_entry, catch_entry);
        }
        Ok(try_entry)
    }

    // ---- finalize ---------------------------------------------------------

    /// Collapses empty placeholder blocks, deduplicates edges, restores
    /// element source order and recomputes predecessors, producing the
    /// compact immutable graph.
    fn finalize(&mut self, start: BlockId<'a>) -> ControlFlowGraph<'a> {
        let mut arena: Arena<BasicBlock<'a>> = Arena::new();
        let mut mapping: HashMap<BlockId<'a>, BlockId<'a>> = HashMap::new();

        for (id, block) in self.blocks.iter() {
            if resolve(&self.blocks, id) != id {
                continue;
            }
            let elements: Vec<CfgElement<'a>> = block.elements.iter().rev().copied().collect();
            let new_id = arena.alloc_with_id(|new_id| BasicBlock {
                id: new_id,
                elements,
                successors: Vec::new(),
                predecessors: Vec::new(),
                successor_without_jump: None,
            });
            mapping.insert(id, new_id);
        }

        for (id, block) in self.blocks.iter() {
            let Some(&new_id) = mapping.get(&id) else {
                continue;
            };
            let mut successors: Vec<BlockId<'a>> = Vec::new();
            for &succ in &block.successors {
                let target = mapping[&resolve(&self.blocks, succ)];
                if !successors.contains(&target) {
                    successors.push(target);
                }
            }
            arena[new_id].successors = successors;
            arena[new_id].successor_without_jump = block
                .successor_without_jump
                .map(|succ| mapping[&resolve(&self.blocks, succ)]);
        }

        let ids: Vec<BlockId<'a>> = arena.iter().map(|(id, _)| id).collect();
        for id in ids {
            let successors = arena[id].successors.clone();
            for succ in successors {
                if !arena[succ].predecessors.contains(&id) {
                    arena[succ].predecessors.push(id);
                }
            }
        }

        ControlFlowGraph {
            start: mapping[&resolve(&self.blocks, start)],
            end: mapping[&self.end],
            blocks: arena,
        }
    }
}

/// Follows chains of empty single-successor placeholder blocks to the block
/// they stand for. Cycles of empty blocks (`for (;;);`) keep one canonical
/// representative alive.
fn resolve<'a>(blocks: &Arena<BasicBlock<'a>>, id: BlockId<'a>) -> BlockId<'a> {
    let mut seen: Vec<BlockId<'a>> = vec![id];
    let mut current = id;
    loop {
        let block = &blocks[current];
        if !block.elements.is_empty() || block.successors.len() != 1 {
            return current;
        }
        let next = block.successors[0];
        if let Some(pos) = seen.iter().position(|&s| s == next) {
            return seen[pos..]
                .iter()
                .copied()
                .min_by_key(|b| b.index())
                .unwrap_or(current);
        }
        seen.push(next);
        current = next;
    }
}

struct ForEachParts<'a> {
    binding: CfgElement<'a>,
    iterated: &'a Expr,
    body: &'a Stmt,
}

fn for_each_parts<'a>(
    left: &'a ForHead,
    right: &'a Expr,
    body: &'a Stmt,
) -> Result<ForEachParts<'a>, CfgError> {
    let binding = match left {
        ForHead::VarDecl(decl) => CfgElement::VarDecl(decl),
        ForHead::Pat(pat) => CfgElement::Pat(pat),
        ForHead::UsingDecl(_) => return Err(CfgError::UnsupportedStatement),
    };
    Ok(ForEachParts {
        binding,
        iterated: right,
        body,
    })
}

fn is_true_literal(expr: &Expr) -> bool {
    matches!(expr, Expr::Lit(swc_ecma_ast::Lit::Bool(b)) if b.value)
}

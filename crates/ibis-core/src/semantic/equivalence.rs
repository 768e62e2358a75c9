//! Structural equivalence between syntax subtrees.
//!
//! Two nodes are equivalent when they have the same kind and their children
//! are pairwise equivalent. Identifiers compare by exact text in strict mode;
//! in relaxed mode any identifier matches any identifier, with no consistency
//! requirement across positions. Literals compare by raw source text in both
//! modes, so `1` and `1.0` or `"x"` and `'x'` are never equivalent.
//!
//! The comparison is pure and total: node kinds without a dedicated rule
//! (function bodies, object literals, JSX, TypeScript-only constructs) fall
//! back to a span-insensitive whole-subtree comparison, preceded in relaxed
//! mode by a pass that blanks identifier names.

use swc_common::{EqIgnoreSpan, SyntaxContext};
use swc_ecma_ast::{
    Callee, Decl, Expr, ExprOrSpread, Ident, IdentName, Lit, MemberProp, Pat, Stmt, SwitchCase,
    VarDeclOrExpr,
};
use swc_ecma_visit::{VisitMut, VisitMutWith};

/// Compares two expressions for structural equivalence.
pub fn are_equivalent(a: &Expr, b: &Expr, relaxed: bool) -> bool {
    match (a, b) {
        (Expr::Ident(a), Expr::Ident(b)) => are_equivalent_idents(a, b, relaxed),
        (Expr::Lit(a), Expr::Lit(b)) => eq_lit(a, b),
        (Expr::This(_), Expr::This(_)) => true,
        (Expr::Paren(a), Expr::Paren(b)) => are_equivalent(&a.expr, &b.expr, relaxed),
        (Expr::Unary(a), Expr::Unary(b)) => {
            a.op == b.op && are_equivalent(&a.arg, &b.arg, relaxed)
        }
        (Expr::Update(a), Expr::Update(b)) => {
            a.op == b.op && a.prefix == b.prefix && are_equivalent(&a.arg, &b.arg, relaxed)
        }
        (Expr::Bin(a), Expr::Bin(b)) => {
            a.op == b.op
                && are_equivalent(&a.left, &b.left, relaxed)
                && are_equivalent(&a.right, &b.right, relaxed)
        }
        (Expr::Assign(a), Expr::Assign(b)) => {
            a.op == b.op
                && eq_fallback(&a.left, &b.left, relaxed)
                && are_equivalent(&a.right, &b.right, relaxed)
        }
        (Expr::Cond(a), Expr::Cond(b)) => {
            are_equivalent(&a.test, &b.test, relaxed)
                && are_equivalent(&a.cons, &b.cons, relaxed)
                && are_equivalent(&a.alt, &b.alt, relaxed)
        }
        (Expr::Member(a), Expr::Member(b)) => {
            are_equivalent(&a.obj, &b.obj, relaxed) && eq_member_prop(&a.prop, &b.prop, relaxed)
        }
        (Expr::Call(a), Expr::Call(b)) => {
            eq_callee(&a.callee, &b.callee, relaxed) && eq_args(&a.args, &b.args, relaxed)
        }
        (Expr::New(a), Expr::New(b)) => {
            are_equivalent(&a.callee, &b.callee, relaxed)
                && eq_option(a.args.as_ref(), b.args.as_ref(), |x, y| {
                    eq_args(x, y, relaxed)
                })
        }
        (Expr::Seq(a), Expr::Seq(b)) => {
            a.exprs.len() == b.exprs.len()
                && a.exprs
                    .iter()
                    .zip(&b.exprs)
                    .all(|(x, y)| are_equivalent(x, y, relaxed))
        }
        (Expr::Array(a), Expr::Array(b)) => {
            a.elems.len() == b.elems.len()
                && a.elems.iter().zip(&b.elems).all(|(x, y)| {
                    eq_option(x.as_ref(), y.as_ref(), |x, y| eq_arg(x, y, relaxed))
                })
        }
        (Expr::Tpl(a), Expr::Tpl(b)) => {
            a.quasis.len() == b.quasis.len()
                && a.quasis.iter().zip(&b.quasis).all(|(x, y)| x.raw == y.raw)
                && a.exprs.len() == b.exprs.len()
                && a.exprs
                    .iter()
                    .zip(&b.exprs)
                    .all(|(x, y)| are_equivalent(x, y, relaxed))
        }
        (Expr::Await(a), Expr::Await(b)) => are_equivalent(&a.arg, &b.arg, relaxed),
        (Expr::Yield(a), Expr::Yield(b)) => {
            a.delegate == b.delegate
                && eq_option(a.arg.as_deref(), b.arg.as_deref(), |x, y| {
                    are_equivalent(x, y, relaxed)
                })
        }
        _ => eq_fallback(a, b, relaxed),
    }
}

/// Compares two statements for structural equivalence.
pub fn are_equivalent_stmts(a: &Stmt, b: &Stmt, relaxed: bool) -> bool {
    match (a, b) {
        (Stmt::Block(a), Stmt::Block(b)) => {
            are_equivalent_stmt_lists(&a.stmts, &b.stmts, relaxed)
        }
        (Stmt::Empty(_), Stmt::Empty(_)) => true,
        (Stmt::Debugger(_), Stmt::Debugger(_)) => true,
        (Stmt::Expr(a), Stmt::Expr(b)) => are_equivalent(&a.expr, &b.expr, relaxed),
        (Stmt::Return(a), Stmt::Return(b)) => {
            eq_option(a.arg.as_deref(), b.arg.as_deref(), |x, y| {
                are_equivalent(x, y, relaxed)
            })
        }
        (Stmt::Throw(a), Stmt::Throw(b)) => are_equivalent(&a.arg, &b.arg, relaxed),
        (Stmt::Break(a), Stmt::Break(b)) => {
            eq_option(a.label.as_ref(), b.label.as_ref(), |x, y| {
                are_equivalent_idents(x, y, relaxed)
            })
        }
        (Stmt::Continue(a), Stmt::Continue(b)) => {
            eq_option(a.label.as_ref(), b.label.as_ref(), |x, y| {
                are_equivalent_idents(x, y, relaxed)
            })
        }
        (Stmt::If(a), Stmt::If(b)) => {
            are_equivalent(&a.test, &b.test, relaxed)
                && are_equivalent_stmts(&a.cons, &b.cons, relaxed)
                && eq_option(a.alt.as_deref(), b.alt.as_deref(), |x, y| {
                    are_equivalent_stmts(x, y, relaxed)
                })
        }
        (Stmt::While(a), Stmt::While(b)) => {
            are_equivalent(&a.test, &b.test, relaxed)
                && are_equivalent_stmts(&a.body, &b.body, relaxed)
        }
        (Stmt::DoWhile(a), Stmt::DoWhile(b)) => {
            are_equivalent(&a.test, &b.test, relaxed)
                && are_equivalent_stmts(&a.body, &b.body, relaxed)
        }
        (Stmt::For(a), Stmt::For(b)) => {
            eq_option(a.init.as_ref(), b.init.as_ref(), |x, y| {
                eq_for_init(x, y, relaxed)
            }) && eq_option(a.test.as_deref(), b.test.as_deref(), |x, y| {
                are_equivalent(x, y, relaxed)
            }) && eq_option(a.update.as_deref(), b.update.as_deref(), |x, y| {
                are_equivalent(x, y, relaxed)
            }) && are_equivalent_stmts(&a.body, &b.body, relaxed)
        }
        (Stmt::ForIn(a), Stmt::ForIn(b)) => {
            eq_fallback(&a.left, &b.left, relaxed)
                && are_equivalent(&a.right, &b.right, relaxed)
                && are_equivalent_stmts(&a.body, &b.body, relaxed)
        }
        (Stmt::ForOf(a), Stmt::ForOf(b)) => {
            a.is_await == b.is_await
                && eq_fallback(&a.left, &b.left, relaxed)
                && are_equivalent(&a.right, &b.right, relaxed)
                && are_equivalent_stmts(&a.body, &b.body, relaxed)
        }
        (Stmt::Switch(a), Stmt::Switch(b)) => {
            are_equivalent(&a.discriminant, &b.discriminant, relaxed)
                && a.cases.len() == b.cases.len()
                && a.cases
                    .iter()
                    .zip(&b.cases)
                    .all(|(x, y)| eq_switch_case(x, y, relaxed))
        }
        (Stmt::Labeled(a), Stmt::Labeled(b)) => {
            are_equivalent_idents(&a.label, &b.label, relaxed)
                && are_equivalent_stmts(&a.body, &b.body, relaxed)
        }
        (Stmt::Try(a), Stmt::Try(b)) => {
            are_equivalent_stmt_lists(&a.block.stmts, &b.block.stmts, relaxed)
                && eq_option(a.handler.as_ref(), b.handler.as_ref(), |x, y| {
                    eq_option(x.param.as_ref(), y.param.as_ref(), |p, q| {
                        eq_pat(p, q, relaxed)
                    }) && are_equivalent_stmt_lists(&x.body.stmts, &y.body.stmts, relaxed)
                })
                && eq_option(a.finalizer.as_ref(), b.finalizer.as_ref(), |x, y| {
                    are_equivalent_stmt_lists(&x.stmts, &y.stmts, relaxed)
                })
        }
        (Stmt::With(a), Stmt::With(b)) => {
            are_equivalent(&a.obj, &b.obj, relaxed)
                && are_equivalent_stmts(&a.body, &b.body, relaxed)
        }
        (Stmt::Decl(a), Stmt::Decl(b)) => eq_decl(a, b, relaxed),
        _ => false,
    }
}

/// Compares two statement sequences position for position.
pub fn are_equivalent_stmt_lists(a: &[Stmt], b: &[Stmt], relaxed: bool) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(x, y)| are_equivalent_stmts(x, y, relaxed))
}

pub fn are_equivalent_idents(a: &Ident, b: &Ident, relaxed: bool) -> bool {
    relaxed || a.sym == b.sym
}

fn eq_option<T>(a: Option<&T>, b: Option<&T>, eq: impl FnOnce(&T, &T) -> bool) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => eq(a, b),
        _ => false,
    }
}

fn eq_lit(a: &Lit, b: &Lit) -> bool {
    match (a, b) {
        // Raw text distinguishes spellings of the same value.
        (Lit::Str(a), Lit::Str(b)) => match (&a.raw, &b.raw) {
            (Some(x), Some(y)) => x == y,
            _ => a.value == b.value,
        },
        (Lit::Num(a), Lit::Num(b)) => match (&a.raw, &b.raw) {
            (Some(x), Some(y)) => x == y,
            _ => a.value == b.value,
        },
        (Lit::Bool(a), Lit::Bool(b)) => a.value == b.value,
        (Lit::Null(_), Lit::Null(_)) => true,
        (Lit::BigInt(a), Lit::BigInt(b)) => a.value == b.value,
        (Lit::Regex(a), Lit::Regex(b)) => a.exp == b.exp && a.flags == b.flags,
        (Lit::JSXText(a), Lit::JSXText(b)) => a.value == b.value,
        _ => false,
    }
}

fn eq_member_prop(a: &MemberProp, b: &MemberProp, relaxed: bool) -> bool {
    match (a, b) {
        (MemberProp::Ident(a), MemberProp::Ident(b)) => relaxed || a.sym == b.sym,
        (MemberProp::PrivateName(a), MemberProp::PrivateName(b)) => relaxed || a.name == b.name,
        (MemberProp::Computed(a), MemberProp::Computed(b)) => {
            are_equivalent(&a.expr, &b.expr, relaxed)
        }
        _ => false,
    }
}

fn eq_callee(a: &Callee, b: &Callee, relaxed: bool) -> bool {
    match (a, b) {
        (Callee::Expr(a), Callee::Expr(b)) => are_equivalent(a, b, relaxed),
        (Callee::Super(_), Callee::Super(_)) => true,
        (Callee::Import(_), Callee::Import(_)) => true,
        _ => false,
    }
}

fn eq_args(a: &[ExprOrSpread], b: &[ExprOrSpread], relaxed: bool) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| eq_arg(x, y, relaxed))
}

fn eq_arg(a: &ExprOrSpread, b: &ExprOrSpread, relaxed: bool) -> bool {
    a.spread.is_some() == b.spread.is_some() && are_equivalent(&a.expr, &b.expr, relaxed)
}

fn eq_for_init(a: &VarDeclOrExpr, b: &VarDeclOrExpr, relaxed: bool) -> bool {
    match (a, b) {
        (VarDeclOrExpr::VarDecl(a), VarDeclOrExpr::VarDecl(b)) => {
            eq_decl(&Decl::Var(a.clone()), &Decl::Var(b.clone()), relaxed)
        }
        (VarDeclOrExpr::Expr(a), VarDeclOrExpr::Expr(b)) => are_equivalent(a, b, relaxed),
        _ => false,
    }
}

fn eq_decl(a: &Decl, b: &Decl, relaxed: bool) -> bool {
    match (a, b) {
        (Decl::Var(a), Decl::Var(b)) => {
            a.kind == b.kind
                && a.decls.len() == b.decls.len()
                && a.decls.iter().zip(&b.decls).all(|(x, y)| {
                    eq_pat(&x.name, &y.name, relaxed)
                        && eq_option(x.init.as_deref(), y.init.as_deref(), |p, q| {
                            are_equivalent(p, q, relaxed)
                        })
                })
        }
        _ => eq_fallback(a, b, relaxed),
    }
}

fn eq_pat(a: &Pat, b: &Pat, relaxed: bool) -> bool {
    match (a, b) {
        (Pat::Ident(a), Pat::Ident(b)) => are_equivalent_idents(&a.id, &b.id, relaxed),
        _ => eq_fallback(a, b, relaxed),
    }
}

fn eq_switch_case(a: &SwitchCase, b: &SwitchCase, relaxed: bool) -> bool {
    eq_option(a.test.as_deref(), b.test.as_deref(), |x, y| {
        are_equivalent(x, y, relaxed)
    }) && are_equivalent_stmt_lists(&a.cons, &b.cons, relaxed)
}

/// Whole-subtree comparison for node kinds without a dedicated rule.
fn eq_fallback<T>(a: &T, b: &T, relaxed: bool) -> bool
where
    T: Clone + EqIgnoreSpan + VisitMutWith<IdentNormalizer>,
{
    if !relaxed {
        return a.eq_ignore_span(b);
    }
    let mut a = a.clone();
    let mut b = b.clone();
    a.visit_mut_with(&mut IdentNormalizer);
    b.visit_mut_with(&mut IdentNormalizer);
    a.eq_ignore_span(&b)
}

/// Blanks identifier names so the fallback comparison ignores them.
pub struct IdentNormalizer;

impl VisitMut for IdentNormalizer {
    fn visit_mut_ident(&mut self, ident: &mut Ident) {
        ident.sym = "_".into();
        ident.ctxt = SyntaxContext::empty();
    }

    fn visit_mut_ident_name(&mut self, ident: &mut IdentName) {
        ident.sym = "_".into();
    }
}

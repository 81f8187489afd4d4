//! Statement rules
//!
//! ローカル宣言・ループ・ジャンプ・イベント文を扱う。一つの入力文が
//! 複数の出力文になることがある (VB の複数宣言子、C# の for の分解)。

use super::{arrays, events, types, ConversionContext};
use crate::ast::visit::{walk_stmt, Visit};
use crate::ast::{
    AssignOp, BinaryOp, CatchClause, Expr, ExprKind, JumpTarget, Language, Literal, SourceRange,
    Stmt, StmtKind, TypeRef, UnaryOp, VariableDeclarator,
};
use crate::semantic::StmtSemantics;
use crate::symbols::{BuiltinType, ResolvedType};

fn is_var(ty: &TypeRef) -> bool {
    ty.name == "var" && ty.type_args.is_empty() && ty.array_ranks.is_empty()
}

/// Declarator in VB form: `As New`, array bounds, inferred types
pub fn declarator_to_vb(ctx: &mut ConversionContext<'_>, d: &VariableDeclarator) -> VariableDeclarator {
    if let Some(out) = arrays::declarator_to_vb(ctx, d) {
        return out;
    }
    let written_ty = d.ty.as_ref().filter(|t| !is_var(t));

    // `T a = new T(...)` / `var a = new T(...)` → `Dim a As New T(...)`
    if let Some(init @ Expr {
        kind: ExprKind::ObjectCreation { ty: created, .. },
        ..
    }) = &d.init
    {
        let same_type = written_ty.map_or(true, |t| {
            t.name == created.name && t.type_args == created.type_args && !t.is_array()
        });
        if same_type {
            let ty = types::type_ref(ctx, created);
            let init = ctx.convert_expr(init);
            let mut out = ctx.at(d.range).declarator(&d.name, Some(ty), Some(init));
            out.as_new = true;
            return out;
        }
    }

    let ty = types::opt_type_ref(ctx, written_ty);
    let init = d.init.as_ref().map(|e| ctx.convert_expr(e));
    ctx.at(d.range).declarator(&d.name, ty, init)
}

/// Declarator in C# form. `initialize` gives uninitialized locals VB's default value.
pub fn declarator_to_cs(
    ctx: &mut ConversionContext<'_>,
    d: &VariableDeclarator,
    initialize: bool,
) -> VariableDeclarator {
    if let Some(bounds) = &d.bounds {
        return arrays::declarator_to_cs(ctx, d, bounds);
    }
    let name = match ctx.model.symbol_of_node(d.id) {
        Some(symbol) => ctx.declared_name(symbol),
        None => d.name.clone(),
    };
    let resolved = ctx
        .model
        .symbol_of_node(d.id)
        .and_then(|s| ctx.model.symbol(s))
        .map(|s| s.ty.clone())
        .unwrap_or(ResolvedType::Unknown);

    let ty = match (&d.ty, &d.init) {
        (Some(ty), _) => types::type_ref(ctx, ty),
        // `Dim x = e` → `var x = e`
        (None, Some(_)) => ctx.at(d.range).ty("var"),
        // `Dim x` (Object)
        (None, None) => types::from_resolved(ctx, &resolved, d.range)
            .unwrap_or_else(|| types::object_type(ctx, d.range)),
    };
    let init = match &d.init {
        Some(e) => Some(ctx.convert_expr(e)),
        None if initialize => default_value(ctx, &resolved, &ty, d.range),
        None => None,
    };
    ctx.at(d.range).declarator(&name, Some(ty), init)
}

/// VB's implicit initial value for a local of type `ty`
fn default_value(
    ctx: &ConversionContext<'_>,
    ty: &ResolvedType,
    written: &TypeRef,
    range: SourceRange,
) -> Option<Expr> {
    let b = ctx.at(range);
    let value = match ty {
        ResolvedType::Builtin(BuiltinType::Bool) => b.bool_lit(false),
        ResolvedType::Builtin(BuiltinType::Char) => b.expr(ExprKind::Literal(Literal::Char('\0'))),
        ResolvedType::Builtin(BuiltinType::String | BuiltinType::Object) => b.null(),
        ResolvedType::Builtin(BuiltinType::DateTime) => b.expr(ExprKind::DefaultValue(written.clone())),
        ResolvedType::Builtin(builtin) if builtin.is_numeric() => b.int(0),
        ResolvedType::Named(_) => match ctx.model.is_value_type(ty) {
            Some(true) => b.expr(ExprKind::DefaultValue(written.clone())),
            _ => b.null(),
        },
        ResolvedType::Array { .. } | ResolvedType::Delegate(_) => b.null(),
        _ => return None,
    };
    Some(value)
}

pub fn local(stmt: &Stmt, _sem: &StmtSemantics, ctx: &mut ConversionContext<'_>) -> Vec<Stmt> {
    let StmtKind::Local {
        declarators,
        is_const,
    } = &stmt.kind
    else {
        return Vec::new();
    };
    match ctx.target {
        Language::VBNet => {
            let converted = declarators.iter().map(|d| declarator_to_vb(ctx, d)).collect();
            vec![ctx.at(stmt.range).local_decl(converted, *is_const)]
        }
        // 一つの宣言子ごとに一文
        Language::CSharp => {
            let initialize = ctx.options.initialize_locals && !is_const;
            declarators
                .iter()
                .map(|d| {
                    let converted = declarator_to_cs(ctx, d, initialize);
                    ctx.at(stmt.range).local_decl(vec![converted], *is_const)
                })
                .collect()
        }
    }
}

pub fn assign(stmt: &Stmt, sem: &StmtSemantics, ctx: &mut ConversionContext<'_>) -> Vec<Stmt> {
    let StmtKind::Assign { target, op, value } = &stmt.kind else {
        return Vec::new();
    };
    if ctx.target == Language::VBNet {
        if let Some(sub) = &sem.event_subscription {
            return vec![events::subscription_to_vb(ctx, stmt, target, value, sub)];
        }
    }
    let op = match (ctx.target, op) {
        (Language::VBNet, AssignOp::AddAssign) if ctx.resolver.type_of(target, ctx.scope()).is_string() => {
            AssignOp::ConcatAssign
        }
        (Language::CSharp, AssignOp::ConcatAssign) => AssignOp::AddAssign,
        (_, other) => *other,
    };
    let new_target = ctx.convert_expr(target);
    let new_value = ctx.convert_expr(value);
    vec![ctx.at(stmt.range).assign_op(new_target, op, new_value)]
}

pub fn expr_stmt(stmt: &Stmt, sem: &StmtSemantics, ctx: &mut ConversionContext<'_>) -> Vec<Stmt> {
    let StmtKind::Expr(expr) = &stmt.kind else {
        return Vec::new();
    };
    if ctx.target == Language::VBNet {
        if let Some(raise) = &sem.event_raise {
            return vec![events::raise_to_vb(ctx, stmt, raise)];
        }
        if let Some(redim) = arrays::resize_to_redim(ctx, stmt) {
            return vec![redim];
        }
        // `i++;` → `i += 1`
        if let ExprKind::Unary { op, operand } = &expr.unparenthesized().kind {
            if op.is_increment() {
                let assign_op = match op {
                    UnaryOp::PreIncrement | UnaryOp::PostIncrement => AssignOp::AddAssign,
                    _ => AssignOp::SubAssign,
                };
                let target = ctx.convert_expr(operand);
                let b = ctx.at(stmt.range);
                return vec![b.assign_op(target, assign_op, b.int(1))];
            }
        }
    }
    let converted = ctx.convert_expr(expr);
    vec![ctx.at(stmt.range).expr_stmt(converted)]
}

pub fn if_stmt(stmt: &Stmt, sem: &StmtSemantics, ctx: &mut ConversionContext<'_>) -> Vec<Stmt> {
    let StmtKind::If {
        cond,
        then_block,
        else_block,
    } = &stmt.kind
    else {
        return Vec::new();
    };
    // `if (E != null) E(args);` → `RaiseEvent E(args)`
    if ctx.target == Language::VBNet {
        if let Some(raise) = sem.event_raise.as_ref().filter(|r| r.guarded) {
            let out = events::raise_to_vb(ctx, stmt, raise);
            // ガードと中身の呼び出しも RaiseEvent に対応付ける
            ctx.record(cond.id, out.id);
            ctx.record(then_block.id, out.id);
            for inner in &then_block.stmts {
                ctx.record(inner.id, out.id);
            }
            return vec![out];
        }
    }
    let cond = ctx.convert_expr(cond);
    let then_block = ctx.convert_block(then_block);
    let else_block = else_block.as_ref().map(|b| ctx.convert_block(b));
    vec![ctx.at(stmt.range).stmt(StmtKind::If {
        cond,
        then_block,
        else_block,
    })]
}

pub fn while_stmt(stmt: &Stmt, _sem: &StmtSemantics, ctx: &mut ConversionContext<'_>) -> Vec<Stmt> {
    let StmtKind::While { cond, body } = &stmt.kind else {
        return Vec::new();
    };
    let cond = ctx.convert_expr(cond);
    let body = ctx.in_loop(JumpTarget::While, |ctx| ctx.convert_block(body));
    vec![ctx.at(stmt.range).stmt(StmtKind::While { cond, body })]
}

pub fn for_each(stmt: &Stmt, _sem: &StmtSemantics, ctx: &mut ConversionContext<'_>) -> Vec<Stmt> {
    let StmtKind::ForEach {
        var,
        var_type,
        collection,
        body,
    } = &stmt.kind
    else {
        return Vec::new();
    };
    let collection = ctx.convert_expr(collection);
    let (var, var_type, body) = ctx.in_scope(stmt.id, |ctx| {
        let var = loop_var_name(ctx, var);
        let var_type = match (ctx.target, var_type) {
            (Language::VBNet, Some(t)) if is_var(t) => None,
            (Language::CSharp, None) => Some(ctx.at(stmt.range).ty("var")),
            (_, t) => types::opt_type_ref(ctx, t.as_ref()),
        };
        let body = ctx.in_loop(JumpTarget::For, |ctx| ctx.convert_block(body));
        (var, var_type, body)
    });
    vec![ctx.at(stmt.range).stmt(StmtKind::ForEach {
        var,
        var_type,
        collection,
        body,
    })]
}

/// Declared spelling of a loop variable seen from the loop scope
fn loop_var_name(ctx: &ConversionContext<'_>, written: &str) -> String {
    match ctx.model.lookup(ctx.scope(), written).first() {
        Some(symbol) => ctx.declared_name(*symbol),
        None => written.to_string(),
    }
}

pub fn return_stmt(stmt: &Stmt, _sem: &StmtSemantics, ctx: &mut ConversionContext<'_>) -> Vec<Stmt> {
    let StmtKind::Return(value) = &stmt.kind else {
        return Vec::new();
    };
    let value = value.as_ref().map(|v| ctx.convert_expr(v));
    vec![ctx.at(stmt.range).ret(value)]
}

pub fn throw_stmt(stmt: &Stmt, _sem: &StmtSemantics, ctx: &mut ConversionContext<'_>) -> Vec<Stmt> {
    let StmtKind::Throw(value) = &stmt.kind else {
        return Vec::new();
    };
    let value = value.as_ref().map(|v| ctx.convert_expr(v));
    vec![ctx.at(stmt.range).stmt(StmtKind::Throw(value))]
}

pub fn try_stmt(stmt: &Stmt, _sem: &StmtSemantics, ctx: &mut ConversionContext<'_>) -> Vec<Stmt> {
    let StmtKind::Try {
        body,
        catches,
        finally,
    } = &stmt.kind
    else {
        return Vec::new();
    };
    let body = ctx.convert_block(body);
    let catches = catches
        .iter()
        .map(|c| {
            ctx.in_scope(c.id, |ctx| {
                let ty = types::opt_type_ref(ctx, c.ty.as_ref());
                let body = ctx.convert_block(&c.body);
                CatchClause {
                    id: ctx.builder.next_id(),
                    range: c.range,
                    var: c.var.clone(),
                    ty,
                    body,
                }
            })
        })
        .collect();
    let finally = finally.as_ref().map(|f| ctx.convert_block(f));
    vec![ctx.at(stmt.range).stmt(StmtKind::Try {
        body,
        catches,
        finally,
    })]
}

/// `break`/`continue` ⇄ `Exit`/`Continue` of the enclosing loop kind
fn jump(stmt: &Stmt, target: Option<JumpTarget>, ctx: &mut ConversionContext<'_>, exit: bool) -> Vec<Stmt> {
    let make = |target: Option<JumpTarget>| {
        if exit {
            StmtKind::Exit { target }
        } else {
            StmtKind::Continue { target }
        }
    };
    match ctx.target {
        Language::VBNet => {
            let innermost = ctx.innermost_loop();
            if innermost.is_none() {
                ctx.warn_ambiguous(
                    stmt.range,
                    "jump outside a loop; converted as Exit For".to_string(),
                );
            }
            let kind = make(Some(innermost.unwrap_or(JumpTarget::For)));
            vec![ctx.at(stmt.range).stmt(kind)]
        }
        Language::CSharp => match target {
            Some(JumpTarget::Sub) => vec![ctx.at(stmt.range).ret(None)],
            Some(JumpTarget::Function) => {
                let value = match ctx.return_type() {
                    Some(Some(ret)) => {
                        let ret = ret.clone();
                        Some(ctx.at(stmt.range).expr(ExprKind::DefaultValue(ret)))
                    }
                    _ => None,
                };
                vec![ctx.at(stmt.range).ret(value)]
            }
            loop_kind => {
                if loop_kind.is_some() && loop_kind != ctx.innermost_loop() {
                    ctx.warn_ambiguous(
                        stmt.range,
                        "jump names an outer loop; C# only leaves the innermost one".to_string(),
                    );
                }
                vec![ctx.at(stmt.range).stmt(make(None))]
            }
        },
    }
}

pub fn exit_stmt(stmt: &Stmt, _sem: &StmtSemantics, ctx: &mut ConversionContext<'_>) -> Vec<Stmt> {
    let StmtKind::Exit { target } = &stmt.kind else {
        return Vec::new();
    };
    jump(stmt, *target, ctx, true)
}

pub fn continue_stmt(stmt: &Stmt, _sem: &StmtSemantics, ctx: &mut ConversionContext<'_>) -> Vec<Stmt> {
    let StmtKind::Continue { target } = &stmt.kind else {
        return Vec::new();
    };
    jump(stmt, *target, ctx, false)
}

pub fn block_stmt(stmt: &Stmt, _sem: &StmtSemantics, ctx: &mut ConversionContext<'_>) -> Vec<Stmt> {
    let StmtKind::Block(block) = &stmt.kind else {
        return Vec::new();
    };
    let block = ctx.convert_block(block);
    vec![ctx.at(stmt.range).stmt(StmtKind::Block(block))]
}

// --- for ---

/// Pieces of `for (T i = a; i < b; i++)`
struct CanonicalFor<'s> {
    var: &'s str,
    var_type: Option<&'s TypeRef>,
    start: &'s Expr,
    cmp: BinaryOp,
    bound: &'s Expr,
    step: Step<'s>,
}

enum Step<'s> {
    One,
    MinusOne,
    Add(&'s Expr),
    Sub(&'s Expr),
}

fn canonical_for<'s>(init: &'s [Stmt], cond: Option<&'s Expr>, iterators: &'s [Stmt]) -> Option<CanonicalFor<'s>> {
    let [init] = init else {
        return None;
    };
    let (var, var_type, start) = match &init.kind {
        StmtKind::Local { declarators, .. } => {
            let [d] = declarators.as_slice() else {
                return None;
            };
            (d.name.as_str(), d.ty.as_ref(), d.init.as_ref()?)
        }
        StmtKind::Assign {
            target,
            op: AssignOp::Assign,
            value,
        } => (target.as_identifier()?, None, value),
        _ => return None,
    };
    let ExprKind::Binary { op, left, right } = &cond?.unparenthesized().kind else {
        return None;
    };
    if left.as_identifier() != Some(var)
        || !matches!(op, BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq)
    {
        return None;
    }
    let [iter] = iterators else {
        return None;
    };
    let step = match &iter.kind {
        StmtKind::Expr(Expr {
            kind: ExprKind::Unary { op: unary, operand },
            ..
        }) if operand.as_identifier() == Some(var) => match unary {
            UnaryOp::PreIncrement | UnaryOp::PostIncrement => Step::One,
            UnaryOp::PreDecrement | UnaryOp::PostDecrement => Step::MinusOne,
            _ => return None,
        },
        StmtKind::Assign { target, op, value } if target.as_identifier() == Some(var) => match op {
            AssignOp::AddAssign => Step::Add(value),
            AssignOp::SubAssign => Step::Sub(value),
            _ => return None,
        },
        _ => return None,
    };
    // 比較の向きと増分の符号が合わなければ正規形ではない
    let upward = matches!(op, BinaryOp::Lt | BinaryOp::LtEq);
    let step_upward = match &step {
        Step::One => Some(true),
        Step::MinusOne => Some(false),
        Step::Add(v) => v.as_int_literal().map(|n| n > 0),
        Step::Sub(v) => v.as_int_literal().map(|n| n < 0),
    };
    if step_upward != Some(upward) {
        return None;
    }
    Some(CanonicalFor {
        var,
        var_type: var_type.filter(|t| !is_var(t)),
        start,
        cmp: *op,
        bound: right,
        step,
    })
}

#[derive(Default)]
struct FindsContinue {
    found: bool,
}

impl Visit for FindsContinue {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt.kind {
            StmtKind::Continue { .. } => self.found = true,
            // 内側のループの continue はそのループに属する
            StmtKind::While { .. } | StmtKind::For { .. } | StmtKind::CFor { .. } | StmtKind::ForEach { .. } => {}
            _ => walk_stmt(self, stmt),
        }
    }
}

/// C# `for (...)` → VB `For ... To ... Step`, else initializer + `While`
pub fn c_for(stmt: &Stmt, _sem: &StmtSemantics, ctx: &mut ConversionContext<'_>) -> Vec<Stmt> {
    let StmtKind::CFor {
        init,
        cond,
        iterators,
        body,
    } = &stmt.kind
    else {
        return Vec::new();
    };
    ctx.in_scope(stmt.id, |ctx| {
        if let Some(canonical) = canonical_for(init, cond.as_ref(), iterators) {
            let var_type = types::opt_type_ref(ctx, canonical.var_type);
            let start = ctx.convert_expr(canonical.start);
            let bound = ctx.convert_expr(canonical.bound);
            let end = match canonical.cmp {
                BinaryOp::Lt => arrays::shift(ctx, bound, -1),
                BinaryOp::Gt => arrays::shift(ctx, bound, 1),
                _ => bound,
            };
            let step = match canonical.step {
                Step::One => None,
                Step::MinusOne => Some(ctx.at(stmt.range).int(-1)),
                Step::Add(v) => match v.as_int_literal() {
                    Some(1) => None,
                    _ => Some(ctx.convert_expr(v)),
                },
                Step::Sub(v) => match v.as_int_literal().and_then(i64::checked_neg) {
                    Some(n) => Some(ctx.at(stmt.range).int(n)),
                    None => {
                        let v = ctx.convert_expr(v);
                        Some(ctx.at(stmt.range).unary(UnaryOp::Neg, v))
                    }
                },
            };
            let body = ctx.in_loop(JumpTarget::For, |ctx| ctx.convert_block(body));
            return vec![ctx.at(stmt.range).stmt(StmtKind::For {
                var: canonical.var.to_string(),
                var_type,
                start,
                end,
                step,
                body,
            })];
        }

        let mut out: Vec<Stmt> = init.iter().flat_map(|s| ctx.convert_stmt(s)).collect();
        let mut finder = FindsContinue::default();
        finder.visit_block(body);
        if finder.found && !iterators.is_empty() {
            ctx.warn_ambiguous(
                stmt.range,
                "continue inside a for loop rewritten as While skips the iterator".to_string(),
            );
        }
        let cond = match cond {
            Some(c) => ctx.convert_expr(c),
            None => ctx.at(stmt.range).bool_lit(true),
        };
        let body = ctx.in_loop(JumpTarget::While, |ctx| {
            let mut block = ctx.convert_block(body);
            for s in iterators {
                block.stmts.extend(ctx.convert_stmt(s));
            }
            block
        });
        out.push(ctx.at(stmt.range).stmt(StmtKind::While { cond, body }));
        out
    })
}

/// VB `For i = a To b [Step s]` → C# `for (var i = a; i <= b; i++)`
pub fn vb_for(stmt: &Stmt, _sem: &StmtSemantics, ctx: &mut ConversionContext<'_>) -> Vec<Stmt> {
    let StmtKind::For {
        var,
        var_type,
        start,
        end,
        step,
        body,
    } = &stmt.kind
    else {
        return Vec::new();
    };
    let range = stmt.range;
    ctx.in_scope(stmt.id, |ctx| {
        let loop_scope = ctx.scope();
        let bound = ctx.model.lookup(loop_scope, var).first().copied();
        let declared_here = var_type.is_some()
            || bound
                .and_then(|s| ctx.model.symbol(s))
                .is_some_and(|s| s.scope == loop_scope);
        let name = loop_var_name(ctx, var);
        let new_start = ctx.convert_expr(start);
        let init = if declared_here {
            let ty = match var_type {
                Some(t) => types::type_ref(ctx, t),
                None => ctx.at(range).ty("var"),
            };
            let b = ctx.at(range);
            b.local(&name, Some(ty), Some(new_start))
        } else {
            let b = ctx.at(range);
            b.assign(b.ident(&name), new_start)
        };

        let new_end = ctx.convert_expr(end);
        let literal_step = match step {
            None => Some(1),
            Some(s) => s.as_int_literal(),
        };
        if literal_step.is_none() {
            ctx.warn_ambiguous(
                range,
                "loop step is not a constant; assumed to count upward".to_string(),
            );
        }
        let downward = literal_step.is_some_and(|n| n < 0);
        let cmp = if downward { BinaryOp::GtEq } else { BinaryOp::LtEq };
        let cond = {
            let b = ctx.at(range);
            b.binary(cmp, b.ident(&name), new_end)
        };
        let iterator = match literal_step {
            Some(1) => {
                let b = ctx.at(range);
                b.expr_stmt(b.unary(UnaryOp::PostIncrement, b.ident(&name)))
            }
            Some(-1) => {
                let b = ctx.at(range);
                b.expr_stmt(b.unary(UnaryOp::PostDecrement, b.ident(&name)))
            }
            Some(n) if n < 0 && n != i64::MIN => {
                let b = ctx.at(range);
                b.assign_op(b.ident(&name), AssignOp::SubAssign, b.int(-n))
            }
            _ => {
                let amount = match step {
                    Some(s) => ctx.convert_expr(s),
                    None => ctx.at(range).int(1),
                };
                let b = ctx.at(range);
                b.assign_op(b.ident(&name), AssignOp::AddAssign, amount)
            }
        };
        let body = ctx.in_loop(JumpTarget::For, |ctx| ctx.convert_block(body));
        vec![ctx.at(range).stmt(StmtKind::CFor {
            init: vec![init],
            cond: Some(cond),
            iterators: vec![iterator],
            body,
        })]
    })
}

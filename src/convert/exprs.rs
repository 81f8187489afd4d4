//! Expression rules
//!
//! 子を先に変換し、解決済みの意味 (ExprSemantics) を見て親の形を決める。

use super::{types, ConversionContext};
use crate::ast::{BinaryOp, CastKind, Expr, ExprKind, Language, Placeholder, UnaryOp};
use crate::casing;
use crate::semantic::{EqualityKind, ExprSemantics, InvocationKind, ResolutionKind, TypeCategory};
use crate::symbols::{BuiltinType, ResolvedType};

/// Copy of a node whose shape is the same in both languages
fn same_shape(expr: &Expr, ctx: &mut ConversionContext<'_>) -> Expr {
    ctx.at(expr.range).expr(expr.kind.clone())
}

/// Name text for an identifier or member, warning when nothing was bound
fn spelled(
    ctx: &mut ConversionContext<'_>,
    written: &str,
    sem: &ExprSemantics,
    expr: &Expr,
    warn: bool,
) -> String {
    match casing::identifier_spelling(ctx.model, written, sem.kind, sem.symbol, ctx.target) {
        Some(text) => text,
        None => {
            if warn && sem.kind == ResolutionKind::Unresolved {
                ctx.warn_unresolved(
                    expr.range,
                    format!("'{written}' could not be resolved; converted by syntax only"),
                );
            }
            written.to_string()
        }
    }
}

/// VB calls a parameterless method written without parentheses; C# needs `()`
fn with_implicit_call(out: Expr, sem: &ExprSemantics, callee: bool, ctx: &ConversionContext<'_>) -> Expr {
    if sem.implicit_call && !callee && ctx.target == Language::CSharp {
        let range = out.range;
        return ctx.at(range).call(out, vec![]);
    }
    out
}

pub fn literal(expr: &Expr, _sem: &ExprSemantics, ctx: &mut ConversionContext<'_>) -> Expr {
    same_shape(expr, ctx)
}

pub fn identifier(expr: &Expr, sem: &ExprSemantics, ctx: &mut ConversionContext<'_>) -> Expr {
    let callee = ctx.take_callee();
    let ExprKind::Identifier(name) = &expr.kind else {
        return same_shape(expr, ctx);
    };
    let text = spelled(ctx, name, sem, expr, true);
    let out = ctx.at(expr.range).ident(&text);
    with_implicit_call(out, sem, callee, ctx)
}

pub fn member_access(expr: &Expr, sem: &ExprSemantics, ctx: &mut ConversionContext<'_>) -> Expr {
    let callee = ctx.take_callee();
    let ExprKind::MemberAccess { target, member } = &expr.kind else {
        return same_shape(expr, ctx);
    };
    // 対象が解決できないときは対象側で警告済み
    let target_resolved = !ctx.resolver.resolve(target, ctx.scope()).is_unresolved();
    let new_target = ctx.convert_expr(target);
    let text = spelled(ctx, member, sem, expr, target_resolved);
    let out = ctx.at(expr.range).member(new_target, &text);
    with_implicit_call(out, sem, callee, ctx)
}

pub fn invocation(expr: &Expr, sem: &ExprSemantics, ctx: &mut ConversionContext<'_>) -> Expr {
    ctx.take_callee();
    let ExprKind::Invocation { target, args } = &expr.kind else {
        return same_shape(expr, ctx);
    };
    let kind = sem.invocation.unwrap_or(InvocationKind::Unresolved);
    if ctx.target == Language::CSharp {
        match kind {
            // `a(1)` の a が配列・既定プロパティを持つ値
            InvocationKind::ElementAccess => {
                let new_target = ctx.convert_expr(target);
                let new_args = ctx.convert_exprs(args);
                return ctx.at(expr.range).index(new_target, new_args);
            }
            // `F(1)` → `F()[1]`
            InvocationKind::IndexedCall => {
                let new_target = ctx.convert_callee(target);
                let new_args = ctx.convert_exprs(args);
                let b = ctx.at(expr.range);
                return b.index(b.call(new_target, vec![]), new_args);
            }
            // `list.Item(0)` → `list[0]`
            InvocationKind::DefaultProperty => {
                if let ExprKind::MemberAccess { target: owner, .. } = &target.kind {
                    let new_owner = ctx.convert_expr(owner);
                    let new_args = ctx.convert_exprs(args);
                    return ctx.at(expr.range).index(new_owner, new_args);
                }
                let new_target = ctx.convert_expr(target);
                let new_args = ctx.convert_exprs(args);
                return ctx.at(expr.range).index(new_target, new_args);
            }
            _ => {}
        }
    }
    if kind == InvocationKind::Unresolved && !ctx.resolver.resolve(target, ctx.scope()).is_unresolved() {
        ctx.warn_unresolved(
            expr.range,
            "call target could not be classified; call kept as written".to_string(),
        );
    }
    let new_target = ctx.convert_callee(target);
    let new_args = ctx.convert_exprs(args);
    ctx.at(expr.range).call(new_target, new_args)
}

/// C# `a[i]` → VB `a(i)`
pub fn index_to_call(expr: &Expr, _sem: &ExprSemantics, ctx: &mut ConversionContext<'_>) -> Expr {
    let ExprKind::Index { target, args } = &expr.kind else {
        return same_shape(expr, ctx);
    };
    let new_target = ctx.convert_expr(target);
    let new_args = ctx.convert_exprs(args);
    ctx.at(expr.range).call(new_target, new_args)
}

/// C# `ref x` → VB `x` (ByRef is declared on the parameter)
pub fn strip_ref(expr: &Expr, _sem: &ExprSemantics, ctx: &mut ConversionContext<'_>) -> Expr {
    let ExprKind::RefArgument(inner) = &expr.kind else {
        return same_shape(expr, ctx);
    };
    ctx.convert_expr(inner)
}

/// C# `default(T)` → VB `Nothing`
pub fn default_to_nothing(expr: &Expr, _sem: &ExprSemantics, ctx: &mut ConversionContext<'_>) -> Expr {
    ctx.at(expr.range).null()
}

/// VB `AddressOf M` → C# method group `M`
pub fn address_of(expr: &Expr, _sem: &ExprSemantics, ctx: &mut ConversionContext<'_>) -> Expr {
    let ExprKind::AddressOf(inner) = &expr.kind else {
        return same_shape(expr, ctx);
    };
    ctx.convert_callee(inner)
}

pub fn binary(expr: &Expr, sem: &ExprSemantics, ctx: &mut ConversionContext<'_>) -> Expr {
    let ExprKind::Binary { op, left, right } = &expr.kind else {
        return same_shape(expr, ctx);
    };
    let l = ctx.convert_expr(left);
    let r = ctx.convert_expr(right);
    match ctx.target {
        Language::VBNet => binary_to_vb(*op, l, r, sem, expr, ctx),
        Language::CSharp => binary_to_cs(*op, l, r, sem, expr, ctx),
    }
}

fn binary_to_vb(
    op: BinaryOp,
    l: Expr,
    r: Expr,
    sem: &ExprSemantics,
    expr: &Expr,
    ctx: &mut ConversionContext<'_>,
) -> Expr {
    let (lt, rt) = (sem.operand(0), sem.operand(1));
    let op = match op {
        BinaryOp::Eq | BinaryOp::NotEq => {
            let negated = op.is_negated_equality();
            match sem.equality.unwrap_or(EqualityKind::Unresolved) {
                EqualityKind::Value => op,
                EqualityKind::Identity => identity_op(negated),
                EqualityKind::Unresolved => {
                    ctx.warn_ambiguous(
                        expr.range,
                        "operand types unknown; equality converted as identity comparison".to_string(),
                    );
                    identity_op(negated)
                }
            }
        }
        BinaryOp::Add if lt.is_string() || rt.is_string() => BinaryOp::Concat,
        BinaryOp::Div if lt.is_integral() && rt.is_integral() => BinaryOp::IntDiv,
        other => other,
    };
    ctx.at(expr.range).binary(op, l, r)
}

fn identity_op(negated: bool) -> BinaryOp {
    if negated {
        BinaryOp::RefNotEq
    } else {
        BinaryOp::RefEq
    }
}

fn binary_to_cs(
    op: BinaryOp,
    l: Expr,
    r: Expr,
    sem: &ExprSemantics,
    expr: &Expr,
    ctx: &mut ConversionContext<'_>,
) -> Expr {
    let (lt, rt) = (sem.operand(0).clone(), sem.operand(1).clone());
    let range = expr.range;
    match op {
        // `s Is t` on strings compares references; C# `==` would compare content
        BinaryOp::RefEq | BinaryOp::RefNotEq => {
            let strings = ctx.resolver.categorize(&lt) == TypeCategory::String
                || ctx.resolver.categorize(&rt) == TypeCategory::String;
            let b = ctx.at(range);
            if strings {
                let call = b.call(b.path("object.ReferenceEquals"), vec![l, r]);
                return if op == BinaryOp::RefNotEq {
                    b.unary(UnaryOp::Not, call)
                } else {
                    call
                };
            }
            let op = if op == BinaryOp::RefNotEq {
                BinaryOp::NotEq
            } else {
                BinaryOp::Eq
            };
            b.binary(op, l, r)
        }
        BinaryOp::Concat => {
            let b = ctx.at(range);
            let l = if lt.is_string() || rt.is_string() {
                l
            } else {
                b.call(b.member(l, "ToString"), vec![])
            };
            b.binary(BinaryOp::Add, l, r)
        }
        BinaryOp::IntDiv => ctx.at(range).binary(BinaryOp::Div, l, r),
        // VB `/` is floating division even for integers
        BinaryOp::Div if lt.is_integral() && rt.is_integral() => {
            let float = match &sem.ty {
                ResolvedType::Builtin(b) => *b,
                _ => BuiltinType::Double,
            };
            let b = ctx.at(range);
            let ty = b.ty(&casing::builtin_spelling(float, Language::CSharp));
            let l = b.cast(CastKind::Cast, ty, l);
            b.binary(BinaryOp::Div, l, r)
        }
        BinaryOp::Pow => {
            let b = ctx.at(range);
            b.call(b.path("Math.Pow"), vec![l, r])
        }
        other => ctx.at(range).binary(other, l, r),
    }
}

pub fn unary(expr: &Expr, sem: &ExprSemantics, ctx: &mut ConversionContext<'_>) -> Expr {
    let ExprKind::Unary { op, operand } = &expr.kind else {
        return same_shape(expr, ctx);
    };
    if ctx.target == Language::VBNet && op.is_increment() {
        ctx.unsupported(
            expr.range,
            "increment or decrement inside an expression has no VB.NET equivalent".to_string(),
        );
        return ctx.at(expr.range).expr(ExprKind::Unsupported(Placeholder {
            kind: format!("{op:?}"),
            original: expr.id,
        }));
    }
    let new_operand = ctx.convert_expr(operand);
    let op = match (ctx.target, op) {
        (Language::VBNet, UnaryOp::BitNot) => UnaryOp::Not,
        (Language::CSharp, UnaryOp::Not) => {
            let ty = sem.operand(0);
            if ty.is_integral() {
                UnaryOp::BitNot
            } else {
                if ty.is_unknown() {
                    ctx.warn_ambiguous(
                        expr.range,
                        "operand type unknown; Not converted as logical negation".to_string(),
                    );
                }
                UnaryOp::Not
            }
        }
        (_, other) => *other,
    };
    ctx.at(expr.range).unary(op, new_operand)
}

pub fn conditional(expr: &Expr, _sem: &ExprSemantics, ctx: &mut ConversionContext<'_>) -> Expr {
    let ExprKind::Conditional {
        cond,
        then_expr,
        else_expr,
    } = &expr.kind
    else {
        return same_shape(expr, ctx);
    };
    let cond = ctx.convert_expr(cond);
    let then_expr = ctx.convert_expr(then_expr);
    let else_expr = ctx.convert_expr(else_expr);
    ctx.at(expr.range).expr(ExprKind::Conditional {
        cond: Box::new(cond),
        then_expr: Box::new(then_expr),
        else_expr: Box::new(else_expr),
    })
}

pub fn type_test(expr: &Expr, _sem: &ExprSemantics, ctx: &mut ConversionContext<'_>) -> Expr {
    let ExprKind::TypeTest { expr: inner, ty } = &expr.kind else {
        return same_shape(expr, ctx);
    };
    let inner = ctx.convert_expr(inner);
    let ty = types::type_ref(ctx, ty);
    ctx.at(expr.range).expr(ExprKind::TypeTest {
        expr: Box::new(inner),
        ty,
    })
}

pub fn cast(expr: &Expr, sem: &ExprSemantics, ctx: &mut ConversionContext<'_>) -> Expr {
    let ExprKind::Cast { kind, ty, expr: inner } = &expr.kind else {
        return same_shape(expr, ctx);
    };
    let new_inner = ctx.convert_expr(inner);
    let new_ty = types::type_ref(ctx, ty);
    let kind = match (ctx.target, kind) {
        // 値型は変換を伴う CType、参照型は DirectCast
        (Language::VBNet, CastKind::Cast) => match ctx.model.is_value_type(&sem.ty) {
            Some(false) => CastKind::DirectCast,
            _ => CastKind::CType,
        },
        (Language::VBNet, CastKind::As) => CastKind::TryCast,
        (Language::CSharp, CastKind::CType | CastKind::DirectCast) => CastKind::Cast,
        (Language::CSharp, CastKind::TryCast) => CastKind::As,
        (_, other) => *other,
    };
    ctx.at(expr.range).cast(kind, new_ty, new_inner)
}

pub fn parenthesized(expr: &Expr, _sem: &ExprSemantics, ctx: &mut ConversionContext<'_>) -> Expr {
    let ExprKind::Parenthesized(inner) = &expr.kind else {
        return same_shape(expr, ctx);
    };
    let inner = ctx.convert_expr(inner);
    ctx.at(expr.range).paren(inner)
}

pub fn object_creation(expr: &Expr, _sem: &ExprSemantics, ctx: &mut ConversionContext<'_>) -> Expr {
    let ExprKind::ObjectCreation { ty, args } = &expr.kind else {
        return same_shape(expr, ctx);
    };
    let ty = types::type_ref(ctx, ty);
    let args = ctx.convert_exprs(args);
    ctx.at(expr.range).new_object(ty, args)
}

pub fn type_of(expr: &Expr, _sem: &ExprSemantics, ctx: &mut ConversionContext<'_>) -> Expr {
    let ExprKind::TypeOf(ty) = &expr.kind else {
        return same_shape(expr, ctx);
    };
    let ty = types::type_ref(ctx, ty);
    ctx.at(expr.range).expr(ExprKind::TypeOf(ty))
}

/// `this`/`Me`, `base`/`MyBase`
pub fn keyword(expr: &Expr, _sem: &ExprSemantics, ctx: &mut ConversionContext<'_>) -> Expr {
    same_shape(expr, ctx)
}

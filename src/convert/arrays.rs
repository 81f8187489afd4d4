//! Array bound rules
//!
//! VB の配列は上限 (包含) で、C# は長さで書く。`Dim a(10)` は長さ 11。
//! ReDim は再確保 (Preserve なし)、`Array.Resize` (一次元)、
//! `Utils.CopyArray` (多次元) に変換する。

use super::{types, ConversionContext};
use crate::ast::{
    BinaryOp, CastKind, Expr, ExprKind, Language, Literal, SourceRange, Stmt, StmtKind, TypeRef,
    VariableDeclarator,
};
use crate::semantic::ExprSemantics;
use crate::semantic::StmtSemantics;

const COPY_ARRAY: &str = "Microsoft.VisualBasic.CompilerServices.Utils.CopyArray";

/// `e + delta`, folding literals and cancelling a written `± 1`
pub fn shift(ctx: &ConversionContext<'_>, e: Expr, delta: i64) -> Expr {
    if delta == 0 {
        return e;
    }
    let range = e.range;
    if let ExprKind::Literal(Literal::Int(v)) = &e.kind {
        // 桁あふれする場合は式のまま残す
        if let Some(folded) = v.checked_add(delta) {
            return ctx.at(range).int(folded);
        }
    }
    if let ExprKind::Binary { op, left, right } = &e.kind {
        let cancels = match op {
            BinaryOp::Sub => right.as_int_literal() == Some(delta),
            BinaryOp::Add => right.as_int_literal() == Some(-delta),
            _ => false,
        };
        if cancels {
            return (**left).clone();
        }
    }
    let b = ctx.at(range);
    if delta > 0 {
        b.binary(BinaryOp::Add, e, b.int(delta))
    } else {
        b.binary(BinaryOp::Sub, e, b.int(-delta))
    }
}

/// Upper bound (VB) ⇄ length (C#) offset for the active direction
fn bound_delta(ctx: &ConversionContext<'_>) -> i64 {
    match ctx.target {
        Language::CSharp => 1,
        Language::VBNet => -1,
    }
}

pub fn array_creation(expr: &Expr, _sem: &ExprSemantics, ctx: &mut ConversionContext<'_>) -> Expr {
    let ExprKind::ArrayCreation {
        element,
        rank,
        dims,
        initializer,
    } = &expr.kind
    else {
        return ctx.at(expr.range).expr(expr.kind.clone());
    };
    let element = types::type_ref(ctx, element);
    let delta = bound_delta(ctx);
    let dims = dims
        .iter()
        .map(|d| {
            let converted = ctx.convert_expr(d);
            shift(ctx, converted, delta)
        })
        .collect();
    let initializer = initializer.as_ref().map(|items| ctx.convert_exprs(items));
    ctx.at(expr.range).expr(ExprKind::ArrayCreation {
        element,
        rank: *rank,
        dims,
        initializer,
    })
}

/// VB `i(10) As Integer` → C# `int[] i = new int[11]`; `a(,)` → `int[,] a`
pub fn declarator_to_cs(
    ctx: &mut ConversionContext<'_>,
    d: &VariableDeclarator,
    bounds: &[Option<Expr>],
) -> VariableDeclarator {
    let rank = bounds.len().max(1);
    let element = match &d.ty {
        Some(ty) => types::type_ref(ctx, ty),
        None => types::object_type(ctx, d.range),
    };
    let array_ty = element.with_array_rank(rank);
    let init = if bounds.iter().all(Option::is_some) {
        let dims = bounds
            .iter()
            .flatten()
            .map(|bound| {
                let converted = ctx.convert_expr(bound);
                shift(ctx, converted, 1)
            })
            .collect();
        Some(ctx.at(d.range).new_array(element, dims))
    } else if ctx.options.initialize_locals {
        Some(ctx.at(d.range).null())
    } else {
        None
    };
    let mut out = ctx.at(d.range).declarator(&d.name, Some(array_ty), init);
    out.range = d.range;
    out
}

/// C# `int[] i = new int[11]` → VB `i(10) As Integer`
pub fn declarator_to_vb(ctx: &mut ConversionContext<'_>, d: &VariableDeclarator) -> Option<VariableDeclarator> {
    let ty = d.ty.as_ref().filter(|t| t.is_array())?;
    let init = d.init.as_ref()?;
    let ExprKind::ArrayCreation {
        element,
        dims,
        initializer: None,
        ..
    } = &init.kind
    else {
        return None;
    };
    if dims.is_empty() || ty.element_type().name != element.name || ty.array_ranks.len() != 1 {
        return None;
    }
    let element = types::type_ref(ctx, &ty.element_type());
    let bounds = dims
        .iter()
        .map(|dim| {
            let converted = ctx.convert_expr(dim);
            Some(shift(ctx, converted, -1))
        })
        .collect();
    let mut out = ctx.at(d.range).declarator(&d.name, Some(element), None);
    out.bounds = Some(bounds);
    out.range = d.range;
    Some(out)
}

/// Element type of a ReDim target
fn redim_element(ctx: &mut ConversionContext<'_>, target: &Expr, range: SourceRange) -> TypeRef {
    let ty = ctx.resolver.type_of(target, ctx.scope());
    let found = match ty.as_array() {
        Some((element, _)) => types::from_resolved(ctx, element, range),
        None => None,
    };
    if let Some(tref) = found {
        return tref;
    }
    ctx.warn_unresolved(
        range,
        "array element type unknown; ReDim converted with object elements".to_string(),
    );
    types::object_type(ctx, range)
}

/// VB `ReDim [Preserve] a(n)`
pub fn redim(stmt: &Stmt, _sem: &StmtSemantics, ctx: &mut ConversionContext<'_>) -> Vec<Stmt> {
    let StmtKind::ReDim { preserve, clauses } = &stmt.kind else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for clause in clauses {
        let range = clause.range;
        let element = redim_element(ctx, &clause.target, range);
        let rank = clause.bounds.len().max(1);
        let lengths: Vec<Expr> = clause
            .bounds
            .iter()
            .map(|bound| {
                let converted = ctx.convert_expr(bound);
                shift(ctx, converted, 1)
            })
            .collect();
        let target = ctx.convert_expr(&clause.target);
        let s = if !preserve {
            let b = ctx.at(range);
            b.assign(target, b.new_array(element, lengths))
        } else if lengths.len() == 1 {
            let b = ctx.at(range);
            let mut args = vec![b.ref_arg(target)];
            args.extend(lengths);
            b.expr_stmt(b.call(b.path("Array.Resize"), args))
        } else {
            let source = ctx.convert_expr(&clause.target);
            let b = ctx.at(range);
            let array_ty = element.with_array_rank(rank);
            let fresh = b.new_array(element, lengths);
            let copy = b.call(b.path(COPY_ARRAY), vec![source, fresh]);
            b.assign(target, b.cast(CastKind::Cast, array_ty, copy))
        };
        out.push(s);
    }
    out
}

/// C# `Array.Resize(ref a, n);` → VB `ReDim Preserve a(n - 1)`
pub fn resize_to_redim(ctx: &mut ConversionContext<'_>, stmt: &Stmt) -> Option<Stmt> {
    let StmtKind::Expr(call) = &stmt.kind else {
        return None;
    };
    let ExprKind::Invocation { args, .. } = &call.kind else {
        return None;
    };
    let [array, length] = args.as_slice() else {
        return None;
    };
    let ExprKind::RefArgument(array) = &array.kind else {
        return None;
    };
    let resolved = ctx.resolver.resolve(call, ctx.scope()).symbol?;
    if ctx.model.qualified_name(resolved) != "System.Array.Resize" {
        return None;
    }
    let new_array = ctx.convert_expr(array);
    let converted = ctx.convert_expr(length);
    let bound = shift(ctx, converted, -1);
    Some(ctx.at(stmt.range).redim(true, new_array, vec![bound]))
}

//! Event rules
//!
//! VB: `Event E(...)` + `RaiseEvent E(...)` + `AddHandler`.
//! C#: デリゲート型の event + null チェック付き呼び出し + `+=`。
//! VB の RaiseEvent は内部で null を確認するので、C# 側のガードの有無に
//! 関係なく同じ RaiseEvent になる。

use super::{decls, types, ConversionContext};
use crate::ast::{AssignOp, BinaryOp, Decl, DeclKind, Expr, Language, Modifiers, Stmt, StmtKind};
use crate::semantic::{EventRaise, EventSubscription, ResolutionKind, StmtSemantics};

pub fn event_decl(decl: &Decl, ctx: &mut ConversionContext<'_>) -> Vec<Decl> {
    let DeclKind::Event {
        name,
        modifiers,
        ty,
        params,
    } = &decl.kind
    else {
        return Vec::new();
    };
    let name = decls::declared_name(ctx, decl, name);
    let modifiers = decls::member_modifiers(ctx, modifiers, true);
    let range = decl.range;

    // VB `Event E(sender As Object)` → C# delegate + event
    if let (Language::CSharp, None, Some(params)) = (ctx.target, ty, params) {
        let handler_name = format!("{name}EventHandler");
        let new_params = decls::params(ctx, params);
        let b = ctx.at(range);
        let delegate = b.decl(DeclKind::Delegate {
            name: handler_name.clone(),
            modifiers: Modifiers {
                access: modifiers.access,
                ..Default::default()
            },
            params: new_params,
            return_type: None,
        });
        let event = b.decl(DeclKind::Event {
            name,
            modifiers,
            ty: Some(b.ty(&handler_name)),
            params: None,
        });
        return vec![delegate, event];
    }

    let ty = types::opt_type_ref(ctx, ty.as_ref());
    let params = params.as_ref().map(|p| decls::params(ctx, p));
    vec![ctx.at(range).decl(DeclKind::Event {
        name,
        modifiers,
        ty,
        params,
    })]
}

/// C# raise (guarded or not) → VB `RaiseEvent E(args)`
pub fn raise_to_vb(ctx: &mut ConversionContext<'_>, stmt: &Stmt, raise: &EventRaise) -> Stmt {
    let event = ctx.declared_name(raise.event);
    let args = ctx.convert_exprs(&raise.args);
    ctx.at(stmt.range).raise_event(&event, args)
}

/// C# `E += h;` → VB `AddHandler E, AddressOf h`
pub fn subscription_to_vb(
    ctx: &mut ConversionContext<'_>,
    stmt: &Stmt,
    target: &Expr,
    value: &Expr,
    sub: &EventSubscription,
) -> Stmt {
    let event = ctx.convert_expr(target);
    let is_method_group = ctx.resolver.resolve(value, ctx.scope()).kind == ResolutionKind::MethodGroup;
    let handler = if is_method_group {
        let group = ctx.convert_callee(value);
        ctx.at(value.range).address_of(group)
    } else {
        ctx.convert_expr(value)
    };
    ctx.at(stmt.range).stmt(StmtKind::AddHandler {
        event,
        handler,
        remove: sub.remove,
    })
}

/// VB `RaiseEvent E(args)` → C# `if (E != null) { E(args); }`
pub fn raise_event(stmt: &Stmt, sem: &StmtSemantics, ctx: &mut ConversionContext<'_>) -> Vec<Stmt> {
    let StmtKind::RaiseEvent { event, args } = &stmt.kind else {
        return Vec::new();
    };
    let name = match &sem.event_raise {
        Some(raise) => ctx.declared_name(raise.event),
        None => {
            ctx.warn_unresolved(
                stmt.range,
                format!("event '{event}' could not be resolved; raised without a null check"),
            );
            let args = ctx.convert_exprs(args);
            let b = ctx.at(stmt.range);
            return vec![b.expr_stmt(b.call(b.ident(event), args))];
        }
    };
    let args = ctx.convert_exprs(args);
    let b = ctx.at(stmt.range);
    let call = b.expr_stmt(b.call(b.ident(&name), args));
    let guard = b.binary(BinaryOp::NotEq, b.ident(&name), b.null());
    vec![b.if_stmt(guard, vec![call], None)]
}

/// VB `AddHandler E, AddressOf h` → C# `E += h;`
pub fn add_handler(stmt: &Stmt, sem: &StmtSemantics, ctx: &mut ConversionContext<'_>) -> Vec<Stmt> {
    let StmtKind::AddHandler {
        event,
        handler,
        remove,
    } = &stmt.kind
    else {
        return Vec::new();
    };
    if sem.event_subscription.is_none() {
        ctx.warn_unresolved(
            stmt.range,
            "handler target is not a known event; converted as delegate assignment".to_string(),
        );
    }
    let target = ctx.convert_expr(event);
    let value = ctx.convert_expr(handler);
    let op = if *remove {
        AssignOp::SubAssign
    } else {
        AssignOp::AddAssign
    };
    vec![ctx.at(stmt.range).assign_op(target, op, value)]
}
